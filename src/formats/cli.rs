//! CLIGEN daily climate output.

use {
    crate::{
        constants::CLI_HEADER_LINES,
        formats::{parse_number, read_text, FormatError},
    },
    anyhow::{Context, Result},
    std::path::Path,
};

const FIELDS: usize = 13;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CliRecord {
    pub day: u32,
    pub month: u32,
    /// Simulation year, counted from 1
    pub year: i32,
    /// Daily precipitation (mm)
    pub precipitation: f64,
    /// Storm duration (h)
    pub duration: f64,
    /// Normalised time to peak intensity
    pub time_to_peak: f64,
    /// Normalised peak intensity
    pub peak_intensity: f64,
    /// Maximum temperature (°C)
    pub tmax: f64,
    /// Minimum temperature (°C)
    pub tmin: f64,
    /// Solar radiation (langleys/day)
    pub radiation: f64,
    pub wind_velocity: f64,
    pub wind_direction: f64,
    pub dew_point: f64,
}

impl CliRecord {
    /// Mean storm intensity (mm/h), zero on dry days
    pub fn intensity(&self) -> f64 {
        if self.duration > 0.0 {
            self.precipitation / self.duration
        } else {
            0.0
        }
    }

    pub fn is_wet(&self) -> bool {
        self.precipitation > 0.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cli {
    pub header: Vec<String>,
    pub records: Vec<CliRecord>,
}

fn parse_record(line: &str, index: usize) -> Result<CliRecord, FormatError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < FIELDS {
        return Err(FormatError::FieldCount {
            line: index + 1,
            expected: FIELDS,
            found: tokens.len(),
        });
    }
    let v = tokens
        .iter()
        .map(|t| parse_number(t, index + 1))
        .collect::<Result<Vec<f64>, _>>()?;

    Ok(CliRecord {
        day: v[0] as u32,
        month: v[1] as u32,
        year: v[2] as i32,
        precipitation: v[3],
        duration: v[4],
        time_to_peak: v[5],
        peak_intensity: v[6],
        tmax: v[7],
        tmin: v[8],
        radiation: v[9],
        wind_velocity: v[10],
        wind_direction: v[11],
        dew_point: v[12],
    })
}

impl Cli {
    /// Parses a CLIGEN file: station header, column names, units, then daily records.
    pub fn parse(text: &str) -> Result<Self, FormatError> {
        let lines: Vec<&str> = text.lines().collect();
        if lines.len() < CLI_HEADER_LINES {
            return Err(FormatError::Truncated {
                expected: CLI_HEADER_LINES,
                found: lines.len(),
            });
        }

        let header = lines[..CLI_HEADER_LINES].iter().map(|s| s.to_string()).collect();

        // column names and units precede the first numeric line
        let records = lines
            .iter()
            .enumerate()
            .skip(CLI_HEADER_LINES)
            .skip_while(|(_, line)| {
                line.split_whitespace()
                    .next()
                    .map_or(true, |t| t.parse::<u32>().is_err())
            })
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| parse_record(line, i))
            .collect::<Result<_, _>>()?;

        Ok(Cli { header, records })
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        Self::parse(&read_text(path)?).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Number of distinct simulation years
    pub fn years(&self) -> usize {
        let mut years: Vec<i32> = self.records.iter().map(|r| r.year).collect();
        years.dedup();
        years.len()
    }

    /// Records whose month falls in `months`
    pub fn in_months<'a>(&'a self, months: &'a [u32]) -> impl Iterator<Item = &'a CliRecord> + 'a {
        self.records.iter().filter(move |r| months.contains(&r.month))
    }
}

#[cfg(test)]
mod test {
    use {super::*, approx::assert_abs_diff_eq};

    const CLI: &str = include_str!("../testdata/GO1_B3_1_19.cli");

    #[test]
    fn parse() {
        let cli = Cli::parse(CLI).unwrap();
        assert_eq!(cli.header.len(), 13);
        assert_eq!(cli.records.len(), 12);
        assert_eq!(cli.years(), 2);

        let first = cli.records[0];
        assert_eq!((first.day, first.month, first.year), (1, 1, 1));
        assert_abs_diff_eq!(first.tmax, -4.4);

        let storm = cli.records[3];
        assert_abs_diff_eq!(storm.precipitation, 30.0);
        assert_abs_diff_eq!(storm.intensity(), 7.5);
    }

    #[test]
    fn dry_days_have_no_intensity() {
        let cli = Cli::parse(CLI).unwrap();
        assert_eq!(cli.records[0].intensity(), 0.0);
        assert!(!cli.records[0].is_wet());
    }

    #[test]
    fn months() {
        let cli = Cli::parse(CLI).unwrap();
        assert_eq!(cli.in_months(&[7]).count(), 4);
    }

    #[test]
    fn short_record() {
        let mut text: String = CLI.lines().take(15).collect::<Vec<_>>().join("\n");
        text.push_str("\n 1 1 1 0.0\n");
        assert_eq!(
            Cli::parse(&text),
            Err(FormatError::FieldCount {
                line: 16,
                expected: 13,
                found: 4
            })
        );
    }
}
