//! CLIGEN station parameters.
//!
//! GenStPar writes `.top` files holding the first twelve lines of a CLIGEN
//! `.par` file: three header lines and nine rows of monthly parameters. The
//! rows are read by CLIGEN as `(8x,12f6.2)`, so a value with three integer
//! digits runs into its neighbour (`99.87100.23`); such tokens are split after
//! each second decimal.

use {
    crate::{
        constants::{MONTHS, TOP_HEADER_LINES, TOP_LINES},
        formats::{join_lines, read_text, write_text, FormatError},
    },
    anyhow::{Context, Result},
    std::{fmt, path::Path},
};

/// Twelve monthly values, January first
pub type Monthly = [f64; MONTHS];

/// Monthly parameter rows in file order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopRow {
    MeanP,
    SdevP,
    SkewP,
    PWetWet,
    PWetDry,
    TmaxAv,
    TminAv,
    SdTmax,
    SdTmin,
}

impl TopRow {
    pub const ALL: [TopRow; 9] = [
        TopRow::MeanP,
        TopRow::SdevP,
        TopRow::SkewP,
        TopRow::PWetWet,
        TopRow::PWetDry,
        TopRow::TmaxAv,
        TopRow::TminAv,
        TopRow::SdTmax,
        TopRow::SdTmin,
    ];

    pub fn line_index(self) -> usize {
        TOP_HEADER_LINES + self as usize
    }

    fn label(self) -> &'static str {
        match self {
            TopRow::MeanP => " MEAN P ",
            TopRow::SdevP => " S DEV P",
            TopRow::SkewP => " SKEW  P",
            TopRow::PWetWet => " P(W/W) ",
            TopRow::PWetDry => " P(W/D) ",
            TopRow::TmaxAv => " TMAX AV",
            TopRow::TminAv => " TMIN AV",
            TopRow::SdTmax => " SD TMAX",
            TopRow::SdTmin => " SD TMIN",
        }
    }
}

impl fmt::Display for TopRow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label().trim())
    }
}

/// Splits a token into the numbers it holds, undoing fixed-width overruns.
fn split_jammed(token: &str) -> Option<Vec<f64>> {
    if let Ok(value) = token.parse() {
        return Some(vec![value]);
    }

    let mut values = vec![];
    let mut rest = token;
    while !rest.is_empty() {
        let end = rest.find('.').map(|dot| (dot + 3).min(rest.len()))?;
        values.push(rest[..end].parse().ok()?);
        rest = &rest[end..];
    }
    Some(values)
}

fn parse_row(line: &str, index: usize) -> Result<Monthly, FormatError> {
    let values: Vec<f64> = line
        .split_whitespace()
        .filter_map(split_jammed)
        .flatten()
        .collect();

    if values.len() < MONTHS {
        return Err(FormatError::FieldCount {
            line: index + 1,
            expected: MONTHS,
            found: values.len(),
        });
    }

    let mut row = [0.0; MONTHS];
    row.copy_from_slice(&values[values.len() - MONTHS..]);
    Ok(row)
}

fn format_row(label: &str, values: &Monthly) -> String {
    let mut line: String = format!("{:<8}", label).chars().take(8).collect();
    for value in values {
        line.push_str(&format!("{:6.2}", value));
    }
    line
}

fn value_after(line: &str, key: &str) -> Option<f64> {
    let start = line.find(key)? + key.len();
    line[start..].split_whitespace().next()?.parse().ok()
}

/// Station parameter file; also used for whole `.par` files
#[derive(Debug, Clone, PartialEq)]
pub struct TopFile {
    lines: Vec<String>,
}

impl TopFile {
    pub fn parse(text: &str) -> Result<Self, FormatError> {
        let lines: Vec<String> = text.lines().map(str::to_string).collect();
        if lines.len() < TOP_LINES {
            return Err(FormatError::Truncated {
                expected: TOP_LINES,
                found: lines.len(),
            });
        }
        let top = TopFile { lines };
        for row in TopRow::ALL.iter() {
            top.row(*row)?;
        }
        Ok(top)
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        Self::parse(&read_text(path)?).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_text(path, &self.to_string())
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn row(&self, row: TopRow) -> Result<Monthly, FormatError> {
        let index = row.line_index();
        parse_row(&self.lines[index], index)
    }

    /// Rewrites a row in CLIGEN's fixed layout, keeping its label.
    pub fn set_row(&mut self, row: TopRow, values: &Monthly) {
        let index = row.line_index();
        let label = match self.lines[index].get(..8) {
            Some(label) if !label.trim().is_empty() => label.to_string(),
            _ => row.label().to_string(),
        };
        self.lines[index] = format_row(&label, values);
    }

    /// Latitude and longitude from the `LATT=`/`LONG=` header line.
    pub fn coordinates(&self) -> Result<(f64, f64), FormatError> {
        let line = &self.lines[1];
        let latitude = value_after(line, "LATT=").ok_or(FormatError::MissingKey("LATT="))?;
        let longitude = value_after(line, "LONG=").ok_or(FormatError::MissingKey("LONG="))?;
        Ok((latitude, longitude))
    }

    /// Replaces the leading parameter block of a station `.par` file.
    pub fn splice_into(&self, par: &str) -> String {
        let mut lines: Vec<&str> = self.lines[..TOP_LINES].iter().map(String::as_str).collect();
        lines.extend(par.lines().skip(TOP_LINES));
        join_lines(&lines)
    }
}

impl fmt::Display for TopFile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", join_lines(&self.lines))
    }
}

#[cfg(test)]
mod test {
    use {super::*, approx::assert_abs_diff_eq};

    pub(crate) const TOP: &str = include_str!("../testdata/GO1_B3_1_19.top");

    #[test]
    fn rows() {
        let top = TopFile::parse(TOP).unwrap();
        let mean = top.row(TopRow::MeanP).unwrap();
        assert_abs_diff_eq!(mean[0], 0.12);
        assert_abs_diff_eq!(mean[11], 0.13);
        assert_abs_diff_eq!(top.row(TopRow::PWetDry).unwrap()[6], 0.27);
    }

    #[test]
    fn jammed_values() {
        let top = TopFile::parse(TOP).unwrap();
        let tmax = top.row(TopRow::TmaxAv).unwrap();
        assert_abs_diff_eq!(tmax[5], 99.87);
        assert_abs_diff_eq!(tmax[6], 100.23);
        assert_abs_diff_eq!(tmax[7], 98.10);

        assert_eq!(split_jammed("-5.10-3.20"), Some(vec![-5.1, -3.2]));
        assert_eq!(split_jammed("P(W/W)"), None);
    }

    #[test]
    fn set_row_keeps_label() {
        let mut top = TopFile::parse(TOP).unwrap();
        let mut values = [0.5; 12];
        values[0] = 100.25;
        top.set_row(TopRow::PWetWet, &values);

        let line = &top.lines()[TopRow::PWetWet.line_index()];
        assert!(line.starts_with(" P(W/W) 100.25  0.50"));
        assert_eq!(line.len(), 8 + 12 * 6);
        assert_eq!(top.row(TopRow::PWetWet).unwrap(), values);
    }

    #[test]
    fn coordinates() {
        let top = TopFile::parse(TOP).unwrap();
        assert_eq!(top.coordinates().unwrap(), (44.53, -92.66));
    }

    #[test]
    fn splice() {
        let top = TopFile::parse(TOP).unwrap();
        let par: String = (0..15).map(|i| format!("station {}\n", i)).collect();
        let spliced = top.splice_into(&par);
        let lines: Vec<&str> = spliced.lines().collect();
        assert_eq!(lines.len(), 15);
        assert_eq!(lines[0], top.lines()[0]);
        assert_eq!(lines[12], "station 12");
    }

    #[test]
    fn truncated() {
        assert_eq!(
            TopFile::parse("a\nb\n"),
            Err(FormatError::Truncated {
                expected: 12,
                found: 2
            })
        );
    }
}
