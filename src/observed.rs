//! Observed station and edge-of-field records, stored as CSV.
//!
//! | file                         | columns                                       |
//! |------------------------------|-----------------------------------------------|
//! | `<w>_monthly_pr.csv`         | Year, 1..12: monthly precipitation (in)       |
//! | `<w>_monthly_events.csv`     | Year, 1..12: monthly count of wet days        |
//! | `<w>_daily.csv`              | Year, Month, Day, Pr (in), Tmax, Tmin (°F)    |
//! | `<w>_farm_daily.csv`         | Year, Month, Day, Pr (in)                     |
//! | `<w>_runoff_events.csv`      | Start, End, Year, Month, Day, RO (in), TSS (lbs/ac) |
//!
//! Unparseable daily values are read as missing.

use {
    crate::{constants::MONTHS, formats::top::Monthly},
    anyhow::{anyhow, Context, Result},
    chrono::NaiveDate,
    serde::{de::DeserializeOwned, Deserialize},
    std::{fs::File, io::Read, path::Path},
};

pub const MONTHLY_PRECIPITATION: &str = "monthly_pr";
pub const MONTHLY_EVENTS: &str = "monthly_events";
pub const DAILY: &str = "daily";
pub const FARM_DAILY: &str = "farm_daily";
pub const RUNOFF_EVENTS: &str = "runoff_events";

pub fn parse_records<T: DeserializeOwned, R: Read>(reader: R) -> Result<Vec<T>, csv::Error> {
    csv::Reader::from_reader(reader).deserialize().collect()
}

/// Reads every row of a CSV file with a header line.
pub fn read_records<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<Vec<T>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    parse_records(file).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Yearly rows of monthly values
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyTable {
    pub rows: Vec<(i32, Monthly)>,
}

impl MonthlyTable {
    pub fn parse<R: Read>(reader: R) -> Result<Self> {
        let mut rows = vec![];
        for (i, record) in csv::Reader::from_reader(reader).records().enumerate() {
            let record = record?;
            if record.len() < MONTHS + 1 {
                return Err(anyhow!("row {}: expected {} columns, found {}", i + 1, MONTHS + 1, record.len()));
            }
            let year = record[0]
                .trim()
                .parse()
                .with_context(|| format!("row {}: invalid year \"{}\"", i + 1, &record[0]))?;
            let mut values = [f64::NAN; MONTHS];
            for (value, field) in values.iter_mut().zip(record.iter().skip(1)) {
                *value = field.trim().parse().unwrap_or(f64::NAN);
            }
            rows.push((year, values));
        }
        Ok(MonthlyTable { rows })
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        Self::parse(file).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Mean of each month over the years with a value
    pub fn mean(&self) -> Monthly {
        let mut mean = [f64::NAN; MONTHS];
        for (m, value) in mean.iter_mut().enumerate() {
            let present: Vec<f64> = self
                .rows
                .iter()
                .map(|(_, row)| row[m])
                .filter(|v| !v.is_nan())
                .collect();
            *value = crate::stats::mean(&present);
        }
        mean
    }
}

/// One day of observed weather, in inches and degrees Fahrenheit
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DailyObservation {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub pr: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub tmax: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub tmin: Option<f64>,
}

impl DailyObservation {
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }
}

/// Edge-of-field runoff event; several rows may share a window
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RunoffRecord {
    #[serde(rename = "Start")]
    pub start: String,
    #[serde(rename = "End")]
    pub end: String,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Month")]
    pub month: u32,
    #[serde(rename = "Day")]
    pub day: u32,
    #[serde(rename = "RO (in)")]
    pub runoff: f64,
    #[serde(rename = "TSS (lbs/ac)")]
    pub tss: f64,
}

fn parse_day(timestamp: &str) -> Result<NaiveDate> {
    let day = timestamp.get(..10).unwrap_or(timestamp);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").with_context(|| format!("Invalid date \"{}\"", timestamp))
}

impl RunoffRecord {
    /// First and last day of the event; times of day are ignored
    pub fn window(&self) -> Result<(NaiveDate, NaiveDate)> {
        Ok((parse_day(&self.start)?, parse_day(&self.end)?))
    }
}

#[cfg(test)]
mod test {
    use {super::*, approx::assert_abs_diff_eq};

    #[test]
    fn monthly_mean_skips_gaps() {
        let text = "Year,1,2,3,4,5,6,7,8,9,10,11,12\n\
                    2000,1,2,3,4,5,6,7,8,9,10,11,12\n\
                    2001,3,,3,4,5,6,7,8,9,10,11,14\n";
        let table = MonthlyTable::parse(text.as_bytes()).unwrap();
        assert_eq!(table.rows.len(), 2);
        let mean = table.mean();
        assert_abs_diff_eq!(mean[0], 2.0);
        assert_abs_diff_eq!(mean[1], 2.0);
        assert_abs_diff_eq!(mean[11], 13.0);
    }

    #[test]
    fn short_monthly_row() {
        assert!(MonthlyTable::parse("Year,1,2\n2000,1,2\n".as_bytes()).is_err());
    }

    #[test]
    fn daily_missing_values() {
        let text = "Date,Year,Month,Day,Pr,Tmax,Tmin\n\
                    2000-01-01,2000,1,1,0.25,30,10\n\
                    2000-01-02,2000,1,2,M,,12\n";
        let days: Vec<DailyObservation> = parse_records(text.as_bytes()).unwrap();
        assert_eq!(days[0].pr, Some(0.25));
        assert_eq!(days[1].pr, None);
        assert_eq!(days[1].tmax, None);
        assert_eq!(days[1].tmin, Some(12.0));
        assert_eq!(days[1].date(), NaiveDate::from_ymd_opt(2000, 1, 2));
    }

    #[test]
    fn farm_daily_without_temperature() {
        let days: Vec<DailyObservation> =
            parse_records("Year,Month,Day,Pr\n2014,6,3,1.5\n".as_bytes()).unwrap();
        assert_eq!(days[0].pr, Some(1.5));
        assert_eq!(days[0].tmax, None);
    }

    #[test]
    fn runoff_window() {
        let text = "Start,End,Year,Month,Day,RO (in),TSS (lbs/ac)\n\
                    2014-06-03 14:20:00,2014-06-04 02:00:00,2014,6,3,0.2,15\n";
        let events: Vec<RunoffRecord> = parse_records(text.as_bytes()).unwrap();
        let (start, end) = events[0].window().unwrap();
        assert_eq!(start, NaiveDate::from_ymd(2014, 6, 3));
        assert_eq!(end, NaiveDate::from_ymd(2014, 6, 4));
    }
}
