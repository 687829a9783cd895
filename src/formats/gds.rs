//! GDS daily weather files read by GenStPar.
//!
//! A header line names the station and its coordinates, followed by one line
//! per day: `YYMMDD` then maximum temperature, minimum temperature and
//! precipitation, each written to one decimal and at most five characters.

use {
    crate::constants::{GDS_HEADER_PADDING, GDS_HEADER_PREFIX},
    chrono::NaiveDate,
    std::io::{self, Write},
};

#[derive(Debug, Clone, PartialEq)]
pub struct GdsHeader {
    pub key: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GdsRecord {
    pub date: NaiveDate,
    pub tmax: f64,
    pub tmin: f64,
    pub precipitation: f64,
}

/// Decimal degrees to the `DDDMM` form GenStPar expects; minutes are truncated.
pub fn dd_to_dms(decimal_degrees: f64) -> String {
    let minutes = (decimal_degrees.abs() * 3600.0).div_euclid(60.0) as u64;
    format!("{:03}{:02}", minutes / 60, minutes % 60)
}

pub fn header_line(header: &GdsHeader) -> String {
    format!(
        "{}{}{}{}  {}{}",
        GDS_HEADER_PREFIX,
        header.key,
        " ".repeat(GDS_HEADER_PADDING),
        dd_to_dms(header.latitude),
        dd_to_dms(header.longitude),
        header.elevation
    )
}

fn field(value: f64) -> String {
    let mut s = format!("{:.1}", value);
    s.truncate(5);
    s
}

pub fn record_line(record: &GdsRecord) -> String {
    format!(
        "{}{}  {}  {}",
        record.date.format("%y%m%d"),
        field(record.tmax),
        field(record.tmin),
        field(record.precipitation)
    )
}

pub fn write<W: Write>(mut w: W, header: &GdsHeader, records: &[GdsRecord]) -> io::Result<()> {
    writeln!(w, "{}", header_line(header))?;
    for record in records {
        writeln!(w, "{}", record_line(record))?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use {super::*, insta::assert_snapshot};

    #[test]
    fn dms() {
        assert_eq!(dd_to_dms(44.5), "04430");
        assert_eq!(dd_to_dms(-92.53125), "09231");
        assert_eq!(dd_to_dms(5.25), "00515");
        assert_eq!(dd_to_dms(100.75), "10045");
    }

    #[test]
    fn header() {
        let header = GdsHeader {
            key: "GO1_L3_1_19".to_string(),
            latitude: 44.53125,
            longitude: 92.65625,
            elevation: 336,
        };
        assert_eq!(
            header_line(&header),
            format!("99048GO1_L3_1_19{}04431  09239336", " ".repeat(35))
        );
    }

    #[test]
    fn records() {
        let date = |d| NaiveDate::from_ymd(1965, 1, d);
        let records = [
            GdsRecord {
                date: date(1),
                tmax: -3.2,
                tmin: -14.8,
                precipitation: 0.0,
            },
            GdsRecord {
                date: date(2),
                tmax: 1.0,
                tmin: -6.5,
                precipitation: 12.4,
            },
        ];
        let header = GdsHeader {
            key: "K".to_string(),
            latitude: 1.0,
            longitude: 2.0,
            elevation: 3,
        };

        let mut buf = vec![];
        write(&mut buf, &header, &records).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let body: Vec<&str> = text.lines().skip(1).collect();

        assert_snapshot!(body.join("\n"), @r###"
        650101-3.2  -14.8  0.0
        6501021.0  -6.5  12.4
        "###);
    }

    #[test]
    fn long_values_are_cut() {
        assert_eq!(field(-102.46), "-102.");
        assert_eq!(field(102.46), "102.5");
    }
}
