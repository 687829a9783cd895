//! WEPP annual loss summary (`H<n>.loss.dat`); only the hillslope geometry is read.

use {
    crate::{
        constants::{LOSS_AREA_KEY, LOSS_WIDTH_KEY},
        formats::{numbers, read_text, FormatError},
    },
    anyhow::{Context, Result},
    std::path::Path,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HillslopeGeometry {
    /// Profile width (m)
    pub width: f64,
    /// Contributing area (ha)
    pub area: f64,
}

/// Second number on the last line containing `key`
fn last_value(text: &str, key: &'static str) -> Result<f64, FormatError> {
    text.lines()
        .filter(|line| line.contains(key))
        .filter_map(|line| numbers(line).get(1).copied())
        .last()
        .ok_or(FormatError::MissingKey(key))
}

pub fn parse(text: &str) -> Result<HillslopeGeometry, FormatError> {
    Ok(HillslopeGeometry {
        width: last_value(text, LOSS_WIDTH_KEY)?,
        area: last_value(text, LOSS_AREA_KEY)?,
    })
}

pub fn read<P: AsRef<Path>>(path: P) -> Result<HillslopeGeometry> {
    let path = path.as_ref();
    parse(&read_text(path)?).with_context(|| format!("Failed to parse {}", path.display()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn geometry() {
        let geometry = parse(include_str!("../testdata/H1.loss.dat")).unwrap();
        assert_eq!(
            geometry,
            HillslopeGeometry {
                width: 20.0,
                area: 0.5
            }
        );
    }

    #[test]
    fn missing_area() {
        assert_eq!(
            parse("    12.0 kg (based on profile width of   20.000 m)\n"),
            Err(FormatError::MissingKey(LOSS_AREA_KEY))
        );
    }
}
