//! WEPP event-by-event output (`H<n>.ebe.dat`).

use {
    crate::{
        constants::{EBE_HEADER_LINES, TONS_PER_KG},
        formats::{parse_number, read_text, FormatError},
    },
    anyhow::{Context, Result},
    std::path::Path,
};

const FIELDS: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EbeRecord {
    pub day: u32,
    pub month: u32,
    pub year: i32,
    /// Event precipitation (mm)
    pub precipitation: f64,
    /// Event runoff (mm)
    pub runoff: f64,
    /// Interrill detachment (kg/m²)
    pub interrill_detachment: f64,
    /// Average detachment (kg/m²)
    pub average_detachment: f64,
    pub max_detachment: f64,
    pub detachment_point: f64,
    pub average_deposition: f64,
    pub max_deposition: f64,
    pub deposition_point: f64,
    /// Sediment delivery per unit width (kg/m)
    pub sediment_delivery: f64,
    pub enrichment_ratio: f64,
}

impl EbeRecord {
    /// Soil loss (t/ha) over a hillslope of the given width (m) and area (ha).
    /// Hillslopes without area lose nothing.
    pub fn soil_loss(&self, width: f64, area: f64) -> f64 {
        if area > 0.0 {
            self.sediment_delivery * width * TONS_PER_KG / area
        } else {
            0.0
        }
    }

    /// Runoff exceeding precipitation comes from snowmelt
    pub fn is_snowmelt(&self) -> bool {
        self.precipitation <= self.runoff
    }
}

fn parse_record(line: &str, index: usize) -> Result<EbeRecord, FormatError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < FIELDS {
        return Err(FormatError::FieldCount {
            line: index + 1,
            expected: FIELDS,
            found: tokens.len(),
        });
    }
    let v = tokens[..FIELDS]
        .iter()
        .map(|t| parse_number(t, index + 1))
        .collect::<Result<Vec<f64>, _>>()?;

    Ok(EbeRecord {
        day: v[0] as u32,
        month: v[1] as u32,
        year: v[2] as i32,
        precipitation: v[3],
        runoff: v[4],
        interrill_detachment: v[5],
        average_detachment: v[6],
        max_detachment: v[7],
        detachment_point: v[8],
        average_deposition: v[9],
        max_deposition: v[10],
        deposition_point: v[11],
        sediment_delivery: v[12],
        enrichment_ratio: v[13],
    })
}

pub fn parse(text: &str) -> Result<Vec<EbeRecord>, FormatError> {
    text.lines()
        .enumerate()
        .skip(EBE_HEADER_LINES)
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| parse_record(line, i))
        .collect()
}

pub fn read<P: AsRef<Path>>(path: P) -> Result<Vec<EbeRecord>> {
    let path = path.as_ref();
    parse(&read_text(path)?).with_context(|| format!("Failed to parse {}", path.display()))
}
