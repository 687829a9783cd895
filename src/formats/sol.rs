//! WEPP soil (`.sol`) files.
//!
//! Each overland flow element starts with a line holding, from the end:
//! effective conductivity, critical shear, rill and interrill erodibility.
//! The element lines are found by their `0.750000` initial saturation.

use {
    crate::{
        constants::SOL_OFE_MARKER,
        formats::{parse_number, token_spans, FormatError},
        stats,
    },
    serde::Serialize,
};

const FIRST_LAYER_LINE: usize = 4;
const EMPTY_LAYER: &str = "0 0.000000 0";

fn is_ofe_line(line: &str) -> bool {
    line.contains(SOL_OFE_MARKER)
}

/// Rewrites the token `from_end` places before the end of the line (1 is the
/// last) with `f` applied to its value. Spacing is left untouched.
fn map_token<F>(line: &str, from_end: usize, index: usize, f: F) -> Result<String, FormatError>
where
    F: Fn(f64) -> String,
{
    let spans = token_spans(line);
    if spans.len() < from_end {
        return Err(FormatError::FieldCount {
            line: index + 1,
            expected: from_end,
            found: spans.len(),
        });
    }
    let (s, e) = spans[spans.len() - from_end];
    let value = parse_number(&line[s..e], index + 1)?;
    Ok(format!("{}{}{}", &line[..s], f(value), &line[e..]))
}

fn map_ofe_lines<F>(text: &str, f: F) -> Result<String, FormatError>
where
    F: Fn(&str, usize) -> Result<String, FormatError>,
{
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.lines().enumerate() {
        if is_ofe_line(line) {
            out.push_str(&f(line, i)?);
        } else {
            out.push_str(line);
        }
        out.push('\n');
    }
    Ok(out)
}

/// Multiplies the effective hydraulic conductivity of every element.
pub fn scale_keff(text: &str, factor: f64) -> Result<String, FormatError> {
    map_ofe_lines(text, |line, i| {
        map_token(line, 1, i, |keff| format!("{:.2}", keff * factor))
    })
}

/// Multiplies the interrill (`ki`) and rill (`kr`) erodibility of every element.
pub fn scale_erodibility(text: &str, ki: f64, kr: f64) -> Result<String, FormatError> {
    map_ofe_lines(text, |line, i| {
        let line = map_token(line, 4, i, |v| format!("{:.6}", v * ki))?;
        map_token(&line, 3, i, |v| format!("{:.6}", v * kr))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Texture {
    /// Mean sand content of all layers (%)
    pub sand: f64,
    /// Mean clay content of all layers (%)
    pub clay: f64,
}

/// Average texture of the soil layers
pub fn texture(text: &str) -> Result<Texture, FormatError> {
    let mut sand = vec![];
    let mut clay = vec![];

    for (i, line) in text.lines().enumerate().skip(FIRST_LAYER_LINE) {
        if is_ofe_line(line) || line.contains(EMPTY_LAYER) {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 3 {
            continue;
        }
        sand.push(parse_number(tokens[1], i + 1)?);
        clay.push(parse_number(tokens[2], i + 1)?);
    }

    Ok(Texture {
        sand: stats::mean(&sand),
        clay: stats::mean(&clay),
    })
}

#[cfg(test)]
mod test {
    use {super::*, approx::assert_abs_diff_eq};

    const SOL: &str = include_str!("../testdata/p1.sol");

    fn ofe_line(text: &str) -> &str {
        text.lines().find(|l| is_ofe_line(l)).unwrap()
    }

    #[test]
    fn keff() {
        let scaled = scale_keff(SOL, 3.0).unwrap();
        assert_eq!(
            ofe_line(&scaled),
            "'FAYETTE' 'silt loam' 2 0.230000 0.750000 4649000.000000 0.004000 3.500000 37.50"
        );
        assert_eq!(scaled.lines().count(), SOL.lines().count());
    }

    #[test]
    fn erodibility() {
        let scaled = scale_erodibility(SOL, 1.35, 1.0).unwrap();
        assert_eq!(
            ofe_line(&scaled),
            "'FAYETTE' 'silt loam' 2 0.230000 0.750000 6276150.000000 0.004000 3.500000 12.500000"
        );
    }

    #[test]
    fn unchanged_layers() {
        let scaled = scale_keff(SOL, 2.0).unwrap();
        let layers = |t: &str| t.lines().skip(6).map(str::to_string).collect::<Vec<_>>();
        assert_eq!(layers(&scaled), layers(SOL));
    }

    #[test]
    fn layer_texture() {
        let texture = texture(SOL).unwrap();
        assert_abs_diff_eq!(texture.sand, 15.0);
        assert_abs_diff_eq!(texture.clay, 25.0);
    }

    #[test]
    fn bad_keff() {
        let text = "a\nb\nc\nd\n1 1\nx 0.750000 y\n";
        assert_eq!(
            scale_keff(text, 2.0),
            Err(FormatError::Number {
                line: 6,
                token: "y".to_string()
            })
        );
    }
}
