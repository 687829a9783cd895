//! WEPP slope (`.slp`) files.

use crate::{
    formats::{parse_number, round_to, FormatError},
    stats,
};

/// Line holding the points of the first element; point lines alternate with
/// element headers from here on.
const FIRST_POINTS_LINE: usize = 8;

/// Mean slope steepness over every point of every element, to four places.
pub fn average_slope(text: &str) -> Result<f64, FormatError> {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() <= FIRST_POINTS_LINE {
        return Err(FormatError::Truncated {
            expected: FIRST_POINTS_LINE + 1,
            found: lines.len(),
        });
    }

    let mut slopes = vec![];
    let tokens = lines
        .iter()
        .enumerate()
        .skip(FIRST_POINTS_LINE)
        .step_by(2)
        .flat_map(|(i, line)| {
            line.split(|c: char| c.is_whitespace() || c == ',')
                .filter(|t| !t.is_empty())
                .map(move |t| (i, t))
        });
    // points are (distance, steepness) pairs
    for (i, token) in tokens.skip(1).step_by(2) {
        slopes.push(parse_number(token, i + 1)?);
    }

    Ok(round_to(stats::mean(&slopes), 4))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn average() {
        let slope = average_slope(include_str!("../testdata/p1.slp")).unwrap();
        assert_eq!(slope, 0.0317);
    }

    #[test]
    fn too_short() {
        assert_eq!(
            average_slope("97.5\n#\n"),
            Err(FormatError::Truncated {
                expected: 9,
                found: 2
            })
        );
    }
}
