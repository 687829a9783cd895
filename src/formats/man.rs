//! WEPP management (`.man`) files.

use {
    crate::formats::{join_lines, token_spans, FormatError},
    std::fmt,
};

const ROTATION_MARKER: &str = "# Rotation 1: year 1 to";
const TOTAL_YEARS_KEY: &str = "# (total) years in simulation";
const ROTATION_YEARS_KEY: &str = "# years in rotation";
/// Zero based line whose first field is the number of overland flow elements
const OFE_LINE: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crop {
    Corn,
    /// Second corn variety used by some rotations
    Corn2,
    Alfalfa,
    Soybean,
    Pasture,
    Wheat,
}

impl Crop {
    fn from_line(line: &str) -> Option<Self> {
        const PREFIXES: [(&str, Crop); 6] = [
            ("Corn", Crop::Corn),
            ("Cor_0967", Crop::Corn2),
            ("ALFALFA", Crop::Alfalfa),
            ("Soy_2194", Crop::Soybean),
            ("`Bromegrass-High", Crop::Pasture),
            ("Wheat", Crop::Wheat),
        ];
        PREFIXES
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix))
            .map(|(_, crop)| *crop)
    }

    pub fn is_perennial(self) -> bool {
        matches!(self, Crop::Alfalfa | Crop::Pasture)
    }
}

impl fmt::Display for Crop {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            Crop::Corn => "Corn",
            Crop::Corn2 => "Corn_2",
            Crop::Alfalfa => "Alf",
            Crop::Soybean => "Soy",
            Crop::Pasture => "Pasture",
            Crop::Wheat => "Wheat",
        };
        write!(f, "{}", label)
    }
}

/// Crops declared in the plant section, in file order. The second corn
/// variety is dropped when plain corn is also grown.
pub fn crops(text: &str) -> Vec<Crop> {
    let mut crops: Vec<Crop> = text.lines().filter_map(Crop::from_line).collect();
    if crops.contains(&Crop::Corn) {
        crops.retain(|c| *c != Crop::Corn2);
    }
    crops
}

/// Rotation name such as `Corn_Soy`
pub fn rotation_label(crops: &[Crop]) -> String {
    crops
        .iter()
        .map(Crop::to_string)
        .collect::<Vec<_>>()
        .join("_")
}

pub fn ofe_count(text: &str) -> Result<usize, FormatError> {
    let line = text.lines().nth(OFE_LINE).ok_or(FormatError::Truncated {
        expected: OFE_LINE + 1,
        found: text.lines().count(),
    })?;
    let token = line.split_whitespace().next().unwrap_or("");
    token.parse().map_err(|_| FormatError::Number {
        line: OFE_LINE + 1,
        token: token.to_string(),
    })
}

/// Replaces the leading count on simulation and rotation length lines.
fn set_year_count(line: &str, years: u32) -> String {
    if !(line.contains(TOTAL_YEARS_KEY) || line.contains(ROTATION_YEARS_KEY)) {
        return line.to_string();
    }
    match token_spans(line).first() {
        Some(&(s, e)) if line[s..e].parse::<u32>().is_ok() => {
            format!("{}{}{}", &line[..s], years, &line[e..])
        }
        _ => line.to_string(),
    }
}

/// Repeats the yearly blocks of the first rotation `repeats` times and sets
/// the simulation and rotation lengths to `years`.
///
/// The rotation marker and the two lines after it are not repeated.
pub fn extend_rotation(text: &str, repeats: usize, years: u32) -> Result<String, FormatError> {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines
        .iter()
        .position(|l| l.trim_start().starts_with(ROTATION_MARKER))
        .ok_or(FormatError::MissingKey(ROTATION_MARKER))?;
    let body = lines.get(start + 3..).unwrap_or(&[]);

    let mut out: Vec<String> = lines[..start]
        .iter()
        .map(|l| set_year_count(l, years))
        .collect();
    for _ in 0..repeats {
        out.extend(body.iter().map(|l| set_year_count(l, years)));
        out.push(String::new());
    }

    Ok(join_lines(&out))
}

/// Literal replacement, returning the new text and the number of replacements.
pub fn substitute(text: &str, from: &str, to: &str) -> (String, usize) {
    let count = text.matches(from).count();
    if count == 0 {
        (text.to_string(), 0)
    } else {
        (text.replace(from, to), count)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const MAN: &str = include_str!("../testdata/p1.man");

    #[test]
    fn rotation() {
        let crops = crops(MAN);
        assert_eq!(crops, vec![Crop::Corn, Crop::Soybean, Crop::Alfalfa]);
        assert_eq!(rotation_label(&crops), "Corn_Soy_Alf");
        assert!(crops.iter().any(|c| c.is_perennial()));
    }

    #[test]
    fn second_corn_kept_alone() {
        let crops = crops("Cor_0967\nSoy_2194\n");
        assert_eq!(rotation_label(&crops), "Corn_2_Soy");
    }

    #[test]
    fn ofes() {
        assert_eq!(ofe_count(MAN).unwrap(), 2);
        assert!(ofe_count("1\n2\n").is_err());
    }

    #[test]
    fn extend() {
        let extended = extend_rotation(MAN, 2, 60).unwrap();
        assert!(extended.contains("60  # years in rotation"));
        assert!(extended.contains("60 # (total) years in simulation"));
        assert!(!extended.contains(ROTATION_MARKER));

        let tail: Vec<&str> = extended
            .lines()
            .skip_while(|l| !l.contains("60 # (total)"))
            .collect();
        assert_eq!(
            tail,
            vec![
                "60 # (total) years in simulation",
                "60  # years in rotation",
                "#",
                "   1 # year index",
                "   Corn",
                "   2 # year index",
                "   Soy_2194",
                "",
                "   1 # year index",
                "   Corn",
                "   2 # year index",
                "   Soy_2194",
                "",
            ]
        );
    }

    #[test]
    fn extend_without_marker() {
        assert_eq!(
            extend_rotation("no rotation\n", 4, 60),
            Err(FormatError::MissingKey(ROTATION_MARKER))
        );
    }

    #[test]
    fn substitution_counts() {
        let (text, n) = substitute("a 0.5 b 0.5", "0.5", "0.0");
        assert_eq!((text.as_str(), n), ("a 0.0 b 0.0", 2));
        assert_eq!(substitute("abc", "x", "y"), ("abc".to_string(), 0));
    }
}
