//! Management scenario edits: tillage presets and rotation replacement.

use {
    crate::{
        formats::{man, read_text, write_text},
        parameters::Perennials,
        utils::{files_with_extension, hillslope_number, stem},
    },
    anyhow::{bail, Context, Result},
    log::debug,
    std::{fmt, fs, path::Path, str::FromStr},
};

/// Literal replacement applied to a `.man` file
type Edit = (&'static str, &'static str);

const ZEROED_OPERATION: &str = "0.0000 0.0000 0.0000 0.0000 0.0000 0.0000 0.0000";
const ZEROED_INTENSITY: &str = "0.0000 0.0000 0";

const COVER_CROP_MARKER: &str = "Ryegrass cover crop";
const KERNZA_MARKER: &str = "Kernza";

// Each operation is matched on its full parameter line before its shorter
// intensity line, which also occurs inside the full line.
const NO_TANDEM_DISK: [Edit; 2] = [
    ("0.0500 0.2300 0.5000 0.5000 0.0260 1.0000 0.1000", ZEROED_OPERATION),
    ("0.5000 0.5000 0", ZEROED_INTENSITY),
];
const NO_CHISEL_PLOW: [Edit; 2] = [
    ("0.0500 0.3000 0.5000 0.3000 0.0230 1.0000 0.1500", ZEROED_OPERATION),
    ("0.5000 0.3000 0", ZEROED_INTENSITY),
];
const LIGHT_CHISEL_PLOW: [Edit; 2] = [
    (
        "0.0500 0.3000 0.5000 0.3000 0.0230 1.0000 0.1500",
        "0.0500 0.3000 0.0000 0.3000 0.0230 1.0000 0.1500",
    ),
    ("0.5000 0.3000 0", "0.0000 0.3000 0"),
];
const NO_CULTIVATOR: [Edit; 2] = [
    ("0.0750 0.7500 0.4000 0.2000 0.0150 0.8500 0.0500", ZEROED_OPERATION),
    ("0.4000 0.2000 0", ZEROED_INTENSITY),
];
const LIGHT_FIELD_CULTIVATOR: [Edit; 2] = [
    (
        "0.0250 0.3000 0.6000 0.3500 0.0150 1.0000 0.0500",
        "0.0250 0.3000 0.5000 0.3500 0.0150 1.0000 0.0500",
    ),
    ("0.6000 0.3500 0", "0.5000 0.3500 0"),
];
const KERNZA_FIELD_CULTIVATOR: [Edit; 2] = [
    (
        "0.0250 0.3000 0.6000 0.3500 0.0150 1.0000 0.0500",
        "0.0250 0.3000 0.5000 0.0000 0.0150 1.0000 0.0500",
    ),
    ("0.6000 0.3500 0", "0.5000 0.0000 0"),
];

/// Tillage adjustments applied to every management file of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Removes the tandem disk
    Baseline,
    /// As baseline, also removing the chisel plow where a ryegrass cover crop is grown
    CoverCrop,
    /// Removes the tandem disk and mid-summer cultivator and lightens the
    /// field cultivator and chisel plow
    ReducedTillage,
}

impl Preset {
    pub const NAMES: [&'static str; 3] = ["baseline", "cover-crop", "reduced-tillage"];

    /// Replacements for a file, which depend on the crops it grows
    fn edits(self, text: &str) -> Vec<Edit> {
        let mut edits = NO_TANDEM_DISK.to_vec();
        match self {
            Preset::Baseline => {}
            Preset::CoverCrop => {
                if text.contains(COVER_CROP_MARKER) {
                    edits = [&NO_CHISEL_PLOW[..], &edits[..]].concat();
                }
            }
            Preset::ReducedTillage => {
                let kernza = text.contains(KERNZA_MARKER);
                edits.extend_from_slice(if kernza {
                    &KERNZA_FIELD_CULTIVATOR
                } else {
                    &LIGHT_FIELD_CULTIVATOR
                });
                edits.extend_from_slice(&NO_CULTIVATOR);
                edits.extend_from_slice(if kernza { &LIGHT_CHISEL_PLOW } else { &NO_CHISEL_PLOW });
            }
        }
        edits
    }

    /// Applies the preset, returning the edited text and number of replacements.
    pub fn apply(self, text: &str) -> (String, usize) {
        self.edits(text)
            .into_iter()
            .fold((text.to_string(), 0), |(text, count), (from, to)| {
                let (text, n) = man::substitute(&text, from, to);
                (text, count + n)
            })
    }
}

impl FromStr for Preset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "baseline" => Ok(Preset::Baseline),
            "cover-crop" => Ok(Preset::CoverCrop),
            "reduced-tillage" => Ok(Preset::ReducedTillage),
            _ => bail!("Unknown management preset \"{}\"", s),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Preset::Baseline => Preset::NAMES[0],
            Preset::CoverCrop => Preset::NAMES[1],
            Preset::ReducedTillage => Preset::NAMES[2],
        };
        write!(f, "{}", name)
    }
}

/// `p<n>.man` files of a runs directory with their hillslope numbers
fn hillslope_managements(dir: &Path) -> Result<Vec<(u32, std::path::PathBuf)>> {
    Ok(files_with_extension(dir, "man")?
        .into_iter()
        .filter(|p| stem(p).starts_with('p'))
        .filter_map(|p| hillslope_number(&stem(&p)).map(|n| (n, p)))
        .collect())
}

/// Applies `preset` to the management files in `dir`, or only to the
/// listed hillslopes. Returns the number of files changed.
pub fn adjust(dir: &Path, preset: Preset, hillslopes: Option<&[u32]>) -> Result<usize> {
    let mut changed = 0;
    for (number, path) in hillslope_managements(dir)? {
        if hillslopes.map_or(false, |selected| !selected.contains(&number)) {
            continue;
        }
        let (text, count) = preset.apply(&read_text(&path)?);
        if count > 0 {
            write_text(&path, &text)?;
            changed += 1;
        }
        debug!("{}: {} replacements", path.display(), count);
    }
    Ok(changed)
}

fn replace_management(source: &Path, template: &str, target: &Path) -> Result<()> {
    let from = source.join(template);
    fs::copy(&from, target)
        .with_context(|| format!("Failed to copy {} to {}", from.display(), target.display()))?;
    Ok(())
}

/// Replaces every hillslope growing alfalfa or pasture with the row crop file
/// `OFE_<n>.man` from `source` matching its number of elements. Returns the
/// replaced hillslopes.
pub fn remove_perennials(dir: &Path, source: &Path) -> Result<Vec<String>> {
    let mut replaced = vec![];
    for (_, path) in hillslope_managements(dir)? {
        let text = read_text(&path)?;
        if !man::crops(&text).iter().any(|c| c.is_perennial()) {
            continue;
        }
        let ofes = man::ofe_count(&text).with_context(|| format!("Failed to parse {}", path.display()))?;
        replace_management(source, &format!("OFE_{}.man", ofes), &path)?;
        replaced.push(stem(&path));
    }
    Ok(replaced)
}

/// Perennial rotation template for a hillslope with `ofes` elements
pub fn perennial_template(perennials: &Perennials, number: u32, ofes: usize) -> String {
    if perennials.corn_only.contains(&number) {
        format!("corn_alf_{}ofe.man", ofes)
    } else if perennials.kernza.contains(&number) {
        format!("IWG_{}ofe.man", ofes)
    } else {
        format!("corn_soy_alf_{}ofe.man", ofes)
    }
}

/// Replaces every hillslope in `dir` with its perennial rotation template
/// from `source`.
pub fn assign_perennials(dir: &Path, source: &Path, perennials: &Perennials) -> Result<usize> {
    let managements = hillslope_managements(dir)?;
    for (number, path) in &managements {
        let ofes = man::ofe_count(&read_text(path)?).with_context(|| format!("Failed to parse {}", path.display()))?;
        replace_management(source, &perennial_template(perennials, *number, ofes), path)?;
    }
    Ok(managements.len())
}
