//! Turns the hillslope inputs exported for a HUC12 watershed into a base WEPP
//! project and copies it into every scenario and climate run directory.

use {
    crate::{
        climate::cligen::climate_runs,
        formats::{man, read_text, run, slp, sol, write_text},
        layout::Layout,
        parameters::Parameters,
        report::tables::write_csv,
        utils::{copy_dir_all, file_name, files_with_extension, stem},
    },
    anyhow::{Context, Result},
    log::{debug, info},
    serde::Serialize,
    std::{
        fs,
        path::{Path, PathBuf},
    },
};

/// Summary of one hillslope's inputs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HillslopeInfo {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Rotation")]
    pub rotation: String,
    #[serde(rename = "OFE")]
    pub ofes: usize,
    #[serde(rename = "Avg slope")]
    pub average_slope: f64,
    #[serde(rename = "Sand (%)")]
    pub sand: f64,
    #[serde(rename = "Clay (%)")]
    pub clay: f64,
}

/// Renames files whose names start with the HUC12 ID to `p<rest>`, e.g.
/// `07040001060112.man` to `p12.man`.
pub fn rename_hillslope_files(dir: &Path, huc12: &str) -> Result<usize> {
    let mut count = 0;
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))? {
        let path = entry?.path();
        let name = file_name(&path);
        if let Some(rest) = name.strip_prefix(huc12) {
            let target = dir.join(format!("p{}", rest.trim_start_matches('_')));
            fs::rename(&path, &target)
                .with_context(|| format!("Failed to rename {} to {}", path.display(), target.display()))?;
            count += 1;
        }
    }
    Ok(count)
}

/// Hillslope number of a `p<n>` input file
fn input_id(path: &Path) -> String {
    stem(path).trim_start_matches('p').to_string()
}

/// Writes `p<n>.run` next to every `p<n>.man`.
pub fn write_run_files(dir: &Path, years: u32) -> Result<usize> {
    let managements = files_with_extension(dir, "man")?;
    for path in &managements {
        let id = input_id(path);
        write_text(dir.join(format!("p{}.run", id)), &run::script(&id, years))?;
    }
    Ok(managements.len())
}

/// Rotation, slope and texture of every hillslope with a `.man` file
pub fn hillslope_info(dir: &Path) -> Result<Vec<HillslopeInfo>> {
    files_with_extension(dir, "man")?
        .iter()
        .map(|path| {
            let management = read_text(path)?;
            let crops = man::crops(&management);
            let slope = slp::average_slope(&read_text(path.with_extension("slp"))?)?;
            let texture = sol::texture(&read_text(path.with_extension("sol"))?)?;

            Ok(HillslopeInfo {
                id: stem(path),
                rotation: man::rotation_label(&crops),
                ofes: man::ofe_count(&management)?,
                average_slope: slope,
                sand: texture.sand,
                clay: texture.clay,
            })
        })
        .collect()
}

/// Repeats the rotation of every `.man` file to cover `years` years.
pub fn extend_rotations(dir: &Path, repeats: usize, years: u32) -> Result<usize> {
    let managements = files_with_extension(dir, "man")?;
    for path in &managements {
        let extended = man::extend_rotation(&read_text(path)?, repeats, years)
            .with_context(|| format!("Failed to extend rotation of {}", path.display()))?;
        write_text(path, &extended)?;
    }
    Ok(managements.len())
}

/// Multiplies Keff of every `.sol` file in `dir`.
pub fn scale_keff(dir: &Path, factor: f64) -> Result<usize> {
    edit_soils(dir, |text| sol::scale_keff(text, factor))
}

/// Multiplies interrill and rill erodibility of every `.sol` file in `dir`.
pub fn scale_erodibility(dir: &Path, ki: f64, kr: f64) -> Result<usize> {
    edit_soils(dir, |text| sol::scale_erodibility(text, ki, kr))
}

fn edit_soils<F>(dir: &Path, edit: F) -> Result<usize>
where
    F: Fn(&str) -> Result<String, crate::formats::FormatError>,
{
    let soils = files_with_extension(dir, "sol")?;
    for path in &soils {
        let edited = edit(&read_text(path)?).with_context(|| format!("Failed to edit {}", path.display()))?;
        write_text(path, &edited)?;
    }
    Ok(soils.len())
}

/// Copies the base `wepp` directory into the run directory of every model
/// and period.
pub fn create_run_directories(params: &Parameters, layout: &Layout) -> Result<Vec<PathBuf>> {
    let base = layout.base_wepp();
    let mut created = vec![];
    for method in &params.climate.methods {
        for model in &method.models {
            for period in &params.climate.periods {
                for run in climate_runs(params, model, &period.label) {
                    let wepp = layout.wepp(&run);
                    copy_dir_all(&base, &wepp)?;
                    debug!("Created {}", wepp.display());
                    created.push(wepp);
                }
            }
        }
    }
    Ok(created)
}

/// Prepares the base runs directory of a watershed and creates the scenario
/// run directories from it.
///
/// Rotations are extended in place, so this is meant to run once on freshly
/// exported inputs.
pub fn prepare(params: &Parameters, watershed: &str) -> Result<()> {
    let shed = params
        .watershed(watershed)
        .with_context(|| format!("Unknown watershed {}", watershed))?;
    let layout = Layout::new(params, watershed);
    let runs = layout.base_runs();
    let management = &params.management;

    let renamed = rename_hillslope_files(&runs, &shed.huc12)?;
    info!("Renamed {} files in {}", renamed, runs.display());

    let count = write_run_files(&runs, management.simulation_years)?;
    info!("Wrote {} .run files", count);

    let hillslopes = hillslope_info(&runs)?;
    write_csv(layout.hillslope_info(), &hillslopes)?;
    info!("Wrote hillslope summary to {}", layout.hillslope_info().display());

    extend_rotations(&runs, management.rotation_repeats, management.simulation_years)?;
    info!("Extended rotations to {} years", management.simulation_years);

    scale_keff(&runs, shed.keff_factor)?;
    info!("Scaled Keff by {}", shed.keff_factor);

    let created = create_run_directories(params, &layout)?;
    info!("Created {} run directories", created.len());
    Ok(())
}

#[cfg(test)]
mod test {
    use {super::*, approx::assert_abs_diff_eq, tempdir::TempDir};

    fn write_inputs(dir: &Path, prefix: &str) {
        fs::write(dir.join(format!("{}.man", prefix)), include_str!("../testdata/p1.man")).unwrap();
        fs::write(dir.join(format!("{}.slp", prefix)), include_str!("../testdata/p1.slp")).unwrap();
        fs::write(dir.join(format!("{}.sol", prefix)), include_str!("../testdata/p1.sol")).unwrap();
    }

    #[test]
    fn renames_exported_files() {
        let dir = TempDir::new("prepare").unwrap();
        write_inputs(dir.path(), "0704000106011");
        fs::write(dir.path().join("other.txt"), "").unwrap();

        assert_eq!(rename_hillslope_files(dir.path(), "070400010601").unwrap(), 3);
        assert!(dir.path().join("p1.man").exists());
        assert!(dir.path().join("p1.sol").exists());
        assert!(dir.path().join("other.txt").exists());
    }

    #[test]
    fn run_files_and_info() {
        let dir = TempDir::new("prepare").unwrap();
        write_inputs(dir.path(), "p1");

        assert_eq!(write_run_files(dir.path(), 60).unwrap(), 1);
        let script = fs::read_to_string(dir.path().join("p1.run")).unwrap();
        assert!(script.contains("../output/H1.ebe.dat"));

        let info = hillslope_info(dir.path()).unwrap();
        assert_eq!(info.len(), 1);
        assert_eq!(info[0].id, "p1");
        assert_eq!(info[0].rotation, "Corn_Soy_Alf");
        assert_eq!(info[0].ofes, 2);
        assert_abs_diff_eq!(info[0].average_slope, 0.0317);
        assert_abs_diff_eq!(info[0].sand, 15.0);
    }

    #[test]
    fn base_project() {
        let dir = TempDir::new("prepare").unwrap();
        let mut params = Parameters::default();
        params.environment.project_directory = dir.path().to_path_buf();
        let layout = Layout::new(&params, "GO1");
        let runs = layout.base_runs();
        fs::create_dir_all(&runs).unwrap();
        let huc12 = params.watershed("GO1").unwrap().huc12.clone();
        write_inputs(&runs, &format!("{}1", huc12));

        prepare(&params, "GO1").unwrap();

        let man = fs::read_to_string(runs.join("p1.man")).unwrap();
        assert!(man.contains("60 # (total) years in simulation"));
        assert!(runs.join("p1.run").exists());
        assert!(layout.hillslope_info().exists());

        let base = layout.runs(crate::layout::run_directory("Base", "B3_19"));
        assert!(base.join("p1.man").exists());
        assert!(layout.runs(crate::layout::run_directory("NC", "L4_99")).join("p1.sol").exists());
        assert!(!layout.wepp(crate::layout::run_directory("CC", "B3_19")).exists());
    }
}
