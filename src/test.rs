//! Pipeline stages run in sequence on a small GO1 project.

use {
    crate::{
        analysis::{adoption, hillslope},
        climate::cligen,
        layout::{run_directory, Layout},
        parameters::Parameters,
        wepp::{management, prepare},
    },
    approx::assert_abs_diff_eq,
    lazy_static::lazy_static,
    std::{fs, path::Path},
    tempdir::TempDir,
};

struct Project {
    dir: TempDir,
    params: Parameters,
}

impl Project {
    fn layout(&self) -> Layout {
        Layout::new(&self.params, "GO1")
    }
}

/// Exported hillslope inputs are prepared, climate assigned and WEPP output
/// placed as if the baseline run had been simulated.
fn build_project() -> Project {
    let dir = TempDir::new("wepp-pipeline").unwrap();
    let mut params = Parameters::default();
    params.environment.project_directory = dir.path().to_path_buf();
    let layout = Layout::new(&params, "GO1");

    let base = layout.base_runs();
    fs::create_dir_all(&base).unwrap();
    let huc12 = params.watershed("GO1").unwrap().huc12.clone();
    for ext in &["man", "slp", "sol"] {
        let fixture = match *ext {
            "man" => include_str!("testdata/p1.man"),
            "slp" => include_str!("testdata/p1.slp"),
            _ => include_str!("testdata/p1.sol"),
        };
        fs::write(base.join(format!("{}1.{}", huc12, ext)), fixture).unwrap();
    }
    prepare::prepare(&params, "GO1").unwrap();

    let bcca = params.method("BCCA").unwrap();
    let par = layout.par(bcca);
    fs::create_dir_all(&par).unwrap();
    fs::write(par.join("GO1_B3_1_19.par"), include_str!("testdata/GO1_B3_1_19.top")).unwrap();
    fs::write(par.join("GO1_B3_1_19.cli"), include_str!("testdata/GO1_B3_1_19.cli")).unwrap();
    fs::write(layout.hillslope_coordinates(), "ID,Lat,Lon\np1,44.50,-92.70\n").unwrap();
    assert_eq!(cligen::assign(&params, "GO1", bcca).unwrap(), 1);

    let output = layout.output(run_directory("Base", "B3_19"));
    fs::create_dir_all(&output).unwrap();
    fs::write(output.join("H1.ebe.dat"), include_str!("testdata/H1.ebe.dat")).unwrap();
    fs::write(output.join("H1.loss.dat"), include_str!("testdata/H1.loss.dat")).unwrap();

    Project { dir, params }
}

lazy_static! {
    static ref PROJECT: Project = build_project();
}

#[test]
fn runs_share_prepared_inputs() {
    let layout = PROJECT.layout();
    for run in &["Base/B3_19", "CC/B3_59", "NC/L4_99"] {
        let runs = layout.runs(Path::new(run));
        assert!(runs.join("p1.run").exists(), "{}", run);
        assert!(runs.join("p1.sol").exists(), "{}", run);
    }
    let man = fs::read_to_string(layout.runs(Path::new("CC/B3_59")).join("p1.man")).unwrap();
    assert!(man.contains("60 # (total) years in simulation"));
    assert!(layout.hillslope_info().exists());
}

#[test]
fn climate_assigned_to_baseline_run() {
    let layout = PROJECT.layout();
    let cli = layout.runs(Path::new("Base/B3_19")).join("p1.cli");
    assert_eq!(
        fs::read_to_string(cli).unwrap(),
        include_str!("testdata/GO1_B3_1_19.cli")
    );
    assert!(!layout.runs(Path::new("CC/B3_59")).join("p1.cli").exists());
}

#[test]
fn baseline_summary() {
    let run = Path::new("Base/B3_19");
    let summary = hillslope::summarize(&PROJECT.params, "GO1", run).unwrap();
    assert_eq!(summary.hillslopes, 1);
    assert_eq!(summary.run, "Base_B3_19");

    let analysis = hillslope::analyze(&PROJECT.params, "GO1", run).unwrap();
    assert!(analysis.climate.is_some());
    let july = analysis
        .events
        .iter()
        .find(|e| e.month == 7 && e.year == 1)
        .unwrap();
    assert_abs_diff_eq!(july.intensity, 30.0 / 4.0, epsilon = 1e-9);

    let tables = PROJECT.layout().analysis().join("Base_B3_19");
    assert!(tables.join("hillslopes.csv").exists());
    assert!(tables.join("report.html").exists());
}

#[test]
fn perennials_replaced_in_scenario() {
    let source = PROJECT.dir.path().join("row_crops");
    fs::create_dir_all(&source).unwrap();
    fs::write(source.join("OFE_2.man"), "row crop management\n").unwrap();

    let runs = PROJECT.layout().runs(Path::new("Per/B3_59"));
    let replaced = management::remove_perennials(&runs, &source).unwrap();
    assert_eq!(replaced, vec!["p1".to_string()]);
    assert_eq!(
        fs::read_to_string(runs.join("p1.man")).unwrap(),
        "row crop management\n"
    );
}

#[test]
fn adoption_without_scenario_output() {
    let dir = PROJECT.layout().analysis().join("Adoption");
    assert_eq!(adoption::adoption(&PROJECT.params, "GO1").unwrap(), 4);
    assert!(dir.join("GO1_Cover_Cropping.csv").exists());
    assert!(dir.join("GO1_adoption.html").exists());
}
