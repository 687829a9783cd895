//! Directory layout of a watershed project.
//!
//! ```text
//! <project>/<watershed>/
//!     netCDF/<method>/         renamed extraction files
//!     GDS/<method>/            GDS text files and GenStPar output
//!     Uncalibrated/<method>/   GenStPar `.top` files as generated
//!     Uncalibrated/PAR/<method>/
//!     Calibrated/<method>/     calibrated `.top` files
//!     PAR/<method>/            `.par` and `.cli` files
//!     obs_data/                observed station and field records
//!     Runs/wepp/runs/          base WEPP inputs
//!     Runs/<scenario>/<climate>/wepp/{runs,output}/
//!     Analysis/                summary tables and reports
//! ```

use {
    crate::parameters::{Method, Parameters},
    std::path::{Path, PathBuf},
};

const WEPP: &str = "wepp";
const RUNS: &str = "runs";
const OUTPUT: &str = "output";

#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    watershed: String,
    root: PathBuf,
}

impl Layout {
    pub fn new(params: &Parameters, watershed: &str) -> Self {
        Layout {
            watershed: watershed.to_string(),
            root: params.environment.watershed_directory(watershed),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn netcdf(&self, method: &Method) -> PathBuf {
        self.root.join("netCDF").join(&method.name)
    }

    pub fn gds(&self, method: &Method) -> PathBuf {
        self.root.join("GDS").join(&method.name)
    }

    pub fn uncalibrated(&self, method: &Method) -> PathBuf {
        self.root.join("Uncalibrated").join(&method.name)
    }

    /// PAR and CLI files generated from uncalibrated parameters
    pub fn uncalibrated_par(&self, method: &Method) -> PathBuf {
        self.root.join("Uncalibrated").join("PAR").join(&method.name)
    }

    pub fn calibrated(&self, method: &Method) -> PathBuf {
        self.root.join("Calibrated").join(&method.name)
    }

    pub fn par(&self, method: &Method) -> PathBuf {
        self.root.join("PAR").join(&method.name)
    }

    /// Observed record `<watershed>_<kind>.csv`
    pub fn observed(&self, kind: &str) -> PathBuf {
        self.root
            .join("obs_data")
            .join(format!("{}_{}.csv", self.watershed, kind))
    }

    /// Hillslope coordinate table used to assign climate files
    pub fn hillslope_coordinates(&self) -> PathBuf {
        self.root.join("hillslope_coords.csv")
    }

    /// Hillslope rotation, slope and soil summary written when preparing runs
    pub fn hillslope_info(&self) -> PathBuf {
        self.root.join(format!("{}_info.csv", self.watershed))
    }

    pub fn runs_root(&self) -> PathBuf {
        self.root.join("Runs")
    }

    /// `wepp` directory every scenario run is copied from
    pub fn base_wepp(&self) -> PathBuf {
        self.runs_root().join(WEPP)
    }

    pub fn base_runs(&self) -> PathBuf {
        self.base_wepp().join(RUNS)
    }

    /// Stem of a climate file, e.g. `GO1_B3_1_19`
    pub fn climate_stem(&self, model: &str, location: u32, period: &str) -> String {
        format!("{}_{}_{}_{}", self.watershed, model, location, period)
    }

    /// `wepp` directory of one scenario and climate run. The run directory
    /// may itself be nested, e.g. `DF_Comp3/Obs_full`.
    pub fn wepp<P: AsRef<Path>>(&self, run: P) -> PathBuf {
        self.runs_root().join(run).join(WEPP)
    }

    pub fn runs<P: AsRef<Path>>(&self, run: P) -> PathBuf {
        self.wepp(run).join(RUNS)
    }

    pub fn output<P: AsRef<Path>>(&self, run: P) -> PathBuf {
        self.wepp(run).join(OUTPUT)
    }

    /// Tables and reports written by the analyses
    pub fn analysis(&self) -> PathBuf {
        self.root.join("Analysis")
    }
}

/// Relative run directory of a scenario under a climate, e.g. `CC/B3_59`
pub fn run_directory(scenario: &str, climate: &str) -> PathBuf {
    Path::new(scenario).join(climate)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn paths() {
        let params = Parameters::default();
        let layout = Layout::new(&params, "GO1");
        let bcca = params.method("BCCA").unwrap();

        assert_eq!(layout.gds(bcca), Path::new("WEPP_PRWs/GO1/GDS/BCCA"));
        assert_eq!(
            layout.observed("daily"),
            Path::new("WEPP_PRWs/GO1/obs_data/GO1_daily.csv")
        );
        assert_eq!(
            layout.output(run_directory("CC", "B3_59")),
            Path::new("WEPP_PRWs/GO1/Runs/CC/B3_59/wepp/output")
        );
        assert_eq!(layout.base_runs(), Path::new("WEPP_PRWs/GO1/Runs/wepp/runs"));
        assert_eq!(layout.climate_stem("L4", 3, "99"), "GO1_L4_3_99");
    }
}
