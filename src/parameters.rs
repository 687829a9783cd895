use {
    serde::Deserialize,
    std::path::{Path, PathBuf},
};

/// Study parameters
#[derive(Debug, PartialEq, Deserialize)]
pub struct Parameters {
    pub environment: Environment,
    pub climate: Climate,
    pub analysis: Analysis,
    pub management: Management,
    pub watersheds: Vec<Watershed>,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            environment: Environment::default(),
            climate: Climate::default(),
            analysis: Analysis::default(),
            management: Management::default(),
            watersheds: vec![
                Watershed::new("BE1", "070200110305", 299, [0.0, 0.0, 0.0, 0.07, 0.08, 0.0, 0.0, 0.0, 0.0, 0.08, 0.0, 0.0], 2),
                Watershed::new("DO1", "070400040109", 388, [0.0, 0.0, 0.0, 0.04, -0.18, 0.1, 0.47, 0.0, 0.0, -0.04, 0.0, 0.0], 2),
                Watershed::new("GO1", "070400010601", 336, [0.0, 0.0, 0.0, 0.13, -0.07, 0.0, -0.16, 0.0, 0.0, 0.0, 0.0, 0.0], 1),
                Watershed::new("RO1", "101702031504", 462, [0.0, 0.0, 0.0, -0.07, 0.04, 0.03, 0.23, -0.16, -0.05, 0.07, 0.0, 0.0], 2),
                Watershed::new("ST1", "070102020303", 402, [0.0, 0.0, 0.0, -0.05, 0.17, 0.12, 0.0, 0.18, 0.0, 0.0, 0.0, 0.0], 4),
            ]
            .into_iter()
            .map(Watershed::with_study_defaults)
            .collect(),
        }
    }
}

impl Parameters {
    /// Looks up a watershed by name
    pub fn watershed(&self, name: &str) -> Option<&Watershed> {
        self.watersheds.iter().find(|w| w.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.climate
            .methods
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
    }

    /// Method whose model labels include `model`
    pub fn method_of_model(&self, model: &str) -> Option<&Method> {
        self.climate
            .methods
            .iter()
            .find(|m| m.models.iter().any(|x| x == model))
    }

    pub fn period(&self, label: &str) -> Option<&Period> {
        self.climate.periods.iter().find(|p| p.label == label)
    }

    pub fn baseline(&self) -> Option<&Period> {
        self.period(&self.climate.baseline_period)
    }

    /// Number of simulated years for a climate label such as `B3_59`
    pub fn years_of_climate(&self, climate: &str) -> Option<u32> {
        climate
            .rsplit('_')
            .next()
            .and_then(|suffix| self.period(suffix))
            .or_else(|| self.baseline())
            .map(|p| p.cligen_years)
    }
}

#[derive(Debug, PartialEq, Deserialize)]
pub struct Environment {
    /// Directory holding one subdirectory per watershed
    pub project_directory: PathBuf,
    /// Tab or comma separated index of CLIGEN stations (station, lat, lon)
    pub stations_file: PathBuf,
    /// Directory containing the station `.par` files named in `stations_file`
    pub stations_directory: PathBuf,
    /// GenStPar executable
    pub genstpar: PathBuf,
    /// CLIGEN executable
    pub cligen: PathBuf,
    /// WEPP hillslope executable
    pub wepp: PathBuf,
    /// Host of the downscaled projection archive
    pub ftp_host: String,
    /// Remote directory containing subset jobs
    pub ftp_root: String,
    /// Directory summary tables and plots are written to
    pub output_directory: PathBuf,
}

impl Default for Environment {
    fn default() -> Self {
        Environment {
            project_directory: PathBuf::from("WEPP_PRWs"),
            stations_file: PathBuf::from("stations/MN_stations.csv"),
            stations_directory: PathBuf::from("stations/par"),
            genstpar: PathBuf::from("GenStPar.exe"),
            cligen: PathBuf::from("cligen53.exe"),
            wepp: PathBuf::from("wepp"),
            ftp_host: "gdo-dcp.ucllnl.org".to_string(),
            ftp_root: "/pub/dcp/subset".to_string(),
            output_directory: PathBuf::from("comparisons"),
        }
    }
}

impl Environment {
    pub fn watershed_directory(&self, watershed: &str) -> PathBuf {
        self.project_directory.join(watershed)
    }

    /// Resolves a configured path against the project directory when relative
    pub fn resolve<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_directory.join(path)
        }
    }
}

#[derive(Debug, PartialEq, Deserialize)]
pub struct Climate {
    /// NetCDF variable names of the extracted fields
    pub variables: ClimateVariables,
    /// Downscaling methods
    pub methods: Vec<Method>,
    /// Simulation periods, labelled by the last two digits of their end year
    pub periods: Vec<Period>,
    /// Label of the historical period used as the calibration baseline
    pub baseline_period: String,
    /// Daily precipitation values (mm) treated as trace and set to zero
    pub low_precipitation: Vec<f64>,
    /// Upper limit of the SKEW P parameter accepted by CLIGEN
    pub skew_cap: f64,
    /// How the model change is applied to the calibrated baseline
    pub delta: DeltaMode,
}

impl Default for Climate {
    fn default() -> Self {
        let models = |tag: &str| (1..=6).map(|i| format!("{}{}", tag, i)).collect();

        Climate {
            variables: ClimateVariables::default(),
            methods: vec![
                Method {
                    name: "LOCA".to_string(),
                    tag: "L".to_string(),
                    archive_directory: "loca5".to_string(),
                    latitude: "lat".to_string(),
                    longitude: "lon".to_string(),
                    projection: "projection".to_string(),
                    time: "time".to_string(),
                    models: models("L"),
                },
                Method {
                    name: "BCCA".to_string(),
                    tag: "B".to_string(),
                    archive_directory: "bcca5".to_string(),
                    latitude: "latitude".to_string(),
                    longitude: "longitude".to_string(),
                    projection: "projection".to_string(),
                    time: "time".to_string(),
                    models: models("B"),
                },
            ],
            periods: vec![
                Period::new("19", 1965, 2019, 55),
                Period::new("59", 2020, 2059, 40),
                Period::new("99", 2060, 2099, 40),
            ],
            baseline_period: "19".to_string(),
            low_precipitation: vec![0.1, 0.2, 0.3],
            skew_cap: 4.3,
            delta: DeltaMode::Absolute,
        }
    }
}

#[derive(Debug, PartialEq, Deserialize)]
pub struct ClimateVariables {
    pub precipitation: String,
    pub max_temperature: String,
    pub min_temperature: String,
}

impl Default for ClimateVariables {
    fn default() -> Self {
        ClimateVariables {
            precipitation: "pr".to_string(),
            max_temperature: "tasmax".to_string(),
            min_temperature: "tasmin".to_string(),
        }
    }
}

/// A statistical downscaling method and the layout of its extraction files
#[derive(Debug, PartialEq, Deserialize)]
pub struct Method {
    pub name: String,
    /// Single letter appended to watershed names of extraction files
    pub tag: String,
    /// Archive subdirectory holding the method's extraction files
    pub archive_directory: String,
    pub latitude: String,
    pub longitude: String,
    pub projection: String,
    pub time: String,
    /// Labels given to the projections, in file order
    pub models: Vec<String>,
}

#[derive(Debug, PartialEq, Deserialize)]
pub struct Period {
    pub label: String,
    pub start_year: i32,
    pub end_year: i32,
    /// Years CLIGEN generates for the period
    pub cligen_years: u32,
}

impl Period {
    fn new(label: &str, start_year: i32, end_year: i32, cligen_years: u32) -> Self {
        Period {
            label: label.to_string(),
            start_year,
            end_year,
            cligen_years,
        }
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.start_year..=self.end_year).contains(&year)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeltaMode {
    /// Magnitude of the model change is added to the calibrated baseline
    Absolute,
    /// Signed model change is added to the calibrated baseline
    Signed,
}

#[derive(Debug, PartialEq, Deserialize)]
pub struct Analysis {
    /// Months summarised by the hillslope analyses
    pub growing_season: Season,
    /// Seasons used for event scatter plots
    pub event_seasons: Vec<Season>,
    /// Seasons used for CLIGEN trend comparisons
    pub trend_seasons: Vec<Season>,
    /// Upper depth (mm) of light, moderate and heavy storms; deeper storms are intense
    pub storm_limits: [f64; 3],
    /// Depth (mm) above which a day counts as heavy precipitation
    pub heavy_precipitation: f64,
    /// Average annual soil loss (t/ha) above which a hillslope is unsustainable
    pub sustainable_soil_loss: f64,
    /// Precipitation bins (mm) for the calibration and validation split
    pub precipitation_bins: Vec<[f64; 2]>,
    /// Runoff bins (mm) for the calibration and validation split
    pub runoff_bins: Vec<[f64; 2]>,
    /// Climate labels compared in adoption curves
    pub climates: Vec<String>,
}

impl Default for Analysis {
    fn default() -> Self {
        let mut precipitation_bins: Vec<[f64; 2]> = (0..11)
            .map(|i| [i as f64 * 10.0, (i + 1) as f64 * 10.0])
            .collect();
        precipitation_bins.push([110.0, 300.0]);

        Analysis {
            growing_season: Season::new("Growing", &[4, 5, 6, 7, 8, 9, 10, 11]),
            event_seasons: vec![
                Season::new("Spring", &[4, 5]),
                Season::new("Summer", &[6, 7, 8]),
                Season::new("Fall", &[9, 10, 11]),
                Season::new("Growing", &[4, 5, 6, 7, 8, 9, 10, 11]),
            ],
            trend_seasons: vec![
                Season::new("Winter", &[12, 1, 2]),
                Season::new("Spring", &[3, 4, 5]),
                Season::new("Summer", &[6, 7, 8]),
                Season::new("Fall", &[9, 10, 11]),
            ],
            storm_limits: [10.0, 25.0, 50.0],
            heavy_precipitation: 25.0,
            sustainable_soil_loss: 12.5,
            precipitation_bins,
            runoff_bins: vec![[0.0, 5.0], [5.0, 10.0], [10.0, 15.0], [15.0, 25.0], [25.0, 50.0]],
            climates: ["B3_59", "B3_99", "B4_59", "B4_99", "L3_59", "L3_99", "L4_59", "L4_99"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Season {
    pub name: String,
    pub months: Vec<u32>,
}

impl Season {
    pub fn new(name: &str, months: &[u32]) -> Self {
        Season {
            name: name.to_string(),
            months: months.to_vec(),
        }
    }

    pub fn contains(&self, month: u32) -> bool {
        self.months.contains(&month)
    }
}

#[derive(Debug, PartialEq, Deserialize)]
pub struct Management {
    /// Future management scenario labels
    pub scenarios: Vec<String>,
    /// Scenario directory holding the baseline-period runs
    pub base_scenario: String,
    /// Years WEPP simulates, and the length rotations are extended to
    pub simulation_years: u32,
    /// Times the rotation block is written when extending rotations
    pub rotation_repeats: usize,
}

impl Default for Management {
    fn default() -> Self {
        Management {
            scenarios: ["CC", "CT", "Comb", "Per", "NC"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            base_scenario: "Base".to_string(),
            simulation_years: 60,
            rotation_repeats: 4,
        }
    }
}

/// A HUC12 study watershed
#[derive(Debug, PartialEq, Deserialize)]
pub struct Watershed {
    pub name: String,
    pub huc12: String,
    /// Station elevation written to GDS headers
    pub elevation: u32,
    /// Monthly corrections added to the observed precipitation standard deviation
    pub stdev_adjustment: [f64; 12],
    /// Factor applied to Keff when preparing runs
    pub keff_factor: f64,
    /// Projection used as the observed station's baseline
    pub station_model: String,
    /// Grid location of the observed station
    pub station_location: u32,
    pub delivery: Option<Delivery>,
    pub edge_of_field: Option<EdgeOfField>,
    pub perennials: Perennials,
    pub adoption: Vec<AdoptionGroup>,
}

impl Watershed {
    fn new(name: &str, huc12: &str, elevation: u32, stdev_adjustment: [f64; 12], station_location: u32) -> Self {
        Watershed {
            name: name.to_string(),
            huc12: huc12.to_string(),
            elevation,
            stdev_adjustment,
            keff_factor: 1.0,
            station_model: "B3".to_string(),
            station_location,
            delivery: None,
            edge_of_field: None,
            perennials: Perennials::default(),
            adoption: vec![],
        }
    }

    fn with_study_defaults(mut self) -> Self {
        let (delivery, edge, adoption) = match self.name.as_str() {
            "BE1" => (None, EdgeOfField::new("p221", "DF_Comp3/Obs_full", 11..=15, 2012..=2016, &[2013, 2015], &[2012, 2014, 2016], 0.86), None),
            "DO1" => (
                Delivery::new(0.0645, 0.129, 15.8),
                EdgeOfField::new("p206", "DF_Comp3/Obs_full", 22..=28, 2013..=2019, &[2013, 2015, 2017, 2019], &[2014, 2016, 2018], 0.81),
                Some([0.0, 25.0, 45.0, 72.0]),
            ),
            "GO1" => (
                Delivery::new(0.0643, 0.131, 10.7),
                EdgeOfField::new("p66", "DF_Comp3/Obs_full", 31..=36, 2011..=2016, &[2011, 2012], &[2013, 2014, 2015, 2016], 0.85),
                Some([0.0, 42.0, 62.0, 79.1]),
            ),
            "RO1" => (None, EdgeOfField::new("p77", "DF_Comp5/Obs_full", 13..=18, 2014..=2019, &[2015, 2016, 2017, 2019], &[2014, 2018], 0.835), None),
            "ST1" => (
                Delivery::new(0.0296, 0.013, 13.8),
                EdgeOfField::new("p154", "DF_Comp/Obs_full", 8..=14, 2011..=2017, &[2011, 2012, 2013], &[2014, 2015, 2016, 2017], 0.83),
                Some([0.0, 30.0, 50.0, 66.0]),
            ),
            _ => return self,
        };
        self.delivery = delivery;
        self.edge_of_field = Some(edge);
        if let Some(perennial) = adoption {
            self.adoption = AdoptionGroup::study_groups(&perennial);
        }
        self
    }
}

/// Sediment delivery to the watershed outlet
#[derive(Debug, PartialEq, Deserialize)]
pub struct Delivery {
    /// Sediment delivery ratio
    pub sdr: f64,
    /// TMDL sediment delivery limit (t/ha)
    pub tmdl_sediment: f64,
    /// TMDL runoff limit (mm)
    pub tmdl_runoff: f64,
}

impl Delivery {
    fn new(sdr: f64, tmdl_sediment: f64, tmdl_runoff: f64) -> Option<Self> {
        Some(Delivery {
            sdr,
            tmdl_sediment,
            tmdl_runoff,
        })
    }
}

/// Edge-of-field monitoring site used to calibrate WEPP
#[derive(Debug, PartialEq, Deserialize)]
pub struct EdgeOfField {
    /// Hillslope simulated for the monitored field
    pub hillslope: String,
    /// Run directory below `Runs/` holding the field simulation
    pub run_directory: PathBuf,
    /// CLIGEN years paired, in order, with `observed_years`
    pub cli_years: Vec<u32>,
    pub observed_years: Vec<i32>,
    /// Observed years under the first crop of the rotation
    pub first_crop_years: Vec<i32>,
    /// Observed years under the second crop of the rotation
    pub second_crop_years: Vec<i32>,
    /// Fraction of observed TSS that is mineral sediment
    pub tss_fraction: f64,
}

impl EdgeOfField {
    fn new(
        hillslope: &str,
        run_directory: &str,
        cli_years: std::ops::RangeInclusive<u32>,
        observed_years: std::ops::RangeInclusive<i32>,
        first_crop_years: &[i32],
        second_crop_years: &[i32],
        tss_fraction: f64,
    ) -> Self {
        EdgeOfField {
            hillslope: hillslope.to_string(),
            run_directory: PathBuf::from(run_directory),
            cli_years: cli_years.collect(),
            observed_years: observed_years.collect(),
            first_crop_years: first_crop_years.to_vec(),
            second_crop_years: second_crop_years.to_vec(),
            tss_fraction,
        }
    }
}

/// Hillslopes receiving specific perennial rotations
#[derive(Debug, PartialEq, Default, Deserialize)]
pub struct Perennials {
    /// Hillslope numbers converted to corn-alfalfa
    pub corn_only: Vec<u32>,
    /// Hillslope numbers converted to intermediate wheatgrass
    pub kernza: Vec<u32>,
}

/// Management scenarios simulated at increasing adoption rates
#[derive(Debug, PartialEq, Deserialize)]
pub struct AdoptionGroup {
    pub name: String,
    pub scenarios: Vec<String>,
    /// Percentage of the watershed adopting each scenario
    pub adoption: Vec<f64>,
}

impl AdoptionGroup {
    fn study_groups(perennial: &[f64; 4]) -> Vec<Self> {
        let group = |name: &str, scenarios: &[&str], adoption: &[f64]| AdoptionGroup {
            name: name.to_string(),
            scenarios: scenarios.iter().map(|s| s.to_string()).collect(),
            adoption: adoption.to_vec(),
        };

        vec![
            group("Cover Cropping", &["Per_0", "CC_10", "CC_20"], &[1.0, 10.0, 20.0]),
            group("Conservation Tillage", &["Per_0", "CT_50", "CT_100"], &[30.0, 50.0, 100.0]),
            group("Perennial Integration", &["Per_0", "Per_m20", "Per_B", "Per_p20"], perennial),
            group(
                "Perennial Integration with Conservation Tillage",
                &["Per_0_100", "Per_m20_100", "Per_B_100", "Per_p20_100"],
                perennial,
            ),
        ]
    }
}
