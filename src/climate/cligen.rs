//! Station `.par` files, CLIGEN runs and assignment of climate files to hillslopes.

use {
    crate::{
        climate::calibrate::split_period,
        formats::{read_text, top::TopFile, write_text},
        layout::{run_directory, Layout},
        parameters::{Method, Parameters},
        utils::{files_with_extension, hillslope_number, stem},
    },
    anyhow::{anyhow, bail, Context, Result},
    log::{debug, info},
    rayon::prelude::*,
    serde::Deserialize,
    std::{
        fs::{self, File},
        io::Read,
        path::{Path, PathBuf},
        process::{Command, Stdio},
    },
};

/// Entry of the CLIGEN station index
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Station {
    /// Name of the station's `.par` file, without extension
    #[serde(alias = "Station", alias = "File")]
    pub station: String,
    #[serde(alias = "Lat")]
    pub lat: f64,
    #[serde(alias = "Lon")]
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HillslopeCoordinate {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Lat")]
    pub lat: f64,
    #[serde(rename = "Lon")]
    pub lon: f64,
}

/// Reads a comma or tab separated station index.
pub fn parse_stations<R: Read>(mut reader: R) -> Result<Vec<Station>> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    let delimiter = match text.lines().next() {
        Some(header) if header.contains('\t') => b'\t',
        _ => b',',
    };
    Ok(csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes())
        .deserialize()
        .collect::<Result<_, _>>()?)
}

pub fn read_stations<P: AsRef<Path>>(path: P) -> Result<Vec<Station>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    parse_stations(file).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Item whose (latitude, |longitude|) is closest to the given point
pub fn nearest<T, F>(items: &[T], lat: f64, lon: f64, coordinates: F) -> Option<&T>
where
    F: Fn(&T) -> (f64, f64),
{
    let distance = |item: &T| {
        let (a, b) = coordinates(item);
        (a - lat).powi(2) + (b.abs() - lon.abs()).powi(2)
    };
    items.iter().min_by(|x, y| {
        distance(x)
            .partial_cmp(&distance(y))
            .unwrap_or(std::cmp::Ordering::Equal)
    })
}

/// Builds `<stem>.par` files from every `.top` in `from`, each spliced into
/// the `.par` of the nearest station.
pub fn build_pars(params: &Parameters, from: &Path, to: &Path) -> Result<Vec<PathBuf>> {
    let env = &params.environment;
    let stations = read_stations(env.resolve(&env.stations_file))?;
    let station_dir = env.resolve(&env.stations_directory);
    fs::create_dir_all(to).with_context(|| format!("Failed to create {}", to.display()))?;

    let mut pars = vec![];
    for path in files_with_extension(from, "top")? {
        let top = TopFile::read(&path)?;
        let (lat, lon) = top
            .coordinates()
            .with_context(|| format!("No coordinates in {}", path.display()))?;
        let station = nearest(&stations, lat, lon, |s| (s.lat, s.lon))
            .ok_or_else(|| anyhow!("Station index is empty"))?;
        debug!("{} uses station {}", path.display(), station.station);

        let station_par = read_text(station_dir.join(format!("{}.par", station.station)))?;
        let par = to.join(format!("{}.par", stem(&path)));
        write_text(&par, &top.splice_into(&station_par))?;
        pars.push(par);
    }
    Ok(pars)
}

/// CLIGEN arguments generating `years` years from `par` into `<stem>.cli`
pub fn cligen_args(par: &str, years: u32) -> Vec<String> {
    let stem = par.trim_end_matches(".par");
    vec![
        "-b1".to_string(),
        format!("-y{}", years),
        format!("-i{}", par),
        format!("-o{}.cli", stem),
        "-t5".to_string(),
    ]
}

fn run_cligen(program: &Path, dir: &Path, par: &Path, years: u32) -> Result<PathBuf> {
    let name = par
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("Invalid file {}", par.display()))?;
    let cli = dir.join(format!("{}.cli", stem(par)));
    if cli.exists() {
        fs::remove_file(&cli)?;
    }

    let status = Command::new(program)
        .current_dir(dir)
        .args(cligen_args(&name, years))
        .stdout(Stdio::null())
        .status()
        .with_context(|| format!("Failed to start {}", program.display()))?;
    if !status.success() {
        bail!("CLIGEN failed on {}: {}", name, status);
    }
    Ok(cli)
}

/// Builds `.par` files for a method and generates their `.cli` files. With
/// `uncalibrated`, the files are built from GenStPar's own parameters.
pub fn generate(params: &Parameters, watershed: &str, method: &Method, uncalibrated: bool) -> Result<usize> {
    let layout = Layout::new(params, watershed);
    let (from, to) = if uncalibrated {
        (layout.uncalibrated(method), layout.uncalibrated_par(method))
    } else {
        (layout.calibrated(method), layout.par(method))
    };

    let pars = build_pars(params, &from, &to)?;
    info!("Wrote {} .par files to {}", pars.len(), to.display());

    let program = params.environment.resolve(&params.environment.cligen);
    pars.par_iter()
        .map(|par| {
            let name = stem(par);
            let years = split_period(&name)
                .and_then(|(_, label)| params.period(label))
                .map(|p| p.cligen_years)
                .ok_or_else(|| anyhow!("No period for {}", name))?;
            run_cligen(&program, &to, par, years).map(|_| ())
        })
        .collect::<Result<()>>()?;

    info!("Generated {} .cli files", pars.len());
    Ok(pars.len())
}

/// A generated climate file and its grid location
#[derive(Debug, Clone, PartialEq)]
pub struct ClimateLocation {
    pub cli: PathBuf,
    pub lat: f64,
    pub lon: f64,
}

/// `.cli` files of one model and period with the coordinates of their `.par`
fn climate_locations(dir: &Path, watershed: &str, model: &str, period: &str) -> Result<Vec<ClimateLocation>> {
    let prefix = format!("{}_{}_", watershed, model);
    let suffix = format!("_{}", period);

    let mut locations = vec![];
    for cli in files_with_extension(dir, "cli")? {
        let name = stem(&cli);
        if !(name.starts_with(&prefix) && name.ends_with(&suffix)) {
            continue;
        }
        let par = cli.with_extension("par");
        let (lat, lon) = TopFile::read(&par)?
            .coordinates()
            .with_context(|| format!("No coordinates in {}", par.display()))?;
        locations.push(ClimateLocation { cli, lat, lon });
    }
    Ok(locations)
}

/// Run directories receiving a model's climate for a period
pub fn climate_runs(params: &Parameters, model: &str, period: &str) -> Vec<PathBuf> {
    let climate = format!("{}_{}", model, period);
    if period == params.climate.baseline_period {
        vec![run_directory(&params.management.base_scenario, &climate)]
    } else {
        params
            .management
            .scenarios
            .iter()
            .map(|scenario| run_directory(scenario, &climate))
            .collect()
    }
}

/// Copies the nearest climate file of every model and period to each
/// hillslope as `p<n>.cli` in the matching run directories.
pub fn assign(params: &Parameters, watershed: &str, method: &Method) -> Result<usize> {
    let layout = Layout::new(params, watershed);
    let hillslopes: Vec<HillslopeCoordinate> = crate::observed::read_records(layout.hillslope_coordinates())?;

    let mut count = 0;
    for model in &method.models {
        for period in &params.climate.periods {
            let locations = climate_locations(&layout.par(method), watershed, model, &period.label)?;
            if locations.is_empty() {
                debug!("No climate files for {}_{}", model, period.label);
                continue;
            }

            for run in climate_runs(params, model, &period.label) {
                let runs = layout.runs(&run);
                fs::create_dir_all(&runs).with_context(|| format!("Failed to create {}", runs.display()))?;

                for hillslope in &hillslopes {
                    let number = hillslope_number(&hillslope.id)
                        .ok_or_else(|| anyhow!("Invalid hillslope ID \"{}\"", hillslope.id))?;
                    let location = nearest(&locations, hillslope.lat, hillslope.lon, |l| (l.lat, l.lon))
                        .ok_or_else(|| anyhow!("No climate locations"))?;
                    let target = runs.join(format!("p{}.cli", number));
                    fs::copy(&location.cli, &target)
                        .with_context(|| format!("Failed to copy {} to {}", location.cli.display(), target.display()))?;
                    count += 1;
                }
            }
        }
    }

    info!("Assigned {} climate files", count);
    Ok(count)
}

#[cfg(test)]
mod test {
    use {super::*, tempdir::TempDir};

    #[test]
    fn stations() {
        let tab = "station\tlat\tlon\nmn210075\t43.65\t-93.37\nmn213282\t44.55\t-92.53\n";
        let stations = parse_stations(tab.as_bytes()).unwrap();
        assert_eq!(stations.len(), 2);
        assert_eq!(stations[1].station, "mn213282");

        let comma = "Station, Lat, Lon\nmn210075, 43.65, -93.37\n";
        assert_eq!(parse_stations(comma.as_bytes()).unwrap()[0].lon, -93.37);
    }

    #[test]
    fn nearest_ignores_longitude_sign() {
        let stations = parse_stations("station,lat,lon\na,43.65,-93.37\nb,44.55,-92.53\n".as_bytes()).unwrap();
        let station = nearest(&stations, 44.53, 92.66, |s| (s.lat, s.lon)).unwrap();
        assert_eq!(station.station, "b");
        assert!(nearest(&stations[..0], 44.0, 92.0, |s| (s.lat, s.lon)).is_none());
    }

    #[test]
    fn arguments() {
        assert_eq!(
            cligen_args("GO1_B3_1_59.par", 40),
            vec!["-b1", "-y40", "-iGO1_B3_1_59.par", "-oGO1_B3_1_59.cli", "-t5"]
        );
    }

    #[test]
    fn runs_per_period() {
        let params = Parameters::default();
        assert_eq!(climate_runs(&params, "B3", "19"), vec![PathBuf::from("Base/B3_19")]);
        let future = climate_runs(&params, "L4", "99");
        assert_eq!(future.len(), 5);
        assert_eq!(future[0], PathBuf::from("CC/L4_99"));
    }

    #[test]
    fn pars_from_nearest_station() {
        let dir = TempDir::new("cligen").unwrap();
        let mut params = Parameters::default();
        params.environment.project_directory = dir.path().to_path_buf();

        fs::create_dir_all(dir.path().join("stations/par")).unwrap();
        fs::write(
            dir.path().join("stations/MN_stations.csv"),
            "station,lat,lon\nfar,40.0,-90.0\nnear,44.5,-92.7\n",
        )
        .unwrap();
        let station_par: String = (0..14).map(|i| format!("station line {}\n", i)).collect();
        fs::write(dir.path().join("stations/par/near.par"), &station_par).unwrap();

        let from = dir.path().join("tops");
        fs::create_dir_all(&from).unwrap();
        fs::write(from.join("GO1_B3_1_19.top"), include_str!("../testdata/GO1_B3_1_19.top")).unwrap();

        let to = dir.path().join("pars");
        let pars = build_pars(&params, &from, &to).unwrap();
        assert_eq!(pars, vec![to.join("GO1_B3_1_19.par")]);

        let par = fs::read_to_string(&pars[0]).unwrap();
        let lines: Vec<&str> = par.lines().collect();
        assert_eq!(lines.len(), 14);
        assert!(lines[3].starts_with(" MEAN P"));
        assert_eq!(lines[12], "station line 12");
    }
}
