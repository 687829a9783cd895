#[macro_use]
extern crate clap;

use {
    anyhow::{anyhow, bail, Result},
    clap::{App, Arg, ArgMatches, SubCommand},
    log::{error, info, warn},
    simplelog::{Config as LogConfig, LevelFilter, TermLogger, TerminalMode},
    std::{fs::File, path::PathBuf},
    wepp_pipeline::{
        analysis::{adoption, cligen_compare, evaluation, hillslope, trends},
        climate::{calibrate, cligen, download, gds},
        layout::Layout,
        parameters::{Method, Parameters},
        wepp::{self, management::Preset},
    },
};

#[quit::main]
fn main() {
    let matches = clap_app!(wepp_pipeline =>
        (version: crate_version!())
        (@arg PARAMETERS: -p --parameters +takes_value +required "Path to file containing study parameters.")
        (@subcommand download =>
            (about: "Downloads a CMIP5 subset job and moves its extraction files into the method's netCDF directory.")
            (@arg JOB: +required "Subset job identifier, e.g. 201911181540yfhB8G")
            (@arg METHOD: +required "Downscaling method the job was requested for")
            (@arg watershed: -w --watershed +takes_value +required "Watershed the job covers")
        )
        (@subcommand gds =>
            (about: "Converts netCDF extractions to GDS files, one per grid location and period.")
            (@arg watershed: -w --watershed +takes_value +multiple "Watersheds to process, all when omitted")
            (@arg method: -m --method +takes_value +multiple "Downscaling methods to process, all when omitted")
        )
        (@subcommand top =>
            (about: "Runs GenStPar on every GDS file and collects the uncalibrated TOP files.")
            (@arg watershed: -w --watershed +takes_value +multiple "Watersheds to process, all when omitted")
            (@arg method: -m --method +takes_value +multiple "Downscaling methods to process, all when omitted")
        )
        (@subcommand cli =>
            (about: "Builds PAR files from TOP files and runs CLIGEN on each of them.")
            (@arg watershed: -w --watershed +takes_value +multiple "Watersheds to process, all when omitted")
            (@arg method: -m --method +takes_value +multiple "Downscaling methods to process, all when omitted")
            (@arg uncalibrated: --uncalibrated "Use the uncalibrated TOP files")
        )
        (@subcommand summarize =>
            (about: "Summarizes hillslope and watershed soil loss, runoff and climate of WEPP runs.")
            (@arg watershed: -w --watershed +takes_value +multiple "Watersheds to process, all when omitted")
            (@arg run: --run +takes_value "Run directory below Runs/, every climate run when omitted")
        )
        (@subcommand evaluate =>
            (about: "Scores WEPP against edge-of-field monitoring with NSE and PBIAS.")
            (@arg watershed: -w --watershed +takes_value +multiple "Watersheds to process, all monitored ones when omitted")
        )
        (@subcommand adoption =>
            (about: "Plots watershed soil loss and runoff against practice adoption.")
            (@arg watershed: -w --watershed +takes_value +multiple "Watersheds to process, all when omitted")
        )
    )
    .subcommands(hyphenated_subcommands())
    .get_matches();

    TermLogger::init(LevelFilter::Debug, LogConfig::default(), TerminalMode::Mixed)
        .expect("Failed to initialize logger");

    let params = {
        // Should never panic as clap should return an error if the argument was not supplied
        let path = matches
            .value_of("PARAMETERS")
            .expect("Path to parameters file not supplied");

        let file = File::open(path).unwrap_or_else(|e| {
            error!("Failed to open {}: \"{}\"", path, e);
            quit::with_code(1);
        });

        let params = serde_yaml::from_reader::<_, Parameters>(file).unwrap_or_else(|e| {
            error!("Failed to parse parameters from {}: \"{}\"", path, e);
            quit::with_code(1);
        });

        info!(
            "Successfully loaded study parameters from \"{}\": \n{:#?}",
            path, params
        );

        params
    };

    run_subcommand(matches.subcommand(), &params).unwrap_or_else(|e| {
        error!("Error: \"{:#}\"", e);
        quit::with_code(1);
    });
}

fn watershed_arg() -> Arg<'static, 'static> {
    Arg::from_usage("-w, --watershed [WATERSHED]... 'Watersheds to process, all when omitted'")
}

fn method_arg() -> Arg<'static, 'static> {
    Arg::from_usage("-m, --method [METHOD]... 'Downscaling methods to process, all when omitted'")
}

fn run_arg() -> Arg<'static, 'static> {
    Arg::from_usage("--run [RUN] 'Run directory below Runs/, e.g. CC/B3_59; every climate run when omitted'")
}

/// Subcommands whose names `clap_app!` cannot express
fn hyphenated_subcommands() -> Vec<App<'static, 'static>> {
    vec![
        SubCommand::with_name("calibrate-baseline")
            .about("Calibrates baseline TOP files against the observed station.")
            .args(&[watershed_arg(), method_arg()]),
        SubCommand::with_name("calibrate-future")
            .about("Shifts future TOP files by their change from the uncalibrated baseline.")
            .args(&[watershed_arg(), method_arg()]),
        SubCommand::with_name("station-stats")
            .about("Writes observed precipitation deviation and skew into the station's TOP file.")
            .arg(watershed_arg()),
        SubCommand::with_name("station-stats-future")
            .about("Applies station precipitation deviation and skew to the future TOP files.")
            .arg(watershed_arg()),
        SubCommand::with_name("prepare-runs")
            .about("Prepares base WEPP inputs and copies them into every scenario run directory.")
            .arg(watershed_arg()),
        SubCommand::with_name("assign-cli")
            .about("Copies the nearest climate file to every hillslope of each run directory.")
            .args(&[watershed_arg(), method_arg()]),
        SubCommand::with_name("adjust-management")
            .about("Applies a tillage preset to the management files of runs.")
            .arg(
                Arg::with_name("preset")
                    .long("preset")
                    .takes_value(true)
                    .required(true)
                    .possible_values(&Preset::NAMES)
                    .help("Management preset"),
            )
            .arg(Arg::from_usage("--hillslopes [N]... 'Hillslope numbers to edit, all when omitted'"))
            .args(&[watershed_arg(), run_arg()]),
        SubCommand::with_name("replace-rotations")
            .about("Replaces perennial rotations with row crops, or assigns perennial rotations.")
            .arg(
                Arg::with_name("ACTION")
                    .required(true)
                    .possible_values(&["remove-perennials", "assign-perennials"])
                    .help("Replacement to make"),
            )
            .arg(Arg::from_usage("--source <DIR> 'Directory holding the replacement management files'"))
            .args(&[watershed_arg(), run_arg()]),
        SubCommand::with_name("scale-soil")
            .about("Scales Keff, or Ki and Kr, in every soil file of runs.")
            .arg(Arg::from_usage("--keff [FACTOR] 'Factor applied to effective hydraulic conductivity'"))
            .arg(Arg::from_usage("--ki [FACTOR] 'Factor applied to interrill erodibility'").requires("kr"))
            .arg(Arg::from_usage("--kr [FACTOR] 'Factor applied to rill erodibility'").requires("ki"))
            .args(&[watershed_arg(), run_arg()]),
        SubCommand::with_name("run-wepp")
            .about("Runs WEPP for every hillslope of runs.")
            .args(&[watershed_arg(), run_arg()]),
        SubCommand::with_name("compare-cligen")
            .about("Compares a baseline CLIGEN climate with the observed station record.")
            .arg(Arg::from_usage("--model [MODEL] 'Projection label, the station model when omitted'"))
            .arg(Arg::from_usage("--location [LOCATION] 'Grid location, the station location when omitted'"))
            .arg(Arg::from_usage("--uncalibrated 'Compare the climate generated from uncalibrated parameters'"))
            .arg(watershed_arg()),
        SubCommand::with_name("cligen-trends")
            .about("Tabulates seasonal changes of future CLIGEN climates against the baseline.")
            .arg(Arg::from_usage("--model [MODEL] 'Projection label, the station model when omitted'"))
            .arg(Arg::from_usage("--location [LOCATION] 'Grid location, the station location when omitted'"))
            .arg(watershed_arg()),
    ]
}

fn watersheds(params: &Parameters, matches: &ArgMatches) -> Result<Vec<String>> {
    match matches.values_of("watershed") {
        Some(names) => names
            .map(|name| {
                params
                    .watershed(name)
                    .map(|w| w.name.clone())
                    .ok_or_else(|| anyhow!("Unknown watershed \"{}\"", name))
            })
            .collect(),
        None => Ok(params.watersheds.iter().map(|w| w.name.clone()).collect()),
    }
}

fn methods<'a>(params: &'a Parameters, matches: &ArgMatches) -> Result<Vec<&'a Method>> {
    match matches.values_of("method") {
        Some(names) => names
            .map(|name| {
                params
                    .method(name)
                    .ok_or_else(|| anyhow!("Unknown downscaling method \"{}\"", name))
            })
            .collect(),
        None => Ok(params.climate.methods.iter().collect()),
    }
}

/// The selected run, or every scenario run receiving a projected climate
fn runs(params: &Parameters, matches: &ArgMatches) -> Vec<PathBuf> {
    if let Some(run) = matches.value_of("run") {
        return vec![PathBuf::from(run)];
    }

    let mut runs = vec![];
    for method in &params.climate.methods {
        for model in &method.models {
            for period in &params.climate.periods {
                runs.extend(cligen::climate_runs(params, model, &period.label));
            }
        }
    }
    runs.sort();
    runs.dedup();
    runs
}

fn parse_value<T>(matches: &ArgMatches, name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    matches
        .value_of(name)
        .map(|v| v.parse::<T>().map_err(|e| anyhow!("Invalid --{} \"{}\": {}", name, v, e)))
        .transpose()
}

/// Runs `stage` on every selected watershed and method
fn per_method<F>(params: &Parameters, matches: &ArgMatches, stage: F) -> Result<()>
where
    F: Fn(&str, &Method) -> Result<usize>,
{
    for watershed in watersheds(params, matches)? {
        for method in methods(params, matches)? {
            let count = stage(&watershed, method)?;
            info!("{} {}: {} files", watershed, method.name, count);
        }
    }
    Ok(())
}

fn run_subcommand(subcommand: (&str, Option<&ArgMatches>), params: &Parameters) -> Result<()> {
    let (name, matches) = match subcommand {
        (name, Some(matches)) => (name, matches),
        _ => bail!("No subcommand selected"),
    };

    info!("Starting {}", name);

    match name {
        "download" => {
            // Required arguments, enforced by clap
            let (job, method, watershed) = (
                matches.value_of("JOB").unwrap_or_default(),
                matches.value_of("METHOD").unwrap_or_default(),
                matches.value_of("watershed").unwrap_or_default(),
            );
            let method = params
                .method(method)
                .ok_or_else(|| anyhow!("Unknown downscaling method \"{}\"", method))?;
            if params.watershed(watershed).is_none() {
                bail!("Unknown watershed \"{}\"", watershed);
            }
            download::download(params, watershed, method, job)?;
        }
        "gds" => per_method(params, matches, |w, m| gds::convert(params, w, m))?,
        "top" => per_method(params, matches, |w, m| calibrate::run_genstpar(params, w, m))?,
        "calibrate-baseline" => per_method(params, matches, |w, m| calibrate::calibrate_baseline_files(params, w, m))?,
        "calibrate-future" => per_method(params, matches, |w, m| calibrate::calibrate_future_files(params, w, m))?,
        "station-stats" => {
            for watershed in watersheds(params, matches)? {
                calibrate::station_stats(params, &watershed)?;
            }
        }
        "station-stats-future" => {
            for watershed in watersheds(params, matches)? {
                let count = calibrate::station_stats_future(params, &watershed)?;
                info!("{}: {} future files", watershed, count);
            }
        }
        "cli" => {
            let uncalibrated = matches.is_present("uncalibrated");
            per_method(params, matches, |w, m| cligen::generate(params, w, m, uncalibrated))?
        }
        "prepare-runs" => {
            for watershed in watersheds(params, matches)? {
                wepp::prepare::prepare(params, &watershed)?;
            }
        }
        "assign-cli" => per_method(params, matches, |w, m| cligen::assign(params, w, m))?,
        "adjust-management" => {
            let preset: Preset = matches.value_of("preset").unwrap_or_default().parse()?;
            let hillslopes = matches
                .values_of("hillslopes")
                .map(|values| {
                    values
                        .map(|v| v.parse::<u32>().map_err(|e| anyhow!("Invalid hillslope \"{}\": {}", v, e)))
                        .collect::<Result<Vec<_>>>()
                })
                .transpose()?;

            for watershed in watersheds(params, matches)? {
                let layout = Layout::new(params, &watershed);
                for run in runs(params, matches) {
                    let count = wepp::management::adjust(&layout.runs(&run), preset, hillslopes.as_deref())?;
                    info!("{} {}: {} applied to {} files", watershed, run.display(), preset, count);
                }
            }
        }
        "replace-rotations" => {
            let source = PathBuf::from(matches.value_of("source").unwrap_or_default());
            let action = matches.value_of("ACTION").unwrap_or_default();

            for watershed in watersheds(params, matches)? {
                let layout = Layout::new(params, &watershed);
                let perennials = &params
                    .watershed(&watershed)
                    .ok_or_else(|| anyhow!("Unknown watershed \"{}\"", watershed))?
                    .perennials;
                for run in runs(params, matches) {
                    let dir = layout.runs(&run);
                    let count = match action {
                        "remove-perennials" => wepp::management::remove_perennials(&dir, &source)?.len(),
                        "assign-perennials" => wepp::management::assign_perennials(&dir, &source, perennials)?,
                        _ => bail!("Unrecognized rotation replacement \"{}\"", action),
                    };
                    info!("{} {}: replaced {} rotations", watershed, run.display(), count);
                }
            }
        }
        "scale-soil" => {
            let keff = parse_value::<f64>(matches, "keff")?;
            let erodibility = match (parse_value::<f64>(matches, "ki")?, parse_value::<f64>(matches, "kr")?) {
                (Some(ki), Some(kr)) => Some((ki, kr)),
                _ => None,
            };
            if keff.is_none() && erodibility.is_none() {
                bail!("Nothing to scale, give --keff or --ki and --kr");
            }

            for watershed in watersheds(params, matches)? {
                let layout = Layout::new(params, &watershed);
                for run in runs(params, matches) {
                    let dir = layout.runs(&run);
                    if let Some(factor) = keff {
                        wepp::prepare::scale_keff(&dir, factor)?;
                    }
                    if let Some((ki, kr)) = erodibility {
                        wepp::prepare::scale_erodibility(&dir, ki, kr)?;
                    }
                }
            }
        }
        "run-wepp" => {
            for watershed in watersheds(params, matches)? {
                for run in runs(params, matches) {
                    let count = wepp::run::run(params, &watershed, &run)?;
                    info!("{} {}: simulated {} hillslopes", watershed, run.display(), count);
                }
            }
        }
        "summarize" => {
            for watershed in watersheds(params, matches)? {
                for run in runs(params, matches) {
                    match hillslope::summarize(params, &watershed, &run) {
                        Ok(summary) => info!(
                            "{} {}: {:.2} t/ha/yr, {:.1}% unsustainable",
                            watershed,
                            run.display(),
                            summary.soil_loss,
                            summary.unsustainable
                        ),
                        Err(e) => warn!("{} {}: {:#}", watershed, run.display(), e),
                    }
                }
            }
        }
        "compare-cligen" => {
            let uncalibrated = matches.is_present("uncalibrated");
            let location = parse_value::<u32>(matches, "location")?;

            for watershed in watersheds(params, matches)? {
                let shed = params
                    .watershed(&watershed)
                    .ok_or_else(|| anyhow!("Unknown watershed \"{}\"", watershed))?;
                let model = matches.value_of("model").unwrap_or(&shed.station_model);
                let location = location.unwrap_or(shed.station_location);

                let cli = cligen_compare::baseline_cli(params, &watershed, model, location, uncalibrated)?;
                let comparison = cligen_compare::compare(params, &watershed, &cli)?;
                let label = if uncalibrated {
                    format!("{}_{}_uncalibrated", model, location)
                } else {
                    format!("{}_{}", model, location)
                };
                cligen_compare::write_comparison(params, &watershed, &label, &comparison)?;
            }
        }
        "cligen-trends" => {
            let location = parse_value::<u32>(matches, "location")?;

            for watershed in watersheds(params, matches)? {
                let shed = params
                    .watershed(&watershed)
                    .ok_or_else(|| anyhow!("Unknown watershed \"{}\"", watershed))?;
                let model = matches.value_of("model").unwrap_or(&shed.station_model);
                let location = location.unwrap_or(shed.station_location);

                let trends = trends::trends(params, &watershed, model, location)?;
                trends::write_trends(params, &watershed, model, &trends)?;
            }
        }
        "evaluate" => {
            let monitored: Vec<String> = watersheds(params, matches)?
                .into_iter()
                .filter(|w| {
                    params
                        .watershed(w)
                        .map_or(false, |shed| shed.edge_of_field.is_some())
                })
                .collect();
            if monitored.is_empty() {
                bail!("No selected watershed has edge-of-field monitoring");
            }
            for scores in evaluation::evaluate_all(params, &monitored)? {
                info!(
                    "{} {}: TSS NSE {:.2} PBIAS {:.1}, runoff NSE {:.2} PBIAS {:.1}",
                    scores.watershed, scores.dataset, scores.nse_tss, scores.pbias_tss, scores.nse_runoff, scores.pbias_runoff
                );
            }
        }
        "adoption" => {
            for watershed in watersheds(params, matches)? {
                adoption::adoption(params, &watershed)?;
            }
        }
        // Should be unreachable due to clap catching this error
        _ => bail!("Unrecognized subcommand"),
    }

    info!("Finished {}", name);

    Ok(())
}
