//! Soil loss, sediment delivery and runoff of one WEPP run.

use {
    crate::{
        formats::{
            cli::{Cli, CliRecord},
            ebe::{self, EbeRecord},
            loss::{self, HillslopeGeometry},
            round_to,
        },
        layout::Layout,
        parameters::{Delivery, Parameters, Season},
        report::{
            html::{write_page, Section},
            tables::write_csv,
            LineGraph, Scattergram,
        },
        stats::{self, EcdfKind},
        utils::{file_name, files_with_extension, hillslope_number},
    },
    anyhow::{Context, Result},
    log::{info, warn},
    rayon::prelude::*,
    serde::Serialize,
    std::{
        collections::HashMap,
        path::{Path, PathBuf},
    },
};

const EBE_SUFFIX: &str = ".ebe.dat";

/// Event output and geometry of one hillslope
#[derive(Debug, Clone, PartialEq)]
pub struct HillslopeOutput {
    /// Output name, e.g. `H12`
    pub name: String,
    pub geometry: HillslopeGeometry,
    pub events: Vec<EbeRecord>,
}

impl HillslopeOutput {
    pub fn season_events<'a>(&'a self, season: &'a Season) -> impl Iterator<Item = &'a EbeRecord> + 'a {
        self.events.iter().filter(move |e| season.contains(e.month))
    }

    pub fn soil_loss(&self, event: &EbeRecord) -> f64 {
        event.soil_loss(self.geometry.width, self.geometry.area)
    }

    /// Average annual totals over the season
    pub fn summary(&self, season: &Season, years: f64, sdr: Option<f64>) -> HillslopeSummary {
        let soil_loss = self.season_events(season).map(|e| self.soil_loss(e)).sum::<f64>() / years;
        let runoff = self
            .season_events(season)
            .filter(|e| !e.is_snowmelt())
            .map(|e| e.runoff)
            .sum::<f64>()
            / years;

        HillslopeSummary {
            hillslope: self.name.clone(),
            soil_loss,
            sediment_delivery: sdr.map(|sdr| soil_loss * sdr),
            runoff,
        }
    }
}

/// Reads every `<name>.ebe.dat` in `dir` with the geometry from its
/// `<name>.loss.dat`.
pub fn read_outputs(dir: &Path) -> Result<Vec<HillslopeOutput>> {
    let ebe_files: Vec<PathBuf> = files_with_extension(dir, "dat")?
        .into_iter()
        .filter(|p| file_name(p).ends_with(EBE_SUFFIX))
        .collect();

    ebe_files
        .par_iter()
        .map(|path| {
            let name = file_name(path).trim_end_matches(EBE_SUFFIX).to_string();
            let geometry = loss::read(dir.join(format!("{}.loss.dat", name)))?;
            let events = ebe::read(path)?;
            Ok(HillslopeOutput {
                name,
                geometry,
                events,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HillslopeSummary {
    #[serde(rename = "Hillslope")]
    pub hillslope: String,
    #[serde(rename = "Soil loss (t/ha/yr)")]
    pub soil_loss: f64,
    #[serde(rename = "Sediment delivery (t/ha/yr)")]
    pub sediment_delivery: Option<f64>,
    #[serde(rename = "Runoff (mm/yr)")]
    pub runoff: f64,
}

/// Watershed means and threshold exceedance of one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatershedSummary {
    #[serde(rename = "Run")]
    pub run: String,
    #[serde(rename = "Hillslopes")]
    pub hillslopes: usize,
    #[serde(rename = "Soil loss (t/ha/yr)")]
    pub soil_loss: f64,
    #[serde(rename = "Unsustainable hillslopes (%)")]
    pub unsustainable: f64,
    #[serde(rename = "Sediment delivery (t/ha/yr)")]
    pub sediment_delivery: Option<f64>,
    #[serde(rename = "Over TMDL sediment (%)")]
    pub over_tmdl_sediment: Option<f64>,
    #[serde(rename = "Runoff (mm/yr)")]
    pub runoff: f64,
    #[serde(rename = "Over TMDL runoff (%)")]
    pub over_tmdl_runoff: Option<f64>,
}

fn percent_over(values: impl Iterator<Item = f64>, limit: f64, n: usize) -> f64 {
    values.filter(|v| *v > limit).count() as f64 * 100.0 / n as f64
}

pub fn watershed_summary(
    run: &str,
    hillslopes: &[HillslopeSummary],
    sustainable_soil_loss: f64,
    delivery: Option<&Delivery>,
) -> WatershedSummary {
    let n = hillslopes.len();
    let soil_loss: Vec<f64> = hillslopes.iter().map(|h| h.soil_loss).collect();
    let runoff: Vec<f64> = hillslopes.iter().map(|h| h.runoff).collect();
    let delivered: Vec<f64> = hillslopes.iter().filter_map(|h| h.sediment_delivery).collect();

    WatershedSummary {
        run: run.to_string(),
        hillslopes: n,
        soil_loss: stats::mean(&soil_loss),
        unsustainable: percent_over(soil_loss.iter().copied(), sustainable_soil_loss, n),
        sediment_delivery: delivery.map(|_| stats::mean(&delivered)),
        over_tmdl_sediment: delivery.map(|d| percent_over(delivered.iter().copied(), d.tmdl_sediment, n)),
        runoff: stats::mean(&runoff),
        over_tmdl_runoff: delivery.map(|d| percent_over(runoff.iter().copied(), d.tmdl_runoff, n)),
    }
}

/// A rainfall runoff event of the season
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    #[serde(rename = "Hillslope")]
    pub hillslope: String,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Month")]
    pub month: u32,
    #[serde(rename = "Day")]
    pub day: u32,
    #[serde(rename = "Precipitation (mm)")]
    pub precipitation: f64,
    /// Mean storm intensity of the day in the hillslope's climate file
    #[serde(rename = "Intensity (mm/h)")]
    pub intensity: f64,
    #[serde(rename = "Runoff (mm)")]
    pub runoff: f64,
    #[serde(rename = "Soil loss (t/ha)")]
    pub soil_loss: f64,
}

/// Storm intensity by (year, month, day)
pub fn intensities(cli: &Cli) -> HashMap<(i32, u32, u32), f64> {
    cli.records
        .iter()
        .map(|r| ((r.year, r.month, r.day), r.intensity()))
        .collect()
}

/// Season events excluding snowmelt, with intensities joined by date; days
/// missing from `intensities` have NaN intensity.
pub fn events(output: &HillslopeOutput, season: &Season, intensities: &HashMap<(i32, u32, u32), f64>) -> Vec<Event> {
    output
        .season_events(season)
        .filter(|e| !e.is_snowmelt())
        .map(|e| Event {
            hillslope: output.name.clone(),
            year: e.year,
            month: e.month,
            day: e.day,
            precipitation: e.precipitation,
            intensity: intensities
                .get(&(e.year, e.month, e.day))
                .copied()
                .unwrap_or(f64::NAN),
            runoff: e.runoff,
            soil_loss: output.soil_loss(e),
        })
        .collect()
}

/// Seasonal character of a climate file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClimateSummary {
    #[serde(rename = "Heavy precipitation days (per yr)")]
    pub heavy_days: f64,
    #[serde(rename = "Mean intensity (mm/h)")]
    pub intensity: f64,
    #[serde(rename = "Precipitation (mm/yr)")]
    pub precipitation: f64,
    #[serde(rename = "Mean storm duration (h)")]
    pub duration: f64,
    #[serde(rename = "Mean Tmax (°C)")]
    pub tmax: f64,
    #[serde(rename = "Mean Tmin (°C)")]
    pub tmin: f64,
}

/// Summary of the season's days, rounded to one decimal. Intensity is
/// averaged over wet days, duration and temperatures over all days.
pub fn climate_summary(cli: &Cli, season: &Season, years: f64, heavy: f64) -> ClimateSummary {
    let days: Vec<&CliRecord> = cli.in_months(&season.months).collect();
    let column = |f: fn(&CliRecord) -> f64| -> Vec<f64> { days.iter().map(|r| f(r)).collect() };

    let precipitation = column(|r| r.precipitation);
    let intensity: Vec<f64> = column(|r| r.intensity()).into_iter().filter(|i| *i != 0.0).collect();

    ClimateSummary {
        heavy_days: round_to(precipitation.iter().filter(|p| **p > heavy).count() as f64 / years, 1),
        intensity: round_to(stats::mean(&intensity), 1),
        precipitation: round_to(stats::sum(&precipitation) / years, 1),
        duration: round_to(stats::mean(&column(|r| r.duration)), 1),
        tmax: round_to(stats::mean(&column(|r| r.tmax)), 1),
        tmin: round_to(stats::mean(&column(|r| r.tmin)), 1),
    }
}

/// Label of a run directory for file names, e.g. `CC_B3_59` for `CC/B3_59`
pub fn run_label(run: &Path) -> String {
    run.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("_")
}

/// Everything computed for one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunAnalysis {
    pub hillslopes: Vec<HillslopeSummary>,
    pub watershed: WatershedSummary,
    pub events: Vec<Event>,
    pub climate: Option<ClimateSummary>,
}

/// Analyses the growing season of a run directory such as `CC/B3_59`.
pub fn analyze(params: &Parameters, watershed: &str, run: &Path) -> Result<RunAnalysis> {
    let shed = params
        .watershed(watershed)
        .with_context(|| format!("Unknown watershed {}", watershed))?;
    let layout = Layout::new(params, watershed);
    let season = &params.analysis.growing_season;
    let climate = file_name(run);
    let years = params
        .years_of_climate(&climate)
        .with_context(|| format!("No period for {}", climate))? as f64;
    let delivery = shed.delivery.as_ref();

    let outputs = read_outputs(&layout.output(run))?;
    let hillslopes: Vec<HillslopeSummary> = outputs
        .iter()
        .map(|o| o.summary(season, years, delivery.map(|d| d.sdr)))
        .collect();
    let summary = watershed_summary(
        &run_label(run),
        &hillslopes,
        params.analysis.sustainable_soil_loss,
        delivery,
    );

    let runs = layout.runs(run);
    let mut event_list = vec![];
    for output in &outputs {
        let cli = hillslope_number(&output.name).map(|n| runs.join(format!("p{}.cli", n)));
        let index = match cli {
            Some(path) if path.exists() => intensities(&Cli::read(&path)?),
            _ => {
                warn!("No climate file for {}, intensities are missing", output.name);
                HashMap::new()
            }
        };
        event_list.extend(events(output, season, &index));
    }

    let climate_summary = match files_with_extension(&runs, "cli")?.first() {
        Some(path) => Some(climate_summary(
            &Cli::read(path)?,
            season,
            years,
            params.analysis.heavy_precipitation,
        )),
        None => None,
    };

    Ok(RunAnalysis {
        hillslopes,
        watershed: summary,
        events: event_list,
        climate: climate_summary,
    })
}

fn event_graphs(params: &Parameters, events: &[Event]) -> Vec<Section> {
    let column = |f: fn(&Event) -> f64| events.iter().map(f).collect::<Vec<f64>>();
    let mut sections = vec![];

    for (label, values) in &[
        ("Soil loss (t/ha)", column(|e| e.soil_loss)),
        ("Runoff (mm)", column(|e| e.runoff)),
        ("Precipitation (mm)", column(|e| e.precipitation)),
    ] {
        let series = [(label.to_string(), values.clone())];
        for kind in &[EcdfKind::Frequency, EcdfKind::TotalSum] {
            let graph = LineGraph {
                title: format!("Event {}", label.to_lowercase()),
                draw_legend: false,
                ..LineGraph::ecdf(&series, *kind, label)
            };
            sections.push(Section::new(*label, graph.get_svg()));
        }
    }

    let seasons = &params.analysis.event_seasons;
    let by_season = |f: fn(&Event) -> f64| -> Vec<Vec<f64>> {
        seasons
            .iter()
            .map(|s| events.iter().filter(|e| s.contains(e.month)).map(f).collect())
            .collect()
    };
    let labels: Vec<String> = seasons.iter().map(|s| s.name.clone()).collect();
    for (x_label, x) in &[
        ("Precipitation (mm)", by_season(|e| e.precipitation)),
        ("Intensity (mm/h)", by_season(|e| e.intensity)),
    ] {
        let plot = Scattergram {
            title: format!("Soil loss against {}", x_label.to_lowercase()),
            data_x: x.clone(),
            data_y: by_season(|e| e.soil_loss),
            series_labels: labels.clone(),
            x_axis_label: x_label.to_string(),
            y_axis_label: "Soil loss (t/ha)".to_string(),
            draw_trendline: true,
            ..Scattergram::default()
        };
        sections.push(Section::new(*x_label, plot.get_svg()));
    }
    sections
}

/// Analyses a run and writes its tables and report below `Analysis/`.
pub fn summarize(params: &Parameters, watershed: &str, run: &Path) -> Result<WatershedSummary> {
    let analysis = analyze(params, watershed, run)?;
    let layout = Layout::new(params, watershed);
    let label = run_label(run);
    let dir = layout.analysis().join(&label);

    write_csv(dir.join("hillslopes.csv"), &analysis.hillslopes)?;
    write_csv(dir.join("watershed.csv"), &[analysis.watershed.clone()])?;
    write_csv(dir.join("events.csv"), &analysis.events)?;
    if let Some(climate) = &analysis.climate {
        write_csv(dir.join("climate.csv"), &[climate.clone()])?;
    }
    write_page(
        dir.join("report.html"),
        &format!("{} {}", watershed, label),
        &event_graphs(params, &analysis.events),
    )?;

    info!(
        "{}: soil loss {:.2} t/ha/yr, runoff {:.1} mm/yr, {:.1}% of {} hillslopes unsustainable",
        label,
        analysis.watershed.soil_loss,
        analysis.watershed.runoff,
        analysis.watershed.unsustainable,
        analysis.watershed.hillslopes
    );
    Ok(analysis.watershed)
}
