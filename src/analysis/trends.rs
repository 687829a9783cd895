//! Change of future CLIGEN climates against the baseline period, for
//! calibrated and uncalibrated parameter files.

use {
    crate::{
        formats::cli::{Cli, CliRecord},
        layout::Layout,
        parameters::{Parameters, Season},
        report::{
            html::{table, write_page, Section},
            tables::write_csv,
        },
        stats::{self, StormClass},
    },
    anyhow::{Context, Result},
    log::{info, warn},
    serde::Serialize,
    std::path::PathBuf,
};

pub const VARIABLES: [&str; 5] = ["Pr", "Pr_mean_e", "Pr_25", "Tmax", "Tmin"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalClimate {
    #[serde(rename = "Season")]
    pub season: String,
    /// Wet-day precipitation (mm/yr)
    #[serde(rename = "Pr")]
    pub precipitation: f64,
    /// Mean wet-day depth (mm)
    #[serde(rename = "Pr_mean_e")]
    pub depth_per_event: f64,
    /// Days above the heavy precipitation depth (per yr)
    #[serde(rename = "Pr_25")]
    pub heavy_days: f64,
    #[serde(rename = "Tmax")]
    pub tmax: f64,
    #[serde(rename = "Tmin")]
    pub tmin: f64,
}

impl SeasonalClimate {
    fn values(&self) -> [f64; 5] {
        [self.precipitation, self.depth_per_event, self.heavy_days, self.tmax, self.tmin]
    }
}

pub fn seasonal(cli: &Cli, season: &Season, years: f64, heavy: f64) -> SeasonalClimate {
    let days: Vec<&CliRecord> = cli.in_months(&season.months).collect();
    let wet: Vec<f64> = days.iter().filter(|r| r.is_wet()).map(|r| r.precipitation).collect();

    SeasonalClimate {
        season: season.name.clone(),
        precipitation: stats::sum(&wet) / years,
        depth_per_event: stats::mean(&wet),
        heavy_days: wet.iter().filter(|p| **p > heavy).count() as f64 / years,
        tmax: stats::mean(&days.iter().map(|r| r.tmax).collect::<Vec<_>>()),
        tmin: stats::mean(&days.iter().map(|r| r.tmin).collect::<Vec<_>>()),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StormSummary {
    #[serde(rename = "Storm type")]
    pub storm: StormClass,
    #[serde(rename = "Avg depth (mm)")]
    pub depth: f64,
    #[serde(rename = "Avg intensity (mm/h)")]
    pub intensity: f64,
}

pub fn storms(cli: &Cli, limits: &[f64; 3]) -> Vec<StormSummary> {
    StormClass::ALL
        .iter()
        .map(|storm| {
            let days: Vec<&CliRecord> = cli
                .records
                .iter()
                .filter(|r| StormClass::classify(r.precipitation, limits) == Some(*storm))
                .collect();
            StormSummary {
                storm: *storm,
                depth: stats::mean(&days.iter().map(|r| r.precipitation).collect::<Vec<_>>()),
                intensity: stats::mean(&days.iter().map(|r| r.intensity()).collect::<Vec<_>>()),
            }
        })
        .collect()
}

/// Percent change of every seasonal variable of a future period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Change {
    #[serde(rename = "Parameters")]
    pub source: String,
    #[serde(rename = "Period")]
    pub period: String,
    #[serde(rename = "Season")]
    pub season: String,
    #[serde(rename = "Pr (%)")]
    pub precipitation: f64,
    #[serde(rename = "Pr_mean_e (%)")]
    pub depth_per_event: f64,
    #[serde(rename = "Pr_25 (%)")]
    pub heavy_days: f64,
    #[serde(rename = "Tmax (%)")]
    pub tmax: f64,
    #[serde(rename = "Tmin (%)")]
    pub tmin: f64,
}

impl Change {
    fn values(&self) -> [f64; 5] {
        [self.precipitation, self.depth_per_event, self.heavy_days, self.tmax, self.tmin]
    }
}

pub fn changes(source: &str, period: &str, future: &[SeasonalClimate], base: &[SeasonalClimate]) -> Vec<Change> {
    future
        .iter()
        .zip(base)
        .map(|(f, b)| {
            let c: Vec<f64> = f
                .values()
                .iter()
                .zip(&b.values())
                .map(|(f, b)| stats::percent_change(*f, *b))
                .collect();
            Change {
                source: source.to_string(),
                period: period.to_string(),
                season: f.season.clone(),
                precipitation: c[0],
                depth_per_event: c[1],
                heavy_days: c[2],
                tmax: c[3],
                tmin: c[4],
            }
        })
        .collect()
}

/// Agreement of calibrated and uncalibrated changes across seasons
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Correlation {
    #[serde(rename = "Period")]
    pub period: String,
    #[serde(rename = "Variable")]
    pub variable: String,
    #[serde(rename = "Pearson r")]
    pub r: f64,
}

pub fn correlations(period: &str, calibrated: &[Change], uncalibrated: &[Change]) -> Vec<Correlation> {
    VARIABLES
        .iter()
        .enumerate()
        .map(|(i, variable)| {
            let a: Vec<f64> = calibrated.iter().map(|c| c.values()[i]).collect();
            let b: Vec<f64> = uncalibrated.iter().map(|c| c.values()[i]).collect();
            Correlation {
                period: period.to_string(),
                variable: variable.to_string(),
                r: stats::pearson(&a, &b),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trends {
    pub seasons: Vec<(String, Vec<SeasonalClimate>)>,
    pub storms: Vec<(String, Vec<StormSummary>)>,
    pub changes: Vec<Change>,
    pub correlations: Vec<Correlation>,
}

const CALIBRATED: &str = "Calibrated";
const UNCALIBRATED: &str = "Uncalibrated";

pub fn trends(params: &Parameters, watershed: &str, model: &str, location: u32) -> Result<Trends> {
    let layout = Layout::new(params, watershed);
    let method = params
        .method_of_model(model)
        .with_context(|| format!("No downscaling method has model {}", model))?;
    let sources: [(&str, PathBuf); 2] = [
        (CALIBRATED, layout.par(method)),
        (UNCALIBRATED, layout.uncalibrated_par(method)),
    ];
    let analysis = &params.analysis;

    let mut result = Trends {
        seasons: vec![],
        storms: vec![],
        changes: vec![],
        correlations: vec![],
    };
    for (source, dir) in &sources {
        for period in &params.climate.periods {
            let path = dir.join(format!("{}.cli", layout.climate_stem(model, location, &period.label)));
            let cli = Cli::read(&path)?;
            let label = format!("{}_{}", source, period.label);
            let years = period.cligen_years as f64;
            result.seasons.push((
                label.clone(),
                analysis
                    .trend_seasons
                    .iter()
                    .map(|s| seasonal(&cli, s, years, analysis.heavy_precipitation))
                    .collect(),
            ));
            result.storms.push((label, storms(&cli, &analysis.storm_limits)));
        }
    }

    let find = |label: String| {
        result
            .seasons
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, s)| s.clone())
            .with_context(|| format!("No climate summary {}", label))
    };
    let baseline = &params.climate.baseline_period;
    let mut all_changes = vec![];
    let mut all_correlations = vec![];
    for period in params.climate.periods.iter().filter(|p| p.label != *baseline) {
        let mut per_source = vec![];
        for (source, _) in &sources {
            let future = find(format!("{}_{}", source, period.label))?;
            let base = find(format!("{}_{}", source, baseline))?;
            per_source.push(changes(source, &period.label, &future, &base));
        }
        all_correlations.extend(correlations(&period.label, &per_source[0], &per_source[1]));
        all_changes.extend(per_source.into_iter().flatten());
    }
    result.changes = all_changes;
    result.correlations = all_correlations;
    Ok(result)
}

pub fn write_trends(params: &Parameters, watershed: &str, model: &str, trends: &Trends) -> Result<()> {
    let dir = params.environment.resolve(&params.environment.output_directory);
    let prefix = format!("{}_{}", watershed, model);

    for (label, seasons) in &trends.seasons {
        write_csv(dir.join(format!("{}_{}_seasonal.csv", prefix, label)), seasons)?;
    }
    for (label, storms) in &trends.storms {
        write_csv(dir.join(format!("{}_{}_storms.csv", prefix, label)), storms)?;
    }
    write_csv(dir.join(format!("{}_changes.csv", prefix)), &trends.changes)?;
    write_csv(dir.join(format!("{}_pearson.csv", prefix)), &trends.correlations)?;

    let change_rows: Vec<Vec<String>> = trends
        .changes
        .iter()
        .map(|c| {
            let mut row = vec![c.source.clone(), c.period.clone(), c.season.clone()];
            row.extend(c.values().iter().map(|v| format!("{:.1}", v)));
            row
        })
        .collect();
    let mut change_headers = vec!["Parameters", "Period", "Season"];
    change_headers.extend(VARIABLES.iter());
    let correlation_rows: Vec<Vec<String>> = trends
        .correlations
        .iter()
        .map(|c| vec![c.period.clone(), c.variable.clone(), format!("{:.3}", c.r)])
        .collect();

    write_page(
        dir.join(format!("{}_trends.html", prefix)),
        &format!("{} {} climate trends", watershed, model),
        &[
            Section::new("Change from baseline (%)", table(&change_headers, &change_rows)),
            Section::new("Pearson r", table(&["Period", "Variable", "r"], &correlation_rows)),
        ],
    )?;

    for c in &trends.correlations {
        if c.r.is_nan() {
            warn!("{} {} {}: correlation undefined", prefix, c.period, c.variable);
        } else {
            info!("{} {} {}: r = {:.3}", prefix, c.period, c.variable, c.r);
        }
    }
    Ok(())
}
