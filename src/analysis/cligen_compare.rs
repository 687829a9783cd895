//! Baseline CLIGEN output against the observed station record.

use {
    crate::{
        analysis::storm_depths,
        constants::{MM_PER_INCH, MONTHS},
        formats::cli::Cli,
        layout::Layout,
        observed::{read_records, DailyObservation, MonthlyTable, DAILY, MONTHLY_EVENTS, MONTHLY_PRECIPITATION},
        parameters::Parameters,
        report::{
            html::{table, write_page, Section},
            tables::write_csv,
            LineGraph,
        },
        stats::{self, StormClass},
    },
    anyhow::{Context, Result},
    log::info,
    serde::Serialize,
    std::path::{Path, PathBuf},
};

fn fahrenheit_to_celsius(t: f64) -> f64 {
    (t - 32.0) * 5.0 / 9.0
}

/// A day of station weather in millimetres and degrees Celsius
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StationDay {
    pub month: u32,
    pub precipitation: f64,
    pub tmax: f64,
    pub tmin: f64,
}

impl From<&DailyObservation> for StationDay {
    /// Missing values are read as zero
    fn from(day: &DailyObservation) -> Self {
        StationDay {
            month: day.month,
            precipitation: day.pr.unwrap_or(0.0) * MM_PER_INCH,
            tmax: fahrenheit_to_celsius(day.tmax.unwrap_or(0.0)),
            tmin: fahrenheit_to_celsius(day.tmin.unwrap_or(0.0)),
        }
    }
}

/// Monthly means of one climate record
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlyClimate {
    #[serde(rename = "Month")]
    pub month: u32,
    /// Mean monthly total (mm)
    #[serde(rename = "Pr")]
    pub precipitation: f64,
    /// Mean depth per wet day (mm)
    #[serde(rename = "Pr_mean_e")]
    pub depth_per_event: f64,
    /// Mean number of wet days
    #[serde(rename = "Pr_e")]
    pub events: f64,
    #[serde(rename = "Tmax")]
    pub tmax: f64,
    #[serde(rename = "Tmin")]
    pub tmin: f64,
}

pub const VARIABLES: [&str; 5] = ["Pr", "Pr_mean_e", "Pr_e", "Tmax", "Tmin"];

impl MonthlyClimate {
    fn variable(&self, index: usize) -> f64 {
        match index {
            0 => self.precipitation,
            1 => self.depth_per_event,
            2 => self.events,
            3 => self.tmax,
            _ => self.tmin,
        }
    }
}

fn month_numbers() -> impl Iterator<Item = u32> {
    1..=MONTHS as u32
}

pub fn observed_monthly(
    precipitation: &MonthlyTable,
    events: &MonthlyTable,
    days: &[StationDay],
) -> Vec<MonthlyClimate> {
    let (totals, counts) = (precipitation.mean(), events.mean());
    month_numbers()
        .map(|month| {
            let in_month: Vec<&StationDay> = days.iter().filter(|d| d.month == month).collect();
            let wet: Vec<f64> = in_month
                .iter()
                .map(|d| d.precipitation)
                .filter(|p| *p > 0.0)
                .collect();
            let m = month as usize - 1;
            MonthlyClimate {
                month,
                precipitation: totals[m] * MM_PER_INCH,
                depth_per_event: stats::mean(&wet),
                events: counts[m],
                tmax: stats::mean(&in_month.iter().map(|d| d.tmax).collect::<Vec<_>>()),
                tmin: stats::mean(&in_month.iter().map(|d| d.tmin).collect::<Vec<_>>()),
            }
        })
        .collect()
}

/// Monthly means of a CLIGEN file simulating `years` years
pub fn cligen_monthly(cli: &Cli, years: f64) -> Vec<MonthlyClimate> {
    month_numbers()
        .map(|month| {
            let days: Vec<_> = cli.records.iter().filter(|r| r.month == month).collect();
            let wet: Vec<f64> = days.iter().filter(|r| r.is_wet()).map(|r| r.precipitation).collect();
            MonthlyClimate {
                month,
                precipitation: days.iter().map(|r| r.precipitation).sum::<f64>() / years,
                depth_per_event: stats::mean(&wet),
                events: wet.len() as f64 / years,
                tmax: stats::mean(&days.iter().map(|r| r.tmax).collect::<Vec<_>>()),
                tmin: stats::mean(&days.iter().map(|r| r.tmin).collect::<Vec<_>>()),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fit {
    #[serde(rename = "Variable")]
    pub variable: String,
    #[serde(rename = "NSE")]
    pub nse: f64,
    #[serde(rename = "RMSE")]
    pub rmse: f64,
}

pub fn fits(observed: &[MonthlyClimate], cligen: &[MonthlyClimate]) -> Vec<Fit> {
    VARIABLES
        .iter()
        .enumerate()
        .map(|(i, variable)| {
            let o: Vec<f64> = observed.iter().map(|m| m.variable(i)).collect();
            let c: Vec<f64> = cligen.iter().map(|m| m.variable(i)).collect();
            Fit {
                variable: variable.to_string(),
                nse: stats::nse(&o, &c),
                rmse: stats::rmse(&o, &c),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StormComparison {
    #[serde(rename = "Storm type")]
    pub storm: StormClass,
    #[serde(rename = "Measured mean depth")]
    pub observed_mean: f64,
    #[serde(rename = "Measured stdev")]
    pub observed_stdev: f64,
    #[serde(rename = "CLIGEN mean depth")]
    pub cligen_mean: f64,
    #[serde(rename = "CLIGEN stdev")]
    pub cligen_stdev: f64,
    /// Welch's t-test of equal means
    #[serde(rename = "p value")]
    pub p: f64,
}

pub fn compare_storms(observed: &[f64], cligen: &[f64], limits: &[f64; 3]) -> Vec<StormComparison> {
    let (observed, cligen) = (storm_depths(observed, limits), storm_depths(cligen, limits));
    StormClass::ALL
        .iter()
        .map(|storm| {
            let (o, c) = (&observed[storm], &cligen[storm]);
            StormComparison {
                storm: *storm,
                observed_mean: stats::mean(o),
                observed_stdev: stats::pstdev(o),
                cligen_mean: stats::mean(c),
                cligen_stdev: stats::pstdev(c),
                p: stats::welch_t_test(o, c).p,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct CligenComparison {
    pub observed: Vec<MonthlyClimate>,
    pub cligen: Vec<MonthlyClimate>,
    pub fits: Vec<Fit>,
    pub storms: Vec<StormComparison>,
}

/// Baseline climate file of a model, calibrated or as generated
pub fn baseline_cli(params: &Parameters, watershed: &str, model: &str, location: u32, uncalibrated: bool) -> Result<PathBuf> {
    let layout = Layout::new(params, watershed);
    let method = params
        .method_of_model(model)
        .with_context(|| format!("No downscaling method has model {}", model))?;
    let dir = if uncalibrated {
        layout.uncalibrated_par(method)
    } else {
        layout.par(method)
    };
    Ok(dir.join(format!(
        "{}.cli",
        layout.climate_stem(model, location, &params.climate.baseline_period)
    )))
}

pub fn compare(params: &Parameters, watershed: &str, cli: &Path) -> Result<CligenComparison> {
    let layout = Layout::new(params, watershed);
    let daily: Vec<DailyObservation> = read_records(layout.observed(DAILY))?;
    let days: Vec<StationDay> = daily.iter().map(StationDay::from).collect();
    let observed = observed_monthly(
        &MonthlyTable::read(layout.observed(MONTHLY_PRECIPITATION))?,
        &MonthlyTable::read(layout.observed(MONTHLY_EVENTS))?,
        &days,
    );

    let years = params
        .baseline()
        .context("No baseline period configured")?
        .cligen_years as f64;
    let cli = Cli::read(cli)?;
    let cligen = cligen_monthly(&cli, years);

    let observed_depths: Vec<f64> = days.iter().map(|d| d.precipitation).collect();
    let cligen_depths: Vec<f64> = cli.records.iter().map(|r| r.precipitation).collect();

    Ok(CligenComparison {
        fits: fits(&observed, &cligen),
        storms: compare_storms(&observed_depths, &cligen_depths, &params.analysis.storm_limits),
        observed,
        cligen,
    })
}

fn monthly_graphs(comparison: &CligenComparison) -> Vec<Section> {
    VARIABLES
        .iter()
        .enumerate()
        .map(|(i, variable)| {
            let fit = &comparison.fits[i];
            let graph = LineGraph {
                title: format!("Monthly {}", variable),
                data_y: vec![
                    comparison.observed.iter().map(|m| m.variable(i)).collect(),
                    comparison.cligen.iter().map(|m| m.variable(i)).collect(),
                ],
                series_labels: vec!["Measured".to_string(), "CLIGEN".to_string()],
                x_axis_label: "Month".to_string(),
                y_axis_label: variable.to_string(),
                draw_points: true,
                annotations: vec![format!("NSE {:.2}", fit.nse), format!("RMSE {:.2}", fit.rmse)],
                ..LineGraph::default()
            };
            Section::new(*variable, graph.get_svg())
        })
        .collect()
}

/// Writes the comparison of one baseline climate file to the comparisons directory.
pub fn write_comparison(params: &Parameters, watershed: &str, label: &str, comparison: &CligenComparison) -> Result<()> {
    let dir = params.environment.resolve(&params.environment.output_directory);
    let prefix = format!("{}_{}", watershed, label);

    write_csv(dir.join(format!("{}_measured.csv", prefix)), &comparison.observed)?;
    write_csv(dir.join(format!("{}_cligen.csv", prefix)), &comparison.cligen)?;
    write_csv(dir.join(format!("{}_nse_rmse.csv", prefix)), &comparison.fits)?;
    write_csv(dir.join(format!("{}_binned_storms.csv", prefix)), &comparison.storms)?;

    let rows: Vec<Vec<String>> = comparison
        .storms
        .iter()
        .map(|s| {
            vec![
                s.storm.to_string(),
                format!("{:.2}", s.observed_mean),
                format!("{:.2}", s.cligen_mean),
                format!("{:.3}", s.p),
            ]
        })
        .collect();
    let mut sections = monthly_graphs(comparison);
    sections.push(Section::new(
        "Storm depths",
        table(&["Storm type", "Measured (mm)", "CLIGEN (mm)", "p value"], &rows),
    ));
    write_page(dir.join(format!("{}.html", prefix)), &prefix, &sections)?;

    for fit in &comparison.fits {
        info!("{} {}: NSE {:.3}, RMSE {:.3}", prefix, fit.variable, fit.nse, fit.rmse);
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use {super::*, approx::assert_abs_diff_eq};

    fn station_day(month: u32, pr: Option<f64>, tmax: f64, tmin: f64) -> StationDay {
        StationDay::from(&DailyObservation {
            year: 2000,
            month,
            day: 1,
            pr,
            tmax: Some(tmax),
            tmin: Some(tmin),
        })
    }

    #[test]
    fn station_units() {
        let day = station_day(1, Some(1.0), 212.0, 32.0);
        assert_abs_diff_eq!(day.precipitation, 25.4);
        assert_abs_diff_eq!(day.tmax, 100.0, epsilon = 1e-12);
        assert_abs_diff_eq!(day.tmin, 0.0);
        assert_eq!(station_day(1, None, 32.0, 32.0).precipitation, 0.0);
    }

    #[test]
    fn cligen_months() {
        let cli = Cli::parse(include_str!("../testdata/GO1_B3_1_19.cli")).unwrap();
        let monthly = cligen_monthly(&cli, 2.0);
        assert_eq!(monthly.len(), 12);

        let july = &monthly[6];
        assert_abs_diff_eq!(july.precipitation, 34.0);
        assert_abs_diff_eq!(july.depth_per_event, 68.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(july.events, 1.5);
        assert_abs_diff_eq!(july.tmax, 29.4, epsilon = 1e-9);

        let january = &monthly[0];
        assert_abs_diff_eq!(january.events, 0.5);
        assert!(monthly[2].depth_per_event.is_nan());
    }

    #[test]
    fn observed_months() {
        let precipitation = MonthlyTable {
            rows: vec![(2000, [1.0; 12]), (2001, [2.0; 12])],
        };
        let events = MonthlyTable {
            rows: vec![(2000, [4.0; 12])],
        };
        let days = [
            station_day(6, Some(1.0), 50.0, 32.0),
            station_day(6, Some(0.0), 68.0, 50.0),
            station_day(6, None, 86.0, 50.0),
        ];

        let june = observed_monthly(&precipitation, &events, &days)[5];
        assert_abs_diff_eq!(june.precipitation, 1.5 * 25.4, epsilon = 1e-12);
        assert_abs_diff_eq!(june.depth_per_event, 25.4);
        assert_abs_diff_eq!(june.events, 4.0);
        assert_abs_diff_eq!(june.tmax, 20.0, epsilon = 1e-12);
    }

    #[test]
    fn perfect_fit() {
        let cli = Cli::parse(include_str!("../testdata/GO1_B3_1_19.cli")).unwrap();
        let monthly = cligen_monthly(&cli, 2.0);
        let fits = fits(&monthly, &monthly);
        assert_eq!(fits.len(), 5);
        assert_eq!(fits[0].variable, "Pr");
        assert_abs_diff_eq!(fits[0].nse, 1.0);
        assert_abs_diff_eq!(fits[0].rmse, 0.0);
    }

    #[test]
    fn storm_table() {
        let observed = [0.0, 2.0, 4.0, 12.0, 30.0, 40.0, 60.0];
        let cligen = [1.0, 3.0, 15.0, 20.0, 35.0];
        let storms = compare_storms(&observed, &cligen, &[10.0, 25.0, 50.0]);

        assert_eq!(storms.len(), 4);
        assert_abs_diff_eq!(storms[0].observed_mean, 3.0);
        assert_abs_diff_eq!(storms[0].observed_stdev, 1.0);
        assert_abs_diff_eq!(storms[1].cligen_mean, 17.5);
        assert_abs_diff_eq!(storms[2].observed_mean, 35.0);
        assert!(storms[3].cligen_mean.is_nan());
        assert!(storms[3].p.is_nan());
        assert!(storms[0].p > 0.0 && storms[0].p <= 1.0);
    }
}
