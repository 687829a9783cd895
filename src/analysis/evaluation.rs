//! Edge-of-field evaluation of a calibrated WEPP hillslope: observed farm
//! precipitation, runoff and sediment against the modeled event output.

use {
    crate::{
        constants::{DETACHMENT_TO_TONS_PER_HA, LBS_PER_ACRE_TO_TONS_PER_HA, MM_PER_INCH},
        formats::{cli::Cli, ebe::{self, EbeRecord}},
        layout::Layout,
        observed::{read_records, DailyObservation, RunoffRecord, FARM_DAILY, RUNOFF_EVENTS},
        parameters::{EdgeOfField, Parameters, Season},
        report::{
            html::{write_page, Section},
            tables::write_csv,
            LineGraph,
        },
        stats,
        utils::{file_name, files_with_extension},
    },
    anyhow::{bail, Context, Result},
    chrono::NaiveDate,
    log::{info, warn},
    serde::Serialize,
    std::collections::HashMap,
};

/// Values that can be binned by depth and halved when a bin holds one event
pub trait Binned: Clone {
    fn year(&self) -> i32;
    fn value(&self) -> f64;
    fn halve(&mut self);
}

/// A season day of farm precipitation (mm), gaps filled from the climate file
#[derive(Debug, Clone, PartialEq)]
pub struct FarmDay {
    pub date: NaiveDate,
    pub year: i32,
    pub month: u32,
    pub precipitation: f64,
}

impl Binned for FarmDay {
    fn year(&self) -> i32 {
        self.year
    }

    fn value(&self) -> f64 {
        self.precipitation
    }

    fn halve(&mut self) {
        self.precipitation /= 2.0;
    }
}

/// Farm precipitation with missing days taken from the climate file. Observed
/// year `observed_years[i]` is simulation year `cli_years[i]`.
pub fn fill_precipitation(
    days: &[DailyObservation],
    cli: &Cli,
    observed_years: &[i32],
    cli_years: &[u32],
) -> Vec<FarmDay> {
    let simulated: HashMap<(i32, u32, u32), f64> = cli
        .records
        .iter()
        .map(|r| ((r.year, r.month, r.day), r.precipitation))
        .collect();

    days.iter()
        .filter_map(|day| {
            let date = day.date()?;
            let precipitation = match day.pr {
                Some(pr) => pr * MM_PER_INCH,
                None => observed_years
                    .iter()
                    .position(|y| *y == day.year)
                    .and_then(|i| cli_years.get(i))
                    .and_then(|year| simulated.get(&(*year as i32, day.month, day.day)))
                    .copied()
                    .unwrap_or(0.0),
            };
            Some(FarmDay {
                date,
                year: day.year,
                month: day.month,
                precipitation,
            })
        })
        .collect()
}

/// Observed runoff event (mm) with its sediment (t/ha) and precipitation (mm)
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedEvent {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub year: i32,
    pub month: u32,
    pub precipitation: f64,
    pub runoff: f64,
    pub tss: f64,
}

impl Binned for ObservedEvent {
    fn year(&self) -> i32 {
        self.year
    }

    fn value(&self) -> f64 {
        self.runoff
    }

    fn halve(&mut self) {
        self.runoff /= 2.0;
    }
}

/// Merges records sharing a window, converts units and keeps the season's
/// rainfall events. Events without precipitation or with more runoff than
/// precipitation are snowmelt and are dropped.
pub fn observed_events(
    records: &[RunoffRecord],
    days: &[FarmDay],
    season: &Season,
    tss_fraction: f64,
) -> Result<Vec<ObservedEvent>> {
    let mut events: Vec<ObservedEvent> = vec![];
    for record in records.iter().filter(|r| season.contains(r.month)) {
        let (start, end) = record.window()?;
        match events.iter_mut().find(|e| e.start == start && e.end == end) {
            Some(event) => {
                event.runoff += record.runoff;
                event.tss += record.tss;
            }
            None => events.push(ObservedEvent {
                start,
                end,
                year: record.year,
                month: record.month,
                precipitation: 0.0,
                runoff: record.runoff,
                tss: record.tss,
            }),
        }
    }

    for event in &mut events {
        event.runoff *= MM_PER_INCH;
        event.tss *= LBS_PER_ACRE_TO_TONS_PER_HA * tss_fraction;
        event.precipitation = days
            .iter()
            .filter(|d| d.date >= event.start && d.date <= event.end)
            .map(|d| d.precipitation)
            .sum();
    }
    events.sort_by_key(|e| (e.start, e.end));
    events.retain(|e| e.precipitation != 0.0 && e.runoff <= e.precipitation);
    Ok(events)
}

/// Splits items into two halves with equal shares of each crop and depth
/// bin. The first half takes the extra item of an odd bin; a bin holding a
/// single item gives it to both halves with its value halved.
pub fn split_halves<T: Binned>(items: &[T], crops: [&[i32]; 2], bins: &[[f64; 2]]) -> (Vec<T>, Vec<T>) {
    let (mut first, mut second) = (vec![], vec![]);
    for [low, high] in bins {
        for crop in &crops {
            let binned: Vec<T> = items
                .iter()
                .filter(|i| crop.contains(&i.year()) && i.value() >= *low && i.value() < *high)
                .cloned()
                .collect();
            match binned.len() {
                0 => {}
                1 => {
                    let mut item = binned[0].clone();
                    item.halve();
                    first.push(item.clone());
                    second.push(item);
                }
                n => {
                    let mid = (n + 1) / 2;
                    first.extend_from_slice(&binned[..mid]);
                    second.extend_from_slice(&binned[mid..]);
                }
            }
        }
    }
    (first, second)
}

/// Average monthly totals of observed and modeled values
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlyComparison {
    #[serde(rename = "Month")]
    pub month: u32,
    #[serde(rename = "obs_monthly_pr")]
    pub observed_precipitation: f64,
    #[serde(rename = "mod_monthly_pr")]
    pub modeled_precipitation: f64,
    #[serde(rename = "obs_RO")]
    pub observed_runoff: f64,
    #[serde(rename = "mod_RO")]
    pub modeled_runoff: f64,
    #[serde(rename = "obs_RR")]
    pub observed_ratio: f64,
    #[serde(rename = "mod_RR")]
    pub modeled_ratio: f64,
    #[serde(rename = "obs_TSS")]
    pub observed_tss: f64,
    #[serde(rename = "mod_TSS")]
    pub modeled_tss: f64,
}

fn ratio(runoff: f64, precipitation: f64) -> f64 {
    if precipitation > 0.0 {
        runoff / precipitation
    } else {
        0.0
    }
}

fn monthly_sum<T>(items: &[T], month: u32, month_of: impl Fn(&T) -> u32, value: impl Fn(&T) -> f64) -> f64 {
    items.iter().filter(|i| month_of(i) == month).map(value).sum()
}

/// Modeled sediment (t/ha) of an event
pub fn modeled_tss(event: &EbeRecord) -> f64 {
    event.average_detachment * DETACHMENT_TO_TONS_PER_HA
}

/// Observed totals are divided by `observed_years`, modeled totals by the
/// years of the climate file.
pub fn monthly_comparison(
    season: &Season,
    days: &[FarmDay],
    events: &[ObservedEvent],
    observed_years: f64,
    cli: &Cli,
    modeled: &[EbeRecord],
) -> Vec<MonthlyComparison> {
    let simulated_years = cli.years() as f64;
    season
        .months
        .iter()
        .map(|&month| {
            let observed_precipitation = monthly_sum(days, month, |d| d.month, |d| d.precipitation) / observed_years;
            let observed_runoff = monthly_sum(events, month, |e| e.month, |e| e.runoff) / observed_years;
            let modeled_precipitation =
                monthly_sum(&cli.records, month, |r| r.month, |r| r.precipitation) / simulated_years;
            let modeled_runoff = monthly_sum(modeled, month, |e| e.month, |e| e.runoff) / simulated_years;

            MonthlyComparison {
                month,
                observed_precipitation,
                modeled_precipitation,
                observed_runoff,
                modeled_runoff,
                observed_ratio: ratio(observed_runoff, observed_precipitation),
                modeled_ratio: ratio(modeled_runoff, modeled_precipitation),
                observed_tss: monthly_sum(events, month, |e| e.month, |e| e.tss) / observed_years,
                modeled_tss: monthly_sum(modeled, month, |e| e.month, modeled_tss) / simulated_years,
            }
        })
        .collect()
}

/// Month by month mean over several watersheds; all must cover the same months
pub fn combined(comparisons: &[Vec<MonthlyComparison>]) -> Vec<MonthlyComparison> {
    let first = match comparisons.first() {
        Some(first) => first,
        None => return vec![],
    };
    first
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let mean = |f: fn(&MonthlyComparison) -> f64| {
                stats::mean(&comparisons.iter().filter_map(|c| c.get(i)).map(f).collect::<Vec<_>>())
            };
            MonthlyComparison {
                month: m.month,
                observed_precipitation: mean(|m| m.observed_precipitation),
                modeled_precipitation: mean(|m| m.modeled_precipitation),
                observed_runoff: mean(|m| m.observed_runoff),
                modeled_runoff: mean(|m| m.modeled_runoff),
                observed_ratio: mean(|m| m.observed_ratio),
                modeled_ratio: mean(|m| m.modeled_ratio),
                observed_tss: mean(|m| m.observed_tss),
                modeled_tss: mean(|m| m.modeled_tss),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scores {
    #[serde(rename = "Watershed")]
    pub watershed: String,
    #[serde(rename = "Dataset")]
    pub dataset: String,
    #[serde(rename = "NSE_TSS")]
    pub nse_tss: f64,
    #[serde(rename = "PBIAS_TSS")]
    pub pbias_tss: f64,
    #[serde(rename = "NSE_RO")]
    pub nse_runoff: f64,
    #[serde(rename = "PBIAS_RO")]
    pub pbias_runoff: f64,
    #[serde(rename = "NSE_RR")]
    pub nse_ratio: f64,
    #[serde(rename = "PBIAS_RR")]
    pub pbias_ratio: f64,
}

pub fn scores(watershed: &str, dataset: &str, monthly: &[MonthlyComparison]) -> Scores {
    let column = |f: fn(&MonthlyComparison) -> f64| monthly.iter().map(f).collect::<Vec<f64>>();
    let fit = |o: fn(&MonthlyComparison) -> f64, m: fn(&MonthlyComparison) -> f64| {
        let (o, m) = (column(o), column(m));
        (stats::nse(&o, &m), stats::pbias(&o, &m))
    };
    let (nse_tss, pbias_tss) = fit(|m| m.observed_tss, |m| m.modeled_tss);
    let (nse_runoff, pbias_runoff) = fit(|m| m.observed_runoff, |m| m.modeled_runoff);
    let (nse_ratio, pbias_ratio) = fit(|m| m.observed_ratio, |m| m.modeled_ratio);

    Scores {
        watershed: watershed.to_string(),
        dataset: dataset.to_string(),
        nse_tss,
        pbias_tss,
        nse_runoff,
        pbias_runoff,
        nse_ratio,
        pbias_ratio,
    }
}

pub const FULL: &str = "Full";
pub const CALIBRATION: &str = "Calibration";
pub const VALIDATION: &str = "Validation";

/// Monthly comparisons of one watershed for the full record and its halves
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub watershed: String,
    pub datasets: Vec<(String, Vec<MonthlyComparison>)>,
}

impl Evaluation {
    pub fn full(&self) -> Option<&[MonthlyComparison]> {
        self.datasets
            .iter()
            .find(|(name, _)| name == FULL)
            .map(|(_, monthly)| monthly.as_slice())
    }

    pub fn scores(&self) -> Vec<Scores> {
        self.datasets
            .iter()
            .map(|(name, monthly)| scores(&self.watershed, name, monthly))
            .collect()
    }
}

fn edge_of_field<'a>(params: &'a Parameters, watershed: &str) -> Result<&'a EdgeOfField> {
    params
        .watershed(watershed)
        .and_then(|w| w.edge_of_field.as_ref())
        .with_context(|| format!("No edge-of-field record configured for {}", watershed))
}

pub fn evaluate(params: &Parameters, watershed: &str) -> Result<Evaluation> {
    let field = edge_of_field(params, watershed)?;
    let layout = Layout::new(params, watershed);
    let season = &params.analysis.growing_season;

    let cli = Cli::read(layout.runs(&field.run_directory).join(format!("{}.cli", field.hillslope)))?;
    let output = layout.output(&field.run_directory);
    let ebe_file = files_with_extension(&output, "dat")?
        .into_iter()
        .find(|p| file_name(p).ends_with(".ebe.dat"));
    let modeled: Vec<EbeRecord> = match ebe_file {
        Some(path) => ebe::read(path)?,
        None => bail!("No event output in {}", output.display()),
    };
    let modeled: Vec<EbeRecord> = modeled.into_iter().filter(|e| season.contains(e.month)).collect();

    let farm: Vec<DailyObservation> = read_records(layout.observed(FARM_DAILY))?;
    let days = fill_precipitation(&farm, &cli, &field.observed_years, &field.cli_years);
    let records: Vec<RunoffRecord> = read_records(layout.observed(RUNOFF_EVENTS))?;
    let events = observed_events(&records, &days, season, field.tss_fraction)?;
    let season_days: Vec<FarmDay> = days.into_iter().filter(|d| season.contains(d.month)).collect();

    let crops = [field.first_crop_years.as_slice(), field.second_crop_years.as_slice()];
    let (events_1, events_2) = split_halves(&events, crops, &params.analysis.runoff_bins);
    let (days_1, days_2) = split_halves(&season_days, crops, &params.analysis.precipitation_bins);
    if events_1.is_empty() {
        warn!("{}: no observed runoff events fall in the runoff bins", watershed);
    }

    let years = field.observed_years.len() as f64;
    let all_events: Vec<ObservedEvent> = events_1.iter().chain(&events_2).cloned().collect();
    let all_days: Vec<FarmDay> = days_1.iter().chain(&days_2).cloned().collect();
    let compare = |days: &[FarmDay], events: &[ObservedEvent], years: f64| {
        monthly_comparison(season, days, events, years, &cli, &modeled)
    };

    Ok(Evaluation {
        watershed: watershed.to_string(),
        datasets: vec![
            (FULL.to_string(), compare(&all_days, &all_events, years)),
            (CALIBRATION.to_string(), compare(&days_1, &events_1, years / 2.0)),
            (VALIDATION.to_string(), compare(&days_2, &events_2, years / 2.0)),
        ],
    })
}

fn comparison_graphs(name: &str, monthly: &[MonthlyComparison], scores: &Scores) -> Vec<Section> {
    type Column = fn(&MonthlyComparison) -> f64;
    let panels: [(&str, Column, Column, f64, f64); 3] = [
        ("Average total runoff (mm)", |m| m.observed_runoff, |m| m.modeled_runoff, scores.nse_runoff, scores.pbias_runoff),
        ("Average runoff ratio", |m| m.observed_ratio, |m| m.modeled_ratio, scores.nse_ratio, scores.pbias_ratio),
        ("Average total soil loss (t/ha)", |m| m.observed_tss, |m| m.modeled_tss, scores.nse_tss, scores.pbias_tss),
    ];

    panels
        .iter()
        .map(|(label, observed, modeled, nse, pbias)| {
            let graph = LineGraph {
                title: format!("{}: {}", name, label),
                data_x: vec![monthly.iter().map(|m| m.month as f64).collect(); 2],
                data_y: vec![monthly.iter().map(observed).collect(), monthly.iter().map(modeled).collect()],
                series_labels: vec!["Observed".to_string(), "WEPP".to_string()],
                x_axis_label: "Month".to_string(),
                y_axis_label: label.to_string(),
                draw_points: true,
                annotations: vec![format!("NSE = {:.2}", nse), format!("PBIAS = {:.0}", pbias)],
                ..LineGraph::default()
            };
            Section::new(format!("{} {}", name, label), graph.get_svg())
        })
        .collect()
}

pub const COMBINED: &str = "Combined";

/// Evaluates every listed watershed plus their month by month mean and
/// writes tables and graphs to the comparisons directory.
pub fn evaluate_all(params: &Parameters, watersheds: &[String]) -> Result<Vec<Scores>> {
    let evaluations = watersheds
        .iter()
        .map(|w| evaluate(params, w))
        .collect::<Result<Vec<_>>>()?;
    let dir = params.environment.resolve(&params.environment.output_directory);

    let mut all_scores = vec![];
    let mut sections = vec![];
    for evaluation in &evaluations {
        for (dataset, monthly) in &evaluation.datasets {
            write_csv(dir.join(format!("{}_{}_monthly.csv", evaluation.watershed, dataset)), monthly)?;
        }
        let scores = evaluation.scores();
        if let (Some(monthly), Some(full)) = (evaluation.full(), scores.first()) {
            sections.extend(comparison_graphs(&evaluation.watershed, monthly, full));
        }
        all_scores.extend(scores);
    }

    let full: Vec<Vec<MonthlyComparison>> = evaluations
        .iter()
        .filter_map(|e| e.full().map(|m| m.to_vec()))
        .collect();
    if full.len() > 1 {
        let monthly = combined(&full);
        let score = scores(COMBINED, FULL, &monthly);
        write_csv(dir.join(format!("{}_{}_monthly.csv", COMBINED, FULL)), &monthly)?;
        sections.extend(comparison_graphs(COMBINED, &monthly, &score));
        all_scores.push(score);
    }

    write_csv(dir.join("nse_pbias.csv"), &all_scores)?;
    write_page(dir.join("nse_pbias.html"), "WEPP against edge-of-field observations", &sections)?;
    for s in &all_scores {
        info!(
            "{} {}: runoff NSE {:.2} PBIAS {:.0}, TSS NSE {:.2} PBIAS {:.0}",
            s.watershed, s.dataset, s.nse_runoff, s.pbias_runoff, s.nse_tss, s.pbias_tss
        );
    }
    Ok(all_scores)
}

#[cfg(test)]
mod test {
    use {super::*, approx::assert_abs_diff_eq};

    fn growing() -> Season {
        Season::new("Growing", &[4, 5, 6, 7, 8, 9, 10, 11])
    }

    fn farm_day(y: i32, m: u32, d: u32, pr: Option<f64>) -> DailyObservation {
        DailyObservation {
            year: y,
            month: m,
            day: d,
            pr,
            tmax: None,
            tmin: None,
        }
    }

    fn runoff(start: &str, end: &str, month: u32, ro: f64, tss: f64) -> RunoffRecord {
        RunoffRecord {
            start: start.to_string(),
            end: end.to_string(),
            year: 2014,
            month,
            day: 1,
            runoff: ro,
            tss,
        }
    }

    #[test]
    fn gaps_filled_from_simulation() {
        let cli = Cli::parse(include_str!("../testdata/GO1_B3_1_19.cli")).unwrap();
        let days = [
            farm_day(2014, 7, 4, None),
            farm_day(2015, 7, 1, None),
            farm_day(2015, 7, 2, Some(0.5)),
            farm_day(2016, 7, 1, None),
        ];
        let filled = fill_precipitation(&days, &cli, &[2014, 2015, 2016], &[1, 2, 3]);
        assert_eq!(filled.len(), 4);
        assert_abs_diff_eq!(filled[0].precipitation, 30.0);
        assert_abs_diff_eq!(filled[1].precipitation, 26.0);
        assert_abs_diff_eq!(filled[2].precipitation, 12.7);
        // year 3 is not simulated
        assert_abs_diff_eq!(filled[3].precipitation, 0.0);
    }

    #[test]
    fn merged_events() {
        let day = |m: u32, d: u32, pr: f64| FarmDay {
            date: NaiveDate::from_ymd(2014, m, d),
            year: 2014,
            month: m,
            precipitation: pr,
        };
        let days = [day(6, 3, 20.0), day(6, 4, 5.0), day(7, 1, 2.0), day(3, 15, 10.0)];
        let records = [
            runoff("2014-06-03 14:00:00", "2014-06-04 02:00:00", 6, 0.1, 100.0),
            runoff("2014-06-03 14:00:00", "2014-06-04 02:00:00", 6, 0.2, 50.0),
            // runoff exceeds precipitation
            runoff("2014-07-01 10:00:00", "2014-07-01 12:00:00", 7, 0.5, 10.0),
            // no precipitation
            runoff("2014-08-01 10:00:00", "2014-08-01 12:00:00", 8, 0.1, 10.0),
            // outside the season
            runoff("2014-03-15 10:00:00", "2014-03-15 12:00:00", 3, 0.1, 10.0),
        ];

        let events = observed_events(&records, &days, &growing(), 0.5).unwrap();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_abs_diff_eq!(event.runoff, 0.3 * 25.4, epsilon = 1e-9);
        assert_abs_diff_eq!(event.precipitation, 25.0);
        assert_abs_diff_eq!(event.tss, 150.0 * 0.001_235_53 * 0.5, epsilon = 1e-12);
    }

    fn event(year: i32, runoff: f64) -> ObservedEvent {
        let date = NaiveDate::from_ymd(year, 6, 1);
        ObservedEvent {
            start: date,
            end: date,
            year,
            month: 6,
            precipitation: 50.0,
            runoff,
            tss: 0.1,
        }
    }

    #[test]
    fn balanced_halves() {
        let events = [
            event(2011, 1.0),
            event(2011, 2.0),
            event(2011, 3.0),
            event(2013, 4.0),
            event(2013, 12.0),
            event(2020, 1.0),
        ];
        let crops: [&[i32]; 2] = [&[2011, 2012], &[2013]];
        let bins = [[0.0, 5.0], [5.0, 10.0], [10.0, 15.0]];
        let (first, second) = split_halves(&events, crops, &bins);

        let runoff = |half: &[ObservedEvent]| half.iter().map(|e| e.runoff).collect::<Vec<_>>();
        // the single small 2013 event is halved into both
        assert_eq!(runoff(&first), vec![1.0, 2.0, 2.0, 6.0]);
        assert_eq!(runoff(&second), vec![3.0, 2.0, 6.0]);
    }

    #[test]
    fn monthly_totals() {
        let cli = Cli::parse(include_str!("../testdata/GO1_B3_1_19.cli")).unwrap();
        let modeled: Vec<EbeRecord> = ebe::parse(include_str!("../testdata/H1.ebe.dat"))
            .unwrap()
            .into_iter()
            .filter(|e| growing().contains(e.month))
            .collect();
        let days = [FarmDay {
            date: NaiveDate::from_ymd(2014, 6, 1),
            year: 2014,
            month: 6,
            precipitation: 40.0,
        }];
        let events = [event(2014, 10.0)];

        let monthly = monthly_comparison(&growing(), &days, &events, 2.0, &cli, &modeled);
        assert_eq!(monthly.len(), 8);

        let june = &monthly[2];
        assert_eq!(june.month, 6);
        assert_abs_diff_eq!(june.observed_precipitation, 20.0);
        assert_abs_diff_eq!(june.observed_runoff, 5.0);
        assert_abs_diff_eq!(june.observed_ratio, 0.25);
        assert_abs_diff_eq!(june.modeled_precipitation, 0.0);
        assert_abs_diff_eq!(june.modeled_ratio, 0.0);

        let july = &monthly[3];
        assert_abs_diff_eq!(july.modeled_precipitation, 34.0);
        assert_abs_diff_eq!(july.modeled_runoff, 4.0);
        assert_abs_diff_eq!(july.modeled_tss, 0.03 * 11.0231 / 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(july.observed_runoff, 0.0);
    }

    #[test]
    fn combined_scores() {
        let month = |m: u32, observed: f64, modeled: f64| MonthlyComparison {
            month: m,
            observed_precipitation: 50.0,
            modeled_precipitation: 50.0,
            observed_runoff: observed,
            modeled_runoff: modeled,
            observed_ratio: observed / 50.0,
            modeled_ratio: modeled / 50.0,
            observed_tss: observed / 10.0,
            modeled_tss: modeled / 10.0,
        };
        let a = vec![month(4, 2.0, 2.0), month(5, 4.0, 4.0)];
        let b = vec![month(4, 4.0, 2.0), month(5, 8.0, 6.0)];

        let mean = combined(&[a.clone(), b]);
        assert_abs_diff_eq!(mean[0].observed_runoff, 3.0);
        assert_abs_diff_eq!(mean[1].modeled_runoff, 5.0);

        let perfect = scores("GO1", FULL, &a);
        assert_abs_diff_eq!(perfect.nse_runoff, 1.0);
        assert_abs_diff_eq!(perfect.pbias_tss, 0.0);

        let under = scores(COMBINED, FULL, &mean);
        // (3 + 6 - 2 - 5) / 9
        assert_abs_diff_eq!(under.pbias_runoff, 200.0 / 9.0, epsilon = 1e-9);
        assert!(combined(&[]).is_empty());
    }
}
