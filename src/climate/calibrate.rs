//! Calibration of GenStPar station parameters.
//!
//! Baseline-period parameters are replaced with statistics of the observed
//! station record. Future-period parameters are shifted from the calibrated
//! baseline by the change the climate model projects between its own baseline
//! and future runs.

use {
    crate::{
        constants::{DAYS_IN_MONTH, MONTHS},
        formats::{
            top::{Monthly, TopFile, TopRow},
            FormatError,
        },
        layout::Layout,
        observed::{self, DailyObservation, MonthlyTable},
        parameters::{DeltaMode, Method, Parameters},
        stats,
        utils::{files_with_extension, file_name, stem},
    },
    anyhow::{anyhow, bail, Context, Result},
    log::{debug, info, warn},
    std::{
        fs,
        io::Write,
        path::{Path, PathBuf},
        process::{Command, Stdio},
    },
};

/// Rows shifted by the model change when calibrating a future period
const FUTURE_ROWS: [TopRow; 7] = [
    TopRow::MeanP,
    TopRow::PWetWet,
    TopRow::SkewP,
    TopRow::TmaxAv,
    TopRow::TminAv,
    TopRow::SdTmax,
    TopRow::SdTmin,
];

pub fn clip_skew(value: f64, cap: f64) -> f64 {
    value.max(0.0).min(cap)
}

fn monthly<F: Fn(usize) -> f64>(f: F) -> Monthly {
    let mut values = [0.0; MONTHS];
    for (m, v) in values.iter_mut().enumerate() {
        *v = f(m);
    }
    values
}

/// Splits a climate stem such as `GO1_B3_1_59` into `GO1_B3_1` and `59`.
pub fn split_period(stem: &str) -> Option<(&str, &str)> {
    let i = stem.rfind('_')?;
    Some((&stem[..i], &stem[i + 1..]))
}

/// `.top` files of `dir` whose period label is `label` (or is not, when `matching` is false)
fn tops_of_period(dir: &Path, label: &str, matching: bool) -> Result<Vec<PathBuf>> {
    Ok(files_with_extension(dir, "top")?
        .into_iter()
        .filter(|path| {
            split_period(&stem(path)).map_or(false, |(_, period)| (period == label) == matching)
        })
        .collect())
}

/// Runs GenStPar on every GDS file of a method and copies the resulting
/// `.top` files into the uncalibrated and calibrated directories.
pub fn run_genstpar(params: &Parameters, watershed: &str, method: &Method) -> Result<usize> {
    let layout = Layout::new(params, watershed);
    let gds = layout.gds(method);
    let program = params.environment.resolve(&params.environment.genstpar);

    for path in files_with_extension(&gds, "txt")? {
        let name = file_name(&path);
        debug!("GenStPar {}", name);

        let mut child = Command::new(&program)
            .current_dir(&gds)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to start {}", program.display()))?;
        child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("GenStPar stdin unavailable"))?
            .write_all(format!("{}\n", name).as_bytes())?;
        let status = child.wait()?;
        if !status.success() {
            bail!("GenStPar failed on {}: {}", name, status);
        }
    }

    let tops = files_with_extension(&gds, "top")?;
    for dir in [layout.uncalibrated(method), layout.calibrated(method)].iter() {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
        for top in &tops {
            fs::copy(top, dir.join(file_name(top)))
                .with_context(|| format!("Failed to copy {}", top.display()))?;
        }
    }

    info!("Generated {} .top files", tops.len());
    Ok(tops.len())
}

/// Monthly statistics of the observed station record
#[derive(Debug, Clone, PartialEq)]
pub struct StationClimate {
    /// Mean monthly precipitation total (in)
    pub precipitation: Monthly,
    /// Mean monthly number of wet days
    pub events: Monthly,
    /// Mean daily maximum temperature (°F)
    pub tmax: Monthly,
    pub tmin: Monthly,
    /// Sample standard deviation of daily maximum temperature (°F)
    pub sd_tmax: Monthly,
    pub sd_tmin: Monthly,
}

fn daily_by_month<F>(daily: &[DailyObservation], f: F) -> Vec<Vec<f64>>
where
    F: Fn(&DailyObservation) -> Option<f64>,
{
    let mut months = vec![vec![]; MONTHS];
    for day in daily {
        if let (Some(value), 1..=12) = (f(day), day.month) {
            months[day.month as usize - 1].push(value);
        }
    }
    months
}

impl StationClimate {
    pub fn new(precipitation: &MonthlyTable, events: &MonthlyTable, daily: &[DailyObservation]) -> Self {
        let tmax = daily_by_month(daily, |d| d.tmax);
        let tmin = daily_by_month(daily, |d| d.tmin);

        StationClimate {
            precipitation: precipitation.mean(),
            events: events.mean(),
            tmax: monthly(|m| stats::mean(&tmax[m])),
            tmin: monthly(|m| stats::mean(&tmin[m])),
            sd_tmax: monthly(|m| stats::stdev(&tmax[m])),
            sd_tmin: monthly(|m| stats::stdev(&tmin[m])),
        }
    }

    pub fn read(layout: &Layout) -> Result<Self> {
        let precipitation = MonthlyTable::read(layout.observed(observed::MONTHLY_PRECIPITATION))?;
        let events = MonthlyTable::read(layout.observed(observed::MONTHLY_EVENTS))?;
        let daily: Vec<DailyObservation> = observed::read_records(layout.observed(observed::DAILY))?;
        Ok(StationClimate::new(&precipitation, &events, &daily))
    }

    /// Mean precipitation per wet day (in)
    pub fn mean_event(&self) -> Monthly {
        monthly(|m| {
            if self.events[m] > 0.0 {
                self.precipitation[m] / self.events[m]
            } else {
                0.0
            }
        })
    }

    /// Daily probability of precipitation
    pub fn wet_probability(&self) -> Monthly {
        monthly(|m| self.events[m] / DAYS_IN_MONTH[m])
    }
}

/// Replaces the baseline rows of a GenStPar `.top` with observed statistics.
/// P(W/W) follows from the generated P(W/D) and the observed P(W).
pub fn calibrate_baseline(top: &mut TopFile, station: &StationClimate, skew_cap: f64) -> Result<(), FormatError> {
    let skew = top.row(TopRow::SkewP)?;
    let pwd = top.row(TopRow::PWetDry)?;
    let pw = station.wet_probability();

    let pww = monthly(|m| {
        if pw[m] > 0.0 {
            1.0 - pwd[m] * (1.0 - pw[m]) / pw[m]
        } else {
            0.0
        }
    });

    top.set_row(TopRow::MeanP, &station.mean_event());
    top.set_row(TopRow::SkewP, &monthly(|m| clip_skew(skew[m], skew_cap)));
    top.set_row(TopRow::PWetWet, &pww);
    top.set_row(TopRow::TmaxAv, &station.tmax);
    top.set_row(TopRow::TminAv, &station.tmin);
    top.set_row(TopRow::SdTmax, &station.sd_tmax);
    top.set_row(TopRow::SdTmin, &station.sd_tmin);
    Ok(())
}

pub fn delta(future: f64, base: f64, mode: DeltaMode) -> f64 {
    match mode {
        DeltaMode::Absolute => (future - base).abs(),
        DeltaMode::Signed => future - base,
    }
}

/// Shifts the calibrated baseline by the model change to give calibrated future
/// parameters, written over a copy of the uncalibrated future file.
pub fn calibrate_future(
    uncalibrated_base: &TopFile,
    uncalibrated_future: &TopFile,
    calibrated_base: &TopFile,
    mode: DeltaMode,
    skew_cap: f64,
) -> Result<TopFile, FormatError> {
    let mut calibrated = uncalibrated_future.clone();

    for &row in FUTURE_ROWS.iter() {
        let u0 = uncalibrated_base.row(row)?;
        let uf = uncalibrated_future.row(row)?;
        let c0 = calibrated_base.row(row)?;

        let values = monthly(|m| {
            let value = delta(uf[m], u0[m], mode) + c0[m];
            if row == TopRow::SkewP {
                clip_skew(value, skew_cap)
            } else {
                value
            }
        });
        calibrated.set_row(row, &values);
    }
    Ok(calibrated)
}

/// Calibrates every baseline-period `.top` of a method against the station record.
pub fn calibrate_baseline_files(params: &Parameters, watershed: &str, method: &Method) -> Result<usize> {
    let layout = Layout::new(params, watershed);
    let station = StationClimate::read(&layout)?;
    debug!("Observed station climate: {:#?}", station);

    let (uncalibrated, calibrated) = (layout.uncalibrated(method), layout.calibrated(method));
    fs::create_dir_all(&calibrated)?;

    let tops = tops_of_period(&uncalibrated, &params.climate.baseline_period, true)?;
    for path in &tops {
        let mut top = TopFile::read(path)?;
        calibrate_baseline(&mut top, &station, params.climate.skew_cap)
            .with_context(|| format!("Failed to calibrate {}", path.display()))?;
        top.write(calibrated.join(file_name(path)))?;
    }

    info!("Calibrated {} baseline .top files", tops.len());
    Ok(tops.len())
}

/// Calibrates every future-period `.top` of a method by delta change.
pub fn calibrate_future_files(params: &Parameters, watershed: &str, method: &Method) -> Result<usize> {
    let layout = Layout::new(params, watershed);
    let (uncalibrated, calibrated) = (layout.uncalibrated(method), layout.calibrated(method));
    let baseline = &params.climate.baseline_period;

    let tops = tops_of_period(&uncalibrated, baseline, false)?;
    for path in &tops {
        let name = stem(path);
        let (prefix, _) = split_period(&name).ok_or_else(|| anyhow!("No period in {}", name))?;
        let base_name = format!("{}_{}.top", prefix, baseline);

        let calibrated_top = calibrate_future(
            &TopFile::read(uncalibrated.join(&base_name))?,
            &TopFile::read(path)?,
            &TopFile::read(calibrated.join(&base_name))?,
            params.climate.delta,
            params.climate.skew_cap,
        )
        .with_context(|| format!("Failed to calibrate {}", path.display()))?;
        calibrated_top.write(calibrated.join(file_name(path)))?;
    }

    info!("Calibrated {} future .top files", tops.len());
    Ok(tops.len())
}

/// Monthly population standard deviation (plus `adjustment`) and capped
/// skewness of observed daily precipitation (in).
pub fn station_precipitation(
    daily: &[DailyObservation],
    adjustment: &Monthly,
    skew_cap: f64,
) -> (Monthly, Monthly) {
    let pr = daily_by_month(daily, |d| d.pr);
    let sd = monthly(|m| stats::pstdev(&pr[m]) + adjustment[m]);
    let skew = monthly(|m| stats::skewness(&pr[m]).min(skew_cap));
    (sd, skew)
}

/// Future precipitation deviation and skew: the model change added to the
/// observed station values. Skews are clipped before and after.
pub fn station_future(
    observed: &TopFile,
    uncalibrated_base: &TopFile,
    uncalibrated_future: &TopFile,
    target: &mut TopFile,
    skew_cap: f64,
) -> Result<(), FormatError> {
    let (obs_sd, u0_sd, uf_sd) = (
        observed.row(TopRow::SdevP)?,
        uncalibrated_base.row(TopRow::SdevP)?,
        uncalibrated_future.row(TopRow::SdevP)?,
    );
    let clipped = |top: &TopFile| -> Result<Monthly, FormatError> {
        let skew = top.row(TopRow::SkewP)?;
        Ok(monthly(|m| clip_skew(skew[m], skew_cap)))
    };
    let (obs_skew, u0_skew, uf_skew) = (
        clipped(observed)?,
        clipped(uncalibrated_base)?,
        clipped(uncalibrated_future)?,
    );

    target.set_row(TopRow::SdevP, &monthly(|m| uf_sd[m] - u0_sd[m] + obs_sd[m]));
    target.set_row(
        TopRow::SkewP,
        &monthly(|m| clip_skew(uf_skew[m] - u0_skew[m] + obs_skew[m], skew_cap)),
    );
    Ok(())
}

/// Calibrated baseline `.top` of the grid location holding the observed station
pub fn station_top(params: &Parameters, watershed: &str) -> Result<PathBuf> {
    let shed = params
        .watershed(watershed)
        .ok_or_else(|| anyhow!("Unknown watershed \"{}\"", watershed))?;
    let method = params
        .method_of_model(&shed.station_model)
        .ok_or_else(|| anyhow!("No method has model \"{}\"", shed.station_model))?;
    let layout = Layout::new(params, watershed);

    Ok(layout.calibrated(method).join(format!(
        "{}.top",
        layout.climate_stem(&shed.station_model, shed.station_location, &params.climate.baseline_period)
    )))
}

/// Writes observed precipitation deviation and skew into the station's `.top`.
pub fn station_stats(params: &Parameters, watershed: &str) -> Result<()> {
    let shed = params
        .watershed(watershed)
        .ok_or_else(|| anyhow!("Unknown watershed \"{}\"", watershed))?;
    let layout = Layout::new(params, watershed);
    let daily: Vec<DailyObservation> = observed::read_records(layout.observed(observed::DAILY))?;

    let (sd, skew) = station_precipitation(&daily, &shed.stdev_adjustment, params.climate.skew_cap);
    debug!("Station S DEV P {:?}, SKEW P {:?}", sd, skew);
    if skew.iter().any(|s| s.is_nan()) {
        warn!("Too few observations for a monthly skew in {}", watershed);
    }

    let path = station_top(params, watershed)?;
    let mut top = TopFile::read(&path)?;
    top.set_row(TopRow::SdevP, &sd);
    top.set_row(TopRow::SkewP, &skew);
    top.write(&path)?;

    info!("Wrote station precipitation statistics to {}", path.display());
    Ok(())
}

/// Applies the station's precipitation deviation and skew to every calibrated
/// future `.top` of every method.
pub fn station_stats_future(params: &Parameters, watershed: &str) -> Result<usize> {
    let layout = Layout::new(params, watershed);
    let observed = TopFile::read(station_top(params, watershed)?)?;
    let baseline = &params.climate.baseline_period;

    let mut count = 0;
    for method in &params.climate.methods {
        let (uncalibrated, calibrated) = (layout.uncalibrated(method), layout.calibrated(method));
        if !uncalibrated.is_dir() {
            debug!("No uncalibrated files for {}", method.name);
            continue;
        }

        for path in tops_of_period(&uncalibrated, baseline, false)? {
            let name = stem(&path);
            let (prefix, _) = split_period(&name).ok_or_else(|| anyhow!("No period in {}", name))?;
            let target_path = calibrated.join(file_name(&path));

            let mut target = TopFile::read(&target_path)?;
            station_future(
                &observed,
                &TopFile::read(uncalibrated.join(format!("{}_{}.top", prefix, baseline)))?,
                &TopFile::read(&path)?,
                &mut target,
                params.climate.skew_cap,
            )
            .with_context(|| format!("Failed to calibrate {}", target_path.display()))?;
            target.write(&target_path)?;
            count += 1;
        }
    }

    info!("Updated precipitation statistics of {} future .top files", count);
    Ok(count)
}

#[cfg(test)]
mod test {
    use {super::*, approx::assert_abs_diff_eq};

    const TOP: &str = include_str!("../testdata/GO1_B3_1_19.top");

    fn station() -> StationClimate {
        let mut events = [10.0; 12];
        events[1] = 0.0;
        StationClimate {
            precipitation: [2.0; 12],
            events,
            tmax: [50.0; 12],
            tmin: [30.0; 12],
            sd_tmax: [8.0; 12],
            sd_tmin: [7.5; 12],
        }
    }

    #[test]
    fn baseline() {
        let mut top = TopFile::parse(TOP).unwrap();
        calibrate_baseline(&mut top, &station(), 2.5).unwrap();

        let mean = top.row(TopRow::MeanP).unwrap();
        assert_abs_diff_eq!(mean[0], 0.2);
        assert_abs_diff_eq!(mean[1], 0.0);

        // P(W) = 10 / 31, P(W/D) = 0.15
        let pww = top.row(TopRow::PWetWet).unwrap();
        assert_abs_diff_eq!(pww[0], 0.685, epsilon = 0.0051);
        assert_abs_diff_eq!(pww[1], 0.0);

        let skew = top.row(TopRow::SkewP).unwrap();
        assert_abs_diff_eq!(skew[0], 2.25);
        assert_abs_diff_eq!(skew[7], 2.5);

        assert_eq!(top.row(TopRow::TmaxAv).unwrap(), [50.0; 12]);
        assert_eq!(top.row(TopRow::SdTmin).unwrap(), [7.5; 12]);
        // untouched rows
        assert_eq!(
            top.row(TopRow::SdevP).unwrap(),
            TopFile::parse(TOP).unwrap().row(TopRow::SdevP).unwrap()
        );
        assert_eq!(top.lines()[1], " LATT=  44.53 LONG= -92.66 YEARS= 55. TYPE= 3");
    }

    #[test]
    fn station_climate_from_records() {
        let table = |v: f64| MonthlyTable {
            rows: vec![(2000, [v; 12]), (2001, [v + 2.0; 12])],
        };
        let day = |month, tmax| DailyObservation {
            year: 2000,
            month,
            day: 1,
            pr: None,
            tmax: Some(tmax),
            tmin: None,
        };
        let daily = vec![day(1, 10.0), day(1, 20.0), day(1, 30.0), day(2, 5.0)];

        let station = StationClimate::new(&table(2.0), &table(4.0), &daily);
        assert_abs_diff_eq!(station.precipitation[0], 3.0);
        assert_abs_diff_eq!(station.events[0], 5.0);
        assert_abs_diff_eq!(station.mean_event()[0], 0.6);
        assert_abs_diff_eq!(station.tmax[0], 20.0);
        assert_abs_diff_eq!(station.sd_tmax[0], 10.0);
        assert!(station.sd_tmax[1].is_nan());
        assert!(station.tmin[0].is_nan());
    }

    #[test]
    fn future_delta() {
        let u0 = TopFile::parse(TOP).unwrap();
        let mut uf = u0.clone();
        let mut c0 = u0.clone();

        let mut mean = u0.row(TopRow::MeanP).unwrap();
        mean[0] = 0.10;
        uf.set_row(TopRow::MeanP, &mean);
        mean[0] = 0.30;
        c0.set_row(TopRow::MeanP, &mean);

        let mut skew = u0.row(TopRow::SkewP).unwrap();
        skew[0] = 4.0;
        uf.set_row(TopRow::SkewP, &skew);

        let absolute = calibrate_future(&u0, &uf, &c0, DeltaMode::Absolute, 4.3).unwrap();
        assert_abs_diff_eq!(absolute.row(TopRow::MeanP).unwrap()[0], 0.32, epsilon = 1e-9);
        // 2.25 + |4.0 - 2.25| capped
        assert_abs_diff_eq!(absolute.row(TopRow::SkewP).unwrap()[0], 4.0, epsilon = 1e-9);

        let signed = calibrate_future(&u0, &uf, &c0, DeltaMode::Signed, 4.3).unwrap();
        assert_abs_diff_eq!(signed.row(TopRow::MeanP).unwrap()[0], 0.28, epsilon = 1e-9);

        // unchanged model gives the calibrated baseline
        assert_abs_diff_eq!(
            signed.row(TopRow::TmaxAv).unwrap()[6],
            c0.row(TopRow::TmaxAv).unwrap()[6]
        );
        // rows outside the delta set keep the future values
        assert_eq!(signed.row(TopRow::PWetDry).unwrap(), uf.row(TopRow::PWetDry).unwrap());
    }

    #[test]
    fn precipitation_deviation_and_skew() {
        let daily: Vec<DailyObservation> = [0.0, 0.0, 0.0, 1.0]
            .iter()
            .map(|&pr| DailyObservation {
                year: 2000,
                month: 6,
                day: 1,
                pr: Some(pr),
                tmax: None,
                tmin: None,
            })
            .collect();
        let mut adjustment = [0.0; 12];
        adjustment[5] = 0.1;

        let (sd, skew) = station_precipitation(&daily, &adjustment, 1.5);
        // pstdev of [0, 0, 0, 1] = sqrt(3) / 4
        assert_abs_diff_eq!(sd[5], 3f64.sqrt() / 4.0 + 0.1, epsilon = 1e-12);
        // G1 = 2, capped
        assert_abs_diff_eq!(skew[5], 1.5);
        assert!(sd[0].is_nan());
    }

    #[test]
    fn future_station_statistics() {
        let observed = TopFile::parse(TOP).unwrap();
        let u0 = observed.clone();
        let mut uf = observed.clone();
        let mut sd = u0.row(TopRow::SdevP).unwrap();
        sd[3] += 0.1;
        uf.set_row(TopRow::SdevP, &sd);
        let mut skew = u0.row(TopRow::SkewP).unwrap();
        skew[3] = 9.0;
        uf.set_row(TopRow::SkewP, &skew);

        let mut target = uf.clone();
        station_future(&observed, &u0, &uf, &mut target, 4.3).unwrap();

        assert_abs_diff_eq!(target.row(TopRow::SdevP).unwrap()[3], 0.38, epsilon = 1e-9);
        assert_abs_diff_eq!(target.row(TopRow::SkewP).unwrap()[3], 4.3);
        assert_abs_diff_eq!(target.row(TopRow::SkewP).unwrap()[0], 2.25);
    }

    #[test]
    fn periods() {
        assert_eq!(split_period("GO1_B3_1_59"), Some(("GO1_B3_1", "59")));
        assert_eq!(split_period("GO1"), None);
    }
}
