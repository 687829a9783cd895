//! Conversion of downscaled projection extractions (NetCDF) into GDS files.
//!
//! Each method's netCDF directory holds one file per variable, named
//! `<watershed>_<tag>_<variable>.nc`. Every variable spans projections, days
//! and a small latitude/longitude grid; one GDS file is written per
//! projection, grid location and period.

use {
    crate::{
        formats::{
            gds::{self, GdsHeader, GdsRecord},
            round_to,
        },
        layout::Layout,
        parameters::{ClimateVariables, Method, Parameters, Period, Watershed},
    },
    anyhow::{anyhow, bail, Context, Result},
    chrono::{Datelike, Duration, NaiveDate},
    log::{info, warn},
    ndarray::{Array4, ArrayD, Axis, Ix4, IxDyn},
    rayon::prelude::*,
    std::{
        fs::{self, File},
        io::BufWriter,
        path::Path,
    },
};

/// Values at or above this magnitude are fill values
const FILL_THRESHOLD: f64 = 1.0e19;

/// Daily fields of one extraction, indexed (projection, time, latitude, longitude)
#[derive(Debug, Clone, PartialEq)]
pub struct ClimateCube {
    pub dates: Vec<NaiveDate>,
    pub latitudes: Vec<f64>,
    pub longitudes: Vec<f64>,
    /// mm/day
    pub precipitation: Array4<f64>,
    /// °C
    pub tmax: Array4<f64>,
    /// °C
    pub tmin: Array4<f64>,
}

/// One GDS file ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct GdsFile {
    pub stem: String,
    pub header: GdsHeader,
    pub records: Vec<GdsRecord>,
}

/// Dates of a `days since <date>` time axis
pub fn decode_time(units: &str, values: &[f64]) -> Result<Vec<NaiveDate>> {
    let origin = units
        .trim()
        .strip_prefix("days since ")
        .and_then(|rest| rest.split_whitespace().next())
        .ok_or_else(|| anyhow!("Unsupported time units \"{}\"", units))?;
    let origin = NaiveDate::parse_from_str(origin, "%Y-%m-%d")
        .with_context(|| format!("Invalid time origin in \"{}\"", units))?;

    Ok(values
        .iter()
        .map(|v| origin + Duration::days(v.floor() as i64))
        .collect())
}

/// Reorders the axes of a variable to (projection, time, latitude, longitude).
/// Single-projection extractions without a projection dimension gain one.
pub fn canonical(array: ArrayD<f64>, dimensions: &[String], method: &Method) -> Result<Array4<f64>> {
    let position = |name: &str| dimensions.iter().position(|d| d == name);
    let missing = |name: &str| anyhow!("No {} dimension among {:?}", name, dimensions);

    let time = position(&method.time).ok_or_else(|| missing(&method.time))?;
    let lat = position(&method.latitude).ok_or_else(|| missing(&method.latitude))?;
    let lon = position(&method.longitude).ok_or_else(|| missing(&method.longitude))?;

    let (array, order) = match position(&method.projection) {
        Some(projection) => (array, vec![projection, time, lat, lon]),
        None => (array.insert_axis(Axis(0)), vec![0, time + 1, lat + 1, lon + 1]),
    };
    if array.ndim() != order.len() {
        bail!("Unexpected dimensions {:?}", dimensions);
    }

    Ok(array
        .permuted_axes(IxDyn(&order))
        .into_dimensionality::<Ix4>()?)
}

fn number_attribute(var: &netcdf::Variable, name: &str) -> Option<f64> {
    var.attribute_value(name)
        .and_then(|r| r.ok())
        .and_then(|v| match v {
            netcdf::AttributeValue::Double(d) => Some(d),
            netcdf::AttributeValue::Float(f) => Some(f as f64),
            _ => None,
        })
}

fn text_attribute(var: &netcdf::Variable, name: &str) -> Option<String> {
    var.attribute_value(name)
        .and_then(|r| r.ok())
        .and_then(|v| match v {
            netcdf::AttributeValue::Str(s) => Some(s),
            _ => None,
        })
}

fn variable<'f>(file: &'f netcdf::File, path: &Path, name: &str) -> Result<netcdf::Variable<'f>> {
    file.variable(name)
        .ok_or_else(|| anyhow!("{} has no variable \"{}\"", path.display(), name))
}

fn read_field(path: &Path, name: &str, method: &Method) -> Result<Array4<f64>> {
    let file = netcdf::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let var = variable(&file, path, name)?;

    let dimensions: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
    let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
    let fill = number_attribute(&var, "_FillValue").or_else(|| number_attribute(&var, "missing_value"));

    let values: Vec<f64> = var
        .get_values::<f64, _>(..)?
        .into_iter()
        .map(|v| {
            if v.is_nan() || v.abs() >= FILL_THRESHOLD || Some(v) == fill {
                f64::NAN
            } else {
                v
            }
        })
        .collect();

    canonical(ArrayD::from_shape_vec(IxDyn(&shape), values)?, &dimensions, method)
}

fn extraction_path(dir: &Path, watershed: &str, method: &Method, variable: &str) -> std::path::PathBuf {
    dir.join(format!("{}_{}_{}.nc", watershed, method.tag, variable))
}

/// Reads the precipitation and temperature extractions of a watershed.
pub fn read_cube(dir: &Path, watershed: &str, method: &Method, variables: &ClimateVariables) -> Result<ClimateCube> {
    let pr_path = extraction_path(dir, watershed, method, &variables.precipitation);

    let (dates, latitudes, longitudes) = {
        let file = netcdf::open(&pr_path).with_context(|| format!("Failed to open {}", pr_path.display()))?;
        let time = variable(&file, &pr_path, &method.time)?;
        let units = text_attribute(&time, "units")
            .ok_or_else(|| anyhow!("{} has no time units", pr_path.display()))?;
        let dates = decode_time(&units, &time.get_values::<f64, _>(..)?)?;
        let latitudes = variable(&file, &pr_path, &method.latitude)?.get_values::<f64, _>(..)?;
        let longitudes = variable(&file, &pr_path, &method.longitude)?.get_values::<f64, _>(..)?;
        (dates, latitudes, longitudes)
    };

    let precipitation = read_field(&pr_path, &variables.precipitation, method)?;
    let tmax = read_field(
        &extraction_path(dir, watershed, method, &variables.max_temperature),
        &variables.max_temperature,
        method,
    )?;
    let tmin = read_field(
        &extraction_path(dir, watershed, method, &variables.min_temperature),
        &variables.min_temperature,
        method,
    )?;

    let expected = (precipitation.dim().0, dates.len(), latitudes.len(), longitudes.len());
    for (name, field) in [("precipitation", &precipitation), ("tmax", &tmax), ("tmin", &tmin)].iter() {
        if field.dim() != expected {
            bail!("{} has shape {:?}, expected {:?}", name, field.dim(), expected);
        }
    }

    Ok(ClimateCube {
        dates,
        latitudes,
        longitudes,
        precipitation,
        tmax,
        tmin,
    })
}

/// Absolute longitude in the ±180° convention of a 0–360° longitude
pub fn longitude_180(longitude: f64) -> f64 {
    if longitude > 180.0 {
        (longitude - 360.0).abs()
    } else {
        longitude.abs()
    }
}

fn sorted_indices(values: &[f64]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..values.len()).collect();
    indices.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(std::cmp::Ordering::Equal));
    indices
}

/// Builds the GDS files of every projection, location and period. Locations
/// are numbered from 1 in ascending (longitude, latitude) order; a location
/// with any missing value in a projection is skipped for that projection.
pub fn gds_files(
    cube: &ClimateCube,
    watershed: &Watershed,
    models: &[String],
    periods: &[Period],
    low_precipitation: &[f64],
) -> Vec<GdsFile> {
    let projections = cube.precipitation.dim().0;
    if models.len() != projections {
        warn!(
            "{} model labels for {} projections; unlabelled projections are skipped",
            models.len(),
            projections
        );
    }

    let mut locations = vec![];
    for &lon in sorted_indices(&cube.longitudes).iter() {
        for &lat in sorted_indices(&cube.latitudes).iter() {
            locations.push((lat, lon));
        }
    }

    let is_low = |pr: f64| low_precipitation.iter().any(|low| (pr - low).abs() < 1e-9);

    let mut files = vec![];
    for (p, model) in models.iter().enumerate().take(projections) {
        for (number, &(lat, lon)) in locations.iter().enumerate() {
            let location = number + 1;
            let records: Vec<GdsRecord> = cube
                .dates
                .iter()
                .enumerate()
                .map(|(t, &date)| {
                    let pr = round_to(cube.precipitation[[p, t, lat, lon]], 1);
                    GdsRecord {
                        date,
                        tmax: round_to(cube.tmax[[p, t, lat, lon]], 1),
                        tmin: round_to(cube.tmin[[p, t, lat, lon]], 1),
                        precipitation: if is_low(pr) { 0.0 } else { pr },
                    }
                })
                .collect();

            if records
                .iter()
                .any(|r| r.tmax.is_nan() || r.tmin.is_nan() || r.precipitation.is_nan())
            {
                warn!("Skipping {} location {}: missing values", model, location);
                continue;
            }

            for period in periods {
                let in_period: Vec<GdsRecord> = records
                    .iter()
                    .filter(|r| period.contains(r.date.year()))
                    .copied()
                    .collect();
                if in_period.is_empty() {
                    continue;
                }

                let stem = format!("{}_{}_{}_{}", watershed.name, model, location, period.label);
                files.push(GdsFile {
                    header: GdsHeader {
                        key: stem.clone(),
                        latitude: cube.latitudes[lat],
                        longitude: longitude_180(cube.longitudes[lon]),
                        elevation: watershed.elevation,
                    },
                    stem,
                    records: in_period,
                });
            }
        }
    }
    files
}

/// Writes the GDS files of a watershed and method, returning how many were written.
pub fn convert(params: &Parameters, watershed: &str, method: &Method) -> Result<usize> {
    let shed = params
        .watershed(watershed)
        .ok_or_else(|| anyhow!("Unknown watershed \"{}\"", watershed))?;
    let layout = Layout::new(params, watershed);

    let cube = read_cube(&layout.netcdf(method), watershed, method, &params.climate.variables)?;
    info!(
        "Read {} projections of {} days over {}x{} locations",
        cube.precipitation.dim().0,
        cube.dates.len(),
        cube.latitudes.len(),
        cube.longitudes.len()
    );

    let files = gds_files(
        &cube,
        shed,
        &method.models,
        &params.climate.periods,
        &params.climate.low_precipitation,
    );

    let out = layout.gds(method);
    fs::create_dir_all(&out).with_context(|| format!("Failed to create {}", out.display()))?;

    files
        .par_iter()
        .map(|file| {
            let path = out.join(format!("{}.txt", file.stem));
            let w = BufWriter::new(File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?);
            gds::write(w, &file.header, &file.records).with_context(|| format!("Failed to write {}", path.display()))
        })
        .collect::<Result<()>>()?;

    info!("Wrote {} GDS files to {}", files.len(), out.display());
    Ok(files.len())
}
