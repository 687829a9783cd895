//! Watershed soil loss and runoff as management practices are adopted on a
//! growing share of the hillslopes.

use {
    crate::{
        analysis::hillslope::{read_outputs, watershed_summary, WatershedSummary},
        layout::{run_directory, Layout},
        parameters::{AdoptionGroup, Parameters},
        report::{
            html::{write_page, Section},
            tables::write_csv,
            LineGraph,
        },
    },
    anyhow::{Context, Result},
    log::{info, warn},
    serde::Serialize,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdoptionPoint {
    #[serde(rename = "Group")]
    pub group: String,
    #[serde(rename = "Climate")]
    pub climate: String,
    #[serde(rename = "Scenario")]
    pub scenario: String,
    #[serde(rename = "Adoption (%)")]
    pub adoption: f64,
    #[serde(rename = "Soil loss (t/ha/yr)")]
    pub soil_loss: f64,
    #[serde(rename = "Unsustainable hillslopes (%)")]
    pub unsustainable: f64,
    #[serde(rename = "Runoff (mm/yr)")]
    pub runoff: f64,
}

/// Growing-season summary of one scenario run under one climate
pub fn run_summary(params: &Parameters, watershed: &str, scenario: &str, climate: &str) -> Result<WatershedSummary> {
    let layout = Layout::new(params, watershed);
    let run = run_directory(scenario, climate);
    let years = params
        .years_of_climate(climate)
        .with_context(|| format!("No period for {}", climate))? as f64;
    let season = &params.analysis.growing_season;

    let hillslopes: Vec<_> = read_outputs(&layout.output(&run))?
        .iter()
        .map(|o| o.summary(season, years, None))
        .collect();
    Ok(watershed_summary(
        &run.to_string_lossy(),
        &hillslopes,
        params.analysis.sustainable_soil_loss,
        None,
    ))
}

/// Points of one adoption group; runs without output are left as gaps.
pub fn curve(params: &Parameters, watershed: &str, group: &AdoptionGroup) -> Vec<AdoptionPoint> {
    let mut points = vec![];
    for climate in &params.analysis.climates {
        for (scenario, adoption) in group.scenarios.iter().zip(&group.adoption) {
            let (soil_loss, unsustainable, runoff) = match run_summary(params, watershed, scenario, climate) {
                Ok(s) => (s.soil_loss, s.unsustainable, s.runoff),
                Err(e) => {
                    warn!("{} {} {}: {:#}", watershed, scenario, climate, e);
                    (f64::NAN, f64::NAN, f64::NAN)
                }
            };
            points.push(AdoptionPoint {
                group: group.name.clone(),
                climate: climate.clone(),
                scenario: scenario.clone(),
                adoption: *adoption,
                soil_loss,
                unsustainable,
                runoff,
            });
        }
    }
    points
}

fn of_climate<'a>(points: &'a [AdoptionPoint], climate: &'a str) -> impl Iterator<Item = &'a AdoptionPoint> + 'a {
    points.iter().filter(move |p| p.climate == climate)
}

/// One line per climate of `value` against adoption
pub fn graph(
    title: &str,
    points: &[AdoptionPoint],
    climates: &[String],
    y_axis_label: &str,
    value: fn(&AdoptionPoint) -> f64,
) -> LineGraph {
    LineGraph {
        title: title.to_string(),
        data_x: climates
            .iter()
            .map(|c| of_climate(points, c).map(|p| p.adoption).collect())
            .collect(),
        data_y: climates.iter().map(|c| of_climate(points, c).map(value).collect()).collect(),
        series_labels: climates.to_vec(),
        x_axis_label: "Adoption across watershed (%)".to_string(),
        y_axis_label: y_axis_label.to_string(),
        draw_points: true,
        ..LineGraph::default()
    }
}

fn file_label(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Writes every adoption group of a watershed as tables and graphs.
pub fn adoption(params: &Parameters, watershed: &str) -> Result<usize> {
    let shed = params
        .watershed(watershed)
        .with_context(|| format!("Unknown watershed {}", watershed))?;
    if shed.adoption.is_empty() {
        warn!("No adoption groups configured for {}", watershed);
    }
    let dir = Layout::new(params, watershed).analysis().join("Adoption");
    let climates = &params.analysis.climates;

    let mut sections = vec![];
    for group in &shed.adoption {
        let points = curve(params, watershed, group);
        write_csv(dir.join(format!("{}_{}.csv", watershed, file_label(&group.name))), &points)?;

        let metrics: [(&str, fn(&AdoptionPoint) -> f64); 3] = [
            ("Soil loss (t/ha/yr)", |p| p.soil_loss),
            ("Unsustainable hillslopes (%)", |p| p.unsustainable),
            ("Runoff (mm/yr)", |p| p.runoff),
        ];
        for (label, value) in &metrics {
            let title = format!("{}: {}", group.name, label);
            sections.push(Section::new(title.clone(), graph(&title, &points, climates, label, *value).get_svg()));
        }
        info!("{}: {} adoption points for {}", watershed, points.len(), group.name);
    }

    write_page(dir.join(format!("{}_adoption.html", watershed)), &format!("{} adoption", watershed), &sections)?;
    Ok(shed.adoption.len())
}

#[cfg(test)]
mod test {
    use {super::*, approx::assert_abs_diff_eq, std::fs, tempdir::TempDir};

    fn point(climate: &str, adoption: f64, soil_loss: f64) -> AdoptionPoint {
        AdoptionPoint {
            group: "Cover Cropping".to_string(),
            climate: climate.to_string(),
            scenario: String::new(),
            adoption,
            soil_loss,
            unsustainable: 0.0,
            runoff: 0.0,
        }
    }

    #[test]
    fn series_per_climate() {
        let points = [
            point("B3_59", 1.0, 5.0),
            point("B3_99", 1.0, 6.0),
            point("B3_59", 10.0, 4.0),
            point("B3_99", 10.0, 5.5),
        ];
        let climates = ["B3_59".to_string(), "B3_99".to_string()];
        let graph = graph("Soil loss", &points, &climates, "Soil loss (t/ha/yr)", |p| p.soil_loss);
        assert_eq!(graph.data_x[0], vec![1.0, 10.0]);
        assert_eq!(graph.data_y[1], vec![6.0, 5.5]);
        assert_eq!(graph.series_labels, climates.to_vec());
    }

    #[test]
    fn labels() {
        assert_eq!(file_label("Perennial Integration"), "Perennial_Integration");
    }

    #[test]
    fn curve_with_gaps() {
        let dir = TempDir::new("adoption").unwrap();
        let mut params = Parameters::default();
        params.environment.project_directory = dir.path().to_path_buf();
        params.analysis.climates = vec!["B3_59".to_string()];

        let output = Layout::new(&params, "GO1").output(run_directory("CC_10", "B3_59"));
        fs::create_dir_all(&output).unwrap();
        fs::write(output.join("H1.ebe.dat"), include_str!("../testdata/H1.ebe.dat")).unwrap();
        fs::write(output.join("H1.loss.dat"), include_str!("../testdata/H1.loss.dat")).unwrap();

        let group = AdoptionGroup {
            name: "Cover Cropping".to_string(),
            scenarios: vec!["Per_0".to_string(), "CC_10".to_string()],
            adoption: vec![1.0, 10.0],
        };
        let points = curve(&params, "GO1", &group);
        assert_eq!(points.len(), 2);
        assert!(points[0].soil_loss.is_nan());
        assert_abs_diff_eq!(points[1].runoff, 36.2 / 40.0, epsilon = 1e-9);
        assert_abs_diff_eq!(points[1].soil_loss, 175.3 * 20.0 * 0.001_102_31 / 0.5 / 40.0, epsilon = 1e-9);

        assert_eq!(adoption(&params, "GO1").unwrap(), 4);
        assert!(Layout::new(&params, "GO1")
            .analysis()
            .join("Adoption/GO1_Cover_Cropping.csv")
            .exists());
    }
}
