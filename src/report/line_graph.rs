use {
    crate::{
        report::frame::{escape, Axis, Frame},
        stats::{ecdf, EcdfKind},
    },
    std::fmt::Write,
};

/// Multi-series line graph rendered as a standalone SVG document
#[derive(Debug, Clone, PartialEq)]
pub struct LineGraph {
    pub width: f64,
    pub height: f64,
    pub title: String,
    /// Abscissae per series; empty means 1, 2, 3, ... for every series
    pub data_x: Vec<Vec<f64>>,
    pub data_y: Vec<Vec<f64>>,
    pub series_labels: Vec<String>,
    pub x_axis_label: String,
    pub y_axis_label: String,
    pub draw_points: bool,
    pub draw_gridlines: bool,
    pub draw_legend: bool,
    /// Horizontal line, e.g. a TMDL limit
    pub reference: Option<f64>,
    /// Text shown in the top-left corner of the plot
    pub annotations: Vec<String>,
}

impl Default for LineGraph {
    fn default() -> Self {
        LineGraph {
            width: 700.0,
            height: 480.0,
            title: String::new(),
            data_x: vec![],
            data_y: vec![],
            series_labels: vec![],
            x_axis_label: String::new(),
            y_axis_label: String::new(),
            draw_points: false,
            draw_gridlines: true,
            draw_legend: true,
            reference: None,
            annotations: vec![],
        }
    }
}

impl LineGraph {
    /// Cumulative distributions of several series sharing one axis
    pub fn ecdf(series: &[(String, Vec<f64>)], kind: EcdfKind, x_axis_label: &str) -> Self {
        let (data_x, data_y) = series
            .iter()
            .map(|(_, values)| -> (Vec<f64>, Vec<f64>) { ecdf(values, kind).into_iter().unzip() })
            .unzip();

        LineGraph {
            data_x,
            data_y,
            series_labels: series.iter().map(|(label, _)| label.clone()).collect(),
            x_axis_label: x_axis_label.to_string(),
            y_axis_label: match kind {
                EcdfKind::Frequency => "Cumulative frequency (%)".to_string(),
                EcdfKind::TotalSum => "Cumulative share of total (%)".to_string(),
            },
            ..LineGraph::default()
        }
    }

    fn abscissae(&self, series: usize) -> Vec<f64> {
        match self.data_x.get(series) {
            Some(xs) => xs.clone(),
            None => (1..=self.data_y[series].len()).map(|i| i as f64).collect(),
        }
    }

    pub fn get_svg(&self) -> String {
        let xs: Vec<Vec<f64>> = (0..self.data_y.len()).map(|s| self.abscissae(s)).collect();
        let x_axis = Axis::fit(xs.iter().flatten().copied());
        let y_axis = Axis::fit(
            self.data_y
                .iter()
                .flatten()
                .copied()
                .chain(self.reference.into_iter()),
        );
        let frame = Frame::new(self.width, self.height, x_axis, y_axis, self.draw_legend);

        let mut s = frame.open(self.data_y.len());
        s.push_str(&frame.axes(&self.title, &self.x_axis_label, &self.y_axis_label, self.draw_gridlines));
        if let Some(y) = self.reference {
            s.push_str(&frame.reference(y));
        }

        for (series, ys) in self.data_y.iter().enumerate() {
            // missing values break the line
            let mut segment: Vec<String> = vec![];
            let mut segments = vec![];
            for (x, y) in xs[series].iter().zip(ys) {
                if x.is_finite() && y.is_finite() {
                    segment.push(format!("{:.1},{:.1}", frame.px(*x), frame.py(*y)));
                    if self.draw_points {
                        let _ = writeln!(
                            s,
                            r#"<circle class="point{}" cx="{:.1}" cy="{:.1}" r="3"/>"#,
                            series,
                            frame.px(*x),
                            frame.py(*y)
                        );
                    }
                } else if !segment.is_empty() {
                    segments.push(segment.join(" "));
                    segment.clear();
                }
            }
            if !segment.is_empty() {
                segments.push(segment.join(" "));
            }
            for points in segments {
                let _ = writeln!(s, r#"<polyline class="series{}" points="{}"/>"#, series, points);
            }
        }

        if self.draw_legend {
            s.push_str(&frame.legend(&self.series_labels));
        }
        s.push_str(&frame.annotations(&self.annotations));
        let _ = writeln!(s, "<title>{}</title>", escape(&self.title));
        s.push_str("</svg>\n");
        s
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn series_and_gaps() {
        let graph = LineGraph {
            title: "Runoff".to_string(),
            data_x: vec![],
            data_y: vec![vec![1.0, 2.0, f64::NAN, 4.0], vec![3.0, 1.0, 2.0, 0.5]],
            series_labels: vec!["Observed".to_string(), "Modeled".to_string()],
            annotations: vec!["NSE 0.61".to_string()],
            ..LineGraph::default()
        };
        let svg = graph.get_svg();
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>\n"));
        assert_eq!(svg.matches("<polyline class=\"series0\"").count(), 2);
        assert_eq!(svg.matches("<polyline class=\"series1\"").count(), 1);
        assert!(svg.contains(">Modeled</text>"));
        assert!(svg.contains(">NSE 0.61</text>"));
    }

    #[test]
    fn ecdf_series() {
        let graph = LineGraph::ecdf(
            &[("A".to_string(), vec![3.0, 1.0, 2.0]), ("B".to_string(), vec![])],
            EcdfKind::Frequency,
            "Soil loss (t/ha)",
        );
        assert_eq!(graph.data_x[0], vec![1.0, 2.0, 3.0]);
        assert_eq!(graph.data_y[0][2], 100.0);
        assert!(graph.data_y[1].is_empty());
        assert!(graph.get_svg().contains("Cumulative frequency (%)"));
    }

    #[test]
    fn reference_line() {
        let graph = LineGraph {
            data_y: vec![vec![1.0, 2.0]],
            reference: Some(10.7),
            draw_legend: false,
            ..LineGraph::default()
        };
        assert!(graph.get_svg().contains("class=\"reference\""));
    }
}
