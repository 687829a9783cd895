use {
    crate::{
        report::frame::{escape, Axis, Frame},
        stats,
    },
    std::fmt::Write,
};

/// Multi-series scatter plot rendered as a standalone SVG document
#[derive(Debug, Clone, PartialEq)]
pub struct Scattergram {
    pub width: f64,
    pub height: f64,
    pub title: String,
    pub data_x: Vec<Vec<f64>>,
    pub data_y: Vec<Vec<f64>>,
    pub series_labels: Vec<String>,
    pub x_axis_label: String,
    pub y_axis_label: String,
    /// Least-squares line per series, with r² added to the legend
    pub draw_trendline: bool,
}

impl Default for Scattergram {
    fn default() -> Self {
        Scattergram {
            width: 700.0,
            height: 480.0,
            title: String::new(),
            data_x: vec![],
            data_y: vec![],
            series_labels: vec![],
            x_axis_label: String::new(),
            y_axis_label: String::new(),
            draw_trendline: false,
        }
    }
}

/// Finite pairs of two series
fn finite_pairs(xs: &[f64], ys: &[f64]) -> (Vec<f64>, Vec<f64>) {
    xs.iter()
        .zip(ys)
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(x, y)| (*x, *y))
        .unzip()
}

/// Slope and intercept of the least-squares line, if defined
pub fn trendline(xs: &[f64], ys: &[f64]) -> Option<(f64, f64)> {
    let (xs, ys) = finite_pairs(xs, ys);
    let (mx, my) = (stats::mean(&xs), stats::mean(&ys));
    let sxx: f64 = xs.iter().map(|x| (x - mx).powi(2)).sum();
    let sxy: f64 = xs.iter().zip(&ys).map(|(x, y)| (x - mx) * (y - my)).sum();
    if xs.len() < 2 || sxx == 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    Some((slope, my - slope * mx))
}

impl Scattergram {
    fn labels(&self) -> Vec<String> {
        self.series_labels
            .iter()
            .enumerate()
            .map(|(i, label)| {
                if !self.draw_trendline {
                    return label.clone();
                }
                let (xs, ys) = finite_pairs(&self.data_x[i], &self.data_y[i]);
                let r = stats::pearson(&xs, &ys);
                if r.is_nan() {
                    label.clone()
                } else {
                    format!("{} (r² = {:.2})", label, r * r)
                }
            })
            .collect()
    }

    pub fn get_svg(&self) -> String {
        let x_axis = Axis::fit(self.data_x.iter().flatten().copied());
        let y_axis = Axis::fit(self.data_y.iter().flatten().copied());
        let legend = !self.series_labels.is_empty();
        let frame = Frame::new(self.width, self.height, x_axis, y_axis, legend);

        let mut s = frame.open(self.data_y.len());
        s.push_str(&frame.axes(&self.title, &self.x_axis_label, &self.y_axis_label, true));

        for (series, (xs, ys)) in self.data_x.iter().zip(&self.data_y).enumerate() {
            let (xs, ys) = finite_pairs(xs, ys);
            for (x, y) in xs.iter().zip(&ys) {
                let _ = writeln!(
                    s,
                    r#"<circle class="point{}" cx="{:.1}" cy="{:.1}" r="3"/>"#,
                    series,
                    frame.px(*x),
                    frame.py(*y)
                );
            }

            if self.draw_trendline {
                if let Some((slope, intercept)) = trendline(&xs, &ys) {
                    // clipped to the data's x range
                    let x0 = xs.iter().copied().fold(f64::INFINITY, f64::min);
                    let x1 = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                    let _ = writeln!(
                        s,
                        r#"<line class="series{}" x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}"/>"#,
                        series,
                        frame.px(x0),
                        frame.py(slope * x0 + intercept),
                        frame.px(x1),
                        frame.py(slope * x1 + intercept)
                    );
                }
            }
        }

        if legend {
            s.push_str(&frame.legend(&self.labels()));
        }
        let _ = writeln!(s, "<title>{}</title>", escape(&self.title));
        s.push_str("</svg>\n");
        s
    }
}

#[cfg(test)]
mod test {
    use {super::*, approx::assert_abs_diff_eq};

    #[test]
    fn least_squares() {
        let (slope, intercept) = trendline(&[1.0, 2.0, 3.0, f64::NAN], &[3.0, 5.0, 7.0, 1.0]).unwrap();
        assert_abs_diff_eq!(slope, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(intercept, 1.0, epsilon = 1e-12);
        assert!(trendline(&[2.0, 2.0], &[1.0, 3.0]).is_none());
        assert!(trendline(&[], &[]).is_none());
    }

    #[test]
    fn points_and_legend() {
        let plot = Scattergram {
            data_x: vec![vec![1.0, 2.0, 3.0]],
            data_y: vec![vec![2.0, 4.0, f64::NAN]],
            series_labels: vec!["Spring".to_string()],
            draw_trendline: true,
            ..Scattergram::default()
        };
        let svg = plot.get_svg();
        assert_eq!(svg.matches("<circle class=\"point0\"").count(), 2);
        assert!(svg.contains("Spring (r² = 1.00)"));
    }
}
