//! Plot area, axes and legend shared by the SVG graphs.

use std::fmt::Write;

/// Series colours, cycled when there are more series than colours
pub(crate) const PALETTE: [(u8, u8, u8); 10] = [
    (31, 119, 180),
    (255, 127, 14),
    (44, 160, 44),
    (214, 39, 40),
    (148, 103, 189),
    (140, 86, 75),
    (227, 119, 194),
    (127, 127, 127),
    (188, 189, 34),
    (23, 190, 207),
];

const LEFT_MARGIN: f64 = 70.0;
const RIGHT_MARGIN: f64 = 30.0;
const LEGEND_WIDTH: f64 = 160.0;
const TOP_MARGIN: f64 = 40.0;
const BOTTOM_MARGIN: f64 = 60.0;
const TICK_LENGTH: f64 = 6.0;
const TARGET_TICKS: f64 = 6.0;

pub(crate) fn colour(series: usize) -> String {
    let (r, g, b) = PALETTE[series % PALETTE.len()];
    format!("rgb({},{},{})", r, g, b)
}

/// Escapes text placed inside SVG or HTML.
pub(crate) fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Axis range widened to whole multiples of a round tick spacing
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Axis {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Axis {
    /// Fits the finite values; without any the axis spans 0 to 1.
    pub fn fit<I: IntoIterator<Item = f64>>(values: I) -> Self {
        let (mut lo, mut hi) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if !lo.is_finite() {
            lo = 0.0;
            hi = 1.0;
        } else if lo == hi {
            lo -= 1.0;
            hi += 1.0;
        }

        let step = nice_step((hi - lo) / TARGET_TICKS);
        Axis {
            min: (lo / step).floor() * step,
            max: (hi / step).ceil() * step,
            step,
        }
    }

    pub fn ticks(&self) -> Vec<f64> {
        let n = ((self.max - self.min) / self.step).round() as usize;
        (0..=n).map(|i| self.min + i as f64 * self.step).collect()
    }

    /// Position of `v` between 0 and 1
    pub fn fraction(&self, v: f64) -> f64 {
        (v - self.min) / (self.max - self.min)
    }

    pub fn label(&self, v: f64) -> String {
        let decimals = if self.step >= 1.0 {
            0
        } else {
            (-self.step.log10()).ceil() as usize
        };
        // avoid "-0"
        let v = if v.abs() < self.step * 1e-9 { 0.0 } else { v };
        format!("{:.*}", decimals, v)
    }
}

/// 1, 2 or 5 times a power of ten, close to `rough`
fn nice_step(rough: f64) -> f64 {
    let magnitude = 10f64.powf(rough.log10().floor());
    let residual = rough / magnitude;
    let nice = if residual < 1.5 {
        1.0
    } else if residual < 3.0 {
        2.0
    } else if residual < 7.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

/// Drawing area of a graph with its data axes
pub(crate) struct Frame {
    pub width: f64,
    pub height: f64,
    pub x: Axis,
    pub y: Axis,
    legend: bool,
}

impl Frame {
    pub fn new(width: f64, height: f64, x: Axis, y: Axis, legend: bool) -> Self {
        Frame {
            width,
            height,
            x,
            y,
            legend,
        }
    }

    fn plot_width(&self) -> f64 {
        let right = if self.legend {
            RIGHT_MARGIN + LEGEND_WIDTH
        } else {
            RIGHT_MARGIN
        };
        (self.width - LEFT_MARGIN - right).max(1.0)
    }

    fn plot_height(&self) -> f64 {
        (self.height - TOP_MARGIN - BOTTOM_MARGIN).max(1.0)
    }

    pub fn px(&self, x: f64) -> f64 {
        LEFT_MARGIN + self.x.fraction(x) * self.plot_width()
    }

    pub fn py(&self, y: f64) -> f64 {
        TOP_MARGIN + (1.0 - self.y.fraction(y)) * self.plot_height()
    }

    /// Top-left corner of the plot area
    pub fn origin(&self) -> (f64, f64) {
        (LEFT_MARGIN, TOP_MARGIN)
    }

    /// Opening `svg` tag with the stylesheet for `series` data series
    pub fn open(&self, series: usize) -> String {
        let mut s = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">
<style>
text {{ font-family: Sans, Arial; font-size: 12px; }}
.title {{ font-size: 14px; font-weight: bold; }}
.axisLabel {{ font-weight: bold; }}
.gridLine {{ stroke: rgb(120,120,120); stroke-dasharray: 1, 5; stroke-width: 1; }}
.axis, .tick {{ stroke: black; stroke-width: 1; }}
.reference {{ stroke: gold; stroke-width: 2; }}
"#,
            w = self.width,
            h = self.height
        );
        for i in 0..series {
            let _ = writeln!(
                s,
                ".series{i} {{ fill: none; stroke: {c}; stroke-width: 1.5; }}\n.point{i} {{ fill: {c}; stroke: none; opacity: 0.8; }}",
                i = i,
                c = colour(i)
            );
        }
        s.push_str("</style>\n");
        let _ = writeln!(
            s,
            r#"<rect width="{}" height="{}" fill="white"/>"#,
            self.width, self.height
        );
        s
    }

    /// Axes, ticks, optional grid lines, axis labels and title
    pub fn axes(&self, title: &str, x_label: &str, y_label: &str, gridlines: bool) -> String {
        let mut s = String::new();
        let (left, top) = self.origin();
        let right = left + self.plot_width();
        let bottom = top + self.plot_height();

        for x in self.x.ticks() {
            let px = self.px(x);
            if gridlines {
                let _ = writeln!(s, r#"<line class="gridLine" x1="{0:.1}" y1="{1:.1}" x2="{0:.1}" y2="{2:.1}"/>"#, px, top, bottom);
            }
            let _ = writeln!(
                s,
                r#"<line class="tick" x1="{0:.1}" y1="{1:.1}" x2="{0:.1}" y2="{2:.1}"/>
<text x="{0:.1}" y="{3:.1}" text-anchor="middle">{4}</text>"#,
                px,
                bottom,
                bottom + TICK_LENGTH,
                bottom + TICK_LENGTH + 14.0,
                self.x.label(x)
            );
        }
        for y in self.y.ticks() {
            let py = self.py(y);
            if gridlines {
                let _ = writeln!(s, r#"<line class="gridLine" x1="{1:.1}" y1="{0:.1}" x2="{2:.1}" y2="{0:.1}"/>"#, py, left, right);
            }
            let _ = writeln!(
                s,
                r#"<line class="tick" x1="{1:.1}" y1="{0:.1}" x2="{2:.1}" y2="{0:.1}"/>
<text x="{3:.1}" y="{4:.1}" text-anchor="end">{5}</text>"#,
                py,
                left - TICK_LENGTH,
                left,
                left - TICK_LENGTH - 3.0,
                py + 4.0,
                self.y.label(y)
            );
        }

        let _ = writeln!(
            s,
            r#"<polyline class="axis" fill="none" points="{0:.1},{1:.1} {0:.1},{2:.1} {3:.1},{2:.1}"/>"#,
            left, top, bottom, right
        );
        let _ = writeln!(
            s,
            r#"<text class="title" x="{:.1}" y="{:.1}" text-anchor="middle">{}</text>"#,
            (left + right) / 2.0,
            top / 2.0 + 5.0,
            escape(title)
        );
        let _ = writeln!(
            s,
            r#"<text class="axisLabel" x="{:.1}" y="{:.1}" text-anchor="middle">{}</text>"#,
            (left + right) / 2.0,
            self.height - 15.0,
            escape(x_label)
        );
        let _ = writeln!(
            s,
            r#"<text class="axisLabel" transform="translate(18,{:.1}) rotate(-90)" text-anchor="middle">{}</text>"#,
            (top + bottom) / 2.0,
            escape(y_label)
        );
        s
    }

    /// Legend entries to the right of the plot area
    pub fn legend(&self, labels: &[String]) -> String {
        let mut s = String::new();
        let x = self.width - RIGHT_MARGIN - LEGEND_WIDTH + 15.0;
        for (i, label) in labels.iter().enumerate() {
            let y = TOP_MARGIN + 10.0 + i as f64 * 18.0;
            let _ = writeln!(
                s,
                r#"<line class="series{i}" x1="{x:.1}" y1="{y:.1}" x2="{x2:.1}" y2="{y:.1}" stroke-width="3"/>
<text x="{tx:.1}" y="{ty:.1}">{label}</text>"#,
                i = i,
                x = x,
                x2 = x + 20.0,
                y = y,
                tx = x + 26.0,
                ty = y + 4.0,
                label = escape(label)
            );
        }
        s
    }

    /// Horizontal reference line across the plot area
    pub fn reference(&self, y: f64) -> String {
        let (left, _) = self.origin();
        format!(
            "<line class=\"reference\" x1=\"{:.1}\" y1=\"{py:.1}\" x2=\"{:.1}\" y2=\"{py:.1}\"/>\n",
            left,
            left + self.plot_width(),
            py = self.py(y)
        )
    }

    /// Lines of text in the top-left corner of the plot area
    pub fn annotations(&self, lines: &[String]) -> String {
        let (left, top) = self.origin();
        lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                format!(
                    "<text x=\"{:.1}\" y=\"{:.1}\">{}</text>\n",
                    left + 8.0,
                    top + 16.0 + i as f64 * 16.0,
                    escape(line)
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use {super::*, approx::assert_abs_diff_eq};

    #[test]
    fn round_ticks() {
        let axis = Axis::fit(vec![0.3, 17.0]);
        assert_eq!(axis.step, 2.0);
        assert_eq!(axis.min, 0.0);
        assert_eq!(axis.max, 18.0);
        assert_eq!(axis.ticks().len(), 10);
        assert_eq!(axis.label(4.0), "4");
    }

    #[test]
    fn degenerate_ranges() {
        let empty = Axis::fit(vec![f64::NAN]);
        assert_abs_diff_eq!(empty.min, 0.0);
        assert_abs_diff_eq!(empty.max, 1.0, epsilon = 1e-12);
        assert_eq!(empty.label(0.4), "0.4");

        let constant = Axis::fit(vec![5.0, 5.0]);
        assert!(constant.min < 5.0 && constant.max > 5.0);
    }

    #[test]
    fn frame_positions() {
        let frame = Frame::new(500.0, 400.0, Axis::fit(vec![0.0, 10.0]), Axis::fit(vec![0.0, 100.0]), false);
        assert_eq!(frame.px(0.0), 70.0);
        assert_eq!(frame.px(10.0), 470.0);
        assert_eq!(frame.py(0.0), 340.0);
        assert_eq!(frame.py(100.0), 40.0);
    }

    #[test]
    fn escaping() {
        assert_eq!(escape("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
    }
}
