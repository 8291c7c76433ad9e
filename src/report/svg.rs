// Minimal SVG rendering for the report charts: bar, pie, and line. No
// chart-library binding; the handful of shapes we need are written out
// directly.

use std::fmt::Write;

pub const WIDTH: u32 = 1850;
pub const HEIGHT: u32 = 1050;
const MARGIN_LEFT: f64 = 90.0;
const MARGIN_RIGHT: f64 = 40.0;
const MARGIN_TOP: f64 = 70.0;
const MARGIN_BOTTOM: f64 = 140.0;
const SERIES_COLOR: &str = "#1f77b4";

pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl BarChart {
    pub fn render(&self) -> String {
        let mut svg = header(&self.title);
        let plot_w = WIDTH as f64 - MARGIN_LEFT - MARGIN_RIGHT;
        let plot_h = HEIGHT as f64 - MARGIN_TOP - MARGIN_BOTTOM;
        // y-range spans min..max so deletion-dominated months draw below
        // the zero baseline instead of collapsing to height 0
        let max = self.values.iter().cloned().fold(0.0_f64, f64::max).max(1e-9);
        let min = self.values.iter().cloned().fold(0.0_f64, f64::min);
        let span = max - min;
        let baseline = MARGIN_TOP + max / span * plot_h;
        let n = self.values.len().max(1) as f64;
        let slot = plot_w / n;
        let bar_w = (slot * 0.8).max(1.0);

        axes(&mut svg, plot_w, plot_h, &self.x_label, &self.y_label, min, max, baseline);

        for (i, (label, value)) in self.labels.iter().zip(&self.values).enumerate() {
            let h = value.abs() / span * plot_h;
            let x = MARGIN_LEFT + i as f64 * slot + (slot - bar_w) / 2.0;
            let y = if *value >= 0.0 { baseline - h } else { baseline };
            let _ = writeln!(
                svg,
                r#"<rect x="{x:.1}" y="{y:.1}" width="{bar_w:.1}" height="{h:.1}" fill="{SERIES_COLOR}"/>"#
            );
            // x tick labels rotated 90 degrees so dense month axes stay legible
            let tx = x + bar_w / 2.0;
            let ty = MARGIN_TOP + plot_h + 8.0;
            let _ = writeln!(
                svg,
                r#"<text x="{tx:.1}" y="{ty:.1}" font-size="12" text-anchor="end" transform="rotate(-90 {tx:.1} {ty:.1})">{}</text>"#,
                escape(label)
            );
        }

        svg.push_str("</svg>\n");
        svg
    }
}

pub struct LineChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub values: Vec<f64>,
}

impl LineChart {
    pub fn render(&self) -> String {
        let mut svg = header(&self.title);
        let plot_w = WIDTH as f64 - MARGIN_LEFT - MARGIN_RIGHT;
        let plot_h = HEIGHT as f64 - MARGIN_TOP - MARGIN_BOTTOM;
        let max = self.values.iter().cloned().fold(0.0_f64, f64::max).max(1e-9);
        let n = self.values.len().max(2) as f64;

        axes(
            &mut svg,
            plot_w,
            plot_h,
            &self.x_label,
            &self.y_label,
            0.0,
            max,
            MARGIN_TOP + plot_h,
        );

        let mut points = String::new();
        for (i, value) in self.values.iter().enumerate() {
            let x = MARGIN_LEFT + i as f64 / (n - 1.0) * plot_w;
            let y = MARGIN_TOP + plot_h - (value / max) * plot_h;
            let _ = write!(points, "{x:.1},{y:.1} ");
        }
        let _ = writeln!(
            svg,
            r#"<polyline points="{}" fill="none" stroke="{SERIES_COLOR}" stroke-width="2"/>"#,
            points.trim_end()
        );

        svg.push_str("</svg>\n");
        svg
    }
}

pub struct PieChart {
    pub title: String,
    /// (label, value, formatted slice annotation)
    pub slices: Vec<(String, f64, String)>,
}

impl PieChart {
    pub fn render(&self) -> String {
        let mut svg = header(&self.title);
        let cx = WIDTH as f64 / 2.0;
        let cy = (HEIGHT as f64 + MARGIN_TOP) / 2.0;
        let r = (HEIGHT as f64 - MARGIN_TOP - 120.0) / 2.0;
        let total: f64 = self.slices.iter().map(|(_, v, _)| v).sum();

        if total <= 0.0 {
            svg.push_str("</svg>\n");
            return svg;
        }

        let palette = [
            "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2",
            "#7f7f7f", "#bcbd22", "#17becf", "#aec7e8", "#ffbb78",
        ];
        let mut angle = 0.0_f64;
        for (i, (label, value, annotation)) in self.slices.iter().enumerate() {
            let sweep = value / total * std::f64::consts::TAU;
            let (x1, y1) = (cx + r * angle.cos(), cy + r * angle.sin());
            let end = angle + sweep;
            let (x2, y2) = (cx + r * end.cos(), cy + r * end.sin());
            let large_arc = if sweep > std::f64::consts::PI { 1 } else { 0 };
            let color = palette[i % palette.len()];
            let _ = writeln!(
                svg,
                r#"<path d="M {cx:.1} {cy:.1} L {x1:.1} {y1:.1} A {r:.1} {r:.1} 0 {large_arc} 1 {x2:.1} {y2:.1} Z" fill="{color}" stroke="white"/>"#
            );

            let mid = angle + sweep / 2.0;
            let (lx, ly) = (cx + r * 1.08 * mid.cos(), cy + r * 1.08 * mid.sin());
            let anchor = if mid.cos() < 0.0 { "end" } else { "start" };
            let _ = writeln!(
                svg,
                r#"<text x="{lx:.1}" y="{ly:.1}" font-size="16" text-anchor="{anchor}">{}</text>"#,
                escape(label)
            );
            if !annotation.is_empty() {
                let (ax, ay) = (cx + r * 0.65 * mid.cos(), cy + r * 0.65 * mid.sin());
                let _ = writeln!(
                    svg,
                    r#"<text x="{ax:.1}" y="{ay:.1}" font-size="14" text-anchor="middle" fill="white">{}</text>"#,
                    escape(annotation)
                );
            }
            angle = end;
        }

        svg.push_str("</svg>\n");
        svg
    }
}

fn header(title: &str) -> String {
    let mut svg = String::with_capacity(16 * 1024);
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}">"#
    );
    let _ = writeln!(
        svg,
        r#"<rect width="{WIDTH}" height="{HEIGHT}" fill="white"/>"#
    );
    let _ = writeln!(
        svg,
        r#"<text x="{:.1}" y="40" font-size="24" text-anchor="middle">{}</text>"#,
        WIDTH as f64 / 2.0,
        escape(title)
    );
    svg
}

#[allow(clippy::too_many_arguments)]
fn axes(
    svg: &mut String,
    plot_w: f64,
    plot_h: f64,
    x_label: &str,
    y_label: &str,
    min: f64,
    max: f64,
    baseline: f64,
) {
    let x0 = MARGIN_LEFT;
    let y0 = MARGIN_TOP + plot_h;
    // x axis sits at the zero baseline, below the top when values dip negative
    let _ = writeln!(
        svg,
        r#"<line x1="{x0:.1}" y1="{baseline:.1}" x2="{:.1}" y2="{baseline:.1}" stroke="black"/>"#,
        x0 + plot_w
    );
    let _ = writeln!(
        svg,
        r#"<line x1="{x0:.1}" y1="{y0:.1}" x2="{x0:.1}" y2="{MARGIN_TOP:.1}" stroke="black"/>"#
    );
    let _ = writeln!(
        svg,
        r#"<text x="{:.1}" y="{:.1}" font-size="16" text-anchor="middle">{}</text>"#,
        x0 + plot_w / 2.0,
        y0 + 120.0,
        escape(x_label)
    );
    let ly = MARGIN_TOP + plot_h / 2.0;
    let _ = writeln!(
        svg,
        r#"<text x="24" y="{ly:.1}" font-size="16" text-anchor="middle" transform="rotate(-90 24 {ly:.1})">{}</text>"#,
        escape(y_label)
    );
    // y ticks at quarters of the range
    for i in 0..=4 {
        let frac = i as f64 / 4.0;
        let y = y0 - frac * plot_h;
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{y:.1}" font-size="12" text-anchor="end">{:.1}</text>"#,
            x0 - 8.0,
            min + frac * (max - min)
        );
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
