// Chart construction: turns aggregated series into the SVG charts the
// quarterly report ships. Titles carry the as-at date; volume chart titles
// carry the cumulative total in PB.

use super::svg::{BarChart, LineChart, PieChart};
use crate::aggregation::Slice;
use crate::metrics::{CategoryBreakdown, bytes_to_petabytes, bytes_to_terabytes};
use crate::models::MonthlyVolume;
use chrono::NaiveDate;

fn as_at(date: NaiveDate) -> String {
    date.format("%d-%b-%Y").to_string()
}

/// Bar chart of the (already strided) monthly volume series, cumulative or
/// per-month. The title total is the final cumulative footprint, which
/// includes months the stride skipped.
pub fn monthly_volume_chart(
    title: &str,
    series: &[MonthlyVolume],
    emitted: &[MonthlyVolume],
    cumulative: bool,
    as_of: NaiveDate,
) -> BarChart {
    let total_pb = bytes_to_petabytes(series.last().map(|v| v.cumulative_bytes));
    let labels = emitted
        .iter()
        .map(|v| format!("{}-{:02}", v.year, v.month))
        .collect();
    let values = emitted
        .iter()
        .map(|v| {
            if cumulative {
                bytes_to_terabytes(Some(v.cumulative_bytes))
            } else {
                bytes_to_terabytes(Some(v.net_bytes))
            }
        })
        .collect();

    BarChart {
        title: format!("{title} = {total_pb:.2} PB (as at {})", as_at(as_of)),
        x_label: "Time".into(),
        y_label: "Terabytes (TB)".into(),
        labels,
        values,
    }
}

/// Pie slice annotation: percent always, absolute value only for slices
/// big enough to carry it (>= 5%).
fn slice_annotation(value: f64, total: f64, unit: &str) -> String {
    if total <= 0.0 {
        return String::new();
    }
    let pct = value / total * 100.0;
    if pct < 5.0 {
        format!("{pct:.1}%")
    } else {
        format!("{pct:.1}% ({value:.0} {unit})")
    }
}

pub fn project_pie(title: &str, slices: &[Slice], unit: &str, as_of: NaiveDate) -> PieChart {
    let total: f64 = slices.iter().map(|s| s.value).sum();
    PieChart {
        title: format!("{title} (as at {})", as_at(as_of)),
        slices: slices
            .iter()
            .map(|s| {
                (
                    s.label.clone(),
                    s.value,
                    slice_annotation(s.value, total, unit),
                )
            })
            .collect(),
    }
}

/// Cumulative fraction of the archive captured by the N largest projects.
pub fn cumulative_fraction_chart(fractions: &[f64]) -> LineChart {
    LineChart {
        title: "Cumulative Fraction of Archive".into(),
        x_label: "Project in order by size".into(),
        y_label: "Cumulative Archive Fraction".into(),
        values: fractions.to_vec(),
    }
}

/// Volume per science theme, as a fraction of the whole archive.
pub fn category_volume_chart(breakdown: &CategoryBreakdown, total_tb: f64) -> BarChart {
    let labels = breakdown
        .totals
        .iter()
        .map(|(cat, _)| cat.label().to_string())
        .collect();
    let values = breakdown
        .totals
        .iter()
        .map(|(_, tb)| if total_tb > 0.0 { tb / total_tb } else { 0.0 })
        .collect();
    BarChart {
        title: "Archive Volume per Science Theme".into(),
        x_label: "Science theme".into(),
        y_label: "Archive Fraction".into(),
        labels,
        values,
    }
}
