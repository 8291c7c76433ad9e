// Monthly volume series with deletion correction, duty cycle, and the
// top-N-with-Other roll-up. Pure logic; the queries feeding it live in
// archive_db and return rows in ascending (year, month) order, which the
// cumulative step relies on.

use crate::models::{MonthlyBytes, MonthlyVolume};
use chrono::NaiveDate;

/// Months between emitted points. Ranges longer than ~6 months plot every
/// third month to keep the axis readable.
pub fn stride_for_range(from: NaiveDate, to: NaiveDate) -> u32 {
    if (to - from).num_days() > 6 * 31 { 3 } else { 1 }
}

/// Hours in the calendar month (full days only, no time-zone ambiguity).
/// Out-of-range months (possible from a corrupt cache row) report 0.0, which
/// degrades the duty cycle to 0 rather than aborting the run.
pub fn available_hours(year: i32, month: u32) -> f64 {
    let Some(start) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return 0.0;
    };
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let Some(end) = NaiveDate::from_ymd_opt(next_year, next_month, 1) else {
        return 0.0;
    };
    (end - start).num_days() as f64 * 24.0
}

pub fn duty_cycle(hours: f64, available_hours: f64) -> f64 {
    if available_hours > 0.0 {
        hours / available_hours
    } else {
        0.0
    }
}

/// Builds the corrected monthly series from gross-ingest rows and
/// deleted-in-month rows.
///
/// Correction is same-calendar-month only: a deletion is netted against the
/// month it happened in, regardless of when the data was ingested. The
/// cumulative sum runs over corrected values so it tracks the true archive
/// footprint. With `ingest_only` the deletion rows are ignored and the
/// series is pure ingest volume.
pub fn build_monthly_volume_series(
    gross: &[MonthlyBytes],
    deleted: &[MonthlyBytes],
    ingest_only: bool,
) -> Vec<MonthlyVolume> {
    let mut out = Vec::with_capacity(gross.len());
    let mut cumulative: i64 = 0;

    for row in gross {
        let deleted_bytes = if ingest_only {
            0
        } else {
            deleted
                .iter()
                .find(|d| d.year == row.year && d.month == row.month)
                .map(|d| d.bytes)
                .unwrap_or(0)
        };
        let net_bytes = row.bytes as i64 - deleted_bytes as i64;
        cumulative += net_bytes;

        out.push(MonthlyVolume {
            year: row.year,
            month: row.month,
            gross_bytes: row.bytes,
            deleted_bytes,
            net_bytes,
            cumulative_bytes: cumulative,
        });
    }
    out
}

/// Months emitted into the rendered series: month number divisible by the
/// stride (so stride 3 keeps Mar/Jun/Sep/Dec).
pub fn stride_filter(series: &[MonthlyVolume], stride: u32) -> Vec<MonthlyVolume> {
    series
        .iter()
        .filter(|v| v.month % stride == 0)
        .copied()
        .collect()
}

/// One pie slice after the top-N merge.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub label: String,
    pub value: f64,
}

/// Keeps the `cap` largest rows as named slices and merges the rest into a
/// trailing "Other" slice (zero when there is no tail). Sort is stable, so
/// ties keep arrival order.
pub fn top_n_with_other(rows: &[(String, f64)], cap: usize) -> Vec<Slice> {
    let mut sorted: Vec<&(String, f64)> = rows.iter().collect();
    sorted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut slices = Vec::with_capacity(cap.min(sorted.len()) + 1);
    let mut other = 0.0;
    for (i, (label, value)) in sorted.iter().enumerate() {
        if i >= cap {
            other += value;
        } else {
            slices.push(Slice {
                label: label.clone(),
                value: *value,
            });
        }
    }
    slices.push(Slice {
        label: "Other".into(),
        value: other,
    });
    slices
}
