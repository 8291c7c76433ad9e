use serde::Serialize;

/// One (day, project, array configuration) group from the observation table.
/// NULL sums arrive as 0; the repo logs them when coalescing.
#[derive(Debug, Clone, Serialize)]
pub struct DailyStatsRow {
    pub date: String,
    pub project_id: String,
    pub array_configuration: String,
    pub duration_secs: u64,
    pub archived_bytes: u64,
    pub deleted_bytes: u64,
}

/// Running totals accumulated while dumping daily stats.
#[derive(Debug, Clone, Copy, Default)]
pub struct DumpTotals {
    pub rows: usize,
    pub total_secs: u64,
    pub total_bytes: u64,
    pub deleted_bytes: u64,
}

/// Month group straight from the observation table (or the local cache).
#[derive(Debug, Clone, Copy)]
pub struct MonthlyAggregateRow {
    pub year: i32,
    pub month: u32,
    pub duration_secs: u64,
    pub archived_bytes: u64,
}

/// One row of stats_by_month.csv, with the derived duty-cycle columns.
#[derive(Debug, Clone, Copy)]
pub struct MonthlyStatsRow {
    pub year: i32,
    pub month: u32,
    pub hours: f64,
    pub terabytes: f64,
    pub available_hours: f64,
    pub duty_cycle: f64,
}

/// Per-project totals over a date range, descending by bytes.
#[derive(Debug, Clone)]
pub struct ProjectStatsRow {
    pub project_id: String,
    pub project_shortname: String,
    pub archived_bytes: u64,
    pub duration_secs: u64,
}

/// (year, month, bytes) group used by both volume queries: gross ingest
/// grouped by observation start month, and deletions grouped by the month
/// the deletion happened in. The two time axes are distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthlyBytes {
    pub year: i32,
    pub month: u32,
    pub bytes: u64,
}

/// One entry of the monthly volume series after deletion correction.
/// net/cumulative are signed: a month where deletions exceed ingest dips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthlyVolume {
    pub year: i32,
    pub month: u32,
    pub gross_bytes: u64,
    pub deleted_bytes: u64,
    pub net_bytes: i64,
    pub cumulative_bytes: i64,
}
