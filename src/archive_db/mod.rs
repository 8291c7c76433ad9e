// System-of-record access. One repo consolidates the grouped queries the
// historical report variants ran, behind a schema adapter. All date ranges
// are bound parameters.

pub mod cache;
pub mod schema;

use crate::error::StatsError;
use crate::models::{
    DailyStatsRow, MonthlyAggregateRow, MonthlyBytes, ProjectStatsRow, TierTotals,
};
use chrono::NaiveDate;
use schema::SchemaVersion;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::instrument;

pub struct ArchiveDb {
    pool: SqlitePool,
    schema: SchemaVersion,
}

impl ArchiveDb {
    pub async fn connect(
        path: &str,
        max_pool_size: u32,
        schema: SchemaVersion,
    ) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_pool_size)
            .connect_with(opts)
            .await?;
        Ok(Self { pool, schema })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn schema(&self) -> SchemaVersion {
        self.schema
    }

    pub async fn init(&self) -> anyhow::Result<()> {
        cache::init_cache_table(&self.pool).await
    }

    /// Authoritative per-tier byte totals: archived, non-deleted data_files
    /// grouped by the schema's location mapping. Exactly one row per
    /// expected tier; anything else is schema drift and aborts the run.
    #[instrument(skip(self), fields(repo = "archive", operation = "location_summary"))]
    pub async fn location_summary(&self) -> anyhow::Result<TierTotals> {
        tracing::info!("running location summary query, this can take a while");
        let sql = format!(
            "SELECT {} AS location, SUM(size) AS bytes
             FROM data_files
             WHERE deleted_timestamp IS NULL AND remote_archived = 1
             GROUP BY 1",
            self.schema.location_case_sql()
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        let expected = self.schema.expected_tiers();
        if rows.len() != expected.len() {
            return Err(StatsError::LocationRowCount {
                got: rows.len(),
                expected: expected.len(),
            }
            .into());
        }

        let mut totals = TierTotals::new();
        for row in rows {
            let label: Option<String> = row.try_get("location")?;
            let label = label.unwrap_or_default();
            let tier = self
                .schema
                .tier_for_label(&label)
                .ok_or(StatsError::UnknownTierLabel(label))?;
            if totals.contains(tier) {
                return Err(StatsError::DuplicateTierRow(tier).into());
            }
            let bytes: Option<i64> = row.try_get("bytes")?;
            totals.set(tier, bytes.unwrap_or(0).max(0) as u64);
        }
        Ok(totals)
    }

    /// Full per-(day, project, configuration) dump, ordered by day then
    /// project. NULL sums coalesce to 0 and are logged, not fatal.
    #[instrument(skip(self), fields(repo = "archive", operation = "daily_stats"))]
    pub async fn daily_stats(&self) -> anyhow::Result<Vec<DailyStatsRow>> {
        let rows = sqlx::query(
            "SELECT
                strftime('%Y-%m-%d', starttime_utc) AS reporting_date,
                projectid,
                mwa_array_configuration,
                SUM(duration) AS total_time_secs,
                SUM(total_archived_data_bytes) AS total_archived_data_bytes,
                SUM(files_deleted_bytes) AS deleted_bytes
             FROM observation
             GROUP BY 1, 2, 3
             ORDER BY 1, 2",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let date: String = row.try_get("reporting_date")?;
            let project_id: String = row.try_get("projectid")?;
            let array_configuration: Option<String> = row.try_get("mwa_array_configuration")?;
            out.push(DailyStatsRow {
                duration_secs: coalesce_sum(&row, "total_time_secs", &date)?,
                archived_bytes: coalesce_sum(&row, "total_archived_data_bytes", &date)?,
                deleted_bytes: coalesce_sum(&row, "deleted_bytes", &date)?,
                date,
                project_id,
                array_configuration: array_configuration.unwrap_or_default(),
            });
        }
        Ok(out)
    }

    /// Per-month duration and archived-byte sums, ascending (year, month).
    #[instrument(skip(self), fields(repo = "archive", operation = "monthly_aggregates"))]
    pub async fn monthly_aggregates(&self) -> anyhow::Result<Vec<MonthlyAggregateRow>> {
        let rows = sqlx::query(
            "SELECT
                CAST(strftime('%Y', starttime_utc) AS INTEGER) AS reporting_year,
                CAST(strftime('%m', starttime_utc) AS INTEGER) AS reporting_month,
                SUM(duration) AS month_secs,
                SUM(total_archived_data_bytes) AS month_bytes
             FROM observation
             GROUP BY 1, 2
             ORDER BY 1, 2",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let year: i64 = row.try_get("reporting_year")?;
            let month: i64 = row.try_get("reporting_month")?;
            let label = format!("{year}-{month:02}");
            out.push(MonthlyAggregateRow {
                year: year as i32,
                month: month as u32,
                duration_secs: coalesce_sum(&row, "month_secs", &label)?,
                archived_bytes: coalesce_sum(&row, "month_bytes", &label)?,
            });
        }
        Ok(out)
    }

    /// Per-project totals over a date range, descending by archived bytes.
    #[instrument(skip(self), fields(repo = "archive", operation = "project_totals"))]
    pub async fn project_totals(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> anyhow::Result<Vec<ProjectStatsRow>> {
        let rows = sqlx::query(
            "SELECT
                projectid,
                projectshortname,
                COALESCE(SUM(total_archived_data_bytes), 0) AS total_archived_data_bytes,
                COALESCE(SUM(duration), 0) AS total_time_secs
             FROM observation
             WHERE starttime_utc >= $1 AND starttime_utc < $2
             GROUP BY projectid, projectshortname
             ORDER BY 3 DESC",
        )
        .bind(date_bound(from))
        .bind(date_bound_exclusive(to))
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let archived: i64 = row.try_get("total_archived_data_bytes")?;
            let secs: i64 = row.try_get("total_time_secs")?;
            out.push(ProjectStatsRow {
                project_id: row.try_get("projectid")?,
                project_shortname: row
                    .try_get::<Option<String>, _>("projectshortname")?
                    .unwrap_or_default(),
                archived_bytes: archived.max(0) as u64,
                duration_secs: secs.max(0) as u64,
            });
        }
        Ok(out)
    }

    /// Gross ingest volume per month: archived + deleted bytes counted at
    /// observation start time, so later deletions still show as ingest.
    #[instrument(skip(self), fields(repo = "archive", operation = "monthly_gross_volume"))]
    pub async fn monthly_gross_volume(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> anyhow::Result<Vec<MonthlyBytes>> {
        let rows = sqlx::query(
            "SELECT
                CAST(strftime('%Y', starttime_utc) AS INTEGER) AS reporting_year,
                CAST(strftime('%m', starttime_utc) AS INTEGER) AS reporting_month,
                SUM(total_archived_data_bytes + files_deleted_bytes) AS total_data_bytes
             FROM observation
             WHERE starttime_utc >= $1 AND starttime_utc < $2
             GROUP BY 1, 2
             ORDER BY 1, 2",
        )
        .bind(date_bound(from))
        .bind(date_bound_exclusive(to))
        .fetch_all(&self.pool)
        .await?;
        monthly_bytes_rows(rows, "total_data_bytes")
    }

    /// Bytes deleted per month, grouped by the month the deletion happened
    /// in, which is a different time axis than ingest.
    #[instrument(skip(self), fields(repo = "archive", operation = "deleted_by_month"))]
    pub async fn deleted_by_month(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> anyhow::Result<Vec<MonthlyBytes>> {
        tracing::info!("running deleted-data-by-month query, this can take a while");
        let rows = sqlx::query(
            "SELECT
                CAST(strftime('%Y', deleted_timestamp) AS INTEGER) AS reporting_year,
                CAST(strftime('%m', deleted_timestamp) AS INTEGER) AS reporting_month,
                SUM(size) AS deleted_bytes
             FROM data_files
             WHERE deleted_timestamp >= $1 AND deleted_timestamp < $2
             GROUP BY 1, 2
             ORDER BY 1, 2",
        )
        .bind(date_bound(from))
        .bind(date_bound_exclusive(to))
        .fetch_all(&self.pool)
        .await?;
        monthly_bytes_rows(rows, "deleted_bytes")
    }

    pub async fn repopulate_cache(&self) -> anyhow::Result<u64> {
        let rows = self.monthly_aggregates().await?;
        cache::repopulate(&self.pool, &rows).await
    }

    pub async fn refresh_cache_trailing(
        &self,
        months: u32,
        today: NaiveDate,
    ) -> anyhow::Result<u64> {
        let rows = self.monthly_aggregates().await?;
        cache::refresh_trailing(&self.pool, &rows, months, today).await
    }

    pub async fn cached_monthly_aggregates(&self) -> anyhow::Result<Vec<MonthlyAggregateRow>> {
        cache::read_all(&self.pool).await
    }
}

/// NULL sums read as 0 (recoverable data gap, logged); negative values are
/// clamped for the unsigned model types.
fn coalesce_sum(row: &sqlx::sqlite::SqliteRow, column: &str, context: &str) -> anyhow::Result<u64> {
    let value: Option<i64> = row.try_get(column)?;
    match value {
        Some(v) => Ok(v.max(0) as u64),
        None => {
            tracing::warn!(
                operation = "coalesce_sum",
                column,
                context,
                "NULL sum in result row, treating as 0"
            );
            Ok(0)
        }
    }
}

fn monthly_bytes_rows(
    rows: Vec<sqlx::sqlite::SqliteRow>,
    column: &str,
) -> anyhow::Result<Vec<MonthlyBytes>> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let year: i64 = row.try_get("reporting_year")?;
        let month: i64 = row.try_get("reporting_month")?;
        let label = format!("{year}-{month:02}");
        out.push(MonthlyBytes {
            year: year as i32,
            month: month as u32,
            bytes: coalesce_sum(&row, column, &label)?,
        });
    }
    Ok(out)
}

/// Inclusive lower bound: midnight at the start of the day.
fn date_bound(date: NaiveDate) -> String {
    format!("{} 00:00:00", date.format("%Y-%m-%d"))
}

/// Exclusive upper bound: midnight after the day, so timestamps on the end
/// date itself are included.
fn date_bound_exclusive(date: NaiveDate) -> String {
    let next = date.succ_opt().unwrap_or(date);
    format!("{} 00:00:00", next.format("%Y-%m-%d"))
}
