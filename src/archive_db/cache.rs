// Local monthly aggregate cache: mirror of the month group-by so repeated
// report runs skip the expensive observation scan. Maintained either by a
// full repopulation or by replacing the trailing N months.

use crate::models::MonthlyAggregateRow;
use chrono::{Datelike, NaiveDate};
use sqlx::Row;
use sqlx::sqlite::SqlitePool;

pub async fn init_cache_table(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS monthly_stats_cache (
            year INTEGER NOT NULL,
            month INTEGER NOT NULL,
            total_secs INTEGER NOT NULL,
            total_bytes INTEGER NOT NULL,
            PRIMARY KEY (year, month)
        )",
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Drops and rewrites the whole cache from freshly aggregated rows.
pub async fn repopulate(pool: &SqlitePool, rows: &[MonthlyAggregateRow]) -> anyhow::Result<u64> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM monthly_stats_cache")
        .execute(&mut *tx)
        .await?;
    for row in rows {
        insert_row(&mut tx, row).await?;
    }
    tx.commit().await?;
    tracing::info!(
        operation = "repopulate",
        months = rows.len(),
        "monthly stats cache repopulated"
    );
    Ok(rows.len() as u64)
}

/// Replaces only the trailing `months` calendar months (counted back from
/// `today`), leaving settled history untouched.
pub async fn refresh_trailing(
    pool: &SqlitePool,
    rows: &[MonthlyAggregateRow],
    months: u32,
    today: NaiveDate,
) -> anyhow::Result<u64> {
    let cutoff = months_back(today, months);
    let recent: Vec<&MonthlyAggregateRow> = rows
        .iter()
        .filter(|r| (r.year, r.month) >= cutoff)
        .collect();

    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM monthly_stats_cache WHERE (year * 100 + month) >= $1")
        .bind(cutoff.0 as i64 * 100 + cutoff.1 as i64)
        .execute(&mut *tx)
        .await?;
    for row in &recent {
        insert_row(&mut tx, row).await?;
    }
    tx.commit().await?;
    tracing::info!(
        operation = "refresh_trailing",
        months,
        replaced = recent.len(),
        "monthly stats cache refreshed"
    );
    Ok(recent.len() as u64)
}

pub async fn read_all(pool: &SqlitePool) -> anyhow::Result<Vec<MonthlyAggregateRow>> {
    let rows = sqlx::query(
        "SELECT year, month, total_secs, total_bytes
         FROM monthly_stats_cache
         ORDER BY year, month",
    )
    .fetch_all(pool)
    .await?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let year: i64 = row.try_get("year")?;
        let month: i64 = row.try_get("month")?;
        let secs: i64 = row.try_get("total_secs")?;
        let bytes: i64 = row.try_get("total_bytes")?;
        out.push(MonthlyAggregateRow {
            year: year as i32,
            month: month as u32,
            duration_secs: secs.max(0) as u64,
            archived_bytes: bytes.max(0) as u64,
        });
    }
    Ok(out)
}

pub async fn count(pool: &SqlitePool) -> anyhow::Result<u64> {
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM monthly_stats_cache")
        .fetch_one(pool)
        .await?;
    Ok(n.max(0) as u64)
}

async fn insert_row(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    row: &MonthlyAggregateRow,
) -> anyhow::Result<()> {
    sqlx::query(
        "INSERT OR REPLACE INTO monthly_stats_cache (year, month, total_secs, total_bytes)
         VALUES ($1, $2, $3, $4)",
    )
    .bind(row.year as i64)
    .bind(row.month as i64)
    .bind(row.duration_secs as i64)
    .bind(row.archived_bytes as i64)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// First (year, month) inside the trailing window, inclusive.
fn months_back(today: NaiveDate, months: u32) -> (i32, u32) {
    let total = today.year() * 12 + today.month0() as i32 - months.saturating_sub(1) as i32;
    (total.div_euclid(12), total.rem_euclid(12) as u32 + 1)
}
