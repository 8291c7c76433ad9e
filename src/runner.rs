// Batch driver: one report run end to end. Collect live usage from the
// enabled backends, reconcile against the database of record, dump the CSV
// reports, render the chart set.

use crate::aggregation::{
    available_hours, build_monthly_volume_series, duty_cycle, stride_filter, stride_for_range,
    top_n_with_other,
};
use crate::archive_db::{ArchiveDb, cache, schema::SchemaVersion};
use crate::config::{AppConfig, DumpWindowConfig};
use crate::inventory::InventoryRepo;
use crate::metrics::{bytes_to_terabytes, categorize_projects, cumulative_fraction};
use crate::models::{
    MonthlyAggregateRow, MonthlyStatsRow, MonthlyVolume, Tier, TierTotals, classify_bucket,
};
use crate::reconcile::{Reconciliation, log_quota_line};
use crate::report::{self, ReportWriter, charts};
use chrono::{Local, Months, NaiveDate};

/// Number of individually named slices on the volume / telescope-time pies.
const MAX_VOLUME_SLICES: usize = 11;
const MAX_TIME_SLICES: usize = 8;

#[derive(Debug, Clone, Default)]
pub struct RunFlags {
    pub repopulate_cache: bool,
    pub refresh_months: Option<u32>,
    /// Skip live collection and reconciliation; CSVs and charts only.
    pub reports_only: bool,
}

pub async fn run(config: &AppConfig, flags: &RunFlags) -> anyhow::Result<()> {
    let schema = SchemaVersion::parse(&config.database.schema)?;
    let db = ArchiveDb::connect(&config.database.path, config.database.max_pool_size, schema)
        .await?;
    db.init().await?;

    let today = Local::now().date_naive();
    let start = NaiveDate::parse_from_str(&config.report.archive_start_date, "%Y-%m-%d")?;
    let recent_from = today
        .checked_sub_months(Months::new(config.report.recent_months))
        .unwrap_or(start);

    if flags.repopulate_cache {
        let n = db.repopulate_cache().await?;
        tracing::info!(months = n, "cache repopulated from observation table");
    } else if let Some(months) = flags.refresh_months {
        let n = db.refresh_cache_trailing(months, today).await?;
        tracing::info!(months = n, "trailing cache months refreshed");
    }

    if !flags.reports_only {
        let live = collect_live_usage(config).await?;
        let db_totals = db.location_summary().await?;
        let reconciliation = Reconciliation::new(live.clone(), db_totals);
        reconciliation.log_summary();

        log_quota_line("acacia", live.bytes(Tier::Acacia), config.acacia.quota_bytes);
        log_quota_line(
            "acacia_mwa",
            live.bytes(Tier::AcaciaMwa),
            config.acacia_mwa.quota_bytes,
        );
        log_quota_line(
            "banksia",
            live.bytes(Tier::Dmf) + live.bytes(Tier::Banksia),
            config.banksia.quota_bytes,
        );
        log_quota_line(
            "total",
            live.total(),
            config.acacia.quota_bytes + config.acacia_mwa.quota_bytes + config.banksia.quota_bytes,
        );
    } else {
        tracing::info!("reports-only run, skipping live collection and reconciliation");
    }

    let writer = ReportWriter::new(&config.report.output_dir)?;

    let daily = db.daily_stats().await?;
    writer.write_daily_stats("stats.csv", &daily)?;

    let monthly = monthly_aggregates_preferring_cache(&db).await?;
    let monthly_rows: Vec<MonthlyStatsRow> = monthly.iter().map(monthly_stats_row).collect();
    writer.write_monthly_stats("stats_by_month.csv", &monthly_rows)?;

    let projects = db.project_totals(start, today).await?;
    writer.write_project_stats("stats_by_project.csv", &projects)?;

    // All-time charts are cumulative; the trailing window shows per-month
    // growth instead.
    render_window_charts(&db, config, &writer, start, today, today, "all_time", true).await?;
    render_window_charts(
        &db,
        config,
        &writer,
        recent_from,
        today,
        today,
        &format!("last_{}_months", config.report.recent_months),
        false,
    )
    .await?;

    render_science_theme_reports(&writer)?;

    Ok(())
}

/// Live per-tier totals across the enabled backends. Disabled backends
/// contribute 0 and are logged, matching the operator expectation that a
/// skipped backend shows an obvious zero rather than vanishing.
pub async fn collect_live_usage(config: &AppConfig) -> anyhow::Result<TierTotals> {
    let inventory = InventoryRepo::new(&config.inventory);
    let mut live = TierTotals::new();

    // The two acacia backends map onto their tiers directly; every bucket in
    // a catalog belongs to that backend's tier, no classification.
    for (name, backend, tier) in [
        ("acacia", &config.acacia, Tier::Acacia),
        ("acacia_mwa", &config.acacia_mwa, Tier::AcaciaMwa),
    ] {
        if backend.enabled {
            tracing::info!(backend = name, "getting stats");
            let buckets = read_bucket_catalog(&backend.bucket_catalog)?;
            for usage in inventory.collect(backend, &buckets).await? {
                live.add(tier, usage.bytes);
            }
        } else {
            tracing::info!(backend = name, "skipping stats (disabled in config)");
            live.set(tier, 0);
        }
    }

    if config.banksia.enabled {
        tracing::info!("getting stats from banksia");
        let buckets = read_bucket_catalog(&config.banksia.bucket_catalog)?;
        let classified = classify_buckets(&buckets);
        for usage in inventory.collect(&config.banksia, &classified).await? {
            // classify_buckets only kept names with a tier
            if let Some(tier) = classify_bucket(&usage.bucket) {
                live.add(tier, usage.bytes);
            }
        }
    } else {
        tracing::info!("skipping stats from banksia (disabled in config)");
        live.set(Tier::Dmf, 0);
        live.set(Tier::Banksia, 0);
    }

    Ok(live)
}

/// Keeps only classifiable bucket names; unclassified ones are logged and
/// excluded from every total.
fn classify_buckets(buckets: &[String]) -> Vec<String> {
    let mut kept = Vec::with_capacity(buckets.len());
    for bucket in buckets {
        match classify_bucket(bucket) {
            Some(tier) => {
                tracing::debug!(bucket = %bucket, tier = %tier, "bucket classified");
                kept.push(bucket.clone());
            }
            None => tracing::info!(bucket = %bucket, "skipping unclassified bucket"),
        }
    }
    kept
}

fn read_bucket_catalog(path: &str) -> anyhow::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect())
}

/// The monthly CSV reads from the local cache when it has been populated,
/// falling back to the live group-by otherwise.
async fn monthly_aggregates_preferring_cache(
    db: &ArchiveDb,
) -> anyhow::Result<Vec<MonthlyAggregateRow>> {
    if cache::count(db.pool()).await? > 0 {
        tracing::info!("monthly stats served from local cache");
        db.cached_monthly_aggregates().await
    } else {
        db.monthly_aggregates().await
    }
}

fn monthly_stats_row(row: &MonthlyAggregateRow) -> MonthlyStatsRow {
    let hours = row.duration_secs as f64 / 3600.0;
    let avail = available_hours(row.year, row.month);
    MonthlyStatsRow {
        year: row.year,
        month: row.month,
        hours,
        terabytes: bytes_to_terabytes(Some(row.archived_bytes as i64)),
        available_hours: avail,
        duty_cycle: duty_cycle(hours, avail),
    }
}

#[allow(clippy::too_many_arguments)]
async fn render_window_charts(
    db: &ArchiveDb,
    config: &AppConfig,
    writer: &ReportWriter,
    from: NaiveDate,
    to: NaiveDate,
    as_of: NaiveDate,
    suffix: &str,
    cumulative: bool,
) -> anyhow::Result<()> {
    let gross = db.monthly_gross_volume(from, to).await?;
    let deleted = db.deleted_by_month(from, to).await?;
    let stride = stride_for_range(from, to);

    let net_series = build_monthly_volume_series(&gross, &deleted, false);
    if (to - from).num_days() > 6 * 31 {
        if let Some(window) = &config.report.dump_window {
            log_dump_window(&net_series, window);
        }
    }
    let emitted = stride_filter(&net_series, stride);
    writer.write_svg(
        &format!("archive_volume_{suffix}.svg"),
        &charts::monthly_volume_chart("Archive Volume", &net_series, &emitted, cumulative, as_of)
            .render(),
    )?;

    let ingest_series = build_monthly_volume_series(&gross, &deleted, true);
    let emitted = stride_filter(&ingest_series, stride);
    writer.write_svg(
        &format!("archive_ingest_{suffix}.svg"),
        &charts::monthly_volume_chart("Archive Ingest", &ingest_series, &emitted, cumulative, as_of)
            .render(),
    )?;

    let projects = db.project_totals(from, to).await?;
    let volume_rows: Vec<(String, f64)> = projects
        .iter()
        .map(|p| {
            (
                format!("{}-{}", p.project_id, p.project_shortname),
                bytes_to_terabytes(Some(p.archived_bytes as i64)),
            )
        })
        .collect();
    let slices = top_n_with_other(&volume_rows, MAX_VOLUME_SLICES);
    writer.write_svg(
        &format!("archive_volume_by_project_{suffix}.svg"),
        &charts::project_pie("Archive Volume by Project", &slices, "TB", as_of).render(),
    )?;

    let time_rows: Vec<(String, f64)> = projects
        .iter()
        .map(|p| {
            (
                format!("{}-{}", p.project_id, p.project_shortname),
                p.duration_secs as f64 / 3600.0,
            )
        })
        .collect();
    let slices = top_n_with_other(&time_rows, MAX_TIME_SLICES);
    writer.write_svg(
        &format!("telescope_time_{suffix}.svg"),
        &charts::project_pie("Telescope Time by Project", &slices, "hrs", as_of).render(),
    )?;

    Ok(())
}

/// Per-month correction detail for the quarterly report, logged only for
/// months inside the configured window.
fn log_dump_window(series: &[MonthlyVolume], window: &DumpWindowConfig) {
    for v in series {
        let in_window = v.year >= window.year_from
            && v.year <= window.year_to
            && v.month >= window.month_from
            && v.month <= window.month_to;
        if !in_window {
            continue;
        }
        tracing::info!(
            year = v.year,
            month = v.month,
            net_tb = bytes_to_terabytes(Some(v.net_bytes)),
            ingested_tb = bytes_to_terabytes(Some(v.gross_bytes as i64)),
            deleted_tb = bytes_to_terabytes(Some(v.deleted_bytes as i64)),
            cumulative_tb = bytes_to_terabytes(Some(v.cumulative_bytes)),
            "quarterly dump"
        );
    }
}

/// Science-theme roll-up over the freshly written stats_by_project.csv:
/// cumulative fraction line, theme volume bars, and a logged coverage figure.
/// Reading the CSV back keeps this step decoupled from the database, matching
/// the standalone theme-plot pipeline.
fn render_science_theme_reports(writer: &ReportWriter) -> anyhow::Result<()> {
    let projects = report::read_project_csv(&writer.path("stats_by_project.csv"))?;
    let rows: Vec<(String, f64)> = projects
        .iter()
        .map(|(_, shortname, tb)| (shortname.clone(), *tb))
        .collect();
    let volumes: Vec<f64> = rows.iter().map(|(_, v)| *v).collect();
    let total_tb: f64 = volumes.iter().sum();

    let fractions = cumulative_fraction(&volumes);
    writer.write_svg(
        "cumulative_frac.svg",
        &charts::cumulative_fraction_chart(&fractions).render(),
    )?;

    let breakdown = categorize_projects(&rows);
    for (category, tb) in &breakdown.totals {
        tracing::info!(category = %category, volume_tb = tb, "science theme volume");
    }
    tracing::info!(
        projects = projects.len(),
        total_tb,
        coverage = breakdown.coverage,
        "volume fraction captured by theme categorization"
    );
    writer.write_svg(
        "volume_per_swg.svg",
        &charts::category_volume_chart(&breakdown, total_tb).render(),
    )?;

    Ok(())
}
