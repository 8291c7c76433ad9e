// System-of-record query tests against a real temporary SQLite database.

mod common;

use archive_stats::archive_db::{cache, schema::SchemaVersion};
use archive_stats::error::StatsError;
use archive_stats::models::Tier;
use chrono::NaiveDate;
use common::{insert_data_file, insert_observation, test_db};
use tempfile::TempDir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn location_summary_current_schema_four_tiers() {
    let dir = TempDir::new().unwrap();
    let db = test_db(&dir, SchemaVersion::Current).await;

    insert_data_file(&db, 1, "mwa01fs", 100, None, true).await;
    insert_data_file(&db, 3, "volt01fs", 50, None, true).await;
    insert_data_file(&db, 1, "mwaingest-01", 200, None, true).await;
    insert_data_file(&db, 2, "ingest-bucket", 300, None, true).await;
    insert_data_file(&db, 4, "mwa-bucket", 400, None, true).await;

    let totals = db.location_summary().await.unwrap();
    assert_eq!(totals.bytes(Tier::Dmf), 150);
    assert_eq!(totals.bytes(Tier::Banksia), 200);
    assert_eq!(totals.bytes(Tier::Acacia), 300);
    assert_eq!(totals.bytes(Tier::AcaciaMwa), 400);
}

#[tokio::test]
async fn location_summary_legacy_schema_three_tiers() {
    let dir = TempDir::new().unwrap();
    let db = test_db(&dir, SchemaVersion::Legacy).await;

    insert_data_file(&db, 1, "mwa02fs", 10, None, true).await;
    insert_data_file(&db, 1, "other", 20, None, true).await;
    insert_data_file(&db, 2, "ingest", 30, None, true).await;

    let totals = db.location_summary().await.unwrap();
    assert_eq!(totals.len(), 3);
    assert_eq!(totals.bytes(Tier::Dmf), 10);
    assert_eq!(totals.bytes(Tier::Banksia), 20);
    assert_eq!(totals.bytes(Tier::Acacia), 30);
}

#[tokio::test]
async fn location_summary_excludes_deleted_and_unarchived() {
    let dir = TempDir::new().unwrap();
    let db = test_db(&dir, SchemaVersion::Current).await;

    insert_data_file(&db, 1, "mwa01fs", 100, None, true).await;
    // deleted rows and rows never archived must not count
    insert_data_file(&db, 1, "mwa01fs", 500, Some("2023-01-05 10:00:00"), true).await;
    insert_data_file(&db, 1, "mwa01fs", 900, None, false).await;
    insert_data_file(&db, 1, "other", 1, None, true).await;
    insert_data_file(&db, 2, "ingest", 1, None, true).await;
    insert_data_file(&db, 4, "mwa", 1, None, true).await;

    let totals = db.location_summary().await.unwrap();
    assert_eq!(totals.bytes(Tier::Dmf), 100);
}

#[tokio::test]
async fn location_summary_wrong_row_count_is_fatal() {
    let dir = TempDir::new().unwrap();
    let db = test_db(&dir, SchemaVersion::Current).await;

    // only two of the four expected tiers have data
    insert_data_file(&db, 1, "mwa01fs", 100, None, true).await;
    insert_data_file(&db, 2, "ingest", 200, None, true).await;

    let err = db.location_summary().await.unwrap_err();
    match err.downcast_ref::<StatsError>() {
        Some(StatsError::LocationRowCount { got: 2, expected: 4 }) => {}
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn location_summary_unknown_label_is_fatal() {
    let dir = TempDir::new().unwrap();
    let db = test_db(&dir, SchemaVersion::Legacy).await;

    // legacy CASE has no arm for location 4, so that group carries no label
    insert_data_file(&db, 1, "mwa01fs", 100, None, true).await;
    insert_data_file(&db, 1, "other", 200, None, true).await;
    insert_data_file(&db, 4, "mwa", 300, None, true).await;

    let err = db.location_summary().await.unwrap_err();
    match err.downcast_ref::<StatsError>() {
        Some(StatsError::UnknownTierLabel(label)) => assert!(label.is_empty()),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn daily_stats_groups_and_coalesces() {
    let dir = TempDir::new().unwrap();
    let db = test_db(&dir, SchemaVersion::Current).await;

    insert_observation(&db, "2023-01-01 01:00:00", "G0008", "EoR", "Phase II Compact",
        Some(120), Some(1000), Some(0)).await;
    insert_observation(&db, "2023-01-01 14:00:00", "G0008", "EoR", "Phase II Compact",
        Some(240), Some(2000), Some(0)).await;
    insert_observation(&db, "2023-01-02 01:00:00", "D0006", "IPS", "Phase II Extended",
        None, None, None).await;

    let rows = db.daily_stats().await.unwrap();
    assert_eq!(rows.len(), 2);

    assert_eq!(rows[0].date, "2023-01-01");
    assert_eq!(rows[0].project_id, "G0008");
    assert_eq!(rows[0].duration_secs, 360);
    assert_eq!(rows[0].archived_bytes, 3000);

    // NULL sums read back as zero
    assert_eq!(rows[1].date, "2023-01-02");
    assert_eq!(rows[1].duration_secs, 0);
    assert_eq!(rows[1].archived_bytes, 0);
    assert_eq!(rows[1].deleted_bytes, 0);
}

#[tokio::test]
async fn monthly_aggregates_ascending() {
    let dir = TempDir::new().unwrap();
    let db = test_db(&dir, SchemaVersion::Current).await;

    insert_observation(&db, "2022-12-15 00:00:00", "G0008", "EoR", "",
        Some(100), Some(10), Some(0)).await;
    insert_observation(&db, "2023-01-10 00:00:00", "G0008", "EoR", "",
        Some(200), Some(20), Some(0)).await;
    insert_observation(&db, "2023-01-20 00:00:00", "D0006", "IPS", "",
        Some(300), Some(30), Some(0)).await;

    let rows = db.monthly_aggregates().await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!((rows[0].year, rows[0].month), (2022, 12));
    assert_eq!((rows[1].year, rows[1].month), (2023, 1));
    assert_eq!(rows[1].duration_secs, 500);
    assert_eq!(rows[1].archived_bytes, 50);
}

#[tokio::test]
async fn project_totals_ranged_and_sorted() {
    let dir = TempDir::new().unwrap();
    let db = test_db(&dir, SchemaVersion::Current).await;

    insert_observation(&db, "2023-01-05 00:00:00", "G0008", "EoR", "",
        Some(10), Some(100), Some(0)).await;
    insert_observation(&db, "2023-01-06 00:00:00", "D0006", "IPS", "",
        Some(10), Some(900), Some(0)).await;
    // end date itself is included, midnight after is not
    insert_observation(&db, "2023-01-31 23:59:59", "D0006", "IPS", "",
        Some(10), Some(50), Some(0)).await;
    insert_observation(&db, "2023-02-01 00:00:00", "C001", "Calibration", "",
        Some(10), Some(9999), Some(0)).await;

    let rows = db
        .project_totals(date(2023, 1, 1), date(2023, 1, 31))
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].project_id, "D0006");
    assert_eq!(rows[0].archived_bytes, 950);
    assert_eq!(rows[1].project_id, "G0008");
}

#[tokio::test]
async fn gross_volume_counts_deleted_at_ingest_month() {
    let dir = TempDir::new().unwrap();
    let db = test_db(&dir, SchemaVersion::Current).await;

    // data deleted later still counts as January ingest
    insert_observation(&db, "2023-01-10 00:00:00", "G0008", "EoR", "",
        Some(10), Some(700), Some(300)).await;

    let rows = db
        .monthly_gross_volume(date(2023, 1, 1), date(2023, 3, 31))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!((rows[0].year, rows[0].month), (2023, 1));
    assert_eq!(rows[0].bytes, 1000);
}

#[tokio::test]
async fn deleted_by_month_uses_deletion_axis() {
    let dir = TempDir::new().unwrap();
    let db = test_db(&dir, SchemaVersion::Current).await;

    // deletion month, not ingest month, is what groups these
    insert_data_file(&db, 2, "ingest", 600, Some("2023-02-10 08:00:00"), true).await;
    insert_data_file(&db, 2, "ingest", 400, Some("2023-02-20 08:00:00"), true).await;
    insert_data_file(&db, 2, "ingest", 999, None, true).await;

    let rows = db
        .deleted_by_month(date(2023, 1, 1), date(2023, 3, 31))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!((rows[0].year, rows[0].month), (2023, 2));
    assert_eq!(rows[0].bytes, 1000);
}

#[tokio::test]
async fn cache_repopulate_and_read() {
    let dir = TempDir::new().unwrap();
    let db = test_db(&dir, SchemaVersion::Current).await;

    insert_observation(&db, "2022-12-15 00:00:00", "G0008", "EoR", "",
        Some(100), Some(10), Some(0)).await;
    insert_observation(&db, "2023-01-10 00:00:00", "G0008", "EoR", "",
        Some(200), Some(20), Some(0)).await;

    assert_eq!(cache::count(db.pool()).await.unwrap(), 0);
    let written = db.repopulate_cache().await.unwrap();
    assert_eq!(written, 2);

    let cached = db.cached_monthly_aggregates().await.unwrap();
    let live = db.monthly_aggregates().await.unwrap();
    assert_eq!(cached.len(), live.len());
    for (c, l) in cached.iter().zip(&live) {
        assert_eq!((c.year, c.month), (l.year, l.month));
        assert_eq!(c.duration_secs, l.duration_secs);
        assert_eq!(c.archived_bytes, l.archived_bytes);
    }
}

#[tokio::test]
async fn cache_refresh_trailing_leaves_history() {
    let dir = TempDir::new().unwrap();
    let db = test_db(&dir, SchemaVersion::Current).await;

    insert_observation(&db, "2022-06-15 00:00:00", "G0008", "EoR", "",
        Some(100), Some(10), Some(0)).await;
    insert_observation(&db, "2023-01-10 00:00:00", "G0008", "EoR", "",
        Some(200), Some(20), Some(0)).await;
    db.repopulate_cache().await.unwrap();

    // new data lands in a recent month; old history stays as cached
    insert_observation(&db, "2023-01-20 00:00:00", "G0008", "EoR", "",
        Some(300), Some(30), Some(0)).await;
    let replaced = db
        .refresh_cache_trailing(3, date(2023, 2, 15))
        .await
        .unwrap();
    assert_eq!(replaced, 1);

    let cached = db.cached_monthly_aggregates().await.unwrap();
    assert_eq!(cached.len(), 2);
    assert_eq!(cached[0].duration_secs, 100);
    assert_eq!(cached[1].duration_secs, 500);
    assert_eq!(cached[1].archived_bytes, 50);
}
