// Shared test helpers: build a temp archive database with the
// system-of-record tables and seed rows into it.

use archive_stats::archive_db::{ArchiveDb, schema::SchemaVersion};
use tempfile::TempDir;

pub async fn test_db(dir: &TempDir, schema: SchemaVersion) -> ArchiveDb {
    let path = dir.path().join("archive.db");
    let db = ArchiveDb::connect(path.to_str().unwrap(), 2, schema)
        .await
        .expect("connect");
    db.init().await.expect("init");

    sqlx::query(
        "CREATE TABLE observation (
            starttime_utc TEXT NOT NULL,
            projectid TEXT NOT NULL,
            projectshortname TEXT,
            mwa_array_configuration TEXT,
            duration INTEGER,
            total_archived_data_bytes INTEGER,
            files_deleted_bytes INTEGER
        )",
    )
    .execute(db.pool())
    .await
    .expect("create observation");

    sqlx::query(
        "CREATE TABLE data_files (
            location INTEGER NOT NULL,
            bucket TEXT,
            size INTEGER NOT NULL,
            deleted_timestamp TEXT,
            remote_archived INTEGER NOT NULL
        )",
    )
    .execute(db.pool())
    .await
    .expect("create data_files");

    db
}

#[allow(clippy::too_many_arguments)]
pub async fn insert_observation(
    db: &ArchiveDb,
    starttime_utc: &str,
    project_id: &str,
    shortname: &str,
    configuration: &str,
    duration_secs: Option<i64>,
    archived_bytes: Option<i64>,
    deleted_bytes: Option<i64>,
) {
    sqlx::query(
        "INSERT INTO observation
         (starttime_utc, projectid, projectshortname, mwa_array_configuration,
          duration, total_archived_data_bytes, files_deleted_bytes)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(starttime_utc)
    .bind(project_id)
    .bind(shortname)
    .bind(configuration)
    .bind(duration_secs)
    .bind(archived_bytes)
    .bind(deleted_bytes)
    .execute(db.pool())
    .await
    .expect("insert observation");
}

pub async fn insert_data_file(
    db: &ArchiveDb,
    location: i64,
    bucket: &str,
    size: i64,
    deleted_timestamp: Option<&str>,
    remote_archived: bool,
) {
    sqlx::query(
        "INSERT INTO data_files (location, bucket, size, deleted_timestamp, remote_archived)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(location)
    .bind(bucket)
    .bind(size)
    .bind(deleted_timestamp)
    .bind(remote_archived as i64)
    .execute(db.pool())
    .await
    .expect("insert data_file");
}
