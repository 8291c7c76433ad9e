// Driver-level collection tests: per-backend tier mapping and the
// live-vs-database comparison being like-for-like across all four tiers.

#![cfg(unix)]

use archive_stats::config::AppConfig;
use archive_stats::models::{Tier, TierTotals};
use archive_stats::reconcile::Reconciliation;
use archive_stats::runner::collect_live_usage;
use std::io::Write;
use tempfile::TempDir;

/// Stand-in mc script answering `du <target> --json` with a size derived
/// from the bucket name length.
fn fake_mc(dir: &TempDir) -> String {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.path().join("mc");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(f, "#!/bin/sh").unwrap();
    writeln!(f, "target=\"$2\"").unwrap();
    writeln!(f, "bucket=\"${{target#*/}}\"").unwrap();
    writeln!(f, "size=$((${{#bucket}} * 1000))").unwrap();
    writeln!(
        f,
        "printf '{{\"prefix\":\"%s\",\"size\":%d,\"objects\":1,\"status\":\"success\"}}' \"$bucket\" \"$size\""
    )
    .unwrap();
    drop(f);
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.to_str().unwrap().to_string()
}

fn catalog(dir: &TempDir, name: &str, buckets: &[&str]) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, buckets.join("\n")).unwrap();
    path.to_str().unwrap().to_string()
}

fn test_config(dir: &TempDir) -> AppConfig {
    let mc = fake_mc(dir);
    let acacia = catalog(dir, "acacia.txt", &["ingest01"]);
    let acacia_mwa = catalog(dir, "acacia_mwa.txt", &["mwa-a1", "mwa-b2"]);
    let banksia = catalog(
        dir,
        "banksia.txt",
        &["mwa01fs", "mwaingest-01", "random-bucket"],
    );
    let toml = format!(
        r#"
[database]
path = "data/archive.db"
max_pool_size = 2

[inventory]
mc_path = "{mc}"

[report]
output_dir = "reports"
archive_start_date = "2006-01-01"

[acacia]
enabled = true
profile = "acacia"
endpoints = ["https://acacia.example.org:9000"]
quota_bytes = 1000000
bucket_catalog = "{acacia}"

[acacia_mwa]
enabled = true
profile = "acacia_mwa"
endpoints = ["https://acacia.example.org:9000"]
quota_bytes = 1000000
bucket_catalog = "{acacia_mwa}"

[banksia]
enabled = true
profile = "banksia$"
endpoints = ["https://vss-1.example.org:9000"]
quota_bytes = 1000000
bucket_catalog = "{banksia}"
"#
    );
    AppConfig::load_from_str(&toml).expect("config")
}

#[tokio::test]
async fn each_backend_lands_in_its_own_tier() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);

    let live = collect_live_usage(&config).await.unwrap();

    assert_eq!(live.bytes(Tier::Acacia), 8 * 1000);
    // the two acacia_mwa buckets sum into their own tier, not into Acacia
    assert_eq!(live.bytes(Tier::AcaciaMwa), 2 * 6 * 1000);
    assert_eq!(live.bytes(Tier::Dmf), 7 * 1000);
    assert_eq!(live.bytes(Tier::Banksia), 12 * 1000);
    // random-bucket was skipped, not silently summed anywhere
    assert_eq!(live.total(), (8 + 12 + 7 + 12) * 1000);
}

#[tokio::test]
async fn matching_database_summary_shows_no_drift() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);

    let live = collect_live_usage(&config).await.unwrap();
    let db: TierTotals = [
        (Tier::Dmf, 7 * 1000),
        (Tier::Banksia, 12 * 1000),
        (Tier::Acacia, 8 * 1000),
        (Tier::AcaciaMwa, 12 * 1000),
    ]
    .into_iter()
    .collect();

    let deltas = Reconciliation::new(live, db).deltas();
    assert_eq!(deltas.len(), 4);
    assert!(deltas.iter().all(|(_, d)| *d == 0));
}

#[tokio::test]
async fn disabled_backend_reports_explicit_zero() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&dir);
    config.acacia_mwa.enabled = false;

    let live = collect_live_usage(&config).await.unwrap();
    assert!(live.contains(Tier::AcaciaMwa));
    assert_eq!(live.bytes(Tier::AcaciaMwa), 0);
    assert_eq!(live.bytes(Tier::Acacia), 8 * 1000);
}
