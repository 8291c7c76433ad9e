// Single-bucket disk-usage query: shell out to mc, parse its JSON summary.

use crate::error::StatsError;
use serde::Deserialize;
use tokio::process::Command;

/// Parsed `mc du <profile>/<bucket> --json` output, e.g.
/// {"prefix":"ingesttest","size":8589934592,"objects":1,"status":"success"}
#[derive(Debug, Clone, Deserialize)]
pub struct DuSummary {
    pub prefix: String,
    pub size: u64,
    pub objects: u64,
    pub status: String,
    #[serde(default, rename = "isVersions")]
    pub is_versions: bool,
}

/// Parses the du output and enforces the success status. Anything
/// unexpected here means a corrupt partial total, so the caller aborts the
/// run rather than skipping the bucket.
pub fn parse_du_output(bucket: &str, stdout: &str) -> Result<DuSummary, StatsError> {
    let summary: DuSummary =
        serde_json::from_str(stdout.trim()).map_err(|e| StatsError::InventoryOutput {
            bucket: bucket.to_string(),
            reason: e.to_string(),
        })?;
    if summary.status != "success" {
        return Err(StatsError::InventoryStatus {
            bucket: bucket.to_string(),
            status: summary.status,
        });
    }
    Ok(summary)
}

/// Runs one du query. The profile has already been bound to a replica.
pub async fn run_du(mc_path: &str, profile: &str, bucket: &str) -> anyhow::Result<DuSummary> {
    let target = format!("{profile}/{bucket}");
    tracing::debug!(operation = "run_du", target = %target, "querying bucket usage");

    let output = Command::new(mc_path)
        .args(["du", &target, "--json"])
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!(
            "mc du {} exited with {}: {}",
            target,
            output.status,
            stderr.trim()
        );
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let summary = parse_du_output(bucket, &stdout)?;
    Ok(summary)
}
