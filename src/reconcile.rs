// Reconciliation: compare live collector totals against the database of
// record and log the deltas. Purely observational; drift is for operators
// to chase, never auto-corrected.

use crate::metrics::bytes_to_terabytes;
use crate::models::{Tier, TierTotals};

#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub live: TierTotals,
    pub db: TierTotals,
}

impl Reconciliation {
    pub fn new(live: TierTotals, db: TierTotals) -> Self {
        Self { live, db }
    }

    /// Signed live-minus-db delta per tier, over the union of tiers seen
    /// on either side.
    pub fn deltas(&self) -> Vec<(Tier, i64)> {
        let mut tiers: Vec<Tier> = self
            .live
            .iter()
            .map(|(t, _)| t)
            .chain(self.db.iter().map(|(t, _)| t))
            .collect();
        tiers.sort();
        tiers.dedup();
        tiers
            .into_iter()
            .map(|t| (t, self.live.bytes(t) as i64 - self.db.bytes(t) as i64))
            .collect()
    }

    /// Always printed, matching or not, so drift is visible in the log.
    pub fn log_summary(&self) {
        for (tier, _) in self.deltas() {
            tracing::info!(
                tier = %tier,
                live_tb = tb(self.live.bytes(tier)),
                db_tb = tb(self.db.bytes(tier)),
                "tier usage, live vs database"
            );
        }
        tracing::info!(
            live_tb = tb(self.live.total()),
            db_tb = tb(self.db.total()),
            "total long-term storage, live vs database"
        );
    }
}

/// Percent of a quota consumed; quota 0 would be a config bug but reports
/// 0 rather than dividing by it.
pub fn percent_of_quota(used_bytes: u64, quota_bytes: u64) -> f64 {
    if quota_bytes == 0 {
        return 0.0;
    }
    used_bytes as f64 / quota_bytes as f64 * 100.0
}

pub fn log_quota_line(name: &str, used_bytes: u64, quota_bytes: u64) {
    tracing::info!(
        backend = name,
        used_tb = tb(used_bytes),
        quota_tb = tb(quota_bytes),
        percent_used = percent_of_quota(used_bytes, quota_bytes),
        "quota usage"
    );
}

fn tb(bytes: u64) -> f64 {
    bytes_to_terabytes(Some(bytes as i64))
}
