use crate::models::Tier;
use thiserror::Error;

/// Structural failures that must abort the run. Data gaps (NULL sums,
/// unclassified buckets) are handled at the call site instead, so a report
/// can still be produced from partially incomplete source data.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("inventory query for bucket {bucket} returned status {status:?}")]
    InventoryStatus { bucket: String, status: String },

    #[error("unparseable inventory output for bucket {bucket}: {reason}")]
    InventoryOutput { bucket: String, reason: String },

    #[error("inventory query for bucket {bucket} failed after {attempts} attempts: {last_error}")]
    InventoryExhausted {
        bucket: String,
        attempts: u32,
        last_error: String,
    },

    #[error("location summary returned {got} rows, expected {expected} (schema drift?)")]
    LocationRowCount { got: usize, expected: usize },

    #[error("location summary returned unknown tier label {0:?}")]
    UnknownTierLabel(String),

    #[error("location summary returned duplicate rows for tier {0}")]
    DuplicateTierRow(Tier),
}
