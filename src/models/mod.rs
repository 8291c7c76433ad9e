// Domain models (value objects; computed fresh each run)

mod stats;
mod tier;

pub use stats::{
    DailyStatsRow, DumpTotals, MonthlyAggregateRow, MonthlyBytes, MonthlyStatsRow, MonthlyVolume,
    ProjectStatsRow,
};
pub use tier::{Tier, TierTotals, classify_bucket};
