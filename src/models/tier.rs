use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Storage destination class. DMF and Banksia are the two halves of the
/// tape-backed archive (hierarchical filesystem staging vs object store);
/// Acacia is the separate object-store archive, split into ingest and mwa
/// buckets in the current schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Tier {
    Dmf,
    Banksia,
    Acacia,
    AcaciaMwa,
}

impl Tier {
    /// Label as it appears in the location-summary query output.
    pub fn label(&self) -> &'static str {
        match self {
            Tier::Dmf => "DMF",
            Tier::Banksia => "Banksia",
            Tier::Acacia => "Acacia",
            Tier::AcaciaMwa => "Acacia_mwa",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Ordered substring rules for tape-archive bucket names; first match wins.
/// Buckets matching no rule are skipped from every tier total.
const TIER_RULES: &[(&str, Tier)] = &[
    ("mwa01fs", Tier::Dmf),
    ("mwa02fs", Tier::Dmf),
    ("mwa03fs", Tier::Dmf),
    ("mwa04fs", Tier::Dmf),
    ("volt01fs", Tier::Dmf),
    ("mwaingest", Tier::Banksia),
];

pub fn classify_bucket(name: &str) -> Option<Tier> {
    TIER_RULES
        .iter()
        .find(|(substring, _)| name.contains(substring))
        .map(|(_, tier)| *tier)
}

/// Per-tier byte totals. Produced both by the live collector and by the
/// location-summary query, fresh each run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TierTotals(BTreeMap<Tier, u64>);

impl TierTotals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, tier: Tier, bytes: u64) {
        *self.0.entry(tier).or_insert(0) += bytes;
    }

    pub fn set(&mut self, tier: Tier, bytes: u64) {
        self.0.insert(tier, bytes);
    }

    /// Bytes for a tier; tiers never seen report 0.
    pub fn bytes(&self, tier: Tier) -> u64 {
        self.0.get(&tier).copied().unwrap_or(0)
    }

    pub fn contains(&self, tier: Tier) -> bool {
        self.0.contains_key(&tier)
    }

    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Tier, u64)> + '_ {
        self.0.iter().map(|(t, b)| (*t, *b))
    }
}

impl FromIterator<(Tier, u64)> for TierTotals {
    fn from_iter<I: IntoIterator<Item = (Tier, u64)>>(iter: I) -> Self {
        let mut totals = TierTotals::new();
        for (tier, bytes) in iter {
            totals.add(tier, bytes);
        }
        totals
    }
}
