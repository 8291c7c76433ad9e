// Schema adapter: the six historical report variants drifted between two
// views of the data_files location mapping. Legacy reports three tiers;
// current splits Acacia into ingest and mwa buckets (locations 2 and 4).

use crate::models::Tier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVersion {
    Legacy,
    Current,
}

impl SchemaVersion {
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "legacy" => Ok(SchemaVersion::Legacy),
            "current" => Ok(SchemaVersion::Current),
            other => anyhow::bail!("unknown schema version {other:?}"),
        }
    }

    /// CASE expression mapping (location, bucket) to a tier label.
    pub fn location_case_sql(&self) -> &'static str {
        match self {
            SchemaVersion::Legacy => {
                "CASE
                    WHEN location IN (1, 3) THEN
                        CASE WHEN bucket IN ('mwa01fs','mwa02fs','mwa03fs','mwa04fs','volt01fs')
                             THEN 'DMF' ELSE 'Banksia' END
                    WHEN location = 2 THEN 'Acacia'
                 END"
            }
            SchemaVersion::Current => {
                "CASE
                    WHEN location IN (1, 3) THEN
                        CASE WHEN bucket IN ('mwa01fs','mwa02fs','mwa03fs','mwa04fs','volt01fs')
                             THEN 'DMF' ELSE 'Banksia' END
                    WHEN location = 2 THEN 'Acacia'
                    WHEN location = 4 THEN 'Acacia_mwa'
                 END"
            }
        }
    }

    /// Tiers the location summary must return, one row each. Any other row
    /// count means schema drift and aborts the run.
    pub fn expected_tiers(&self) -> &'static [Tier] {
        match self {
            SchemaVersion::Legacy => &[Tier::Dmf, Tier::Banksia, Tier::Acacia],
            SchemaVersion::Current => {
                &[Tier::Dmf, Tier::Banksia, Tier::Acacia, Tier::AcaciaMwa]
            }
        }
    }

    pub fn tier_for_label(&self, label: &str) -> Option<Tier> {
        self.expected_tiers()
            .iter()
            .find(|t| t.label() == label)
            .copied()
    }
}
