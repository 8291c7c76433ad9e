use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub inventory: InventoryConfig,
    pub report: ReportConfig,
    /// Acacia ingest buckets (location 2 in the database of record).
    pub acacia: BackendConfig,
    /// Acacia mwa buckets (location 4), kept as a separate backend with its
    /// own profile and quota so the tier comparison is like-for-like.
    pub acacia_mwa: BackendConfig,
    pub banksia: BackendConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_pool_size: u32,
    /// "legacy" (3-tier location summary) or "current" (4-tier).
    #[serde(default = "default_schema")]
    pub schema: String,
}

fn default_schema() -> String {
    "current".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct InventoryConfig {
    /// Path to the mc (minio client) binary used for per-bucket du queries.
    pub mc_path: String,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_base_ms() -> u64 {
    500
}

/// One object-store backend. `profile` may contain a `$` placeholder which
/// is replaced with the chosen endpoint's replica id per bucket query.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    pub enabled: bool,
    pub profile: String,
    pub endpoints: Vec<String>,
    pub quota_bytes: u64,
    /// File listing bucket names, one per line (the bucket catalog is
    /// produced by the S3 listing, outside this job).
    pub bucket_catalog: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    pub output_dir: String,
    /// Earliest observation date for all-time series, e.g. "2006-01-01".
    pub archive_start_date: String,
    #[serde(default = "default_recent_months")]
    pub recent_months: u32,
    /// Optional window for the quarterly per-month correction dump.
    pub dump_window: Option<DumpWindowConfig>,
}

fn default_recent_months() -> u32 {
    6
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DumpWindowConfig {
    pub year_from: i32,
    pub year_to: i32,
    pub month_from: u32,
    pub month_to: u32,
}

impl AppConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.database.path.is_empty(),
            "database.path must be non-empty"
        );
        anyhow::ensure!(
            self.database.max_pool_size > 0,
            "database.max_pool_size must be > 0, got {}",
            self.database.max_pool_size
        );
        anyhow::ensure!(
            self.database.schema == "legacy" || self.database.schema == "current",
            "database.schema must be \"legacy\" or \"current\", got {:?}",
            self.database.schema
        );
        anyhow::ensure!(
            !self.inventory.mc_path.is_empty(),
            "inventory.mc_path must be non-empty"
        );
        anyhow::ensure!(
            self.inventory.max_attempts > 0,
            "inventory.max_attempts must be > 0, got {}",
            self.inventory.max_attempts
        );
        anyhow::ensure!(
            !self.report.output_dir.is_empty(),
            "report.output_dir must be non-empty"
        );
        anyhow::ensure!(
            chrono::NaiveDate::parse_from_str(&self.report.archive_start_date, "%Y-%m-%d").is_ok(),
            "report.archive_start_date must be YYYY-MM-DD, got {:?}",
            self.report.archive_start_date
        );
        anyhow::ensure!(
            self.report.recent_months > 0,
            "report.recent_months must be > 0, got {}",
            self.report.recent_months
        );
        if let Some(w) = &self.report.dump_window {
            anyhow::ensure!(
                (1..=12).contains(&w.month_from) && (1..=12).contains(&w.month_to),
                "report.dump_window months must be in 1..=12"
            );
        }
        for (name, backend) in [
            ("acacia", &self.acacia),
            ("acacia_mwa", &self.acacia_mwa),
            ("banksia", &self.banksia),
        ] {
            if !backend.enabled {
                continue;
            }
            anyhow::ensure!(
                !backend.profile.is_empty(),
                "{name}.profile must be non-empty"
            );
            anyhow::ensure!(
                !backend.endpoints.is_empty(),
                "{name}.endpoints must list at least one URL"
            );
            anyhow::ensure!(
                backend.quota_bytes > 0,
                "{name}.quota_bytes must be > 0, got {}",
                backend.quota_bytes
            );
            anyhow::ensure!(
                !backend.bucket_catalog.is_empty(),
                "{name}.bucket_catalog must be non-empty"
            );
        }
        Ok(())
    }
}
