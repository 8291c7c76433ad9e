use anyhow::Result;
use archive_stats::{config::AppConfig, runner};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

/// Calculates archive usage from the observation database and the live
/// object-storage backends, reconciles the two, and writes the CSV and
/// chart reports. Needs access to the backends and the database.
#[derive(Parser, Debug)]
#[command(name = "archive-stats")]
struct Args {
    /// Configuration file location.
    #[arg(short = 'c', long = "cfg")]
    cfg: String,

    /// Rebuild the local monthly-aggregate cache from scratch.
    #[arg(long)]
    repopulate_cache: bool,

    /// Replace only the trailing N months of the cache.
    #[arg(long, value_name = "N", conflicts_with = "repopulate_cache")]
    refresh_months: Option<u32>,

    /// Skip live backend collection; emit CSVs and charts only.
    #[arg(long)]
    reports_only: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let args = Args::parse();
    let app_config = AppConfig::load(&args.cfg)?;

    let flags = runner::RunFlags {
        repopulate_cache: args.repopulate_cache,
        refresh_months: args.refresh_months,
        reports_only: args.reports_only,
    };
    runner::run(&app_config, &flags).await
}
