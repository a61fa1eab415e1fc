//! InfoHub — Binary Entrypoint
//! One batch run by default; set `loop_interval_secs` in the settings
//! to keep running on an interval. `INFOHUB_RUN_MODE` selects the
//! source tier (core | secondary | all).

use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use infohub::config::Settings;
use infohub::ingest::fetch::FeedFetcher;
use infohub::run;
use infohub::sources::RunMode;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let settings = Settings::load_default()?;
    let mode = RunMode::from_env();
    let fetcher = FeedFetcher::new(settings.fetch_timeout())?;

    match settings.loop_interval_secs {
        Some(interval) => run::run_loop(&settings, mode, &fetcher, interval).await?,
        None => {
            run::run_once(&settings, mode, &fetcher).await?;
        }
    }
    Ok(())
}
