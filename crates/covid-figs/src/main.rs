//! covid-figs - render and publish the COVID-19 overview figures

use anyhow::{Context, Result};
use clap::Parser;
use covid_figs::{run_job, S3Publisher};
use covid_figs_common::{build_dispatch, LoggingConfig};
use covid_figs_config::{Config, ConfigLoader};
use covid_figs_graphs::DataFetcher;
use std::env;
use std::path::PathBuf;
use tracing::instrument::WithSubscriber;
use tracing::{error, info};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path; overrides the usual lookup
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "covid_figs_graphs=trace"
    #[arg(short, long)]
    log_level: Option<String>,
}

/// Log settings in force while the configuration itself is loading.
fn bootstrap_logging(args: &Args) -> LoggingConfig {
    let mut logging = LoggingConfig::default();
    if let Some(level) = &args.log_level {
        logging.level.clone_from(level);
    }
    logging
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = ConfigLoader::load_with(args.config.as_deref(), |var| env::var(var).ok())
        .context("Failed to load configuration")?;
    if let Some(level) = &args.log_level {
        config.logging.level.clone_from(level);
    }
    Ok(config)
}

async fn run(config: Config) -> Result<()> {
    let fetcher = DataFetcher::from_config(&config.source)
        .context("Failed to create the upstream client")?;
    let publisher = S3Publisher::from_config(&config.storage).await;

    let report = match run_job(&config, &fetcher, &publisher).await {
        Ok(report) => report,
        Err(e) => {
            error!("Run failed: {}", e);
            return Err(e).context("Run failed");
        }
    };

    println!("{}", report.to_json_pretty()?);
    info!("Published {} overview(s)", report.len());
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let bootstrap =
        build_dispatch(&bootstrap_logging(&args)).context("Failed to build the log sink")?;
    let config = tracing::dispatcher::with_default(&bootstrap, || load_config(&args))?;
    let dispatch = build_dispatch(&config.logging).context("Failed to build the log sink")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;

    runtime.block_on(run(config).with_subscriber(dispatch))
}
