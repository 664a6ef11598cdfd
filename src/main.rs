//! ivsurf command line
//!
//! - `fetch <TICKER> [--date YYYY-MM-DD]` downloads an options chain to CSV
//! - `plot <CSV>...` renders call/put IV surfaces for chain files
//! - `run <TICKER> [--date YYYY-MM-DD]` does both

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use ivsurf::config::Config;
use ivsurf::error::{OptionsError, Result};
use ivsurf::surface::{PlotOutcome, SurfacePlotter};
use ivsurf::QuoteClient;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "ivsurf", version, about = "Options chain fetcher and IV surface plotter")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download an options chain and write it as CSV
    Fetch {
        /// Underlying ticker, e.g. SPY
        ticker: String,
        /// Historical session (YYYY-MM-DD); latest when omitted
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Render IV surfaces for one or more chain CSV files
    Plot {
        #[arg(required = true)]
        csv: Vec<PathBuf>,
    },
    /// Fetch a chain, then plot it
    Run {
        ticker: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

async fn fetch(config: &Config, ticker: &str, date: Option<NaiveDate>) -> Result<Option<PathBuf>> {
    let client = QuoteClient::new(config.quote_source.clone());
    client.fetch_chain_to_csv(ticker, date, &config.data_dir).await
}

fn plot(config: &Config, csv: &[PathBuf]) -> Result<()> {
    let plotter = SurfacePlotter::from_config(config);

    if let [single] = csv {
        return match plotter.plot_csv(single)? {
            PlotOutcome::NoValidPoints => {
                warn!("{}: no valid points, nothing rendered", single.display());
                Ok(())
            }
            PlotOutcome::Rendered(images) => {
                for image in images {
                    info!("Surface saved to {}", image.display());
                }
                Ok(())
            }
        };
    }

    let report = plotter.plot_batch(csv)?;
    for image in &report.rendered {
        info!("Surface saved to {}", image.display());
    }
    for path in &report.empty {
        warn!("{}: no valid points, nothing rendered", path.display());
    }
    if report.is_success() {
        return Ok(());
    }

    let failed: Vec<String> = report
        .failures
        .iter()
        .map(|(path, e)| format!("{}: {}", path.display(), e))
        .collect();
    Err(OptionsError::RenderError(format!(
        "{} of {} files failed:\n  {}",
        report.failures.len(),
        csv.len(),
        failed.join("\n  ")
    )))
}

/// Rendering blocks on subprocesses, so it runs off the async workers
async fn plot_blocking(config: &Config, csv: Vec<PathBuf>) -> Result<()> {
    let config = config.clone();
    tokio::task::spawn_blocking(move || plot(&config, &csv))
        .await
        .map_err(|e| OptionsError::Other(format!("Plot task failed: {}", e)))?
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    config.init_logging()?;

    match cli.command {
        Command::Fetch { ticker, date } => {
            if let Some(path) = fetch(&config, &ticker, date).await? {
                info!("Chain saved to {}", path.display());
            }
            Ok(())
        }
        Command::Plot { csv } => plot_blocking(&config, csv).await,
        Command::Run { ticker, date } => match fetch(&config, &ticker, date).await? {
            Some(path) => plot_blocking(&config, vec![path]).await,
            None => Ok(()),
        },
    }
}
