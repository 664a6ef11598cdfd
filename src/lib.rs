//! # ivsurf
//!
//! Fetches options chains from Alpha Vantage, stores them as CSV, and plots
//! implied volatility surfaces from those files.
//!
//! ## Features
//!
//! - Async client for the Alpha Vantage `HISTORICAL_OPTIONS` endpoint
//! - Chain CSV writer with a fixed column layout
//! - IV surface extraction with per-row filtering
//! - gnuplot and plotters rendering backends
//! - Environment-based configuration
//!
//! ## Example
//!
//! ```rust,no_run
//! use ivsurf::config::Config;
//! use ivsurf::surface::{PlotOutcome, SurfacePlotter};
//! use ivsurf::QuoteClient;
//!
//! #[tokio::main]
//! async fn main() -> ivsurf::Result<()> {
//!     let config = Config::from_env()?;
//!     config.init_logging()?;
//!
//!     let client = QuoteClient::new(config.quote_source.clone());
//!     let csv = client.fetch_chain_to_csv("SPY", None, &config.data_dir).await?;
//!
//!     if let Some(csv) = csv {
//!         let plotter = SurfacePlotter::from_config(&config);
//!         if let PlotOutcome::Rendered(images) = plotter.plot_csv(&csv)? {
//!             println!("wrote {:?}", images);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod render;
pub mod surface;
pub mod utils;

// Re-export commonly used types
pub use api::QuoteClient;
pub use config::Config;
pub use error::{OptionsError, Result};
