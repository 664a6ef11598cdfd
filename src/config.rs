use crate::error::{OptionsError, Result};
use dotenv::dotenv;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the Alpha Vantage quote source
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteSourceConfig {
    /// Alpha Vantage API key (only needed for fetching)
    pub api_key: Option<String>,
    /// Query endpoint, e.g. `https://www.alphavantage.co/query`
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl QuoteSourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Which renderer backend draws the surfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    /// External gnuplot process driven by a generated script
    Gnuplot,
    /// In-process heat map drawn with plotters
    Plotters,
}

impl std::str::FromStr for RendererKind {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gnuplot" => Ok(RendererKind::Gnuplot),
            "plotters" => Ok(RendererKind::Plotters),
            other => Err(OptionsError::ConfigError(format!(
                "unknown renderer '{}' (expected 'gnuplot' or 'plotters')",
                other
            ))),
        }
    }
}

/// Configuration for the plot renderer
#[derive(Debug, Clone, Deserialize)]
pub struct RendererConfig {
    pub kind: RendererKind,
    /// gnuplot executable
    pub program: String,
    /// Upper bound on a single renderer invocation
    pub timeout_secs: u64,
}

impl RendererConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            kind: RendererKind::Gnuplot,
            program: "gnuplot".to_string(),
            timeout_secs: 120,
        }
    }
}

/// Configuration for the application
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Quote source configuration
    pub quote_source: QuoteSourceConfig,
    /// Renderer configuration
    pub renderer: RendererConfig,
    /// Where fetched chain CSVs are written
    pub data_dir: PathBuf,
    /// Where point files, scripts and PNGs are written
    pub output_dir: PathBuf,
    /// Log level
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let default_base_url = "https://www.alphavantage.co/query".to_string();
        let default_log_level = "info".to_string();
        let defaults = RendererConfig::default();

        let api_key = env::var("ALPHAVANTAGE_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());
        let base_url = env::var("ALPHAVANTAGE_BASE_URL").unwrap_or(default_base_url);
        let request_timeout = parse_secs("ALPHAVANTAGE_TIMEOUT_SECS", 30)?;

        let kind = match env::var("IVSURF_RENDERER") {
            Ok(v) => v.parse()?,
            Err(_) => defaults.kind,
        };
        let program = env::var("IVSURF_GNUPLOT").unwrap_or(defaults.program);
        let render_timeout = parse_secs("IVSURF_RENDER_TIMEOUT_SECS", defaults.timeout_secs)?;

        let data_dir = env::var("IVSURF_DATA_DIR").unwrap_or_else(|_| "data".to_string());
        let output_dir = env::var("IVSURF_OUTPUT_DIR").unwrap_or_else(|_| "output".to_string());
        let log_level = env::var("LOG_LEVEL").unwrap_or(default_log_level);

        Ok(Config {
            quote_source: QuoteSourceConfig {
                api_key,
                base_url,
                timeout_secs: request_timeout,
            },
            renderer: RendererConfig {
                kind,
                program,
                timeout_secs: render_timeout,
            },
            data_dir: PathBuf::from(data_dir),
            output_dir: PathBuf::from(output_dir),
            log_level,
        })
    }

    /// Initialize logging based on configuration
    pub fn init_logging(&self) -> Result<()> {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.log_level));

        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
            .map_err(|e| OptionsError::ConfigError(format!("Failed to init logging: {}", e)))?;

        Ok(())
    }
}

fn parse_secs(var: &str, default: u64) -> Result<u64> {
    match env::var(var) {
        Ok(v) => v.trim().parse::<u64>().map_err(|_| {
            OptionsError::ConfigError(format!("{} must be a whole number of seconds, got '{}'", var, v))
        }),
        Err(_) => Ok(default),
    }
}
