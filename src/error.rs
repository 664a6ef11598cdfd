use thiserror::Error;

/// Custom error types for the ivsurf library
#[derive(Error, Debug)]
pub enum OptionsError {

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Missing required column '{0}' in CSV header")]
    MissingColumn(String),

    #[error("Request error: {0}")]
    RequestError(String),

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serde error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("{0}")]
    Other(String),
}

impl OptionsError {
    /// Errors that should stop a whole run rather than a single input file
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            OptionsError::ConfigError(_) | OptionsError::MissingColumn(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, OptionsError>;
