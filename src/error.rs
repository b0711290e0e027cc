use thiserror::Error;

/// Message shown to the user when an uploaded file cannot be ingested.
pub const PARSE_FAILURE_MESSAGE: &str = "Could not parse data. Check CSV format.";

/// Message shown to the user when loading fails for any other reason.
pub const PROCESSING_FAILURE_MESSAGE: &str = "Error processing file.";

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Input has no data lines")]
    EmptyInput,

    #[error("No rows could be parsed from the input")]
    NoRowsParsed,

    #[error("API key not found in environment")]
    CredentialMissing,

    #[error("Remote service error: {0}")]
    RemoteService(String),

    #[error("Invalid model response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl DashboardError {
    /// Ingestion failures are reported to the user with a fixed message.
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, DashboardError::EmptyInput | DashboardError::NoRowsParsed)
    }

    pub fn user_message(&self) -> &'static str {
        if self.is_parse_failure() {
            PARSE_FAILURE_MESSAGE
        } else {
            PROCESSING_FAILURE_MESSAGE
        }
    }
}

impl From<reqwest::Error> for DashboardError {
    fn from(err: reqwest::Error) -> Self {
        DashboardError::RemoteService(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
