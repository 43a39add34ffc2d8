use std::fmt;

/// Harness-wide Result type
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Main harness error type
///
/// Gateway rejections are deliberately absent: a 405 or other non-redirect
/// terminal response is a classified flow outcome, not an error.
#[derive(thiserror::Error, Debug)]
pub enum HarnessError {
    /// Malformed input to builders and signers
    #[error("Validation error: {0}")]
    Validation(String),

    /// Connection failure or timeout while probing
    #[error("Network error: {0}")]
    Network(String),

    /// Backend returned success=false or a malformed response
    #[error("Backend error: {0}")]
    Backend(String),

    /// Embedded gateway configuration missing or unparseable
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Observed token format disagrees with the configured scheme
    #[error("Contract drift: {0}")]
    ContractDrift(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Scenario definition errors
    #[error("Scenario error: {0}")]
    Scenario(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors (scenario files, report output)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// Helper functions for common error scenarios
impl HarnessError {
    pub fn validation(msg: impl Into<String>) -> Self {
        HarnessError::Validation(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        HarnessError::Network(msg.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        HarnessError::Backend(msg.into())
    }

    pub fn extraction(msg: impl Into<String>) -> Self {
        HarnessError::Extraction(msg.into())
    }

    pub fn contract_drift(msg: impl Into<String>) -> Self {
        HarnessError::ContractDrift(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        HarnessError::Configuration(msg.into())
    }

    pub fn scenario(msg: impl Into<String>) -> Self {
        HarnessError::Scenario(msg.into())
    }
}

/// Short machine-readable code for report output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Network,
    Backend,
    Extraction,
    ContractDrift,
    Configuration,
    Scenario,
}

impl HarnessError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HarnessError::Validation(_) => ErrorKind::Validation,
            HarnessError::Network(_) => ErrorKind::Network,
            HarnessError::Backend(_) => ErrorKind::Backend,
            HarnessError::Extraction(_) => ErrorKind::Extraction,
            HarnessError::ContractDrift(_) => ErrorKind::ContractDrift,
            HarnessError::Configuration(_) => ErrorKind::Configuration,
            HarnessError::Scenario(_) => ErrorKind::Scenario,
            HarnessError::Json(_) => ErrorKind::Backend,
            HarnessError::Io(_) => ErrorKind::Scenario,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Network => "network",
            ErrorKind::Backend => "backend",
            ErrorKind::Extraction => "extraction",
            ErrorKind::ContractDrift => "contract-drift",
            ErrorKind::Configuration => "configuration",
            ErrorKind::Scenario => "scenario",
        };
        write!(f, "{}", s)
    }
}
