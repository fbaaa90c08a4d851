//! Error types for gitgloss
//!
//! Defines a comprehensive error enum covering all failure modes across the system.
//! Uses thiserror for ergonomic error handling.
//!
//! Two classes of outcomes deliberately do NOT appear here: a resource that
//! no strategy could produce is `Ok(None)` (absence is for the caller to
//! judge), and an individual strategy failure is a per-module error
//! ([`crate::resolver::StrategyError`]) that the resolver logs and swallows.

use thiserror::Error;

/// Result type alias for gitgloss operations
pub type Result<T> = std::result::Result<T, GitGlossError>;

/// Comprehensive error type for gitgloss operations
#[derive(Error, Debug)]
pub enum GitGlossError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generation API key is not configured; the caller must render a setup
    /// prompt rather than attempting the request
    #[error("No generation API key configured. Run 'gitgloss login --token <KEY>' first")]
    MissingCredential,

    /// A malformed resource descriptor (programmer error, not a miss)
    #[error("Invalid resource: {0}")]
    InvalidResource(String),

    /// An upstream service answered with a non-success status. The status
    /// and body are preserved verbatim so users can self-diagnose (invalid
    /// credential, exhausted quota, ...)
    #[error("Upstream error: HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),

    /// Anyhow errors (for more context)
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

impl GitGlossError {
    /// True when the error should be presented as a setup problem rather
    /// than a transient failure
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            GitGlossError::MissingCredential | GitGlossError::Config(_)
        )
    }
}
