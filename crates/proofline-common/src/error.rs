//! Error type for grammar checks and configuration.

use miette::Diagnostic;

/// Everything that can go wrong between "check this text" and a list of matches.
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum CheckError {
    /// The request never got a response
    #[error("grammar request failed: {0}")]
    #[diagnostic(
        code(proofline::check::transport),
        help("check the network connection and the configured endpoint")
    )]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("grammar service answered with status {status}")]
    #[diagnostic(code(proofline::check::status))]
    Status { status: u16, body: String },

    /// The response body wasn't the expected JSON
    #[error("could not decode grammar response: {0}")]
    #[diagnostic(code(proofline::check::decode))]
    Decode(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    #[diagnostic(code(proofline::config), help("every field has a default; omit it to use that"))]
    InvalidConfig(String),
}

impl CheckError {
    /// Whether retrying the same request could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            CheckError::Transport(_) => true,
            CheckError::Status { status, .. } => *status == 429 || *status >= 500,
            CheckError::Decode(_) | CheckError::InvalidConfig(_) => false,
        }
    }
}
