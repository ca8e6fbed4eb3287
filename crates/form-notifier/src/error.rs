//! Error types for the form notifier

use thiserror::Error;

/// Failure reported by a mail delivery backend.
///
/// Carries the provider's HTTP status when one was received and the
/// provider's human-readable reason when it gave one.
#[derive(Debug, Clone, Error)]
#[error("Mail dispatch failed{}: {}", status_suffix(.status.as_ref()), .reason.as_deref().unwrap_or("no reason given"))]
pub struct DispatchError {
    pub status: Option<u16>,
    pub reason: Option<String>,
}

fn status_suffix(status: Option<&u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

impl DispatchError {
    pub fn new(status: Option<u16>, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: Some(reason.into()),
        }
    }

    /// Error with no reason text, e.g. a transport failure before any response
    pub fn without_reason(status: Option<u16>) -> Self {
        Self {
            status,
            reason: None,
        }
    }

    /// Text shown to the caller: the provider's reason verbatim, or the
    /// error's own display text when the provider gave none.
    pub fn caller_message(&self) -> String {
        match &self.reason {
            Some(reason) => reason.clone(),
            None => self.to_string(),
        }
    }
}

/// Everything that can go wrong while processing one submission
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("Mismatched mimetype: {0}")]
    MismatchedMimetype(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Invalid form body: {0}")]
    InvalidForm(String),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl SubmissionError {
    /// Message placed in the JSON body or redirect query string
    pub fn caller_message(&self) -> String {
        match self {
            SubmissionError::Dispatch(e) => e.caller_message(),
            other => other.to_string(),
        }
    }

    /// Whether the failure came from the delivery provider rather than the request
    pub fn is_provider_failure(&self) -> bool {
        matches!(self, SubmissionError::Dispatch(_))
    }
}

/// Configuration errors, raised once at cold start
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Unknown mail provider: {0} (expected sendgrid, ses or log)")]
    UnknownProvider(String),

    #[error("Invalid email address in {var}: {value}")]
    InvalidAddress { var: &'static str, value: String },

    #[error("Invalid value for {var}: {value}")]
    InvalidNumber { var: &'static str, value: String },
}
