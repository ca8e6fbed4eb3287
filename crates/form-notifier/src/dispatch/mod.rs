//! Mail delivery backends.
//!
//! `MailDispatch` is the seam between the handler and the delivery provider.
//! `SendGridDispatcher` is the production backend, `SesDispatcher` an
//! alternative for AWS-only deployments, `LogDispatcher` logs instead of
//! sending (local runs), and `RecordingDispatcher` captures messages in
//! memory for tests.
//!
//! The trait is object-safe so the handler can hold `Arc<dyn MailDispatch>`.

pub mod sendgrid;
pub mod ses;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::info;

use crate::error::DispatchError;
use crate::types::{DispatchReceipt, NotificationEmail};
use crate::{MailProvider, NotifierConfig};

pub use sendgrid::SendGridDispatcher;
pub use ses::SesDispatcher;

/// Abstraction over a transactional email provider.
///
/// Any error is final for the current request; callers never retry.
#[async_trait]
pub trait MailDispatch: Send + Sync {
    async fn send(&self, email: &NotificationEmail) -> Result<DispatchReceipt, DispatchError>;
}

/// Build the backend selected by `config.provider`
pub async fn from_config(config: &NotifierConfig) -> Arc<dyn MailDispatch> {
    match config.provider {
        MailProvider::SendGrid => Arc::new(SendGridDispatcher::new(
            config.sendgrid_api_key.clone().unwrap_or_default(),
            config.sendgrid_api_url.clone(),
        )),
        MailProvider::Ses => Arc::new(SesDispatcher::new(config.ses_configuration_set.clone()).await),
        MailProvider::Log => Arc::new(LogDispatcher),
    }
}

// =============================================================================
// LogDispatcher
// =============================================================================

/// Writes the message to tracing and reports it as accepted
pub struct LogDispatcher;

#[async_trait]
impl MailDispatch for LogDispatcher {
    async fn send(&self, email: &NotificationEmail) -> Result<DispatchReceipt, DispatchError> {
        info!(
            from = %email.from.formatted(),
            to = %email.to.formatted(),
            subject = %email.subject,
            "[LogDispatcher] Would send notification\n---TEXT---\n{}",
            email.text,
        );
        Ok(DispatchReceipt::accepted(202))
    }
}

// =============================================================================
// RecordingDispatcher
// =============================================================================

/// Captures sent messages and answers with a fixed outcome
pub struct RecordingDispatcher {
    outcome: Result<DispatchReceipt, DispatchError>,
    sent: Mutex<Vec<NotificationEmail>>,
}

impl RecordingDispatcher {
    /// Accept every message with `status`
    pub fn accepting(status: u16) -> Self {
        Self::with_outcome(Ok(DispatchReceipt::accepted(status)))
    }

    /// Reject every message with `error`
    pub fn failing(error: DispatchError) -> Self {
        Self::with_outcome(Err(error))
    }

    fn with_outcome(outcome: Result<DispatchReceipt, DispatchError>) -> Self {
        Self {
            outcome,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent_messages(&self) -> Vec<NotificationEmail> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    pub fn last_message(&self) -> Option<NotificationEmail> {
        self.sent_messages().pop()
    }
}

#[async_trait]
impl MailDispatch for RecordingDispatcher {
    async fn send(&self, email: &NotificationEmail) -> Result<DispatchReceipt, DispatchError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(email.clone());
        }
        self.outcome.clone()
    }
}
