//! Form notification handler
//!
//! `OPTIONS` requests get the CORS preflight answer. Everything else is
//! treated as a submission: classified, rendered, dispatched, and reported
//! back as JSON or a redirect depending on the caller.

use std::sync::Arc;

use lambda_http::http::Method;
use lambda_http::{Body, Request, Response};
use tracing::{error, info, instrument, warn};

use crate::dispatch::MailDispatch;
use crate::error::SubmissionError;
use crate::render::render_message;
use crate::request::{caller_kind, classify};
use crate::response::{allow_any_origin, outcome_response, preflight, Outcome, RedirectTargets};
use crate::types::{DispatchReceipt, NotificationEmail, Submission};
use crate::NotifierConfig;

/// Stateless per request; cheap to clone into each invocation
#[derive(Clone)]
pub struct NotificationHandler {
    config: Arc<NotifierConfig>,
    dispatcher: Arc<dyn MailDispatch>,
}

impl NotificationHandler {
    pub fn new(config: NotifierConfig, dispatcher: Arc<dyn MailDispatch>) -> Self {
        Self {
            config: Arc::new(config),
            dispatcher,
        }
    }

    pub fn config(&self) -> &NotifierConfig {
        &self.config
    }

    /// Entry point for one invocation
    #[instrument(skip(self, event), fields(method = %event.method(), path = %event.uri().path()))]
    pub async fn handle(&self, event: Request) -> Result<Response<Body>, lambda_http::Error> {
        if event.method() == Method::OPTIONS {
            return preflight(event.headers(), self.config.cors_max_age);
        }

        let response = self.process(event).await?;
        Ok(allow_any_origin(response))
    }

    /// Submission processor: runs the submission and shapes the outcome
    async fn process(&self, event: Request) -> Result<Response<Body>, lambda_http::Error> {
        let caller = caller_kind(event.headers());

        let outcome = match self.submit(&event).await {
            Ok(receipt) => {
                info!(status = receipt.status, message_id = ?receipt.message_id, "Submission delivered");
                Outcome::success(receipt.status)
            }
            Err(e) if e.is_provider_failure() => {
                error!(error = %e, "Mail provider rejected submission");
                Outcome::failure(e.caller_message())
            }
            Err(e) => {
                warn!(error = %e, "Submission failed");
                Outcome::failure(e.caller_message())
            }
        };

        outcome_response(caller, &outcome, &self.redirect_targets())
    }

    async fn submit(&self, event: &Request) -> Result<DispatchReceipt, SubmissionError> {
        let submission = classify(event).await?.into_submission()?;
        let email = self.notification_for(&submission);
        Ok(self.dispatcher.send(&email).await?)
    }

    /// Render the notification email for a submission
    pub fn notification_for(&self, submission: &Submission) -> NotificationEmail {
        let rendered = render_message(
            &submission.labelled_fields(),
            &submission.referrer,
            submission.language,
        );

        NotificationEmail {
            from: self.config.sender(),
            to: self.config.recipient(),
            reply_to: self.config.reply_to(),
            subject: self.config.subject.clone(),
            text: rendered.text,
            html: rendered.html,
        }
    }

    fn redirect_targets(&self) -> RedirectTargets {
        RedirectTargets {
            submitted_url: self.config.submitted_url.clone(),
            error_url: self.config.error_url.clone(),
        }
    }
}
