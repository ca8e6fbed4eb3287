//! SendGrid v3 mail send client
//!
//! Posts to `https://api.sendgrid.com/v3/mail/send`. SendGrid answers
//! `202 Accepted` with an empty body on success; failures carry a JSON body
//! of the form `{"errors": [{"message": "...", "field": "...", "help": ...}]}`.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use super::MailDispatch;
use crate::error::DispatchError;
use crate::types::{DispatchReceipt, Mailbox, NotificationEmail};

/// Default SendGrid endpoint
pub const SENDGRID_API_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// SendGrid mail send payload
#[derive(Debug, Serialize)]
pub struct SendGridPayload<'a> {
    personalizations: Vec<Personalization<'a>>,
    from: &'a Mailbox,
    reply_to: &'a Mailbox,
    content: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    to: Vec<&'a Mailbox>,
    subject: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    content_type: &'static str,
    value: &'a str,
}

/// SendGrid error response
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    errors: Vec<ErrorItem>,
}

#[derive(Debug, Deserialize)]
struct ErrorItem {
    #[serde(default)]
    message: Option<String>,
}

impl<'a> SendGridPayload<'a> {
    pub fn from_email(email: &'a NotificationEmail) -> Self {
        Self {
            personalizations: vec![Personalization {
                to: vec![&email.to],
                subject: &email.subject,
            }],
            from: &email.from,
            reply_to: &email.reply_to,
            // text/plain must come first
            content: vec![
                Content {
                    content_type: "text/plain",
                    value: &email.text,
                },
                Content {
                    content_type: "text/html",
                    value: &email.html,
                },
            ],
        }
    }
}

/// Reason for a failed send: the first error message in the body, else the
/// status's canonical reason phrase
pub fn error_reason(status: StatusCode, body: &str) -> Option<String> {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|resp| resp.errors.into_iter().find_map(|e| e.message))
        .or_else(|| status.canonical_reason().map(str::to_string))
}

pub struct SendGridDispatcher {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
}

impl SendGridDispatcher {
    pub fn new(api_key: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            api_url: api_url.into(),
        }
    }
}

#[async_trait]
impl MailDispatch for SendGridDispatcher {
    #[instrument(skip(self, email), fields(to = %email.to.email, subject = %email.subject))]
    async fn send(&self, email: &NotificationEmail) -> Result<DispatchReceipt, DispatchError> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&SendGridPayload::from_email(email))
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "SendGrid request failed");
                DispatchError::new(e.status().map(|s| s.as_u16()), e.to_string())
            })?;

        let status = response.status();
        let message_id = response
            .headers()
            .get("x-message-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %body, "SendGrid rejected message");
            return Err(DispatchError {
                status: Some(status.as_u16()),
                reason: error_reason(status, &body),
            });
        }

        info!(status = status.as_u16(), message_id = ?message_id, "Notification sent via SendGrid");
        Ok(DispatchReceipt {
            status: status.as_u16(),
            message_id,
        })
    }
}
