//! AWS SES v2 backend
//!
//! Sends the notification as a simple (non-raw) SES message. SES has no
//! "accepted" status of its own, so a successful call is reported as 200.

use async_trait::async_trait;
use aws_sdk_sesv2::{
    error::ProvideErrorMetadata,
    types::{Body, Content, Destination, EmailContent, Message},
    Client as SesClient,
};
use tracing::{error, info, instrument};

use super::MailDispatch;
use crate::error::DispatchError;
use crate::types::{DispatchReceipt, NotificationEmail};

/// SES email sender
pub struct SesDispatcher {
    client: SesClient,
    configuration_set: Option<String>,
}

impl SesDispatcher {
    /// Create a sender from the default AWS credential chain
    pub async fn new(configuration_set: Option<String>) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::with_client(SesClient::new(&config), configuration_set)
    }

    pub fn with_client(client: SesClient, configuration_set: Option<String>) -> Self {
        Self {
            client,
            configuration_set,
        }
    }
}

fn utf8_content(data: &str) -> Result<Content, DispatchError> {
    Content::builder()
        .data(data)
        .charset("UTF-8")
        .build()
        .map_err(|e| DispatchError::new(None, format!("Failed to build email: {e}")))
}

/// Build the SES simple message from a notification
pub fn build_content(email: &NotificationEmail) -> Result<EmailContent, DispatchError> {
    let body = Body::builder()
        .text(utf8_content(&email.text)?)
        .html(utf8_content(&email.html)?)
        .build();

    let message = Message::builder()
        .subject(utf8_content(&email.subject)?)
        .body(body)
        .build();

    Ok(EmailContent::builder().simple(message).build())
}

#[async_trait]
impl MailDispatch for SesDispatcher {
    #[instrument(skip(self, email), fields(to = %email.to.email, subject = %email.subject))]
    async fn send(&self, email: &NotificationEmail) -> Result<DispatchReceipt, DispatchError> {
        let destination = Destination::builder()
            .to_addresses(email.to.formatted())
            .build();

        let mut request = self
            .client
            .send_email()
            .from_email_address(email.from.formatted())
            .destination(destination)
            .reply_to_addresses(email.reply_to.formatted())
            .content(build_content(email)?);

        if let Some(config_set) = &self.configuration_set {
            request = request.configuration_set_name(config_set);
        }

        let output = request.send().await.map_err(|e| {
            error!(error = %e, "SES send failed");
            let reason = e
                .as_service_error()
                .and_then(|se| se.message())
                .map(str::to_string)
                .unwrap_or_else(|| e.to_string());
            DispatchError::new(None, reason)
        })?;

        let message_id = output.message_id().map(str::to_string);
        info!(message_id = ?message_id, "Notification sent via SES");

        Ok(DispatchReceipt {
            status: 200,
            message_id,
        })
    }
}
