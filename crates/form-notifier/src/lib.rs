//! Form Notifier Lambda - emails the site admin on every notification-list signup
//!
//! One HTTP endpoint, method-polymorphic:
//!
//! - `OPTIONS` answers the CORS preflight
//! - `POST` with `X-Requested-With: XMLHttpRequest` and a JSON body gets a
//!   JSON response
//! - `POST` with a multipart or url-encoded form body gets redirected to the
//!   "form submitted" or "form error" page
//!
//! Both body shapes carry `er-lang`, `er-referrer`, `er-name` and `er-email`.
//! The submission is rendered into a text + HTML notification and handed to a
//! transactional email provider (SendGrid by default, SES or a log sink via
//! `MAIL_PROVIDER`).
//!
//! ## Architecture
//!
//! ```text
//! Browser / page script → Function URL → Lambda (this) → SendGrid | SES → Admin inbox
//! ```
//!
//! ## Usage
//!
//! Deploy as an AWS Lambda function with an HTTP trigger.
//! See `main.rs` for the Lambda entry point.

pub mod dispatch;
pub mod error;
pub mod handler;
pub mod render;
pub mod request;
pub mod response;
pub mod types;

pub use dispatch::{LogDispatcher, MailDispatch, RecordingDispatcher, SendGridDispatcher, SesDispatcher};
pub use error::{ConfigError, DispatchError, SubmissionError};
pub use handler::NotificationHandler;
pub use request::RequestShape;
pub use types::{CallerKind, DispatchReceipt, Language, Mailbox, NotificationEmail, Submission};

use std::str::FromStr;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default log filter, added on top of `RUST_LOG`
pub const LOG_DIRECTIVE: &str = "form_notifier=info";

/// Which delivery backend sends the notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailProvider {
    SendGrid,
    Ses,
    Log,
}

impl FromStr for MailProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sendgrid" => Ok(MailProvider::SendGrid),
            "ses" => Ok(MailProvider::Ses),
            "log" => Ok(MailProvider::Log),
            _ => Err(ConfigError::UnknownProvider(s.to_string())),
        }
    }
}

/// Configuration for the notifier
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Delivery backend
    pub provider: MailProvider,

    /// SendGrid API key (required for the SendGrid backend)
    pub sendgrid_api_key: Option<String>,

    /// SendGrid mail send endpoint
    pub sendgrid_api_url: String,

    /// SES configuration set for tracking
    pub ses_configuration_set: Option<String>,

    pub from_email: String,
    pub from_name: String,
    pub to_email: String,
    pub reply_to: String,
    pub subject: String,

    /// Browser callers land here after a successful submission
    pub submitted_url: String,

    /// Browser callers land here after a failed submission
    pub error_url: String,

    /// Preflight cache lifetime in seconds
    pub cors_max_age: u32,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            provider: MailProvider::SendGrid,
            sendgrid_api_key: None,
            sendgrid_api_url: dispatch::sendgrid::SENDGRID_API_URL.to_string(),
            ses_configuration_set: None,
            from_email: "formsubmissions@firstgenfirst.org".to_string(),
            from_name: "FGF Form Submissions".to_string(),
            to_email: "christian@firstgenfirst.org".to_string(),
            reply_to: "info@firstgenfirst.org".to_string(),
            subject: "New Notification Subscription".to_string(),
            submitted_url: "https://firstgenfirst.org/formsubmitted".to_string(),
            error_url: "https://firstgenfirst.org/formerror".to_string(),
            cors_max_age: 3600,
        }
    }
}

impl NotifierConfig {
    /// Load from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any key/value source, falling back to defaults, then validate
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let or_default = |key: &str, default: String| lookup(key).unwrap_or(default);

        let provider = match lookup("MAIL_PROVIDER") {
            Some(value) => value.parse()?,
            None => defaults.provider,
        };

        let cors_max_age = match lookup("CORS_MAX_AGE") {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
                var: "CORS_MAX_AGE",
                value,
            })?,
            None => defaults.cors_max_age,
        };

        let config = Self {
            provider,
            sendgrid_api_key: lookup("SENDGRID_API_KEY").filter(|k| !k.is_empty()),
            sendgrid_api_url: or_default("SENDGRID_API_URL", defaults.sendgrid_api_url),
            ses_configuration_set: lookup("SES_CONFIGURATION_SET"),
            from_email: or_default("NOTIFY_FROM_EMAIL", defaults.from_email),
            from_name: or_default("NOTIFY_FROM_NAME", defaults.from_name),
            to_email: or_default("NOTIFY_TO_EMAIL", defaults.to_email),
            reply_to: or_default("NOTIFY_REPLY_TO", defaults.reply_to),
            subject: or_default("NOTIFY_SUBJECT", defaults.subject),
            submitted_url: or_default("FORM_SUBMITTED_URL", defaults.submitted_url),
            error_url: or_default("FORM_ERROR_URL", defaults.error_url),
            cors_max_age,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check the envelope addresses and provider credentials
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (var, value) in [
            ("NOTIFY_FROM_EMAIL", &self.from_email),
            ("NOTIFY_TO_EMAIL", &self.to_email),
            ("NOTIFY_REPLY_TO", &self.reply_to),
        ] {
            if !email_address::EmailAddress::is_valid(value) {
                return Err(ConfigError::InvalidAddress {
                    var,
                    value: value.clone(),
                });
            }
        }

        if self.provider == MailProvider::SendGrid && self.sendgrid_api_key.is_none() {
            return Err(ConfigError::Missing("SENDGRID_API_KEY"));
        }

        Ok(())
    }

    pub fn sender(&self) -> Mailbox {
        Mailbox::named(&self.from_email, &self.from_name)
    }

    pub fn recipient(&self) -> Mailbox {
        Mailbox::new(&self.to_email)
    }

    pub fn reply_to(&self) -> Mailbox {
        Mailbox::new(&self.reply_to)
    }
}
