//! Submission, message, and dispatch types

use serde::{Deserialize, Serialize};

/// Header set by in-page scripts (jQuery, fetch wrappers) on asynchronous calls
pub const REQUESTED_WITH_HEADER: &str = "x-requested-with";

/// Value of [`REQUESTED_WITH_HEADER`] that marks a script caller
pub const XML_HTTP_REQUEST: &str = "XMLHttpRequest";

/// Form field names shared by the JSON and form-encoded bodies
pub mod fields {
    pub const LANGUAGE: &str = "er-lang";
    pub const REFERRER: &str = "er-referrer";
    pub const NAME: &str = "er-name";
    pub const EMAIL: &str = "er-email";
}

/// Display language of the page the visitor signed up from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    Spanish,
}

impl Language {
    /// Resolve a language code; unknown codes are treated as unset
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "en" => Some(Language::English),
            "es" => Some(Language::Spanish),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Spanish => "Spanish",
        }
    }
}

/// One notification-list signup. Lives only for the request that carried it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub name: String,
    pub email: String,
    pub language: Option<Language>,
    pub referrer: String,
}

impl Submission {
    /// Labelled fields in the order they appear in the notification
    pub fn labelled_fields(&self) -> [(&'static str, &str); 2] {
        [("Name", self.name.as_str()), ("Email", self.email.as_str())]
    }
}

/// Who sent the request, which decides how the outcome is reported back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallerKind {
    /// In-page script; gets a JSON response
    Script,
    /// Native browser form post; gets redirected to a result page
    Browser,
}

/// Email address with an optional display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mailbox {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Mailbox {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }

    pub fn named(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: Some(name.into()),
        }
    }

    /// RFC 5322 style rendering, `Name <email>` or bare `email`
    pub fn formatted(&self) -> String {
        match &self.name {
            Some(name) => format!("{} <{}>", name, self.email),
            None => self.email.clone(),
        }
    }
}

/// Rendered notification ready to hand to a delivery backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEmail {
    pub from: Mailbox,
    pub to: Mailbox,
    pub reply_to: Mailbox,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Successful hand-off to the delivery provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReceipt {
    /// HTTP status the provider answered with (SendGrid: 202)
    pub status: u16,
    /// Provider-assigned message id, when the provider returns one
    pub message_id: Option<String>,
}

impl DispatchReceipt {
    pub fn accepted(status: u16) -> Self {
        Self {
            status,
            message_id: None,
        }
    }
}
