//! Request classification and field extraction
//!
//! A request is classified once, on entry, into a [`RequestShape`]. The rest
//! of the handler never looks at the content type again.

use std::collections::HashMap;
use std::convert::Infallible;

use lambda_http::http::{header, HeaderMap};
use lambda_http::Request;
use serde_json::Value;
use tracing::debug;

use crate::error::SubmissionError;
use crate::types::{fields, CallerKind, Language, Submission, REQUESTED_WITH_HEADER, XML_HTTP_REQUEST};

/// Body kinds the handler can parse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Json,
    Multipart,
    UrlEncoded,
    Other,
}

/// Request classified by caller and body, with fields already extracted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestShape {
    /// Script caller posting JSON
    ScriptJson(Submission),
    /// Multipart or url-encoded form post
    BrowserForm(Submission),
    /// Anything else; carries the media type that was rejected
    Unsupported { media_type: String },
}

impl RequestShape {
    /// The submission, or the mismatched-mimetype error for rejected shapes
    pub fn into_submission(self) -> Result<Submission, SubmissionError> {
        match self {
            RequestShape::ScriptJson(submission) | RequestShape::BrowserForm(submission) => {
                Ok(submission)
            }
            RequestShape::Unsupported { media_type } => {
                Err(SubmissionError::MismatchedMimetype(media_type))
            }
        }
    }
}

/// Caller kind from the `X-Requested-With` header
pub fn caller_kind(headers: &HeaderMap) -> CallerKind {
    let is_script = headers
        .get(REQUESTED_WITH_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == XML_HTTP_REQUEST);

    if is_script {
        CallerKind::Script
    } else {
        CallerKind::Browser
    }
}

/// Content-Type without parameters, lowercased. Empty when absent.
pub fn media_type(headers: &HeaderMap) -> String {
    content_type(headers)
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn content_type(headers: &HeaderMap) -> &str {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

pub fn body_kind(media_type: &str) -> BodyKind {
    match media_type {
        "application/json" => BodyKind::Json,
        "multipart/form-data" => BodyKind::Multipart,
        "application/x-www-form-urlencoded" => BodyKind::UrlEncoded,
        other if other.starts_with("application/") && other.ends_with("+json") => BodyKind::Json,
        _ => BodyKind::Other,
    }
}

/// Classify a request and pull the submission out of its body
pub async fn classify(request: &Request) -> Result<RequestShape, SubmissionError> {
    let headers = request.headers();
    let caller = caller_kind(headers);
    let media_type = media_type(headers);
    let body: &[u8] = request.body().as_ref();

    debug!(?caller, media_type = %media_type, body_len = body.len(), "Classifying request");

    let shape = match (caller, body_kind(&media_type)) {
        (CallerKind::Script, BodyKind::Json) => {
            RequestShape::ScriptJson(submission_from(&json_fields(body)?, headers)?)
        }
        (_, BodyKind::Multipart) => {
            let fields = multipart_fields(content_type(headers), body.to_vec()).await?;
            RequestShape::BrowserForm(submission_from(&fields, headers)?)
        }
        (_, BodyKind::UrlEncoded) => {
            RequestShape::BrowserForm(submission_from(&urlencoded_fields(body), headers)?)
        }
        _ => RequestShape::Unsupported { media_type },
    };

    Ok(shape)
}

type FieldMap = HashMap<String, String>;

fn submission_from(values: &FieldMap, headers: &HeaderMap) -> Result<Submission, SubmissionError> {
    let lookup = |key: &'static str| {
        values
            .get(key)
            .cloned()
            .ok_or(SubmissionError::MissingField(key))
    };

    let language = lookup(fields::LANGUAGE)?;
    let referrer = lookup(fields::REFERRER)?;
    let name = lookup(fields::NAME)?;
    let email = lookup(fields::EMAIL)?;

    let referrer = if referrer.is_empty() {
        headers
            .get(header::REFERER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    } else {
        referrer
    };

    Ok(Submission {
        name,
        email,
        language: Language::from_code(&language),
        referrer,
    })
}

/// Top-level JSON object as field map. Strings are kept as-is, `null` is
/// empty, other values use their JSON text.
pub fn json_fields(body: &[u8]) -> Result<FieldMap, SubmissionError> {
    let object: serde_json::Map<String, Value> = serde_json::from_slice(body)?;

    Ok(object
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (key, value)
        })
        .collect())
}

/// `application/x-www-form-urlencoded` body as field map; first occurrence wins.
/// Invalid UTF-8 in a percent-escape decodes to U+FFFD instead of failing.
pub fn urlencoded_fields(body: &[u8]) -> FieldMap {
    let mut fields = FieldMap::new();
    for (key, value) in form_urlencoded::parse(body) {
        fields.entry(key.into_owned()).or_insert_with(|| value.into_owned());
    }
    fields
}

/// `multipart/form-data` body as field map; first occurrence wins
pub async fn multipart_fields(content_type: &str, body: Vec<u8>) -> Result<FieldMap, SubmissionError> {
    let boundary = multer::parse_boundary(content_type)
        .map_err(|e| SubmissionError::InvalidForm(e.to_string()))?;
    let stream = futures::stream::once(async move { Ok::<_, Infallible>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut fields = FieldMap::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| SubmissionError::InvalidForm(e.to_string()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let value = field
            .text()
            .await
            .map_err(|e| SubmissionError::InvalidForm(e.to_string()))?;
        fields.entry(name).or_insert(value);
    }
    Ok(fields)
}
