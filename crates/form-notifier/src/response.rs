//! Response shaping
//!
//! Script callers get JSON, browser form posts get redirected to a result
//! page with the same information in the query string.

use lambda_http::http::{header, HeaderMap, HeaderValue, StatusCode};
use lambda_http::{Body, Response};
use serde::Serialize;

use crate::types::CallerKind;

/// Result of one submission, as reported back to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Outcome {
    pub fn success(status: u16) -> Self {
        Self {
            status,
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.message.is_none()
    }

    /// Form-encoded query string, `status=500&message=Invalid+To+address`
    pub fn query_string(&self) -> String {
        let mut query = format!("status={}", self.status);
        if let Some(message) = &self.message {
            query.push_str("&message=");
            query.push_str(&encode_query_value(message));
        }
        query
    }
}

/// Percent-encode for a query value, with spaces as `+`
pub fn encode_query_value(value: &str) -> String {
    urlencoding::encode(value).replace("%20", "+")
}

/// Where browser callers are sent after a submission
#[derive(Debug, Clone)]
pub struct RedirectTargets {
    pub submitted_url: String,
    pub error_url: String,
}

/// Build the caller-facing response for an outcome
pub fn outcome_response(
    caller: CallerKind,
    outcome: &Outcome,
    targets: &RedirectTargets,
) -> Result<Response<Body>, lambda_http::Error> {
    match caller {
        CallerKind::Script => json_response(outcome),
        CallerKind::Browser => {
            let base = if outcome.is_success() {
                &targets.submitted_url
            } else {
                &targets.error_url
            };
            redirect(&format!("{base}?{}", outcome.query_string()))
        }
    }
}

/// JSON response whose HTTP status mirrors the outcome's status
pub fn json_response(outcome: &Outcome) -> Result<Response<Body>, lambda_http::Error> {
    let status = StatusCode::from_u16(outcome.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    Ok(Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(outcome)?))?)
}

/// 302 redirect to `location`
pub fn redirect(location: &str) -> Result<Response<Body>, lambda_http::Error> {
    Ok(Response::builder()
        .status(StatusCode::FOUND)
        .header(header::LOCATION, location)
        .body(Body::Empty)?)
}

/// CORS preflight answer. Allowed headers are echoed from the request.
pub fn preflight(request_headers: &HeaderMap, max_age: u32) -> Result<Response<Body>, lambda_http::Error> {
    let mut builder = Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .header(header::ACCESS_CONTROL_ALLOW_METHODS, "GET,POST")
        .header(header::ACCESS_CONTROL_MAX_AGE, max_age.to_string());

    if let Some(requested) = request_headers.get(header::ACCESS_CONTROL_REQUEST_HEADERS) {
        builder = builder.header(header::ACCESS_CONTROL_ALLOW_HEADERS, requested.clone());
    }

    Ok(builder.body(Body::Empty)?)
}

/// Open the response to any origin
pub fn allow_any_origin(mut response: Response<Body>) -> Response<Body> {
    response.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    response
}
