//! End-to-end tests for the notification handler
//!
//! Drives `NotificationHandler` with lambda_http requests and a recording
//! dispatcher in place of the mail provider.

use std::sync::Arc;

use form_notifier::{
    DispatchError, Language, NotificationHandler, NotifierConfig, RecordingDispatcher,
};
use lambda_http::http::{header, StatusCode};
use lambda_http::{Body, Request, Response};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

const SUBMITTED_URL: &str = "https://firstgenfirst.org/formsubmitted";
const ERROR_URL: &str = "https://firstgenfirst.org/formerror";

// ============================================================
// Helpers
// ============================================================

fn handler_with(dispatcher: RecordingDispatcher) -> (NotificationHandler, Arc<RecordingDispatcher>) {
    let dispatcher = Arc::new(dispatcher);
    let handler = NotificationHandler::new(NotifierConfig::default(), dispatcher.clone());
    (handler, dispatcher)
}

fn accepting() -> (NotificationHandler, Arc<RecordingDispatcher>) {
    handler_with(RecordingDispatcher::accepting(202))
}

fn rejecting(reason: &str) -> (NotificationHandler, Arc<RecordingDispatcher>) {
    handler_with(RecordingDispatcher::failing(DispatchError::new(
        Some(400),
        reason,
    )))
}

fn post(content_type: &str, script: bool, body: &str) -> Request {
    let mut builder = lambda_http::http::Request::builder()
        .method("POST")
        .uri("/notification-signup")
        .header(header::CONTENT_TYPE, content_type);
    if script {
        builder = builder.header("X-Requested-With", "XMLHttpRequest");
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn script_json(body: Value) -> Request {
    post("application/json", true, &body.to_string())
}

fn browser_form(body: &str) -> Request {
    post("application/x-www-form-urlencoded", false, body)
}

fn signup_json() -> Value {
    json!({
        "er-lang": "en",
        "er-referrer": "https://firstgenfirst.org/",
        "er-name": "Ada Lovelace",
        "er-email": "ada@example.com"
    })
}

const SIGNUP_FORM: &str =
    "er-lang=es&er-referrer=https%3A%2F%2Ffirstgenfirst.org%2Fes&er-name=Ana&er-email=ana%40example.com";

fn json_body(response: &Response<Body>) -> Value {
    serde_json::from_slice(response.body().as_ref()).unwrap()
}

fn location(response: &Response<Body>) -> String {
    response.headers()[header::LOCATION]
        .to_str()
        .unwrap()
        .to_string()
}

fn allows_any_origin(response: &Response<Body>) -> bool {
    response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_some_and(|v| v == "*")
}

// ============================================================
// Success
// ============================================================

#[tokio::test]
async fn script_success_returns_provider_status_as_json() {
    let (handler, dispatcher) = accepting();

    let response = handler.handle(script_json(signup_json())).await.unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    assert_eq!(json_body(&response), json!({"status": 202}));
    assert!(allows_any_origin(&response));

    let sent = dispatcher.last_message().unwrap();
    assert!(sent.text.contains("\nName: Ada Lovelace"));
    assert!(sent.text.contains("\nEmail: ada@example.com"));
    assert!(sent.text.ends_with("This form was submitted from https://firstgenfirst.org/."));
    assert!(sent.html.contains("(Language: English)"));
}

#[tokio::test]
async fn browser_success_redirects_to_submitted_page() {
    let (handler, dispatcher) = accepting();

    let response = handler.handle(browser_form(SIGNUP_FORM)).await.unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), format!("{SUBMITTED_URL}?status=202"));
    assert!(allows_any_origin(&response));

    let sent = dispatcher.last_message().unwrap();
    assert!(sent.text.contains("\nName: Ana"));
    assert!(sent.html.contains("(Language: Spanish)"));
    assert!(sent.html.contains("https://firstgenfirst.org/es"));
}

#[tokio::test]
async fn multipart_form_is_accepted() {
    let (handler, dispatcher) = accepting();
    let body = "--b\r\nContent-Disposition: form-data; name=\"er-lang\"\r\n\r\nen\r\n\
                --b\r\nContent-Disposition: form-data; name=\"er-referrer\"\r\n\r\nhttps://firstgenfirst.org/\r\n\
                --b\r\nContent-Disposition: form-data; name=\"er-name\"\r\n\r\nGrace\r\n\
                --b\r\nContent-Disposition: form-data; name=\"er-email\"\r\n\r\ngrace@example.com\r\n\
                --b--\r\n";

    let response = handler
        .handle(post("multipart/form-data; boundary=b", false, body))
        .await
        .unwrap();

    assert_eq!(location(&response), format!("{SUBMITTED_URL}?status=202"));
    assert!(dispatcher.last_message().unwrap().text.contains("\nName: Grace"));
}

#[tokio::test]
async fn latin1_form_post_is_delivered() {
    let (handler, dispatcher) = accepting();
    let body = "er-lang=es&er-referrer=&er-name=Jos%E9&er-email=jose%2Btag%40example.com";

    let response = handler.handle(browser_form(body)).await.unwrap();

    assert_eq!(location(&response), format!("{SUBMITTED_URL}?status=202"));
    let sent = dispatcher.last_message().unwrap();
    assert!(sent.text.contains("\nName: Jos\u{FFFD}"));
    assert!(sent.text.contains("\nEmail: jose+tag@example.com"));
}

#[tokio::test]
async fn script_caller_posting_a_form_gets_json() {
    let (handler, _) = accepting();

    let response = handler
        .handle(post("application/x-www-form-urlencoded", true, SIGNUP_FORM))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(json_body(&response), json!({"status": 202}));
}

// ============================================================
// Provider failures
// ============================================================

#[tokio::test]
async fn script_provider_failure_reports_reason() {
    let (handler, _) = rejecting("Invalid To address");

    let response = handler.handle(script_json(signup_json())).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(&response),
        json!({"status": 500, "message": "Invalid To address"})
    );
    assert!(allows_any_origin(&response));
}

#[tokio::test]
async fn browser_provider_failure_redirects_to_error_page() {
    let (handler, _) = rejecting("Invalid To address");

    let response = handler.handle(browser_form(SIGNUP_FORM)).await.unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        location(&response),
        format!("{ERROR_URL}?status=500&message=Invalid+To+address")
    );
}

// ============================================================
// Unexpected failures
// ============================================================

#[tokio::test]
async fn unsupported_content_type_fails_for_both_callers() {
    let (handler, dispatcher) = accepting();

    let response = handler
        .handle(post("text/plain", true, "hello"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(&response),
        json!({"status": 500, "message": "Mismatched mimetype: text/plain"})
    );

    let response = handler
        .handle(post("text/plain", false, "hello"))
        .await
        .unwrap();
    assert_eq!(
        location(&response),
        format!("{ERROR_URL}?status=500&message=Mismatched+mimetype%3A+text%2Fplain")
    );

    assert!(dispatcher.sent_messages().is_empty());
}

#[tokio::test]
async fn json_from_browser_is_rejected() {
    let (handler, dispatcher) = accepting();

    let response = handler
        .handle(post("application/json", false, &signup_json().to_string()))
        .await
        .unwrap();

    assert!(location(&response).starts_with(&format!("{ERROR_URL}?status=500&message=Mismatched+mimetype")));
    assert!(dispatcher.sent_messages().is_empty());
}

#[tokio::test]
async fn missing_field_is_an_unexpected_failure() {
    let (handler, dispatcher) = accepting();

    let mut body = signup_json();
    body.as_object_mut().unwrap().remove("er-email");
    let response = handler.handle(script_json(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(&response),
        json!({"status": 500, "message": "Missing required field: er-email"})
    );
    assert!(dispatcher.sent_messages().is_empty());
}

#[tokio::test]
async fn malformed_json_is_an_unexpected_failure() {
    let (handler, _) = accepting();

    let response = handler
        .handle(post("application/json", true, "{not json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let message = json_body(&response)["message"].as_str().unwrap().to_string();
    assert!(message.starts_with("Invalid JSON body"));
}

// ============================================================
// Field handling
// ============================================================

#[tokio::test]
async fn empty_values_render_placeholders() {
    let (handler, dispatcher) = accepting();

    let body = json!({"er-lang": "", "er-referrer": "", "er-name": "", "er-email": ""});
    handler.handle(script_json(body)).await.unwrap();

    let sent = dispatcher.last_message().unwrap();
    assert!(sent.text.contains("\nName: [no value]"));
    assert!(sent.text.contains("\nEmail: [no value]"));
    assert!(sent.text.ends_with("This form was submitted from [unknown]."));
    assert!(sent.html.contains("[<span style='font-style:italic'>no value</span>]"));
    assert!(sent.html.contains("(Language: [<span style='font-style:italic'>unset</span>])"));
}

#[tokio::test]
async fn referrer_falls_back_to_request_header() {
    let (handler, dispatcher) = accepting();

    let mut body = signup_json();
    body["er-referrer"] = json!("");
    let mut request = script_json(body);
    request.headers_mut().insert(
        header::REFERER,
        "https://firstgenfirst.org/signup".parse().unwrap(),
    );
    handler.handle(request).await.unwrap();

    let sent = dispatcher.last_message().unwrap();
    assert!(sent.text.ends_with("This form was submitted from https://firstgenfirst.org/signup."));
}

#[tokio::test]
async fn markup_in_fields_is_escaped() {
    let (handler, dispatcher) = accepting();

    let mut body = signup_json();
    body["er-name"] = json!("<b>Mallory</b> & co");
    handler.handle(script_json(body)).await.unwrap();

    let sent = dispatcher.last_message().unwrap();
    assert!(sent.html.contains("&lt;b&gt;Mallory&lt;/b&gt; &amp; co"));
    assert!(!sent.html.contains("<b>Mallory</b>"));
    // The text body is plain text and carries the value unchanged
    assert!(sent.text.contains("\nName: <b>Mallory</b> & co"));
}

#[tokio::test]
async fn envelope_comes_from_config() {
    let (handler, dispatcher) = accepting();
    handler.handle(script_json(signup_json())).await.unwrap();

    let sent = dispatcher.last_message().unwrap();
    assert_eq!(sent.from.email, "formsubmissions@firstgenfirst.org");
    assert_eq!(sent.to.email, "christian@firstgenfirst.org");
    assert_eq!(sent.reply_to.email, "info@firstgenfirst.org");
    assert_eq!(sent.subject, "New Notification Subscription");
}

// ============================================================
// CORS
// ============================================================

#[tokio::test]
async fn preflight_echoes_requested_headers() {
    let (handler, dispatcher) = accepting();
    let request = lambda_http::http::Request::builder()
        .method("OPTIONS")
        .uri("/notification-signup")
        .header("Access-Control-Request-Headers", "content-type,x-requested-with")
        .body(Body::Empty)
        .unwrap();

    let response = handler.handle(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "GET,POST");
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
        "content-type,x-requested-with"
    );
    assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "3600");
    assert!(dispatcher.sent_messages().is_empty());
}

#[test]
fn language_labels() {
    assert_eq!(Language::from_code("en").map(Language::label), Some("English"));
    assert_eq!(Language::from_code("es").map(Language::label), Some("Spanish"));
    assert_eq!(Language::from_code("de"), None);
}
