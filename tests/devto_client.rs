use blogsync::devto::{curl_command, error_from_body, DevtoClient};
use blogsync_core::error::ApiError;

#[test]
fn test_error_from_json_body() {
    let err = error_from_body(429, r#"{"error":"Rate limit reached, try again in 30 seconds","status":429}"#);
    assert!(err.is_rate_limited());
    assert_eq!(
        err.to_string(),
        "Rate limit reached, try again in 30 seconds (HTTP 429)"
    );
}

#[test]
fn test_error_from_raw_body() {
    let err = error_from_body(502, "  Bad gateway\n");
    assert!(matches!(err, ApiError::Status { status: 502, ref message } if message == "Bad gateway"));
}

#[test]
fn test_error_from_empty_body_uses_reason() {
    let err = error_from_body(404, "");
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Not Found (HTTP 404)");
}

#[test]
fn test_curl_command_redacts_key_and_quotes_body() {
    let cmd = curl_command(
        "PUT",
        "https://dev.to/api/articles/1",
        Some(r#"{"article":{"body_markdown":"it's"}}"#),
    );
    assert_eq!(
        cmd,
        "curl -X PUT 'https://dev.to/api/articles/1' -H 'Api-Key: <redacted>' \
         -H 'Accept: application/json' -H 'Content-Type: application/json' \
         -d '{\"article\":{\"body_markdown\":\"it'\\''s\"}}'"
    );
}

#[test]
fn test_client_builds() {
    assert!(DevtoClient::new("https://dev.to/", "key".to_string()).is_ok());
}
