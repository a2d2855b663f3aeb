//! Upstream HTTP error classification

use serde_json::Value;

use crate::error::RelayError;

/// Classify a non-success upstream response from its status and body.
///
/// OpenAI-compatible APIs return `{ "error": { "message", "type", "code" } }`;
/// bodies that do not match that envelope fall back to the status alone.
pub fn classify_http_error(status: u16, body_text: &str) -> RelayError {
    if let Some(err) = classify_openai_envelope(status, body_text) {
        return err;
    }

    let message = if body_text.trim().is_empty() {
        format!("upstream returned HTTP {status}")
    } else {
        format!("upstream returned HTTP {status}: {}", body_text.trim())
    };

    match status {
        401 | 403 => RelayError::AuthenticationError(message),
        429 => RelayError::RateLimitError(message),
        408 | 504 => RelayError::TimeoutError(message),
        _ => RelayError::ApiError {
            code: status,
            message,
            details: None,
        },
    }
}

fn classify_openai_envelope(status: u16, body_text: &str) -> Option<RelayError> {
    let json: Value = serde_json::from_str(body_text).ok()?;
    let error = json.get("error")?;

    // Some compatible providers send a bare string instead of an object.
    let (message, error_type) = match error {
        Value::String(s) => (s.clone(), None),
        Value::Object(obj) => (
            obj.get("message")
                .and_then(|v| v.as_str())
                .unwrap_or("Unknown error")
                .to_string(),
            obj.get("type").and_then(|v| v.as_str()),
        ),
        _ => return None,
    };

    let mapped = match error_type.unwrap_or("") {
        "authentication_error" => RelayError::AuthenticationError(message),
        "rate_limit_error" => RelayError::RateLimitError(message),
        "insufficient_quota" => RelayError::QuotaExceededError(message),
        _ => map_message_heuristics(status, message, json.clone()),
    };

    Some(mapped)
}

fn map_message_heuristics(status: u16, message: String, details: Value) -> RelayError {
    let lower = message.to_lowercase();

    if status == 401 || status == 403 || lower.contains("api key") {
        return RelayError::AuthenticationError(message);
    }

    if lower.contains("quota") {
        return RelayError::QuotaExceededError(message);
    }

    if status == 429 || lower.contains("rate limit") {
        return RelayError::RateLimitError(message);
    }

    RelayError::ApiError {
        code: status,
        message,
        details: Some(details),
    }
}
