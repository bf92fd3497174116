//! Response builders shared by the HTTP-facing handlers.
//!
//! Every handler returns an API Gateway proxy envelope
//! `{"statusCode", "headers", "body": <JSON string>}`; these builders keep
//! that shape in one place.

use serde_json::{Value, json};

use crate::BackendError;

/// The permissive CORS set attached to every File Admin response.
#[must_use]
pub fn cors_headers() -> Value {
    json!({
        "Access-Control-Allow-Origin": "*",
        "Access-Control-Allow-Methods": "GET,POST,PUT,DELETE,OPTIONS",
        "Access-Control-Allow-Headers":
            "Content-Type,Authorization,X-Amz-Date,X-Api-Key,X-Amz-Security-Token",
        "Access-Control-Max-Age": "600",
    })
}

/// Proxy envelope with the full CORS set and a serialized JSON body.
#[must_use]
pub fn respond(status_code: u16, body: &Value) -> Value {
    json!({
        "statusCode": status_code,
        "headers": cors_headers(),
        "body": body.to_string(),
    })
}

/// Minimal JSON envelope used by the analytics endpoint.
#[must_use]
pub fn respond_json(status_code: u16, body: &Value) -> Value {
    json!({
        "statusCode": status_code,
        "headers": {
            "Content-Type": "application/json",
            "Access-Control-Allow-Origin": "*",
        },
        "body": body.to_string(),
    })
}

/// Error envelope: `{"error": message}` at the taxonomy's status code.
#[must_use]
pub fn err_response(status_code: u16, message: &str) -> Value {
    respond(status_code, &json!({ "error": message }))
}

/// Top-level adapter: maps any handler error into the error envelope so
/// nothing crosses the Lambda boundary unformatted.
#[must_use]
pub fn error_envelope(err: &BackendError) -> Value {
    err_response(err.status_code(), &err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn respond_serializes_body_as_string() {
        let out = respond(200, &json!({"message": "ok"}));
        assert_eq!(out["statusCode"], 200);
        assert_eq!(out["body"], "{\"message\":\"ok\"}");
        assert_eq!(out["headers"]["Access-Control-Allow-Origin"], "*");
    }

    #[test]
    fn error_envelope_uses_taxonomy_status() {
        let not_found = BackendError::NotFound("File \"x\" not found".into());
        let out = error_envelope(&not_found);
        assert_eq!(out["statusCode"], 404);
        let body: Value = serde_json::from_str(out["body"].as_str().unwrap()).unwrap();
        assert_eq!(body["error"], "File \"x\" not found");
    }
}
