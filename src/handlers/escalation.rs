//! Escalation Notifier: Bedrock action-group handler that emails an admin
//! when the agent could not answer a question.
//!
//! The agent framework invokes this in one of two envelope modes
//! (function-details or OpenAPI schema) and expects the matching wrapper
//! back regardless of whether the notification email went out; the send
//! outcome only changes the embedded state/status fields.

use aws_sdk_ses::Client as SesClient;
use aws_sdk_ses::types::{Body, Content, Destination, Message};
use lambda_runtime::{Error, LambdaEvent};
use serde_json::{Value, json};
use tracing::{error, info};

use crate::config::EscalationConfig;
use crate::errors::BackendError;
use crate::utils::time;

const PLACEHOLDER_EMAIL: &str = "<unknown>";
const PLACEHOLDER_QUESTION: &str = "<no question>";
const PLACEHOLDER_RESPONSE: &str = "<no agent response>";

pub struct EscalationState {
    pub config: EscalationConfig,
    pub ses: SesClient,
}

impl EscalationState {
    pub async fn new() -> Result<Self, Error> {
        let config = EscalationConfig::from_env().map_err(Error::from)?;
        let shared = aws_config::load_from_env().await;
        Ok(Self {
            config,
            ses: SesClient::new(&shared),
        })
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct EscalationFields {
    pub email: String,
    pub querytext: String,
    pub agent_response: String,
}

/// Pulls the requester email, original question, and agent response out of
/// the invocation. The flat `parameters` list is scanned first; any field
/// still missing is looked up in the per-content-type `requestBody`
/// property lists. Names match case-insensitively, and anything left unset
/// gets a fixed placeholder.
#[must_use]
pub fn extract_fields(event: &Value) -> EscalationFields {
    let mut email: Option<String> = None;
    let mut querytext: Option<String> = None;
    let mut agent_response: Option<String> = None;

    let mut absorb = |name: &str, value: Option<&str>| {
        let Some(value) = value else { return };
        match name {
            "email" if email.is_none() => email = Some(value.to_string()),
            "querytext" | "question" | "inputtext" if querytext.is_none() => {
                querytext = Some(value.to_string());
            }
            "agentresponse" | "response" if agent_response.is_none() => {
                agent_response = Some(value.to_string());
            }
            _ => {}
        }
    };

    for param in event.get("parameters").and_then(Value::as_array).into_iter().flatten() {
        let name = param
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_lowercase();
        absorb(&name, param.get("value").and_then(Value::as_str));
    }

    if let Some(content) = event.pointer("/requestBody/content").and_then(Value::as_object) {
        for body in content.values() {
            for prop in body.get("properties").and_then(Value::as_array).into_iter().flatten() {
                let name = prop
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_lowercase();
                absorb(&name, prop.get("value").and_then(Value::as_str));
            }
        }
    }

    EscalationFields {
        email: email.unwrap_or_else(|| PLACEHOLDER_EMAIL.to_string()),
        querytext: querytext.unwrap_or_else(|| PLACEHOLDER_QUESTION.to_string()),
        agent_response: agent_response.unwrap_or_else(|| PLACEHOLDER_RESPONSE.to_string()),
    }
}

/// Assembles the agent-framework wrapper for whichever invocation mode the
/// event used. Function mode carries `responseState: "FAILURE"` only when
/// the email send failed; OpenAPI mode maps the outcome to an HTTP-style
/// status code instead.
#[must_use]
pub fn build_response(event: &Value, result_msg: &str, send_failed: bool) -> Value {
    let action_group = event.get("actionGroup").cloned().unwrap_or(Value::Null);
    let session_attrs = event
        .get("sessionAttributes")
        .cloned()
        .unwrap_or_else(|| json!({}));
    let prompt_attrs = event
        .get("promptSessionAttributes")
        .cloned()
        .unwrap_or_else(|| json!({}));

    let response = if let Some(function) = event.get("function") {
        let mut function_response = json!({
            "responseBody": { "TEXT": { "body": result_msg } }
        });
        if send_failed {
            function_response["responseState"] = json!("FAILURE");
        }
        json!({
            "actionGroup": action_group,
            "function": function,
            "functionResponse": function_response,
        })
    } else {
        json!({
            "actionGroup": action_group,
            "apiPath": event.get("apiPath").and_then(Value::as_str).unwrap_or(""),
            "httpMethod": event.get("httpMethod").and_then(Value::as_str).unwrap_or(""),
            "httpStatusCode": if send_failed { 500 } else { 200 },
            "responseBody": {
                "application/json": {
                    "body": json!({ "message": result_msg }).to_string()
                }
            },
        })
    };

    json!({
        "messageVersion": "1.0",
        "response": response,
        "sessionAttributes": session_attrs,
        "promptSessionAttributes": prompt_attrs,
    })
}

#[tracing::instrument(level = "info", skip(state, event))]
pub async fn handler(state: &EscalationState, event: LambdaEvent<Value>) -> Result<Value, Error> {
    let fields = extract_fields(&event.payload);
    info!(
        email = %fields.email,
        querytext = %fields.querytext,
        "Escalation request parsed"
    );

    let (result_msg, send_failed) = match notify_admin(state, &fields).await {
        Ok(()) => ("Admin has been notified successfully.".to_string(), false),
        Err(err) => {
            error!(error = %err, "SES send failed");
            (format!("Failed to notify admin: {err}"), true)
        }
    };

    Ok(build_response(&event.payload, &result_msg, send_failed))
}

/// Plain-text notification body. The indentation, bullets, and the curly
/// apostrophe are part of the admin-facing template.
#[must_use]
pub fn email_body(fields: &EscalationFields, timestamp: &str) -> String {
    format!(
        "Hello Admin,\n\n\
         A user needs assistance with this question:\n\n\
         \x20 \u{2022} User Email: {}\n\
         \x20 \u{2022} Original Question: {}\n\
         \x20 \u{2022} Agent\u{2019}s Response: {}\n\n\
         Timestamp: {}\n\n\
         Thanks,\nBlueberry BOT",
        fields.email, fields.querytext, fields.agent_response, timestamp,
    )
}

async fn notify_admin(
    state: &EscalationState,
    fields: &EscalationFields,
) -> Result<(), BackendError> {
    let body_text = email_body(fields, &time::utc_now_iso_z());

    let build_err = |e: aws_sdk_ses::error::BuildError| BackendError::Upstream(e.to_string());
    let subject = Content::builder()
        .data("Agent Assistance Requested")
        .build()
        .map_err(build_err)?;
    let text = Content::builder().data(body_text).build().map_err(build_err)?;
    let message = Message::builder()
        .subject(subject)
        .body(Body::builder().text(text).build())
        .build();

    info!(admin = %state.config.admin_email, "Sending escalation email");
    state
        .ses
        .send_email()
        .source(&state.config.verified_source_email)
        .destination(
            Destination::builder()
                .to_addresses(&state.config.admin_email)
                .build(),
        )
        .message(message)
        .send()
        .await?;
    Ok(())
}
