//! Conversational Agent Bridge: forwards a user query to the Bedrock
//! agent, collects the streamed answer, pushes it over the caller's
//! WebSocket connection, and hands the exchange off to the classifier.
//!
//! The agent call gets two attempts total with no backoff; everything past
//! that propagates to the outer adapter, which reports a 500 and pushes an
//! error payload over the connection when one was supplied.

use aws_sdk_apigatewaymanagement::Client as ApiGwClient;
use aws_sdk_apigatewaymanagement::primitives::Blob as WsBlob;
use aws_sdk_bedrockagentruntime::Client as AgentRuntimeClient;
use aws_sdk_bedrockagentruntime::types::ResponseStream;
use aws_sdk_lambda::Client as LambdaClient;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::InvocationType;
use lambda_runtime::{Error, LambdaEvent};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio_retry::Retry;
use tokio_retry::strategy::FixedInterval;
use tracing::{error, info};

use crate::config::AgentBridgeConfig;
use crate::errors::BackendError;
use crate::utils::time;

/// Connection ids carrying this prefix come from integration tests; they
/// are never pushed to, but the exchange still reaches the classifier.
const MOCK_CONNECTION_PREFIX: &str = "mock-";

pub struct AgentBridgeState {
    pub config: AgentBridgeConfig,
    pub agent_runtime: AgentRuntimeClient,
    pub api_gateway: ApiGwClient,
    pub lambda: LambdaClient,
}

impl AgentBridgeState {
    pub async fn new() -> Result<Self, Error> {
        let config = AgentBridgeConfig::from_env().map_err(Error::from)?;
        let shared = aws_config::load_from_env().await;
        let api_gateway_conf = aws_sdk_apigatewaymanagement::config::Builder::from(&shared)
            .endpoint_url(&config.ws_api_endpoint)
            .build();
        Ok(Self {
            agent_runtime: AgentRuntimeClient::new(&shared),
            api_gateway: ApiGwClient::from_conf(api_gateway_conf),
            lambda: LambdaClient::new(&shared),
            config,
        })
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct BridgeEvent {
    #[serde(default)]
    pub querytext: String,
    #[serde(rename = "connectionId")]
    pub connection_id: Option<String>,
    pub session_id: Option<String>,
    pub location: Option<String>,
}

#[must_use]
pub fn is_mock_connection(connection_id: &str) -> bool {
    connection_id.starts_with(MOCK_CONNECTION_PREFIX)
}

/// Pushes a JSON payload over the duplex connection. Push failures are
/// logged and swallowed; mock connection ids are skipped entirely.
pub async fn send_ws_response(client: &ApiGwClient, connection_id: &str, payload: &Value) {
    if is_mock_connection(connection_id) {
        info!(connection_id = %connection_id, "Skipping WebSocket send for mock connection");
        return;
    }
    info!(connection_id = %connection_id, "Pushing response over WebSocket");
    if let Err(err) = client
        .post_to_connection()
        .connection_id(connection_id)
        .data(WsBlob::new(payload.to_string()))
        .send()
        .await
    {
        error!(error = %err, "WebSocket push failed");
    }
}

#[tracing::instrument(level = "info", skip(state, event))]
pub async fn handler(state: &AgentBridgeState, event: LambdaEvent<Value>) -> Result<Value, Error> {
    let request: BridgeEvent = serde_json::from_value(event.payload).unwrap_or_default();
    let query = request.querytext.trim().to_string();
    let session_id = request
        .session_id
        .clone()
        .unwrap_or_else(|| event.context.request_id.clone());
    info!(
        session_id = %session_id,
        location = ?request.location,
        query = %query,
        "Received query"
    );

    match answer_query(state, &request, &session_id, &query).await {
        Ok(result) => Ok(json!({ "statusCode": 200, "body": result.to_string() })),
        Err(err) => {
            error!(error = %err, "Agent bridge failed");
            let error_body = json!({ "error": err.to_string() });
            if let Some(connection_id) = &request.connection_id {
                send_ws_response(&state.api_gateway, connection_id, &error_body).await;
            }
            Ok(json!({ "statusCode": 500, "body": error_body.to_string() }))
        }
    }
}

async fn answer_query(
    state: &AgentBridgeState,
    request: &BridgeEvent,
    session_id: &str,
    query: &str,
) -> Result<Value, BackendError> {
    // Two attempts total, no backoff; the exhausted error propagates.
    let answer = Retry::start(FixedInterval::from_millis(0).take(1), || {
        invoke_agent(state, session_id, query)
    })
    .await?;
    info!(response = %answer, "Agent answered");

    let result = json!({ "responsetext": answer });
    if let Some(connection_id) = &request.connection_id {
        send_ws_response(&state.api_gateway, connection_id, &result).await;
    }

    let record = json!({
        "session_id": session_id,
        "timestamp": time::utc_now_iso(),
        "query": query,
        "response": answer,
        "location": request.location,
    });
    state
        .lambda
        .invoke()
        .function_name(&state.config.log_classifier_fn_name)
        .invocation_type(InvocationType::Event)
        .payload(Blob::new(serde_json::to_vec(&record)?))
        .send()
        .await?;

    Ok(result)
}

/// One agent invocation: streams completion chunks and concatenates their
/// UTF-8 payloads in delivery order.
async fn invoke_agent(
    state: &AgentBridgeState,
    session_id: &str,
    query: &str,
) -> Result<String, BackendError> {
    let resp = state
        .agent_runtime
        .invoke_agent()
        .agent_id(&state.config.agent_id)
        .agent_alias_id(&state.config.agent_alias_id)
        .session_id(session_id)
        .input_text(query)
        .send()
        .await?;

    let mut completion = resp.completion;
    let mut answer = String::new();
    while let Some(chunk) = completion.recv().await? {
        if let ResponseStream::Chunk(part) = chunk {
            if let Some(bytes) = part.bytes() {
                answer.push_str(&String::from_utf8_lossy(bytes.as_ref()));
            }
        }
    }
    Ok(answer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_prefix_is_recognized() {
        assert!(is_mock_connection("mock-123"));
        assert!(!is_mock_connection("Abc123="));
        assert!(!is_mock_connection("unmocked"));
    }

    #[test]
    fn bridge_event_tolerates_missing_fields() {
        let event: BridgeEvent = serde_json::from_value(json!({
            "querytext": "  How deep should I plant?  "
        }))
        .unwrap();
        assert_eq!(event.querytext.trim(), "How deep should I plant?");
        assert!(event.connection_id.is_none());
        assert!(event.session_id.is_none());
    }
}
