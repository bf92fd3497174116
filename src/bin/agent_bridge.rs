use std::sync::Arc;

use berrybot::handlers::agent_bridge::{self, AgentBridgeState};
use lambda_runtime::{Error, LambdaEvent, service_fn};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Error> {
    berrybot::setup_logging();
    let state = Arc::new(AgentBridgeState::new().await?);
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let state = Arc::clone(&state);
        async move { agent_bridge::handler(&state, event).await }
    }))
    .await
}
