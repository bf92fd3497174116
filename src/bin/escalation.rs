use std::sync::Arc;

use berrybot::handlers::escalation::{self, EscalationState};
use lambda_runtime::{Error, LambdaEvent, service_fn};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Error> {
    berrybot::setup_logging();
    let state = Arc::new(EscalationState::new().await?);
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let state = Arc::clone(&state);
        async move { escalation::handler(&state, event).await }
    }))
    .await
}
