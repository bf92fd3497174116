use std::sync::Arc;

use berrybot::handlers::email_ingest::{self, EmailIngestState};
use lambda_runtime::{Error, LambdaEvent, service_fn};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Error> {
    berrybot::setup_logging();
    let state = Arc::new(EmailIngestState::new().await?);
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let state = Arc::clone(&state);
        async move { email_ingest::handler(&state, event).await }
    }))
    .await
}
