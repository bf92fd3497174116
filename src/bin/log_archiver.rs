use std::sync::Arc;

use berrybot::handlers::log_archiver::{self, LogArchiverState};
use lambda_runtime::{Error, LambdaEvent, service_fn};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Error> {
    berrybot::setup_logging();
    let state = Arc::new(LogArchiverState::new().await?);
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let state = Arc::clone(&state);
        async move { log_archiver::handler(&state, event).await }
    }))
    .await
}
