use std::sync::Arc;

use berrybot::handlers::classifier::{self, ClassifierState};
use lambda_runtime::{Error, LambdaEvent, service_fn};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Error> {
    berrybot::setup_logging();
    let state = Arc::new(ClassifierState::new().await?);
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let state = Arc::clone(&state);
        async move { classifier::handler(&state, event).await }
    }))
    .await
}
