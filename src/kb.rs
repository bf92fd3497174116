//! Knowledge-base ingestion trigger.
//!
//! Fire-and-forget: the returned job id is reported but never tracked, and
//! a trigger failure is reported in the secondary result instead of failing
//! the operation that caused it.

use aws_sdk_bedrockagent::Client as BedrockAgentClient;
use aws_sdk_bedrockagent::error::DisplayErrorContext;
use serde_json::{Value, json};
use tracing::{error, info};

/// Starts an ingestion job for the configured knowledge-base data source.
///
/// Returns `{"status": "success", "jobId": …}` or
/// `{"status": "error", "message": …}`; never propagates the failure.
pub async fn trigger_ingestion(
    client: &BedrockAgentClient,
    knowledge_base_id: &str,
    data_source_id: &str,
) -> Value {
    match client
        .start_ingestion_job()
        .knowledge_base_id(knowledge_base_id)
        .data_source_id(data_source_id)
        .send()
        .await
    {
        Ok(resp) => {
            let job_id = resp.ingestion_job().map(|j| j.ingestion_job_id().to_string());
            info!(job_id = ?job_id, "Knowledge-base ingestion started");
            json!({ "status": "success", "jobId": job_id })
        }
        Err(err) => {
            let message = DisplayErrorContext(&err).to_string();
            error!(error = %message, "Knowledge-base ingestion trigger failed");
            json!({ "status": "error", "message": message })
        }
    }
}
