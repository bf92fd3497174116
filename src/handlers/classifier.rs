//! Log Classifier: categorizes an answered question and persists the
//! interaction record.
//!
//! Invoked asynchronously by the agent bridge. The category comes from a
//! Bedrock Converse call against a closed 17-label vocabulary; anything
//! the model returns outside that vocabulary, and any call failure,
//! normalizes to `Unknown`. The record's sort key appends a random suffix
//! to the timestamp so same-instant writes never collide.

use std::collections::HashMap;

use aws_sdk_bedrockruntime::Client as BedrockRuntimeClient;
use aws_sdk_bedrockruntime::types::{
    ContentBlock, ConversationRole, InferenceConfiguration, Message,
};
use aws_sdk_dynamodb::Client as DynamoClient;
use aws_sdk_dynamodb::types::AttributeValue;
use lambda_runtime::{Error, LambdaEvent};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{error, info};
use uuid::Uuid;

use crate::config::ClassifierConfig;
use crate::errors::BackendError;
use crate::utils::time;

/// The closed topic vocabulary. Everything else maps to `Unknown`.
pub const CATEGORIES: [&str; 17] = [
    "Chemical Registrations",
    "Disease",
    "Economics",
    "Field Establishment",
    "Harvest",
    "Insects",
    "Irrigation",
    "Nutrition",
    "Pest Management Guide",
    "Pollination",
    "Post Harvest Handling",
    "Cold Chain",
    "Production",
    "Pruning",
    "Sanitation",
    "Varietal Information",
    "Weeds",
];

pub struct ClassifierState {
    pub config: ClassifierConfig,
    pub dynamodb: DynamoClient,
    pub bedrock: BedrockRuntimeClient,
}

impl ClassifierState {
    pub async fn new() -> Result<Self, Error> {
        let config = ClassifierConfig::from_env().map_err(Error::from)?;
        let shared = aws_config::load_from_env().await;
        Ok(Self {
            config,
            dynamodb: DynamoClient::new(&shared),
            bedrock: BedrockRuntimeClient::new(&shared),
        })
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct ClassifyRequest {
    pub session_id: Option<String>,
    pub timestamp: Option<String>,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub location: Option<String>,
    pub confidence: Option<f64>,
}

/// Trims and quote-strips the model reply, then clamps it to the
/// vocabulary.
#[must_use]
pub fn normalize_category(raw: &str) -> String {
    let label = raw.trim().trim_matches('"');
    if label == "Unknown" || CATEGORIES.contains(&label) {
        label.to_string()
    } else {
        "Unknown".to_string()
    }
}

/// `{iso timestamp}#{8 hex chars}`: unique under same-instant writes.
#[must_use]
pub fn composite_sort_key(iso_ts: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{iso_ts}#{}", &suffix[..8])
}

fn classification_prompt(question: &str) -> String {
    format!(
        "Classify this blueberry farming question into exactly one category:\n\n\
         [{}]\n\n\
         Question: {question}\n\n\
         - Respond ONLY with the category name in quotes (e.g., \"Harvest\").\n\
         - No explanations or additional text.\n\
         - If it doesn't fit, return \"Unknown\".",
        CATEGORIES.join(", "),
    )
}

/// Asks the model for a category; any failure is logged and reported as
/// `Unknown` rather than failing the record write.
pub async fn classify_question(state: &ClassifierState, question: &str) -> String {
    match converse_once(state, question).await {
        Ok(reply) => normalize_category(&reply),
        Err(err) => {
            error!(error = %err, "Classification call failed");
            "Unknown".to_string()
        }
    }
}

async fn converse_once(state: &ClassifierState, question: &str) -> Result<String, BackendError> {
    let message = Message::builder()
        .role(ConversationRole::User)
        .content(ContentBlock::Text(classification_prompt(question)))
        .build()
        .map_err(|e| BackendError::Upstream(e.to_string()))?;

    let resp = state
        .bedrock
        .converse()
        .model_id(&state.config.model_id)
        .messages(message)
        .inference_config(
            InferenceConfiguration::builder()
                .max_tokens(16)
                .temperature(0.0)
                .top_p(1.0)
                .build(),
        )
        .send()
        .await?;

    let reply = resp
        .output()
        .and_then(|out| out.as_message().ok())
        .and_then(|m| m.content().first())
        .and_then(|block| block.as_text().ok())
        .cloned()
        .unwrap_or_default();
    Ok(reply)
}

#[tracing::instrument(level = "info", skip(state, event))]
pub async fn handler(state: &ClassifierState, event: LambdaEvent<Value>) -> Result<Value, Error> {
    info!(event = %event.payload, "Received classification request");
    let request: ClassifyRequest = serde_json::from_value(event.payload).unwrap_or_default();

    if request.query.is_empty() || request.response.is_empty() {
        return Ok(json!({
            "statusCode": 400,
            "body": json!({ "error": "Missing query or response" }).to_string(),
        }));
    }

    let session_id = request
        .session_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let original_ts = request.timestamp.unwrap_or_else(time::utc_now_iso);
    let sort_key = composite_sort_key(&original_ts);
    let category = classify_question(state, &request.query).await;
    info!(session_id = %session_id, sort_key = %sort_key, category = %category, "Classified");

    let mut item = HashMap::from([
        ("session_id".to_string(), AttributeValue::S(session_id.clone())),
        ("timestamp".to_string(), AttributeValue::S(sort_key.clone())),
        ("original_ts".to_string(), AttributeValue::S(original_ts)),
        ("query".to_string(), AttributeValue::S(request.query)),
        ("response".to_string(), AttributeValue::S(request.response)),
        (
            "location".to_string(),
            AttributeValue::S(request.location.unwrap_or_default()),
        ),
        ("category".to_string(), AttributeValue::S(category.clone())),
    ]);
    if let Some(confidence) = request.confidence {
        item.insert("confidence".to_string(), AttributeValue::N(confidence.to_string()));
    }

    if let Err(err) = state
        .dynamodb
        .put_item()
        .table_name(&state.config.table_name)
        .set_item(Some(item))
        .send()
        .await
    {
        error!(error = %aws_sdk_dynamodb::error::DisplayErrorContext(&err), "DynamoDB write failed");
        return Ok(json!({
            "statusCode": 500,
            "body": json!({ "error": "Failed to write to DynamoDB" }).to_string(),
        }));
    }

    Ok(json!({
        "statusCode": 200,
        "body": json!({
            "session_id": session_id,
            "timestamp": sort_key,
            "category": category,
        })
        .to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_labels_normalize() {
        assert_eq!(normalize_category("\"Harvest\""), "Harvest");
        assert_eq!(normalize_category("  Pruning  "), "Pruning");
        assert_eq!(normalize_category("Unknown"), "Unknown");
    }

    #[test]
    fn out_of_vocabulary_replies_clamp_to_unknown() {
        assert_eq!(normalize_category("Harvesting tips"), "Unknown");
        assert_eq!(normalize_category(""), "Unknown");
        assert_eq!(
            normalize_category("Sure! The category is \"Harvest\"."),
            "Unknown"
        );
    }

    #[test]
    fn sort_key_keeps_timestamp_prefix() {
        let key = composite_sort_key("2025-06-01T12:00:00.000000");
        assert!(key.starts_with("2025-06-01T12:00:00.000000#"));
        assert_eq!(key.len(), "2025-06-01T12:00:00.000000#".len() + 8);
    }
}
