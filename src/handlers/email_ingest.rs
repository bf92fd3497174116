//! Email-Reply Ingestor: turns an admin's emailed answer into a
//! knowledge-base artifact.
//!
//! Triggered either by an SES receipt rule (raw message stored under
//! `incoming/{messageId}` in the mail bucket) or by a plain S3
//! object-created event. The first text/plain MIME part is pattern-matched
//! for a QUESTION/ANSWER pair, the pair is written under `admin_answers/`,
//! and a knowledge-base ingestion is kicked off.
//!
//! This handler never lets a fault escape: every failure is logged with
//! the full input event and reported as `{"status": "ERROR", ...}`.

use aws_sdk_bedrockagent::Client as BedrockAgentClient;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::primitives::ByteStream;
use lambda_runtime::{Error, LambdaEvent};
use mail_parser::MessageParser;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{error, info};

use crate::config::EmailIngestConfig;
use crate::errors::BackendError;
use crate::kb;
use crate::utils::time;

pub struct EmailIngestState {
    pub config: EmailIngestConfig,
    pub s3: S3Client,
    pub bedrock_agent: BedrockAgentClient,
}

impl EmailIngestState {
    pub async fn new() -> Result<Self, Error> {
        let config = EmailIngestConfig::from_env().map_err(Error::from)?;
        let shared = aws_config::load_from_env().await;
        Ok(Self {
            config,
            s3: S3Client::new(&shared),
            bedrock_agent: BedrockAgentClient::new(&shared),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct IngestEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<IngestRecord>,
}

/// One notification record; exactly one branch is expected to be present.
#[derive(Debug, Deserialize)]
pub struct IngestRecord {
    pub ses: Option<SesBranch>,
    pub s3: Option<S3Branch>,
}

#[derive(Debug, Deserialize)]
pub struct SesBranch {
    pub mail: SesMail,
}

#[derive(Debug, Deserialize)]
pub struct SesMail {
    #[serde(rename = "messageId")]
    pub message_id: String,
}

#[derive(Debug, Deserialize)]
pub struct S3Branch {
    pub bucket: S3BucketRef,
    pub object: S3ObjectRef,
}

#[derive(Debug, Deserialize)]
pub struct S3BucketRef {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct S3ObjectRef {
    pub key: String,
}

// Tried in order; the first matching pattern wins. The last pattern is
// deliberately lenient (first line = question, remainder = answer), which
// means any two-line email "extracts": preserved behavior, exercised by
// tests as the known-ambiguous case.
static QNA_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?is)QUESTION:\s*(.*?)\s*ANSWER:\s*(.*)").expect("static regex compile"),
        Regex::new(r"(?is)QUESTION:\s*(.*?)\r?\n(.*)").expect("static regex compile"),
        Regex::new(r"(?s)^(.*?)\r?\n(.*)$").expect("static regex compile"),
    ]
});

/// Extracts a (question, answer) pair from the email body. Returns the
/// trimmed capture groups of the first matching pattern, which may be
/// empty; the caller treats empty captures as a failed extraction.
#[must_use]
pub fn extract_qna(body_text: &str) -> Option<(String, String)> {
    for pattern in QNA_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(body_text) {
            return Some((caps[1].trim().to_string(), caps[2].trim().to_string()));
        }
    }
    None
}

#[tracing::instrument(level = "info", skip(state, event))]
pub async fn handler(state: &EmailIngestState, event: LambdaEvent<Value>) -> Result<Value, Error> {
    let payload = event.payload;
    match ingest(state, &payload).await {
        Ok(()) => Ok(json!({ "status": "SUCCESS" })),
        Err(err) => {
            error!(error = %err, event = %payload, "Email ingestion failed");
            Ok(json!({ "status": "ERROR", "message": err.to_string() }))
        }
    }
}

async fn ingest(state: &EmailIngestState, payload: &Value) -> Result<(), BackendError> {
    let event: IngestEvent = serde_json::from_value(payload.clone())?;
    let record = event
        .records
        .into_iter()
        .next()
        .ok_or_else(|| BackendError::Input("Event contains no records".into()))?;

    let (bucket, key) = match (&record.ses, &record.s3) {
        (Some(ses), _) => (
            state.config.source_bucket.clone(),
            format!("incoming/{}", ses.mail.message_id),
        ),
        (None, Some(s3)) => (s3.bucket.name.clone(), s3.object.key.clone()),
        (None, None) => return Err(BackendError::Input("Unsupported event type".into())),
    };
    info!(bucket = %bucket, key = %key, "Fetching raw email");

    let raw = state
        .s3
        .get_object()
        .bucket(&bucket)
        .key(&key)
        .send()
        .await?
        .body
        .collect()
        .await
        .map_err(|e| BackendError::Upstream(e.to_string()))?
        .into_bytes();

    let message = MessageParser::default()
        .parse(raw.as_ref())
        .ok_or_else(|| BackendError::Extraction("Failed to parse MIME message".into()))?;
    if message.text_body.is_empty() {
        return Err(BackendError::Extraction(
            "No text/plain part found in email".into(),
        ));
    }
    let body_text = message
        .body_text(0)
        .ok_or_else(|| BackendError::Extraction("No text/plain part found in email".into()))?;

    let (question, answer) = extract_qna(&body_text)
        .filter(|(q, a)| !q.is_empty() && !a.is_empty())
        .ok_or_else(|| BackendError::Extraction("Failed to extract QUESTION/ANSWER".into()))?;
    info!(question = %question, answer = %answer, "Extracted Q&A pair");

    let now = time::utc_now();
    let out_key = format!("admin_answers/{}.txt", now.format("%Y%m%d_%H%M%SZ"));
    let content = format!(
        "Q: {question}\nA: {answer}\n\nApproved by: {approver}\nDate: {date}Z\n",
        approver = state.config.admin_email,
        date = time::iso_timestamp(now),
    );

    state
        .s3
        .put_object()
        .bucket(&state.config.destination_bucket)
        .key(&out_key)
        .body(ByteStream::from(content.into_bytes()))
        .content_type("text/plain")
        .metadata("question", &question)
        .metadata("approved_by", &state.config.admin_email)
        .send()
        .await?;
    info!(
        bucket = %state.config.destination_bucket,
        key = %out_key,
        "Stored Q&A artifact"
    );

    let sync = kb::trigger_ingestion(
        &state.bedrock_agent,
        &state.config.knowledge_base_id,
        &state.config.data_source_id,
    )
    .await;
    info!(sync = %sync, "Post-ingest knowledge-base sync result");

    Ok(())
}
