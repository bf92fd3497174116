//! Session Log Archiver: copies one UTC day of structured interaction
//! logs from CloudWatch Logs to S3, at most once per day.
//!
//! A sentinel record in the interaction table (partition `SESSION_LOGS`,
//! sort key = date) marks a day as done; its presence is a strict skip
//! signal and it is written only after the archive object has landed.

use std::time::Duration;

use aws_sdk_cloudwatchlogs::Client as LogsClient;
use aws_sdk_cloudwatchlogs::types::QueryStatus;
use aws_sdk_dynamodb::Client as DynamoClient;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::primitives::ByteStream;
use lambda_runtime::{Error, LambdaEvent};
use serde_json::{Value, json};
use tracing::{error, info, warn};

use super::helpers;
use crate::config::LogArchiverConfig;
use crate::errors::BackendError;
use crate::utils::time;

/// Sentinel partition holding the per-day idempotency markers.
pub const MARKER_SESSION_ID: &str = "SESSION_LOGS";

const INSIGHTS_QUERY: &str = "\
fields @message
| filter @message like /\"session_id\":/
| filter @message like /\"query\":/
| filter @message like /\"response\":/
| filter @message like /\"location\":/
| limit 10000";

pub struct LogArchiverState {
    pub config: LogArchiverConfig,
    pub logs: LogsClient,
    pub s3: S3Client,
    pub dynamodb: DynamoClient,
}

impl LogArchiverState {
    pub async fn new() -> Result<Self, Error> {
        let config = LogArchiverConfig::from_env().map_err(Error::from)?;
        let shared = aws_config::load_from_env().await;
        Ok(Self {
            config,
            logs: LogsClient::new(&shared),
            s3: S3Client::new(&shared),
            dynamodb: DynamoClient::new(&shared),
        })
    }
}

#[derive(Debug)]
pub struct StoreOutcome {
    pub success: bool,
    pub message: String,
    pub log_count: usize,
}

/// The early-return outcome when the day's marker is already present; the
/// caller skips the Insights query entirely in that case.
#[must_use]
pub fn skip_if_processed(marker_present: bool) -> Option<StoreOutcome> {
    marker_present.then(|| StoreOutcome {
        success: false,
        message: "Logs already processed".to_string(),
        log_count: 0,
    })
}

/// Parses one Insights result line: the JSON object starting at the first
/// `{` must decode and carry at least `session_id`, `query`, `response`.
/// Anything else is skipped, not fatal.
#[must_use]
pub fn parse_log_message(message: &str) -> Option<Value> {
    let json_start = message.find('{')?;
    let decoded: Value = serde_json::from_str(&message[json_start..]).ok()?;
    let has_required = ["session_id", "query", "response"]
        .iter()
        .all(|field| decoded.get(field).is_some());
    has_required.then_some(decoded)
}

#[tracing::instrument(level = "info", skip(state, event))]
pub async fn handler(state: &LogArchiverState, event: LambdaEvent<Value>) -> Result<Value, Error> {
    let action = event
        .payload
        .get("action")
        .and_then(Value::as_str)
        .unwrap_or("store_logs");

    if action != "store_logs" {
        return Ok(json!({
            "statusCode": 400,
            "body": json!({ "error": "Invalid action" }).to_string(),
        }));
    }

    match store_session_logs(state).await {
        Ok(outcome) => Ok(json!({
            "statusCode": 200,
            "body": json!({
                "success": outcome.success,
                "message": outcome.message,
                "log_count": outcome.log_count,
            })
            .to_string(),
        })),
        Err(err) => {
            error!(error = %err, "Session log archiving failed");
            Ok(helpers::error_envelope(&err))
        }
    }
}

async fn store_session_logs(state: &LogArchiverState) -> Result<StoreOutcome, BackendError> {
    let now = time::utc_now();
    let date_str = now.format("%Y-%m-%d").to_string();
    let start_of_day = now.date().and_hms_opt(0, 0, 0).unwrap_or(now);

    if let Some(outcome) = skip_if_processed(marker_exists(state, &date_str).await) {
        info!(date = %date_str, "Session logs already processed");
        return Ok(outcome);
    }

    let session_logs = run_insights_query(
        state,
        start_of_day.and_utc().timestamp(),
        now.and_utc().timestamp(),
    )
    .await?;

    if session_logs.is_empty() {
        info!("No matching session logs found");
        return Ok(StoreOutcome {
            success: false,
            message: "No matching logs found".to_string(),
            log_count: 0,
        });
    }

    let file_key = format!("session_logs/{date_str}.json");
    state
        .s3
        .put_object()
        .bucket(&state.config.archive_bucket)
        .key(&file_key)
        .body(ByteStream::from(serde_json::to_vec(&session_logs)?))
        .content_type("application/json")
        .send()
        .await?;

    write_marker(state, &date_str).await?;

    let s3_path = format!("s3://{}/{}", state.config.archive_bucket, file_key);
    info!(count = session_logs.len(), path = %s3_path, "Stored session logs");
    Ok(StoreOutcome {
        success: true,
        message: format!("Stored {} session logs to {}", session_logs.len(), s3_path),
        log_count: session_logs.len(),
    })
}

/// Marker lookups fail open: an unreadable marker must not block the
/// day's archive.
async fn marker_exists(state: &LogArchiverState, date_str: &str) -> bool {
    match state
        .dynamodb
        .get_item()
        .table_name(&state.config.table_name)
        .key("session_id", AttributeValue::S(MARKER_SESSION_ID.to_string()))
        .key("timestamp", AttributeValue::S(date_str.to_string()))
        .send()
        .await
    {
        Ok(resp) => resp.item().is_some(),
        Err(err) => {
            warn!(
                error = %aws_sdk_dynamodb::error::DisplayErrorContext(&err),
                "Idempotency marker check failed"
            );
            false
        }
    }
}

async fn write_marker(state: &LogArchiverState, date_str: &str) -> Result<(), BackendError> {
    state
        .dynamodb
        .put_item()
        .table_name(&state.config.table_name)
        .item("session_id", AttributeValue::S(MARKER_SESSION_ID.to_string()))
        .item("timestamp", AttributeValue::S(date_str.to_string()))
        .send()
        .await?;
    Ok(())
}

async fn run_insights_query(
    state: &LogArchiverState,
    start_time: i64,
    end_time: i64,
) -> Result<Vec<Value>, BackendError> {
    let started = state
        .logs
        .start_query()
        .log_group_name(&state.config.log_group_name)
        .start_time(start_time)
        .end_time(end_time)
        .query_string(INSIGHTS_QUERY)
        .limit(10_000)
        .send()
        .await?;
    let query_id = started
        .query_id()
        .ok_or_else(|| BackendError::Upstream("StartQuery returned no query id".into()))?
        .to_string();
    info!(query_id = %query_id, "Started Insights query");

    // Fixed 1-second poll; the query service bounds the total duration.
    let results = loop {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let resp = state
            .logs
            .get_query_results()
            .query_id(&query_id)
            .send()
            .await?;
        match resp.status() {
            Some(QueryStatus::Running | QueryStatus::Scheduled) => continue,
            Some(QueryStatus::Complete) => break resp,
            other => {
                let status = other.map_or("Unknown", QueryStatus::as_str);
                return Err(BackendError::Upstream(format!("Query failed: {status}")));
            }
        }
    };

    let session_logs = results
        .results()
        .iter()
        .filter_map(|row| {
            row.iter()
                .find(|field| field.field() == Some("@message"))
                .and_then(|field| field.value())
        })
        .filter_map(parse_log_message)
        .collect();
    Ok(session_logs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_json_after_log_prefix() {
        let line = "2025-06-01T00:00:01.000Z INFO {\"session_id\":\"s1\",\
                    \"query\":\"q\",\"response\":\"r\",\"location\":\"NC\"}";
        let parsed = parse_log_message(line).unwrap();
        assert_eq!(parsed["session_id"], "s1");
        assert_eq!(parsed["location"], "NC");
    }

    #[test]
    fn lines_missing_required_fields_are_skipped() {
        assert!(parse_log_message("{\"session_id\":\"s1\",\"query\":\"q\"}").is_none());
        assert!(parse_log_message("no json here").is_none());
        assert!(parse_log_message("prefix {not valid json").is_none());
    }

    #[test]
    fn second_run_on_the_same_date_short_circuits() {
        // A present marker yields the skip outcome without reaching the
        // query path; an absent marker lets the archive proceed.
        let outcome = skip_if_processed(true).unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Logs already processed");
        assert_eq!(outcome.log_count, 0);

        assert!(skip_if_processed(false).is_none());
    }
}
