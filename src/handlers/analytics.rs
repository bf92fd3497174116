//! Analytics Aggregator: aggregate interaction counts over a timeframe.
//!
//! Scans the interaction table for records whose original timestamp falls
//! inside the requested window and reports distinct sessions, distinct
//! locations, and per-category counts.

use std::collections::{BTreeMap, HashMap, HashSet};

use aws_sdk_dynamodb::Client as DynamoClient;
use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{Datelike, Days, NaiveDate, NaiveDateTime};
use lambda_runtime::{Error, LambdaEvent};
use serde_json::{Value, json};
use tracing::{error, info};

use super::helpers;
use crate::config::AnalyticsConfig;
use crate::errors::BackendError;
use crate::utils::time;

pub struct AnalyticsState {
    pub config: AnalyticsConfig,
    pub dynamodb: DynamoClient,
}

impl AnalyticsState {
    pub async fn new() -> Result<Self, Error> {
        let config = AnalyticsConfig::from_env().map_err(Error::from)?;
        let shared = aws_config::load_from_env().await;
        Ok(Self {
            config,
            dynamodb: DynamoClient::new(&shared),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeframe {
    Today,
    Weekly,
    Monthly,
    Yearly,
}

impl Timeframe {
    /// Case-insensitive parse; anything unrecognized is a 400.
    pub fn parse(raw: &str) -> Result<Self, BackendError> {
        match raw.to_lowercase().as_str() {
            "today" => Ok(Timeframe::Today),
            "weekly" => Ok(Timeframe::Weekly),
            "monthly" => Ok(Timeframe::Monthly),
            "yearly" => Ok(Timeframe::Yearly),
            other => Err(BackendError::Input(format!("Invalid timeframe \"{other}\""))),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Timeframe::Today => "today",
            Timeframe::Weekly => "weekly",
            Timeframe::Monthly => "monthly",
            Timeframe::Yearly => "yearly",
        }
    }
}

/// UTC start boundary: start of day, the most recent Monday at midnight,
/// the first of the month, or the first of the year.
#[must_use]
pub fn start_of_timeframe(timeframe: Timeframe, now: NaiveDateTime) -> NaiveDateTime {
    let date = match timeframe {
        Timeframe::Today => now.date(),
        Timeframe::Weekly => now
            .date()
            .checked_sub_days(Days::new(u64::from(now.weekday().num_days_from_monday())))
            .unwrap_or_else(|| now.date()),
        Timeframe::Monthly => now.date().with_day(1).unwrap_or_else(|| now.date()),
        Timeframe::Yearly => {
            NaiveDate::from_ymd_opt(now.year(), 1, 1).unwrap_or_else(|| now.date())
        }
    };
    date.and_hms_opt(0, 0, 0).unwrap_or(now)
}

/// The projected slice of one interaction record.
#[derive(Debug, Default, Clone)]
pub struct RecordSummary {
    pub session_id: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug)]
pub struct Aggregates {
    pub user_count: usize,
    pub locations: Vec<String>,
    pub categories: BTreeMap<String, u64>,
}

/// Distinct sessions, distinct locations (first-seen order), and a
/// category occurrence map. Empty attribute values are ignored.
#[must_use]
pub fn aggregate(records: &[RecordSummary]) -> Aggregates {
    let mut sessions = HashSet::new();
    let mut locations: Vec<String> = Vec::new();
    let mut categories: BTreeMap<String, u64> = BTreeMap::new();

    for record in records {
        if let Some(session_id) = record.session_id.as_deref().filter(|s| !s.is_empty()) {
            sessions.insert(session_id.to_string());
        }
        if let Some(location) = record.location.as_deref().filter(|s| !s.is_empty()) {
            if !locations.iter().any(|l| l == location) {
                locations.push(location.to_string());
            }
        }
        if let Some(category) = record.category.as_deref().filter(|s| !s.is_empty()) {
            *categories.entry(category.to_string()).or_insert(0) += 1;
        }
    }

    Aggregates {
        user_count: sessions.len(),
        locations,
        categories,
    }
}

#[tracing::instrument(level = "info", skip(state, event))]
pub async fn handler(state: &AnalyticsState, event: LambdaEvent<Value>) -> Result<Value, Error> {
    let raw_timeframe = event
        .payload
        .pointer("/queryStringParameters/timeframe")
        .and_then(Value::as_str)
        .unwrap_or("today");

    match aggregate_timeframe(state, raw_timeframe).await {
        Ok(body) => Ok(helpers::respond_json(200, &body)),
        Err(err) => {
            error!(error = %err, "Analytics request failed");
            Ok(helpers::respond_json(
                err.status_code(),
                &json!({ "error": err.to_string() }),
            ))
        }
    }
}

async fn aggregate_timeframe(
    state: &AnalyticsState,
    raw_timeframe: &str,
) -> Result<Value, BackendError> {
    let timeframe = Timeframe::parse(raw_timeframe)?;
    let now = time::utc_now();
    let start = start_of_timeframe(timeframe, now);
    info!(timeframe = %timeframe.as_str(), start = %start, end = %now, "Aggregating");

    let records = scan_window(state, &time::iso_timestamp(start), &time::iso_timestamp(now)).await?;
    info!(count = records.len(), "Records in window");
    let aggregates = aggregate(&records);

    Ok(json!({
        "timeframe": timeframe.as_str(),
        "start_date": start.format("%Y-%m-%d").to_string(),
        "end_date": now.format("%Y-%m-%d").to_string(),
        "user_count": aggregates.user_count,
        "locations": aggregates.locations,
        "categories": aggregates.categories,
    }))
}

async fn scan_window(
    state: &AnalyticsState,
    start_iso: &str,
    end_iso: &str,
) -> Result<Vec<RecordSummary>, BackendError> {
    let mut records = Vec::new();
    let mut exclusive_start_key: Option<HashMap<String, AttributeValue>> = None;

    loop {
        let resp = state
            .dynamodb
            .scan()
            .table_name(&state.config.table_name)
            .filter_expression("original_ts BETWEEN :start AND :end")
            // `location` is a DynamoDB reserved word, so it gets aliased.
            .projection_expression("session_id, #loc, category")
            .expression_attribute_names("#loc", "location")
            .expression_attribute_values(":start", AttributeValue::S(start_iso.to_string()))
            .expression_attribute_values(":end", AttributeValue::S(end_iso.to_string()))
            .set_exclusive_start_key(exclusive_start_key.take())
            .send()
            .await?;

        records.extend(resp.items().iter().map(|item| RecordSummary {
            session_id: string_attr(item, "session_id"),
            location: string_attr(item, "location"),
            category: string_attr(item, "category"),
        }));

        match resp.last_evaluated_key() {
            Some(key) if !key.is_empty() => exclusive_start_key = Some(key.clone()),
            _ => break,
        }
    }

    Ok(records)
}

fn string_attr(item: &HashMap<String, AttributeValue>, name: &str) -> Option<String> {
    item.get(name).and_then(|v| v.as_s().ok()).cloned()
}
