//! Serverless backend for the BerryBot question-answering assistant.
//!
//! Each module under [`handlers`] is the body of one Lambda function; the
//! matching `src/bin/` entry point wires it into `lambda_runtime`. The
//! functions are independent of each other and compose only through managed
//! AWS services:
//!
//! - `file_admin`: admin CRUD over the knowledge-base document bucket,
//!   with a Bedrock ingestion trigger after every mutating write
//! - `agent_bridge`: forwards a user query to the Bedrock agent, pushes
//!   the answer over a WebSocket connection, and hands the exchange to the
//!   classifier asynchronously
//! - `escalation`: Bedrock action-group handler that emails an admin when
//!   the agent cannot answer
//! - `email_ingest`: parses the admin's emailed reply and feeds it back
//!   into the knowledge base
//! - `classifier`: categorizes a question with Bedrock Converse and
//!   persists the interaction record to DynamoDB
//! - `log_archiver`: archives a day of structured session logs from
//!   CloudWatch Logs to S3, once per day
//! - `analytics`: aggregates interaction records over a timeframe
//!
//! Service clients are constructed once per container in each bin's `main`
//! and shared across invocations as read-only handles.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod kb;
pub mod utils;

pub use errors::BackendError;

/// Configure structured logging with JSON format for AWS Lambda environments.
///
/// Sets up tracing-subscriber with a JSON formatter suitable for CloudWatch
/// Logs integration. Call once at the start of each Lambda entry point.
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    tracing_subscriber::registry().with(fmt_layer).init();
}
