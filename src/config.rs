//! Environment-driven configuration, one struct per Lambda function.
//!
//! Every struct is read once at cold start in the bin's `main`; a missing
//! variable fails the container before the first request is served.

use std::env;

fn required(name: &str) -> Result<String, String> {
    env::var(name).map_err(|e| format!("{name}: {e}"))
}

#[derive(Debug, Clone)]
pub struct FileAdminConfig {
    pub bucket_name: String,
    pub knowledge_base_id: String,
    pub data_source_id: String,
}

impl FileAdminConfig {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            bucket_name: required("BUCKET_NAME")?,
            knowledge_base_id: required("KNOWLEDGE_BASE_ID")?,
            data_source_id: required("DATA_SOURCE_ID")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AgentBridgeConfig {
    pub agent_id: String,
    pub agent_alias_id: String,
    pub ws_api_endpoint: String,
    pub log_classifier_fn_name: String,
}

impl AgentBridgeConfig {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            agent_id: required("AGENT_ID")?,
            agent_alias_id: required("AGENT_ALIAS_ID")?,
            ws_api_endpoint: required("WS_API_ENDPOINT")?,
            log_classifier_fn_name: required("LOG_CLASSIFIER_FN_NAME")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct EscalationConfig {
    pub verified_source_email: String,
    pub admin_email: String,
}

impl EscalationConfig {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            verified_source_email: required("VERIFIED_SOURCE_EMAIL")?,
            admin_email: required("ADMIN_EMAIL")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct EmailIngestConfig {
    pub source_bucket: String,
    pub destination_bucket: String,
    pub knowledge_base_id: String,
    pub data_source_id: String,
    pub admin_email: String,
}

impl EmailIngestConfig {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            source_bucket: required("SOURCE_BUCKET_NAME")?,
            destination_bucket: required("DESTINATION_BUCKET_NAME")?,
            knowledge_base_id: required("KNOWLEDGE_BASE_ID")?,
            data_source_id: required("DATA_SOURCE_ID")?,
            admin_email: required("ADMIN_EMAIL")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub table_name: String,
    pub model_id: String,
}

impl ClassifierConfig {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            table_name: required("DYNAMODB_TABLE")?,
            model_id: env::var("BEDROCK_MODEL_ID")
                .unwrap_or_else(|_| "us.amazon.nova-lite-v1:0".to_string()),
        })
    }
}

#[derive(Debug, Clone)]
pub struct LogArchiverConfig {
    pub log_group_name: String,
    pub archive_bucket: String,
    pub table_name: String,
}

impl LogArchiverConfig {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            log_group_name: required("GROUP_NAME")?,
            archive_bucket: required("BUCKET")?,
            table_name: required("DYNAMODB_TABLE")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    pub table_name: String,
}

impl AnalyticsConfig {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            table_name: required("DYNAMODB_TABLE")?,
        })
    }
}
