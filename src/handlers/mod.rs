pub mod agent_bridge;
pub mod analytics;
pub mod classifier;
pub mod email_ingest;
pub mod escalation;
pub mod file_admin;
pub mod helpers;
pub mod log_archiver;
