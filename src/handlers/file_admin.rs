//! File Admin API: admin CRUD over the knowledge-base document bucket.
//!
//! Routes:
//! - `GET /files`: list objects with prebuilt action descriptors
//! - `POST /files`: upload a base64 payload, then trigger KB ingestion
//! - `GET /files/{key}`: download (base64 proxy response)
//! - `DELETE /files/{key}`: delete, then trigger KB ingestion
//! - `POST /sync`: trigger KB ingestion on demand
//! - `OPTIONS *`: CORS pre-flight short-circuit
//!
//! The function sits behind either a REST API or an HTTP API v2 route, so
//! both event flavours are normalized before any routing happens.

use aws_sdk_bedrockagent::Client as BedrockAgentClient;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::primitives::ByteStream;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use lambda_runtime::{Error, LambdaEvent};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{error, info};

use super::helpers;
use crate::config::FileAdminConfig;
use crate::errors::BackendError;
use crate::kb;
use crate::utils::encoding::{quote_plus, unquote_plus};
use crate::utils::time;

/// Clients and configuration built once per container.
pub struct FileAdminState {
    pub config: FileAdminConfig,
    pub s3: S3Client,
    pub bedrock_agent: BedrockAgentClient,
}

impl FileAdminState {
    pub async fn new() -> Result<Self, Error> {
        let config = FileAdminConfig::from_env().map_err(Error::from)?;
        let shared = aws_config::load_from_env().await;
        Ok(Self {
            config,
            s3: S3Client::new(&shared),
            bedrock_agent: BedrockAgentClient::new(&shared),
        })
    }
}

/// Canonical request extracted from either API Gateway event flavour.
#[derive(Debug)]
pub struct ApiRequest {
    pub method: String,
    pub path: String,
    pub path_parameters: Map<String, Value>,
    pub body: Option<String>,
}

/// REST events carry `httpMethod`/`path`; HTTP API v2 events carry
/// `requestContext.http.method`/`rawPath`.
pub fn normalize_request(payload: &Value) -> Result<ApiRequest, BackendError> {
    let (method, path) = if let Some(m) = payload.get("httpMethod").and_then(Value::as_str) {
        let path = payload
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| BackendError::Input("Missing request path".into()))?;
        (m, path)
    } else {
        let m = payload
            .pointer("/requestContext/http/method")
            .and_then(Value::as_str)
            .ok_or_else(|| BackendError::Input("Missing HTTP method".into()))?;
        let path = payload
            .get("rawPath")
            .and_then(Value::as_str)
            .ok_or_else(|| BackendError::Input("Missing request path".into()))?;
        (m, path)
    };

    let path_parameters = payload
        .get("pathParameters")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    Ok(ApiRequest {
        method: method.to_string(),
        path: path.to_string(),
        path_parameters,
        body: payload
            .get("body")
            .and_then(Value::as_str)
            .map(ToString::to_string),
    })
}

/// Resolves the object key from `/files/{proxy+}` or `/files/{key}` routes.
///
/// A populated path-parameter map wins (`proxy` preferred over `key`);
/// otherwise the key is everything after the literal `/files/` segment.
/// Either way the result is decoded form-style (`+` means space).
pub fn extract_key(
    path_parameters: &Map<String, Value>,
    raw_path: &str,
) -> Result<String, BackendError> {
    if !path_parameters.is_empty() {
        let key = path_parameters
            .get("proxy")
            .or_else(|| path_parameters.get("key"))
            .and_then(Value::as_str)
            .unwrap_or("");
        return unquote_plus(key).map_err(BackendError::Input);
    }

    let (_, fragment) = raw_path
        .split_once("/files/")
        .ok_or_else(|| BackendError::Input(format!("No key in path {raw_path}")))?;
    unquote_plus(fragment).map_err(BackendError::Input)
}

#[derive(Debug, Deserialize)]
struct UploadBody {
    content: String,
    filename: Option<String>,
    content_type: Option<String>,
}

/// Lambda entry point. Maps every failure into the JSON error envelope.
#[tracing::instrument(level = "info", skip(state, event))]
pub async fn handler(state: &FileAdminState, event: LambdaEvent<Value>) -> Result<Value, Error> {
    let request = match normalize_request(&event.payload) {
        Ok(r) => r,
        Err(e) => return Ok(helpers::error_envelope(&e)),
    };
    info!(method = %request.method, path = %request.path, "File Admin request");

    if request.method == "OPTIONS" {
        return Ok(json!({
            "statusCode": 200,
            "headers": helpers::cors_headers(),
            "body": "",
        }));
    }

    match route(state, &request).await {
        Ok(response) => Ok(response),
        Err(e) => {
            error!(error = %e, "File Admin request failed");
            Ok(helpers::error_envelope(&e))
        }
    }
}

async fn route(state: &FileAdminState, request: &ApiRequest) -> Result<Value, BackendError> {
    match (request.method.as_str(), request.path.as_str()) {
        ("GET", "/files") => list_files(state).await,
        ("POST", "/files") => {
            let out = upload_file(state, request).await?;
            let sync = kb::trigger_ingestion(
                &state.bedrock_agent,
                &state.config.knowledge_base_id,
                &state.config.data_source_id,
            )
            .await;
            info!(sync = %sync, "Post-upload ingestion result");
            Ok(out)
        }
        ("GET", path) if path.starts_with("/files/") => download_file(state, request).await,
        ("DELETE", path) if path.starts_with("/files/") => {
            let out = delete_file(state, request).await?;
            let sync = kb::trigger_ingestion(
                &state.bedrock_agent,
                &state.config.knowledge_base_id,
                &state.config.data_source_id,
            )
            .await;
            info!(sync = %sync, "Post-delete ingestion result");
            Ok(out)
        }
        ("POST", "/sync") => {
            let mut body = json!({ "message": "KB sync kicked off" });
            let sync = kb::trigger_ingestion(
                &state.bedrock_agent,
                &state.config.knowledge_base_id,
                &state.config.data_source_id,
            )
            .await;
            if let (Some(map), Some(sync_map)) = (body.as_object_mut(), sync.as_object()) {
                map.extend(sync_map.clone());
            }
            Ok(helpers::respond(200, &body))
        }
        _ => Ok(helpers::err_response(404, "Route not found")),
    }
}

async fn list_files(state: &FileAdminState) -> Result<Value, BackendError> {
    let listing = state
        .s3
        .list_objects_v2()
        .bucket(&state.config.bucket_name)
        .send()
        .await?;
    info!(count = listing.key_count().unwrap_or(0), "Listed bucket objects");

    let files: Vec<Value> = listing
        .contents()
        .iter()
        .map(|obj| {
            let key = obj.key().unwrap_or_default();
            let endpoint = format!("/files/{}", quote_plus(key));
            json!({
                "key": key,
                "size": obj.size().unwrap_or(0),
                "last_modified": obj
                    .last_modified()
                    .and_then(|t| DateTime::<Utc>::from_timestamp(t.secs(), t.subsec_nanos()))
                    .map(|d| time::iso_timestamp(d.naive_utc())),
                "actions": {
                    "download": { "method": "GET", "endpoint": endpoint },
                    "delete": { "method": "DELETE", "endpoint": endpoint },
                },
            })
        })
        .collect();

    Ok(helpers::respond(
        200,
        &json!({
            "files": files,
            "upload": { "method": "POST", "endpoint": "/files" },
            "sync": { "method": "POST", "endpoint": "/sync" },
        }),
    ))
}

async fn upload_file(state: &FileAdminState, request: &ApiRequest) -> Result<Value, BackendError> {
    let raw_body = request
        .body
        .as_deref()
        .ok_or_else(|| BackendError::Input("Missing request body".into()))?;
    let body: UploadBody = serde_json::from_str(raw_body)?;

    let filename = body
        .filename
        .filter(|f| !f.is_empty())
        .unwrap_or_else(|| format!("doc_{}", time::utc_now().format("%Y%m%d_%H%M%S")));
    let content_type = body
        .content_type
        .unwrap_or_else(|| "application/octet-stream".to_string());
    info!(filename = %filename, content_type = %content_type, "Uploading file");

    let content = BASE64.decode(body.content.as_bytes())?;
    state
        .s3
        .put_object()
        .bucket(&state.config.bucket_name)
        .key(&filename)
        .body(ByteStream::from(content))
        .content_type(content_type)
        .send()
        .await?;

    Ok(helpers::respond(
        200,
        &json!({
            "message": "Uploaded",
            "file": { "name": filename, "url": format!("/files/{}", quote_plus(&filename)) },
        }),
    ))
}

async fn download_file(
    state: &FileAdminState,
    request: &ApiRequest,
) -> Result<Value, BackendError> {
    let key = extract_key(&request.path_parameters, &request.path)?;
    info!(key = %key, "Downloading file");

    let object = state
        .s3
        .get_object()
        .bucket(&state.config.bucket_name)
        .key(&key)
        .send()
        .await
        .map_err(|err| {
            let service_err = err.into_service_error();
            if service_err.is_no_such_key() {
                BackendError::NotFound(format!("File \"{key}\" not found"))
            } else {
                BackendError::Upstream(service_err.to_string())
            }
        })?;

    let content_type = object
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let bytes = object
        .body
        .collect()
        .await
        .map_err(|e| BackendError::Upstream(e.to_string()))?
        .into_bytes();

    let mut headers = helpers::cors_headers();
    if let Some(map) = headers.as_object_mut() {
        map.insert("Content-Type".into(), Value::String(content_type));
        map.insert(
            "Content-Disposition".into(),
            Value::String(format!("attachment; filename=\"{key}\"")),
        );
    }

    Ok(json!({
        "statusCode": 200,
        "headers": headers,
        "body": BASE64.encode(&bytes),
        "isBase64Encoded": true,
    }))
}

async fn delete_file(state: &FileAdminState, request: &ApiRequest) -> Result<Value, BackendError> {
    let key = extract_key(&request.path_parameters, &request.path)?;
    info!(key = %key, "Deleting file");

    // S3 deletes are silent on absent keys; probe first so a missing key
    // surfaces as 404 instead of a no-op success.
    state
        .s3
        .head_object()
        .bucket(&state.config.bucket_name)
        .key(&key)
        .send()
        .await
        .map_err(|err| {
            let service_err = err.into_service_error();
            if service_err.is_not_found() {
                BackendError::NotFound(format!("File \"{key}\" not found"))
            } else {
                BackendError::Upstream(service_err.to_string())
            }
        })?;

    state
        .s3
        .delete_object()
        .bucket(&state.config.bucket_name)
        .key(&key)
        .send()
        .await?;

    Ok(helpers::respond(
        200,
        &json!({ "message": "Deleted", "deleted_file": key }),
    ))
}
