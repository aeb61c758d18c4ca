//! Client for the companion HTTP API: chat queries, task creation and
//! progress report download.
//!
//! Each call has a `Result` form and an `_or_none` form. The latter logs the
//! failure and returns `None`, for callers that only display the outcome.

mod error;
pub mod types;

pub use error::ApiError;
pub use types::{ChatRequest, ChatResponse, Report, TaskCreated, TaskRequest};

use crate::config::ApiConfig;
use chrono::Local;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Priority sent with new tasks when none is given.
pub const DEFAULT_TASK_PRIORITY: &str = "medium";

pub struct OracleApi {
    client: Client,
    base_url: String,
    timeout_ms: u64,
}

impl OracleApi {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ApiError::Configuration(e.to_string()))?;
        Ok(Self::with_client(config, client))
    }

    /// Create an API client with a custom HTTP client (for testing).
    pub fn with_client(config: &ApiConfig, client: Client) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout_ms: config.timeout_seconds * 1000,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ask the assistant a question about the current system state.
    pub async fn chat(&self, message: &str) -> Result<ChatResponse, ApiError> {
        let url = format!("{}/chat/query", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&ChatRequest {
                message: message.to_string(),
            })
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(e, self.timeout_ms))?;

        parse_json(check_status(response).await?).await
    }

    /// Queue a task with a freshly generated id.
    pub async fn create_task(
        &self,
        description: &str,
        priority: &str,
    ) -> Result<TaskCreated, ApiError> {
        let url = format!("{}/tasks/", self.base_url);
        let request = TaskRequest {
            id: uuid::Uuid::new_v4().to_string(),
            description: description.to_string(),
            priority: priority.to_string(),
        };

        tracing::debug!(task_id = %request.id, priority, "Creating task");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(e, self.timeout_ms))?;

        parse_json(check_status(response).await?).await
    }

    /// Fetch the PDF progress report.
    pub async fn fetch_report(&self) -> Result<Report, ApiError> {
        let url = format!("{}/reports/progress-report", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(e, self.timeout_ms))?;
        let response = check_status(response).await?;

        let filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(attachment_filename)
            .unwrap_or_else(default_report_filename);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to read report: {}", e)))?;

        Ok(Report {
            filename,
            bytes: bytes.to_vec(),
        })
    }

    /// Download the report into `dir`, returning the written path.
    pub async fn download_report(&self, dir: &Path) -> Result<PathBuf, ApiError> {
        let report = self.fetch_report().await?;
        let path = dir.join(&report.filename);
        tokio::fs::write(&path, &report.bytes).await?;
        tracing::info!(path = %path.display(), bytes = report.bytes.len(), "Report saved");
        Ok(path)
    }

    pub async fn chat_or_none(&self, message: &str) -> Option<ChatResponse> {
        self.chat(message)
            .await
            .map_err(|e| tracing::warn!(error = %e, "Chat query failed"))
            .ok()
    }

    pub async fn create_task_or_none(
        &self,
        description: &str,
        priority: &str,
    ) -> Option<TaskCreated> {
        self.create_task(description, priority)
            .await
            .map_err(|e| tracing::warn!(error = %e, "Task creation failed"))
            .ok()
    }

    pub async fn download_report_or_none(&self, dir: &Path) -> Option<PathBuf> {
        self.download_report(dir)
            .await
            .map_err(|e| tracing::warn!(error = %e, "Report download failed"))
            .ok()
    }
}

async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(ApiError::Upstream {
        status: status.as_u16(),
        message,
    })
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let body = response
        .text()
        .await
        .map_err(|e| ApiError::InvalidResponse(format!("Failed to read response body: {}", e)))?;
    serde_json::from_str(&body)
        .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response: {}", e)))
}

/// Extract `filename` from a `Content-Disposition: attachment; filename=...` value.
fn attachment_filename(header: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"'))
        // Never let the server pick a path outside the target directory.
        .and_then(|name| Path::new(name).file_name())
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

pub fn default_report_filename() -> String {
    format!(
        "oracle_monitor_report_{}.pdf",
        Local::now().format("%Y%m%d_%H%M%S")
    )
}
