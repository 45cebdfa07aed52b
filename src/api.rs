use crate::config::ClientConfig;
use crate::error::{ClientError, FALLBACK_PROCESS_ERROR};
use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Body of `GET /api/health`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Body of a 2xx `POST /api/generate-map`.
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
pub struct GenerateMapResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub map_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// A file the user picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
}

impl SelectedFile {
    pub fn from_path(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("Failed to read file metadata: {:?}", path))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            path: path.to_path_buf(),
            name,
            size: metadata.len(),
        })
    }
}

/// The remote map-rendering service.
#[allow(async_fn_in_trait)]
pub trait MapService {
    async fn health(&self) -> Result<HealthResponse, ClientError>;

    /// Uploads `file`. Non-2xx replies come back as `ClientError::Request`
    /// carrying the server's `error` text.
    async fn generate_map(&self, file: &SelectedFile) -> Result<GenerateMapResponse, ClientError>;
}

pub struct HttpMapService {
    client: reqwest::Client,
    api_base: String,
}

impl HttpMapService {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_base: format!("{}/api", config.service_origin.trim_end_matches('/')),
        })
    }
}

impl MapService for HttpMapService {
    async fn health(&self) -> Result<HealthResponse, ClientError> {
        let url = format!("{}/health", self.api_base);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        Ok(response.json::<HealthResponse>().await?)
    }

    async fn generate_map(&self, file: &SelectedFile) -> Result<GenerateMapResponse, ClientError> {
        let url = format!("{}/generate-map", self.api_base);

        let bytes = tokio::fs::read(&file.path)
            .await
            .map_err(|e| ClientError::request(format!("Failed to read {}: {}", file.name, e)))?;
        debug!("POST {} ({} bytes)", url, bytes.len());

        let part = Part::bytes(bytes)
            .file_name(file.name.clone())
            .mime_str("text/csv")?;
        let form = Form::new().part("file", part);

        let response = self.client.post(&url).multipart(form).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .filter(|msg| !msg.is_empty())
                .unwrap_or_else(|| FALLBACK_PROCESS_ERROR.to_string());
            debug!("generate-map returned {}: {}", status, message);
            return Err(ClientError::Request(message));
        }

        Ok(response.json::<GenerateMapResponse>().await?)
    }
}
