//! Client for remove.bg compatible background removal APIs
//!
//! The client never decides what to do on failure. Every call ends in a
//! [`RemovalOutcome`] and the caller picks the fallback policy.

use crate::{
    config::{OutputFormat, RemoteConfig},
    error::{EditorError, Result},
    services::OutputFormatHandler,
};
use async_trait::async_trait;
use image::RgbaImage;
use reqwest::{multipart, Client};
use serde::Deserialize;
use std::time::Duration;

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Reason used when an error response carries no readable title
pub const GENERIC_API_ERROR: &str = "API Error";

/// Tagged result of a remote removal attempt
#[derive(Debug, Clone, PartialEq)]
pub enum RemovalOutcome {
    /// The API returned an image with the background removed
    Success(RgbaImage),
    /// The API is not configured or could not be reached
    ApiUnavailable,
    /// The API answered with an error
    ApiError(String),
}

impl RemovalOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Human readable reason for a failed attempt, `None` on success
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        match self {
            Self::Success(_) => None,
            Self::ApiUnavailable => Some("remote API unavailable or not configured".to_string()),
            Self::ApiError(reason) => Some(reason.clone()),
        }
    }

    /// Convert into a `Result`, turning failures into errors
    pub fn into_result(self) -> Result<RgbaImage> {
        match self {
            Self::Success(image) => Ok(image),
            Self::ApiUnavailable => Err(EditorError::remote_api(
                "remote API unavailable or not configured",
            )),
            Self::ApiError(reason) => Err(EditorError::remote_api(reason)),
        }
    }
}

/// A service that can strip the background off an image
#[async_trait]
pub trait RemovalBackend: Send + Sync {
    /// Attempt to remove the background of `image`
    async fn remove(&self, image: &RgbaImage) -> RemovalOutcome;

    /// Short name used in logs
    fn name(&self) -> &str;
}

#[derive(Debug, Deserialize)]
struct ApiErrorPayload {
    #[serde(default)]
    errors: Vec<ApiErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEntry {
    title: Option<String>,
}

/// Extract the first error title from an API error body
///
/// Falls back to `"API Error"` when the body is not the expected JSON.
#[must_use]
pub fn parse_error_payload(body: &[u8]) -> String {
    serde_json::from_slice::<ApiErrorPayload>(body)
        .ok()
        .and_then(|payload| payload.errors.into_iter().next())
        .and_then(|entry| entry.title)
        .filter(|title| !title.trim().is_empty())
        .unwrap_or_else(|| GENERIC_API_ERROR.to_string())
}

/// HTTP client for the remove.bg API
#[derive(Debug, Clone)]
pub struct RemoveBgClient {
    client: Client,
    api_key: Option<String>,
    endpoint: String,
    size: String,
}

impl RemoveBgClient {
    /// Create a client from the remote settings
    ///
    /// # Errors
    /// - Failed to create HTTP client
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EditorError::network_error("Failed to create HTTP client", e))?;

        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(ToString::to_string);

        Ok(Self {
            client,
            api_key,
            endpoint: config.endpoint.clone(),
            size: config.size.clone(),
        })
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(&self, api_key: &str, png: Vec<u8>) -> RemovalOutcome {
        let part = match multipart::Part::bytes(png)
            .file_name("image.png")
            .mime_str("image/png")
        {
            Ok(part) => part,
            Err(e) => return RemovalOutcome::ApiError(format!("Failed to build upload: {}", e)),
        };
        let form = multipart::Form::new()
            .part("image_file", part)
            .text("size", self.size.clone());

        let response = match self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, api_key)
            .multipart(form)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                log::warn!("Removal API request to {} failed: {}", self.endpoint, e);
                return RemovalOutcome::ApiUnavailable;
            },
        };

        let status = response.status();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                log::warn!("Failed to read removal API response body: {}", e);
                return RemovalOutcome::ApiUnavailable;
            },
        };

        if !status.is_success() {
            let reason = parse_error_payload(&body);
            log::warn!("Removal API returned HTTP {}: {}", status, reason);
            return RemovalOutcome::ApiError(reason);
        }

        match image::load_from_memory(&body) {
            Ok(image) => RemovalOutcome::Success(image.to_rgba8()),
            Err(e) => RemovalOutcome::ApiError(format!("Invalid image in API response: {}", e)),
        }
    }
}

#[async_trait]
impl RemovalBackend for RemoveBgClient {
    async fn remove(&self, image: &RgbaImage) -> RemovalOutcome {
        let Some(api_key) = self.api_key.as_deref() else {
            log::debug!("No API key configured, skipping remote removal");
            return RemovalOutcome::ApiUnavailable;
        };

        let png = match OutputFormatHandler::encode(image, OutputFormat::Png, 100) {
            Ok(png) => png,
            Err(e) => return RemovalOutcome::ApiError(format!("Failed to encode upload: {}", e)),
        };

        tracing::debug!(
            endpoint = %self.endpoint,
            upload_bytes = png.len(),
            width = image.width(),
            height = image.height(),
            "Uploading image to removal API"
        );
        self.send(api_key, png).await
    }

    fn name(&self) -> &str {
        "remove.bg"
    }
}
