//! Multipart media upload to the backend's storage endpoint.

use async_trait::async_trait;
use postdeck_core::{MediaFile, MediaUploader};
use postdeck_domain::{PostdeckError, Result};
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use super::backend::normalize_base;
use super::classify::error_reason;
use crate::http::HttpClient;

const UPLOAD_PATH: &str = "video/upload";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    source_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BackendMediaUploader {
    http: HttpClient,
    base_url: Url,
}

impl BackendMediaUploader {
    pub fn new(http: HttpClient, base_url: &str) -> Result<Self> {
        Ok(Self { http, base_url: normalize_base(base_url)? })
    }
}

#[async_trait]
impl MediaUploader for BackendMediaUploader {
    async fn upload(&self, file: MediaFile) -> Result<String> {
        let url = self
            .base_url
            .join(UPLOAD_PATH)
            .map_err(|err| PostdeckError::Config(format!("invalid upload endpoint: {err}")))?;

        let size = file.bytes.len();
        let part = Part::bytes(file.bytes)
            .file_name(file.file_name.clone())
            .mime_str(&file.mime)
            .map_err(|err| PostdeckError::Validation(format!("invalid MIME type: {err}")))?;
        let form = Form::new().part("file", part);

        debug!(file = %file.file_name, size, "Uploading media");
        let response =
            self.http.send_once(self.http.request(Method::POST, url).multipart(form)).await?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| PostdeckError::Network(format!("failed to read upload response: {err}")))?;

        if !status.is_success() {
            let reason = error_reason(status, &text);
            warn!(file = %file.file_name, %status, reason = %reason, "Upload rejected");
            return Err(PostdeckError::Network(format!("upload failed: {reason}")));
        }

        serde_json::from_str::<UploadResponse>(&text)
            .ok()
            .and_then(|r| r.source_path)
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| {
                PostdeckError::Network("upload response did not include a source_path".into())
            })
    }
}
