//! Publish gateway backed by the local video backend.
//!
//! Every platform has its own endpoint and payload shape. Credentials are
//! read from [`CredentialStore`] on each call so edits made in settings apply
//! to the next publish without a restart.

use async_trait::async_trait;
use postdeck_core::PublishGateway;
use postdeck_domain::{
    Platform, PostdeckError, Privacy, PublishFailure, PublishReceipt, PublishRequest, Result,
};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use url::Url;

use super::classify::classify_status;
use crate::credentials::CredentialStore;
use crate::http::HttpClient;

const YOUTUBE_PUBLISH_PATH: &str = "video/publish-youtube";
const YOUTUBE_AUTH_STATUS_PATH: &str = "video/youtube/auth-status";
const FACEBOOK_POST_PATH: &str = "video/facebook/post";
const LINKEDIN_POST_PATH: &str = "api/social/linkedin/post";

#[derive(Debug, Deserialize)]
struct PublishResponse {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AuthStatus {
    #[serde(default)]
    configured: bool,
    #[serde(default)]
    authenticated: bool,
}

/// [`PublishGateway`] that talks to the backend over HTTP.
#[derive(Debug, Clone)]
pub struct BackendPublishGateway {
    http: HttpClient,
    base_url: Url,
    credentials: CredentialStore,
}

impl BackendPublishGateway {
    pub fn new(http: HttpClient, base_url: &str, credentials: CredentialStore) -> Result<Self> {
        Ok(Self { http, base_url: normalize_base(base_url)?, credentials })
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    fn endpoint(&self, path: &str) -> std::result::Result<Url, PublishFailure> {
        self.base_url
            .join(path)
            .map_err(|err| PublishFailure::UnknownError(format!("invalid endpoint {path}: {err}")))
    }

    /// YouTube is configured once the backend reports a live OAuth session.
    /// A positive answer is cached in the credential store.
    async fn youtube_configured(&self) -> bool {
        if matches!(self.credentials.youtube_auth_done(), Ok(true)) {
            return true;
        }

        let Ok(url) = self.endpoint(YOUTUBE_AUTH_STATUS_PATH) else {
            return false;
        };
        let status = match self.http.send(self.http.request(Method::GET, url)).await {
            Ok(response) if response.status().is_success() => {
                response.json::<AuthStatus>().await.unwrap_or_default()
            }
            Ok(response) => {
                debug!(status = %response.status(), "YouTube auth status unavailable");
                return false;
            }
            Err(err) => {
                debug!(error = %err, "YouTube auth status probe failed");
                return false;
            }
        };

        let ready = status.configured && status.authenticated;
        if ready {
            if let Err(err) = self.credentials.set_youtube_auth_done(true) {
                warn!(error = %err, "Failed to cache YouTube auth flag");
            }
        }
        ready
    }

    async fn publish_youtube(
        &self,
        request: &PublishRequest,
    ) -> std::result::Result<PublishReceipt, PublishFailure> {
        if !self.youtube_configured().await {
            return Err(PublishFailure::NotConfigured("YouTube account is not connected".into()));
        }
        let path = request
            .media_path
            .as_deref()
            .filter(|p| Platform::YouTube.accepts_path(p))
            .ok_or_else(|| {
                PublishFailure::InvalidMedia("YouTube uploads require an .mp4 video".into())
            })?;

        let body = json!({
            "path": path,
            "title": request.title,
            "description": request.description,
            "hashtags": "",
            "privacy": request.privacy.unwrap_or(Privacy::Private).as_str(),
        });
        self.post_json(Platform::YouTube, YOUTUBE_PUBLISH_PATH, body).await
    }

    async fn publish_facebook(
        &self,
        request: &PublishRequest,
    ) -> std::result::Result<PublishReceipt, PublishFailure> {
        let config = self
            .credentials
            .facebook()
            .map_err(storage_failure)?
            .filter(|c| c.is_complete())
            .ok_or_else(|| PublishFailure::NotConfigured("Facebook page credentials missing".into()))?;
        let token = config.posting_token().unwrap_or_default();

        let body = json!({
            "access_token": token,
            "page_id": config.page_id,
            "title": request.title,
            "description": request.description,
            "media_path": request.media_path,
        });
        self.post_json(Platform::Facebook, FACEBOOK_POST_PATH, body).await
    }

    async fn publish_linkedin(
        &self,
        request: &PublishRequest,
    ) -> std::result::Result<PublishReceipt, PublishFailure> {
        let config = self
            .credentials
            .linkedin()
            .map_err(storage_failure)?
            .filter(|c| c.is_complete())
            .ok_or_else(|| PublishFailure::NotConfigured("LinkedIn credentials missing".into()))?;

        let body = json!({
            "access_token": config.access_token,
            "member_id": config.member_id,
            "title": request.title,
            "description": request.description,
            "file_path": request.media_path,
        });
        self.post_json(Platform::LinkedIn, LINKEDIN_POST_PATH, body).await
    }

    async fn post_json(
        &self,
        platform: Platform,
        path: &str,
        body: Value,
    ) -> std::result::Result<PublishReceipt, PublishFailure> {
        let url = self.endpoint(path)?;
        let builder = self.http.request(Method::POST, url).json(&body);
        let response = self.http.send(builder).await.map_err(transport_failure)?;

        let status = response.status();
        let text = response.text().await.map_err(|err| {
            PublishFailure::TransientNetworkError(format!("failed to read response body: {err}"))
        })?;

        if !status.is_success() {
            let failure = classify_status(platform, status, &text);
            warn!(%platform, %status, category = failure.category(), "Publish rejected by backend");
            return Err(failure);
        }

        let published_url = serde_json::from_str::<PublishResponse>(&text)
            .ok()
            .and_then(|r| r.url)
            .filter(|u| !u.trim().is_empty());
        info!(%platform, url = published_url.as_deref().unwrap_or(""), "Published");
        Ok(PublishReceipt { published_url })
    }
}

#[async_trait]
impl PublishGateway for BackendPublishGateway {
    async fn publish(
        &self,
        request: PublishRequest,
    ) -> std::result::Result<PublishReceipt, PublishFailure> {
        match request.platform {
            Platform::YouTube => self.publish_youtube(&request).await,
            Platform::Facebook => self.publish_facebook(&request).await,
            Platform::LinkedIn => self.publish_linkedin(&request).await,
            Platform::TikTok => {
                Err(PublishFailure::Unsupported("the backend has no TikTok endpoint".into()))
            }
        }
    }
}

/// Parse the base URL so that relative endpoint paths keep any path prefix.
pub(crate) fn normalize_base(base_url: &str) -> Result<Url> {
    let trimmed = base_url.trim();
    let with_slash =
        if trimmed.ends_with('/') { trimmed.to_string() } else { format!("{trimmed}/") };
    Url::parse(&with_slash)
        .map_err(|err| PostdeckError::Config(format!("invalid backend URL '{trimmed}': {err}")))
}

fn transport_failure(err: PostdeckError) -> PublishFailure {
    match err {
        PostdeckError::Network(detail) => PublishFailure::TransientNetworkError(detail),
        other => PublishFailure::UnknownError(other.to_string()),
    }
}

fn storage_failure(err: PostdeckError) -> PublishFailure {
    PublishFailure::UnknownError(format!("could not read credentials: {err}"))
}
