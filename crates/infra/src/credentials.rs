//! Per-platform credential records kept in the local key-value store.
//!
//! Records are plain JSON under fixed keys. YouTube has no record of its own:
//! the backend holds the OAuth session and the store only remembers that
//! authentication succeeded once.

use std::sync::Arc;

use postdeck_core::KeyValueStore;
use postdeck_domain::constants::{FACEBOOK_CONFIG_KEY, LINKEDIN_CONFIG_KEY, YOUTUBE_AUTH_FLAG_KEY};
use postdeck_domain::{Platform, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::InfraError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedInConfig {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub member_id: String,
}

impl LinkedInConfig {
    pub fn is_complete(&self) -> bool {
        !self.access_token.trim().is_empty() && !self.member_id.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacebookConfig {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub app_id: String,
    #[serde(default)]
    pub app_secret: String,
    #[serde(default)]
    pub page_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
}

impl FacebookConfig {
    /// Page token when present, else the user access token.
    pub fn posting_token(&self) -> Option<&str> {
        self.page_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| Some(self.access_token.as_str()).filter(|t| !t.trim().is_empty()))
    }

    pub fn is_complete(&self) -> bool {
        self.posting_token().is_some() && !self.page_id.trim().is_empty()
    }
}

/// Typed access to the credential records.
#[derive(Clone)]
pub struct CredentialStore {
    kv: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore").finish_non_exhaustive()
    }
}

impl CredentialStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    pub fn linkedin(&self) -> Result<Option<LinkedInConfig>> {
        self.read(LINKEDIN_CONFIG_KEY)
    }

    pub fn save_linkedin(&self, config: &LinkedInConfig) -> Result<()> {
        self.write(LINKEDIN_CONFIG_KEY, config)
    }

    pub fn facebook(&self) -> Result<Option<FacebookConfig>> {
        self.read(FACEBOOK_CONFIG_KEY)
    }

    pub fn save_facebook(&self, config: &FacebookConfig) -> Result<()> {
        self.write(FACEBOOK_CONFIG_KEY, config)
    }

    pub fn youtube_auth_done(&self) -> Result<bool> {
        Ok(self.kv.get(YOUTUBE_AUTH_FLAG_KEY)?.is_some_and(|v| v.trim() == "1"))
    }

    pub fn set_youtube_auth_done(&self, done: bool) -> Result<()> {
        if done {
            self.kv.set(YOUTUBE_AUTH_FLAG_KEY, "1")
        } else {
            self.kv.remove(YOUTUBE_AUTH_FLAG_KEY)
        }
    }

    /// Whether the locally stored record is enough to publish.
    ///
    /// For YouTube this only reflects the cached flag; the gateway also asks
    /// the backend when the flag is missing.
    pub fn is_configured(&self, platform: Platform) -> Result<bool> {
        Ok(match platform {
            Platform::LinkedIn => self.linkedin()?.is_some_and(|c| c.is_complete()),
            Platform::Facebook => self.facebook()?.is_some_and(|c| c.is_complete()),
            Platform::YouTube => self.youtube_auth_done()?,
            Platform::TikTok => false,
        })
    }

    /// Forget the stored credentials for `platform`.
    pub fn clear(&self, platform: Platform) -> Result<()> {
        match platform {
            Platform::LinkedIn => self.kv.remove(LINKEDIN_CONFIG_KEY),
            Platform::Facebook => self.kv.remove(FACEBOOK_CONFIG_KEY),
            Platform::YouTube => self.set_youtube_auth_done(false),
            Platform::TikTok => Ok(()),
        }
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.kv.get(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!(key, error = %err, "Ignoring malformed credential record");
                Ok(None)
            }
        }
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value).map_err(InfraError::from)?;
        self.kv.set(key, &raw)
    }
}
