//! Maps backend responses onto the publish failure taxonomy.

use once_cell::sync::Lazy;
use postdeck_domain::{Platform, PublishFailure};
use regex::Regex;
use reqwest::StatusCode;
use serde_json::Value;

static QUOTA_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)exceeded|quota|limit").ok());

static FACEBOOK_PERMISSION_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"(?i)(pages_manage_posts|pages_read_engagement|publish_to_groups|code\W*200)").ok()
});

fn hits(pattern: &Lazy<Option<Regex>>, text: &str) -> bool {
    Lazy::force(pattern).as_ref().is_some_and(|re| re.is_match(text))
}

/// Human-readable reason from an error body.
///
/// JSON bodies contribute `detail`, `error` or `message` (first non-empty,
/// strings or nested objects); anything else is used verbatim.
pub(crate) fn error_reason(status: StatusCode, body: &str) -> String {
    let trimmed = body.trim();
    if let Ok(json) = serde_json::from_str::<Value>(trimmed) {
        for field in ["detail", "error", "message"] {
            match json.get(field) {
                Some(Value::String(s)) if !s.trim().is_empty() => return s.trim().to_string(),
                Some(Value::Null) | None => {}
                Some(other) => return other.to_string(),
            }
        }
    }
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        trimmed.to_string()
    }
}

/// Classify a non-success response from a publish endpoint.
pub(crate) fn classify_status(platform: Platform, status: StatusCode, body: &str) -> PublishFailure {
    let reason = error_reason(status, body);

    if status == StatusCode::TOO_MANY_REQUESTS {
        return PublishFailure::RateLimited(reason);
    }
    if platform == Platform::YouTube && hits(&QUOTA_PATTERN, &reason) {
        return PublishFailure::QuotaExceeded(reason);
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return PublishFailure::PermissionDenied(reason);
    }
    if platform == Platform::Facebook && hits(&FACEBOOK_PERMISSION_PATTERN, &reason) {
        return PublishFailure::PermissionDenied(reason);
    }
    if matches!(
        status,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
    ) {
        return PublishFailure::TransientNetworkError(reason);
    }
    PublishFailure::UnknownError(reason)
}
