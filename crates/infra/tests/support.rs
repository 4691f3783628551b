//! Shared wiring for infra integration tests: a real JSON file store, the
//! backend gateway pointed at a mock server, and a pinned clock.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use postdeck_core::{
    CalendarStore, KeyValueStore, ManualClock, PublishGateway, SchedulingService, TimezoneResolver,
};
use postdeck_domain::{DateKey, PublishFailure, PublishReceipt, PublishRequest, TimeOfDay};
use postdeck_infra::{BackendPublishGateway, CredentialStore, HttpClient, JsonFileStore};
use tempfile::TempDir;

/// Full stack over a temporary store file. The directory lives as long as
/// the struct.
pub struct TestStack {
    pub service: Arc<SchedulingService>,
    pub store: Arc<CalendarStore>,
    pub credentials: CredentialStore,
    pub clock: ManualClock,
    pub store_path: std::path::PathBuf,
    _dir: TempDir,
}

/// Clock pinned at 2025-06-15 10:00 UTC.
pub fn pinned_clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2025, 6, 15, 10, 0, 0).unwrap())
}

pub fn test_http_client() -> HttpClient {
    HttpClient::builder()
        .timeout(Duration::from_secs(5))
        .base_backoff(Duration::from_millis(5))
        .max_attempts(2)
        .build()
        .expect("http client")
}

/// Stack whose gateway talks to `backend_url`.
pub fn backend_stack(backend_url: &str) -> TestStack {
    let dir = TempDir::new().expect("temp dir");
    let store_path = dir.path().join("postdeck-store.json");
    let kv: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::open(&store_path).expect("file store"));
    let credentials = CredentialStore::new(Arc::clone(&kv));
    let gateway =
        BackendPublishGateway::new(test_http_client(), backend_url, credentials.clone()).expect("gateway");
    stack_with(kv, credentials, Arc::new(gateway), dir, store_path)
}

/// Stack with an arbitrary gateway.
pub fn stack_with_gateway(gateway: Arc<dyn PublishGateway>) -> TestStack {
    let dir = TempDir::new().expect("temp dir");
    let store_path = dir.path().join("postdeck-store.json");
    let kv: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::open(&store_path).expect("file store"));
    let credentials = CredentialStore::new(Arc::clone(&kv));
    stack_with(kv, credentials, gateway, dir, store_path)
}

fn stack_with(
    kv: Arc<dyn KeyValueStore>,
    credentials: CredentialStore,
    gateway: Arc<dyn PublishGateway>,
    dir: TempDir,
    store_path: std::path::PathBuf,
) -> TestStack {
    let clock = pinned_clock();
    let store = Arc::new(CalendarStore::load(kv));
    let resolver = TimezoneResolver::new(Arc::new(clock.clone()));
    let service = Arc::new(SchedulingService::new(Arc::clone(&store), gateway, resolver));
    TestStack { service, store, credentials, clock, store_path, _dir: dir }
}

/// Gateway whose publish never completes.
pub struct HangingGateway;

#[async_trait]
impl PublishGateway for HangingGateway {
    async fn publish(&self, _request: PublishRequest) -> Result<PublishReceipt, PublishFailure> {
        std::future::pending().await
    }
}

/// Gateway that always succeeds without a URL.
pub struct AcceptingGateway;

#[async_trait]
impl PublishGateway for AcceptingGateway {
    async fn publish(&self, _request: PublishRequest) -> Result<PublishReceipt, PublishFailure> {
        Ok(PublishReceipt::default())
    }
}

pub fn date(s: &str) -> DateKey {
    s.parse().unwrap()
}

pub fn time(s: &str) -> TimeOfDay {
    s.parse().unwrap()
}
