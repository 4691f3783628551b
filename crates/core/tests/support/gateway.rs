//! Mock publish gateway with scripted outcomes.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use postdeck_core::PublishGateway;
use postdeck_domain::{PublishFailure, PublishReceipt, PublishRequest};
use tokio::sync::Notify;

type Outcome = Result<PublishReceipt, PublishFailure>;

/// Gateway that replays queued outcomes and records every request.
///
/// When the script runs dry every further call succeeds with a fixed URL.
#[derive(Clone, Default)]
pub struct ScriptedGateway {
    script: Arc<Mutex<VecDeque<Outcome>>>,
    requests: Arc<Mutex<Vec<PublishRequest>>>,
    calls: Arc<AtomicUsize>,
    gate: Option<Arc<Notify>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a failure for the next call.
    pub fn fail_next(self, failure: PublishFailure) -> Self {
        self.script.lock().push_back(Err(failure));
        self
    }

    /// Queue a success for the next call.
    pub fn succeed_next(self, url: &str) -> Self {
        self.script.lock().push_back(Ok(PublishReceipt { published_url: Some(url.to_string()) }));
        self
    }

    /// Block every call until the returned handle is notified.
    pub fn gated(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<PublishRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl PublishGateway for ScriptedGateway {
    async fn publish(&self, request: PublishRequest) -> Outcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(PublishReceipt { published_url: Some("https://example.test/post".into()) }))
    }
}
