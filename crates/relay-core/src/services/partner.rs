use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use serde_json::Value;
use tokio::sync::{Mutex, OnceCell};

use crate::backend::BackendClient;

/// Resolves the partner id once per process and caches it forever.
///
/// Resolution is best-effort: a backend failure is logged and the caller gets
/// `None` (nothing is cached, so the next event tries again). Concurrent misses
/// share a single resolution attempt, successful or not.
pub struct PartnerResolver {
    backend: Arc<BackendClient>,
    cached: OnceCell<String>,
    inflight: Mutex<()>,
    /// Number of finished resolution attempts.
    attempts: AtomicU64,
}

impl PartnerResolver {
    /// `seed` is the statically configured partner id, if any.
    pub fn new(backend: Arc<BackendClient>, seed: Option<String>) -> Self {
        Self {
            backend,
            cached: OnceCell::new_with(seed.filter(|s| !s.trim().is_empty())),
            inflight: Mutex::new(()),
            attempts: AtomicU64::new(0),
        }
    }

    pub fn cached(&self) -> Option<&str> {
        self.cached.get().map(String::as_str)
    }

    pub async fn resolve_partner_id(&self) -> Option<String> {
        if let Some(id) = self.cached.get() {
            return Some(id.clone());
        }

        let seen = self.attempts.load(Ordering::Acquire);
        let _guard = self.inflight.lock().await;
        // Someone else may have resolved it while we waited.
        if let Some(id) = self.cached.get() {
            return Some(id.clone());
        }
        // An attempt finished while we waited and found nothing; share its outcome.
        if self.attempts.load(Ordering::Acquire) != seen {
            return None;
        }

        let outcome = self.resolve_once().await;
        self.attempts.fetch_add(1, Ordering::Release);
        outcome
    }

    async fn resolve_once(&self) -> Option<String> {
        match self.backend.resolve_partner().await {
            Ok(resp) => {
                let Some(id) = partner_id_from(&resp) else {
                    tracing::warn!("partner response carried no partner id");
                    return None;
                };
                tracing::info!(partner_id = %id, "partner resolved");
                let _ = self.cached.set(id.clone());
                Some(id)
            }
            Err(e) => {
                tracing::warn!(error = %e, "partner resolution failed");
                self.cached().map(str::to_string)
            }
        }
    }
}

/// `partner_id` wins over `id`; numeric ids are stringified.
fn partner_id_from(resp: &Value) -> Option<String> {
    ["partner_id", "id"]
        .iter()
        .find_map(|key| match resp.get(*key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}
