//! Distributed per-user admission control.
//!
//! A user is admitted when no ticket exists for them in the shared store; the
//! ticket is created atomically with a TTL equal to the window, so the
//! check-and-set cannot race across tasks or processes.

mod memory;
mod redis_store;

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;

use crate::{domain::UserId, errors::StoreError};

pub use memory::InMemoryTicketStore;
pub use redis_store::RedisTicketStore;

/// Shared key-value store able to do an atomic conditional set with expiry.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Create `key` with `ttl` unless it already exists (`SET key value PX ttl NX`).
    /// Returns `true` when the key was created.
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError>;
}

pub struct RateLimiter {
    store: Arc<dyn TicketStore>,
    window: Duration,
    prefix: String,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn TicketStore>, window: Duration, prefix: impl Into<String>) -> Self {
        Self {
            store,
            window,
            prefix: prefix.into(),
        }
    }

    /// Tickets have millisecond resolution; anything shorter disables limiting.
    pub fn is_enabled(&self) -> bool {
        self.window.as_millis() > 0
    }

    pub fn ticket_key(&self, user_id: UserId) -> String {
        format!("{}:rate:{}", self.prefix, user_id.0)
    }

    /// Admission decision for one event. Fails open on store errors.
    pub async fn try_admit(&self, user_id: Option<UserId>) -> bool {
        let Some(user_id) = user_id else {
            return true;
        };
        if !self.is_enabled() {
            return true;
        }

        match self
            .store
            .set_if_absent(&self.ticket_key(user_id), "1", self.window)
            .await
        {
            Ok(admitted) => admitted,
            Err(e) => {
                tracing::warn!(user_id = user_id.0, error = %e, "rate limit store error");
                true
            }
        }
    }
}
