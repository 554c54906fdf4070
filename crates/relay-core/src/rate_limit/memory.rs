use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use tokio::{sync::Mutex, time::Instant};

use crate::errors::StoreError;

use super::TicketStore;

/// Sweep expired tickets once the map grows past this many keys.
const SWEEP_THRESHOLD: usize = 1024;

/// Process-local ticket store.
///
/// Only safe for single-instance deployments; multi-instance setups need the
/// Redis store so tickets are shared.
#[derive(Debug, Default)]
pub struct InMemoryTicketStore {
    expires_at: Mutex<HashMap<String, Instant>>,
}

#[async_trait]
impl TicketStore for InMemoryTicketStore {
    async fn set_if_absent(
        &self,
        key: &str,
        _value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let now = Instant::now();
        let mut map = self.expires_at.lock().await;

        if map.len() >= SWEEP_THRESHOLD {
            map.retain(|_, exp| *exp > now);
        }

        match map.get(key) {
            Some(exp) if *exp > now => Ok(false),
            _ => {
                map.insert(key.to_string(), now + ttl);
                Ok(true)
            }
        }
    }
}
