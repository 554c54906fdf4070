use std::{sync::Mutex, time::Duration};

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use tokio::{
    sync::OnceCell,
    time::{timeout, Instant},
};

use crate::{
    errors::{Error, StoreError},
    Result,
};

use super::TicketStore;

/// Bounds on every Redis interaction. Admission must never wait on Redis for
/// longer than `operation`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RedisTimeouts {
    pub connect: Duration,
    pub response: Duration,
    pub operation: Duration,
    /// After a failed connect, calls fail immediately for this long.
    pub reconnect_cooldown: Duration,
}

impl Default for RedisTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_millis(500),
            response: Duration::from_millis(500),
            operation: Duration::from_secs(1),
            reconnect_cooldown: Duration::from_secs(5),
        }
    }
}

/// Redis-backed ticket store shared by every bot instance.
///
/// The connection is opened lazily on first use, so the bot starts even while
/// Redis is down; until it comes up the limiter fails open.
pub struct RedisTicketStore {
    client: redis::Client,
    timeouts: RedisTimeouts,
    conn: OnceCell<ConnectionManager>,
    last_connect_failure: Mutex<Option<Instant>>,
}

impl RedisTicketStore {
    pub fn open(url: &str) -> Result<Self> {
        Self::with_timeouts(url, RedisTimeouts::default())
    }

    pub fn with_timeouts(url: &str, timeouts: RedisTimeouts) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| Error::Config(format!("invalid REDIS_URL: {e}")))?;
        Ok(Self {
            client,
            timeouts,
            conn: OnceCell::new(),
            last_connect_failure: Mutex::new(None),
        })
    }

    fn cooling_down(&self) -> bool {
        let last = self
            .last_connect_failure
            .lock()
            .map(|g| *g)
            .unwrap_or(None);
        last.is_some_and(|at| at.elapsed() < self.timeouts.reconnect_cooldown)
    }

    fn mark_connect_failure(&self) {
        if let Ok(mut last) = self.last_connect_failure.lock() {
            *last = Some(Instant::now());
        }
    }

    async fn connect(&self) -> std::result::Result<ConnectionManager, StoreError> {
        if self.cooling_down() {
            return Err(StoreError("redis unavailable, reconnect cooling down".to_string()));
        }

        let config = ConnectionManagerConfig::new()
            .set_number_of_retries(1)
            .set_max_delay(100)
            .set_connection_timeout(self.timeouts.connect)
            .set_response_timeout(self.timeouts.response);
        let connecting = ConnectionManager::new_with_config(self.client.clone(), config);

        let outcome = match timeout(self.timeouts.connect * 2, connecting).await {
            Ok(Ok(conn)) => Ok(conn),
            Ok(Err(e)) => Err(StoreError::from(e)),
            Err(_) => Err(StoreError("redis connect timed out".to_string())),
        };
        if let Err(e) = &outcome {
            tracing::warn!(error = %e, "redis connect failed");
            self.mark_connect_failure();
        }
        outcome
    }

    async fn connection(&self) -> std::result::Result<ConnectionManager, StoreError> {
        let conn = self.conn.get_or_try_init(|| self.connect()).await?;
        Ok(conn.clone())
    }

    async fn set_nx_px(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> std::result::Result<bool, StoreError> {
        let mut conn = self.connection().await?;
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);

        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(ttl_ms)
            .arg("NX")
            .query_async(&mut conn)
            .await?;

        Ok(reply.is_some())
    }
}

#[async_trait]
impl TicketStore for RedisTicketStore {
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> std::result::Result<bool, StoreError> {
        timeout(self.timeouts.operation, self.set_nx_px(key, value, ttl))
            .await
            .map_err(|_| StoreError("redis operation timed out".to_string()))?
    }
}
