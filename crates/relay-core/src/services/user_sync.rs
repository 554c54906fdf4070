use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
    time::Duration,
};

use tokio::{sync::Mutex, time::Instant};

use crate::{
    backend::{payload::UserPayload, BackendClient},
    domain::{ChatInfo, UserId, UserProfile},
    Result,
};

/// Suppresses repeated "sync this user" calls within a TTL window.
///
/// A timestamp is only recorded after the backend accepted the sync, so a
/// failed sync is retried by the user's next event. The map is bounded by
/// `max_entries`; expired entries are pruned first, then the oldest one goes.
pub struct UserSyncCache {
    backend: Arc<BackendClient>,
    ttl: Duration,
    max_entries: usize,
    log: Mutex<SyncLog>,
}

/// Last sync per user plus the same records in sync order.
///
/// Records carry a sequence number. `order` may hold superseded records for
/// users synced again; they are skipped on eviction and compacted once the
/// queue outgrows twice the map size.
#[derive(Default)]
struct SyncLog {
    last: HashMap<UserId, (Instant, u64)>,
    order: VecDeque<(UserId, Instant, u64)>,
    seq: u64,
}

impl SyncLog {
    fn synced_at(&self, user_id: UserId) -> Option<Instant> {
        self.last.get(&user_id).map(|(at, _)| *at)
    }

    fn is_current(&self, user_id: UserId, seq: u64) -> bool {
        self.last.get(&user_id).map(|(_, s)| *s) == Some(seq)
    }

    fn drop_record(&mut self, user_id: UserId, seq: u64) {
        if self.is_current(user_id, seq) {
            self.last.remove(&user_id);
        }
    }

    fn insert(&mut self, user_id: UserId, now: Instant, ttl: Duration, max_entries: usize) {
        while let Some(&(id, at, seq)) = self.order.front() {
            if now.saturating_duration_since(at) < ttl {
                break;
            }
            self.order.pop_front();
            self.drop_record(id, seq);
        }

        if !self.last.contains_key(&user_id) {
            while self.last.len() >= max_entries {
                let Some((id, _, seq)) = self.order.pop_front() else {
                    break;
                };
                self.drop_record(id, seq);
            }
        }

        self.seq += 1;
        self.last.insert(user_id, (now, self.seq));
        self.order.push_back((user_id, now, self.seq));

        if self.order.len() > self.last.len().saturating_mul(2).max(16) {
            let last = &self.last;
            self.order
                .retain(|(id, _, seq)| last.get(id).map(|(_, s)| *s) == Some(*seq));
        }
    }
}

impl UserSyncCache {
    pub fn new(backend: Arc<BackendClient>, ttl: Duration, max_entries: usize) -> Self {
        Self {
            backend,
            ttl,
            max_entries: max_entries.max(1),
            log: Mutex::new(SyncLog::default()),
        }
    }

    pub async fn sync_if_stale(
        &self,
        user: &UserProfile,
        chat: Option<&ChatInfo>,
        partner_id: Option<&str>,
        force: bool,
    ) -> Result<()> {
        if !force && self.is_fresh(user.id).await {
            return Ok(());
        }

        let payload = UserPayload::new(user, chat, partner_id).to_value()?;
        self.backend.sync_user(payload, partner_id).await?;

        self.log
            .lock()
            .await
            .insert(user.id, Instant::now(), self.ttl, self.max_entries);
        tracing::debug!(user_id = user.id.0, "user synced");
        Ok(())
    }

    async fn is_fresh(&self, user_id: UserId) -> bool {
        let log = self.log.lock().await;
        log.synced_at(user_id)
            .map(|at| at.elapsed() < self.ttl)
            .unwrap_or(false)
    }

    #[cfg(test)]
    async fn tracked_users(&self) -> usize {
        self.log.lock().await.last.len()
    }
}
