//! Long-lived services shared by every event, built once at startup.

pub mod partner;
pub mod user_sync;

use std::sync::Arc;

use crate::{
    backend::BackendClient,
    config::Config,
    rate_limit::{RateLimiter, RedisTicketStore},
    Result,
};

pub use partner::PartnerResolver;
pub use user_sync::UserSyncCache;

/// Dependency container handed to the pipeline.
#[derive(Clone)]
pub struct Services {
    pub backend: Arc<BackendClient>,
    pub partner: Arc<PartnerResolver>,
    pub user_sync: Arc<UserSyncCache>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl Services {
    /// Production wiring: reqwest transport and Redis tickets.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let backend = Arc::new(BackendClient::from_config(cfg)?);
        let store = Arc::new(RedisTicketStore::open(&cfg.redis_url)?);
        let rate_limiter = Arc::new(RateLimiter::new(
            store,
            cfg.rate_limit_window,
            cfg.redis_prefix.clone(),
        ));
        Ok(Self::new(backend, rate_limiter, cfg))
    }

    pub fn new(backend: Arc<BackendClient>, rate_limiter: Arc<RateLimiter>, cfg: &Config) -> Self {
        let partner = Arc::new(PartnerResolver::new(
            backend.clone(),
            cfg.partner_id.clone(),
        ));
        let user_sync = Arc::new(UserSyncCache::new(
            backend.clone(),
            cfg.user_sync_ttl,
            cfg.user_sync_max_entries,
        ));
        Self {
            backend,
            partner,
            user_sync,
            rate_limiter,
        }
    }
}
