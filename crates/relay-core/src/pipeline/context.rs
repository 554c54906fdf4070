use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    backend::BackendClient,
    errors::Error,
    messaging::types::InboundEvent,
    services::{PartnerResolver, Services, UserSyncCache},
    Result,
};

use super::{Middleware, Next};

/// Per-event data filled in by the stages and read by handlers.
#[derive(Default, Clone)]
pub struct EventContext {
    pub partner_id: Option<String>,
    pub backend: Option<Arc<BackendClient>>,
    pub user_sync: Option<Arc<UserSyncCache>>,
}

impl EventContext {
    pub fn partner_id(&self) -> Option<&str> {
        self.partner_id.as_deref()
    }

    pub fn backend(&self) -> Result<&BackendClient> {
        self.backend
            .as_deref()
            .ok_or(Error::MissingContext("backend"))
    }

    pub fn user_sync(&self) -> Result<&UserSyncCache> {
        self.user_sync
            .as_deref()
            .ok_or(Error::MissingContext("user_sync"))
    }
}

/// Resolves the partner id and hands out service handles.
pub struct ContextStage {
    backend: Arc<BackendClient>,
    partner: Arc<PartnerResolver>,
    user_sync: Arc<UserSyncCache>,
}

impl ContextStage {
    pub fn new(services: &Services) -> Self {
        Self {
            backend: services.backend.clone(),
            partner: services.partner.clone(),
            user_sync: services.user_sync.clone(),
        }
    }
}

#[async_trait]
impl Middleware for ContextStage {
    fn name(&self) -> &'static str {
        "context"
    }

    async fn process(
        &self,
        event: &InboundEvent,
        ctx: &mut EventContext,
        next: Next<'_>,
    ) -> Result<()> {
        ctx.partner_id = self.partner.resolve_partner_id().await;
        ctx.backend = Some(self.backend.clone());
        ctx.user_sync = Some(self.user_sync.clone());
        next.run(event, ctx).await
    }
}
