use std::sync::Arc;

use async_trait::async_trait;

use crate::{messaging::types::InboundEvent, rate_limit::RateLimiter, Result};

use super::{EventContext, Middleware, Next};

/// Drops events from users who already have a ticket in the current window.
/// Nothing is sent back to the user.
pub struct RateLimitStage {
    limiter: Arc<RateLimiter>,
}

impl RateLimitStage {
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self { limiter }
    }
}

#[async_trait]
impl Middleware for RateLimitStage {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    async fn process(
        &self,
        event: &InboundEvent,
        ctx: &mut EventContext,
        next: Next<'_>,
    ) -> Result<()> {
        let user_id = event.user_id();
        if !self.limiter.try_admit(user_id).await {
            tracing::debug!(user_id = user_id.map(|u| u.0), "update rate limited");
            return Ok(());
        }
        next.run(event, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::UserProfile,
        messaging::types::InlineQuery,
        pipeline::{EventHandler, Pipeline},
        rate_limit::InMemoryTicketStore,
    };
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    #[derive(Default)]
    struct Counting(AtomicUsize);

    #[async_trait]
    impl EventHandler for Counting {
        async fn handle(&self, _event: &InboundEvent, _ctx: &EventContext) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn from_user(id: i64) -> InboundEvent {
        InboundEvent::InlineQuery(InlineQuery {
            from: UserProfile::new(id, "Ann"),
            query: String::new(),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn second_event_in_window_is_dropped() {
        let limiter = Arc::new(RateLimiter::new(
            Arc::new(InMemoryTicketStore::default()),
            Duration::from_millis(500),
            "bot",
        ));
        let handler = Arc::new(Counting::default());
        let p = Pipeline::new(handler.clone()).with_stage(RateLimitStage::new(limiter));

        p.dispatch(&from_user(1)).await.unwrap();
        p.dispatch(&from_user(1)).await.unwrap();
        p.dispatch(&from_user(2)).await.unwrap();
        p.dispatch(&InboundEvent::Other).await.unwrap();
        assert_eq!(handler.0.load(Ordering::SeqCst), 3);

        tokio::time::advance(Duration::from_millis(600)).await;
        p.dispatch(&from_user(1)).await.unwrap();
        assert_eq!(handler.0.load(Ordering::SeqCst), 4);
    }
}
