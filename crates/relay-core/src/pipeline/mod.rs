//! Ordered middleware chain wrapped around event handling.
//!
//! Each stage receives the event, the per-event context and a [`Next`]
//! continuation. A stage either calls `next.run(..)` or returns without it,
//! which ends the chain for that event.

mod admission;
mod context;
mod logging;
mod recovery;

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    messaging::{port::MessagingPort, types::InboundEvent},
    services::Services,
    Result,
};

pub use admission::RateLimitStage;
pub use context::{ContextStage, EventContext};
pub use logging::LoggingStage;
pub use recovery::ErrorRecoveryStage;

/// Final consumer of an event once every stage let it through.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &InboundEvent, ctx: &EventContext) -> Result<()>;
}

#[async_trait]
pub trait Middleware: Send + Sync {
    fn name(&self) -> &'static str;

    async fn process(
        &self,
        event: &InboundEvent,
        ctx: &mut EventContext,
        next: Next<'_>,
    ) -> Result<()>;
}

/// The remainder of the chain after the current stage.
pub struct Next<'a> {
    stages: &'a [Arc<dyn Middleware>],
    handler: &'a dyn EventHandler,
}

impl<'a> Next<'a> {
    pub async fn run(self, event: &InboundEvent, ctx: &mut EventContext) -> Result<()> {
        match self.stages.split_first() {
            Some((stage, rest)) => {
                let next = Next {
                    stages: rest,
                    handler: self.handler,
                };
                stage.process(event, ctx, next).await
            }
            None => self.handler.handle(event, ctx).await,
        }
    }
}

pub struct Pipeline {
    stages: Vec<Arc<dyn Middleware>>,
    handler: Arc<dyn EventHandler>,
}

impl Pipeline {
    pub fn new(handler: Arc<dyn EventHandler>) -> Self {
        Self {
            stages: Vec::new(),
            handler,
        }
    }

    pub fn with_stage(mut self, stage: impl Middleware + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    /// logging -> rate limit -> context injection -> error recovery -> handler.
    pub fn standard(
        services: &Services,
        messenger: Arc<dyn MessagingPort>,
        handler: Arc<dyn EventHandler>,
    ) -> Self {
        Self::new(handler)
            .with_stage(LoggingStage)
            .with_stage(RateLimitStage::new(services.rate_limiter.clone()))
            .with_stage(ContextStage::new(services))
            .with_stage(ErrorRecoveryStage::new(messenger))
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run one event through the whole chain with a fresh context.
    ///
    /// Errors returned here escaped every stage and belong to the top-level
    /// handler (`handlers::errors::report_unhandled`).
    pub async fn dispatch(&self, event: &InboundEvent) -> Result<()> {
        let mut ctx = EventContext::default();
        Next {
            stages: &self.stages,
            handler: self.handler.as_ref(),
        }
        .run(event, &mut ctx)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        errors::Error,
        rate_limit::{InMemoryTicketStore, RateLimiter},
        services::{PartnerResolver, UserSyncCache},
        testing::{backend, FakeMessenger, RoutedTransport},
    };
    use std::{sync::Mutex, time::Duration};

    /// Appends its name to a shared trace; optionally stops the chain.
    struct Tracer {
        name: &'static str,
        trace: Arc<Mutex<Vec<String>>>,
        stop: bool,
    }

    #[async_trait]
    impl Middleware for Tracer {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn process(
            &self,
            event: &InboundEvent,
            ctx: &mut EventContext,
            next: Next<'_>,
        ) -> Result<()> {
            self.trace.lock().unwrap().push(format!("{}:in", self.name));
            if self.stop {
                return Ok(());
            }
            let res = next.run(event, ctx).await;
            self.trace.lock().unwrap().push(format!("{}:out", self.name));
            res
        }
    }

    struct RecordingHandler {
        trace: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    #[async_trait]
    impl EventHandler for RecordingHandler {
        async fn handle(&self, _event: &InboundEvent, _ctx: &EventContext) -> Result<()> {
            self.trace.lock().unwrap().push("handler".to_string());
            if self.fail {
                return Err(Error::External("boom".to_string()));
            }
            Ok(())
        }
    }

    fn pipeline(
        trace: &Arc<Mutex<Vec<String>>>,
        stop_at: Option<&'static str>,
        fail: bool,
    ) -> Pipeline {
        let stage = |name| Tracer {
            name,
            trace: trace.clone(),
            stop: stop_at == Some(name),
        };
        Pipeline::new(Arc::new(RecordingHandler {
            trace: trace.clone(),
            fail,
        }))
        .with_stage(stage("a"))
        .with_stage(stage("b"))
    }

    #[tokio::test]
    async fn stages_wrap_the_handler_in_order() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let p = pipeline(&trace, None, false);

        p.dispatch(&InboundEvent::Other).await.unwrap();

        assert_eq!(p.stage_names(), ["a", "b"]);
        assert_eq!(
            *trace.lock().unwrap(),
            ["a:in", "b:in", "handler", "b:out", "a:out"]
        );
    }

    #[tokio::test]
    async fn a_stage_can_short_circuit() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        pipeline(&trace, Some("a"), false)
            .dispatch(&InboundEvent::Other)
            .await
            .unwrap();
        assert_eq!(*trace.lock().unwrap(), ["a:in"]);
    }

    #[tokio::test]
    async fn handler_errors_propagate_through_outer_stages() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let err = pipeline(&trace, None, true)
            .dispatch(&InboundEvent::Other)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::External(_)));
        assert_eq!(trace.lock().unwrap().last().map(String::as_str), Some("a:out"));
    }

    #[test]
    fn standard_pipeline_runs_stages_in_order() {
        let backend = backend(RoutedTransport::new());
        let services = Services {
            partner: Arc::new(PartnerResolver::new(backend.clone(), None)),
            user_sync: Arc::new(UserSyncCache::new(backend.clone(), Duration::from_secs(60), 10)),
            rate_limiter: Arc::new(RateLimiter::new(
                Arc::new(InMemoryTicketStore::default()),
                Duration::from_millis(500),
                "bot",
            )),
            backend,
        };
        let handler = Arc::new(RecordingHandler {
            trace: Arc::new(Mutex::new(Vec::new())),
            fail: false,
        });

        let p = Pipeline::standard(&services, FakeMessenger::new(), handler);

        assert_eq!(
            p.stage_names(),
            ["logging", "rate_limit", "context", "error_recovery"]
        );
    }
}
