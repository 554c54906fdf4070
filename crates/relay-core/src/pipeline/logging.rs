use std::time::Instant;

use async_trait::async_trait;

use crate::{messaging::types::InboundEvent, Result};

use super::{EventContext, Middleware, Next};

/// Logs every update on the way in and on the way out.
pub struct LoggingStage;

/// Emits `update_processed` when dropped, so the completion line is written
/// on success, on error and when the event future is cancelled.
struct CompletionLog {
    user_id: Option<i64>,
    chat_id: Option<i64>,
    kind: &'static str,
    started: Instant,
    outcome: &'static str,
}

impl Drop for CompletionLog {
    fn drop(&mut self) {
        let duration_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::info!(
            user_id = self.user_id,
            chat_id = self.chat_id,
            event = self.kind,
            outcome = self.outcome,
            duration_ms,
            "update_processed"
        );
    }
}

#[async_trait]
impl Middleware for LoggingStage {
    fn name(&self) -> &'static str {
        "logging"
    }

    async fn process(
        &self,
        event: &InboundEvent,
        ctx: &mut EventContext,
        next: Next<'_>,
    ) -> Result<()> {
        let mut completion = CompletionLog {
            user_id: event.user_id().map(|u| u.0),
            chat_id: event.chat_id().map(|c| c.0),
            kind: event.kind(),
            started: Instant::now(),
            outcome: "cancelled",
        };
        tracing::info!(
            user_id = completion.user_id,
            chat_id = completion.chat_id,
            event = completion.kind,
            "update_received"
        );

        let res = next.run(event, ctx).await;
        completion.outcome = if res.is_ok() { "ok" } else { "error" };
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        errors::Error,
        pipeline::{EventHandler, Pipeline},
    };
    use std::{
        io,
        sync::{Arc, Mutex},
        time::Duration,
    };
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn subscriber(out: &Captured) -> impl tracing::Subscriber + Send + Sync {
        tracing_subscriber::fmt()
            .with_writer(out.clone())
            .with_ansi(false)
            .finish()
    }

    struct Failing;

    #[async_trait]
    impl EventHandler for Failing {
        async fn handle(&self, _event: &InboundEvent, _ctx: &EventContext) -> Result<()> {
            Err(Error::External("boom".to_string()))
        }
    }

    struct Stuck;

    #[async_trait]
    impl EventHandler for Stuck {
        async fn handle(&self, _event: &InboundEvent, _ctx: &EventContext) -> Result<()> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn failed_update_is_logged_as_error() {
        let out = Captured::default();
        let _guard = tracing::subscriber::set_default(subscriber(&out));

        let res = Pipeline::new(Arc::new(Failing))
            .with_stage(LoggingStage)
            .dispatch(&InboundEvent::Other)
            .await;

        assert!(res.is_err());
        let logs = out.text();
        assert!(logs.contains("update_received"), "{logs}");
        assert!(logs.contains("update_processed"), "{logs}");
        assert!(logs.contains("outcome=\"error\""), "{logs}");
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_update_is_logged_as_cancelled() {
        let out = Captured::default();
        let _guard = tracing::subscriber::set_default(subscriber(&out));
        let pipeline = Pipeline::new(Arc::new(Stuck)).with_stage(LoggingStage);

        let res = tokio::time::timeout(
            Duration::from_secs(1),
            pipeline.dispatch(&InboundEvent::Other),
        )
        .await;

        assert!(res.is_err());
        let logs = out.text();
        assert!(logs.contains("update_processed"), "{logs}");
        assert!(logs.contains("outcome=\"cancelled\""), "{logs}");
    }
}
