use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    errors::Error,
    handlers::errors::BACKEND_ERROR_TEXT,
    messaging::{port::MessagingPort, types::InboundEvent},
    Result,
};

use super::{EventContext, Middleware, Next};

/// Turns backend failures into a generic "try again later" reply.
///
/// Any other error is logged and re-raised for the top-level handler.
pub struct ErrorRecoveryStage {
    messenger: Arc<dyn MessagingPort>,
}

impl ErrorRecoveryStage {
    pub fn new(messenger: Arc<dyn MessagingPort>) -> Self {
        Self { messenger }
    }
}

#[async_trait]
impl Middleware for ErrorRecoveryStage {
    fn name(&self) -> &'static str {
        "error_recovery"
    }

    async fn process(
        &self,
        event: &InboundEvent,
        ctx: &mut EventContext,
        next: Next<'_>,
    ) -> Result<()> {
        match next.run(event, ctx).await {
            Ok(()) => Ok(()),
            Err(Error::Backend(e)) => {
                tracing::warn!(
                    error = %e,
                    status = e.status(),
                    event = event.kind(),
                    "backend error"
                );
                if let Some(chat_id) = event.reply_chat() {
                    let notice = self.messenger.send_text(chat_id, BACKEND_ERROR_TEXT).await;
                    if let Err(send_err) = notice {
                        tracing::warn!(
                            error = %send_err,
                            chat_id = chat_id.0,
                            "failed to send backend error notice"
                        );
                    }
                }
                Ok(())
            }
            Err(other) => {
                tracing::error!(error = %other, event = event.kind(), "unhandled exception");
                Err(other)
            }
        }
    }
}
