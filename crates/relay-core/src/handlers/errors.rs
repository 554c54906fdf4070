//! Last-resort error reporting for failures that escaped the pipeline.

use crate::{
    errors::Error,
    messaging::{port::MessagingPort, types::InboundEvent},
};

pub const BACKEND_ERROR_TEXT: &str = "Backend error. Please try again later.";
pub const UNEXPECTED_ERROR_TEXT: &str = "Unexpected error. Please try again later.";

/// Log `err` and tell the user something went wrong, when there is a chat to
/// reply in. Never fails; a failed notice is only logged.
pub async fn report_unhandled(messenger: &dyn MessagingPort, event: &InboundEvent, err: &Error) {
    tracing::error!(
        error = %err,
        event = event.kind(),
        user_id = event.user_id().map(|u| u.0),
        "unhandled error"
    );

    let Some(chat_id) = event.reply_chat() else {
        return;
    };
    let text = if err.is_backend() {
        BACKEND_ERROR_TEXT
    } else {
        UNEXPECTED_ERROR_TEXT
    };
    if let Err(send_err) = messenger.send_text(chat_id, text).await {
        tracing::warn!(error = %send_err, chat_id = chat_id.0, "failed to send error notice");
    }
}
