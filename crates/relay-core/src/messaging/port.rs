use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::outbound::OutboundMessage,
    Result,
};

/// Cross-messenger port.
///
/// Telegram is the only implementation today; the core never touches teloxide
/// types directly so handlers stay testable with an in-memory fake.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_message(&self, chat_id: ChatId, message: &OutboundMessage) -> Result<MessageRef>;

    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        self.send_message(chat_id, &OutboundMessage::text(text)).await
    }

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()>;
}
