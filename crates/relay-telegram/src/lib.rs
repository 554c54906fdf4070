//! Telegram adapter (teloxide).
//!
//! This crate implements the `relay-core` MessagingPort over the Telegram Bot API
//! and feeds Telegram updates into the core pipeline.

use async_trait::async_trait;

use teloxide::{prelude::*, types::ParseMode};

use tokio::time::sleep;

pub mod convert;
pub mod keyboard;
pub mod router;

use relay_core::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{outbound::OutboundMessage, port::MessagingPort},
    Result,
};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
    parse_mode: Option<ParseMode>,
}

impl TelegramMessenger {
    pub fn new(bot: Bot, parse_mode: Option<ParseMode>) -> Self {
        Self { bot, parse_mode }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(teloxide::RequestError::RetryAfter(wait)) if attempts < MAX_RETRIES => {
                    attempts += 1;
                    tracing::warn!(retry_after_s = wait.as_secs(), "telegram flood control");
                    sleep(wait).await;
                }
                Err(other) => return Err(Self::map_err(other)),
            }
        }
    }
}

/// `HTML` and `MarkdownV2` (any case); anything else sends plain text.
pub fn parse_mode_from(name: Option<&str>) -> Option<ParseMode> {
    match name?.trim().to_ascii_lowercase().as_str() {
        "html" => Some(ParseMode::Html),
        "markdownv2" | "markdown_v2" => Some(ParseMode::MarkdownV2),
        _ => None,
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    async fn send_message(
        &self,
        chat_id: ChatId,
        message: &OutboundMessage,
    ) -> Result<MessageRef> {
        let markup = message.keyboard.as_ref().map(keyboard::reply_markup);
        let msg = self
            .with_retry(|| {
                let mut req = self
                    .bot
                    .send_message(Self::tg_chat(chat_id), message.text.clone());
                if let Some(mode) = self.parse_mode {
                    req = req.parse_mode(mode);
                }
                if let Some(markup) = &markup {
                    req = req.reply_markup(markup.clone());
                }
                req
            })
            .await?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        self.with_retry(|| {
            let mut req = self.bot.answer_callback_query(callback_id.to_string());
            if let Some(t) = text {
                req = req.text(t.to_string());
            }
            req
        })
        .await?;
        Ok(())
    }
}
