//! Event handlers: forward user input to the backend and render its reply.

mod actions;
mod commands;
pub mod errors;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    domain::ChatId,
    messaging::{
        outbound::messages_from_payload,
        port::MessagingPort,
        types::{InboundEvent, IncomingMessage},
    },
    pipeline::{EventContext, EventHandler},
    Result,
};

/// Routes each event kind to its handler.
pub struct BotHandler {
    messenger: Arc<dyn MessagingPort>,
}

impl BotHandler {
    pub fn new(messenger: Arc<dyn MessagingPort>) -> Self {
        Self { messenger }
    }

    async fn on_message(&self, msg: &IncomingMessage, ctx: &EventContext) -> Result<()> {
        let (Some(user), Some(text)) = (msg.from.as_ref(), msg.text.as_deref()) else {
            return Ok(());
        };
        if text.is_empty() {
            return Ok(());
        }

        let messenger = self.messenger.as_ref();
        match parse_command(text) {
            Some(cmd) if cmd.name == "start" => {
                commands::start(messenger, msg, user, cmd.args, ctx).await
            }
            Some(cmd) if cmd.name == "menu" => commands::menu(messenger, msg, user, ctx).await,
            Some(cmd) => {
                tracing::debug!(command = cmd.name, "ignoring unknown command");
                Ok(())
            }
            None => actions::on_text(messenger, msg, user, text, ctx).await,
        }
    }
}

#[async_trait]
impl EventHandler for BotHandler {
    async fn handle(&self, event: &InboundEvent, ctx: &EventContext) -> Result<()> {
        match event {
            InboundEvent::Message(msg) => self.on_message(msg, ctx).await,
            InboundEvent::Callback(q) => {
                actions::on_callback(self.messenger.as_ref(), q, ctx).await
            }
            InboundEvent::InlineQuery(_) | InboundEvent::Other => Ok(()),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Command<'a> {
    name: &'a str,
    /// Text after the command with leading whitespace removed.
    args: &'a str,
}

/// `/name[@bot] [args]`. `None` for anything not starting with `/`.
fn parse_command(text: &str) -> Option<Command<'_>> {
    let rest = text.strip_prefix('/')?;
    let (head, args) = match rest.find(char::is_whitespace) {
        Some(i) => (&rest[..i], rest[i..].trim_start()),
        None => (rest, ""),
    };
    let name = head.split_once('@').map_or(head, |(name, _)| name);
    Some(Command { name, args })
}

/// Send every message the backend reply describes, in order.
async fn respond(
    messenger: &dyn MessagingPort,
    chat_id: ChatId,
    payload: &Value,
) -> Result<usize> {
    let messages = messages_from_payload(payload);
    for message in &messages {
        messenger.send_message(chat_id, message).await?;
    }
    Ok(messages.len())
}
