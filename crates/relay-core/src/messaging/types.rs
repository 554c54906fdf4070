use crate::domain::{ChatId, ChatInfo, MessageRef, UserId, UserProfile};

/// Cross-messenger inbound update model.
///
/// Telegram-specific parsing lives in the adapter; the core only sees this.
#[derive(Clone, Debug)]
pub enum InboundEvent {
    Message(IncomingMessage),
    Callback(CallbackQuery),
    InlineQuery(InlineQuery),
    /// Anything else the platform delivers (system events, edits, ...).
    Other,
}

#[derive(Clone, Debug)]
pub struct IncomingMessage {
    pub message: MessageRef,
    pub chat: ChatInfo,
    pub from: Option<UserProfile>,
    pub text: Option<String>,
}

#[derive(Clone, Debug)]
pub struct CallbackQuery {
    pub callback_id: String,
    pub from: UserProfile,
    pub data: Option<String>,
    /// Message the pressed button was attached to, if Telegram still has it.
    pub origin: Option<CallbackOrigin>,
}

#[derive(Clone, Debug)]
pub struct CallbackOrigin {
    pub message: MessageRef,
    pub chat: ChatInfo,
}

#[derive(Clone, Debug)]
pub struct InlineQuery {
    pub from: UserProfile,
    pub query: String,
}

impl InboundEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            InboundEvent::Message(_) => "message",
            InboundEvent::Callback(_) => "callback_query",
            InboundEvent::InlineQuery(_) => "inline_query",
            InboundEvent::Other => "update",
        }
    }

    pub fn user(&self) -> Option<&UserProfile> {
        match self {
            InboundEvent::Message(m) => m.from.as_ref(),
            InboundEvent::Callback(q) => Some(&q.from),
            InboundEvent::InlineQuery(q) => Some(&q.from),
            InboundEvent::Other => None,
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user().map(|u| u.id)
    }

    pub fn chat(&self) -> Option<&ChatInfo> {
        match self {
            InboundEvent::Message(m) => Some(&m.chat),
            InboundEvent::Callback(q) => q.origin.as_ref().map(|o| &o.chat),
            InboundEvent::InlineQuery(_) | InboundEvent::Other => None,
        }
    }

    pub fn chat_id(&self) -> Option<ChatId> {
        self.chat().map(|c| c.id)
    }

    /// Chat that user-visible replies (including error notices) should go to.
    pub fn reply_chat(&self) -> Option<ChatId> {
        self.chat_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MessageId;

    #[test]
    fn callback_without_origin_has_no_reply_chat() {
        let ev = InboundEvent::Callback(CallbackQuery {
            callback_id: "cb".to_string(),
            from: UserProfile::new(7, "Ann"),
            data: Some("go".to_string()),
            origin: None,
        });
        assert_eq!(ev.kind(), "callback_query");
        assert_eq!(ev.user_id(), Some(UserId(7)));
        assert_eq!(ev.reply_chat(), None);
    }

    #[test]
    fn message_reports_sender_and_chat() {
        let ev = InboundEvent::Message(IncomingMessage {
            message: MessageRef {
                chat_id: ChatId(-100),
                message_id: MessageId(3),
            },
            chat: ChatInfo::private(-100),
            from: Some(UserProfile::new(42, "Bo")),
            text: Some("hi".to_string()),
        });
        assert_eq!(ev.kind(), "message");
        assert_eq!(ev.user_id(), Some(UserId(42)));
        assert_eq!(ev.reply_chat(), Some(ChatId(-100)));
        assert_eq!(InboundEvent::Other.user_id(), None);
    }
}
