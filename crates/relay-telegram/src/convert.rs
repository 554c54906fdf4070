//! Telegram updates to core [`InboundEvent`]s.

use teloxide::types::{CallbackQuery, Chat, InlineQuery, Message, User};

use relay_core::{
    domain::{ChatId, ChatInfo, MessageId, MessageRef, UserProfile},
    messaging::types::{self, CallbackOrigin, InboundEvent, IncomingMessage},
};

pub fn user_profile(user: &User) -> UserProfile {
    UserProfile {
        id: relay_core::domain::UserId(user.id.0 as i64),
        is_bot: user.is_bot,
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        username: user.username.clone(),
        language_code: user.language_code.clone(),
    }
}

pub fn chat_info(chat: &Chat) -> ChatInfo {
    let kind = if chat.is_private() {
        "private"
    } else if chat.is_group() {
        "group"
    } else if chat.is_supergroup() {
        "supergroup"
    } else {
        "channel"
    };
    ChatInfo {
        id: ChatId(chat.id.0),
        kind: kind.to_string(),
        title: chat.title().map(str::to_string),
        username: chat.username().map(str::to_string),
    }
}

fn message_ref(msg: &Message) -> MessageRef {
    MessageRef {
        chat_id: ChatId(msg.chat.id.0),
        message_id: MessageId(msg.id.0),
    }
}

pub fn message_event(msg: &Message) -> InboundEvent {
    InboundEvent::Message(IncomingMessage {
        message: message_ref(msg),
        chat: chat_info(&msg.chat),
        from: msg.from().map(user_profile),
        text: msg.text().map(str::to_string),
    })
}

pub fn callback_event(q: &CallbackQuery) -> InboundEvent {
    InboundEvent::Callback(types::CallbackQuery {
        callback_id: q.id.clone(),
        from: user_profile(&q.from),
        data: q.data.clone(),
        origin: q.message.as_ref().map(|m| CallbackOrigin {
            message: message_ref(m),
            chat: chat_info(&m.chat),
        }),
    })
}

pub fn inline_event(q: &InlineQuery) -> InboundEvent {
    InboundEvent::InlineQuery(types::InlineQuery {
        from: user_profile(&q.from),
        query: q.query.clone(),
    })
}
