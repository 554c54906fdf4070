//! Core keyboards to Telegram reply markup.

use reqwest::Url;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup, KeyboardRemove,
    ReplyMarkup,
};

use relay_core::messaging::outbound::{ButtonTarget, InlineButton, Keyboard, ReplyKeyboard};

pub fn reply_markup(keyboard: &Keyboard) -> ReplyMarkup {
    match keyboard {
        Keyboard::Remove => ReplyMarkup::KeyboardRemove(KeyboardRemove::new()),
        Keyboard::Reply(kb) => ReplyMarkup::Keyboard(reply_keyboard(kb)),
        Keyboard::Inline(rows) => ReplyMarkup::InlineKeyboard(InlineKeyboardMarkup::new(
            rows.iter()
                .map(|row| row.iter().map(inline_button).collect::<Vec<_>>()),
        )),
    }
}

fn reply_keyboard(kb: &ReplyKeyboard) -> KeyboardMarkup {
    let rows = kb
        .rows
        .iter()
        .map(|row| row.iter().map(KeyboardButton::new).collect::<Vec<_>>());
    KeyboardMarkup::new(rows)
        .resize_keyboard(kb.resize)
        .one_time_keyboard(kb.one_time)
        .input_field_placeholder(kb.placeholder.clone())
}

/// Telegram rejects malformed URLs, so those buttons degrade to callbacks.
fn inline_button(button: &InlineButton) -> InlineKeyboardButton {
    match &button.target {
        ButtonTarget::Url(raw) => match Url::parse(raw) {
            Ok(url) => InlineKeyboardButton::url(button.text.clone(), url),
            Err(e) => {
                tracing::debug!(url = %raw, error = %e, "invalid button url");
                InlineKeyboardButton::callback(button.text.clone(), raw.clone())
            }
        },
        ButtonTarget::Callback(data) => {
            InlineKeyboardButton::callback(button.text.clone(), data.clone())
        }
    }
}
