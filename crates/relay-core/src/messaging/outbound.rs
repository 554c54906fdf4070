//! Typed view of backend replies.
//!
//! The backend answers with loosely shaped JSON. Everything user-visible is
//! parsed here into [`OutboundMessage`] values; adapters only render them.

use serde_json::{Map, Value};

const TEXT_KEYS: [&str; 4] = ["text", "message", "title", "body"];
const KEYBOARD_KEYS: [&str; 3] = ["menu", "keyboard", "reply_markup"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundMessage {
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Keyboard {
    /// Hide a previously shown reply keyboard.
    Remove,
    Reply(ReplyKeyboard),
    Inline(Vec<Vec<InlineButton>>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplyKeyboard {
    pub rows: Vec<Vec<String>>,
    pub resize: bool,
    pub one_time: bool,
    pub placeholder: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineButton {
    pub text: String,
    pub target: ButtonTarget,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ButtonTarget {
    Url(String),
    /// Opaque action string echoed back to the backend on press.
    Callback(String),
}

impl OutboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    /// Parse one backend message object. `None` when it has neither text nor keyboard.
    pub fn from_object(item: &Map<String, Value>) -> Option<Self> {
        let text = extract_text(item);
        let keyboard = extract_keyboard(item).and_then(Keyboard::from_spec);
        if text.is_none() && keyboard.is_none() {
            return None;
        }
        Some(Self {
            // Telegram refuses empty message bodies.
            text: text.unwrap_or_else(|| " ".to_string()),
            keyboard,
        })
    }
}

/// Turn a full backend response into the messages to send, in order.
pub fn messages_from_payload(payload: &Value) -> Vec<OutboundMessage> {
    normalize(payload)
        .into_iter()
        .filter_map(OutboundMessage::from_object)
        .collect()
}

fn normalize(payload: &Value) -> Vec<&Map<String, Value>> {
    match payload {
        Value::Array(items) => items.iter().filter_map(Value::as_object).collect(),
        Value::Object(obj) => match obj.get("messages") {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_object).collect(),
            _ => vec![obj],
        },
        _ => Vec::new(),
    }
}

fn extract_text(item: &Map<String, Value>) -> Option<String> {
    TEXT_KEYS
        .iter()
        .filter_map(|k| item.get(*k).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())
        .map(str::to_string)
}

fn extract_keyboard(item: &Map<String, Value>) -> Option<&Map<String, Value>> {
    KEYBOARD_KEYS
        .iter()
        .find_map(|k| item.get(*k).and_then(Value::as_object))
}

impl Keyboard {
    /// Build a keyboard from a backend menu definition (`{"type": ..., "buttons": [...]}`).
    pub fn from_spec(menu: &Map<String, Value>) -> Option<Self> {
        let kind = menu
            .get("type")
            .map(display)
            .unwrap_or_else(|| "inline".to_string())
            .to_lowercase();

        if kind == "remove" || kind == "remove_keyboard" {
            return Some(Keyboard::Remove);
        }

        let Some(Value::Array(buttons)) = menu.get("buttons") else {
            return None;
        };

        if kind == "reply" {
            let rows: Vec<Vec<String>> = buttons
                .iter()
                .map(|row| row_items(row).filter_map(reply_label).collect::<Vec<_>>())
                .filter(|row| !row.is_empty())
                .collect();
            if rows.is_empty() {
                return None;
            }
            return Some(Keyboard::Reply(ReplyKeyboard {
                rows,
                resize: menu.get("resize").map(truthy).unwrap_or(true),
                one_time: menu.get("one_time").map(truthy).unwrap_or(false),
                placeholder: menu
                    .get("placeholder")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            }));
        }

        let rows: Vec<Vec<InlineButton>> = buttons
            .iter()
            .map(|row| row_items(row).filter_map(inline_button).collect::<Vec<_>>())
            .filter(|row| !row.is_empty())
            .collect();
        if rows.is_empty() {
            return None;
        }
        Some(Keyboard::Inline(rows))
    }
}

/// A row is either an array of items or a single item standing for a one-button row.
fn row_items(row: &Value) -> Box<dyn Iterator<Item = &Value> + '_> {
    match row {
        Value::Array(items) => Box::new(items.iter()),
        other => Box::new(std::iter::once(other)),
    }
}

fn reply_label(item: &Value) -> Option<String> {
    match item {
        Value::String(s) => Some(s.clone()),
        Value::Object(obj) => button_text(obj),
        _ => None,
    }
}

fn inline_button(item: &Value) -> Option<InlineButton> {
    match item {
        Value::String(s) => Some(InlineButton {
            text: s.clone(),
            target: ButtonTarget::Callback(s.clone()),
        }),
        Value::Object(obj) => {
            let text = button_text(obj)?;
            let target = match obj.get("url") {
                Some(url) => ButtonTarget::Url(display(url)),
                None => {
                    let action = ["action", "callback_data"]
                        .iter()
                        .filter_map(|k| obj.get(*k))
                        .find(|v| truthy(v))
                        .map(display)
                        .unwrap_or_else(|| text.clone());
                    ButtonTarget::Callback(action)
                }
            };
            Some(InlineButton { text, target })
        }
        _ => None,
    }
}

fn button_text(obj: &Map<String, Value>) -> Option<String> {
    let text = display(obj.get("text")?);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Render a scalar the way it would read in a button (strings unquoted).
fn display(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
