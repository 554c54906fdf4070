use serde::Serialize;
use serde_json::Value;

use crate::{
    domain::{ChatInfo, UserProfile},
    Result,
};

/// Body sent to the start, user-sync and action endpoints.
///
/// `partner_id` is always present (possibly `null`); `chat`, `start_param` and
/// `action` only when known.
#[derive(Clone, Debug, Serialize)]
pub struct UserPayload<'a> {
    pub user: &'a UserProfile,
    pub partner_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat: Option<&'a ChatInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_param: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<&'a str>,
}

impl<'a> UserPayload<'a> {
    pub fn new(
        user: &'a UserProfile,
        chat: Option<&'a ChatInfo>,
        partner_id: Option<&'a str>,
    ) -> Self {
        Self {
            user,
            partner_id,
            chat,
            start_param: None,
            action: None,
        }
    }

    pub fn with_start_param(mut self, start_param: Option<&'a str>) -> Self {
        self.start_param = start_param;
        self
    }

    pub fn with_action(mut self, action: &'a str) -> Self {
        self.action = Some(action);
        self
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Flat query string for the menu endpoint.
pub fn menu_query(
    user: &UserProfile,
    chat: Option<&ChatInfo>,
    partner_id: Option<&str>,
) -> Vec<(String, String)> {
    let mut query = vec![("user_id".to_string(), user.id.0.to_string())];
    if let Some(chat) = chat {
        query.push(("chat_id".to_string(), chat.id.0.to_string()));
    }
    if let Some(partner_id) = partner_id {
        query.push(("partner_id".to_string(), partner_id.to_string()));
    }
    if let Some(lang) = &user.language_code {
        query.push(("language_code".to_string(), lang.clone()));
    }
    query
}
