use crate::{
    backend::payload::UserPayload,
    domain::UserProfile,
    messaging::{
        port::MessagingPort,
        types::{CallbackQuery, IncomingMessage},
    },
    pipeline::EventContext,
    Result,
};

use super::respond;

/// Free text is forwarded verbatim as the action.
pub(super) async fn on_text(
    messenger: &dyn MessagingPort,
    msg: &IncomingMessage,
    user: &UserProfile,
    text: &str,
    ctx: &EventContext,
) -> Result<()> {
    let partner_id = ctx.partner_id();
    ctx.user_sync()?
        .sync_if_stale(user, Some(&msg.chat), partner_id, false)
        .await?;

    let payload = UserPayload::new(user, Some(&msg.chat), partner_id)
        .with_action(text)
        .to_value()?;
    let reply = ctx.backend()?.action(payload, partner_id).await?;

    respond(messenger, msg.chat.id, &reply).await?;
    Ok(())
}

/// Button presses. The callback is answered last so the client spinner stays
/// up while the backend works.
pub(super) async fn on_callback(
    messenger: &dyn MessagingPort,
    query: &CallbackQuery,
    ctx: &EventContext,
) -> Result<()> {
    let Some(data) = query.data.as_deref().filter(|d| !d.is_empty()) else {
        messenger.answer_callback_query(&query.callback_id, None).await?;
        return Ok(());
    };

    let partner_id = ctx.partner_id();
    let chat = query.origin.as_ref().map(|o| &o.chat);
    ctx.user_sync()?
        .sync_if_stale(&query.from, chat, partner_id, false)
        .await?;

    let payload = UserPayload::new(&query.from, chat, partner_id)
        .with_action(data)
        .to_value()?;
    let reply = ctx.backend()?.action(payload, partner_id).await?;

    if let Some(chat) = chat {
        respond(messenger, chat.id, &reply).await?;
    }
    messenger.answer_callback_query(&query.callback_id, None).await?;
    Ok(())
}
