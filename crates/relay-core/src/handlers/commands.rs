use crate::{
    backend::payload::{menu_query, UserPayload},
    domain::UserProfile,
    messaging::{port::MessagingPort, types::IncomingMessage},
    pipeline::EventContext,
    Result,
};

use super::respond;

/// `/start [param]`: register the user and show the backend's welcome.
pub(super) async fn start(
    messenger: &dyn MessagingPort,
    msg: &IncomingMessage,
    user: &UserProfile,
    args: &str,
    ctx: &EventContext,
) -> Result<()> {
    let partner_id = ctx.partner_id();
    ctx.user_sync()?
        .sync_if_stale(user, Some(&msg.chat), partner_id, false)
        .await?;

    let start_param = Some(args).filter(|a| !a.is_empty());
    let payload = UserPayload::new(user, Some(&msg.chat), partner_id)
        .with_start_param(start_param)
        .to_value()?;
    let reply = ctx.backend()?.start(payload, partner_id).await?;

    respond(messenger, msg.chat.id, &reply).await?;
    Ok(())
}

pub(super) async fn menu(
    messenger: &dyn MessagingPort,
    msg: &IncomingMessage,
    user: &UserProfile,
    ctx: &EventContext,
) -> Result<()> {
    let partner_id = ctx.partner_id();
    ctx.user_sync()?
        .sync_if_stale(user, Some(&msg.chat), partner_id, false)
        .await?;

    let query = menu_query(user, Some(&msg.chat), partner_id);
    let reply = ctx.backend()?.menu(query, partner_id).await?;

    respond(messenger, msg.chat.id, &reply).await?;
    Ok(())
}
