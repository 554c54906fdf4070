use std::sync::Arc;

use teloxide::{
    dispatching::Dispatcher,
    dptree,
    prelude::*,
    types::{CallbackQuery, InlineQuery, Message},
};

use relay_core::{
    config::Config,
    handlers::{errors::report_unhandled, BotHandler},
    messaging::{port::MessagingPort, types::InboundEvent},
    pipeline::Pipeline,
    services::Services,
};

use crate::{convert, parse_mode_from, TelegramMessenger};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub messenger: Arc<dyn MessagingPort>,
}

impl AppState {
    /// Errors that escaped every pipeline stage end here.
    async fn dispatch(&self, event: InboundEvent) {
        if let Err(e) = self.pipeline.dispatch(&event).await {
            report_unhandled(self.messenger.as_ref(), &event, &e).await;
        }
    }
}

pub async fn run_polling(cfg: &Config, services: Services) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.bot_token.clone());

    match bot.get_me().await {
        Ok(me) => tracing::info!(username = %me.username(), "bot started"),
        Err(e) => tracing::warn!(error = %e, "get_me failed"),
    }

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(
        bot.clone(),
        parse_mode_from(cfg.parse_mode.as_deref()),
    ));
    let pipeline = Pipeline::standard(
        &services,
        messenger.clone(),
        Arc::new(BotHandler::new(messenger.clone())),
    );
    tracing::debug!(stages = ?pipeline.stage_names(), "pipeline ready");

    let state = Arc::new(AppState {
        pipeline: Arc::new(pipeline),
        messenger,
    });

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handle_callback))
        .branch(Update::filter_inline_query().endpoint(handle_inline))
        .branch(Update::filter_message().endpoint(handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .default_handler(|_| async {})
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    tracing::info!("bot stopped");
    Ok(())
}

async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    state.dispatch(convert::message_event(&msg)).await;
    Ok(())
}

async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    state.dispatch(convert::callback_event(&q)).await;
    Ok(())
}

async fn handle_inline(q: InlineQuery, state: Arc<AppState>) -> ResponseResult<()> {
    state.dispatch(convert::inline_event(&q)).await;
    Ok(())
}
