use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*, types::BotCommand};

use nqbot_core::{
    config::Config, engine::QueueEngine, policy::AccessPolicy, settings::SettingsFlags,
    users::UserDirectory,
};

use crate::handlers;
use crate::pending::PendingActions;

pub struct AppState {
    pub cfg: Arc<Config>,
    pub engine: QueueEngine,
    pub policy: AccessPolicy,
    pub flags: SettingsFlags,
    pub users: UserDirectory,
    pub pending: PendingActions,
}

pub async fn run_polling(state: Arc<AppState>) -> anyhow::Result<()> {
    let bot = Bot::new(state.cfg.telegram_bot_token.clone());

    // Best-effort: the bot works without the command hints.
    if let Err(e) = bot
        .set_my_commands(vec![
            BotCommand::new("start", "Main menu"),
            BotCommand::new("info", "Service information"),
            BotCommand::new("work", "Admin panel"),
        ])
        .await
    {
        tracing::warn!(error = %e, "set_my_commands failed");
    }

    if let Ok(me) = bot.get_me().await {
        tracing::info!(bot = me.username(), "started");
    }

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
