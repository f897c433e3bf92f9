use teloxide::prelude::*;

use nqbot_core::domain::OwnerId;

use crate::callbacks::CallbackCommand;
use crate::keyboards;
use crate::router::AppState;

use super::{profile_of, send_html};

pub async fn start(bot: &Bot, msg: &Message, state: &AppState) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let profile = profile_of(user);
    if let Err(e) = state.users.save(&profile).await {
        tracing::error!(id = %profile.id, error = %e, "saving user profile failed");
    }
    show_main(bot, msg.chat.id, state, &profile.id).await
}

pub async fn show_main(
    bot: &Bot,
    chat_id: ChatId,
    state: &AppState,
    caller: &OwnerId,
) -> ResponseResult<()> {
    let work = state.flags.work_status().await;
    let moderator = state.flags.moderator_status().await;
    let queue = state.engine.queue_len().await;
    let mine = state.engine.list_for_owner(caller).await.len();

    let text = format!(
        "👋 <b>Welcome!</b>\n\n\
         {} Submissions: <b>{}</b>\n\
         👨‍💼 Moderator: <b>{}</b>\n\
         📱 Numbers in the queue: <b>{queue}</b>\n\
         🗂 Your numbers: <b>{mine}</b>",
        if work { "🟢" } else { "🔴" },
        if work { "open" } else { "closed" },
        if moderator { "on duty" } else { "offline" },
    );
    send_html(bot, chat_id, &text, Some(keyboards::main_menu())).await
}

pub async fn group(bot: &Bot, chat_id: ChatId) -> ResponseResult<()> {
    let text = "📢 <b>Our group</b>\n\n\
                News, schedules and announcements:\n\
                <a href=\"https://t.me/+j28PRQtxybplMTMy\">Join the group</a>";
    send_html(
        bot,
        chat_id,
        text,
        Some(keyboards::back(CallbackCommand::MainMenu)),
    )
    .await
}

pub async fn prices(bot: &Bot, chat_id: ChatId) -> ResponseResult<()> {
    let text = "💸 <b>Prices</b>\n\n\
                1 hour - $10\n\
                2 hours - $13\n\
                3 hours - $16\n\n\
                ‼️ Volume brings bonuses!";
    send_html(
        bot,
        chat_id,
        text,
        Some(keyboards::back(CallbackCommand::MainMenu)),
    )
    .await
}
