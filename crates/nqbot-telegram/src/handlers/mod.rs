//! Update handlers. Messages are routed by command or by the chat's pending
//! input; callback payloads are parsed into `CallbackCommand` exactly once,
//! here, and matched exhaustively.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, ParseMode};

use nqbot_core::domain::{OwnerId, UserProfile};

use crate::callbacks::CallbackCommand;
use crate::pending::Pending;
use crate::router::AppState;

mod admin;
mod info;
mod menu;
mod numbers;

pub(crate) fn profile_of(user: &teloxide::types::User) -> UserProfile {
    UserProfile {
        id: OwnerId::from(user.id.0 as i64),
        username: user.username.clone().unwrap_or_default(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone().unwrap_or_default(),
    }
}

pub(crate) async fn send_html(
    bot: &Bot,
    chat_id: ChatId,
    text: &str,
    markup: Option<InlineKeyboardMarkup>,
) -> ResponseResult<()> {
    let mut req = bot.send_message(chat_id, text).parse_mode(ParseMode::Html);
    if let Some(markup) = markup {
        req = req.reply_markup(markup);
    }
    req.await?;
    Ok(())
}

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let profile = profile_of(user);
    let chat_id = msg.chat.id;

    if let Some(text) = msg.text() {
        if text.starts_with('/') {
            // Strip bot mention: "/start@somebot" routes like "/start".
            let cmd = text.split_whitespace().next().unwrap_or(text);
            let cmd = cmd.split('@').next().unwrap_or(cmd);
            state.pending.clear(chat_id.0).await;
            return match cmd {
                "/start" => menu::start(&bot, &msg, &state).await,
                "/info" => info::show(&bot, chat_id, &state).await,
                "/work" => admin::work_command(&bot, &msg, &state).await,
                _ => Ok(()),
            };
        }
    }

    match state.pending.take(chat_id.0).await {
        Some(Pending::AwaitingNumber) => {
            numbers::handle_number_input(&bot, &msg, &state, &profile).await
        }
        Some(Pending::AwaitingAdminId) => {
            admin::handle_admin_id_input(&bot, &msg, &state).await
        }
        Some(Pending::AwaitingCodeShot { owner, number }) => {
            admin::handle_code_screenshot(&bot, &msg, &state, owner, number).await
        }
        Some(p @ Pending::AwaitingCodeConfirm { .. }) => {
            // Confirmation comes through buttons; keep waiting.
            state.pending.set(chat_id.0, p).await;
            Ok(())
        }
        None => {
            let _ = bot
                .send_message(chat_id, "Use /start to open the menu.")
                .await;
            Ok(())
        }
    }
}

pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let cb_id = q.id.clone();
    let Some(chat_id) = q.message.as_ref().map(|m| m.chat.id) else {
        let _ = bot.answer_callback_query(cb_id).await;
        return Ok(());
    };
    let profile = profile_of(&q.from);
    let caller = profile.id.clone();

    let data = q.data.clone().unwrap_or_default();
    let Some(cmd) = CallbackCommand::parse(&data) else {
        let _ = bot
            .answer_callback_query(cb_id)
            .text("Unknown action")
            .await;
        return Ok(());
    };
    let _ = bot.answer_callback_query(cb_id).await;

    let level = state.policy.classify(&caller).await;

    // Role gates: everything below AdminMenu is open to all users.
    let needs_admin = matches!(
        cmd,
        CallbackCommand::AdminMenu
            | CallbackCommand::ToggleWork
            | CallbackCommand::ToggleModerator
            | CallbackCommand::AdminNumbers
            | CallbackCommand::NumberAction { .. }
            | CallbackCommand::SetStatus { .. }
            | CallbackCommand::SendCode { .. }
            | CallbackCommand::ConfirmSendCode
            | CallbackCommand::CancelSendCode
    );
    let needs_main_admin = matches!(
        cmd,
        CallbackCommand::ManageAdmins
            | CallbackCommand::AddAdmin
            | CallbackCommand::RemoveAdmin { .. }
    );

    if needs_admin && !level.is_admin() {
        tracing::warn!(caller = %caller, ?cmd, "admin action from non-admin");
        return Ok(());
    }
    if needs_main_admin && level != nqbot_core::policy::AccessLevel::MainAdmin {
        let _ = bot
            .send_message(chat_id, "⛔ This section is for main administrators only.")
            .await;
        return Ok(());
    }

    match cmd {
        CallbackCommand::MainMenu => menu::show_main(&bot, chat_id, &state, &caller).await,
        CallbackCommand::Group => menu::group(&bot, chat_id).await,
        CallbackCommand::Prices => menu::prices(&bot, chat_id).await,
        CallbackCommand::Info => info::show(&bot, chat_id, &state).await,
        CallbackCommand::NumbersMenu => numbers::menu(&bot, chat_id, &state).await,
        CallbackCommand::AddNumber => numbers::prompt_add(&bot, chat_id, &state).await,
        CallbackCommand::DeleteNumberMenu => {
            numbers::delete_menu(&bot, chat_id, &state, &caller).await
        }
        CallbackCommand::DeleteNumber { number } => {
            numbers::delete(&bot, chat_id, &state, &caller, &number).await
        }
        CallbackCommand::ShowQueue => numbers::show_queue(&bot, chat_id, &state, &caller).await,
        CallbackCommand::ShowStats => numbers::show_stats(&bot, chat_id, &state, &caller).await,
        CallbackCommand::CodeResponse { accepted, number } => {
            numbers::code_response(&bot, chat_id, &state, &profile, accepted, &number).await
        }
        CallbackCommand::AdminMenu => admin::show_menu(&bot, chat_id, &state, level).await,
        CallbackCommand::ToggleWork => admin::toggle_work(&bot, chat_id, &state, level).await,
        CallbackCommand::ToggleModerator => {
            admin::toggle_moderator(&bot, chat_id, &state, level).await
        }
        CallbackCommand::AdminNumbers => admin::numbers_list(&bot, chat_id, &state).await,
        CallbackCommand::NumberAction { owner, number } => {
            admin::number_action(&bot, chat_id, &state, &owner, &number).await
        }
        CallbackCommand::SetStatus {
            owner,
            number,
            status,
        } => admin::set_status(&bot, chat_id, &state, &profile, &owner, &number, status).await,
        CallbackCommand::SendCode { owner, number } => {
            admin::prompt_send_code(&bot, chat_id, &state, owner, number).await
        }
        CallbackCommand::ConfirmSendCode => {
            admin::confirm_send_code(&bot, chat_id, &state, &profile).await
        }
        CallbackCommand::CancelSendCode => admin::cancel_send_code(&bot, chat_id, &state).await,
        CallbackCommand::ManageAdmins => admin::manage_admins(&bot, chat_id, &state).await,
        CallbackCommand::AddAdmin => admin::prompt_add_admin(&bot, chat_id, &state).await,
        CallbackCommand::RemoveAdmin { id } => {
            admin::remove_admin(&bot, chat_id, &state, &id).await
        }
        CallbackCommand::NoAction => Ok(()),
    }
}
