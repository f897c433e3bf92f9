use teloxide::prelude::*;
use teloxide::types::InputFile;

use nqbot_core::domain::{OwnerId, PhoneStatus, UserProfile};
use nqbot_core::policy::{is_main_admin, AccessLevel};
use nqbot_core::Error;

use crate::format::{format_msk, msk_now, status_description, status_emoji, status_label};
use crate::keyboards;
use crate::notify;
use crate::pending::Pending;
use crate::router::AppState;

use super::send_html;

const FAILURE_TEXT: &str = "❌ Operation failed. Please try again later.";

pub async fn work_command(bot: &Bot, msg: &Message, state: &AppState) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let caller = OwnerId::from(user.id.0 as i64);
    let level = state.policy.classify(&caller).await;
    if !level.is_admin() {
        tracing::warn!(caller = %caller, "/work from non-admin ignored");
        return Ok(());
    }
    show_menu(bot, msg.chat.id, state, level).await
}

pub async fn show_menu(
    bot: &Bot,
    chat_id: ChatId,
    state: &AppState,
    level: AccessLevel,
) -> ResponseResult<()> {
    let work = state.flags.work_status().await;
    let moderator = state.flags.moderator_status().await;

    let all = state.engine.list_all().await;
    let users = all.len();
    let mut total = 0usize;
    let (mut waiting, mut processed, mut rejected) = (0usize, 0usize, 0usize);
    for numbers in all.values() {
        total += numbers.len();
        for status in numbers.values() {
            match status.as_str() {
                "waiting" => waiting += 1,
                "processed" => processed += 1,
                "rejected" => rejected += 1,
                _ => {}
            }
        }
    }

    let text = format!(
        "🛠 <b>Admin panel</b>\n\n\
         📊 Submissions: <b>{}</b>\n\
         👨‍💼 Moderator: <b>{}</b>\n\n\
         👥 Users: <b>{users}</b>\n\
         📱 Numbers: <b>{total}</b>\n\
         ⏳ Waiting: <b>{waiting}</b>\n\
         ✅ Processed: <b>{processed}</b>\n\
         ❌ Rejected: <b>{rejected}</b>",
        if work { "open" } else { "closed" },
        if moderator { "on duty" } else { "offline" },
    );
    send_html(
        bot,
        chat_id,
        &text,
        Some(keyboards::admin_menu(level == AccessLevel::MainAdmin)),
    )
    .await
}

pub async fn toggle_work(
    bot: &Bot,
    chat_id: ChatId,
    state: &AppState,
    level: AccessLevel,
) -> ResponseResult<()> {
    let target = !state.flags.work_status().await;
    if let Err(e) = state.flags.set_work_status(target).await {
        tracing::error!(error = %e, "toggling work status failed");
        return send_html(bot, chat_id, FAILURE_TEXT, None).await;
    }
    let notice = if target {
        "🟢 Submissions are now <b>open</b>."
    } else {
        "🔴 Submissions are now <b>closed</b>."
    };
    send_html(bot, chat_id, notice, None).await?;
    show_menu(bot, chat_id, state, level).await
}

pub async fn toggle_moderator(
    bot: &Bot,
    chat_id: ChatId,
    state: &AppState,
    level: AccessLevel,
) -> ResponseResult<()> {
    let target = !state.flags.moderator_status().await;
    if let Err(e) = state.flags.set_moderator_status(target).await {
        tracing::error!(error = %e, "toggling moderator status failed");
        return send_html(bot, chat_id, FAILURE_TEXT, None).await;
    }
    let notice = if target {
        "👨‍💼 Moderator is now marked <b>on duty</b>."
    } else {
        "👨‍💼 Moderator is now marked <b>offline</b>."
    };
    send_html(bot, chat_id, notice, None).await?;
    show_menu(bot, chat_id, state, level).await
}

pub async fn numbers_list(bot: &Bot, chat_id: ChatId, state: &AppState) -> ResponseResult<()> {
    let all = state.engine.list_all().await;
    if all.is_empty() {
        return send_html(
            bot,
            chat_id,
            "The queue is empty.",
            Some(keyboards::back(crate::callbacks::CallbackCommand::AdminMenu)),
        )
        .await;
    }

    let mut rows = Vec::new();
    for (owner, numbers) in &all {
        let display = state.users.display_name(&OwnerId(owner.clone())).await;
        for (number, status) in numbers {
            rows.push((
                format!(
                    "{number} - {} {} ({display})",
                    status_emoji(status),
                    status_label(status)
                ),
                owner.clone(),
                number.clone(),
            ));
        }
    }

    send_html(
        bot,
        chat_id,
        "📱 <b>All numbers</b>\nPick one to manage:",
        Some(keyboards::admin_numbers(&rows)),
    )
    .await
}

pub async fn number_action(
    bot: &Bot,
    chat_id: ChatId,
    state: &AppState,
    owner: &str,
    number: &str,
) -> ResponseResult<()> {
    let owner_id = OwnerId(owner.to_string());
    let Some(details) = state.engine.details(&owner_id, number).await else {
        return send_html(bot, chat_id, "❌ Number not found.", None).await;
    };

    let display = state.users.display_name(&owner_id).await;
    let mut info_lines = vec![
        format!("👤 Owner: {display}"),
        format!("📱 Added: {}", format_msk(details.added_at)),
        format!(
            "{} Status: {}",
            status_emoji(&details.status),
            status_label(&details.status)
        ),
    ];
    if details.code_sent {
        info_lines.push("📤 Code already sent".to_string());
    }

    send_html(
        bot,
        chat_id,
        &format!("🔧 Manage <code>{number}</code>"),
        Some(keyboards::number_actions(owner, number, &info_lines)),
    )
    .await
}

pub async fn set_status(
    bot: &Bot,
    chat_id: ChatId,
    state: &AppState,
    admin: &UserProfile,
    owner: &str,
    number: &str,
    status: PhoneStatus,
) -> ResponseResult<()> {
    let owner_id = OwnerId(owner.to_string());
    let note = format!("Status changed by administrator {}", admin.display_name());

    match state
        .engine
        .set_status(&owner_id, number, status, Some(&note))
        .await
    {
        Ok(()) => {
            let label = status.as_str();
            let notice = format!(
                "🔔 The status of your number <code>{number}</code> changed:\n\
                 {} <b>{}</b>\n{}\n⏰ {}",
                status_emoji(label),
                status_label(label),
                status_description(label),
                msk_now()
            );
            match notify::notify_user(bot, &owner_id, &notice).await {
                Ok(()) => {
                    send_html(
                        bot,
                        chat_id,
                        &format!(
                            "✅ Status of <code>{number}</code> set to {} {}.",
                            status_emoji(label),
                            status_label(label)
                        ),
                        None,
                    )
                    .await
                }
                Err(e) => {
                    tracing::warn!(number, error = %e, "owner notification failed");
                    send_html(
                        bot,
                        chat_id,
                        "⚠️ Status updated, but the owner could not be notified.",
                        None,
                    )
                    .await
                }
            }
        }
        Err(Error::NotFound(_)) => send_html(bot, chat_id, "❌ Number not found.", None).await,
        Err(e) => {
            tracing::error!(number, error = %e, "set_status failed");
            send_html(bot, chat_id, FAILURE_TEXT, None).await
        }
    }
}

pub async fn prompt_send_code(
    bot: &Bot,
    chat_id: ChatId,
    state: &AppState,
    owner: String,
    number: String,
) -> ResponseResult<()> {
    let text = format!("📤 Send the screenshot with the login code for <code>{number}</code> (as a photo).");
    state
        .pending
        .set(chat_id.0, Pending::AwaitingCodeShot { owner, number })
        .await;
    send_html(bot, chat_id, &text, None).await
}

pub async fn handle_code_screenshot(
    bot: &Bot,
    msg: &Message,
    state: &AppState,
    owner: String,
    number: String,
) -> ResponseResult<()> {
    let chat_id = msg.chat.id;

    let file_id = if let Some(sizes) = msg.photo() {
        sizes.last().map(|p| p.file.id.clone())
    } else {
        msg.document()
            .filter(|doc| {
                doc.mime_type
                    .as_ref()
                    .map(|m| m.type_() == "image")
                    .unwrap_or(false)
            })
            .map(|doc| doc.file.id.clone())
    };

    let Some(file_id) = file_id else {
        state
            .pending
            .set(chat_id.0, Pending::AwaitingCodeShot { owner, number })
            .await;
        return send_html(bot, chat_id, "Please send the code as a photo.", None).await;
    };

    let text = format!("Forward this code to the owner of <code>{number}</code>?");
    state
        .pending
        .set(
            chat_id.0,
            Pending::AwaitingCodeConfirm {
                owner,
                number,
                file_id,
            },
        )
        .await;
    send_html(bot, chat_id, &text, Some(keyboards::confirm_send_code())).await
}

pub async fn confirm_send_code(
    bot: &Bot,
    chat_id: ChatId,
    state: &AppState,
    admin: &UserProfile,
) -> ResponseResult<()> {
    let Some(Pending::AwaitingCodeConfirm {
        owner,
        number,
        file_id,
    }) = state.pending.take(chat_id.0).await
    else {
        return send_html(bot, chat_id, "Nothing to confirm.", None).await;
    };

    let owner_id = OwnerId(owner);
    let Ok(owner_chat) = owner_id.as_str().parse::<i64>() else {
        tracing::error!(owner = %owner_id, "owner id is not numeric");
        return send_html(bot, chat_id, FAILURE_TEXT, None).await;
    };

    let caption = format!(
        "📩 Login code for your number <code>{number}</code>.\nDid it work?"
    );
    let sent = bot
        .send_photo(ChatId(owner_chat), InputFile::file_id(file_id))
        .caption(caption)
        .parse_mode(teloxide::types::ParseMode::Html)
        .reply_markup(keyboards::code_response(&number))
        .await;

    if let Err(e) = sent {
        tracing::warn!(owner = %owner_id, number, error = %e, "code delivery failed");
        return send_html(
            bot,
            chat_id,
            "❌ Could not deliver the code to the owner.",
            None,
        )
        .await;
    }

    state
        .engine
        .mark_code_sent(&owner_id, &number, &admin.id)
        .await;
    let note = format!("Code sent by administrator {}", admin.display_name());
    if let Err(e) = state
        .engine
        .set_status(&owner_id, &number, PhoneStatus::Processed, Some(&note))
        .await
    {
        tracing::warn!(number, error = %e, "status update after code send failed");
    }

    send_html(bot, chat_id, "✅ Code sent to the owner.", None).await
}

pub async fn cancel_send_code(bot: &Bot, chat_id: ChatId, state: &AppState) -> ResponseResult<()> {
    state.pending.clear(chat_id.0).await;
    send_html(bot, chat_id, "🚫 Sending canceled.", None).await
}

pub async fn manage_admins(bot: &Bot, chat_id: ChatId, state: &AppState) -> ResponseResult<()> {
    let ids = match state.policy.admin_ids().await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::error!(error = %e, "loading admin roster failed");
            return send_html(bot, chat_id, FAILURE_TEXT, None).await;
        }
    };

    let mut entries = Vec::with_capacity(ids.len());
    for id in ids {
        let owner_id = OwnerId(id.clone());
        let display = state.users.display_name(&owner_id).await;
        entries.push((id, display, is_main_admin(&owner_id)));
    }

    send_html(
        bot,
        chat_id,
        "👥 <b>Administrators</b>\nTap one to remove, or add a new one:",
        Some(keyboards::admins_list(&entries)),
    )
    .await
}

pub async fn prompt_add_admin(bot: &Bot, chat_id: ChatId, state: &AppState) -> ResponseResult<()> {
    state.pending.set(chat_id.0, Pending::AwaitingAdminId).await;
    send_html(
        bot,
        chat_id,
        "➕ Send the numeric Telegram id of the new administrator.",
        None,
    )
    .await
}

pub async fn handle_admin_id_input(
    bot: &Bot,
    msg: &Message,
    state: &AppState,
) -> ResponseResult<()> {
    let chat_id = msg.chat.id;

    // Whoever reached this pending state passed the main-admin gate, but
    // check again: the roster write below must stay main-admin only.
    let level = match msg.from() {
        Some(user) => {
            state
                .policy
                .classify(&OwnerId::from(user.id.0 as i64))
                .await
        }
        None => AccessLevel::Anonymous,
    };
    if level != AccessLevel::MainAdmin {
        return Ok(());
    }

    let id = msg.text().unwrap_or_default().trim().to_string();
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
        state.pending.set(chat_id.0, Pending::AwaitingAdminId).await;
        return send_html(
            bot,
            chat_id,
            "❌ The id must consist of digits only. Try again.",
            None,
        )
        .await;
    }

    let new_admin = OwnerId(id);
    match state.policy.add_admin(&new_admin).await {
        Ok(()) => {
            let notice = "🎉 You have been granted administrator access. Use /work to open the panel.";
            if let Err(e) = notify::notify_user(bot, &new_admin, notice).await {
                tracing::warn!(id = %new_admin, error = %e, "new admin notification failed");
            }
            send_html(
                bot,
                chat_id,
                &format!("✅ Admin <code>{new_admin}</code> added."),
                None,
            )
            .await
        }
        Err(Error::AlreadyExists(_)) => {
            send_html(bot, chat_id, "⚠️ This user is already an administrator.", None).await
        }
        Err(e) => {
            tracing::error!(id = %new_admin, error = %e, "adding admin failed");
            send_html(bot, chat_id, FAILURE_TEXT, None).await
        }
    }
}

pub async fn remove_admin(
    bot: &Bot,
    chat_id: ChatId,
    state: &AppState,
    id: &str,
) -> ResponseResult<()> {
    let target = OwnerId(id.to_string());
    match state.policy.remove_admin(&target).await {
        Ok(()) => {
            if let Err(e) =
                notify::notify_user(bot, &target, "Your administrator access has been revoked.")
                    .await
            {
                tracing::warn!(id = %target, error = %e, "removed admin notification failed");
            }
            send_html(
                bot,
                chat_id,
                &format!("✅ Admin <code>{target}</code> removed."),
                None,
            )
            .await?;
            manage_admins(bot, chat_id, state).await
        }
        Err(Error::Forbidden(_)) => {
            send_html(
                bot,
                chat_id,
                "⛔ Main administrators cannot be removed.",
                None,
            )
            .await
        }
        Err(Error::NotFound(_)) => send_html(bot, chat_id, "❌ Admin not found.", None).await,
        Err(e) => {
            tracing::error!(id = %target, error = %e, "removing admin failed");
            send_html(bot, chat_id, FAILURE_TEXT, None).await
        }
    }
}
