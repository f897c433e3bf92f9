use teloxide::prelude::*;

use nqbot_core::domain::{format_phone_number, validate_phone_number, OwnerId, UserProfile};

use crate::callbacks::CallbackCommand;
use crate::format::{escape_html, status_description, status_emoji, status_label};
use crate::keyboards;
use crate::notify;
use crate::pending::Pending;
use crate::router::AppState;

use super::send_html;

const CLOSED_TEXT: &str =
    "⛔ <b>Submissions are currently closed.</b>\nPlease try again later.";

/// Every submission path is gated on the work flag; admins close intake by
/// toggling it.
async fn submissions_closed(bot: &Bot, chat_id: ChatId, state: &AppState) -> ResponseResult<bool> {
    if state.flags.work_status().await {
        return Ok(false);
    }
    send_html(
        bot,
        chat_id,
        CLOSED_TEXT,
        Some(keyboards::back(CallbackCommand::MainMenu)),
    )
    .await?;
    Ok(true)
}

/// Outcome of a number submission, decided before any reply is rendered.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Submission {
    Invalid,
    Closed,
    Failed,
    Added { number: String },
}

/// Validate and enqueue a submitted number. The work flag is checked before
/// the queue is touched; when intake is closed the engine is never called.
pub(crate) async fn try_submit(
    state: &AppState,
    profile: &UserProfile,
    text: &str,
) -> Submission {
    let number = format_phone_number(text);
    if !validate_phone_number(&number) {
        return Submission::Invalid;
    }

    // The flag may have flipped while we were waiting for input.
    if !state.flags.work_status().await {
        return Submission::Closed;
    }

    if let Err(e) = state.users.save(profile).await {
        tracing::error!(id = %profile.id, error = %e, "saving user profile failed");
    }

    if !state.engine.enqueue(&profile.id, &number).await {
        return Submission::Failed;
    }

    let note = format!("Added by {}", profile.display_name());
    state
        .engine
        .save_details(&profile.id, &number, None, Some(&note))
        .await;

    Submission::Added { number }
}

pub async fn menu(bot: &Bot, chat_id: ChatId, state: &AppState) -> ResponseResult<()> {
    if submissions_closed(bot, chat_id, state).await? {
        return Ok(());
    }
    send_html(
        bot,
        chat_id,
        "📱 <b>Number management</b>",
        Some(keyboards::numbers_menu()),
    )
    .await
}

pub async fn prompt_add(bot: &Bot, chat_id: ChatId, state: &AppState) -> ResponseResult<()> {
    if submissions_closed(bot, chat_id, state).await? {
        return Ok(());
    }
    state.pending.set(chat_id.0, Pending::AwaitingNumber).await;
    send_html(
        bot,
        chat_id,
        "➕ Send the phone number in international format,\nfor example: <code>+12345678901</code>",
        None,
    )
    .await
}

pub async fn handle_number_input(
    bot: &Bot,
    msg: &Message,
    state: &AppState,
    profile: &UserProfile,
) -> ResponseResult<()> {
    let chat_id = msg.chat.id;
    let Some(text) = msg.text() else {
        state.pending.set(chat_id.0, Pending::AwaitingNumber).await;
        send_html(bot, chat_id, "Please send the number as text.", None).await?;
        return Ok(());
    };

    match try_submit(state, profile, text).await {
        Submission::Invalid => {
            state.pending.set(chat_id.0, Pending::AwaitingNumber).await;
            send_html(
                bot,
                chat_id,
                "❌ Invalid format. The number must start with <code>+</code> and contain at least 10 digits.",
                None,
            )
            .await
        }
        Submission::Closed => {
            send_html(
                bot,
                chat_id,
                CLOSED_TEXT,
                Some(keyboards::back(CallbackCommand::MainMenu)),
            )
            .await
        }
        Submission::Failed => {
            send_html(
                bot,
                chat_id,
                "❌ Could not add the number. Please try again later.",
                Some(keyboards::numbers_menu()),
            )
            .await
        }
        Submission::Added { number } => {
            let text = format!(
                "✅ Number <code>{number}</code> added to the queue.\n⏳ {}",
                status_description("waiting")
            );
            send_html(bot, chat_id, &text, Some(keyboards::numbers_menu())).await
        }
    }
}

pub async fn delete_menu(
    bot: &Bot,
    chat_id: ChatId,
    state: &AppState,
    caller: &OwnerId,
) -> ResponseResult<()> {
    let numbers = state.engine.list_for_owner(caller).await;
    if numbers.is_empty() {
        return send_html(
            bot,
            chat_id,
            "You have no numbers yet.",
            Some(keyboards::back(CallbackCommand::NumbersMenu)),
        )
        .await;
    }
    send_html(
        bot,
        chat_id,
        "🗑️ Choose a number to delete:",
        Some(keyboards::delete_numbers(&numbers)),
    )
    .await
}

pub async fn delete(
    bot: &Bot,
    chat_id: ChatId,
    state: &AppState,
    caller: &OwnerId,
    number: &str,
) -> ResponseResult<()> {
    let text = if state.engine.dequeue(caller, number).await {
        format!("🗑️ Number <code>{number}</code> removed from the queue.")
    } else {
        "❌ Number not found.".to_string()
    };
    send_html(
        bot,
        chat_id,
        &text,
        Some(keyboards::back(CallbackCommand::NumbersMenu)),
    )
    .await
}

pub async fn show_queue(
    bot: &Bot,
    chat_id: ChatId,
    state: &AppState,
    caller: &OwnerId,
) -> ResponseResult<()> {
    let numbers = state.engine.list_for_owner(caller).await;
    if numbers.is_empty() {
        return send_html(
            bot,
            chat_id,
            "You have no numbers yet.",
            Some(keyboards::back(CallbackCommand::NumbersMenu)),
        )
        .await;
    }

    let mut text = String::from("📝 <b>Your numbers</b>\n\n");
    for (number, status) in &numbers {
        text.push_str(&format!(
            "{} <code>{number}</code> - {}\n",
            status_emoji(status),
            status_label(status)
        ));
    }
    text.push_str(&format!(
        "\n📊 Total numbers in the queue: <b>{}</b>",
        state.engine.queue_len().await
    ));
    send_html(
        bot,
        chat_id,
        &text,
        Some(keyboards::back(CallbackCommand::NumbersMenu)),
    )
    .await
}

pub async fn show_stats(
    bot: &Bot,
    chat_id: ChatId,
    state: &AppState,
    caller: &OwnerId,
) -> ResponseResult<()> {
    let stats = state.engine.stats(caller).await;

    let decided = stats.processed + stats.rejected;
    let success_rate = if decided > 0 {
        format!("{:.0}%", stats.processed as f64 * 100.0 / decided as f64)
    } else {
        "n/a".to_string()
    };
    // Rough queue estimate: ten minutes per queued number.
    let eta_minutes = stats.in_queue * 10;

    let text = format!(
        "🌐 <b>Your statistics</b>\n\n\
         ➕ Added in total: <b>{}</b>\n\
         ✅ Processed: <b>{}</b>\n\
         ❌ Rejected: <b>{}</b>\n\
         ⏳ In the queue now: <b>{}</b>\n\n\
         📈 Success rate: <b>{success_rate}</b>\n\
         🕐 Estimated wait: <b>~{eta_minutes} min</b>",
        stats.total_added, stats.processed, stats.rejected, stats.in_queue
    );
    send_html(
        bot,
        chat_id,
        &text,
        Some(keyboards::back(CallbackCommand::NumbersMenu)),
    )
    .await
}

/// The owner's answer to a forwarded login code.
pub async fn code_response(
    bot: &Bot,
    chat_id: ChatId,
    state: &AppState,
    profile: &UserProfile,
    accepted: bool,
    number: &str,
) -> ResponseResult<()> {
    state
        .engine
        .record_code_response(&profile.id, number, accepted)
        .await;

    if accepted {
        if let Err(e) = state
            .engine
            .set_status(
                &profile.id,
                number,
                nqbot_core::domain::PhoneStatus::Processed,
                Some("Code accepted by the owner"),
            )
            .await
        {
            tracing::warn!(number, error = %e, "status update after code accept failed");
        }
        return send_html(
            bot,
            chat_id,
            "✅ Thank you, the code has been confirmed.",
            None,
        )
        .await;
    }

    state.engine.dequeue(&profile.id, number).await;
    let alert = format!(
        "⚠️ {} declined the code for <code>{number}</code>. The number was removed from the queue.",
        escape_html(&profile.display_name())
    );
    notify::notify_admins(bot, &state.policy, &alert).await;
    send_html(
        bot,
        chat_id,
        "The number was removed from the queue. Contact support if this was a mistake.",
        None,
    )
    .await
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use nqbot_core::config::Config;
    use nqbot_core::domain::{OwnerStats, PhoneDetails, PhoneStatus};
    use nqbot_core::engine::QueueEngine;
    use nqbot_core::policy::AccessPolicy;
    use nqbot_core::ports::{AdminStore, QueueStore, SettingsStore, UserStore};
    use nqbot_core::settings::SettingsFlags;
    use nqbot_core::users::UserDirectory;
    use nqbot_core::Result;

    use crate::pending::PendingActions;

    use super::*;

    /// Queue store that only counts how often `enqueue` is reached.
    #[derive(Default)]
    struct RecordingQueue {
        enqueues: AtomicU32,
    }

    #[async_trait]
    impl QueueStore for RecordingQueue {
        async fn enqueue(&self, _: &OwnerId, _: &str) -> Result<()> {
            self.enqueues.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        async fn dequeue(&self, _: &OwnerId, _: &str) -> Result<bool> {
            Ok(false)
        }
        async fn set_status(
            &self,
            _: &OwnerId,
            _: &str,
            _: PhoneStatus,
            _: Option<&str>,
        ) -> Result<bool> {
            Ok(true)
        }
        async fn list_for_owner(&self, _: &OwnerId) -> Result<BTreeMap<String, String>> {
            Ok(BTreeMap::new())
        }
        async fn list_all(&self) -> Result<BTreeMap<String, BTreeMap<String, String>>> {
            Ok(BTreeMap::new())
        }
        async fn queue_len(&self) -> Result<u64> {
            Ok(0)
        }
        async fn stats_for_owner(&self, _: &OwnerId) -> Result<OwnerStats> {
            Ok(OwnerStats::default())
        }
        async fn save_details(
            &self,
            _: &OwnerId,
            _: &str,
            _: Option<PhoneStatus>,
            _: Option<&str>,
        ) -> Result<()> {
            Ok(())
        }
        async fn details(&self, _: &OwnerId, _: &str) -> Result<Option<PhoneDetails>> {
            Ok(None)
        }
        async fn mark_code_sent(&self, _: &OwnerId, _: &str, _: &OwnerId) -> Result<bool> {
            Ok(true)
        }
        async fn record_code_response(&self, _: &OwnerId, _: &str, _: bool) -> Result<bool> {
            Ok(true)
        }
    }

    struct NoAdmins;

    #[async_trait]
    impl AdminStore for NoAdmins {
        async fn admin_ids(&self) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
        async fn insert_admin(&self, _: &str) -> Result<bool> {
            Ok(true)
        }
        async fn delete_admin(&self, _: &str) -> Result<bool> {
            Ok(false)
        }
    }

    /// Settings store pinned to one work-flag value.
    struct FixedFlags(bool);

    #[async_trait]
    impl SettingsStore for FixedFlags {
        async fn get_flag(&self, key: &str, default: bool) -> Result<bool> {
            if key == nqbot_core::settings::WORK_STATUS_KEY {
                Ok(self.0)
            } else {
                Ok(default)
            }
        }
        async fn set_flag(&self, _: &str, _: bool) -> Result<()> {
            Ok(())
        }
    }

    struct NoUsers;

    #[async_trait]
    impl UserStore for NoUsers {
        async fn upsert_user(&self, _: &UserProfile) -> Result<()> {
            Ok(())
        }
        async fn get_user(&self, _: &OwnerId) -> Result<Option<UserProfile>> {
            Ok(None)
        }
    }

    fn test_state(queue: Arc<RecordingQueue>, work: bool) -> AppState {
        AppState {
            cfg: Arc::new(Config {
                telegram_bot_token: "token".into(),
                database_url: "sqlite::memory:".into(),
                health_port: 0,
            }),
            engine: QueueEngine::new(queue),
            policy: AccessPolicy::new(Arc::new(NoAdmins)),
            flags: SettingsFlags::new(Arc::new(FixedFlags(work))),
            users: UserDirectory::new(Arc::new(NoUsers)),
            pending: PendingActions::default(),
        }
    }

    fn submitter() -> UserProfile {
        UserProfile {
            id: OwnerId("100".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn closed_intake_rejects_before_the_queue_is_touched() {
        let queue = Arc::new(RecordingQueue::default());
        let state = test_state(queue.clone(), false);

        let outcome = try_submit(&state, &submitter(), "+12345678901").await;
        assert_eq!(outcome, Submission::Closed);
        assert_eq!(queue.enqueues.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn open_intake_enqueues_valid_numbers() {
        let queue = Arc::new(RecordingQueue::default());
        let state = test_state(queue.clone(), true);

        let outcome = try_submit(&state, &submitter(), "12345678901").await;
        assert_eq!(
            outcome,
            Submission::Added {
                number: "+12345678901".into()
            }
        );
        assert_eq!(queue.enqueues.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalid_numbers_never_reach_the_queue() {
        let queue = Arc::new(RecordingQueue::default());
        let state = test_state(queue.clone(), true);

        let outcome = try_submit(&state, &submitter(), "+12345").await;
        assert_eq!(outcome, Submission::Invalid);
        assert_eq!(queue.enqueues.load(Ordering::SeqCst), 0);
    }
}
