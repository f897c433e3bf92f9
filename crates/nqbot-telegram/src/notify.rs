//! Outbound notifications. Delivery failures are values (`Error::Delivery`)
//! or log lines; they never abort the operation that triggered them.

use teloxide::prelude::*;
use teloxide::types::ParseMode;

use nqbot_core::domain::OwnerId;
use nqbot_core::policy::AccessPolicy;
use nqbot_core::{Error, Result};

fn chat_of(id: &OwnerId) -> Result<ChatId> {
    id.as_str()
        .parse::<i64>()
        .map(ChatId)
        .map_err(|_| Error::Delivery(format!("invalid recipient id {id}")))
}

/// Send an HTML message to a single user.
pub async fn notify_user(bot: &Bot, id: &OwnerId, html: &str) -> Result<()> {
    let chat = chat_of(id)?;
    bot.send_message(chat, html)
        .parse_mode(ParseMode::Html)
        .await
        .map_err(|e| Error::Delivery(format!("to {id}: {e}")))?;
    Ok(())
}

/// Broadcast an HTML message to every admin. One failing recipient never
/// blocks the rest; returns the number of successful deliveries.
pub async fn notify_admins(bot: &Bot, policy: &AccessPolicy, html: &str) -> usize {
    let ids = match policy.admin_ids().await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::error!(error = %e, "cannot load admin roster for broadcast");
            return 0;
        }
    };

    let mut delivered = 0;
    for id in ids {
        match notify_user(bot, &OwnerId(id), html).await {
            Ok(()) => delivered += 1,
            Err(e) => tracing::warn!(error = %e, "admin broadcast delivery failed"),
        }
    }
    delivered
}
