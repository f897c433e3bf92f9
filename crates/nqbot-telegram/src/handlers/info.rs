use teloxide::prelude::*;

use crate::callbacks::CallbackCommand;
use crate::format::msk_now;
use crate::keyboards;
use crate::router::AppState;

use super::send_html;

pub async fn show(bot: &Bot, chat_id: ChatId, _state: &AppState) -> ResponseResult<()> {
    let text = format!(
        "ℹ️ <b>Service information</b>\n\
         ⏰ <i>Server time: {}</i>\n\n\
         <b>About:</b>\n\
         We rent WhatsApp accounts with professional service and a quality guarantee.\n\n\
         <b>Working hours:</b>\n\
         └ Daily, 9:00 to 20:00 (MSK)\n\n\
         <b>Rules:</b>\n\
         ├ Submit only prepared numbers\n\
         ├ Watch for notifications from the bot\n\
         └ Enter received codes promptly\n\n\
         <b>Prices:</b>\n\
         1 hour - $10\n\
         2 hours - $13\n\
         3 hours - $16\n\n\
         ‼️ Volume brings bonuses!\n\n\
         👼 <a href=\"https://t.me/XRAHITELb\">Support</a>\n\
         👥 <a href=\"https://t.me/+j28PRQtxybplMTMy\">Group</a>\n\n\
         🔔 <i>All notifications and statuses arrive automatically</i>",
        msk_now()
    );
    send_html(
        bot,
        chat_id,
        &text,
        Some(keyboards::back(CallbackCommand::MainMenu)),
    )
    .await
}
