//! Inline keyboard builders. Every callback button encodes a
//! `CallbackCommand`.

use std::collections::BTreeMap;

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use nqbot_core::domain::PhoneStatus;

use crate::callbacks::CallbackCommand;

fn btn(text: &str, cmd: CallbackCommand) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text.to_string(), cmd.encode())
}

/// Back button with a label matching its destination.
pub fn back(target: CallbackCommand) -> InlineKeyboardMarkup {
    let text = match target {
        CallbackCommand::MainMenu => "⬅️ Back to main menu",
        CallbackCommand::NumbersMenu => "⬅️ Back to numbers menu",
        CallbackCommand::AdminMenu => "⬅️ Back to admin menu",
        _ => "⬅️ Back",
    };
    InlineKeyboardMarkup::new(vec![vec![btn(text, target)]])
}

pub fn main_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![btn("📱 Numbers", CallbackCommand::NumbersMenu)],
        vec![btn("📢 Group", CallbackCommand::Group)],
        vec![btn("💸 Prices", CallbackCommand::Prices)],
        vec![btn("ℹ️ Information", CallbackCommand::Info)],
    ])
}

pub fn numbers_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            btn("➕ Add", CallbackCommand::AddNumber),
            btn("🗑️ Delete", CallbackCommand::DeleteNumberMenu),
        ],
        vec![
            btn("📝 Queue", CallbackCommand::ShowQueue),
            btn("🌐 Statistics", CallbackCommand::ShowStats),
        ],
        vec![btn("⬅️ Back to main menu", CallbackCommand::MainMenu)],
    ])
}

/// One delete button per number.
pub fn delete_numbers(numbers: &BTreeMap<String, String>) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = numbers
        .keys()
        .map(|number| {
            vec![btn(
                &format!("🗑️ {number}"),
                CallbackCommand::DeleteNumber {
                    number: number.clone(),
                },
            )]
        })
        .collect();
    rows.push(vec![btn("⬅️ Back", CallbackCommand::NumbersMenu)]);
    InlineKeyboardMarkup::new(rows)
}

pub fn admin_menu(is_main_admin: bool) -> InlineKeyboardMarkup {
    let mut rows = vec![
        vec![
            btn("📱 Numbers", CallbackCommand::AdminNumbers),
            btn("📊 Work status", CallbackCommand::ToggleWork),
        ],
        vec![btn("👨‍💼 Moderator status", CallbackCommand::ToggleModerator)],
    ];
    if is_main_admin {
        rows.push(vec![btn("👥 Manage admins", CallbackCommand::ManageAdmins)]);
    }
    rows.push(vec![btn("⬅️ Back to main menu", CallbackCommand::MainMenu)]);
    InlineKeyboardMarkup::new(rows)
}

/// Admin roster: one removal button per admin (the handler still refuses
/// main admins), plus an add button. `entries` is (id, display name, main?).
pub fn admins_list(entries: &[(String, String, bool)]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = entries
        .iter()
        .map(|(id, display, is_main)| {
            let crown = if *is_main { " 👑" } else { "" };
            vec![btn(
                &format!("❌ {display}{crown}"),
                CallbackCommand::RemoveAdmin { id: id.clone() },
            )]
        })
        .collect();
    rows.push(vec![btn("➕ Add admin", CallbackCommand::AddAdmin)]);
    rows.push(vec![btn(
        "⬅️ Back to admin menu",
        CallbackCommand::AdminMenu,
    )]);
    InlineKeyboardMarkup::new(rows)
}

/// All numbers in the system. `rows` is (button label, owner id, number).
pub fn admin_numbers(rows: &[(String, String, String)]) -> InlineKeyboardMarkup {
    let mut keyboard: Vec<Vec<InlineKeyboardButton>> = rows
        .iter()
        .map(|(label, owner, number)| {
            vec![btn(
                label,
                CallbackCommand::NumberAction {
                    owner: owner.clone(),
                    number: number.clone(),
                },
            )]
        })
        .collect();
    keyboard.push(vec![btn(
        "⬅️ Back to admin menu",
        CallbackCommand::AdminMenu,
    )]);
    InlineKeyboardMarkup::new(keyboard)
}

/// Per-number admin actions: inert info rows on top, then the status
/// buttons, then the code-sending action.
pub fn number_actions(owner: &str, number: &str, info_lines: &[String]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = info_lines
        .iter()
        .map(|line| vec![btn(line, CallbackCommand::NoAction)])
        .collect();

    rows.push(vec![btn(
        "⎯⎯⎯ Change status ⎯⎯⎯",
        CallbackCommand::NoAction,
    )]);
    for status in [
        PhoneStatus::Processed,
        PhoneStatus::Rejected,
        PhoneStatus::Waiting,
        PhoneStatus::Failed,
        PhoneStatus::Pending,
        PhoneStatus::Canceled,
    ] {
        rows.push(vec![btn(
            &format!(
                "{} {}",
                crate::format::status_emoji(status.as_str()),
                crate::format::status_label(status.as_str())
            ),
            CallbackCommand::SetStatus {
                owner: owner.to_string(),
                number: number.to_string(),
                status,
            },
        )]);
    }

    rows.push(vec![btn("⎯⎯⎯ Actions ⎯⎯⎯", CallbackCommand::NoAction)]);
    rows.push(vec![btn(
        "📤 Send code",
        CallbackCommand::SendCode {
            owner: owner.to_string(),
            number: number.to_string(),
        },
    )]);
    rows.push(vec![btn(
        "⬅️ Back to number list",
        CallbackCommand::AdminNumbers,
    )]);
    InlineKeyboardMarkup::new(rows)
}

pub fn confirm_send_code() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        btn("✅ Confirm", CallbackCommand::ConfirmSendCode),
        btn("❌ Cancel", CallbackCommand::CancelSendCode),
    ]])
}

/// Accept/decline buttons shown to the owner under a forwarded code.
pub fn code_response(number: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        btn(
            "✅ Code accepted",
            CallbackCommand::CodeResponse {
                accepted: true,
                number: number.to_string(),
            },
        ),
        btn(
            "❌ Code rejected",
            CallbackCommand::CodeResponse {
                accepted: false,
                number: number.to_string(),
            },
        ),
    ]])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payloads(markup: &InlineKeyboardMarkup) -> Vec<String> {
        markup
            .inline_keyboard
            .iter()
            .flatten()
            .filter_map(|b| match &b.kind {
                teloxide::types::InlineKeyboardButtonKind::CallbackData(data) => {
                    Some(data.clone())
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn every_button_payload_parses() {
        let mut numbers = BTreeMap::new();
        numbers.insert("+12345678901".to_string(), "waiting".to_string());

        let markups = [
            main_menu(),
            numbers_menu(),
            back(CallbackCommand::MainMenu),
            delete_numbers(&numbers),
            admin_menu(true),
            admins_list(&[("42".into(), "Jo".into(), false)]),
            admin_numbers(&[("label".into(), "100".into(), "+12345678901".into())]),
            number_actions("100", "+12345678901", &["👤 Jo".to_string()]),
            confirm_send_code(),
            code_response("+12345678901"),
        ];

        for markup in &markups {
            for payload in payloads(markup) {
                assert!(
                    CallbackCommand::parse(&payload).is_some(),
                    "unparseable payload: {payload}"
                );
            }
        }
    }

    #[test]
    fn manage_admins_button_is_main_admin_only() {
        assert!(payloads(&admin_menu(true))
            .iter()
            .any(|p| p == "manage_admins"));
        assert!(!payloads(&admin_menu(false))
            .iter()
            .any(|p| p == "manage_admins"));
    }
}
