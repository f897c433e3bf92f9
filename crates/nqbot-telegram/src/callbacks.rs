//! Callback payloads as a tagged command type.
//!
//! Every inline button carries one of these, encoded as a short
//! colon-separated string. Parsing happens exactly once, at the dispatch
//! boundary; handlers only ever see the enum.

use nqbot_core::domain::PhoneStatus;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallbackCommand {
    MainMenu,
    NumbersMenu,
    Group,
    Prices,
    Info,
    AddNumber,
    /// Opens the per-number delete keyboard.
    DeleteNumberMenu,
    DeleteNumber {
        number: String,
    },
    ShowQueue,
    ShowStats,
    AdminMenu,
    ToggleWork,
    ToggleModerator,
    AdminNumbers,
    NumberAction {
        owner: String,
        number: String,
    },
    SetStatus {
        owner: String,
        number: String,
        status: PhoneStatus,
    },
    SendCode {
        owner: String,
        number: String,
    },
    ConfirmSendCode,
    CancelSendCode,
    ManageAdmins,
    AddAdmin,
    RemoveAdmin {
        id: String,
    },
    /// The owner's answer to a forwarded login code.
    CodeResponse {
        accepted: bool,
        number: String,
    },
    /// Inert label rows in keyboards.
    NoAction,
}

impl CallbackCommand {
    pub fn parse(data: &str) -> Option<Self> {
        let parts: Vec<&str> = data.split(':').collect();
        let cmd = match parts.as_slice() {
            ["main_menu"] => Self::MainMenu,
            ["numbers_menu"] => Self::NumbersMenu,
            ["group"] => Self::Group,
            ["prices"] => Self::Prices,
            ["info"] => Self::Info,
            ["add_number"] => Self::AddNumber,
            ["delete_number"] => Self::DeleteNumberMenu,
            ["delete_number", number] => Self::DeleteNumber {
                number: (*number).to_string(),
            },
            ["show_queue"] => Self::ShowQueue,
            ["show_stats"] => Self::ShowStats,
            ["admin_menu"] => Self::AdminMenu,
            ["toggle_work"] => Self::ToggleWork,
            ["toggle_moderator"] => Self::ToggleModerator,
            ["admin_numbers"] => Self::AdminNumbers,
            ["number_action", owner, number] => Self::NumberAction {
                owner: (*owner).to_string(),
                number: (*number).to_string(),
            },
            ["set_status", owner, number, status] => Self::SetStatus {
                owner: (*owner).to_string(),
                number: (*number).to_string(),
                status: PhoneStatus::parse(status)?,
            },
            ["send_code", owner, number] => Self::SendCode {
                owner: (*owner).to_string(),
                number: (*number).to_string(),
            },
            ["confirm", "send_code"] => Self::ConfirmSendCode,
            ["cancel", "send_code"] => Self::CancelSendCode,
            ["manage_admins"] => Self::ManageAdmins,
            ["add_admin"] => Self::AddAdmin,
            ["remove_admin", id] => Self::RemoveAdmin {
                id: (*id).to_string(),
            },
            ["code_response", answer, number] => Self::CodeResponse {
                accepted: match *answer {
                    "yes" => true,
                    "no" => false,
                    _ => return None,
                },
                number: (*number).to_string(),
            },
            ["no_action"] => Self::NoAction,
            _ => return None,
        };
        Some(cmd)
    }

    pub fn encode(&self) -> String {
        match self {
            Self::MainMenu => "main_menu".to_string(),
            Self::NumbersMenu => "numbers_menu".to_string(),
            Self::Group => "group".to_string(),
            Self::Prices => "prices".to_string(),
            Self::Info => "info".to_string(),
            Self::AddNumber => "add_number".to_string(),
            Self::DeleteNumberMenu => "delete_number".to_string(),
            Self::DeleteNumber { number } => format!("delete_number:{number}"),
            Self::ShowQueue => "show_queue".to_string(),
            Self::ShowStats => "show_stats".to_string(),
            Self::AdminMenu => "admin_menu".to_string(),
            Self::ToggleWork => "toggle_work".to_string(),
            Self::ToggleModerator => "toggle_moderator".to_string(),
            Self::AdminNumbers => "admin_numbers".to_string(),
            Self::NumberAction { owner, number } => format!("number_action:{owner}:{number}"),
            Self::SetStatus {
                owner,
                number,
                status,
            } => format!("set_status:{owner}:{number}:{status}"),
            Self::SendCode { owner, number } => format!("send_code:{owner}:{number}"),
            Self::ConfirmSendCode => "confirm:send_code".to_string(),
            Self::CancelSendCode => "cancel:send_code".to_string(),
            Self::ManageAdmins => "manage_admins".to_string(),
            Self::AddAdmin => "add_admin".to_string(),
            Self::RemoveAdmin { id } => format!("remove_admin:{id}"),
            Self::CodeResponse { accepted, number } => {
                let answer = if *accepted { "yes" } else { "no" };
                format!("code_response:{answer}:{number}")
            }
            Self::NoAction => "no_action".to_string(),
        }
    }
}
