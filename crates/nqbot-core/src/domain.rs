use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Telegram user id, stored as text (the persisted data keys everything by
/// the stringified id).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(pub String);

impl OwnerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for OwnerId {
    fn from(id: i64) -> Self {
        OwnerId(id.to_string())
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        OwnerId(String::new())
    }
}

/// The status labels an admin can assign to a queued number.
///
/// Stored records carry the label as plain text; labels written by older
/// deployments that are not in this set are tolerated on read and rendered
/// as "unknown" by the presentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhoneStatus {
    Waiting,
    Processed,
    Rejected,
    InProgress,
    Failed,
    Pending,
    Canceled,
    Expired,
}

impl PhoneStatus {
    pub const ALL: [PhoneStatus; 8] = [
        PhoneStatus::Waiting,
        PhoneStatus::Processed,
        PhoneStatus::Rejected,
        PhoneStatus::InProgress,
        PhoneStatus::Failed,
        PhoneStatus::Pending,
        PhoneStatus::Canceled,
        PhoneStatus::Expired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PhoneStatus::Waiting => "waiting",
            PhoneStatus::Processed => "processed",
            PhoneStatus::Rejected => "rejected",
            PhoneStatus::InProgress => "in_progress",
            PhoneStatus::Failed => "failed",
            PhoneStatus::Pending => "pending",
            PhoneStatus::Canceled => "canceled",
            PhoneStatus::Expired => "expired",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.as_str() == label)
    }
}

impl std::fmt::Display for PhoneStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A Telegram user as we persist them. Names may be empty; Telegram does not
/// guarantee any of them beyond the id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: OwnerId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl UserProfile {
    /// Human-readable name: "First Last (@username)" with sensible fallbacks.
    pub fn display_name(&self) -> String {
        let mut name = format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string();
        if !self.username.is_empty() {
            if name.is_empty() {
                name = format!("@{}", self.username);
            } else {
                name = format!("{} (@{})", name, self.username);
            }
        }
        if name.is_empty() {
            name = format!("ID: {}", self.id);
        }
        name
    }
}

/// Full per-number record as stored, including moderation details.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhoneDetails {
    pub status: String,
    pub note: Option<String>,
    pub added_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub processor_id: Option<String>,
    pub code_sent: bool,
    pub code_accepted: Option<bool>,
}

/// Per-owner counters. `total_added`, `processed` and `rejected` are durable
/// append-only counts; `in_queue` is the live number of current records,
/// whatever their status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OwnerStats {
    pub total_added: u64,
    pub processed: u64,
    pub rejected: u64,
    pub in_queue: u64,
}

/// A submitted number must start with `+` and carry at least 10 digits,
/// nothing but digits after the prefix.
pub fn validate_phone_number(number: &str) -> bool {
    let Some(rest) = number.strip_prefix('+') else {
        return false;
    };
    !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()) && rest.len() >= 10
}

/// Normalize user input: trim whitespace and prepend `+` when missing.
pub fn format_phone_number(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('+') {
        trimmed.to_string()
    } else {
        format!("+{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_validation_rules() {
        assert!(validate_phone_number("+12345678901"));
        assert!(validate_phone_number("+1234567890"));
        assert!(!validate_phone_number("12345678901")); // no prefix
        assert!(!validate_phone_number("+123456789")); // too short
        assert!(!validate_phone_number("+12345 67890")); // non-digit
        assert!(!validate_phone_number("+"));
        assert!(!validate_phone_number(""));
    }

    #[test]
    fn phone_formatting_adds_prefix_once() {
        assert_eq!(format_phone_number("12345678901"), "+12345678901");
        assert_eq!(format_phone_number("+12345678901"), "+12345678901");
        assert_eq!(format_phone_number("  12345678901 "), "+12345678901");
    }

    #[test]
    fn status_labels_round_trip() {
        for s in PhoneStatus::ALL {
            assert_eq!(PhoneStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(PhoneStatus::parse("banana"), None);
    }

    #[test]
    fn display_name_fallbacks() {
        let full = UserProfile {
            id: OwnerId("1".into()),
            username: "jo".into(),
            first_name: "Jo".into(),
            last_name: "Doe".into(),
        };
        assert_eq!(full.display_name(), "Jo Doe (@jo)");

        let bare = UserProfile {
            id: OwnerId("42".into()),
            ..Default::default()
        };
        assert_eq!(bare.display_name(), "ID: 42");
    }
}
