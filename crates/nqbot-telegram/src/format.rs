//! Presentation helpers: HTML escaping, status rendering, timestamps.

use chrono::{DateTime, Duration, Utc};

/// Escape for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Unknown labels (old deployments, hand-edited rows) render as a question
/// mark rather than failing.
pub fn status_emoji(status: &str) -> &'static str {
    match status {
        "waiting" => "⏳",
        "processed" => "✅",
        "rejected" => "❌",
        "in_progress" => "🔄",
        "failed" => "🔥",
        "pending" => "⌛",
        "canceled" => "🚫",
        "expired" => "⏰",
        _ => "❓",
    }
}

pub fn status_label(status: &str) -> &'static str {
    match status {
        "waiting" => "Waiting",
        "processed" => "Processed",
        "rejected" => "Rejected",
        "in_progress" => "In progress",
        "failed" => "Dropped",
        "pending" => "Awaiting code",
        "canceled" => "Canceled",
        "expired" => "Expired",
        _ => "Unknown",
    }
}

pub fn status_description(status: &str) -> &'static str {
    match status {
        "waiting" => "The number is waiting to be processed",
        "processed" => "The number has been processed",
        "rejected" => "The number was rejected",
        "in_progress" => "The number is being processed right now",
        "failed" => "The account on this number was dropped",
        "pending" => "A login code is expected for this number",
        "canceled" => "Processing of this number was canceled",
        "expired" => "The request for this number expired",
        _ => "Unknown status",
    }
}

const MSK_OFFSET_HOURS: i64 = 3;

/// Server time as shown to users (MSK, UTC+3).
pub fn msk_now() -> String {
    format_msk(Utc::now())
}

pub fn format_msk(at: DateTime<Utc>) -> String {
    (at + Duration::hours(MSK_OFFSET_HOURS))
        .format("%d.%m.%Y %H:%M")
        .to_string()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn escaping_covers_html_specials() {
        assert_eq!(
            escape_html(r#"<b>&"quoted"</b>"#),
            "&lt;b&gt;&amp;&quot;quoted&quot;&lt;/b&gt;"
        );
    }

    #[test]
    fn unknown_status_has_a_fallback_rendering() {
        assert_eq!(status_emoji("banana"), "❓");
        assert_eq!(status_label("banana"), "Unknown");
        assert_eq!(status_description("banana"), "Unknown status");
    }

    #[test]
    fn every_known_status_renders() {
        for status in nqbot_core::domain::PhoneStatus::ALL {
            assert_ne!(status_emoji(status.as_str()), "❓");
            assert_ne!(status_label(status.as_str()), "Unknown");
        }
    }

    #[test]
    fn msk_is_three_hours_ahead_of_utc() {
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 22, 30, 0).unwrap();
        assert_eq!(format_msk(at), "02.01.2026 01:30");
    }
}
