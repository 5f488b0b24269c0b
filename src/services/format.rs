// src/services/format.rs

//! HTML chat messages for alerts and lifecycle events.

use chrono::{DateTime, Utc};
use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::models::{Alert, Tier};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Render an alert as an HTML message.
pub fn alert_message(alert: &Alert) -> String {
    let tier = alert.tier();
    let mut lines = vec![
        format!("{} <b>New announcement</b>", tier.emoji()),
        String::new(),
        format!("📋 <b>Title:</b> {}", encode_text(alert.title())),
    ];

    if let Some(link) = &alert.classified.candidate.link {
        lines.push(String::new());
        lines.push(format!(
            "🔗 <a href=\"{}\">View full announcement</a>",
            encode_double_quoted_attribute(link)
        ));
    }

    let published = alert
        .published_at()
        .map(|at| at.format(TIME_FORMAT).to_string())
        .unwrap_or_else(|| "unknown".to_string());
    lines.push(String::new());
    lines.push(format!("⏰ <b>Published:</b> {published}"));

    if !alert.classified.matched_keywords.is_empty() {
        lines.push(format!(
            "🏷 <b>Keywords:</b> {}",
            encode_text(&alert.classified.matched_keywords.join(", "))
        ));
    }

    match tier {
        Tier::Listing => {
            lines.push(String::new());
            lines.push("🔥 <b>New listing! Check it now!</b>".to_string());
        }
        Tier::Important => {
            lines.push(String::new());
            lines.push("💡 <b>Important announcement</b>".to_string());
        }
        Tier::Informational => {}
    }

    lines.join("\n")
}

/// Sent once when the loop starts.
pub fn started_message(interval_secs: u64, source_count: usize) -> String {
    format!(
        "🤖 <b>Announcement watcher started</b>\n\n\
         ⏰ Check interval: {interval_secs}s\n\
         📡 Sources: {source_count}\n\
         🎯 Focus: new listing announcements"
    )
}

/// Sent on graceful shutdown.
pub fn stopped_message() -> String {
    "🛑 <b>Announcement watcher stopped</b>".to_string()
}

/// Sent before exiting on an unrecoverable loop failure.
pub fn failed_message(error: &str) -> String {
    format!("❌ <b>Watcher failure</b>: {}", encode_text(error))
}

/// Connectivity check message.
pub fn test_message(now: DateTime<Utc>) -> String {
    format!(
        "🧪 <b>Notification test</b>\n\n\
         ✅ Watcher can reach this chat\n\
         📅 Sent at: {}",
        now.format(TIME_FORMAT)
    )
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::models::{Candidate, ClassifiedCandidate, StrategyKind};

    fn alert(text: &str, link: Option<&str>, tier: Tier, keywords: &[&str]) -> Alert {
        Alert::new(ClassifiedCandidate {
            candidate: Candidate::new(text, link.map(String::from), StrategyKind::Anchor),
            matched_keywords: keywords.iter().map(|k| k.to_string()).collect(),
            tier,
        })
    }

    #[test]
    fn listing_alert_has_banner_and_link() {
        let msg = alert_message(&alert(
            "Binance Will List XYZ",
            Some("https://www.binance.com/en/support/announcement/xyz"),
            Tier::Listing,
            &["will list"],
        ));
        assert!(msg.starts_with("🚀 <b>New announcement</b>"));
        assert!(msg.contains("📋 <b>Title:</b> Binance Will List XYZ"));
        assert!(msg.contains(
            "<a href=\"https://www.binance.com/en/support/announcement/xyz\">View full announcement</a>"
        ));
        assert!(msg.contains("⏰ <b>Published:</b> unknown"));
        assert!(msg.contains("🏷 <b>Keywords:</b> will list"));
        assert!(msg.ends_with("🔥 <b>New listing! Check it now!</b>"));
    }

    #[test]
    fn important_alert_without_link() {
        let msg = alert_message(&alert("Futures Competition", None, Tier::Important, &["futures"]));
        assert!(msg.starts_with("⭐"));
        assert!(!msg.contains("<a href"));
        assert!(msg.ends_with("💡 <b>Important announcement</b>"));
    }

    #[test]
    fn informational_alert_has_no_banner() {
        let msg = alert_message(&alert("Wallet maintenance", None, Tier::Informational, &[]));
        assert!(msg.starts_with("📢"));
        assert!(!msg.contains("Keywords"));
        assert!(msg.ends_with("⏰ <b>Published:</b> unknown"));
    }

    #[test]
    fn titles_and_links_are_escaped() {
        let msg = alert_message(&alert(
            "AT&T <script> listing",
            Some("https://x.test/?a=1&b=\"2\""),
            Tier::Listing,
            &["listing"],
        ));
        assert!(msg.contains("AT&amp;T &lt;script&gt; listing"));
        assert!(msg.contains("href=\"https://x.test/?a=1&amp;b=&quot;2&quot;\""));
    }

    #[test]
    fn published_time_is_rendered_in_utc() {
        let mut a = alert("Binance Will List XYZ", None, Tier::Listing, &["will list"]);
        a.classified.candidate.published_at = Some(Utc.with_ymd_and_hms(2024, 10, 1, 8, 0, 0).unwrap());
        assert!(alert_message(&a).contains("⏰ <b>Published:</b> 2024-10-01 08:00:00 UTC"));
    }

    #[test]
    fn lifecycle_messages() {
        assert!(started_message(30, 2).contains("Check interval: 30s"));
        assert!(started_message(30, 2).contains("Sources: 2"));
        assert!(stopped_message().contains("stopped"));
        assert_eq!(
            failed_message("signal <listener> died"),
            "❌ <b>Watcher failure</b>: signal &lt;listener&gt; died"
        );
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert!(test_message(now).contains("2024-01-02 03:04:05 UTC"));
    }
}
