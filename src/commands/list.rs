use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cli::ListArgs;
use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::model::Message;
use crate::output::OutputMode;
use crate::store::{InboxStats, Pagination};

#[derive(Debug, Serialize)]
struct ListReport<'a> {
    messages: &'a [Message],
    stats: InboxStats,
    pagination: Pagination,
}

pub async fn run(ctx: &AppContext, args: ListArgs) -> AppResult<()> {
    if args.limit == Some(0) {
        return Err(AppError::InvalidInput(
            "--limit must be greater than 0".to_string(),
        ));
    }

    ctx.require_session().await?;

    let dashboard = ctx.dashboard(args.limit)?;
    dashboard.with_store(|store| {
        store.set_filters(args.filters.to_filters());
        store.set_sort_key(args.sort);
    });

    tokio::try_join!(dashboard.refresh_messages(), dashboard.refresh_context())?;
    for _ in 0..args.more {
        if !dashboard.load_more().await? {
            break;
        }
    }

    let now = Utc::now();
    let messages = dashboard.visible(now);
    let stats = dashboard.stats(now);
    let pagination = dashboard.with_store(|store| store.pagination());

    if ctx.output.mode() == OutputMode::Text {
        if messages.is_empty() {
            println!("0 messages");
            return Ok(());
        }

        for (index, message) in messages.iter().enumerate() {
            for line in format_message(index, message, now) {
                println!("{line}");
            }
            if index + 1 < messages.len() {
                println!();
            }
        }

        println!();
        println!("{}", format_summary(&stats, messages.len(), pagination.has_next));
        return Ok(());
    }

    let report = ListReport {
        messages: &messages,
        stats,
        pagination,
    };
    ctx.output.emit("", &report)
}

fn format_message(index: usize, message: &Message, now: DateTime<Utc>) -> Vec<String> {
    let unread = if message.is_read { " " } else { "*" };
    vec![
        format!("{}.{unread} {}", index + 1, message.id),
        format!("   from: {} ({})", message.sender, message.source),
        format!("   subject: {}", message.subject),
        format!("   received: {}", format_age(message.timestamp, now)),
        format!(
            "   priority: {} | context: {} | confidence: {:.0}%",
            message.priority.label(),
            message.context.label(),
            message.confidence
        ),
        String::new(),
        format!("   {}", format_preview(&message.preview)),
    ]
}

fn format_summary(stats: &InboxStats, shown: usize, has_next: bool) -> String {
    let more = if has_next {
        " (more available, use --more)"
    } else {
        ""
    };
    format!(
        "{shown} shown of {} | {} unread | {} urgent | {} important{more}",
        stats.total, stats.unread, stats.urgent, stats.important
    )
}

fn format_age(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let age = now.signed_duration_since(timestamp);
    if age.num_minutes() < 1 {
        return "just now".to_string();
    }
    if age.num_hours() < 1 {
        return format!("{}m ago", age.num_minutes());
    }
    if age.num_days() < 1 {
        return format!("{}h ago", age.num_hours());
    }
    if age.num_days() < 7 {
        return format!("{}d ago", age.num_days());
    }
    timestamp.format("%Y-%m-%d").to_string()
}

fn format_preview(preview: &str) -> String {
    let decoded = html_escape::decode_html_entities(preview).to_string();
    let compact = decoded.split_whitespace().collect::<Vec<_>>().join(" ");
    if compact.is_empty() {
        return "(no preview)".to_string();
    }

    if compact.len() <= 120 {
        return compact;
    }

    let mut end = 120;
    while !compact.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &compact[..end])
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    #[test]
    fn formats_preview_with_truncation() {
        let input = "this is a very long preview string that should be truncated at one hundred and twenty characters to keep list output compact and readable";
        let preview = format_preview(input);
        assert!(preview.ends_with("..."));
        assert!(preview.len() <= 123);
    }

    #[test]
    fn decodes_common_html_entities_in_preview() {
        let preview = format_preview("I&#39;ve &amp; you&#x27;ve &lt;done&gt; this");
        assert_eq!(preview, "I've & you've <done> this");
    }

    #[test]
    fn empty_preview_has_placeholder() {
        assert_eq!(format_preview("  \n "), "(no preview)");
    }

    #[test]
    fn formats_relative_age() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();
        assert_eq!(format_age(now - Duration::seconds(20), now), "just now");
        assert_eq!(format_age(now - Duration::minutes(5), now), "5m ago");
        assert_eq!(format_age(now - Duration::hours(3), now), "3h ago");
        assert_eq!(format_age(now - Duration::days(2), now), "2d ago");
        assert_eq!(format_age(now - Duration::days(30), now), "2026-09-18");
    }

    #[test]
    fn summary_mentions_more_pages() {
        let stats = InboxStats {
            total: 120,
            unread: 4,
            urgent: 2,
            important: 5,
        };
        assert_eq!(
            format_summary(&stats, 20, true),
            "20 shown of 120 | 4 unread | 2 urgent | 5 important (more available, use --more)"
        );
    }
}
