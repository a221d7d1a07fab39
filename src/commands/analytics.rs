use crate::api::{AnalyticsSnapshot, InboxApi};
use crate::cli::AnalyticsArgs;
use crate::context::AppContext;
use crate::error::{AppError, AppResult};

pub async fn run(ctx: &AppContext, args: AnalyticsArgs) -> AppResult<()> {
    let days = args.days.unwrap_or_else(|| ctx.settings.analytics_days());
    if days == 0 {
        return Err(AppError::InvalidInput(
            "--days must be greater than 0".to_string(),
        ));
    }

    let user = ctx.require_session().await?;
    let snapshot = ctx.client.analytics(&user.user_id, days, args.trends).await?;

    ctx.output.emit_lines(&format_snapshot(&snapshot), &snapshot)
}

fn format_snapshot(snapshot: &AnalyticsSnapshot) -> Vec<String> {
    let stats = &snapshot.message_stats;
    let mut lines = vec![
        format!("last {} days", snapshot.days),
        format!(
            "messages: {} total, {} processed, {} unread, {} urgent",
            stats.total, stats.processed, stats.unread, stats.urgent
        ),
    ];
    if let Some(confidence) = stats.confidence {
        lines.push(format!(
            "average confidence: {:.0}%",
            crate::model::confidence_percent(Some(confidence))
        ));
    }

    lines.push("priority:".to_string());
    for (priority, count) in snapshot.display_priority_distribution() {
        lines.push(format!("  {:<14} {count}", priority.label()));
    }

    if !snapshot.source_breakdown.is_empty() {
        lines.push("sources:".to_string());
        for (source, count) in &snapshot.source_breakdown {
            lines.push(format!("  {source:<14} {count}"));
        }
    }

    let insights = snapshot
        .insights
        .iter()
        .map(|insight| insight.text())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>();
    if !insights.is_empty() {
        lines.push("insights:".to_string());
        lines.extend(insights.into_iter().map(|text| format!("  - {text}")));
    }

    lines
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn renders_display_priorities_and_insights() {
        let mut snapshot: AnalyticsSnapshot = serde_json::from_value(json!({
            "message_stats": {"total_messages": 40, "processed_messages": 38, "unread": 6, "high_priority": 3},
            "priority_distribution": {"high": 3, "medium": 10, "low": 27},
            "source_breakdown": {"gmail": 40},
            "insights": ["Tuesdays are busiest"]
        }))
        .expect("snapshot");
        snapshot.days = 7;

        let lines = format_snapshot(&snapshot);
        assert_eq!(lines[0], "last 7 days");
        assert_eq!(lines[1], "messages: 40 total, 38 processed, 6 unread, 3 urgent");
        assert!(lines.contains(&"  Very Urgent    3".to_string()));
        assert!(lines.contains(&"  Not Important  27".to_string()));
        assert!(lines.contains(&"  - Tuesdays are busiest".to_string()));
    }
}
