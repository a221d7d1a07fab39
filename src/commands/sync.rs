use chrono::Utc;
use serde::Serialize;

use crate::api::SyncResult;
use crate::context::AppContext;
use crate::error::AppResult;
use crate::store::InboxStats;

#[derive(Debug, Serialize)]
struct SyncReport {
    sync: SyncResult,
    stats: InboxStats,
}

pub async fn run(ctx: &AppContext) -> AppResult<()> {
    ctx.require_session().await?;

    let dashboard = ctx.dashboard(None)?;
    let sync = dashboard.sync_gmail().await?;
    let stats = dashboard.stats(Utc::now());

    let mut text = format!("synced {} new messages", sync.processed);
    if let Some(message) = sync.message.as_deref() {
        text.push_str(&format!(" ({message})"));
    }
    text.push_str(&format!("; {} unread, {} urgent", stats.unread, stats.urgent));

    ctx.output.emit(&text, &SyncReport { sync, stats })
}
