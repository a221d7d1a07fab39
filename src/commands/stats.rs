use chrono::Utc;

use crate::cli::FilterArgs;
use crate::context::AppContext;
use crate::error::AppResult;

pub async fn run(ctx: &AppContext, args: FilterArgs) -> AppResult<()> {
    ctx.require_session().await?;

    let dashboard = ctx.dashboard(None)?;
    dashboard.with_store(|store| store.set_filters(args.to_filters()));
    tokio::try_join!(dashboard.refresh_messages(), dashboard.refresh_context())?;

    let stats = dashboard.stats(Utc::now());
    let lines = vec![
        format!("total:     {}", stats.total),
        format!("unread:    {}", stats.unread),
        format!("urgent:    {}", stats.urgent),
        format!("important: {}", stats.important),
    ];
    ctx.output.emit_lines(&lines, &stats)
}
