use serde::Serialize;

use crate::api::InboxApi;
use crate::cli::FeedbackArgs;
use crate::context::AppContext;
use crate::dashboard;
use crate::error::AppResult;
use crate::vocab::{DisplayContext, DisplayPriority};

#[derive(Debug, Serialize)]
struct FeedbackReport {
    id: String,
    priority: Option<DisplayPriority>,
    context: Option<DisplayContext>,
    note: String,
}

pub async fn run(ctx: &AppContext, args: FeedbackArgs) -> AppResult<()> {
    // Nothing is loaded locally here, so there is no store to patch.
    let (priority, context) = dashboard::feedback_request(args.priority, args.context)?;

    ctx.require_session().await?;
    ctx.client
        .submit_feedback(&args.id, priority, context)
        .await?;

    let mut changes = Vec::new();
    if let Some(priority) = args.priority {
        changes.push(format!("priority → {}", priority.label()));
    }
    if let Some(context) = args.context {
        changes.push(format!("context → {}", context.label()));
    }

    let report = FeedbackReport {
        id: args.id,
        priority: args.priority,
        context: args.context,
        note: "correction recorded".to_string(),
    };
    let text = format!("{}: {}", report.id, changes.join(", "));
    ctx.output.emit(&text, &report)
}
