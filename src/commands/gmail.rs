use crate::api::InboxApi;
use crate::auth::callback;
use crate::cli::GmailCommand;
use crate::context::AppContext;
use crate::error::AppResult;

pub async fn run(ctx: &AppContext, command: GmailCommand) -> AppResult<()> {
    ctx.require_session().await?;

    match command {
        GmailCommand::Status => {
            let status = ctx.client.gmail_status().await?;
            let text = if status.connected {
                let mut text = format!(
                    "gmail connected as {}",
                    status.email.as_deref().unwrap_or("(unknown account)")
                );
                if let Some(last_sync) = status.last_sync.as_deref() {
                    text.push_str(&format!(", last sync {last_sync}"));
                }
                text
            } else {
                "gmail not connected. run `inbox gmail connect`".to_string()
            };
            ctx.output.emit(&text, &status)
        }
        GmailCommand::Connect => {
            let connect = ctx.client.gmail_connect().await?;
            let text = match connect.authorization_url.as_deref() {
                Some(url) if !callback::open_browser(url) => {
                    format!("open this URL in your browser to grant gmail access:\n{url}")
                }
                Some(_) => "continue in your browser to grant gmail access".to_string(),
                None if connect.connected => "gmail connected".to_string(),
                None => connect
                    .message
                    .clone()
                    .unwrap_or_else(|| "gmail connection requested".to_string()),
            };
            ctx.output.emit(&text, &connect)
        }
    }
}
