use crate::cli::{Cli, Command};
use crate::commands;
use crate::context::AppContext;
use crate::error::AppResult;

pub async fn run(cli: Cli) -> AppResult<()> {
    let Cli {
        profile,
        json,
        verbose,
        command,
    } = cli;

    let ctx = AppContext::bootstrap(profile, json, verbose)?;

    match command {
        Command::Auth(args) => commands::auth::run(&ctx, args.command).await,
        Command::List(args) => commands::list::run(&ctx, args).await,
        Command::Stats(args) => commands::stats::run(&ctx, args).await,
        Command::Feedback(args) => commands::feedback::run(&ctx, args).await,
        Command::Analytics(args) => commands::analytics::run(&ctx, args).await,
        Command::Sync => commands::sync::run(&ctx).await,
        Command::Gmail(args) => commands::gmail::run(&ctx, args.command).await,
        Command::Config(args) => commands::config::run(&ctx, args.command),
    }
}
