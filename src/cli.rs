use clap::{ArgAction, Args, Parser, Subcommand};

use crate::model::MessageSource;
use crate::store::{MessageFilters, SortKey, TimeRange};
use crate::vocab::{DisplayContext, DisplayPriority};

#[derive(Debug, Parser)]
#[command(name = "inbox", version, about = "Smart inbox command line client")]
pub struct Cli {
    #[arg(
        long,
        global = true,
        default_value = "default",
        help = "Profile name to use"
    )]
    pub profile: String,
    #[arg(long, global = true, help = "Emit JSON output")]
    pub json: bool,
    #[arg(short = 'v', long, global = true, action = ArgAction::Count, help = "Verbose logging")]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Auth(AuthArgs),
    List(ListArgs),
    Stats(FilterArgs),
    Feedback(FeedbackArgs),
    Analytics(AnalyticsArgs),
    Sync,
    Gmail(GmailArgs),
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    Login,
    Status,
    Logout,
}

#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    #[arg(long, help = "Case-insensitive match on sender or subject")]
    pub search: Option<String>,
    #[arg(long, help = "gmail or whatsapp")]
    pub source: Option<MessageSource>,
    #[arg(long, help = "very_urgent, important or not_important")]
    pub priority: Option<DisplayPriority>,
    #[arg(long, help = "business, personal, education, social, promotions or general")]
    pub context: Option<DisplayContext>,
    #[arg(long, help = "Only unread messages")]
    pub unread: bool,
    #[arg(long, conflicts_with = "all", help = "Only messages from the last N days")]
    pub days: Option<u32>,
    #[arg(long, help = "No time cutoff (default)")]
    pub all: bool,
}

impl FilterArgs {
    pub fn to_filters(&self) -> MessageFilters {
        MessageFilters {
            search: self.search.clone(),
            source: self.source,
            context: self.context,
            priority: self.priority,
            unread_only: self.unread,
            time_range: match (self.all, self.days) {
                (false, Some(days)) => TimeRange::Days(days),
                _ => TimeRange::All,
            },
        }
    }
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub filters: FilterArgs,
    #[arg(long, help = "Page size (defaults to the profile setting)")]
    pub limit: Option<u32>,
    #[arg(long, default_value_t = 0, help = "Extra pages to load after the first")]
    pub more: u32,
    #[arg(long, default_value_t = SortKey::Date, help = "date, priority or sender")]
    pub sort: SortKey,
}

#[derive(Debug, Args)]
pub struct FeedbackArgs {
    #[arg(help = "Message id")]
    pub id: String,
    #[arg(long, help = "Corrected priority")]
    pub priority: Option<DisplayPriority>,
    #[arg(long, help = "Corrected context (business, personal or general)")]
    pub context: Option<DisplayContext>,
}

#[derive(Debug, Args)]
pub struct AnalyticsArgs {
    #[arg(long, help = "Day window (defaults to the profile setting)")]
    pub days: Option<u32>,
    #[arg(long, help = "Include trend series")]
    pub trends: bool,
}

#[derive(Debug, Args)]
pub struct GmailArgs {
    #[command(subcommand)]
    pub command: GmailCommand,
}

#[derive(Debug, Subcommand)]
pub enum GmailCommand {
    Status,
    Connect,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    Show,
    Set(ConfigSetArgs),
}

#[derive(Debug, Default, Args)]
pub struct ConfigSetArgs {
    #[arg(long, help = "Backend base URL")]
    pub api_url: Option<String>,
    #[arg(long, help = "Local OAuth redirect URI")]
    pub redirect_uri: Option<String>,
    #[arg(long, help = "Messages per page")]
    pub page_size: Option<u32>,
    #[arg(long, help = "Filter debounce in milliseconds")]
    pub debounce_ms: Option<u64>,
    #[arg(long, help = "Default analytics window in days")]
    pub analytics_days: Option<u32>,
}
