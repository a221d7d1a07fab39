use serde::Serialize;
use url::Url;

use crate::cli::{ConfigCommand, ConfigSetArgs};
use crate::config::{self, Settings};
use crate::context::AppContext;
use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize)]
struct ConfigReport<'a> {
    profile: &'a str,
    settings_file: String,
    credentials_file: String,
    api_base_url: String,
    redirect_uri: String,
    page_size: Option<u32>,
    debounce_ms: u128,
    analytics_days: u32,
}

pub fn run(ctx: &AppContext, command: ConfigCommand) -> AppResult<()> {
    match command {
        ConfigCommand::Show => show(ctx, &ctx.settings),
        ConfigCommand::Set(args) => {
            // Start from the file, not the env-overridden copy in the context.
            let mut settings = config::settings::load(ctx.paths.settings_file(&ctx.profile))?;
            apply_updates(&mut settings, args)?;
            config::save_settings(&ctx.paths, &ctx.profile, &settings)?;
            show(ctx, &settings)
        }
    }
}

fn show(ctx: &AppContext, settings: &Settings) -> AppResult<()> {
    let report = ConfigReport {
        profile: &ctx.profile,
        settings_file: ctx.paths.settings_file(&ctx.profile).display().to_string(),
        credentials_file: ctx.paths.credentials_file(&ctx.profile).display().to_string(),
        api_base_url: settings.api_base_url(),
        redirect_uri: settings.redirect_uri(),
        page_size: settings.page_size().ok(),
        debounce_ms: settings.debounce().as_millis(),
        analytics_days: settings.analytics_days(),
    };

    let lines = vec![
        format!("profile:        {}", report.profile),
        format!("settings:       {}", report.settings_file),
        format!("credentials:    {}", report.credentials_file),
        format!("api url:        {}", report.api_base_url),
        format!("redirect uri:   {}", report.redirect_uri),
        format!(
            "page size:      {}",
            report
                .page_size
                .map_or_else(|| "invalid".to_string(), |size| size.to_string())
        ),
        format!("debounce:       {}ms", report.debounce_ms),
        format!("analytics days: {}", report.analytics_days),
    ];
    ctx.output.emit_lines(&lines, &report)
}

fn apply_updates(settings: &mut Settings, args: ConfigSetArgs) -> AppResult<()> {
    if let Some(url) = args.api_url {
        settings.api_base_url = Some(parse_http_url(&url, "--api-url")?);
    }
    if let Some(uri) = args.redirect_uri {
        settings.redirect_uri = Some(parse_http_url(&uri, "--redirect-uri")?);
    }
    if let Some(size) = args.page_size {
        if size == 0 {
            return Err(AppError::InvalidInput(
                "--page-size must be greater than 0".to_string(),
            ));
        }
        settings.page_size = Some(size);
    }
    if let Some(delay) = args.debounce_ms {
        settings.debounce_ms = Some(delay);
    }
    if let Some(days) = args.analytics_days {
        if days == 0 {
            return Err(AppError::InvalidInput(
                "--analytics-days must be greater than 0".to_string(),
            ));
        }
        settings.analytics_days = Some(days);
    }
    Ok(())
}

fn parse_http_url(raw: &str, flag: &str) -> AppResult<String> {
    let url = Url::parse(raw.trim())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::InvalidInput(format!(
            "{flag} must be an http or https URL"
        )));
    }
    Ok(raw.trim().trim_end_matches('/').to_string())
}
