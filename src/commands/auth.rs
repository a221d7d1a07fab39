use std::time::Duration;

use serde::Serialize;

use crate::auth::callback::{self, CallbackQuery};
use crate::auth::{AuthSession, AuthState};
use crate::cli::AuthCommand;
use crate::context::AppContext;
use crate::error::{AppError, AppResult};

const LOGIN_CALLBACK_TIMEOUT_SECS: u64 = 180;

#[derive(Debug, Serialize)]
struct AuthReport {
    profile: String,
    logged_in: bool,
    user: Option<AuthSession>,
    note: String,
}

pub async fn run(ctx: &AppContext, command: AuthCommand) -> AppResult<()> {
    match command {
        AuthCommand::Login => login(ctx).await,
        AuthCommand::Status => {
            let state = ctx.auth().initialize(None).await;
            let report = report(ctx, &state);
            let text = match &state {
                AuthState::Authenticated(user) => format!(
                    "{}: logged in as {}{}",
                    ctx.profile,
                    user.email,
                    if user.gmail_connected {
                        " (gmail connected)"
                    } else {
                        " (gmail not connected)"
                    }
                ),
                AuthState::Error(message) => format!("{}: unable to check session: {message}", ctx.profile),
                _ => format!("{}: logged out", ctx.profile),
            };
            ctx.output.emit(&text, &report)
        }
        AuthCommand::Logout => {
            let state = ctx.auth().logout().await;
            let text = format!("{}: logged out", ctx.profile);
            ctx.output.emit(&text, &report(ctx, &state))
        }
    }
}

async fn login(ctx: &AppContext) -> AppResult<()> {
    let auth = ctx.auth();
    let redirect_uri = ctx.settings.redirect_uri();
    let request = auth.begin_login(&redirect_uri).await?;

    if !callback::open_browser(&request.authorization_url) {
        eprintln!(
            "open this URL in your browser to continue login:\n{}",
            request.authorization_url
        );
    }

    let callback = callback::wait_for_callback(
        &redirect_uri,
        &request.state,
        Duration::from_secs(LOGIN_CALLBACK_TIMEOUT_SECS),
    )
    .await?;

    let state = finish_login(ctx, callback).await?;
    match &state {
        AuthState::Authenticated(user) => {
            let text = format!("{}: logged in as {}", ctx.profile, user.email);
            ctx.output.emit(&text, &report(ctx, &state))
        }
        AuthState::Error(message) => Err(AppError::Auth(message.clone())),
        _ => Err(AppError::Auth(
            "login finished but the backend did not recognise the session".to_string(),
        )),
    }
}

async fn finish_login(ctx: &AppContext, callback: CallbackQuery) -> AppResult<AuthState> {
    let auth = ctx.auth();
    if let Some(code) = callback.code {
        return Ok(auth.complete_login(&code, &callback.state).await);
    }

    if callback.token.is_some() {
        ctx.session.store_access_token(callback.token)?;
    }
    Ok(auth.initialize(callback.profile).await)
}

fn report(ctx: &AppContext, state: &AuthState) -> AuthReport {
    let note = match state {
        AuthState::Authenticated(_) => "session active",
        AuthState::Checking => "session check in progress",
        AuthState::Unauthenticated => "no active session",
        AuthState::Error(message) => message.as_str(),
    };

    AuthReport {
        profile: ctx.profile.clone(),
        logged_in: state.is_authenticated(),
        user: state.session().cloned(),
        note: note.to_string(),
    }
}
