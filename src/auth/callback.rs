use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::time;
use tracing::debug;
use url::Url;

use crate::error::{AppError, AppResult};

use super::session::AuthSession;

/// What the backend handed back on the login redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackQuery {
    pub state: String,
    pub code: Option<String>,
    pub token: Option<String>,
    pub profile: Option<AuthSession>,
}

/// Accept one redirect on the local `redirect_uri` and return its query.
pub async fn wait_for_callback(
    redirect_uri: &str,
    expected_state: &str,
    timeout: Duration,
) -> AppResult<CallbackQuery> {
    let redirect = Url::parse(redirect_uri)?;
    if redirect.scheme() != "http" {
        return Err(AppError::Config(
            "redirect_uri must use http for local callback capture".to_string(),
        ));
    }

    let host = redirect
        .host_str()
        .ok_or_else(|| AppError::Config("redirect_uri is missing host".to_string()))?;
    let port = redirect
        .port_or_known_default()
        .ok_or_else(|| AppError::Config("redirect_uri is missing port".to_string()))?;
    let path = redirect.path().to_string();

    let listener = TcpListener::bind((host, port)).await.map_err(|err| {
        AppError::Auth(format!(
            "failed to bind login callback listener on {host}:{port}: {err}"
        ))
    })?;
    debug!(%host, port, "waiting for login redirect");

    time::timeout(timeout, async {
        let (mut stream, _) = listener.accept().await?;

        let mut buf = vec![0_u8; 8192];
        let size = stream.read(&mut buf).await?;
        if size == 0 {
            return Err(AppError::Auth("empty login callback request".to_string()));
        }

        let request = String::from_utf8_lossy(&buf[..size]);
        let request_line = request
            .lines()
            .next()
            .ok_or_else(|| AppError::Auth("malformed login callback request".to_string()))?;

        let mut parts = request_line.split_whitespace();
        let method = parts.next().unwrap_or_default();
        let target = parts.next().unwrap_or_default();

        if method != "GET" {
            write_callback_response(
                &mut stream,
                "405 Method Not Allowed",
                "login callback only accepts GET requests",
            )
            .await?;
            return Err(AppError::Auth(
                "login callback received non-GET request".to_string(),
            ));
        }

        match parse_callback(target, &path, expected_state) {
            Ok(callback) => {
                write_callback_response(
                    &mut stream,
                    "200 OK",
                    "inbox login complete. you can return to the terminal.",
                )
                .await?;
                Ok(callback)
            }
            Err(err) => {
                let _ = write_callback_response(
                    &mut stream,
                    "400 Bad Request",
                    &format!("login callback error: {err}"),
                )
                .await;
                Err(err)
            }
        }
    })
    .await
    .map_err(|_| AppError::Auth("timed out waiting for login callback".to_string()))?
}

pub fn parse_callback(
    target: &str,
    expected_path: &str,
    expected_state: &str,
) -> AppResult<CallbackQuery> {
    let callback_url = Url::parse(&format!("http://localhost{target}"))?;
    if callback_url.path() != expected_path {
        return Err(AppError::Auth(format!(
            "login callback path mismatch: expected {expected_path}, got {}",
            callback_url.path()
        )));
    }

    let pairs = callback_url
        .query_pairs()
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect::<Vec<_>>();
    let value = |name: &str| {
        pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    };

    if let Some(error) = value("error") {
        let description = value("error_description").unwrap_or_else(|| "no description".to_string());
        return Err(AppError::Auth(format!(
            "authorization failed: {error} ({description})"
        )));
    }

    let state = value("state")
        .ok_or_else(|| AppError::Auth("login callback missing state parameter".to_string()))?;
    if state != expected_state {
        return Err(AppError::Auth(
            "login state mismatch; aborting login".to_string(),
        ));
    }

    let code = value("code");
    let token = value("token");
    let profile =
        AuthSession::from_query_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));

    if code.is_none() && profile.is_none() {
        return Err(AppError::Auth(
            "login callback carried neither a code nor a profile".to_string(),
        ));
    }

    Ok(CallbackQuery {
        state,
        code,
        token,
        profile,
    })
}

async fn write_callback_response(
    stream: &mut tokio::net::TcpStream,
    status: &str,
    message: &str,
) -> AppResult<()> {
    let body = format!(
        "<!doctype html><html><body><p>{}</p></body></html>",
        html_escape::encode_text(message)
    );

    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );

    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}

pub fn open_browser(url: &str) -> bool {
    #[cfg(target_os = "macos")]
    {
        return std::process::Command::new("open")
            .arg(url)
            .status()
            .is_ok_and(|status| status.success());
    }

    #[cfg(target_os = "linux")]
    {
        return std::process::Command::new("xdg-open")
            .arg(url)
            .status()
            .is_ok_and(|status| status.success());
    }

    #[cfg(target_os = "windows")]
    {
        return std::process::Command::new("cmd")
            .args(["/C", "start", "", url])
            .status()
            .is_ok_and(|status| status.success());
    }

    #[allow(unreachable_code)]
    false
}
