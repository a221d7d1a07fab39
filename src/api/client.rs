use std::sync::Arc;

use rand::Rng;
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::auth::{AuthSession, SessionCookies, SessionHandle};
use crate::error::{AppError, AppResult};
use crate::vocab::{BackendContext, BackendPriority};

use super::endpoints::{self, MessageQuery};
use super::models::{
    self, AnalyticsSnapshot, GmailConnect, GmailStatus, LoginRequest, MessagePage,
    RawCodeExchange, RawLoginInit, SyncResult,
};
use super::{AuthApi, InboxApi};

/// Single chokepoint for backend calls. Every request carries the session
/// cookie (and a stored bearer token, if any); a 401 tears the session down.
#[derive(Debug, Clone)]
pub struct InboxClient {
    http: Client,
    cookies: Arc<SessionCookies>,
    base_url: Url,
    session: SessionHandle,
}

impl InboxClient {
    pub fn new(base_url: &str, session: SessionHandle) -> AppResult<Self> {
        let base_url = Url::parse(base_url)?;
        let cookies = session.cookies();

        if let Some(cookie) = session.credentials()?.session_cookie {
            cookies.seed(&cookie, &base_url);
        }

        let http = Client::builder()
            .cookie_provider(Arc::clone(&cookies))
            .build()?;

        Ok(Self {
            http,
            cookies,
            base_url,
            session,
        })
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(String, String)],
    ) -> AppResult<T> {
        let payload = self.request_value(method, endpoint, query).await?;
        Ok(serde_json::from_value(payload)?)
    }

    /// Send a request and return the payload with any `{success, data}`
    /// envelope already removed.
    pub async fn request_value(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(String, String)],
    ) -> AppResult<Value> {
        let url = endpoints::join(&self.base_url, endpoint);
        self.send(method, url, query).await
    }

    async fn send(&self, method: Method, url: Url, query: &[(String, String)]) -> AppResult<Value> {
        debug!(%method, %url, "backend request");

        let mut request = self
            .http
            .request(method, url)
            .header(ACCEPT, "application/json")
            .query(query);
        if let Some(token) = self.session.bearer_token() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        self.parse_response(response).await
    }

    async fn parse_response(&self, response: reqwest::Response) -> AppResult<Value> {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status == StatusCode::UNAUTHORIZED {
            let message = parse_error_message(&body)
                .unwrap_or_else(|| "credentials rejected by server".to_string());
            self.session.force_login(&message);
            return Err(AppError::Unauthorized(message));
        }

        if !status.is_success() {
            return Err(map_api_error(status, &body));
        }

        self.persist_cookie();

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        let payload: Value = serde_json::from_str(&body)?;
        unwrap_envelope(status, payload)
    }

    fn persist_cookie(&self) {
        let Some(current) = self.cookies.header_for(&self.base_url) else {
            return;
        };

        if let Err(err) = self.session.store_cookie(Some(current)) {
            warn!(error = %err, "failed to persist session cookie");
        }
    }
}

impl AuthApi for InboxClient {
    async fn profile(&self) -> AppResult<AuthSession> {
        let payload = self
            .request_value(Method::GET, endpoints::PROFILE, &[])
            .await?;
        models::parse_profile(payload).ok_or_else(|| {
            AppError::Auth("profile response did not include a user id and email".to_string())
        })
    }

    async fn logout(&self) -> AppResult<()> {
        self.request_value(Method::POST, endpoints::LOGOUT, &[])
            .await?;
        Ok(())
    }

    async fn google_auth_url(&self, redirect_uri: &str) -> AppResult<LoginRequest> {
        let query = [("redirect_uri".to_string(), redirect_uri.to_string())];
        let init: RawLoginInit = self
            .request(Method::GET, endpoints::GOOGLE_INIT, &query)
            .await?;

        let authorization_url = init.authorization_url.ok_or_else(|| {
            AppError::Auth("login init response did not include an authorization url".to_string())
        })?;
        let mut url = Url::parse(&authorization_url)?;

        let state = match init.state.or_else(|| query_value(&url, "state")) {
            Some(state) => state,
            None => {
                let state = random_token(32);
                url.query_pairs_mut().append_pair("state", &state);
                state
            }
        };

        Ok(LoginRequest {
            authorization_url: url.to_string(),
            state,
        })
    }

    async fn exchange_code(&self, code: &str, state: &str) -> AppResult<Option<AuthSession>> {
        let query = [
            ("code".to_string(), code.to_string()),
            ("state".to_string(), state.to_string()),
        ];
        let exchange: RawCodeExchange = self
            .request(Method::GET, endpoints::GOOGLE_CALLBACK, &query)
            .await?;

        if exchange.access_token.is_some() {
            self.session.store_access_token(exchange.access_token)?;
        }

        Ok(exchange.user.and_then(models::parse_profile))
    }
}

impl InboxApi for InboxClient {
    async fn list_messages(&self, query: &MessageQuery) -> AppResult<MessagePage> {
        let payload = self
            .request_value(Method::GET, endpoints::MESSAGES, &query.to_params())
            .await?;
        Ok(models::parse_message_page(payload))
    }

    async fn fetch_from_gmail(&self) -> AppResult<SyncResult> {
        let payload = self
            .request_value(Method::POST, endpoints::FETCH_MESSAGES, &[])
            .await?;
        if payload.is_null() {
            return Ok(SyncResult::default());
        }
        Ok(serde_json::from_value(payload)?)
    }

    async fn submit_feedback(
        &self,
        id: &str,
        priority: Option<BackendPriority>,
        context: Option<BackendContext>,
    ) -> AppResult<()> {
        let url = endpoints::feedback_url(&self.base_url, id)?;
        let query = endpoints::feedback_query(priority, context);
        self.send(Method::POST, url, &query).await?;
        Ok(())
    }

    async fn analytics(
        &self,
        user_id: &str,
        days: u32,
        include_trends: bool,
    ) -> AppResult<AnalyticsSnapshot> {
        let url = endpoints::analytics_url(&self.base_url, user_id)?;
        let query = endpoints::analytics_query(days, include_trends);
        let payload = self.send(Method::GET, url, &query).await?;

        let mut snapshot: AnalyticsSnapshot = match payload {
            Value::Null => {
                warn!("empty analytics response");
                AnalyticsSnapshot::default()
            }
            payload => serde_json::from_value(payload)?,
        };
        snapshot.days = days;
        Ok(snapshot)
    }

    async fn gmail_status(&self) -> AppResult<GmailStatus> {
        self.request(Method::GET, endpoints::GMAIL_STATUS, &[])
            .await
    }

    async fn gmail_connect(&self) -> AppResult<GmailConnect> {
        self.request(Method::POST, endpoints::GMAIL_CONNECT, &[])
            .await
    }
}

/// Responses either come bare or wrapped as `{success, data}`.
fn unwrap_envelope(status: StatusCode, payload: Value) -> AppResult<Value> {
    let mut map = match payload {
        Value::Object(map) => map,
        other => return Ok(other),
    };
    let Some(success) = map.get("success").and_then(Value::as_bool) else {
        return Ok(Value::Object(map));
    };

    if !success {
        let message = error_message_from(&Value::Object(map))
            .unwrap_or_else(|| "request was not successful".to_string());
        return Err(AppError::Api {
            status: status.as_u16(),
            message,
        });
    }

    Ok(match map.remove("data") {
        Some(data) => data,
        None => {
            map.remove("success");
            Value::Object(map)
        }
    })
}

fn map_api_error(status: StatusCode, body: &str) -> AppError {
    let message = parse_error_message(body).unwrap_or_else(|| {
        let body = body.trim();
        if body.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        } else {
            body.to_string()
        }
    });

    AppError::Api {
        status: status.as_u16(),
        message,
    }
}

fn parse_error_message(body: &str) -> Option<String> {
    let payload = serde_json::from_str::<Value>(body).ok()?;
    error_message_from(&payload)
}

fn error_message_from(payload: &Value) -> Option<String> {
    for key in ["detail", "message", "error"] {
        let Some(value) = payload.get(key) else {
            continue;
        };
        match value {
            Value::String(message) if !message.trim().is_empty() => {
                return Some(message.trim().to_string());
            }
            // Validation errors arrive as a list of `{loc, msg}` objects.
            Value::Array(items) => {
                let parts = items
                    .iter()
                    .filter_map(|item| {
                        item.get("msg")
                            .and_then(Value::as_str)
                            .or_else(|| item.as_str())
                    })
                    .collect::<Vec<_>>();
                if !parts.is_empty() {
                    return Some(parts.join("; "));
                }
            }
            Value::Object(_) => {
                if let Some(message) = error_message_from(value) {
                    return Some(message);
                }
            }
            _ => {}
        }
    }
    None
}

fn query_value(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.into_owned())
}

pub(crate) fn random_token(len: usize) -> String {
    let mut bytes = vec![0_u8; len];
    rand::thread_rng().fill(bytes.as_mut_slice());
    URL_SAFE_NO_PAD.encode(bytes)
}
