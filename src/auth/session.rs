use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::AppResult;

use super::cookies::SessionCookies;
use super::credentials::{CredentialStore, StoredCredentials};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub user_id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub auth_method: String,
    pub gmail_connected: bool,
}

impl AuthSession {
    /// Profile handed back on the login redirect, if the query carries one.
    pub fn from_query_pairs<'a, I>(pairs: I) -> Option<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut user_id = None;
        let mut email = None;
        let mut full_name = None;
        let mut auth_method = None;
        let mut gmail_connected = false;

        for (key, value) in pairs {
            match key {
                "user_id" => user_id = Some(value.to_string()),
                "email" => email = Some(value.to_string()),
                "full_name" | "name" => full_name = Some(value.to_string()),
                "auth_method" => auth_method = Some(value.to_string()),
                "gmail_connected" => gmail_connected = value.eq_ignore_ascii_case("true"),
                _ => {}
            }
        }

        Some(Self {
            user_id: user_id.filter(|id| !id.is_empty())?,
            email: email.filter(|email| !email.is_empty())?,
            full_name,
            auth_method: auth_method.unwrap_or_else(|| "google".to_string()),
            gmail_connected,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Checking,
    Authenticated(AuthSession),
    Unauthenticated,
    Error(String),
}

impl AuthState {
    pub fn session(&self) -> Option<&AuthSession> {
        match self {
            AuthState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }
}

/// Shared auth state plus the local credential cache. Cloned into the API
/// client and the auth holder so both see the same session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    state: Arc<watch::Sender<AuthState>>,
    credentials: Arc<dyn CredentialStore>,
    cookies: Arc<SessionCookies>,
}

impl SessionHandle {
    pub fn new(credentials: Arc<dyn CredentialStore>) -> Self {
        let (state, _) = watch::channel(AuthState::Checking);
        Self {
            state: Arc::new(state),
            credentials,
            cookies: Arc::new(SessionCookies::default()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub(crate) fn set_state(&self, next: AuthState) {
        debug!(state = ?next, "auth state changed");
        self.state.send_replace(next);
    }

    pub fn credentials(&self) -> AppResult<StoredCredentials> {
        Ok(self.credentials.load()?.unwrap_or_default())
    }

    /// The live cookie jar the HTTP client sends from.
    pub fn cookies(&self) -> Arc<SessionCookies> {
        Arc::clone(&self.cookies)
    }

    pub fn bearer_token(&self) -> Option<String> {
        match self.credentials.load() {
            Ok(credentials) => credentials.and_then(|credentials| credentials.access_token),
            Err(err) => {
                warn!(error = %err, "unable to read stored credentials");
                None
            }
        }
    }

    pub fn store_access_token(&self, token: Option<String>) -> AppResult<()> {
        self.update(|credentials| credentials.access_token = token)
    }

    pub fn store_cookie(&self, cookie: Option<String>) -> AppResult<()> {
        self.update(|credentials| credentials.session_cookie = cookie)
    }

    pub fn store_user(&self, user: Option<AuthSession>) -> AppResult<()> {
        self.update(|credentials| credentials.user = user)
    }

    /// Drop the in-process cookies and the stored credentials.
    pub fn clear_credentials(&self) -> AppResult<()> {
        self.cookies.reset();
        self.credentials.clear()
    }

    /// Tear the session down after the backend rejected our credentials.
    /// Subscribers see `Unauthenticated` and must send the user back to login.
    pub fn force_login(&self, reason: &str) {
        warn!(reason, "backend rejected session; login required");
        if let Err(err) = self.clear_credentials() {
            warn!(error = %err, "failed to clear stored credentials");
        }
        self.set_state(AuthState::Unauthenticated);
    }

    fn update(&self, apply: impl FnOnce(&mut StoredCredentials)) -> AppResult<()> {
        let mut credentials = self.credentials()?;
        let before = credentials.clone();
        apply(&mut credentials);

        if credentials == before {
            return Ok(());
        }
        if credentials.is_empty() {
            return self.credentials.clear();
        }

        info!("updating stored credentials");
        self.credentials.save(&credentials)
    }
}
