use tokio::sync::watch;
use tracing::{info, warn};

use crate::api::{AuthApi, LoginRequest};
use crate::error::{AppError, AppResult};

use super::session::{AuthSession, AuthState, SessionHandle};

/// Drives the session lifecycle:
/// `checking -> authenticated | unauthenticated | error`, login goes back
/// through `checking`, logout always lands in `unauthenticated`.
#[derive(Debug)]
pub struct AuthHolder<A> {
    api: A,
    session: SessionHandle,
}

impl<A: AuthApi> AuthHolder<A> {
    pub fn new(api: A, session: SessionHandle) -> Self {
        Self { api, session }
    }

    pub fn state(&self) -> AuthState {
        self.session.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.session.subscribe()
    }

    /// Establish the session on start-up. A profile carried on the login
    /// redirect is trusted as-is; otherwise the backend is probed.
    pub async fn initialize(&self, redirect_profile: Option<AuthSession>) -> AuthState {
        self.session.set_state(AuthState::Checking);

        if let Some(profile) = redirect_profile {
            return self.authenticate(profile);
        }

        self.probe().await
    }

    /// Re-run the start-up check, e.g. after an `Error` state.
    pub async fn retry(&self) -> AuthState {
        self.initialize(None).await
    }

    pub async fn begin_login(&self, redirect_uri: &str) -> AppResult<LoginRequest> {
        self.session.set_state(AuthState::Checking);

        match self.api.google_auth_url(redirect_uri).await {
            Ok(request) => Ok(request),
            Err(err) => {
                self.session.set_state(AuthState::Error(err.user_message()));
                Err(err)
            }
        }
    }

    pub async fn complete_login(&self, code: &str, state: &str) -> AuthState {
        self.session.set_state(AuthState::Checking);

        match self.api.exchange_code(code, state).await {
            Ok(Some(profile)) => self.authenticate(profile),
            Ok(None) => self.probe().await,
            Err(err) => self.fail(err),
        }
    }

    /// Log out. Local state is cleared whatever the backend says.
    pub async fn logout(&self) -> AuthState {
        if let Err(err) = self.api.logout().await {
            warn!(error = %err, "backend logout failed; clearing local session anyway");
        }
        if let Err(err) = self.session.clear_credentials() {
            warn!(error = %err, "failed to clear stored credentials");
        }

        info!("logged out");
        self.session.set_state(AuthState::Unauthenticated);
        AuthState::Unauthenticated
    }

    async fn probe(&self) -> AuthState {
        match self.api.profile().await {
            Ok(profile) => self.authenticate(profile),
            Err(err) => self.fail(err),
        }
    }

    fn authenticate(&self, profile: AuthSession) -> AuthState {
        if let Err(err) = self.session.store_user(Some(profile.clone())) {
            warn!(error = %err, "failed to cache user profile");
        }
        info!(user = %profile.email, "authenticated");

        let state = AuthState::Authenticated(profile);
        self.session.set_state(state.clone());
        state
    }

    /// A 4xx rejection means "not logged in". Server faults and anything
    /// else are unexpected failures the user can retry.
    fn fail(&self, err: AppError) -> AuthState {
        let state = match &err {
            AppError::Unauthorized(_) => AuthState::Unauthenticated,
            AppError::Api { status, .. } if *status < 500 => AuthState::Unauthenticated,
            other => AuthState::Error(other.user_message()),
        };

        warn!(error = %err, state = ?state, "session check failed");
        self.session.set_state(state.clone());
        state
    }
}
