use std::sync::Arc;

use crate::api::InboxClient;
use crate::auth::{AuthHolder, AuthSession, AuthState, FileCredentialStore, SessionHandle};
use crate::config::{self, AppPaths, Settings};
use crate::dashboard::{Dashboard, DashboardOptions};
use crate::error::{AppError, AppResult};
use crate::output::Output;

#[derive(Debug)]
pub struct AppContext {
    pub profile: String,
    pub verbose: u8,
    pub paths: AppPaths,
    pub settings: Settings,
    pub session: SessionHandle,
    pub client: InboxClient,
    pub output: Output,
}

impl AppContext {
    pub fn bootstrap(profile: String, json: bool, verbose: u8) -> AppResult<Self> {
        let profile = config::resolve_profile(&profile);
        let paths = AppPaths::discover()?;
        let settings = config::load_settings(&paths, &profile)?;
        let credentials = FileCredentialStore::new(paths.clone(), &profile);
        let session = SessionHandle::new(Arc::new(credentials));
        let client = InboxClient::new(&settings.api_base_url(), session.clone())?;
        let output = Output::new(json);

        Ok(Self {
            profile,
            verbose,
            paths,
            settings,
            session,
            client,
            output,
        })
    }

    pub fn auth(&self) -> AuthHolder<InboxClient> {
        AuthHolder::new(self.client.clone(), self.session.clone())
    }

    pub fn dashboard(&self, page_size: Option<u32>) -> AppResult<Dashboard<InboxClient>> {
        let page_size = match page_size {
            Some(size) => size,
            None => self.settings.page_size()?,
        };
        let options = DashboardOptions {
            page_size,
            debounce: self.settings.debounce(),
            ..DashboardOptions::default()
        };
        Ok(Dashboard::new(self.client.clone(), options))
    }

    /// Probe the backend and return the signed-in user.
    pub async fn require_session(&self) -> AppResult<AuthSession> {
        match self.auth().initialize(None).await {
            AuthState::Authenticated(session) => Ok(session),
            AuthState::Error(message) => Err(AppError::Auth(message)),
            AuthState::Checking | AuthState::Unauthenticated => Err(AppError::Unauthorized(
                "not logged in".to_string(),
            )),
        }
    }
}
