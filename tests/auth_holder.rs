use std::sync::Arc;
use std::sync::Mutex;

use inbox::api::{AuthApi, LoginRequest};
use inbox::auth::{
    AuthHolder, AuthSession, AuthState, MemoryCredentialStore, SessionHandle, StoredCredentials,
};
use inbox::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy)]
enum Outcome {
    Ok,
    Unauthorized,
    Forbidden,
    Server,
    Offline,
}

impl Outcome {
    fn into_error(self) -> Option<AppError> {
        match self {
            Outcome::Ok => None,
            Outcome::Unauthorized => Some(AppError::Unauthorized("expired".to_string())),
            Outcome::Forbidden => Some(AppError::Api {
                status: 403,
                message: "account disabled".to_string(),
            }),
            Outcome::Server => Some(AppError::Api {
                status: 500,
                message: "internal error".to_string(),
            }),
            Outcome::Offline => Some(AppError::Auth("connection refused".to_string())),
        }
    }
}

#[derive(Debug)]
struct FakeAuth {
    profile: Outcome,
    logout: Outcome,
    exchange_user: Option<AuthSession>,
    calls: Mutex<Vec<&'static str>>,
}

impl FakeAuth {
    fn new(profile: Outcome) -> Self {
        Self {
            profile,
            logout: Outcome::Ok,
            exchange_user: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().expect("calls").push(call);
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().expect("calls").clone()
    }
}

#[derive(Debug, Clone)]
struct Shared(Arc<FakeAuth>);

impl AuthApi for Shared {
    async fn profile(&self) -> AppResult<AuthSession> {
        self.0.record("profile");
        match self.0.profile.into_error() {
            Some(err) => Err(err),
            None => Ok(user("1", "ada@example.com")),
        }
    }

    async fn logout(&self) -> AppResult<()> {
        self.0.record("logout");
        match self.0.logout.into_error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn google_auth_url(&self, redirect_uri: &str) -> AppResult<LoginRequest> {
        self.0.record("google_auth_url");
        Ok(LoginRequest {
            authorization_url: format!("https://accounts.example/auth?redirect={redirect_uri}"),
            state: "state-1".to_string(),
        })
    }

    async fn exchange_code(&self, _code: &str, _state: &str) -> AppResult<Option<AuthSession>> {
        self.0.record("exchange_code");
        Ok(self.0.exchange_user.clone())
    }
}

fn user(id: &str, email: &str) -> AuthSession {
    AuthSession {
        user_id: id.to_string(),
        email: email.to_string(),
        full_name: None,
        auth_method: "google".to_string(),
        gmail_connected: false,
    }
}

fn holder(api: FakeAuth) -> (AuthHolder<Shared>, Arc<FakeAuth>, SessionHandle) {
    let credentials = StoredCredentials {
        session_cookie: Some("session=abc".to_string()),
        access_token: None,
        user: None,
    };
    let session = SessionHandle::new(Arc::new(MemoryCredentialStore::with(credentials)));
    let api = Arc::new(api);
    (
        AuthHolder::new(Shared(api.clone()), session.clone()),
        api,
        session,
    )
}

#[tokio::test]
async fn starts_in_checking() {
    let (holder, api, _) = holder(FakeAuth::new(Outcome::Ok));
    assert_eq!(holder.state(), AuthState::Checking);
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn initialize_authenticates_from_profile() {
    let (holder, _, session) = holder(FakeAuth::new(Outcome::Ok));

    let state = holder.initialize(None).await;

    assert_eq!(state, AuthState::Authenticated(user("1", "ada@example.com")));
    assert_eq!(holder.state(), state);
    let cached = session.credentials().expect("credentials").user;
    assert_eq!(cached.map(|user| user.email).as_deref(), Some("ada@example.com"));
}

#[tokio::test]
async fn rejected_session_is_unauthenticated() {
    for outcome in [Outcome::Unauthorized, Outcome::Forbidden] {
        let (holder, _, _) = holder(FakeAuth::new(outcome));
        assert_eq!(holder.initialize(None).await, AuthState::Unauthenticated);
    }
}

#[tokio::test]
async fn server_fault_is_a_retryable_error() {
    let (holder, api, _) = holder(FakeAuth::new(Outcome::Server));

    let state = holder.initialize(None).await;
    assert_eq!(state, AuthState::Error("internal error".to_string()));
    assert!(!state.is_authenticated());

    holder.retry().await;
    assert_eq!(api.calls(), ["profile", "profile"]);
}

#[tokio::test]
async fn unexpected_failure_is_an_error_that_can_be_retried() {
    let (holder, api, _) = holder(FakeAuth::new(Outcome::Offline));

    let state = holder.initialize(None).await;
    assert!(matches!(state, AuthState::Error(ref message) if message.contains("connection refused")));

    holder.retry().await;
    assert_eq!(api.calls(), ["profile", "profile"]);
}

#[tokio::test]
async fn redirect_profile_skips_the_probe() {
    let (holder, api, _) = holder(FakeAuth::new(Outcome::Unauthorized));
    let redirected = user("42", "grace@example.com");

    let state = holder.initialize(Some(redirected.clone())).await;

    assert_eq!(state, AuthState::Authenticated(redirected));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn logout_clears_local_state_even_when_backend_fails() {
    let api = FakeAuth {
        logout: Outcome::Server,
        ..FakeAuth::new(Outcome::Ok)
    };
    let (holder, api, session) = holder(api);
    holder.initialize(None).await;
    let mut changes = holder.subscribe();

    let state = holder.logout().await;

    assert_eq!(state, AuthState::Unauthenticated);
    assert_eq!(*changes.borrow_and_update(), AuthState::Unauthenticated);
    assert_eq!(session.credentials().expect("credentials"), StoredCredentials::default());
    assert_eq!(api.calls(), ["profile", "logout"]);
}

#[tokio::test]
async fn login_round_trip_uses_exchanged_user() {
    let api = FakeAuth {
        exchange_user: Some(user("9", "linus@example.com")),
        ..FakeAuth::new(Outcome::Unauthorized)
    };
    let (holder, api, _) = holder(api);

    let request = holder
        .begin_login("http://127.0.0.1:8787/callback")
        .await
        .expect("login request");
    assert_eq!(holder.state(), AuthState::Checking);
    assert_eq!(request.state, "state-1");

    let state = holder.complete_login("code-1", &request.state).await;

    assert_eq!(state, AuthState::Authenticated(user("9", "linus@example.com")));
    assert_eq!(api.calls(), ["google_auth_url", "exchange_code"]);
}

#[tokio::test]
async fn login_without_user_in_exchange_probes_profile() {
    let (holder, api, _) = holder(FakeAuth::new(Outcome::Ok));

    let state = holder.complete_login("code-1", "state-1").await;

    assert!(state.is_authenticated());
    assert_eq!(api.calls(), ["exchange_code", "profile"]);
}
