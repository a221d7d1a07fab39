pub mod client;
pub mod endpoints;
pub mod models;

use std::future::Future;

use crate::auth::AuthSession;
use crate::error::AppResult;
use crate::vocab::{BackendContext, BackendPriority};

pub use client::InboxClient;
pub use endpoints::MessageQuery;
pub use models::{
    AnalyticsSnapshot, GmailConnect, GmailStatus, Insight, LoginRequest, MessagePage,
    MessageStats, SyncResult,
};

/// Session endpoints used by the auth holder.
pub trait AuthApi {
    fn profile(&self) -> impl Future<Output = AppResult<AuthSession>> + Send;

    fn logout(&self) -> impl Future<Output = AppResult<()>> + Send;

    fn google_auth_url(
        &self,
        redirect_uri: &str,
    ) -> impl Future<Output = AppResult<LoginRequest>> + Send;

    /// Exchange an authorization code. Returns the user if the backend
    /// included one in the response.
    fn exchange_code(
        &self,
        code: &str,
        state: &str,
    ) -> impl Future<Output = AppResult<Option<AuthSession>>> + Send;
}

/// Message, feedback and analytics endpoints used by the dashboard.
pub trait InboxApi {
    fn list_messages(
        &self,
        query: &MessageQuery,
    ) -> impl Future<Output = AppResult<MessagePage>> + Send;

    fn fetch_from_gmail(&self) -> impl Future<Output = AppResult<SyncResult>> + Send;

    fn submit_feedback(
        &self,
        id: &str,
        priority: Option<BackendPriority>,
        context: Option<BackendContext>,
    ) -> impl Future<Output = AppResult<()>> + Send;

    fn analytics(
        &self,
        user_id: &str,
        days: u32,
        include_trends: bool,
    ) -> impl Future<Output = AppResult<AnalyticsSnapshot>> + Send;

    fn gmail_status(&self) -> impl Future<Output = AppResult<GmailStatus>> + Send;

    fn gmail_connect(&self) -> impl Future<Output = AppResult<GmailConnect>> + Send;
}
