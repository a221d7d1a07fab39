use url::Url;

use crate::error::{AppError, AppResult};
use crate::model::MessageSource;
use crate::vocab::{self, BackendContext, BackendPriority, DisplayContext, DisplayPriority};

pub const PROFILE: &str = "/api/v1/user/profile";
pub const LOGOUT: &str = "/auth/logout";
pub const GOOGLE_INIT: &str = "/auth/google/init";
pub const GOOGLE_CALLBACK: &str = "/auth/google/callback";
pub const MESSAGES: &str = "/api/v1/messages/";
pub const FETCH_MESSAGES: &str = "/api/v1/messages/fetch";
pub const GMAIL_STATUS: &str = "/api/v1/gmail/status";
pub const GMAIL_CONNECT: &str = "/api/v1/gmail/connect";

const ANALYTICS_USER: &str = "/api/v1/analytics/user/";

/// `endpoint` appended to whatever path prefix the base URL carries.
pub fn join(base: &Url, endpoint: &str) -> Url {
    let mut url = base.clone();
    let prefix = url.path().trim_end_matches('/').to_string();
    url.set_path(&format!("{prefix}/{}", endpoint.trim_start_matches('/')));
    url
}

/// `/api/v1/messages/{id}/feedback`, with `id` escaped as one path segment.
pub fn feedback_url(base: &Url, id: &str) -> AppResult<Url> {
    with_segments(join(base, MESSAGES), &[id, "feedback"])
}

/// `/api/v1/analytics/user/{user_id}`, with `user_id` escaped as one path segment.
pub fn analytics_url(base: &Url, user_id: &str) -> AppResult<Url> {
    with_segments(join(base, ANALYTICS_USER), &[user_id])
}

fn with_segments(mut url: Url, segments: &[&str]) -> AppResult<Url> {
    url.path_segments_mut()
        .map_err(|()| AppError::Config("api base url cannot carry a path".to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Server-side filters for the paginated message fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageQuery {
    pub limit: u32,
    pub offset: u32,
    pub source: Option<MessageSource>,
    pub priority: Option<DisplayPriority>,
    pub context: Option<DisplayContext>,
    pub search: Option<String>,
    pub days: Option<u32>,
}

impl MessageQuery {
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("limit".to_string(), self.limit.to_string()),
            ("offset".to_string(), self.offset.to_string()),
        ];

        if let Some(source) = self.source {
            params.push(("source".to_string(), source.as_str().to_string()));
        }
        if let Some(priority) = self.priority {
            params.push((
                "priority".to_string(),
                vocab::priority_to_backend(priority).as_str().to_string(),
            ));
        }
        // The backend context vocabulary is narrower; the store re-applies
        // this filter locally on whatever comes back.
        if let Some(context) = self.context {
            params.push(("context".to_string(), context.as_str().to_string()));
        }
        if let Some(search) = self.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                params.push(("search".to_string(), search.to_string()));
            }
        }
        if let Some(days) = self.days {
            params.push(("days".to_string(), days.to_string()));
        }

        params
    }
}

pub fn feedback_query(
    priority: Option<BackendPriority>,
    context: Option<BackendContext>,
) -> Vec<(String, String)> {
    let mut params = Vec::new();
    if let Some(priority) = priority {
        params.push(("feedback_priority".to_string(), priority.as_str().to_string()));
    }
    if let Some(context) = context {
        params.push(("feedback_context".to_string(), context.as_str().to_string()));
    }
    params
}

pub fn analytics_query(days: u32, include_trends: bool) -> Vec<(String, String)> {
    vec![
        ("days".to_string(), days.to_string()),
        ("includeTrends".to_string(), include_trends.to_string()),
    ]
}
