use std::io;

use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("auth error: {0}")]
    Auth(String),
    #[error("session expired: {0}. run `inbox auth login`")]
    Unauthorized(String),
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl AppError {
    /// Text shown in a view's error slot.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Api { message, .. } => message.clone(),
            AppError::Transport(_) => {
                "unable to reach the server, check your connection and try again".to_string()
            }
            AppError::Unauthorized(_) => "your session has expired, please log in again".to_string(),
            other => other.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AppError::Unauthorized(_))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Api { status, .. } => Some(*status),
            AppError::Unauthorized(_) => Some(401),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_surface_backend_message_verbatim() {
        let error = AppError::Api {
            status: 422,
            message: "feedback_priority must be one of high, medium, low".to_string(),
        };
        assert_eq!(
            error.user_message(),
            "feedback_priority must be one of high, medium, low"
        );
        assert_eq!(error.status(), Some(422));
    }

    #[test]
    fn unauthorized_reports_401() {
        let error = AppError::Unauthorized("token rejected".to_string());
        assert!(error.is_unauthorized());
        assert_eq!(error.status(), Some(401));
    }
}
