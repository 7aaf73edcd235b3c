use axum::http::StatusCode;
use tracing::error;

/// Failure of the underlying record store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupt record under '{key}': {reason}")]
    Corrupt { key: String, reason: String },
}

/// Errors surfaced by the progress engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Malformed input; nothing was written.
    #[error("invalid input: {0}")]
    Validation(String),

    /// A well-formed request applied at the wrong time.
    #[error("not allowed: {0}")]
    Policy(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn policy(message: impl Into<String>) -> Self {
        Self::Policy(message.into())
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation(message) => Self::bad_request(message),
            EngineError::Policy(message) => Self {
                status: StatusCode::CONFLICT,
                message,
            },
            EngineError::NotFound(message) => Self {
                status: StatusCode::NOT_FOUND,
                message,
            },
            EngineError::Store(err) => {
                error!("store failure: {err}");
                Self::internal(err)
            }
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
