use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

/// Errors surfaced by handlers. Every variant maps to a short message; internal
/// failures are logged and collapsed to a generic body.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    NotPending(String),
    #[error("{message}")]
    Empty { status: StatusCode, message: String },
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
}

impl AppError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Nothing to save: the request itself was unusable.
    pub fn nothing_to_save(message: impl Into<String>) -> Self {
        Self::Empty {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    /// Nothing to export: there is no stored data to build an artifact from.
    pub fn nothing_to_export(message: impl Into<String>) -> Self {
        Self::Empty {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::NotPending(_) | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Empty { status, .. } => *status,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::Validation { field, message } => ErrorBody {
                error: message,
                field: Some(field),
            },
            Self::Internal(e) => {
                error!(error = ?e, "request failed");
                ErrorBody {
                    error: "operation failed".into(),
                    field: None,
                }
            }
            other => ErrorBody {
                error: other.to_string(),
                field: None,
            },
        };
        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let res = err.into_response();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validation_error_carries_field() {
        let (status, json) = body_json(AppError::validation("file_name", "file name is required")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "file name is required");
        assert_eq!(json["field"], "file_name");
    }

    #[tokio::test]
    async fn internal_error_hides_details() {
        let err = AppError::from(anyhow::anyhow!("connection reset by peer at 10.0.0.3"));
        let (status, json) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "operation failed");
        assert!(json.get("field").is_none());
    }

    #[tokio::test]
    async fn empty_errors_keep_their_status() {
        let (status, _) = body_json(AppError::nothing_to_export("no phone numbers stored")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = body_json(AppError::nothing_to_save("no valid phone numbers")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
