//! Error handling for the shelf HTTP layer.
//!
//! Every failure is rendered through the shared error view: a list of
//! `{message}` entries plus a trace id that also appears in the logs.

use askama::Template;
use axum::{
    extract::rejection::{FormRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use shelf_db::StoreError;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

const RATING_RANGE_MESSAGE: &str = "Rating must be a whole number between 1 and 5.";

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation failed: {}", .messages.join("; "))]
    Validation { messages: Vec<String> },

    #[error("not found: {message}")]
    NotFound { message: String },

    /// The request itself was unusable: a malformed path, query or body,
    /// or it ran out of time.
    #[error("request rejected ({status}): {message}")]
    Rejected { status: StatusCode, message: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Create a validation error carrying every collected message
    pub fn validation(messages: Vec<String>) -> Self {
        Self::Validation { messages }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a rejection rendered with `status`
    pub fn rejected(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        Self::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::RatingOutOfRange(_) => {
                AppError::validation(vec![RATING_RANGE_MESSAGE.to_string()])
            }
            other => AppError::Internal(other.into()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ErrorEntry {
    pub message: String,
}

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorPage {
    status: u16,
    reason: String,
    errors: Vec<ErrorEntry>,
    trace_id: String,
    timestamp: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4();
        let timestamp = OffsetDateTime::now_utc().to_string();

        let (status, messages) = match self {
            AppError::Validation { messages } => {
                tracing::warn!(
                    error_id = %error_id,
                    count = messages.len(),
                    "request rejected by validation"
                );
                (StatusCode::BAD_REQUEST, messages)
            }
            AppError::NotFound { message } => {
                tracing::debug!(error_id = %error_id, %message, "not found");
                (StatusCode::NOT_FOUND, vec![message])
            }
            AppError::Rejected { status, message } => {
                tracing::warn!(error_id = %error_id, status = status.as_u16(), %message, "request rejected");
                (status, vec![message])
            }
            AppError::Internal(e) => {
                tracing::error!(
                    error_id = %error_id,
                    error = %format!("{e:#}"),
                    "internal error"
                );
                // Internal details stay in the logs for release builds.
                let message = if cfg!(debug_assertions) {
                    format!("{e:#}")
                } else {
                    "An internal server error occurred".to_string()
                };
                (StatusCode::INTERNAL_SERVER_ERROR, vec![message])
            }
        };

        let page = ErrorPage {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Error").to_string(),
            errors: messages
                .into_iter()
                .map(|message| ErrorEntry { message })
                .collect(),
            trace_id: error_id.to_string(),
            timestamp,
        };

        match page.render() {
            Ok(html) => (status, Html(html)).into_response(),
            Err(e) => {
                tracing::error!(error_id = %error_id, error = %e, "error view failed to render");
                (status, format!("{} (trace {})", status, error_id)).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn validation_lists_every_message_with_400() {
        let error = AppError::validation(vec![
            "Title is required.".to_string(),
            "Author is required.".to_string(),
        ]);
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_text(response).await;
        assert!(body.contains("Title is required."));
        assert!(body.contains("Author is required."));
    }

    #[tokio::test]
    async fn error_view_escapes_messages() {
        let response = AppError::validation(vec!["<script>".to_string()]).into_response();
        let body = body_text(response).await;
        assert!(!body.contains("<script>"));
        // askama emits numeric entities; accept the named form as well.
        assert!(body.contains("&#60;script&#62;") || body.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_error_response_mapping() {
        let response = AppError::not_found("Page not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn rejections_keep_their_status_and_render_the_view() {
        let response = AppError::rejected(StatusCode::UNSUPPORTED_MEDIA_TYPE, "Form requests only")
            .into_response();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let content_type = response.headers()[axum::http::header::CONTENT_TYPE].clone();
        assert!(content_type.to_str().unwrap().starts_with("text/html"));
        assert!(body_text(response).await.contains("Form requests only"));
    }

    #[test]
    fn test_internal_error_mapping() {
        let internal_error = anyhow::anyhow!("Database connection failed");
        let response = AppError::Internal(internal_error).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn rating_constraint_becomes_validation_error() {
        let error = AppError::from(StoreError::RatingOutOfRange(9));
        assert!(matches!(error, AppError::Validation { .. }));

        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains(RATING_RANGE_MESSAGE));
    }

    #[test]
    fn other_store_errors_are_internal() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let error = AppError::from(StoreError::Io(io));
        assert!(matches!(error, AppError::Internal(_)));
    }
}
