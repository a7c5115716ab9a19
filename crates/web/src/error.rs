use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;
use storage::error::StorageError;
use validator::ValidationErrors;

/// Web layer errors
#[derive(Debug)]
pub enum WebError {
    Storage(StorageError),
    Validation(ValidationErrors),
    BadRequest(String),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "Storage error: {}", e),
            Self::Validation(e) => write!(f, "Validation error: {}", e),
            Self::BadRequest(msg) => write!(f, "Bad request: {}", msg),
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status_code = match &self {
            Self::Storage(StorageError::InvalidScope(_)) => StatusCode::BAD_REQUEST,
            Self::Storage(e) if e.is_retryable() => StatusCode::CONFLICT,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = match &self {
            Self::Storage(StorageError::InvalidScope(msg)) => {
                json!({
                    "error": msg
                })
            }
            Self::Storage(e @ StorageError::ConcurrentRecalculation { .. }) => {
                tracing::warn!("{}", e);
                json!({
                    "error": e.to_string(),
                    "retryable": true
                })
            }
            Self::Storage(e) => {
                tracing::error!("Storage error: {:?}", e);
                json!({
                    "error": "An internal error occurred"
                })
            }
            Self::Validation(errors) => {
                let field_errors: Vec<String> = errors
                    .field_errors()
                    .iter()
                    .flat_map(|(field, errors)| {
                        errors.iter().map(move |e| {
                            format!(
                                "{}: {}",
                                field,
                                e.message
                                    .as_ref()
                                    .map(|m| m.to_string())
                                    .unwrap_or_else(|| e.code.to_string())
                            )
                        })
                    })
                    .collect();

                json!({
                    "error": "Validation failed",
                    "details": field_errors
                })
            }
            Self::BadRequest(msg) => {
                json!({
                    "error": msg
                })
            }
        };

        (status_code, Json(body)).into_response()
    }
}

impl From<StorageError> for WebError {
    fn from(error: StorageError) -> Self {
        Self::Storage(error)
    }
}

impl From<ValidationErrors> for WebError {
    fn from(error: ValidationErrors) -> Self {
        Self::Validation(error)
    }
}

pub type WebResult<T> = Result<T, WebError>;

#[cfg(test)]
mod tests {
    use storage::models::ResultKind;

    use super::*;

    #[test]
    fn test_status_mapping() {
        let invalid = WebError::from(StorageError::unknown_race(9)).into_response();
        let busy = WebError::from(StorageError::ConcurrentRecalculation {
            race_id: 1,
            kind: ResultKind::Team,
        })
        .into_response();
        let bad = WebError::BadRequest("page must be >= 1".to_string()).into_response();

        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
        assert_eq!(busy.status(), StatusCode::CONFLICT);
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
    }
}
