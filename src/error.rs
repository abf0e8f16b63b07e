use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

/// Everything a handler can fail with, mapped to a status code and a
/// plain-text reason in one place.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid email address format")]
    InvalidEmail,
    #[error("Email already used by other user")]
    EmailAlreadyUsed,
    #[error("User not found")]
    UserNotFound,
    #[error("File storage not prepared")]
    FileStorageNotPrepared,
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidEmail => StatusCode::CONFLICT,
            ApiError::EmailAlreadyUsed => StatusCode::CONFLICT,
            ApiError::UserNotFound => StatusCode::NOT_FOUND,
            ApiError::FileStorageNotPrepared => StatusCode::CONFLICT,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            // Backend details stay in the log, not in the response.
            ApiError::Internal(e) => {
                error!(error = %e, "internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(ApiError::InvalidEmail.status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::EmailAlreadyUsed.status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::UserNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::FileStorageNotPrepared.status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::BadRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn reason_strings() {
        assert_eq!(
            ApiError::InvalidEmail.to_string(),
            "Invalid email address format"
        );
        assert_eq!(
            ApiError::EmailAlreadyUsed.to_string(),
            "Email already used by other user"
        );
        assert_eq!(ApiError::UserNotFound.to_string(), "User not found");
        assert_eq!(
            ApiError::FileStorageNotPrepared.to_string(),
            "File storage not prepared"
        );
    }

    #[test]
    fn internal_response_hides_detail() {
        let resp = ApiError::Internal(anyhow::anyhow!("connection refused")).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
