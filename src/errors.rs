use crate::models::ApiResponse;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

pub const NETWORK_ERROR_MESSAGE: &str =
    "Network error. Please check your connection and try again.";

/// Failures talking to the fasting backend.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("backend returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("backend reported failure: {message}")]
    Envelope { message: String },
    #[error("not logged in: {message}")]
    Unauthorized { message: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }

    /// Text shown to the user in a toast or banner.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(_) => NETWORK_ERROR_MESSAGE.to_string(),
            ApiError::Status { message, .. }
            | ApiError::Envelope { message }
            | ApiError::Unauthorized { message } => message.clone(),
            ApiError::Decode(_) => "Unexpected response from server".to_string(),
        }
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
    pub login_url: Option<String>,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            login_url: None,
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
            login_url: None,
        }
    }

    pub fn unauthorized(message: impl Into<String>, login_url: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
            login_url: Some(login_url.into()),
        }
    }

    pub fn api(err: ApiError, login_url: &str) -> Self {
        let message = err.user_message();
        match err {
            ApiError::Unauthorized { .. } => Self::unauthorized(message, login_url),
            ApiError::Network(_) => Self {
                status: StatusCode::SERVICE_UNAVAILABLE,
                message,
                login_url: None,
            },
            ApiError::Status { status, .. } if (400..500).contains(&status) => Self {
                status: StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_REQUEST),
                message,
                login_url: None,
            },
            _ => Self {
                status: StatusCode::BAD_GATEWAY,
                message,
                login_url: None,
            },
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    #[serde(flatten)]
    envelope: ApiResponse<()>,
    #[serde(skip_serializing_if = "Option::is_none")]
    login_url: Option<String>,
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = ErrorBody {
            envelope: ApiResponse::failure(self.message),
            login_url: self.login_url,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_errors_collapse_to_generic_message() {
        let err = ApiError::Network("connection refused".into());
        assert_eq!(err.user_message(), NETWORK_ERROR_MESSAGE);
        assert_eq!(AppError::api(err, "/login").status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn unauthorized_carries_login_url() {
        let err = ApiError::Unauthorized {
            message: "You are not currently logged in.".into(),
        };
        let app = AppError::api(err, "/wp-login.php");
        assert_eq!(app.status, StatusCode::UNAUTHORIZED);
        assert_eq!(app.login_url.as_deref(), Some("/wp-login.php"));
        assert_eq!(app.message, "You are not currently logged in.");
    }

    #[test]
    fn client_errors_keep_their_status() {
        let err = ApiError::Status {
            status: 409,
            message: "A fast is already active".into(),
        };
        assert_eq!(AppError::api(err, "/login").status, StatusCode::CONFLICT);
        let err = ApiError::Envelope {
            message: "nope".into(),
        };
        assert_eq!(AppError::api(err, "/login").status, StatusCode::BAD_GATEWAY);
    }
}
