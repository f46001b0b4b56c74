use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use query::QueryError;
use serde::Serialize;
use tracing::error;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    RateLimited(String),
    /// A model or store call failed
    Upstream(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, &str) {
        match self {
            Self::BadRequest(m) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", m),
            Self::NotFound(m) => (StatusCode::NOT_FOUND, "NOT_FOUND", m),
            Self::RateLimited(m) => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED", m),
            Self::Upstream(m) => (StatusCode::BAD_GATEWAY, "UPSTREAM_FAILURE", m),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.parts().0
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            error!(code, reason = %message, "Request failed");
        }

        let body = ErrorBody {
            error: code,
            message: message.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        let rate_limited = err.is_rate_limited();
        match err {
            QueryError::EmptyQuestion => Self::BadRequest(err.to_string()),
            _ => {
                let message = format!("{:#}", anyhow::Error::from(err));
                if rate_limited {
                    Self::RateLimited(message)
                } else {
                    Self::Upstream(message)
                }
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Upstream(format!("{:#}", err))
    }
}
