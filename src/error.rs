use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::store::AlreadyExists;

/// Error type returned by every handler.
#[derive(Debug, Error)]
pub enum AppError {
    /// Unknown username or wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Bad signature, malformed token, wrong kind, or unresolvable subject.
    #[error("invalid token")]
    InvalidToken,

    /// Caller is not the resolved owner of the resource.
    #[error("unauthorized action")]
    UnauthorizedAction,

    /// Rejected input that the client gets back as an error-shaped 200.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("template error: {0}")]
    Template(#[from] askama::Error),

    #[error(transparent)]
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        match e.downcast_ref::<AlreadyExists>() {
            Some(AlreadyExists(what)) => Self::Conflict(format!("{what} already exists")),
            None => Self::Internal(e),
        }
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials | Self::InvalidToken | Self::UnauthorizedAction => {
                StatusCode::UNAUTHORIZED
            }
            // recovered locally, see `into_response`
            Self::Validation(_) => StatusCode::OK,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Template(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> String {
        match self {
            Self::InvalidCredentials => "Invalid username or password".into(),
            Self::InvalidToken => "Invalid token or expired token".into(),
            Self::UnauthorizedAction => "Not authenticated to perform this action".into(),
            Self::Validation(msg) | Self::BadRequest(msg) | Self::Conflict(msg) => msg.clone(),
            Self::NotFound(what) => format!("{what} not found"),
            Self::Template(_) | Self::Internal(_) => "Internal server error".into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.detail();

        match &self {
            Self::Template(_) | Self::Internal(_) => {
                tracing::error!(error = %self, "request failed");
            }
            Self::Validation(_) => {
                return (status, Json(json!({ "status": "error", "detail": detail })))
                    .into_response();
            }
            _ => {}
        }

        if status == StatusCode::UNAUTHORIZED {
            return (
                status,
                [(header::WWW_AUTHENTICATE, "Bearer")],
                Json(json!({ "detail": detail })),
            )
                .into_response();
        }

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
