use askama::Template;
use axum::{
    extract::{Query, State},
    response::Html,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::extractors::AuthUser,
    error::AppResult,
    response::ApiResponse,
    state::AppState,
    verification::{
        dto::{RegisterRequest, RegistrationResponse, VerificationQuery},
        services::{complete_verification, register_account, resend_verification, VerifiedPage},
    },
};

pub fn verification_routes() -> Router<AppState> {
    Router::new()
        .route("/registration", post(register))
        .route("/verification", get(verify_email))
        .route("/verification/resend", post(resend))
}

#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<Json<ApiResponse<RegistrationResponse>>> {
    let reg = register_account(&state, payload).await?;
    let message = if reg.email_sent {
        format!(
            "Hello {}, thanks for choosing our services. Please check your email inbox and click on the link to confirm your registration.",
            reg.user.username
        )
    } else {
        format!(
            "Hello {}, your account was created but the verification email could not be sent. Sign in and request a new one.",
            reg.user.username
        )
    };
    Ok(ApiResponse::ok(RegistrationResponse {
        message,
        verification_email_sent: reg.email_sent,
    }))
}

#[instrument(skip_all)]
pub async fn verify_email(
    State(state): State<AppState>,
    Query(query): Query<VerificationQuery>,
) -> AppResult<Html<String>> {
    let user = complete_verification(&state, &query.token).await?;
    let page = VerifiedPage {
        username: &user.username,
    }
    .render()?;
    Ok(Html(page))
}

#[instrument(skip_all)]
pub async fn resend(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<ApiResponse<&'static str>>> {
    let sent = resend_verification(&state, &user).await?;
    let message = if sent {
        "Verification email sent"
    } else {
        "Account already verified"
    };
    Ok(ApiResponse::ok(message))
}
