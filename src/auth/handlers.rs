use axum::{
    extract::State,
    routing::{get, post},
    Form, Json, Router,
};
use time::{macros::format_description, OffsetDateTime};
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{MeResponse, TokenRequest, TokenResponse},
        extractors::AuthUser,
        services::authenticate,
    },
    businesses::repo::BusinessRepo,
    error::{AppError, AppResult},
    images::services::presign_optional,
    response::ApiResponse,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/token", post(issue_token))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/user/me", get(get_me).post(get_me))
}

/// Formats a join date like `Jan 05 2024`.
pub(crate) fn format_join_date(at: OffsetDateTime) -> String {
    at.format(format_description!("[month repr:short] [day] [year]"))
        .unwrap_or_else(|_| at.date().to_string())
}

#[instrument(skip_all)]
pub async fn issue_token(
    State(state): State<AppState>,
    Form(form): Form<TokenRequest>,
) -> AppResult<Json<TokenResponse>> {
    let user = authenticate(state.store.as_ref(), &form.username, &form.password).await?;
    let access_token = state.keys.sign_access(user.id, &user.username)?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
    }))
}

#[instrument(skip_all)]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<ApiResponse<MeResponse>>> {
    let business = state
        .store
        .business_of_owner(user.id)
        .await?
        .ok_or(AppError::NotFound("business"))?;
    let logo = presign_optional(&state, business.logo.as_deref()).await?;

    Ok(ApiResponse::ok(MeResponse {
        id: user.id,
        joined_date: format_join_date(user.join_date),
        username: user.username,
        email: user.email,
        verified: user.is_verified,
        logo,
    }))
}
