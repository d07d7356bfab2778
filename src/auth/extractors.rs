use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use crate::{
    auth::{claims::TokenKind, repo::UserRepo, repo_types::User},
    error::AppError,
    state::AppState,
};

/// Validates the bearer session token and loads the user it names.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Expect "Bearer <token>"
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer ").or_else(|| h.strip_prefix("bearer ")))
            .ok_or(AppError::InvalidToken)?;

        let claims = state
            .keys
            .validate_kind(token, TokenKind::Access)
            .map_err(|e| {
                warn!(error = %e, "invalid or expired token");
                AppError::InvalidToken
            })?;

        let user = state
            .store
            .find_user(claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;
        Ok(AuthUser(user))
    }
}
