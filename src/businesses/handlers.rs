use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    routing::{post, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    businesses::{dto::BusinessView, repo::BusinessRepo, repo_types::BusinessPatch},
    error::{AppError, AppResult},
    images::{
        services::{discard, keep_if_applied, presign, presign_optional, store_image},
        upload::{read_upload, MAX_UPLOAD_BYTES},
    },
    response::{ApiResponse, UploadResponse},
    state::AppState,
};

pub fn business_routes() -> Router<AppState> {
    Router::new().route("/business/:id", put(update_business))
}

pub fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/uploadfile/profile", post(upload_logo))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

#[instrument(skip_all)]
pub async fn update_business(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<BusinessPatch>,
) -> AppResult<Json<ApiResponse<BusinessView>>> {
    let patch = patch.normalized()?;
    let business = state
        .store
        .update_business(id, user.id, &patch)
        .await?
        .into_result("business")?;
    info!(business_id = %business.id, user_id = %user.id, "business updated");

    let logo = presign_optional(&state, business.logo.as_deref()).await?;
    Ok(ApiResponse::ok(BusinessView::new(business, logo)))
}

#[instrument(skip_all)]
pub async fn upload_logo(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    mp: Multipart,
) -> AppResult<Json<UploadResponse>> {
    let upload = read_upload(mp).await?;
    let business = state
        .store
        .business_of_owner(user.id)
        .await?
        .ok_or(AppError::NotFound("business"))?;

    let key = store_image(&state, &upload.filename, upload.body).await?;
    let outcome = state.store.set_logo(business.id, user.id, &key).await;
    let (_, replaced) = keep_if_applied(&state, &key, outcome, "business").await?;
    if let Some(old) = replaced.filter(|old| *old != key) {
        discard(&state, &old).await;
    }
    info!(business_id = %business.id, %key, "logo updated");

    Ok(UploadResponse::ok(presign(&state, &key).await?))
}
