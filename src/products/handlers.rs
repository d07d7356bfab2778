use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{extractors::AuthUser, handlers::format_join_date, repo::UserRepo},
    businesses::repo::BusinessRepo,
    error::{AppError, AppResult},
    images::{
        services::{discard, keep_if_applied, presign, presign_optional, store_image},
        upload::{read_upload, MAX_UPLOAD_BYTES},
    },
    products::{
        dto::{BusinessDetails, ProductDetails, ProductInput, ProductView},
        repo::ProductRepo,
        repo_types::Product,
    },
    response::{Ack, ApiResponse, UploadResponse},
    state::AppState,
};

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products", post(create_product))
        .route("/product", get(list_products))
        .route(
            "/product/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

pub fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/uploadfile/product/:id", post(upload_product_image))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

async fn view(st: &AppState, product: Product) -> anyhow::Result<ProductView> {
    let image_url = presign_optional(st, product.product_image.as_deref()).await?;
    Ok(ProductView { product, image_url })
}

#[instrument(skip_all)]
pub async fn create_product(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(input): Json<ProductInput>,
) -> AppResult<Json<ApiResponse<ProductView>>> {
    let business_id = match input.business_id {
        Some(id) => id,
        None => {
            state
                .store
                .business_of_owner(user.id)
                .await?
                .ok_or(AppError::NotFound("business"))?
                .id
        }
    };
    let fields = input.priced()?;

    let product = state
        .store
        .create_product(business_id, user.id, &fields)
        .await?
        .into_result("business")?;
    info!(product_id = %product.id, %business_id, "product created");

    Ok(ApiResponse::ok(view(&state, product).await?))
}

#[instrument(skip_all)]
pub async fn list_products(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<ProductView>>>> {
    let products = state.store.list_products().await?;
    let mut views = Vec::with_capacity(products.len());
    for product in products {
        views.push(view(&state, product).await?);
    }
    Ok(ApiResponse::ok(views))
}

#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ProductDetails>>> {
    let product = state
        .store
        .find_product(id)
        .await?
        .ok_or(AppError::NotFound("product"))?;
    let business = state
        .store
        .find_business(product.business_id)
        .await?
        .ok_or(AppError::NotFound("business"))?;
    let owner = state
        .store
        .find_user(business.owner_id)
        .await?
        .ok_or(AppError::NotFound("user"))?;

    let business_details = BusinessDetails {
        name: business.business_name,
        city: business.city,
        region: business.region,
        description: business.business_description,
        logo: presign_optional(&state, business.logo.as_deref()).await?,
        owner_id: owner.id,
        email: owner.email,
        join_date: format_join_date(owner.join_date),
    };
    Ok(ApiResponse::ok(ProductDetails {
        product_details: view(&state, product).await?,
        business_details,
    }))
}

#[instrument(skip_all)]
pub async fn update_product(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<ProductInput>,
) -> AppResult<Json<ApiResponse<ProductView>>> {
    let fields = input.priced()?;
    let product = state
        .store
        .update_product(id, user.id, &fields)
        .await?
        .into_result("product")?;
    info!(product_id = %product.id, user_id = %user.id, "product updated");

    Ok(ApiResponse::ok(view(&state, product).await?))
}

#[instrument(skip_all)]
pub async fn delete_product(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Ack>> {
    let product = state
        .store
        .delete_product(id, user.id)
        .await?
        .into_result("product")?;
    if let Some(key) = product.product_image.as_deref() {
        discard(&state, key).await;
    }
    info!(product_id = %product.id, user_id = %user.id, "product deleted");

    Ok(Ack::ok())
}

#[instrument(skip_all)]
pub async fn upload_product_image(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    mp: Multipart,
) -> AppResult<Json<UploadResponse>> {
    let upload = read_upload(mp).await?;
    let key = store_image(&state, &upload.filename, upload.body).await?;
    let outcome = state.store.set_product_image(id, user.id, &key).await;
    let (_, replaced) = keep_if_applied(&state, &key, outcome, "product").await?;
    if let Some(old) = replaced.filter(|old| *old != key) {
        discard(&state, &old).await;
    }
    info!(product_id = %id, %key, "product image updated");

    Ok(UploadResponse::ok(presign(&state, &key).await?))
}
