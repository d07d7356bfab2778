use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
pub mod pricing;
pub mod repo;
pub mod repo_types;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::product_routes())
        .merge(handlers::upload_routes())
}
