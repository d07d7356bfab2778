use axum::Json;
use serde::Serialize;

/// `{"status": "ok", "data": ...}` envelope used by every JSON endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: &'static str,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self { status: "ok", data })
    }
}

/// Bare `{"status": "ok"}` acknowledgement.
#[derive(Debug, Serialize)]
pub struct Ack {
    pub status: &'static str,
}

impl Ack {
    pub fn ok() -> Json<Self> {
        Json(Self { status: "ok" })
    }
}

/// Answer to an image upload; `filename` is a presigned URL of the stored image.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub status: &'static str,
    pub filename: String,
}

impl UploadResponse {
    pub fn ok(filename: String) -> Json<Self> {
        Json(Self {
            status: "ok",
            filename,
        })
    }
}
