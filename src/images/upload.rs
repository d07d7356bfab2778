use axum::extract::Multipart;
use bytes::Bytes;

use crate::error::AppError;

/// Multipart field carrying the uploaded image.
pub const FILE_FIELD: &str = "file";

/// Request body cap for upload routes.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// An uploaded file as received, before normalization.
#[derive(Debug)]
pub struct Upload {
    pub filename: String,
    pub body: Bytes,
}

/// Pulls the `file` field out of a multipart body; other fields are skipped.
pub async fn read_upload(mut mp: Multipart) -> Result<Upload, AppError> {
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let body = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("failed to read upload: {e}")))?;
        return Ok(Upload { filename, body });
    }
    Err(AppError::BadRequest("file is required".into()))
}
