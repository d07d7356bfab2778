use std::io::Cursor;

use anyhow::Context;
use bytes::Bytes;
use image::{imageops::FilterType, DynamicImage, ImageFormat};
use tracing::warn;

use crate::{error::AppError, ownership::Guarded, state::AppState};

/// Uploaded images are stored as squares of this many pixels.
pub const IMAGE_SIDE: u32 = 200;
const PRESIGN_TTL_SECS: u64 = 30 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
}

impl ImageKind {
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }

    fn content_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

/// Decodes, resizes to `IMAGE_SIDE` x `IMAGE_SIDE` and re-encodes as `kind`.
pub fn normalize_image(bytes: &[u8], kind: ImageKind) -> image::ImageResult<Vec<u8>> {
    let decoded = image::load_from_memory(bytes)?;
    let resized = decoded.resize_exact(IMAGE_SIDE, IMAGE_SIDE, FilterType::Lanczos3);

    let mut out = Cursor::new(Vec::new());
    match kind {
        // JPEG has no alpha channel
        ImageKind::Jpeg => {
            DynamicImage::ImageRgb8(resized.to_rgb8()).write_to(&mut out, ImageFormat::Jpeg)?
        }
        ImageKind::Png => resized.write_to(&mut out, ImageFormat::Png)?,
    }
    Ok(out.into_inner())
}

/// Normalizes an upload and writes it to the blob store; returns the key.
pub async fn store_image(st: &AppState, filename: &str, body: Bytes) -> Result<String, AppError> {
    let kind = ImageKind::from_filename(filename)
        .ok_or_else(|| AppError::Validation("File extension not allowed".into()))?;

    let normalized = tokio::task::spawn_blocking(move || normalize_image(&body, kind))
        .await
        .context("join image task")?
        .map_err(|e| {
            warn!(error = %e, "image decode failed");
            AppError::BadRequest("File is not a valid image".into())
        })?;

    let key = format!(
        "images/{}.{}",
        hex::encode(rand::random::<[u8; 10]>()),
        kind.extension()
    );
    st.storage
        .put_object(&key, Bytes::from(normalized), kind.content_type())
        .await
        .with_context(|| format!("put_object {}", key))?;
    Ok(key)
}

/// Resolves a guarded write that references a freshly stored image. Anything
/// other than `Applied` removes the image again.
pub async fn keep_if_applied<T>(
    st: &AppState,
    key: &str,
    outcome: anyhow::Result<Guarded<T>>,
    what: &'static str,
) -> Result<T, AppError> {
    let rejection = match outcome {
        Ok(Guarded::Applied(value)) => return Ok(value),
        Ok(Guarded::NotOwner) => AppError::UnauthorizedAction,
        Ok(Guarded::Missing) => AppError::NotFound(what),
        Err(e) => AppError::from(e),
    };
    discard(st, key).await;
    Err(rejection)
}

/// Best-effort removal of a blob nothing references any more.
pub async fn discard(st: &AppState, key: &str) {
    if let Err(e) = st.storage.delete_object(key).await {
        warn!(error = %e, %key, "failed to discard image");
    }
}

pub async fn presign(st: &AppState, key: &str) -> anyhow::Result<String> {
    st.storage
        .presign_get(key, PRESIGN_TTL_SECS)
        .await
        .with_context(|| format!("presign url for key {}", key))
}

pub async fn presign_optional(st: &AppState, key: Option<&str>) -> anyhow::Result<Option<String>> {
    match key {
        Some(key) => Ok(Some(presign(st, key).await?)),
        None => Ok(None),
    }
}
