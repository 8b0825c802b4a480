//! Image persistence for certificate and avatar uploads.
//!
//! Files land under `UPLOAD_DIR/<folder>/<uuid>.<ext>` and are addressed by
//! the relative `<folder>/<name>` URL stored on the owning row. Deletion is
//! best-effort: a missing file is not an error, and per-image failures are
//! logged and swallowed so they never fail the parent operation.

use uuid::Uuid;

use crate::error::AppError;

/// Accepted image extensions (lowercase).
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

/// 5 MB upload cap per image.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Validate an upload's extension and size.
///
/// # Errors
///
/// `BadRequest` for an unsupported type, `PayloadTooLarge` past the cap.
pub fn validate_image(file_name: &str, len: usize) -> Result<String, AppError> {
    let extension = file_name.rsplit('.').next().unwrap_or("").to_lowercase();

    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(AppError::BadRequest(
            "Unsupported file type. Allowed: PNG, JPG, GIF, WEBP.".to_string(),
        ));
    }

    if len > MAX_IMAGE_BYTES {
        return Err(AppError::PayloadTooLarge(
            "File exceeds the 5 MB size limit.".to_string(),
        ));
    }

    Ok(extension)
}

/// Store an image and return its relative URL.
///
/// # Errors
///
/// Validation errors from [`validate_image`], or `Internal` if the write fails.
pub async fn save_image(
    upload_dir: &str,
    folder: &str,
    file_name: &str,
    data: &[u8],
) -> Result<String, AppError> {
    let extension = validate_image(file_name, data.len())?;

    let dir = std::path::Path::new(upload_dir).join(folder);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to create upload dir: {e}")))?;

    let stored_name = format!("{}.{extension}", Uuid::new_v4());
    let path = dir.join(&stored_name);

    tokio::fs::write(&path, data)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to write file: {e}")))?;

    Ok(format!("{folder}/{stored_name}"))
}

/// Remove a stored image by its relative URL, best-effort.
pub async fn delete_image(upload_dir: &str, url: &str) {
    let path = std::path::Path::new(upload_dir).join(url);
    if let Err(e) = tokio::fs::remove_file(&path).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!(url = %url, error = %e, "Failed to delete stored image");
    }
}

/// Remove a batch of stored images, swallowing per-image failures.
pub async fn delete_images(upload_dir: &str, urls: &[String]) {
    for url in urls {
        delete_image(upload_dir, url).await;
    }
}
