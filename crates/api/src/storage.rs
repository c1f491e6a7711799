//! Filesystem store for uploaded images.
//!
//! Application images land under `{root}/applications/{username}/`, design
//! images under `{root}/designs/{application_id}/`. The returned references
//! are paths relative to the media root, which is what gets persisted on
//! the application row.

use std::path::PathBuf;

use atelier_core::types::DbId;

use crate::error::AppError;

/// Map an accepted image MIME type to the stored file extension.
fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => "jpg",
        "image/bmp" => "bmp",
        // MIME type is validated before anything reaches the store.
        _ => "png",
    }
}

/// Stores uploaded binary content under the configured media root.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Absolute path for a stored relative reference.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Store an application image for `username`, returning the relative
    /// reference to persist.
    pub async fn save_application_image(
        &self,
        username: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<String, AppError> {
        let relative = format!(
            "applications/{username}/{}.{}",
            unique_stem(),
            extension_for(content_type)
        );
        self.write(&relative, data).await?;
        Ok(relative)
    }

    /// Store a finished-design image for an application, returning the
    /// relative reference to persist.
    pub async fn save_design_image(
        &self,
        application_id: DbId,
        content_type: &str,
        data: &[u8],
    ) -> Result<String, AppError> {
        let relative = format!(
            "designs/{application_id}/{}.{}",
            unique_stem(),
            extension_for(content_type)
        );
        self.write(&relative, data).await?;
        Ok(relative)
    }

    /// Best-effort removal of a stored file, used when the row referencing
    /// it goes away or the reference is replaced. A missing file is fine;
    /// any other failure is logged and swallowed so cleanup never masks the
    /// outcome of the operation that triggered it.
    pub async fn discard(&self, relative: &str) {
        let path = self.root.join(relative);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove stored file");
            }
        }
    }

    async fn write(&self, relative: &str, data: &[u8]) -> Result<(), AppError> {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::InternalError(e.to_string()))?;
        }
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;
        Ok(())
    }
}

/// Collision-free filename stem: millisecond timestamp plus a random suffix.
fn unique_stem() -> String {
    format!(
        "{}_{}",
        chrono::Utc::now().timestamp_millis(),
        &uuid::Uuid::new_v4().simple().to_string()[..8]
    )
}
