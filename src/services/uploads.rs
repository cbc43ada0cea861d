//! Attachment storage on local disk.
//!
//! Files are written under the configured upload directory with a random
//! prefix so two uploads sharing a client file name never overwrite each other.

use std::path::PathBuf;

use actix_multipart::Field;
use futures::TryStreamExt;
use tokio::{fs, io::AsyncWriteExt};
use uuid::Uuid;

use crate::services::UploadError;

/// Reduces a client-supplied file name to a safe basename.
///
/// Path components are dropped and anything outside `[A-Za-z0-9._-]` becomes
/// `_`. Returns `None` when nothing usable remains.
pub fn sanitize_filename(raw: &str) -> Option<String> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '_') {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// Lowercased extension of `name`, if it has one.
pub fn extension_of(name: &str) -> Option<String> {
    name.rsplit_once('.')
        .map(|(stem, ext)| (stem, ext.to_ascii_lowercase()))
        .filter(|(stem, ext)| !stem.is_empty() && !ext.is_empty())
        .map(|(_, ext)| ext)
}

pub fn is_allowed(name: &str, allowed: &[String]) -> bool {
    extension_of(name).is_some_and(|ext| allowed.iter().any(|a| *a == ext))
}

/// Writes attachments into a single directory, enforcing the extension
/// allow-list and the size cap.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    max_bytes: usize,
    allowed: Vec<String>,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>, max_bytes: usize, allowed: Vec<String>) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
            allowed,
        }
    }

    /// Streams a multipart file field to disk and returns the stored name.
    ///
    /// A partially written file is removed when the field is rejected midway.
    pub async fn save_field(&self, client_name: &str, mut field: Field) -> Result<String, UploadError> {
        let clean = sanitize_filename(client_name).ok_or(UploadError::MissingFilename)?;
        if !is_allowed(&clean, &self.allowed) {
            return Err(UploadError::ExtensionNotAllowed(
                extension_of(&clean).unwrap_or_default(),
            ));
        }

        fs::create_dir_all(&self.dir).await?;
        let stored = format!("{}_{}", Uuid::new_v4().simple(), clean);
        let path = self.dir.join(&stored);
        let mut file = fs::File::create(&path).await?;

        let mut written = 0usize;
        let result: Result<(), UploadError> = async {
            while let Some(chunk) = field
                .try_next()
                .await
                .map_err(|e| UploadError::Stream(e.to_string()))?
            {
                written += chunk.len();
                if written > self.max_bytes {
                    return Err(UploadError::TooLarge(self.max_bytes));
                }
                file.write_all(&chunk).await?;
            }
            file.flush().await?;
            Ok(())
        }
        .await;

        if let Err(e) = result {
            drop(file);
            if let Err(cleanup) = fs::remove_file(&path).await {
                tracing::warn!(error = %cleanup, stored = %stored, "Failed to remove partial upload");
            }
            return Err(e);
        }

        tracing::info!(stored = %stored, bytes = written, "Attachment saved");
        Ok(stored)
    }

    /// Deletes a stored attachment. A file that is already gone is not an error.
    pub async fn remove(&self, stored: &str) -> Result<(), UploadError> {
        let name = sanitize_filename(stored).ok_or(UploadError::MissingFilename)?;
        match fs::remove_file(self.dir.join(name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed() -> Vec<String> {
        vec!["pdf".into(), "png".into()]
    }

    #[test]
    fn strips_directories_and_odd_characters() {
        assert_eq!(sanitize_filename("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(
            sanitize_filename("C:\\docs\\site plan (v2).pdf").as_deref(),
            Some("site_plan__v2_.pdf")
        );
        assert_eq!(sanitize_filename(".hidden.pdf").as_deref(), Some("hidden.pdf"));
    }

    #[test]
    fn rejects_empty_names() {
        assert_eq!(sanitize_filename(""), None);
        assert_eq!(sanitize_filename("dir/"), None);
        assert_eq!(sanitize_filename("..."), None);
    }

    #[test]
    fn checks_extension_case_insensitively() {
        assert!(is_allowed("plan.PDF", &allowed()));
        assert!(!is_allowed("plan.exe", &allowed()));
        assert!(!is_allowed("pdf", &allowed()));
        assert!(!is_allowed("plan.", &allowed()));
    }

    #[tokio::test]
    async fn remove_ignores_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path(), 1024, allowed());
        store.remove("abc_missing.pdf").await.unwrap();

        let path = dir.path().join("abc_present.pdf");
        std::fs::write(&path, b"x").unwrap();
        store.remove("abc_present.pdf").await.unwrap();
        assert!(!path.exists());
    }
}
