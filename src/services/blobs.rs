//! Blob storage for uploaded images.
//!
//! Blobs are written under the configured storage directory and recorded in
//! the `blobs` table. Paths are namespaced by purpose, owner and upload time:
//! `{prefix}/{user id}/{millis}_{file name}`.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use crate::db::{self, BlobRecord, DbPool};
use crate::{Error, Result};

const SVG_CONTENT_TYPE: &str = "image/svg+xml";

/// An uploaded file as received from a form.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Content type, guessed from the file name when the client sent none.
    pub fn effective_content_type(&self) -> String {
        let declared = self.content_type.trim();
        if declared.is_empty() || declared == "application/octet-stream" {
            mime_guess::from_path(&self.filename)
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        } else {
            declared.to_string()
        }
    }

    /// Only non-empty raster images within the size limit are accepted.
    ///
    /// SVG is refused: blobs are served from the application's origin and an
    /// SVG can carry script.
    pub fn validate(&self, max_size: usize) -> Result<()> {
        if self.bytes.len() > max_size {
            return Err(Error::FileTooLarge { max_size });
        }
        if self.bytes.is_empty() {
            return Err(Error::InvalidInput("Uploaded file is empty".to_string()));
        }
        let content_type = self.effective_content_type();
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if !essence.starts_with("image/") || essence == SVG_CONTENT_TYPE {
            return Err(Error::InvalidFileType(content_type));
        }
        Ok(())
    }
}

/// Storage path of a blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobPath(String);

impl BlobPath {
    /// `{prefix}/{owner_id}/{millis}_{file name}`
    pub fn for_upload(prefix: &str, owner_id: &str, filename: &str) -> Self {
        Self(format!(
            "{}/{}/{}_{}",
            prefix,
            owner_id,
            Utc::now().timestamp_millis(),
            sanitize_filename(filename)
        ))
    }

    /// A fixed path per owner; re-uploads overwrite.
    pub fn fixed(prefix: &str, owner_id: &str) -> Self {
        Self(format!("{}/{}", prefix, owner_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Handle returned by a completed upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobHandle {
    pub path: String,
}

/// Blob storage seam.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    fn max_upload_size(&self) -> usize;

    async fn upload(&self, owner_id: &str, path: &BlobPath, upload: &Upload) -> Result<BlobHandle>;

    /// Public, retrievable URL for a stored blob.
    async fn resolve_url(&self, handle: &BlobHandle) -> Result<String>;

    /// Metadata and bytes of a stored blob.
    async fn fetch(&self, path: &str) -> Result<(BlobRecord, Vec<u8>)>;
}

/// Blob storage on the local filesystem.
#[derive(Clone)]
pub struct LocalBlobStorage {
    db: DbPool,
    root: PathBuf,
    public_url: String,
    max_upload_size: usize,
}

impl LocalBlobStorage {
    pub fn new(db: DbPool, root: PathBuf, public_url: &str, max_upload_size: usize) -> Self {
        Self {
            db,
            root,
            public_url: public_url.trim_end_matches('/').to_string(),
            max_upload_size,
        }
    }

    /// Location on disk. Rejects anything that could escape the root.
    fn file_path(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let safe = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(Error::InvalidInput(format!("Invalid blob path: {}", path)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStorage for LocalBlobStorage {
    fn max_upload_size(&self) -> usize {
        self.max_upload_size
    }

    async fn upload(&self, owner_id: &str, path: &BlobPath, upload: &Upload) -> Result<BlobHandle> {
        upload.validate(self.max_upload_size)?;

        let file_path = self.file_path(path.as_str())?;
        if let Some(parent) = file_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&file_path, &upload.bytes).await?;

        db::insert_blob(
            &self.db,
            db::CreateBlob {
                path: path.as_str().to_string(),
                owner_id: owner_id.to_string(),
                content_type: upload.effective_content_type(),
                size_bytes: upload.bytes.len() as i64,
            },
        )
        .await?;

        info!(owner_id, path = path.as_str(), size = upload.bytes.len(), "Blob stored");

        Ok(BlobHandle {
            path: path.as_str().to_string(),
        })
    }

    async fn resolve_url(&self, handle: &BlobHandle) -> Result<String> {
        db::get_blob(&self.db, &handle.path)
            .await?
            .ok_or_else(|| Error::Storage(format!("Blob missing after upload: {}", handle.path)))?;
        Ok(format!("{}/{}", self.public_url, handle.path))
    }

    async fn fetch(&self, path: &str) -> Result<(BlobRecord, Vec<u8>)> {
        let file_path = self.file_path(path)?;
        let record = db::get_blob(&self.db, path)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Blob not found: {}", path)))?;
        let bytes = tokio::fs::read(&file_path).await?;
        Ok((record, bytes))
    }
}

/// Keep `[A-Za-z0-9._-]`, replace everything else, cap the length.
fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .take(100)
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}
