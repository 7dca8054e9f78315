use std::path::{Path, PathBuf};

use bytes::Bytes;
use chrono::Utc;
use futures::{Stream, StreamExt};
use tokio::{fs, io::AsyncWriteExt};
use tracing::warn;
use uuid::Uuid;

use crate::error::ApiError;

/// Transient on-disk staging for uploads.
///
/// Files land here between multipart parsing and persistence to the store,
/// and never survive the request: [`StagedFile`] removes itself on every
/// exit path.
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
    max_bytes: u64,
}

impl StagingArea {
    /// Creates a staging area writing under `dir` with a per-file ceiling.
    pub fn new(dir: impl Into<PathBuf>, max_bytes: u64) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
        }
    }

    /// Directory staged files are written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Streams `stream` into a freshly named staged file, enforcing the
    /// size ceiling as bytes arrive. On any failure the partial file is
    /// removed before the error propagates.
    pub async fn stage<S>(
        &self,
        original_name: Option<&str>,
        mut stream: S,
    ) -> Result<StagedFile, ApiError>
    where
        S: Stream<Item = Result<Bytes, ApiError>> + Unpin,
    {
        fs::create_dir_all(&self.dir).await?;

        let path = self.dir.join(staged_file_name(original_name));
        let mut staged = StagedFile {
            path: path.clone(),
            size: 0,
            removed: false,
        };

        let mut file = fs::File::create(&path).await?;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            staged.size += chunk.len() as u64;
            if staged.size > self.max_bytes {
                return Err(ApiError::PayloadTooLarge {
                    max_bytes: self.max_bytes,
                });
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        Ok(staged)
    }
}

/// A file staged to disk for the duration of one upload.
///
/// Dropping an un-removed `StagedFile` deletes the file; callers on the
/// main path should prefer [`StagedFile::remove`] so failures are logged.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    size: u64,
    removed: bool,
}

impl StagedFile {
    /// Location of the staged bytes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes written so far.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Reads the full staged contents into memory.
    pub async fn read(&self) -> std::io::Result<Vec<u8>> {
        fs::read(&self.path).await
    }

    /// Removes the staged file, logging on failure.
    pub async fn remove(mut self) {
        self.removed = true;
        if let Err(err) = fs::remove_file(&self.path).await {
            warn!(path = %self.path.display(), error = %err, "failed to remove staged file");
        }
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.removed {
            // Covers early exits; remove() handles the main path.
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

// Collision-resistant name: millisecond timestamp plus random suffix, with
// the (sanitized) original extension, defaulting to `.jpg`.
fn staged_file_name(original_name: Option<&str>) -> String {
    format!(
        "menu-item-{}-{}.{}",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple(),
        staged_extension(original_name)
    )
}

/// Extension for a staged file: taken from the client-supplied name,
/// reduced to lowercase ASCII alphanumerics, `jpg` when absent or empty.
pub fn staged_extension(original_name: Option<&str>) -> String {
    original_name
        .map(Path::new)
        .and_then(Path::extension)
        .and_then(|ext| ext.to_str())
        .map(sanitize_extension)
        .filter(|ext| !ext.is_empty())
        .unwrap_or_else(|| "jpg".to_owned())
}

fn sanitize_extension(ext: &str) -> String {
    ext.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .take(8)
        .collect()
}
