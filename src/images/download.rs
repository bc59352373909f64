use crate::{CrawlError, Result};
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Downloads `url` into `path`, streaming the body to disk
///
/// A non-success status is an error. The file only survives a complete
/// download: a failure, or the task being aborted mid-stream, removes
/// whatever was written.
pub async fn download_image(client: &Client, url: &str, path: &Path) -> Result<PathBuf> {
    let mut partial = PartialFile::new(path);
    let bytes = stream_to_file(client, url, path).await?;
    partial.commit();

    tracing::debug!("Downloaded {} ({} bytes) to {}", url, bytes, path.display());
    Ok(path.to_path_buf())
}

/// Removes the file at `path` on drop unless committed
///
/// Dropping happens both on an early return and when the owning future is
/// cancelled, so an aborted download never leaves a truncated image behind.
struct PartialFile {
    path: PathBuf,
    committed: bool,
}

impl PartialFile {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            committed: false,
        }
    }

    fn commit(&mut self) {
        self.committed = true;
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        // Sync removal: Drop cannot await, and the file handle is already closed
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    "Failed to remove partial download {}: {}",
                    self.path.display(),
                    e
                );
            }
        }
    }
}

async fn stream_to_file(client: &Client, url: &str, path: &Path) -> Result<u64> {
    let http_err = |source: reqwest::Error| CrawlError::Http {
        url: url.to_string(),
        source,
    };
    let write_err = |source: std::io::Error| CrawlError::Write {
        path: path.display().to_string(),
        source,
    };

    let mut response = client.get(url).send().await.map_err(http_err)?;

    let status = response.status();
    if !status.is_success() {
        return Err(CrawlError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir).await.map_err(write_err)?;
    }

    let mut file = tokio::fs::File::create(path).await.map_err(write_err)?;
    let mut written = 0u64;

    while let Some(chunk) = response.chunk().await.map_err(http_err)? {
        file.write_all(&chunk).await.map_err(write_err)?;
        written += chunk.len() as u64;
    }

    file.flush().await.map_err(write_err)?;
    Ok(written)
}
