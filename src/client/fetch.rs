//! Chunked download of discovered result files

use std::path::Path;
use tokio::io::AsyncWriteExt;

use super::UframeClient;
use crate::error::{ArtifactError, Error, Result};
use crate::naming::{local_file_name, partial_file_name};
use crate::types::{Event, LocalFile, ResultFileRef};
use crate::utils::remove_quietly;

impl UframeClient {
    /// Download a file given only its URL
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::UnrecognizedFileName`] if the URL does not
    /// follow the served naming convention, otherwise as [`fetch`](Self::fetch).
    pub async fn fetch_url(&self, url: &str, destination: &Path) -> Result<LocalFile> {
        let file = ResultFileRef::from_url(url, &self.layout)?;
        self.fetch(&file, destination).await
    }

    /// Download a result file into `<destination>/<stream>/<uuid>-<name>`
    ///
    /// The body is streamed into a `.part` file in chunks of at most
    /// `download.chunk_size` bytes, flushed after each chunk, and renamed
    /// into place once complete. On any failure, including cancellation by
    /// [`shutdown`](Self::shutdown), the partial file is removed and no
    /// [`LocalFile`] is returned.
    ///
    /// # Errors
    ///
    /// - [`ArtifactError::DestinationMissing`] if `destination` is not a directory
    /// - [`Error::Transport`] for a non-200 response
    /// - [`Error::Network`] or [`Error::Io`] if the transfer fails
    /// - [`Error::Cancelled`] if the client was shut down
    pub async fn fetch(&self, file: &ResultFileRef, destination: &Path) -> Result<LocalFile> {
        match self.fetch_inner(file, destination).await {
            Ok(local) => Ok(local),
            Err(e) => {
                tracing::warn!(url = %file.url, error = %e, "download failed");
                self.emit_event(Event::FileFailed {
                    target: file.url.clone(),
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn fetch_inner(&self, file: &ResultFileRef, destination: &Path) -> Result<LocalFile> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let is_dir = tokio::fs::metadata(destination)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(ArtifactError::DestinationMissing {
                path: destination.to_path_buf(),
            }
            .into());
        }

        // create_dir_all tolerates concurrent fetchers creating the same directory
        let stream_dir = destination.join(&file.stream);
        tokio::fs::create_dir_all(&stream_dir).await?;

        let final_name = local_file_name(&file.uuid, file.file_name());
        let path = stream_dir.join(&final_name);
        let part = stream_dir.join(partial_file_name(&final_name));

        let request = self
            .http
            .get(&file.url)
            .timeout(self.config.http.download_timeout)
            .send();
        let response = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(Error::Cancelled),
            response = request => response?,
        };

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(Error::Transport {
                url: file.url.clone(),
                status: status.as_u16(),
                reason: status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string(),
            });
        }

        tracing::debug!(url = %file.url, path = %part.display(), "downloading");
        let bytes = match self.write_body(response, &part).await {
            Ok(bytes) => bytes,
            Err(e) => {
                remove_quietly(&part).await;
                return Err(e);
            }
        };

        if let Err(e) = tokio::fs::rename(&part, &path).await {
            remove_quietly(&part).await;
            return Err(ArtifactError::RenameFailed {
                source_path: part,
                dest_path: path,
                reason: e.to_string(),
            }
            .into());
        }

        tracing::info!(url = %file.url, path = %path.display(), bytes, "downloaded");
        self.emit_event(Event::FileDownloaded {
            url: file.url.clone(),
            path: path.clone(),
            bytes,
        });
        Ok(LocalFile {
            path,
            source: file.clone(),
            coverage: None,
        })
    }

    /// Stream the response body into `part`, returning the bytes written
    async fn write_body(&self, mut response: reqwest::Response, part: &Path) -> Result<u64> {
        let chunk_size = self.config.download.chunk_size.max(1);
        let mut out = tokio::fs::File::create(part).await?;
        let mut written = 0u64;

        loop {
            let chunk = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(Error::Cancelled),
                chunk = response.chunk() => chunk?,
            };
            let Some(chunk) = chunk else {
                break;
            };
            for piece in chunk.chunks(chunk_size) {
                out.write_all(piece).await?;
                out.flush().await?;
                written += piece.len() as u64;
            }
        }

        out.sync_all().await?;
        Ok(written)
    }
}
