//! Result tree discovery

use super::UframeClient;
use crate::error::{DiscoveryError, Result};
use crate::listing::AnchorKind;
use crate::types::{Event, ResultFileRef};
use crate::utils::{directory_url, resolve_href};

impl UframeClient {
    /// Enumerate the data files under a result location
    ///
    /// Crawls two levels: the root listing for UUID-shaped result
    /// directories, then each directory's listing for data files. The root
    /// is always moved onto the download front-end; `http.front_end` only
    /// affects completion checks. Files come back in listing order.
    ///
    /// A directory that cannot be fetched contributes nothing; its siblings
    /// are still crawled. Hrefs that do not follow the served naming
    /// convention are skipped with a warning.
    ///
    /// # Errors
    ///
    /// - [`DiscoveryError::NoChildDirectories`] if the root lists no result
    ///   directories (including a non-200 root)
    /// - [`DiscoveryError::NoFilesFound`] if no directory lists a data file
    /// - [`Error::Network`](crate::Error::Network) if the root cannot be reached
    pub async fn discover(&self, result_url: &str) -> Result<Vec<ResultFileRef>> {
        let root = directory_url(&self.layout.to_download_front_end(result_url));

        let directories = match self.listing_page(&root).await? {
            Some(html) => self
                .listing
                .anchors(&html, AnchorKind::DirectoryMarker)
                .into_iter()
                .filter_map(|href| self.resolve_logged(&root, &href))
                .collect::<Vec<_>>(),
            None => Vec::new(),
        };

        if directories.is_empty() {
            return Err(DiscoveryError::NoChildDirectories { url: root }.into());
        }
        tracing::debug!(url = %root, directories = directories.len(), parser = self.listing.name(), "found result directories");

        let mut files = Vec::new();
        for directory in &directories {
            let html = match self.listing_page(directory).await {
                Ok(Some(html)) => html,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(url = %directory, error = %e, "skipping unreachable result directory");
                    continue;
                }
            };

            for href in self.listing.anchors(&html, AnchorKind::DataFile) {
                let Some(url) = self.resolve_logged(directory, &href) else {
                    continue;
                };
                match ResultFileRef::from_url(&url, &self.layout) {
                    Ok(file) => files.push(file),
                    Err(e) => tracing::warn!(url = %url, error = %e, "skipping data file"),
                }
            }
        }

        if files.is_empty() {
            return Err(DiscoveryError::NoFilesFound {
                url: root,
                directories: directories.len(),
            }
            .into());
        }

        tracing::info!(url = %root, files = files.len(), "discovered result files");
        self.emit_event(Event::DiscoveryFinished {
            url: root,
            files: files.len(),
        });
        Ok(files)
    }

    /// Body of a listing page; `None` for a non-200 response
    async fn listing_page(&self, url: &str) -> Result<Option<String>> {
        let response = self
            .http
            .get(url)
            .timeout(self.config.http.request_timeout)
            .send()
            .await?;

        if response.status() != reqwest::StatusCode::OK {
            tracing::warn!(url, status = response.status().as_u16(), "listing page unavailable");
            return Ok(None);
        }
        Ok(Some(response.text().await?))
    }

    fn resolve_logged(&self, page_url: &str, href: &str) -> Option<String> {
        resolve_href(page_url, href)
            .map_err(|e| tracing::warn!(url = page_url, href, error = %e, "skipping unresolvable anchor"))
            .ok()
    }
}
