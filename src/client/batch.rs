//! Batch helpers over collections of requests and results
//!
//! Each item is an independent unit of work: a failure is recorded on that
//! item (or logged) and the batch carries on.

use futures::stream::{self, StreamExt};
use std::path::Path;

use super::UframeClient;
use crate::types::{DownloadOutcome, RequestStatus};

impl UframeClient {
    /// Submit every request URL in `lines`
    ///
    /// Blank lines and lines starting with `#` are skipped. Requests are sent
    /// with at most `http.max_concurrent_requests` in flight, and statuses
    /// come back in input order.
    pub async fn submit_all<I, S>(&self, lines: I) -> Vec<RequestStatus>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let urls: Vec<String> = lines
            .into_iter()
            .map(|line| line.as_ref().trim().to_string())
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .collect();
        tracing::info!(requests = urls.len(), "submitting batch");

        let concurrency = self.config.http.max_concurrent_requests.max(1);
        stream::iter(urls)
            .map(|url| async move { self.submit(&url).await })
            .buffered(concurrency)
            .collect()
            .await
    }

    /// Poll every pending request once
    ///
    /// Completed requests and requests without a result location are skipped.
    /// Returns the number of requests that completed during this pass.
    pub async fn check_all(&self, statuses: &mut [RequestStatus]) -> usize {
        let pending: Vec<&mut RequestStatus> = statuses
            .iter_mut()
            .filter(|status| {
                if status.is_complete() {
                    tracing::debug!(url = %status.request_url, "request already completed");
                    return false;
                }
                if status.output_url.is_none() {
                    tracing::debug!(url = %status.request_url, "request has no output URL, skipping");
                    return false;
                }
                true
            })
            .collect();

        let concurrency = self.config.http.max_concurrent_requests.max(1);
        let results: Vec<bool> = stream::iter(pending)
            .map(|status| async move {
                match self.check_availability(status).await {
                    Ok(complete) => complete,
                    Err(e) => {
                        tracing::warn!(url = %status.request_url, error = %e, "availability check failed");
                        false
                    }
                }
            })
            .buffered(concurrency)
            .collect()
            .await;

        results.into_iter().filter(|complete| *complete).count()
    }

    /// Download a result location into the configured destination
    ///
    /// See [`download_results_to`](Self::download_results_to).
    pub async fn download_results(&self, result_url: &str) -> DownloadOutcome {
        let destination = self.config.download.destination.clone();
        self.download_results_to(result_url, &destination).await
    }

    /// Discover, fetch and (optionally) rename every file of a result location
    ///
    /// Files are fetched with at most `download.max_concurrent_downloads` in
    /// flight. Files that fail to download are left out of the outcome; when
    /// discovery itself fails the outcome carries the reason and no files.
    /// Downloaded files the renamer could not handle are listed in
    /// `unrenamed`.
    pub async fn download_results_to(
        &self,
        result_url: &str,
        destination: &Path,
    ) -> DownloadOutcome {
        let mut outcome = DownloadOutcome {
            output_url: result_url.to_string(),
            files: Vec::new(),
            unrenamed: Vec::new(),
            error: None,
        };

        let refs = match self.discover(result_url).await {
            Ok(refs) => refs,
            Err(e) => {
                tracing::warn!(url = result_url, error = %e, "no files to download");
                outcome.error = Some(e.to_string());
                return outcome;
            }
        };

        let concurrency = self.config.download.max_concurrent_downloads.max(1);
        let fetched: Vec<_> = stream::iter(refs.iter())
            .map(|file| self.fetch(file, destination))
            .buffered(concurrency)
            .collect()
            .await;
        let files = fetched.into_iter().filter_map(|r| r.ok()).collect::<Vec<_>>();

        if files.is_empty() && !refs.is_empty() {
            outcome.error = Some(format!("all {} downloads failed", refs.len()));
        }

        if !self.config.download.timestamp_files {
            outcome.files = files;
            return outcome;
        }

        let (renamed, kept) = self.sort_by_coverage(files).await;
        if renamed.is_empty() && !kept.is_empty() && outcome.error.is_none() {
            outcome.error = Some(format!(
                "{} downloaded files kept under their download names",
                kept.len()
            ));
        }
        outcome.files = renamed;
        outcome.unrenamed = kept;
        outcome
    }

    /// Download the results of every completed request
    ///
    /// Returns one outcome per completed request, in input order.
    pub async fn download_completed(&self, statuses: &[RequestStatus]) -> Vec<DownloadOutcome> {
        let mut outcomes = Vec::new();
        for status in statuses {
            let Some(output_url) = status.output_url.as_deref() else {
                continue;
            };
            if !status.is_complete() {
                tracing::debug!(output_url, "request not yet complete, skipping download");
                continue;
            }
            tracing::info!(output_url, "downloading completed request");
            outcomes.push(self.download_results(output_url).await);
        }
        outcomes
    }
}
