//! Request validation: syntactic checks followed by the stream time-bound check

use super::UframeClient;
use crate::request::{self, time_bounds};
use crate::types::{RequestSpec, StreamDescriptor, ValidationIssue, ValidationResult};

impl UframeClient {
    /// Validate a request URL
    ///
    /// Runs the parameter parser, then fetches the instrument's stream
    /// metadata to report the stream bounds. With `time_check` set the
    /// requested interval is compared against those bounds.
    ///
    /// A URL that fails parsing is rejected without any network call.
    /// Metadata problems never flip `valid`; they are reported through
    /// `issue` and leave `valid_time_interval` unknown.
    pub async fn validate(&self, url: &str, time_check: bool) -> ValidationResult {
        self.validate_request(url, time_check).await.1
    }

    /// Validation result together with the parsed request, if it parsed
    pub(crate) async fn validate_request(
        &self,
        url: &str,
        time_check: bool,
    ) -> (Option<RequestSpec>, ValidationResult) {
        let spec = match RequestSpec::parse(url, &self.parameters, &self.layout) {
            Ok(spec) => spec,
            Err(e) => {
                tracing::debug!(url, error = %e, "request failed parameter validation");
                return (None, request::rejection(&e));
            }
        };

        let result = self.check_time_bounds(&spec, time_check).await;
        (Some(spec), result)
    }

    async fn check_time_bounds(&self, spec: &RequestSpec, time_check: bool) -> ValidationResult {
        let Some(target) = self.layout.metadata_target(&spec.url) else {
            tracing::warn!(url = %spec.url, "no metadata endpoint for request URL, skipping time check");
            return ValidationResult::accepted().with_issue(
                ValidationIssue::MetadataUnavailable,
                format!("no stream metadata endpoint for {}", spec.url),
            );
        };

        let response = match self
            .http
            .get(&target.url)
            .timeout(self.config.http.request_timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(url = %target.url, error = %e, "metadata request failed");
                return ValidationResult::accepted().with_issue(
                    ValidationIssue::MetadataFetchFailed,
                    format!("Failed to fetch metadata: {} ({})", target.url, e),
                );
            }
        };

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            tracing::warn!(url = %target.url, status = status.as_u16(), "metadata request rejected");
            return ValidationResult::accepted().with_issue(
                ValidationIssue::MetadataFetchFailed,
                format!("Failed to fetch metadata: {} ({})", target.url, status),
            );
        }

        let streams: Vec<StreamDescriptor> = match response.json().await {
            Ok(streams) => streams,
            Err(e) => {
                tracing::warn!(url = %target.url, error = %e, "undecodable metadata response");
                return ValidationResult::accepted().with_issue(
                    ValidationIssue::MalformedMetadata,
                    format!("malformed metadata from {}: {}", target.url, e),
                );
            }
        };

        let result = time_bounds::assess(spec, &streams, &target.stream, time_check);
        if let Some(reason) = &result.reason {
            tracing::info!(url = %spec.url, telemetry = %target.telemetry, reason = %reason, "time check");
        }
        result
    }
}
