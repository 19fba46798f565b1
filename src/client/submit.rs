//! Request submission

use chrono::Utc;
use serde::Deserialize;

use super::UframeClient;
use crate::config::SubmitOptions;
use crate::error::{Error, ErrorKind};
use crate::types::{Event, RequestStatus};

/// Body of an accepted submission
#[derive(Deserialize)]
struct Accepted {
    #[serde(rename = "requestUUID")]
    request_uuid: Option<String>,
    #[serde(rename = "outputURL")]
    output_url: Option<String>,
}

/// Body of a 400 response
#[derive(Deserialize)]
struct Rejected {
    message: String,
}

impl UframeClient {
    /// Submit a request with the configured [`SubmitOptions`]
    ///
    /// See [`submit_with`](Self::submit_with).
    pub async fn submit(&self, url: &str) -> RequestStatus {
        self.submit_with(url, self.config.submit).await
    }

    /// Validate and submit a request
    ///
    /// Never fails: every outcome is described by the returned status.
    /// A request that fails validation is not sent. A rejected or malformed
    /// submission records the HTTP status and a reason; an accepted one
    /// carries the tracking id and result location.
    pub async fn submit_with(&self, url: &str, options: SubmitOptions) -> RequestStatus {
        let mut status = RequestStatus::new(url);
        let (spec, validation) = self.validate_request(url, options.time_check).await;
        status.request = spec;
        status.validation = Some(validation.clone());

        if !validation.valid {
            let kind = validation
                .issue
                .map(|issue| issue.kind())
                .unwrap_or(ErrorKind::MalformedInput);
            let reason = validation
                .reason
                .unwrap_or_else(|| "request failed validation".to_string());
            return self.reject(status, kind, reason);
        }

        if options.reject_out_of_bounds && validation.valid_time_interval == Some(false) {
            let reason = validation
                .reason
                .unwrap_or_else(|| "time interval outside stream bounds".to_string());
            return self.reject(status, ErrorKind::ValidationFailure, reason);
        }

        tracing::debug!(url, "submitting asynchronous request");
        status.requested_at = Some(Utc::now());

        let response = match self
            .http
            .get(url)
            .timeout(self.config.http.request_timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let reason = if e.is_timeout() {
                    format!(
                        "Timeout submitting request (exceeded {:?})",
                        self.config.http.request_timeout
                    )
                } else if e.is_connect() {
                    format!("Connection failed: {}", e)
                } else {
                    format!("Failed to submit request: {}", e)
                };
                return self.reject(status, ErrorKind::TransportFailure, reason);
            }
        };

        let code = response.status();
        status.status_code = Some(code.as_u16());
        let phrase = code
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", code.as_u16()));

        if code == reqwest::StatusCode::BAD_REQUEST {
            let reason = match response.json::<Rejected>().await {
                Ok(body) => body.message,
                Err(_) => phrase,
            };
            return self.reject(status, ErrorKind::TransportFailure, reason);
        }
        if code != reqwest::StatusCode::OK {
            return self.reject(status, ErrorKind::TransportFailure, phrase);
        }

        let body = match response.json::<Accepted>().await {
            Ok(body) => body,
            Err(e) => {
                let err = Error::Protocol {
                    url: url.to_string(),
                    reason: format!("undecodable submission response: {}", e),
                };
                return self.reject(status, err.kind(), err.to_string());
            }
        };
        let (Some(request_uuid), Some(output_url)) = (body.request_uuid, body.output_url) else {
            let err = Error::Protocol {
                url: url.to_string(),
                reason: "response is missing requestUUID or outputURL".to_string(),
            };
            return self.reject(status, err.kind(), err.to_string());
        };

        tracing::info!(url, request_uuid = %request_uuid, output_url = %output_url, "request submitted");
        self.emit_event(Event::RequestSubmitted {
            url: url.to_string(),
            request_uuid: request_uuid.clone(),
            output_url: output_url.clone(),
        });
        status.request_uuid = Some(request_uuid);
        status.output_url = Some(output_url);
        status
    }

    fn reject(&self, mut status: RequestStatus, kind: ErrorKind, reason: String) -> RequestStatus {
        tracing::warn!(url = %status.request_url, kind = %kind, reason = %reason, "request rejected");
        self.emit_event(Event::RequestRejected {
            url: status.request_url.clone(),
            kind,
            reason: reason.clone(),
        });
        status.fail(kind, reason);
        status
    }
}
