//! Result availability polling

use chrono::{DateTime, Utc};

use super::UframeClient;
use crate::error::{Error, Result};
use crate::types::{Event, RequestStatus};

impl UframeClient {
    /// Check once whether a result location is available
    ///
    /// Derives the status resource from `output_url` (see
    /// [`ServiceLayout::status_url`](crate::layout::ServiceLayout::status_url))
    /// and issues a single GET. Returns the time of the check on a 200 and
    /// `None` for any other status.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] if the request could not be completed.
    pub async fn probe_availability(&self, output_url: &str) -> Result<Option<DateTime<Utc>>> {
        let status_url = self
            .layout
            .status_url(output_url, self.config.http.front_end);

        let response = self
            .http
            .get(&status_url)
            .timeout(self.config.http.request_timeout)
            .send()
            .await?;

        if response.status() != reqwest::StatusCode::OK {
            tracing::debug!(
                url = %status_url,
                status = response.status().as_u16(),
                "result not yet available"
            );
            return Ok(None);
        }
        Ok(Some(Utc::now()))
    }

    /// Poll a submitted request, recording completion the first time it succeeds
    ///
    /// Returns whether the request is complete. A status that already carries
    /// a completion time is returned as complete without a network call, so
    /// the timestamp is written exactly once. Calling this repeatedly on an
    /// unavailable result leaves the status unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingOutputUrl`] if the status has no result
    /// location and [`Error::Network`] if the check could not be completed;
    /// the status is left untouched in both cases.
    pub async fn check_availability(&self, status: &mut RequestStatus) -> Result<bool> {
        if status.completed_at.is_some() {
            return Ok(true);
        }
        let Some(output_url) = status.output_url.clone() else {
            return Err(Error::MissingOutputUrl(status.request_url.clone()));
        };

        let Some(completed_at) = self.probe_availability(&output_url).await? else {
            return Ok(false);
        };

        tracing::info!(output_url = %output_url, "result available");
        status.completed_at = Some(completed_at);
        self.emit_event(Event::RequestCompleted {
            output_url,
            completed_at,
        });
        Ok(true)
    }
}
