//! Asynchronous request client split into lifecycle stages.
//!
//! The `UframeClient` struct and its methods are organized by stage:
//! - [`validate`] - Parameter parsing and stream time-bound checks
//! - [`submit`] - Request submission
//! - [`poll`] - Result availability checks
//! - [`discover`] - Result tree enumeration
//! - [`fetch`] - Chunked file download
//! - [`rename`] - Coverage-based file renaming
//! - [`batch`] - Bounded-concurrency helpers over collections

mod batch;
mod discover;
mod fetch;
mod poll;
mod rename;
mod submit;
mod validate;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::coverage::{CoverageReader, NetcdfCoverageReader};
use crate::error::{Error, Result};
use crate::layout::ServiceLayout;
use crate::listing::{ListingParser, RegexListingParser};
use crate::request::ParameterTable;
use crate::types::Event;

/// Client for the asynchronous request lifecycle (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct UframeClient {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Shared HTTP client; per-call deadlines are set on each request
    pub(crate) http: reqwest::Client,
    /// Compiled parameter table
    pub(crate) parameters: Arc<ParameterTable>,
    /// Compiled service layout
    pub(crate) layout: Arc<ServiceLayout>,
    /// Listing parser (trait object for pluggable implementations)
    pub(crate) listing: Arc<dyn ListingParser>,
    /// Coverage reader (trait object for pluggable implementations)
    pub(crate) coverage: Arc<dyn CoverageReader>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Cancelled by [`shutdown`](Self::shutdown); observed by in-flight fetches
    pub(crate) cancel: CancellationToken,
}

impl UframeClient {
    /// Create a new client
    ///
    /// Compiles the parameter table and service layout, builds the HTTP
    /// client and resolves the default coverage reader.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a pattern or the parameter table is
    /// invalid, or if the HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        let parameters = ParameterTable::new(&config.parameters)?;
        let layout = ServiceLayout::new(&config.service)?;
        let listing = RegexListingParser::new(&config.service)?;
        let coverage = NetcdfCoverageReader::from_config(&config.service, &config.tools);

        let http = reqwest::Client::builder()
            .user_agent(config.http.user_agent.clone())
            .build()
            .map_err(|e| Error::Config {
                message: format!("Failed to create HTTP client: {}", e),
                key: Some("http".to_string()),
            })?;

        // Create broadcast channel with buffer size of 1000 events
        let (event_tx, _rx) = tokio::sync::broadcast::channel(1000);

        Ok(Self {
            config: Arc::new(config),
            http,
            parameters: Arc::new(parameters),
            layout: Arc::new(layout),
            listing: Arc::new(listing),
            coverage: Arc::new(coverage),
            event_tx,
            cancel: CancellationToken::new(),
        })
    }

    /// Replace the listing parser used by discovery
    pub fn with_listing_parser(mut self, parser: Arc<dyn ListingParser>) -> Self {
        self.listing = parser;
        self
    }

    /// Replace the coverage reader used by the renamer
    pub fn with_coverage_reader(mut self, reader: Arc<dyn CoverageReader>) -> Self {
        self.coverage = reader;
        self
    }

    /// Subscribe to lifecycle events
    ///
    /// Each subscriber receives every event emitted after it subscribed.
    /// Slow subscribers may observe `RecvError::Lagged` once 1000 events are
    /// buffered.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// The configuration this client was built with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The compiled parameter table
    pub fn parameters(&self) -> &ParameterTable {
        &self.parameters
    }

    /// The compiled service layout
    pub fn layout(&self) -> &ServiceLayout {
        &self.layout
    }

    /// Cancel in-flight work
    ///
    /// Fetches in progress stop at the next chunk boundary and remove their
    /// partial files. Later operations that download fail with
    /// [`Error::Cancelled`].
    pub fn shutdown(&self) {
        tracing::info!("Cancelling in-flight work");
        self.cancel.cancel();
    }

    /// Whether [`shutdown`](Self::shutdown) has been called
    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Emit an event to all subscribers
    pub(crate) fn emit_event(&self, event: Event) {
        // send() returns Err if there are no receivers, which is fine - we just drop the event
        self.event_tx.send(event).ok();
    }
}
