//! # uframe-async
//!
//! Client library for the asynchronous request lifecycle of UFrame data
//! services.
//!
//! A request moves through six stages:
//!
//! - **validate** the request URL against the parameter table and the
//!   stream's advertised time bounds
//! - **submit** it and record the tracking id and result location
//! - **poll** the result location until the service marks it complete
//! - **discover** the data files of the result tree
//! - **fetch** each file into `<destination>/<stream>/`
//! - **rename** each file to embed the time coverage read from its metadata
//!
//! Every stage is an async method on [`UframeClient`]; the `*_all` batch
//! helpers operate on in-memory collections so drivers stay thin.
//!
//! ## Quick Start
//!
//! ```no_run
//! use uframe_async::{Config, UframeClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = UframeClient::new(Config::default())?;
//!
//!     // Subscribe to events
//!     let mut events = client.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let mut status = client
//!         .submit("https://ooinet.oceanobservatories.org/api/m2m/12576/sensor/inv/CE02SHSM/RID27/02-FLORTD000/recovered_host/flort_sample?beginDT=2020-01-01T00:00:00.000Z&endDT=2020-01-02T00:00:00.000Z&format=application/netcdf&limit=-1")
//!         .await;
//!
//!     while status.is_submitted() && !client.check_availability(&mut status).await? {
//!         tokio::time::sleep(std::time::Duration::from_secs(60)).await;
//!     }
//!
//!     if let Some(output_url) = status.output_url.as_deref() {
//!         let outcome = client.download_results(output_url).await;
//!         println!("{} files", outcome.files.len());
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Request lifecycle client
pub mod client;
/// Configuration types
pub mod config;
/// Time coverage readers for downloaded files
pub mod coverage;
/// Error types
pub mod error;
/// Service URL layout
pub mod layout;
/// Result-tree listing parsers
pub mod listing;
/// Local file naming
pub mod naming;
/// Request URL parsing and time-bound checks
pub mod request;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use client::UframeClient;
pub use config::{Config, FrontEnd, SubmitOptions};
pub use coverage::{CoverageReader, NcdumpReader, NetcdfCoverageReader};
pub use error::{ArtifactError, DiscoveryError, Error, ErrorKind, RequestError, Result};
pub use layout::ServiceLayout;
pub use listing::{AnchorKind, ListingParser, RegexListingParser};
pub use request::ParameterTable;
pub use types::{
    DownloadOutcome, Event, LocalFile, RequestSpec, RequestStatus, ResultFileRef, StatusRecord,
    StreamDescriptor, TimeCoverage, ValidationIssue, ValidationResult,
};

/// Run the client until the process is asked to stop, then shut it down
///
/// Waits for SIGTERM or SIGINT (Ctrl+C elsewhere) and then calls
/// [`UframeClient::shutdown`], which cancels in-flight fetches and removes
/// their partial files.
///
/// # Example
///
/// ```no_run
/// use uframe_async::{Config, UframeClient, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = UframeClient::new(Config::default())?;
///
///     let worker = client.clone();
///     tokio::spawn(async move {
///         let outcome = worker.download_results("https://host/thredds/catalog/ooi/_nouser/run/catalog.html").await;
///         println!("{:?}", outcome.error);
///     });
///
///     run_with_shutdown(client).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(client: UframeClient) -> Result<()> {
    shutdown_on(&client, wait_for_signal()).await;
    Ok(())
}

/// Shut the client down once `signal` resolves
///
/// [`run_with_shutdown`] with a caller-supplied trigger, for embedding in
/// a larger service that already owns signal handling.
pub async fn shutdown_on<F>(client: &UframeClient, signal: F)
where
    F: std::future::Future<Output = ()>,
{
    signal.await;
    tracing::info!("stopping in-flight downloads");
    client.shutdown();
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration can fail in sandboxes; fall back to ctrl_c
    let (mut sigterm, mut sigint) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(term), Ok(int)) => (term, int),
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "signal registration failed, waiting for ctrl_c");
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "cannot listen for ctrl_c");
            }
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => tracing::info!("received SIGTERM"),
        _ = sigint.recv() => tracing::info!("received SIGINT"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("received ctrl_c"),
        Err(e) => tracing::error!(error = %e, "cannot listen for ctrl_c"),
    }
}
