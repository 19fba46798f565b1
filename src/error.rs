//! Error types for uframe-async
//!
//! Errors are grouped the way the request lifecycle fails:
//! - [`RequestError`] - the request URL is malformed or semantically invalid
//! - [`DiscoveryError`] - the result tree could not be enumerated
//! - [`ArtifactError`] - a local file could not be produced or finalized
//!
//! Every error maps onto one [`ErrorKind`] so batch drivers can report
//! failures without matching on individual variants.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for uframe-async operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for uframe-async
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "service.uuid_pattern")
        key: Option<String>,
    },

    /// Request URL failed parsing or validation
    #[error("invalid request: {0}")]
    Request(#[from] RequestError),

    /// Remote service answered with an unexpected status
    #[error("request to {url} failed ({status}): {reason}")]
    Transport {
        /// URL that was requested
        url: String,
        /// HTTP status code returned by the service
        status: u16,
        /// Reason phrase or server-provided message
        reason: String,
    },

    /// Network error (connect, timeout, body read)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Well-formed response missing required fields
    #[error("malformed server response from {url}: {reason}")]
    Protocol {
        /// URL that produced the response
        url: String,
        /// What was missing or undecodable
        reason: String,
    },

    /// Result tree discovery error
    #[error("discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    /// Local artifact error (download destination, naming, corrupt files)
    #[error("artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A request status has no result location to poll or download
    #[error("request has no output URL: {0}")]
    MissingOutputUrl(String),

    /// External tool execution failed (ncdump)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// Operation not supported (missing binary, unsupported file format)
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Work was cancelled by shutdown
    #[error("operation cancelled")]
    Cancelled,
}

/// Request URL parsing and validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// URL does not contain exactly one `?` delimiter
    #[error("URL must contain exactly one '?': {url}")]
    MalformedUrl {
        /// The offending URL
        url: String,
    },

    /// Query token without exactly one `=`
    #[error("malformed parameter: {parameter}")]
    MalformedParameter {
        /// The raw `name=value` token
        parameter: String,
    },

    /// Parameter name not in the parameter table
    #[error("unknown parameter: {name}")]
    UnknownParameter {
        /// The unrecognized parameter name
        name: String,
    },

    /// Parameter value does not match its format rule
    #[error("invalid value for {name}: {value}")]
    InvalidParameterValue {
        /// Parameter name
        name: String,
        /// Rejected value
        value: String,
    },

    /// Row limit is non-negative, which asks for a synchronous request
    #[error("limit={limit} requests a synchronous response; asynchronous requests need a negative limit")]
    SynchronousRequestRejected {
        /// The requested row limit
        limit: i64,
    },

    /// A required parameter is absent
    #[error("missing required parameter: {name}")]
    MissingRequiredParameter {
        /// Name of the first missing parameter
        name: String,
    },

    /// Begin time is after end time
    #[error("begin time {begin} is after end time {end}")]
    InvalidTimeOrder {
        /// Requested begin time
        begin: String,
        /// Requested end time
        end: String,
    },

    /// URL path does not contain a site/node/sensor instrument token
    #[error("no instrument found in URL: {url}")]
    MissingInstrument {
        /// The offending URL
        url: String,
    },
}

/// Result tree discovery errors
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The root listing contained no directory markers
    #[error("no child directories found under {url}")]
    NoChildDirectories {
        /// Root URL that was crawled
        url: String,
    },

    /// Child directories were crawled but none listed data files
    #[error("no data files found under {url} ({directories} directories crawled)")]
    NoFilesFound {
        /// Root URL that was crawled
        url: String,
        /// Number of child directories crawled
        directories: usize,
    },
}

/// Local artifact errors (fetch destination, naming, finalization)
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// Destination root does not exist
    #[error("destination directory does not exist: {path}")]
    DestinationMissing {
        /// The missing destination root
        path: PathBuf,
    },

    /// File name or URL does not follow the service naming convention
    #[error("unrecognized file name {name}: {reason}")]
    UnrecognizedFileName {
        /// File name or URL that failed to match
        name: String,
        /// Which token could not be extracted
        reason: String,
    },

    /// Downloaded file is not readable as NetCDF metadata
    #[error("corrupt file {path}: {reason}")]
    Corrupt {
        /// Path of the corrupt file
        path: PathBuf,
        /// Why the file was rejected
        reason: String,
    },

    /// Rename of a finalized file failed
    #[error("failed to rename {source_path} to {dest_path}: {reason}")]
    RenameFailed {
        /// The original path
        source_path: PathBuf,
        /// The intended destination path
        dest_path: PathBuf,
        /// The reason the rename failed
        reason: String,
    },
}

/// Failure taxonomy shared by every error and recorded on request statuses
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// URL or parameter syntax
    MalformedInput,
    /// Semantic rejection (time order, stream bounds, synchronous mode)
    ValidationFailure,
    /// Non-2xx responses and network errors
    TransportFailure,
    /// Well-formed response missing required fields
    ProtocolViolation,
    /// Filesystem I/O or corrupt downloaded artifacts
    ResourceFailure,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::MalformedInput => "malformed_input",
            ErrorKind::ValidationFailure => "validation_failure",
            ErrorKind::TransportFailure => "transport_failure",
            ErrorKind::ProtocolViolation => "protocol_violation",
            ErrorKind::ResourceFailure => "resource_failure",
        };
        f.write_str(s)
    }
}

impl RequestError {
    /// Taxonomy bucket of this request error
    pub fn kind(&self) -> ErrorKind {
        match self {
            RequestError::MalformedUrl { .. }
            | RequestError::MalformedParameter { .. }
            | RequestError::UnknownParameter { .. }
            | RequestError::InvalidParameterValue { .. }
            | RequestError::MissingRequiredParameter { .. }
            | RequestError::MissingInstrument { .. } => ErrorKind::MalformedInput,
            RequestError::SynchronousRequestRejected { .. }
            | RequestError::InvalidTimeOrder { .. } => ErrorKind::ValidationFailure,
        }
    }
}

impl Error {
    /// Taxonomy bucket of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Request(e) => e.kind(),
            Error::Transport { .. } | Error::Network(_) => ErrorKind::TransportFailure,
            Error::Protocol { .. } | Error::Serialization(_) => ErrorKind::ProtocolViolation,
            // an empty result tree is what the server reported, not a local fault
            Error::Discovery(_) => ErrorKind::TransportFailure,
            Error::Config { .. } | Error::MissingOutputUrl(_) => ErrorKind::MalformedInput,
            Error::Artifact(_)
            | Error::Io(_)
            | Error::ExternalTool(_)
            | Error::NotSupported(_)
            | Error::Cancelled => ErrorKind::ResourceFailure,
        }
    }

    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Request(e) => match e {
                RequestError::MalformedUrl { .. } => "malformed_url",
                RequestError::MalformedParameter { .. } => "malformed_parameter",
                RequestError::UnknownParameter { .. } => "unknown_parameter",
                RequestError::InvalidParameterValue { .. } => "invalid_parameter_value",
                RequestError::SynchronousRequestRejected { .. } => "synchronous_request_rejected",
                RequestError::MissingRequiredParameter { .. } => "missing_required_parameter",
                RequestError::InvalidTimeOrder { .. } => "invalid_time_order",
                RequestError::MissingInstrument { .. } => "missing_instrument",
            },
            Error::Transport { .. } => "transport_error",
            Error::Network(_) => "network_error",
            Error::Protocol { .. } => "malformed_server_response",
            Error::Discovery(e) => match e {
                DiscoveryError::NoChildDirectories { .. } => "no_child_directories",
                DiscoveryError::NoFilesFound { .. } => "no_files_found",
            },
            Error::Artifact(e) => match e {
                ArtifactError::DestinationMissing { .. } => "destination_missing",
                ArtifactError::UnrecognizedFileName { .. } => "unrecognized_file_name",
                ArtifactError::Corrupt { .. } => "corrupt_artifact",
                ArtifactError::RenameFailed { .. } => "rename_failed",
            },
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::MissingOutputUrl(_) => "missing_output_url",
            Error::ExternalTool(_) => "external_tool_error",
            Error::NotSupported(_) => "not_supported",
            Error::Cancelled => "cancelled",
        }
    }
}
