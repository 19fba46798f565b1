//! Core types for uframe-async

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ArtifactError, ErrorKind, Result};
use crate::layout::ServiceLayout;
use crate::request::ParameterTable;

/// A parsed asynchronous data request
///
/// Built only by [`RequestSpec::parse`], which
/// guarantees every required parameter was present and well formed, the row
/// limit is negative, and `begin <= end`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSpec {
    /// The request URL exactly as given
    pub url: String,
    /// Instrument identifier (`site-node-sensor`)
    pub instrument: String,
    /// Requested begin time
    pub begin: DateTime<Utc>,
    /// Requested end time
    pub end: DateTime<Utc>,
    /// `beginDT` as it appeared in the URL
    pub begin_raw: String,
    /// `endDT` as it appeared in the URL
    pub end_raw: String,
    /// Output format (e.g. `application/netcdf`)
    pub format: String,
    /// Row limit; always negative for asynchronous requests
    pub limit: i64,
    /// `execDPA` flag, if given
    pub exec_dpa: Option<bool>,
    /// `include_provenance` flag, if given
    pub include_provenance: Option<bool>,
}

/// Machine-readable validation outcome codes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationIssue {
    /// URL lacks exactly one `?`
    MalformedUrl,
    /// A query token lacks exactly one `=`
    MalformedParameter,
    /// Parameter name is not recognized
    UnknownParameter,
    /// Parameter value fails its format rule
    InvalidParameterValue,
    /// Non-negative row limit
    SynchronousRequestRejected,
    /// Required parameter absent
    MissingRequiredParameter,
    /// Begin after end
    InvalidTimeOrder,
    /// No instrument token in the URL path
    MissingInstrument,
    /// URL does not address a sensor inventory stream, so bounds are unknown
    MetadataUnavailable,
    /// Metadata endpoint unreachable or non-200
    MetadataFetchFailed,
    /// Metadata response is not a list of stream descriptors
    MalformedMetadata,
    /// Stream not listed in the instrument metadata
    UnknownStream,
    /// Requested interval exceeds the stream bounds
    TimeIntervalOutOfBounds,
}

impl ValidationIssue {
    /// Failure category when this issue stops a submission
    pub fn kind(&self) -> ErrorKind {
        match self {
            ValidationIssue::MalformedUrl
            | ValidationIssue::MalformedParameter
            | ValidationIssue::UnknownParameter
            | ValidationIssue::InvalidParameterValue
            | ValidationIssue::MissingRequiredParameter
            | ValidationIssue::MissingInstrument => ErrorKind::MalformedInput,
            _ => ErrorKind::ValidationFailure,
        }
    }
}

/// Outcome of validating a request URL
///
/// `valid` reflects the syntactic checks only. Stream time bounds are
/// reported separately in `valid_time_interval`, which stays `None` when the
/// bounds were not checked or could not be fetched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// The request passed every syntactic check
    pub valid: bool,
    /// What went wrong, if anything
    pub issue: Option<ValidationIssue>,
    /// Human-readable explanation of `issue`
    pub reason: Option<String>,
    /// Stream begin time reported by the metadata endpoint
    pub stream_begin: Option<String>,
    /// Stream end time reported by the metadata endpoint
    pub stream_end: Option<String>,
    /// Whether the requested interval lies within the stream bounds
    pub valid_time_interval: Option<bool>,
}

impl ValidationResult {
    /// A syntactically valid request with nothing known yet about time bounds
    pub fn accepted() -> Self {
        Self {
            valid: true,
            ..Self::default()
        }
    }

    /// Record an issue without changing validity
    pub fn with_issue(mut self, issue: ValidationIssue, reason: impl Into<String>) -> Self {
        self.issue = Some(issue);
        self.reason = Some(reason.into());
        self
    }
}

/// One stream entry of the instrument metadata document
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// Stream name
    pub stream: String,
    /// First available timestamp
    #[serde(rename = "beginTime")]
    pub begin_time: String,
    /// Last available timestamp
    #[serde(rename = "endTime")]
    pub end_time: String,
}

/// Tracking record of a submitted (or rejected) request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestStatus {
    /// The request URL as given
    pub request_url: String,
    /// Parsed request, absent when the URL failed to parse
    pub request: Option<RequestSpec>,
    /// Validation outcome, absent for records restored without one
    pub validation: Option<ValidationResult>,
    /// HTTP status of the submission, absent if nothing was sent
    pub status_code: Option<u16>,
    /// Failure category, absent on success
    pub failure: Option<ErrorKind>,
    /// Human-readable failure reason
    pub reason: Option<String>,
    /// Server-issued tracking id
    pub request_uuid: Option<String>,
    /// Result location (catalog landing page)
    pub output_url: Option<String>,
    /// When the submission was sent
    pub requested_at: Option<DateTime<Utc>>,
    /// When the result location was first seen available
    pub completed_at: Option<DateTime<Utc>>,
}

impl RequestStatus {
    /// A record for `url` with nothing filled in yet
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            request_url: url.into(),
            request: None,
            validation: None,
            status_code: None,
            failure: None,
            reason: None,
            request_uuid: None,
            output_url: None,
            requested_at: None,
            completed_at: None,
        }
    }

    /// Mark the record failed
    pub(crate) fn fail(&mut self, kind: ErrorKind, reason: impl Into<String>) {
        self.failure = Some(kind);
        self.reason = Some(reason.into());
    }

    /// The server accepted the request and issued a tracking id
    pub fn is_submitted(&self) -> bool {
        self.request_uuid.is_some() && self.output_url.is_some()
    }

    /// The result location has been seen available
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Flat projection using the column names of the UFrame batch tooling
    pub fn to_record(&self) -> StatusRecord {
        let validation = self.validation.as_ref();
        StatusRecord {
            instrument: self.request.as_ref().map(|r| r.instrument.clone()),
            begin_dt: self.request.as_ref().map(|r| r.begin_raw.clone()),
            end_dt: self.request.as_ref().map(|r| r.end_raw.clone()),
            status_code: self.status_code,
            reason: self.reason.clone(),
            stream_begin_dt: validation.and_then(|v| v.stream_begin.clone()),
            stream_end_dt: validation.and_then(|v| v.stream_end.clone()),
            valid: validation.map(|v| v.valid),
            valid_time_interval: validation.and_then(|v| v.valid_time_interval),
            request_time: self.requested_at.map(format_timestamp),
            request_uuid: self.request_uuid.clone(),
            output_url: self.output_url.clone(),
            request_url: self.request_url.clone(),
            completion_time: self.completed_at.map(format_timestamp),
        }
    }

    /// Rebuild a status from a persisted record so polling can resume
    ///
    /// The request URL is re-parsed with `table`; a URL that no longer parses
    /// leaves `request` empty but keeps the tracking fields.
    pub fn from_record(
        record: StatusRecord,
        table: &ParameterTable,
        layout: &ServiceLayout,
    ) -> Self {
        let request = RequestSpec::parse(&record.request_url, table, layout).ok();
        let validation = record.valid.map(|valid| ValidationResult {
            valid,
            issue: None,
            reason: None,
            stream_begin: record.stream_begin_dt.clone(),
            stream_end: record.stream_end_dt.clone(),
            valid_time_interval: record.valid_time_interval,
        });
        Self {
            request_url: record.request_url,
            request,
            validation,
            status_code: record.status_code,
            failure: None,
            reason: record.reason,
            request_uuid: record.request_uuid,
            output_url: record.output_url,
            requested_at: record.request_time.as_deref().and_then(parse_timestamp),
            completed_at: record.completion_time.as_deref().and_then(parse_timestamp),
        }
    }
}

/// Serializable row describing a request, one column per field
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    /// Instrument identifier
    pub instrument: Option<String>,
    /// Requested begin time
    #[serde(rename = "beginDT")]
    pub begin_dt: Option<String>,
    /// Requested end time
    #[serde(rename = "endDT")]
    pub end_dt: Option<String>,
    /// Submission HTTP status
    pub status_code: Option<u16>,
    /// Failure reason
    pub reason: Option<String>,
    /// Stream begin time
    #[serde(rename = "stream_beginDT")]
    pub stream_begin_dt: Option<String>,
    /// Stream end time
    #[serde(rename = "stream_endDT")]
    pub stream_end_dt: Option<String>,
    /// Syntactic validity
    pub valid: Option<bool>,
    /// Interval within stream bounds
    pub valid_time_interval: Option<bool>,
    /// Submission time
    pub request_time: Option<String>,
    /// Tracking id
    #[serde(rename = "requestUUID")]
    pub request_uuid: Option<String>,
    /// Result location
    #[serde(rename = "outputURL")]
    pub output_url: Option<String>,
    /// Request URL
    pub request_url: String,
    /// Completion time
    pub completion_time: Option<String>,
}

/// A downloadable file discovered in a result tree
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultFileRef {
    /// Absolute file URL
    pub url: String,
    /// UUID-shaped directory token from the parent segment
    pub uuid: String,
    /// Stream token from the file name
    pub stream: String,
}

impl ResultFileRef {
    /// Build a reference, enforcing the served naming convention
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::UnrecognizedFileName`] if the parent segment
    /// is not UUID-shaped or the file name carries no stream token.
    pub fn from_url(url: &str, layout: &ServiceLayout) -> Result<Self> {
        let unrecognized = |reason: &str| ArtifactError::UnrecognizedFileName {
            name: url.to_string(),
            reason: reason.to_string(),
        };
        let (parent, file_name) = url
            .rsplit_once('/')
            .ok_or_else(|| unrecognized("no path separator"))?;
        let uuid = layout
            .uuid_token(parent)
            .ok_or_else(|| unrecognized("parent directory is not UUID-shaped"))?;
        let stream = layout
            .stream_token(file_name)
            .ok_or_else(|| unrecognized("no stream token in file name"))?;
        Ok(Self {
            url: url.to_string(),
            uuid: uuid.to_string(),
            stream: stream.to_string(),
        })
    }

    /// Last path segment of the URL
    pub fn file_name(&self) -> &str {
        self.url.rsplit('/').next().unwrap_or(&self.url)
    }
}

/// Time coverage read from a downloaded file's global attributes
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeCoverage {
    /// Raw start attribute
    pub start: String,
    /// Raw end attribute
    pub end: String,
}

/// A downloaded artifact
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalFile {
    /// Current location on disk
    pub path: PathBuf,
    /// Where it came from
    pub source: ResultFileRef,
    /// Coverage, once the renamer has read it
    pub coverage: Option<TimeCoverage>,
}

/// Result of downloading one request's result tree
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadOutcome {
    /// Result location that was crawled
    pub output_url: String,
    /// Files that made it to disk (renamed when timestamping is enabled)
    pub files: Vec<LocalFile>,
    /// Downloaded files the renamer could not handle, still on disk under
    /// their download name (unsupported format, rename failure)
    #[serde(default)]
    pub unrenamed: Vec<LocalFile>,
    /// Why nothing usable was downloaded, if so
    pub error: Option<String>,
}

/// Event emitted during the request lifecycle
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Request accepted by the service
    RequestSubmitted {
        /// Request URL
        url: String,
        /// Tracking id
        request_uuid: String,
        /// Result location
        output_url: String,
    },

    /// Request rejected locally or by the service
    RequestRejected {
        /// Request URL
        url: String,
        /// Failure category
        kind: ErrorKind,
        /// Failure reason
        reason: String,
    },

    /// Result location became available
    RequestCompleted {
        /// Result location
        output_url: String,
        /// When it was first seen available
        completed_at: DateTime<Utc>,
    },

    /// Result tree enumerated
    DiscoveryFinished {
        /// Root that was crawled
        url: String,
        /// Number of files found
        files: usize,
    },

    /// File written to disk
    FileDownloaded {
        /// Source URL
        url: String,
        /// Local path
        path: PathBuf,
        /// Bytes written
        bytes: u64,
    },

    /// File could not be downloaded or finalized
    FileFailed {
        /// Source URL or local path
        target: String,
        /// Error message
        error: String,
    },

    /// File renamed to embed its time coverage
    FileRenamed {
        /// Previous path
        from: PathBuf,
        /// New path
        to: PathBuf,
    },

    /// Corrupt or partial artifact removed from disk
    ArtifactRemoved {
        /// Removed path
        path: PathBuf,
        /// Why it was removed
        reason: String,
    },
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an ISO-8601 timestamp; values without a zone are taken as UTC
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
