//! Configuration types for uframe-async

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;

/// Main configuration for [`UframeClient`](crate::UframeClient)
///
/// Every field has a default matching the OOI UFrame deployment, so
/// `Config::default()` works against the production service layout.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// URL layout and naming conventions of the remote service
    #[serde(default)]
    pub service: ServiceConfig,

    /// Recognized request parameters and their format rules
    #[serde(default = "default_parameter_rules")]
    pub parameters: Vec<ParameterRule>,

    /// HTTP client behavior
    #[serde(default)]
    pub http: HttpConfig,

    /// Download destination and fetch behavior
    #[serde(default)]
    pub download: DownloadConfig,

    /// Default submission policy
    #[serde(default)]
    pub submit: SubmitOptions,

    /// External tool paths
    #[serde(default)]
    pub tools: ToolsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            parameters: default_parameter_rules(),
            http: HttpConfig::default(),
            download: DownloadConfig::default(),
            submit: SubmitOptions::default(),
            tools: ToolsConfig::default(),
        }
    }
}

impl Config {
    /// Parse a JSON configuration; absent fields take their defaults
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`](crate::Error::Serialization) if the document is not valid JSON or
    /// a field has the wrong type.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON configuration file
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if the file cannot be read, otherwise as
    /// [`from_json`](Self::from_json).
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = tokio::fs::read_to_string(path.as_ref()).await?;
        let config = Self::from_json(&json)?;
        tracing::debug!(path = %path.as_ref().display(), "loaded configuration");
        Ok(config)
    }
}

/// URL layout of the remote service
///
/// Patterns are regular expressions compiled once when the client is built.
/// Defaults follow the UFrame sensor inventory and the THREDDS/Hyrax result
/// mounts.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Catalog (landing page) mount, as it appears in `outputURL`
    #[serde(default = "default_catalog_mount")]
    pub catalog_mount: String,

    /// Download front-end mount that exposes the same result files
    #[serde(default = "default_download_mount")]
    pub download_mount: String,

    /// Name of the catalog landing page at the end of `outputURL`
    #[serde(default = "default_catalog_page")]
    pub catalog_page: String,

    /// Machine-readable status resource that replaces the catalog page
    #[serde(default = "default_status_page")]
    pub status_page: String,

    /// Listing page inside each result directory
    #[serde(default = "default_listing_page")]
    pub listing_page: String,

    /// Suffix appended to the instrument URL prefix to reach stream metadata
    #[serde(default = "default_metadata_suffix")]
    pub metadata_suffix: String,

    /// Instrument token in a request URL path; capture group 1 holds the
    /// `/`-separated segments
    #[serde(default = "default_instrument_pattern")]
    pub instrument_pattern: String,

    /// Request URL prefix up to the instrument segment (group 1), followed by
    /// telemetry (group 2) and stream (group 3)
    #[serde(default = "default_metadata_pattern")]
    pub metadata_pattern: String,

    /// UUID-shaped result directory name
    #[serde(default = "default_uuid_pattern")]
    pub uuid_pattern: String,

    /// Stream token between the last `_` and the extension of a served file
    #[serde(default = "default_stream_pattern")]
    pub stream_pattern: String,

    /// Reference designator in a downloaded file name (may carry qualifiers)
    #[serde(default = "default_designator_pattern")]
    pub designator_pattern: String,

    /// Extension of the served binary data files
    #[serde(default = "default_data_extension")]
    pub data_extension: String,

    /// Global attribute holding the covered start time
    #[serde(default = "default_coverage_start_attribute")]
    pub coverage_start_attribute: String,

    /// Global attribute holding the covered end time
    #[serde(default = "default_coverage_end_attribute")]
    pub coverage_end_attribute: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            catalog_mount: default_catalog_mount(),
            download_mount: default_download_mount(),
            catalog_page: default_catalog_page(),
            status_page: default_status_page(),
            listing_page: default_listing_page(),
            metadata_suffix: default_metadata_suffix(),
            instrument_pattern: default_instrument_pattern(),
            metadata_pattern: default_metadata_pattern(),
            uuid_pattern: default_uuid_pattern(),
            stream_pattern: default_stream_pattern(),
            designator_pattern: default_designator_pattern(),
            data_extension: default_data_extension(),
            coverage_start_attribute: default_coverage_start_attribute(),
            coverage_end_attribute: default_coverage_end_attribute(),
        }
    }
}

/// Semantic role of a request parameter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    /// Start of the requested interval
    BeginTime,
    /// End of the requested interval
    EndTime,
    /// Output MIME type
    Format,
    /// Row limit (negative means asynchronous)
    RowLimit,
    /// `true`/`false` flag for data product algorithms
    ExecDpa,
    /// `true`/`false` flag for provenance output
    IncludeProvenance,
}

/// One recognized request parameter
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterRule {
    /// Query parameter name as it appears in the URL
    pub name: String,
    /// Format rule the value must match
    pub pattern: String,
    /// What the parameter means
    pub kind: ParameterKind,
    /// Whether the parameter must be present
    #[serde(default)]
    pub required: bool,
}

impl ParameterRule {
    fn new(name: &str, pattern: &str, kind: ParameterKind, required: bool) -> Self {
        Self {
            name: name.to_string(),
            pattern: pattern.to_string(),
            kind,
            required,
        }
    }
}

/// Which front-end the poller checks for completion
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrontEnd {
    /// Rewrite result locations to the download front-end (Hyrax)
    #[default]
    Download,
    /// Check the catalog front-end (THREDDS) as given
    Catalog,
}

/// HTTP client configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Deadline for submission, metadata, status and listing calls (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Deadline for a single file download, body included (default: 1 hour)
    #[serde(default = "default_download_timeout", with = "duration_serde")]
    pub download_timeout: Duration,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum concurrent submissions in [`submit_all`](crate::UframeClient::submit_all) (default: 4)
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    /// Front-end used for completion checks
    #[serde(default)]
    pub front_end: FrontEnd,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
            download_timeout: default_download_timeout(),
            user_agent: default_user_agent(),
            max_concurrent_requests: default_max_concurrent_requests(),
            front_end: FrontEnd::default(),
        }
    }
}

/// Download behavior configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Destination root; must exist before fetching (default: ".")
    #[serde(default = "default_destination")]
    pub destination: PathBuf,

    /// Largest slice written to disk between flushes (default: 1024 bytes)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Maximum concurrent file downloads per result tree (default: 3)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_downloads: usize,

    /// Rename downloaded files to embed their time coverage (default: true)
    #[serde(default = "default_true")]
    pub timestamp_files: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            destination: default_destination(),
            chunk_size: default_chunk_size(),
            max_concurrent_downloads: default_max_concurrent(),
            timestamp_files: true,
        }
    }
}

/// Submission policy
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitOptions {
    /// Compare the requested interval against the stream's time bounds (default: true)
    #[serde(default = "default_true")]
    pub time_check: bool,

    /// Refuse to submit when the interval falls outside the stream bounds (default: false)
    #[serde(default)]
    pub reject_out_of_bounds: bool,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            time_check: true,
            reject_out_of_bounds: false,
        }
    }
}

/// External tool paths
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path to ncdump, used to read NetCDF-4 headers (auto-detected if None)
    #[serde(default)]
    pub ncdump_path: Option<PathBuf>,

    /// Whether to search PATH for ncdump if no explicit path is set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ncdump_path: None,
            search_path: true,
        }
    }
}

impl ToolsConfig {
    /// Resolve the ncdump binary from config or PATH
    pub fn resolve_ncdump(&self) -> Option<PathBuf> {
        if let Some(path) = &self.ncdump_path {
            return Some(path.clone());
        }
        if self.search_path {
            return which::which("ncdump").ok();
        }
        None
    }
}

/// Default parameter table of the UFrame sensor inventory endpoint
pub fn default_parameter_rules() -> Vec<ParameterRule> {
    const TIMESTAMP: &str = r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d+Z$";
    const FLAG: &str = r"^(true|false)$";
    vec![
        ParameterRule::new("beginDT", TIMESTAMP, ParameterKind::BeginTime, true),
        ParameterRule::new("endDT", TIMESTAMP, ParameterKind::EndTime, true),
        ParameterRule::new("format", r"^application/\w+$", ParameterKind::Format, true),
        ParameterRule::new("limit", r"^-?\d+$", ParameterKind::RowLimit, true),
        ParameterRule::new("execDPA", FLAG, ParameterKind::ExecDpa, false),
        ParameterRule::new(
            "include_provenance",
            FLAG,
            ParameterKind::IncludeProvenance,
            false,
        ),
    ]
}

fn default_catalog_mount() -> String {
    "8090/thredds/catalog/ooi/_nouser".to_string()
}

fn default_download_mount() -> String {
    "8080/opendap/hyrax/async_results/_nouser".to_string()
}

fn default_catalog_page() -> String {
    "catalog.html".to_string()
}

fn default_status_page() -> String {
    "status.txt".to_string()
}

fn default_listing_page() -> String {
    "contents.html".to_string()
}

fn default_metadata_suffix() -> String {
    "metadata/times".to_string()
}

fn default_instrument_pattern() -> String {
    r"/(\w{8,}/\w{5,}/\d{2}-\w{9,})/".to_string()
}

fn default_metadata_pattern() -> String {
    r"^(https?://.*/sensor/inv/\w{8}/\w{5}/\d{2}-\w{9}/)(\w+)/(\w+)".to_string()
}

fn default_uuid_pattern() -> String {
    r"\w{10}-\w{8}-\w{4}-\w{4}-\w{4}-\w{12}".to_string()
}

fn default_stream_pattern() -> String {
    r"\w+-\w+-\w+-\w+-\w+-\w+".to_string()
}

fn default_designator_pattern() -> String {
    r"\w+-\w+-\w+-\w+.*".to_string()
}

fn default_data_extension() -> String {
    "nc".to_string()
}

fn default_coverage_start_attribute() -> String {
    "time_coverage_start".to_string()
}

fn default_coverage_end_attribute() -> String {
    "time_coverage_end".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_download_timeout() -> Duration {
    Duration::from_secs(3600)
}

fn default_user_agent() -> String {
    concat!("uframe-async/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_max_concurrent_requests() -> usize {
    4
}

fn default_destination() -> PathBuf {
    PathBuf::from(".")
}

fn default_chunk_size() -> usize {
    1024
}

fn default_max_concurrent() -> usize {
    3
}

fn default_true() -> bool {
    true
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
