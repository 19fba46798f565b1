//! Compiled URL layout of the remote service
//!
//! [`ServiceLayout`] turns the string patterns of [`ServiceConfig`] into
//! regular expressions once, and answers every "where does X live" question
//! the lifecycle asks: the instrument in a request URL, the metadata endpoint
//! for a stream, the status resource of a result location, and the tokens
//! embedded in served file names.

use crate::config::{FrontEnd, ServiceConfig};
use crate::error::{Error, Result};
use regex::Regex;

/// Metadata endpoint derived from a request URL
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetadataTarget {
    /// URL of the stream time-bounds document
    pub url: String,
    /// Telemetry segment following the instrument (e.g. `recovered_host`)
    pub telemetry: String,
    /// Stream segment following the telemetry (e.g. `flort_sample`)
    pub stream: String,
}

/// Compiled service layout shared by every lifecycle stage
#[derive(Clone, Debug)]
pub struct ServiceLayout {
    config: ServiceConfig,
    instrument: Regex,
    metadata: Regex,
    uuid_suffix: Regex,
    stream: Regex,
    designator: Regex,
}

impl ServiceLayout {
    /// Compile the layout patterns
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the offending key if a pattern does
    /// not compile.
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let ext = regex::escape(&config.data_extension);
        Ok(Self {
            instrument: compile("service.instrument_pattern", &config.instrument_pattern)?,
            metadata: compile("service.metadata_pattern", &config.metadata_pattern)?,
            uuid_suffix: compile(
                "service.uuid_pattern",
                &format!("({})$", config.uuid_pattern),
            )?,
            stream: compile(
                "service.stream_pattern",
                &format!(r"_({})\.{}$", config.stream_pattern, ext),
            )?,
            designator: compile(
                "service.designator_pattern",
                &format!(r"_({})\.{}$", config.designator_pattern, ext),
            )?,
            config: config.clone(),
        })
    }

    /// The configuration this layout was compiled from
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Instrument identifier of a request URL, segments joined with `-`
    ///
    /// `.../sensor/inv/CE02SHSM/RID27/02-FLORTD000/...` yields
    /// `CE02SHSM-RID27-02-FLORTD000`.
    pub fn instrument(&self, url: &str) -> Option<String> {
        let caps = self.instrument.captures(url)?;
        let segments = caps.get(1)?.as_str();
        Some(segments.split('/').collect::<Vec<_>>().join("-"))
    }

    /// Metadata endpoint, telemetry and stream of a request URL
    pub fn metadata_target(&self, url: &str) -> Option<MetadataTarget> {
        let caps = self.metadata.captures(url)?;
        let prefix = caps.get(1)?.as_str();
        Some(MetadataTarget {
            url: format!("{}{}", prefix, self.config.metadata_suffix),
            telemetry: caps.get(2)?.as_str().to_string(),
            stream: caps.get(3)?.as_str().to_string(),
        })
    }

    /// Rewrite a catalog result location to the download front-end mount
    pub fn to_download_front_end(&self, url: &str) -> String {
        url.replace(&self.config.catalog_mount, &self.config.download_mount)
    }

    /// Status resource to poll for a result location
    ///
    /// Replaces a trailing catalog page with the status page and, for
    /// [`FrontEnd::Download`], moves the URL onto the download mount.
    pub fn status_url(&self, output_url: &str, front_end: FrontEnd) -> String {
        let url = match front_end {
            FrontEnd::Download => self.to_download_front_end(output_url),
            FrontEnd::Catalog => output_url.to_string(),
        };
        match url.strip_suffix(self.config.catalog_page.as_str()) {
            Some(base) => format!("{}{}", base, self.config.status_page),
            None => url,
        }
    }

    /// UUID-shaped directory token at the end of a parent URL or path
    pub fn uuid_token<'a>(&self, parent: &'a str) -> Option<&'a str> {
        let parent = parent.trim_end_matches('/');
        self.uuid_suffix
            .captures(parent)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
    }

    /// Stream token embedded in a served file name
    pub fn stream_token<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        self.stream
            .captures(file_name)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
    }

    /// Reference designator (with trailing qualifiers) in a downloaded file name
    pub fn designator<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        self.designator
            .captures(file_name)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
    }
}

pub(crate) fn compile(key: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::Config {
        message: format!("invalid pattern '{}': {}", pattern, e),
        key: Some(key.to_string()),
    })
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    const REQUEST: &str = "http://uframe.example.org:12576/sensor/inv/CE02SHSM/RID27/02-FLORTD000/recovered_host/flort_sample?beginDT=2020-01-01T00:00:00.0Z&endDT=2020-01-02T00:00:00.0Z&format=application/netcdf&limit=-1";
    const OUTPUT: &str = "https://opendap.example.org:8090/thredds/catalog/ooi/_nouser/20200301T120000-CE02SHSM-RID27-02-FLORTD000-recovered_host-flort_sample/catalog.html";

    fn layout() -> ServiceLayout {
        ServiceLayout::new(&ServiceConfig::default()).unwrap()
    }

    #[test]
    fn instrument_joins_three_segments() {
        assert_eq!(
            layout().instrument(REQUEST).as_deref(),
            Some("CE02SHSM-RID27-02-FLORTD000")
        );
        assert_eq!(layout().instrument("http://host/sensor/inv/short/x"), None);
    }

    #[test]
    fn metadata_target_keeps_prefix_through_instrument() {
        let target = layout().metadata_target(REQUEST).unwrap();

        assert_eq!(
            target.url,
            "http://uframe.example.org:12576/sensor/inv/CE02SHSM/RID27/02-FLORTD000/metadata/times"
        );
        assert_eq!(target.telemetry, "recovered_host");
        assert_eq!(target.stream, "flort_sample");
    }

    #[test]
    fn status_url_rewrites_to_download_mount() {
        let status = layout().status_url(OUTPUT, FrontEnd::Download);
        assert_eq!(
            status,
            "https://opendap.example.org:8080/opendap/hyrax/async_results/_nouser/20200301T120000-CE02SHSM-RID27-02-FLORTD000-recovered_host-flort_sample/status.txt"
        );
    }

    #[test]
    fn status_url_on_catalog_front_end_only_swaps_the_page() {
        let status = layout().status_url(OUTPUT, FrontEnd::Catalog);
        assert!(status.contains("8090/thredds/catalog/ooi/_nouser"));
        assert!(status.ends_with("/status.txt"));
    }

    #[test]
    fn status_url_leaves_foreign_pages_alone() {
        let url = "http://host/results/index.html";
        assert_eq!(layout().status_url(url, FrontEnd::Catalog), url);
    }

    #[test]
    fn tokens_follow_the_served_naming_convention() {
        let layout = layout();
        let parent = "http://host/_nouser/x/2020030112-a1b2c3d4-1111-2222-3333-444455556666";
        assert_eq!(
            layout.uuid_token(parent),
            Some("2020030112-a1b2c3d4-1111-2222-3333-444455556666")
        );
        assert_eq!(layout.uuid_token("http://host/_nouser/plain"), None);

        let file = "deployment0001_CE02SHSM-RID27-02-FLORTD000-recovered_host-flort_sample.nc";
        assert_eq!(
            layout.stream_token(file),
            Some("CE02SHSM-RID27-02-FLORTD000-recovered_host-flort_sample")
        );
        assert_eq!(layout.stream_token("deployment0001_CE02SHSM-RID27.nc"), None);
        assert_eq!(layout.stream_token("deployment0001_a-b-c-d-e-f.txt"), None);
    }

    #[test]
    fn designator_accepts_trailing_qualifiers() {
        let name = "2020030112-a1b2c3d4-1111-2222-3333-444455556666-deployment0001_CE02SHSM-RID27-02-FLORTD000-recovered_host-flort_sample_20200101T000000.5-20200102T000000.nc";
        assert_eq!(
            layout().designator(name),
            Some(
                "CE02SHSM-RID27-02-FLORTD000-recovered_host-flort_sample_20200101T000000.5-20200102T000000"
            )
        );
    }

    #[test]
    fn invalid_pattern_names_the_config_key() {
        let config = ServiceConfig {
            uuid_pattern: "(".to_string(),
            ..ServiceConfig::default()
        };

        match ServiceLayout::new(&config) {
            Err(Error::Config { key, .. }) => {
                assert_eq!(key.as_deref(), Some("service.uuid_pattern"))
            }
            other => panic!("expected config error, got {:?}", other.map(|_| ())),
        }
    }
}
