//! Directory listing parsers
//!
//! The result tree is served as HTML directory listings. A
//! [`ListingParser`] turns one listing page into the ordered list of anchor
//! targets of a given [`AnchorKind`]; the discoverer resolves and crawls them.
//! The default [`RegexListingParser`] scrapes `<a href="...">` tags; a parser
//! backed by a structured API can be swapped in without touching callers.

use regex::Regex;

use crate::config::ServiceConfig;
use crate::error::Result;
use crate::layout::compile;

/// What kind of anchor to extract from a listing page
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnchorKind {
    /// UUID-named result directory followed by its listing page
    DirectoryMarker,
    /// Binary data file
    DataFile,
}

/// Extracts anchor targets from a served directory listing
pub trait ListingParser: Send + Sync {
    /// Anchor targets of `kind` in `html`, in document order
    fn anchors(&self, html: &str, kind: AnchorKind) -> Vec<String>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Listing parser that matches anchor tags with regular expressions
#[derive(Clone, Debug)]
pub struct RegexListingParser {
    directory: Regex,
    data_file: Regex,
}

impl RegexListingParser {
    /// Build the parser from the service naming conventions
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the UUID pattern
    /// does not compile.
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let directory = format!(
            r#"<a href="({}/{})">"#,
            config.uuid_pattern,
            regex::escape(&config.listing_page)
        );
        let data_file = format!(
            r#"<a href="([^"]*\.{})">"#,
            regex::escape(&config.data_extension)
        );
        Ok(Self {
            directory: compile("service.uuid_pattern", &directory)?,
            data_file: compile("service.data_extension", &data_file)?,
        })
    }
}

impl ListingParser for RegexListingParser {
    fn anchors(&self, html: &str, kind: AnchorKind) -> Vec<String> {
        let pattern = match kind {
            AnchorKind::DirectoryMarker => &self.directory,
            AnchorKind::DataFile => &self.data_file,
        };
        pattern
            .captures_iter(html)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .collect()
    }

    fn name(&self) -> &'static str {
        "regex-anchor"
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    const ROOT_PAGE: &str = r#"<html><body>
<table>
<tr><td><a href="2020030112-a1b2c3d4-1111-2222-3333-444455556666/contents.html">2020030112-a1b2c3d4-1111-2222-3333-444455556666/</a></td></tr>
<tr><td><a href="not-a-uuid/contents.html">not-a-uuid/</a></td></tr>
<tr><td><a href="2020030113-b1b2c3d4-1111-2222-3333-444455556666/contents.html">2020030113-b1b2c3d4-1111-2222-3333-444455556666/</a></td></tr>
<tr><td><a href="status.txt">status.txt</a></td></tr>
</table></body></html>"#;

    const CHILD_PAGE: &str = r#"<html><body>
<a href="deployment0001_CE02SHSM-RID27-02-FLORTD000-recovered_host-flort_sample.nc">nc</a>
<a href="deployment0001_CE02SHSM-RID27-02-FLORTD000-recovered_host-flort_sample.nc.html">form</a>
<a href="deployment0002_CE02SHSM-RID27-02-FLORTD000-recovered_host-flort_sample.nc">nc</a>
<a href="../contents.html">parent</a>
</body></html>"#;

    fn parser() -> RegexListingParser {
        RegexListingParser::new(&ServiceConfig::default()).unwrap()
    }

    #[test]
    fn finds_uuid_directory_markers_in_order() {
        let dirs = parser().anchors(ROOT_PAGE, AnchorKind::DirectoryMarker);
        assert_eq!(
            dirs,
            vec![
                "2020030112-a1b2c3d4-1111-2222-3333-444455556666/contents.html",
                "2020030113-b1b2c3d4-1111-2222-3333-444455556666/contents.html",
            ]
        );
    }

    #[test]
    fn finds_only_hrefs_ending_in_data_extension() {
        let files = parser().anchors(CHILD_PAGE, AnchorKind::DataFile);
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.ends_with(".nc")));
        assert!(files[0].starts_with("deployment0001_"));
        assert!(files[1].starts_with("deployment0002_"));
    }

    #[test]
    fn empty_listing_yields_nothing() {
        let parser = parser();
        assert!(parser
            .anchors("<html></html>", AnchorKind::DirectoryMarker)
            .is_empty());
        assert!(parser.anchors(ROOT_PAGE, AnchorKind::DataFile).is_empty());
    }

    #[test]
    fn extension_follows_configuration() {
        let config = ServiceConfig {
            data_extension: "h5".to_string(),
            ..ServiceConfig::default()
        };
        let parser = RegexListingParser::new(&config).unwrap();
        let html = r#"<a href="a.h5">a</a><a href="b.nc">b</a>"#;
        assert_eq!(parser.anchors(html, AnchorKind::DataFile), vec!["a.h5"]);
    }
}
