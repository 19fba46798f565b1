//! Utility functions for URL resolution and file cleanup

use crate::error::{Error, Result};
use std::path::Path;

/// Resolve an anchor target found on a listing page
///
/// Relative targets are resolved against the page URL the way a browser
/// would, so `a/contents.html` on `http://host/x/contents.html` becomes
/// `http://host/x/a/contents.html`. Absolute targets are returned as given.
///
/// # Arguments
///
/// * `page_url` - URL of the page the anchor was found on
/// * `href` - The anchor's `href` attribute
///
/// # Errors
///
/// Returns [`Error::Protocol`] if either URL cannot be parsed.
///
/// # Examples
///
/// ```
/// use uframe_async::utils::resolve_href;
///
/// let url = resolve_href("http://host/results/contents.html", "run-1/contents.html").unwrap();
/// assert_eq!(url, "http://host/results/run-1/contents.html");
/// ```
pub fn resolve_href(page_url: &str, href: &str) -> Result<String> {
    let base = url::Url::parse(page_url).map_err(|e| Error::Protocol {
        url: page_url.to_string(),
        reason: format!("invalid listing URL: {}", e),
    })?;
    base.join(href)
        .map(String::from)
        .map_err(|e| Error::Protocol {
            url: page_url.to_string(),
            reason: format!("invalid anchor '{}': {}", href, e),
        })
}

/// Directory listing URL for a result location
///
/// A location that already names an HTML page (`.../catalog.html`) is kept;
/// any other location, dotted run directories included, gets a trailing `/`
/// so relative anchors resolve inside it.
pub fn directory_url(location: &str) -> String {
    let last = location.rsplit('/').next().unwrap_or_default();
    if location.ends_with('/') || last.ends_with(".html") {
        location.to_string()
    } else {
        format!("{}/", location)
    }
}

/// Remove a file, logging instead of failing if it is already gone
///
/// Used for `.part` files and corrupt artifacts, where the removal is
/// cleanup after an error that is already being reported.
pub async fn remove_quietly(path: &Path) -> bool {
    match tokio::fs::remove_file(path).await {
        Ok(()) => true,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove file");
            false
        }
    }
}
