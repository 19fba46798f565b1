//! Local file naming
//!
//! Downloaded files are first stored as `<uuid>-<original name>` inside a
//! per-stream directory, then renamed to
//! `<designator>-<start>-<end>.<ext>` once their time coverage is known.

use crate::types::TimeCoverage;

/// Suffix of a file that is still being written
pub const PARTIAL_SUFFIX: &str = "part";

/// Length of an ISO-8601 timestamp without sub-seconds or zone
const TIMESTAMP_PREFIX_LEN: usize = 19;

/// Compact timestamp token used in file names
///
/// Keeps the first 19 characters and drops `-` and `:` separators, so
/// `2020-01-01T00:00:00.000Z` becomes `20200101T000000`. Path separators in
/// a malformed value are replaced with `_` so the token stays a single path
/// component.
pub fn compact_timestamp(value: &str) -> String {
    value
        .chars()
        .take(TIMESTAMP_PREFIX_LEN)
        .filter(|c| *c != '-' && *c != ':')
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect()
}

/// Name of a freshly downloaded file
pub fn local_file_name(uuid: &str, original: &str) -> String {
    format!("{}-{}", uuid, original)
}

/// Name of the in-progress download for `final_name`
pub fn partial_file_name(final_name: &str) -> String {
    format!("{}.{}", final_name, PARTIAL_SUFFIX)
}

/// Name of a file once its coverage has been read
///
/// The date/time `T` separator is kept in both tokens, giving
/// `<designator>-20200101T000000-20200102T000000.nc`.
pub fn timestamped_file_name(designator: &str, coverage: &TimeCoverage, extension: &str) -> String {
    let (start, end) = coverage.compact();
    format!("{}-{}-{}.{}", designator, start, end, extension)
}

impl TimeCoverage {
    /// Compact start and end tokens
    pub fn compact(&self) -> (String, String) {
        (compact_timestamp(&self.start), compact_timestamp(&self.end))
    }
}
