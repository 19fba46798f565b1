//! Trait for reading time coverage from downloaded files

use async_trait::async_trait;
use std::path::Path;

use crate::types::TimeCoverage;

/// Reads the time range a downloaded data file covers
///
/// # Errors
///
/// Implementations return:
/// - [`ArtifactError::Corrupt`](crate::ArtifactError::Corrupt) when the file
///   cannot be opened as valid metadata or lacks the coverage attributes;
///   the renamer deletes such files
/// - [`Error::NotSupported`](crate::Error::NotSupported) when the format is
///   valid but no reader is available for it; the file is kept
/// - any other error for I/O or tool failures; the file is kept
#[async_trait]
pub trait CoverageReader: Send + Sync {
    /// Coverage start and end of the file at `path`
    async fn read_coverage(&self, path: &Path) -> crate::Result<TimeCoverage>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
