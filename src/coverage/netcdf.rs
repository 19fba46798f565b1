//! NetCDF coverage reader dispatching on the file's magic bytes

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::classic::{self, ClassicVersion};
use super::ncdump::NcdumpReader;
use super::traits::CoverageReader;
use crate::config::{ServiceConfig, ToolsConfig};
use crate::error::{ArtifactError, Error, Result};
use crate::types::TimeCoverage;

/// HDF5 superblock signature used by NetCDF-4 files
const HDF5_SIGNATURE: &[u8; 8] = b"\x89HDF\r\n\x1a\n";

/// Reads coverage attributes from NetCDF files
///
/// Classic headers are parsed natively on a blocking thread. NetCDF-4 files
/// go through `ncdump` when one is configured or found on PATH, and are
/// reported as [`Error::NotSupported`] otherwise.
#[derive(Clone, Debug)]
pub struct NetcdfCoverageReader {
    start_attribute: String,
    end_attribute: String,
    ncdump: Option<NcdumpReader>,
}

impl NetcdfCoverageReader {
    /// Create a reader for the given attribute names
    pub fn new(start_attribute: impl Into<String>, end_attribute: impl Into<String>) -> Self {
        Self {
            start_attribute: start_attribute.into(),
            end_attribute: end_attribute.into(),
            ncdump: None,
        }
    }

    /// Create a reader from configuration, resolving `ncdump` if possible
    pub fn from_config(service: &ServiceConfig, tools: &ToolsConfig) -> Self {
        let reader = Self::new(
            service.coverage_start_attribute.clone(),
            service.coverage_end_attribute.clone(),
        );
        match tools.resolve_ncdump() {
            Some(path) => reader.with_ncdump(NcdumpReader::new(path)),
            None => reader,
        }
    }

    /// Use `ncdump` for NetCDF-4 files
    pub fn with_ncdump(mut self, ncdump: NcdumpReader) -> Self {
        self.ncdump = Some(ncdump);
        self
    }

    fn coverage(&self, path: &Path, attributes: &BTreeMap<String, String>) -> Result<TimeCoverage> {
        let attribute = |name: &str| {
            attributes
                .get(name)
                .filter(|value| !value.is_empty())
                .cloned()
                .ok_or_else(|| corrupt(path, format!("missing global attribute {}", name)))
        };
        Ok(TimeCoverage {
            start: attribute(&self.start_attribute)?,
            end: attribute(&self.end_attribute)?,
        })
    }
}

/// Header contents after sniffing
enum Sniffed {
    Classic(BTreeMap<String, String>),
    Hdf5,
}

fn sniff(path: &Path) -> io::Result<Option<Sniffed>> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut magic = [0u8; 8];
    let read = read_prefix(&mut reader, &mut magic)?;
    let magic = &magic[..read];

    if magic == HDF5_SIGNATURE {
        return Ok(Some(Sniffed::Hdf5));
    }
    if ClassicVersion::from_magic(magic).is_none() {
        return Ok(None);
    }

    let mut reader = BufReader::new(File::open(path)?);
    classic::read_text_attributes(&mut reader).map(|attrs| Some(Sniffed::Classic(attrs)))
}

/// Fill as much of `buf` as the file allows
fn read_prefix<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

fn corrupt(path: &Path, reason: impl Into<String>) -> Error {
    ArtifactError::Corrupt {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
    .into()
}

#[async_trait]
impl CoverageReader for NetcdfCoverageReader {
    async fn read_coverage(&self, path: &Path) -> Result<TimeCoverage> {
        let owned: PathBuf = path.to_path_buf();
        let sniffed = tokio::task::spawn_blocking(move || sniff(&owned))
            .await
            .map_err(|e| Error::Io(io::Error::other(format!("header reader panicked: {}", e))))?;

        let attributes = match sniffed {
            Ok(Some(Sniffed::Classic(attributes))) => attributes,
            Ok(Some(Sniffed::Hdf5)) => {
                let Some(ncdump) = &self.ncdump else {
                    return Err(Error::NotSupported(format!(
                        "{} is NetCDF-4 and no ncdump binary is available",
                        path.display()
                    )));
                };
                debug!(path = %path.display(), binary = %ncdump.binary_path().display(), "reading NetCDF-4 header with ncdump");
                ncdump.text_attributes(path).await?
            }
            Ok(None) => return Err(corrupt(path, "not a NetCDF file")),
            Err(e) if matches!(
                e.kind(),
                io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof
            ) => {
                return Err(corrupt(path, e.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        self.coverage(path, &attributes)
    }

    fn name(&self) -> &'static str {
        "netcdf"
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn reader() -> NetcdfCoverageReader {
        NetcdfCoverageReader::new("time_coverage_start", "time_coverage_end")
    }

    fn write(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[tokio::test]
    async fn reads_coverage_from_classic_header() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "a.nc",
            &classic::encode_header(&[
                ("time_coverage_start", "2020-01-01T00:00:00"),
                ("time_coverage_end", "2020-01-02T00:00:00"),
            ]),
        );

        let coverage = reader().read_coverage(&path).await.unwrap();
        assert_eq!(coverage.start, "2020-01-01T00:00:00");
        assert_eq!(coverage.end, "2020-01-02T00:00:00");
    }

    #[tokio::test]
    async fn missing_attribute_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "a.nc",
            &classic::encode_header(&[("time_coverage_start", "2020-01-01T00:00:00")]),
        );

        let err = reader().read_coverage(&path).await.unwrap_err();
        assert_eq!(err.code(), "corrupt_artifact");
    }

    #[tokio::test]
    async fn html_error_page_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "a.nc", b"<html><body>Not Found</body></html>");

        let err = reader().read_coverage(&path).await.unwrap_err();
        assert_eq!(err.code(), "corrupt_artifact");
    }

    #[tokio::test]
    async fn empty_file_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "a.nc", b"");

        let err = reader().read_coverage(&path).await.unwrap_err();
        assert_eq!(err.code(), "corrupt_artifact");
    }

    #[tokio::test]
    async fn netcdf4_without_ncdump_is_not_supported() {
        let dir = TempDir::new().unwrap();
        let mut bytes = HDF5_SIGNATURE.to_vec();
        bytes.extend_from_slice(&[0u8; 64]);
        let path = write(&dir, "a.nc", &bytes);

        let err = reader().read_coverage(&path).await.unwrap_err();
        assert!(matches!(err, Error::NotSupported(_)));
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let err = reader()
            .read_coverage(&dir.path().join("absent.nc"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
