//! Global attribute reader backed by the external `ncdump` tool

use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tokio::process::Command;

use crate::error::{ArtifactError, Error, Result};

/// `\t\t:name = "value" ;` lines of the global attributes section
#[allow(clippy::expect_used)]
static GLOBAL_TEXT_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*:(\w+) = "(.*)" ;\s*$"#).expect("static pattern compiles")
});

/// Reads global attributes by running `ncdump -h` on a file
///
/// Used for NetCDF-4 (HDF5-backed) files, whose headers are not parsed
/// natively.
#[derive(Clone, Debug)]
pub struct NcdumpReader {
    binary_path: PathBuf,
}

impl NcdumpReader {
    /// Create a reader with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Attempt to find `ncdump` in PATH
    pub fn from_path() -> Option<Self> {
        which::which("ncdump").ok().map(Self::new)
    }

    /// Path of the binary this reader runs
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    /// Text-valued global attributes of `path`
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExternalTool`] if the binary cannot be executed and
    /// [`ArtifactError::Corrupt`] if `ncdump` cannot open the file.
    pub async fn text_attributes(&self, path: &Path) -> Result<BTreeMap<String, String>> {
        let output = Command::new(&self.binary_path)
            .arg("-h") // header only
            .arg(path)
            .output()
            .await
            .map_err(|e| Error::ExternalTool(format!("Failed to execute ncdump: {}", e)))?;

        if !output.status.success() {
            return Err(ArtifactError::Corrupt {
                path: path.to_path_buf(),
                reason: format!(
                    "ncdump failed: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            }
            .into());
        }

        Ok(parse_global_attributes(&String::from_utf8_lossy(
            &output.stdout,
        )))
    }
}

/// Text-valued global attributes in `ncdump -h` output
pub(crate) fn parse_global_attributes(output: &str) -> BTreeMap<String, String> {
    output
        .lines()
        .skip_while(|line| !line.trim_start().starts_with("// global attributes:"))
        .filter_map(|line| GLOBAL_TEXT_ATTRIBUTE.captures(line))
        .filter_map(|caps| Some((caps.get(1)?.as_str(), caps.get(2)?.as_str())))
        .map(|(name, value)| (name.to_string(), value.replace("\\\"", "\"")))
        .collect()
}
