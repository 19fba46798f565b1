//! Coverage-based renaming of downloaded files

use super::UframeClient;
use crate::error::{ArtifactError, Error, Result};
use crate::naming::timestamped_file_name;
use crate::types::{Event, LocalFile};
use crate::utils::remove_quietly;

impl UframeClient {
    /// Rename a downloaded file to `<designator>-<start>-<end>.<ext>`
    ///
    /// The designator comes from the current file name and the coverage from
    /// the file's own metadata. The file is moved within its directory.
    ///
    /// # Errors
    ///
    /// - [`ArtifactError::UnrecognizedFileName`] if the name carries no
    ///   designator; the file is left in place
    /// - [`ArtifactError::Corrupt`] if the metadata cannot be read; the file
    ///   is deleted
    /// - [`ArtifactError::RenameFailed`] if the move fails; the file is left
    ///   in place
    /// - any other coverage reader error, with the file left in place
    pub async fn rename(&self, file: LocalFile) -> Result<LocalFile> {
        let name = file
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let Some(designator) = self.layout.designator(&name) else {
            return Err(ArtifactError::UnrecognizedFileName {
                name: name.clone(),
                reason: "no reference designator in file name".to_string(),
            }
            .into());
        };

        let coverage = match self.coverage.read_coverage(&file.path).await {
            Ok(coverage) => coverage,
            Err(Error::Artifact(ArtifactError::Corrupt { path, reason })) => {
                remove_quietly(&path).await;
                tracing::warn!(path = %path.display(), reason = %reason, reader = self.coverage.name(), "removed corrupt download");
                self.emit_event(Event::ArtifactRemoved {
                    path: path.clone(),
                    reason: reason.clone(),
                });
                return Err(ArtifactError::Corrupt { path, reason }.into());
            }
            Err(e) => return Err(e),
        };

        let new_name = timestamped_file_name(
            designator,
            &coverage,
            &self.layout.config().data_extension,
        );
        let new_path = file.path.with_file_name(&new_name);

        if let Err(e) = tokio::fs::rename(&file.path, &new_path).await {
            return Err(ArtifactError::RenameFailed {
                source_path: file.path,
                dest_path: new_path,
                reason: e.to_string(),
            }
            .into());
        }

        tracing::debug!(from = %file.path.display(), to = %new_path.display(), "renamed");
        self.emit_event(Event::FileRenamed {
            from: file.path.clone(),
            to: new_path.clone(),
        });
        Ok(LocalFile {
            path: new_path,
            source: file.source,
            coverage: Some(coverage),
        })
    }

    /// Rename every file, keeping only those that were renamed
    ///
    /// Failures are logged and reported as `FileFailed` events; corrupt
    /// files are deleted by [`rename`](Self::rename) and files in an
    /// unsupported format stay on disk under their download name. Use
    /// [`sort_by_coverage`](Self::sort_by_coverage) to get those back too.
    pub async fn timestamp_files(&self, files: Vec<LocalFile>) -> Vec<LocalFile> {
        self.sort_by_coverage(files).await.0
    }

    /// Rename every file, splitting the results into renamed files and files
    /// left on disk under their download name
    ///
    /// Corrupt files are deleted and appear in neither list.
    pub async fn sort_by_coverage(
        &self,
        files: Vec<LocalFile>,
    ) -> (Vec<LocalFile>, Vec<LocalFile>) {
        let mut renamed = Vec::with_capacity(files.len());
        let mut kept = Vec::new();
        for file in files {
            let target = file.path.display().to_string();
            match self.rename(file.clone()).await {
                Ok(file) => renamed.push(file),
                Err(Error::Artifact(ArtifactError::Corrupt { reason, .. })) => {
                    self.emit_event(Event::FileFailed {
                        target,
                        error: reason,
                    });
                }
                Err(Error::NotSupported(reason)) => {
                    tracing::warn!(path = %target, reason = %reason, "kept file under its download name");
                    self.emit_event(Event::FileFailed {
                        target,
                        error: reason,
                    });
                    kept.push(file);
                }
                Err(e) => {
                    tracing::warn!(path = %target, error = %e, "rename failed");
                    self.emit_event(Event::FileFailed {
                        target,
                        error: e.to_string(),
                    });
                    if tokio::fs::try_exists(&file.path).await.unwrap_or(false) {
                        kept.push(file);
                    }
                }
            }
        }
        (renamed, kept)
    }
}
