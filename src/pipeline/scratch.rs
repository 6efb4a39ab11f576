use crate::error::{FollowbackError, Result};
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};
use tracing::{debug, warn};

/// The archive a pipeline run reads from.
#[derive(Debug)]
pub enum UploadFile {
    /// Staged by the server; owned by the run and deleted during cleanup.
    Staged(NamedTempFile),
    /// Supplied by a local user; never deleted.
    Local(PathBuf),
}

impl UploadFile {
    /// Creates an empty, uniquely named staging file inside `uploads_dir`.
    pub fn stage_in(uploads_dir: &Path) -> Result<NamedTempFile> {
        tempfile::Builder::new()
            .prefix("upload-")
            .suffix(".part")
            .tempfile_in(uploads_dir)
            .map_err(FollowbackError::Io)
    }

    pub fn path(&self) -> &Path {
        match self {
            UploadFile::Staged(file) => file.path(),
            UploadFile::Local(path) => path,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CleanupReport {
    pub upload_removed: bool,
    pub extraction_root_removed: bool,
}

/// Per-run scratch state: the owned upload plus the extraction root.
///
/// [`ScratchArtifact::cleanup`] removes both and logs failures instead of
/// returning them. If a run is aborted before cleanup, the `tempfile` drop
/// guards still remove whatever is left.
#[derive(Debug)]
pub struct ScratchArtifact {
    upload: Option<UploadFile>,
    extraction_root: Option<TempDir>,
}

impl ScratchArtifact {
    pub fn new(upload: UploadFile) -> Self {
        Self {
            upload: Some(upload),
            extraction_root: None,
        }
    }

    pub fn upload_path(&self) -> Option<&Path> {
        self.upload.as_ref().map(UploadFile::path)
    }

    /// Creates a uniquely named extraction root under `uploads_dir`.
    pub fn create_extraction_root(&mut self, uploads_dir: &Path) -> Result<PathBuf> {
        let dir = tempfile::Builder::new()
            .prefix("scratch-")
            .tempdir_in(uploads_dir)
            .map_err(|e| FollowbackError::Extraction {
                message: format!("cannot create scratch directory: {}", e),
            })?;
        let path = dir.path().to_path_buf();
        self.extraction_root = Some(dir);
        Ok(path)
    }

    pub fn cleanup(mut self) -> CleanupReport {
        let mut report = CleanupReport::default();

        if let Some(UploadFile::Staged(file)) = self.upload.take() {
            let path = file.path().to_path_buf();
            match file.close() {
                Ok(()) => report.upload_removed = true,
                Err(e) => warn!(path = %path.display(), error = %e, "failed to remove uploaded file"),
            }
        }

        if let Some(dir) = self.extraction_root.take() {
            let path = dir.path().to_path_buf();
            match dir.close() {
                Ok(()) => report.extraction_root_removed = true,
                Err(e) => warn!(path = %path.display(), error = %e, "failed to remove scratch directory"),
            }
        }

        debug!(?report, "scratch cleanup finished");
        report
    }
}
