pub mod scratch;
pub mod stage;

pub use scratch::{CleanupReport, ScratchArtifact, UploadFile};
pub use stage::Stage;

use crate::archive::{UnpackReport, ZipUnpacker};
use crate::config::{ArchiveConfig, Config};
use crate::diff::{diff, DiffResult};
use crate::error::{FollowbackError, Result};
use crate::extractor::{IdentifierExtractor, MembershipSet, Role};
use crate::locator::{DocumentLocator, ExportDocument, LocatedDocuments};
use crate::results::{ResultArtifact, ResultStore};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tempfile::NamedTempFile;
use tokio::{fs, task};
use tracing::{debug, error, info, warn};

/// One archive handed to the pipeline, with the name the user gave it.
#[derive(Debug)]
pub struct Upload {
    pub original_name: String,
    pub file: UploadFile,
}

impl Upload {
    pub fn staged<S: Into<String>>(original_name: S, file: NamedTempFile) -> Self {
        Self {
            original_name: original_name.into(),
            file: UploadFile::Staged(file),
        }
    }

    pub fn local<P: Into<PathBuf>>(path: P) -> Self {
        let path = path.into();
        let original_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            original_name,
            file: UploadFile::Local(path),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub following: usize,
    pub followers: usize,
    pub follower_pages: usize,
    pub unpacked_files: usize,
    pub unpacked_bytes: u64,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// Every followed account follows back; nothing was persisted.
    AllFollowBack { summary: ScanSummary },
    NotFollowingBack {
        summary: ScanSummary,
        accounts: DiffResult,
        artifact: ResultArtifact,
    },
}

impl ScanOutcome {
    pub fn summary(&self) -> &ScanSummary {
        match self {
            ScanOutcome::AllFollowBack { summary } => summary,
            ScanOutcome::NotFollowingBack { summary, .. } => summary,
        }
    }

    pub fn accounts(&self) -> Option<&DiffResult> {
        match self {
            ScanOutcome::AllFollowBack { .. } => None,
            ScanOutcome::NotFollowingBack { accounts, .. } => Some(accounts),
        }
    }

    pub fn artifact(&self) -> Option<&ResultArtifact> {
        match self {
            ScanOutcome::AllFollowBack { .. } => None,
            ScanOutcome::NotFollowingBack { artifact, .. } => Some(artifact),
        }
    }

    pub fn everyone_follows_back(&self) -> bool {
        matches!(self, ScanOutcome::AllFollowBack { .. })
    }
}

type ProgressCallback = Box<dyn Fn(Stage) + Send + Sync>;

/// Runs uploads through validate, unpack, locate, extract, diff and persist.
///
/// A pipeline holds no per-request state, so one instance can serve any
/// number of concurrent uploads. Every run gets its own scratch directory and
/// its own artifact name, and every run ends with cleanup.
pub struct Pipeline {
    archive: ArchiveConfig,
    uploads_dir: PathBuf,
    extractor: IdentifierExtractor,
    locator: Arc<DocumentLocator>,
    store: ResultStore,
    progress_callback: Option<ProgressCallback>,
    running: Arc<AtomicBool>,
}

impl Pipeline {
    /// Builds a pipeline and creates the uploads and results roots if needed.
    pub fn new(config: &Config) -> Result<Self> {
        let uploads_dir = config.storage.uploads_dir.clone();
        std::fs::create_dir_all(&uploads_dir).map_err(|e| FollowbackError::Config {
            message: format!(
                "Cannot create uploads directory {}: {}",
                uploads_dir.display(),
                e
            ),
        })?;

        let store = ResultStore::new(&config.storage.results_dir);
        store.initialize()?;

        Ok(Self {
            archive: config.archive.clone(),
            uploads_dir,
            extractor: IdentifierExtractor::new(&config.archive.platform_domain),
            locator: Arc::new(DocumentLocator::new(&config.archive)),
            store,
            progress_callback: None,
            running: Arc::new(AtomicBool::new(true)),
        })
    }

    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(Stage) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Box::new(callback));
        self
    }

    /// Shares an interrupt flag; once it reads `false`, runs stop at the next
    /// stage boundary with [`FollowbackError::Cancelled`].
    pub fn with_cancellation(mut self, running: Arc<AtomicBool>) -> Self {
        self.running = running;
        self
    }

    pub fn cancel(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    pub fn results_dir(&self) -> &Path {
        self.store.results_dir()
    }

    pub fn archive_config(&self) -> &ArchiveConfig {
        &self.archive
    }

    pub async fn process(&self, upload: Upload) -> Result<ScanOutcome> {
        self.process_with(upload, |outcome| outcome).await
    }

    /// Processes one upload and hands the outcome to `render` before the
    /// scratch state is removed. Cleanup runs on every path.
    pub async fn process_with<F, T>(&self, upload: Upload, render: F) -> Result<T>
    where
        F: FnOnce(ScanOutcome) -> T,
    {
        let Upload {
            original_name,
            file,
        } = upload;
        let mut scratch = ScratchArtifact::new(file);
        let mut stage = Stage::Received;
        self.report(stage);
        info!(upload = %original_name, "processing upload");

        let result = match self.run(&original_name, &mut scratch, &mut stage).await {
            Ok(outcome) => {
                let rendered = render(outcome);
                self.advance(&mut stage, Stage::Rendered);
                Ok(rendered)
            }
            Err(e) => {
                error!(upload = %original_name, stage = %stage, error = %e, "upload processing failed");
                self.report(Stage::Failed);
                Err(e)
            }
        };

        self.cleanup(scratch).await;
        self.report(Stage::CleanedUp);
        result
    }

    async fn run(
        &self,
        original_name: &str,
        scratch: &mut ScratchArtifact,
        stage: &mut Stage,
    ) -> Result<ScanOutcome> {
        let started = Instant::now();

        self.validate_upload_name(original_name)?;
        self.advance(stage, Stage::Validated);

        self.ensure_running()?;
        let source = scratch
            .upload_path()
            .map(Path::to_path_buf)
            .ok_or_else(|| FollowbackError::InvalidInput {
                reason: "no file was uploaded".to_string(),
            })?;
        let root = scratch.create_extraction_root(&self.uploads_dir)?;
        let unpacked = self.unpack(source, root.clone()).await?;
        info!(
            scratch = %root.display(),
            files = unpacked.files_written,
            bytes = unpacked.bytes_written,
            "archive unpacked"
        );
        self.advance(stage, Stage::Unpacked);

        self.ensure_running()?;
        let documents = self.locate(root).await?;
        self.advance(stage, Stage::Located);

        self.ensure_running()?;
        let following = self
            .read_members(Role::Following, std::slice::from_ref(&documents.following))
            .await?;
        let followers = self
            .read_members(Role::Followers, &documents.followers)
            .await?;
        info!(
            following = following.len(),
            followers = followers.len(),
            follower_pages = documents.followers.len(),
            "account lists extracted"
        );
        self.advance(stage, Stage::Extracted);

        let accounts = diff(&following, &followers);
        self.advance(stage, Stage::Diffed);

        let mut summary = ScanSummary {
            following: following.len(),
            followers: followers.len(),
            follower_pages: documents.followers.len(),
            unpacked_files: unpacked.files_written,
            unpacked_bytes: unpacked.bytes_written,
            elapsed_ms: 0,
        };

        if accounts.is_empty() {
            summary.elapsed_ms = elapsed_ms(started);
            info!("every followed account follows back");
            return Ok(ScanOutcome::AllFollowBack { summary });
        }

        self.ensure_running()?;
        let artifact = self.store.persist(&accounts).await?;
        info!(
            artifact = %artifact.file_name,
            accounts = accounts.len(),
            "result list saved"
        );
        self.advance(stage, Stage::Persisted);

        summary.elapsed_ms = elapsed_ms(started);
        Ok(ScanOutcome::NotFollowingBack {
            summary,
            accounts,
            artifact,
        })
    }

    fn validate_upload_name(&self, original_name: &str) -> Result<()> {
        let expected = self.archive.expected_extension.trim_start_matches('.');
        let accepted = Path::new(original_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(expected))
            .unwrap_or(false);

        if accepted {
            Ok(())
        } else {
            Err(FollowbackError::InvalidInput {
                reason: format!("expected a .{} file", expected),
            })
        }
    }

    async fn unpack(&self, source: PathBuf, root: PathBuf) -> Result<UnpackReport> {
        let limit = self.archive.max_unpacked_bytes;

        task::spawn_blocking(move || {
            ZipUnpacker::new()
                .with_max_unpacked_bytes(limit)
                .unpack(&source, &root)
        })
        .await
        .map_err(|e| FollowbackError::Extraction {
            message: format!("unpack task failed: {}", e),
        })?
    }

    async fn locate(&self, root: PathBuf) -> Result<LocatedDocuments> {
        let locator = Arc::clone(&self.locator);

        let documents = task::spawn_blocking(move || locator.locate(&root))
            .await
            .map_err(|e| FollowbackError::Io(e.into()))??;

        debug!(
            following = %documents.following.display_path(),
            follower_pages = documents.followers.len(),
            bytes = documents.total_bytes(),
            "export documents located"
        );
        Ok(documents)
    }

    async fn read_members(&self, role: Role, documents: &[ExportDocument]) -> Result<MembershipSet> {
        let mut members = HashSet::new();

        for document in documents {
            let bytes = fs::read(&document.source_path).await?;
            let found = self.extractor.extract(&String::from_utf8_lossy(&bytes));
            debug!(
                role = %role,
                document = %document.display_path(),
                identifiers = found.len(),
                "document scanned"
            );
            members.extend(found);
        }

        Ok(MembershipSet::new(role, members))
    }

    async fn cleanup(&self, scratch: ScratchArtifact) {
        match task::spawn_blocking(move || scratch.cleanup()).await {
            Ok(report) => debug!(
                upload_removed = report.upload_removed,
                scratch_removed = report.extraction_root_removed,
                "upload cleaned up"
            ),
            Err(e) => warn!(error = %e, "cleanup task failed"),
        }
    }

    fn advance(&self, stage: &mut Stage, next: Stage) {
        debug!(from = %stage, to = %next, "stage transition");
        *stage = next;
        self.report(next);
    }

    fn report(&self, stage: Stage) {
        if let Some(ref callback) = self.progress_callback {
            callback(stage);
        }
    }

    fn ensure_running(&self) -> Result<()> {
        if self.is_running() {
            Ok(())
        } else {
            Err(FollowbackError::Cancelled)
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
