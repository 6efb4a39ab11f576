use crate::diff::DiffResult;
use crate::error::{FollowbackError, Result};
use crate::extractor::Identifier;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::warn;

pub const ARTIFACT_PREFIX: &str = "resultado-";
pub const RESULTS_ROUTE: &str = "/results";

const MAX_NAME_ATTEMPTS: u32 = 64;

/// A persisted, downloadable copy of one [`DiffResult`].
#[derive(Debug, Clone, Serialize)]
pub struct ResultArtifact {
    pub file_name: String,
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
    pub accounts: usize,
}

impl ResultArtifact {
    /// Path under which the HTTP server exposes the file.
    pub fn public_url(&self) -> String {
        format!("{}/{}", RESULTS_ROUTE, self.file_name)
    }
}

/// Append-only store of result artifacts. Concurrent writers never share a
/// file name: names are claimed with create-new semantics.
#[derive(Debug, Clone)]
pub struct ResultStore {
    results_dir: PathBuf,
}

impl ResultStore {
    pub fn new<P: Into<PathBuf>>(results_dir: P) -> Self {
        Self {
            results_dir: results_dir.into(),
        }
    }

    pub fn initialize(&self) -> Result<()> {
        std::fs::create_dir_all(&self.results_dir).map_err(|e| FollowbackError::Persistence {
            path: self.results_dir.display().to_string(),
            source: e,
        })
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    pub async fn persist(&self, result: &DiffResult) -> Result<ResultArtifact> {
        let contents = render_artifact(result);
        let created_at = Utc::now();
        let mut stamp = created_at.timestamp_millis();

        for _ in 0..MAX_NAME_ATTEMPTS {
            let file_name = format!("{}{}.txt", ARTIFACT_PREFIX, stamp);
            let path = self.results_dir.join(&file_name);

            let mut file = match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    stamp += 1;
                    continue;
                }
                Err(e) => return Err(persistence_error(&path, e)),
            };

            let written = async {
                file.write_all(contents.as_bytes()).await?;
                file.sync_all().await
            }
            .await;

            if let Err(e) = written {
                if let Err(remove_err) = fs::remove_file(&path).await {
                    warn!(path = %path.display(), error = %remove_err, "failed to remove partial result file");
                }
                return Err(persistence_error(&path, e));
            }

            return Ok(ResultArtifact {
                file_name,
                path,
                created_at,
                accounts: result.len(),
            });
        }

        Err(persistence_error(
            &self.results_dir,
            io::Error::new(
                io::ErrorKind::AlreadyExists,
                "no free result file name after repeated attempts",
            ),
        ))
    }

    pub async fn load<P: AsRef<Path>>(&self, path: P) -> Result<DiffResult> {
        let contents = fs::read_to_string(path.as_ref()).await?;
        Ok(parse_artifact(&contents))
    }
}

/// One `@identifier` per line, no trailing newline.
pub fn render_artifact(result: &DiffResult) -> String {
    result
        .iter()
        .map(|id| format!("@{}", id))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn parse_artifact(contents: &str) -> DiffResult {
    contents
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix('@'))
        .filter_map(Identifier::parse)
        .collect()
}

fn persistence_error(path: &Path, source: io::Error) -> FollowbackError {
    FollowbackError::Persistence {
        path: path.display().to_string(),
        source,
    }
}
