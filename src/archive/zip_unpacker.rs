use crate::error::{FollowbackError, Result};
use std::fs;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use zip::ZipArchive;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnpackReport {
    pub files_written: usize,
    pub directories_created: usize,
    pub bytes_written: u64,
}

/// Streams every entry of a zip archive into a destination directory.
///
/// Entry names that are absolute or climb out with `..` fail the whole
/// archive; nothing is ever written outside the destination.
pub struct ZipUnpacker {
    buffer_size: usize,
    max_unpacked_bytes: u64,
}

impl ZipUnpacker {
    pub fn new() -> Self {
        Self {
            buffer_size: 64 * 1024, // 64KB buffer
            max_unpacked_bytes: u64::MAX,
        }
    }

    pub fn with_max_unpacked_bytes(mut self, limit: u64) -> Self {
        self.max_unpacked_bytes = limit;
        self
    }

    pub fn unpack(&self, source: &Path, dest_dir: &Path) -> Result<UnpackReport> {
        fs::create_dir_all(dest_dir).map_err(|e| FollowbackError::Extraction {
            message: format!("cannot create {}: {}", dest_dir.display(), e),
        })?;

        let file = fs::File::open(source).map_err(|e| FollowbackError::Extraction {
            message: format!("cannot open uploaded archive: {}", e),
        })?;
        let mut archive = ZipArchive::new(BufReader::new(file))?;

        let mut report = UnpackReport::default();

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            let relative = validate_entry_path(entry.name())?;

            // Second opinion from the zip crate's own containment check.
            if entry.enclosed_name().is_none() {
                return Err(FollowbackError::UnsafeEntryPath {
                    entry: entry.name().to_string(),
                });
            }

            let dest_path = dest_dir.join(&relative);

            if entry.is_dir() {
                fs::create_dir_all(&dest_path).map_err(|e| write_failure(&relative, e))?;
                report.directories_created += 1;
                continue;
            }

            if let Some(parent) = dest_path.parent() {
                fs::create_dir_all(parent).map_err(|e| write_failure(&relative, e))?;
            }

            let remaining = self.max_unpacked_bytes - report.bytes_written;
            let written = self
                .write_entry(&mut entry, &dest_path, remaining)
                .map_err(|e| write_failure(&relative, e))?;

            if written > remaining {
                return Err(FollowbackError::Extraction {
                    message: format!(
                        "archive expands beyond the {} byte limit",
                        self.max_unpacked_bytes
                    ),
                });
            }

            report.files_written += 1;
            report.bytes_written += written;
            debug!(entry = %relative.display(), bytes = written, "unpacked entry");
        }

        Ok(report)
    }

    /// Copies at most `limit + 1` bytes so an oversized entry is detectable
    /// without draining it.
    fn write_entry<R: Read>(&self, entry: &mut R, dest: &Path, limit: u64) -> io::Result<u64> {
        let dest_file = fs::File::create(dest)?;
        let mut writer = BufWriter::with_capacity(self.buffer_size, dest_file);
        let written = io::copy(&mut entry.take(limit.saturating_add(1)), &mut writer)?;
        writer.flush()?;
        Ok(written)
    }
}

impl Default for ZipUnpacker {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns the entry name as a relative path, or fails if it is absolute or
/// contains a parent-directory component.
pub fn validate_entry_path(name: &str) -> Result<PathBuf> {
    let unsafe_path = || FollowbackError::UnsafeEntryPath {
        entry: name.to_string(),
    };

    if name.contains('\0') {
        return Err(unsafe_path());
    }

    let mut relative = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(unsafe_path())
            }
        }
    }

    if relative.as_os_str().is_empty() {
        return Err(unsafe_path());
    }

    Ok(relative)
}

fn write_failure(relative: &Path, error: io::Error) -> FollowbackError {
    FollowbackError::Extraction {
        message: format!("failed to write {}: {}", relative.display(), error),
    }
}
