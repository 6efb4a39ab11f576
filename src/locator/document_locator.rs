use crate::config::ArchiveConfig;
use crate::error::{FollowbackError, Result};
use crate::extractor::Role;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct ExportDocument {
    pub role: Role,
    pub source_path: PathBuf,
    pub relative_path: PathBuf,
    pub size: u64,
}

impl ExportDocument {
    fn new(role: Role, root: &Path, relative_path: PathBuf, size: u64) -> Self {
        Self {
            role,
            source_path: root.join(&relative_path),
            relative_path,
            size,
        }
    }

    pub fn display_path(&self) -> String {
        self.relative_path.display().to_string()
    }
}

/// The documents found under one extraction root.
#[derive(Debug, Clone)]
pub struct LocatedDocuments {
    pub following: ExportDocument,
    /// The configured page first, then further pages in ascending page order
    /// when page merging is enabled.
    pub followers: Vec<ExportDocument>,
}

impl LocatedDocuments {
    pub fn total_bytes(&self) -> u64 {
        self.following.size + self.followers.iter().map(|d| d.size).sum::<u64>()
    }
}

pub struct DocumentLocator {
    following_path: PathBuf,
    followers_path: PathBuf,
    page_pattern: Option<Regex>,
}

impl DocumentLocator {
    /// Only `followers_path` is read unless `merge_follower_pages` is set.
    pub fn new(config: &ArchiveConfig) -> Self {
        let page_pattern = if config.merge_follower_pages {
            config
                .followers_path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(page_pattern_for)
        } else {
            None
        };

        Self {
            following_path: config.following_path.clone(),
            followers_path: config.followers_path.clone(),
            page_pattern,
        }
    }

    pub fn locate<P: AsRef<Path>>(&self, root: P) -> Result<LocatedDocuments> {
        let root = root.as_ref();

        let following = self.require(root, Role::Following, &self.following_path)?;
        let primary_followers = self.require(root, Role::Followers, &self.followers_path)?;

        let mut followers = vec![primary_followers];
        followers.extend(self.additional_pages(root)?);

        Ok(LocatedDocuments {
            following,
            followers,
        })
    }

    fn require(&self, root: &Path, role: Role, relative: &Path) -> Result<ExportDocument> {
        let path = root.join(relative);

        match fs::symlink_metadata(&path) {
            Ok(metadata) if metadata.file_type().is_file() => Ok(ExportDocument::new(
                role,
                root,
                relative.to_path_buf(),
                metadata.len(),
            )),
            _ => Err(FollowbackError::MissingData {
                path: relative.display().to_string(),
            }),
        }
    }

    /// Sibling pages such as `followers_2.html`, `followers_3.html`, sorted by
    /// page number. The primary page is excluded.
    fn additional_pages(&self, root: &Path) -> Result<Vec<ExportDocument>> {
        let Some(ref pattern) = self.page_pattern else {
            return Ok(Vec::new());
        };

        let relative_dir = self
            .followers_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let primary_name = self.followers_path.file_name();

        let mut pages: Vec<(u64, ExportDocument)> = Vec::new();

        let walker = WalkDir::new(root.join(&relative_dir))
            .min_depth(1)
            .max_depth(1)
            .follow_links(false);

        for entry in walker {
            let entry = entry.map_err(|e| FollowbackError::Io(e.into()))?;
            if !entry.file_type().is_file() || Some(entry.file_name()) == primary_name {
                continue;
            }

            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            let Some(page) = pattern
                .captures(name)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<u64>().ok())
            else {
                continue;
            };

            let size = entry
                .metadata()
                .map_err(|e| FollowbackError::Io(e.into()))?
                .len();
            pages.push((
                page,
                ExportDocument::new(Role::Followers, root, relative_dir.join(name), size),
            ));
        }

        pages.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then_with(|| a.1.relative_path.cmp(&b.1.relative_path))
        });
        Ok(pages.into_iter().map(|(_, doc)| doc).collect())
    }
}

/// Builds `^<stem>_(\d+)\.<ext>$` from a paginated file name such as
/// `followers_1.html`. Names without a trailing page number are not paginated.
fn page_pattern_for(file_name: &str) -> Option<Regex> {
    let (stem, extension) = file_name.rsplit_once('.')?;
    let (base, number) = stem.rsplit_once('_')?;

    if base.is_empty() || number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    Regex::new(&format!(
        r"^{}_(\d+)\.{}$",
        regex::escape(base),
        regex::escape(extension)
    ))
    .ok()
}
