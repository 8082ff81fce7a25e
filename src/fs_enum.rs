// Local filesystem enumeration and exclude resolution

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::error::{Result, SyncError};

/// Direct child of a local directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub is_directory: bool,
}

/// List the direct children of `dir`, sorted by name.
///
/// Symlinks are reported as non-directories; they are uploaded as they are
/// and never descended into.
pub fn list_children(dir: &Path) -> Result<Vec<FileEntry>> {
    let read = fs::read_dir(dir).map_err(|e| SyncError::io(dir, e))?;
    let mut entries = Vec::new();
    for entry in read {
        let entry = entry.map_err(|e| SyncError::io(dir, e))?;
        let file_type = entry.file_type().map_err(|e| SyncError::io(entry.path(), e))?;
        entries.push(FileEntry {
            path: entry.path(),
            is_directory: file_type.is_dir(),
        });
    }
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

/// Concrete local paths protected from upload.
///
/// Membership is by exact path; patterns are never re-evaluated once resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExcludedPathSet {
    paths: BTreeSet<PathBuf>,
}

impl ExcludedPathSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: PathBuf) {
        self.paths.insert(path);
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }

    /// The subset lying strictly below `dir`.
    pub fn within(&self, dir: &Path) -> ExcludedPathSet {
        self.paths
            .iter()
            .filter(|p| p.as_path() != dir && p.starts_with(dir))
            .cloned()
            .collect()
    }
}

impl FromIterator<PathBuf> for ExcludedPathSet {
    fn from_iter<I: IntoIterator<Item = PathBuf>>(iter: I) -> Self {
        Self {
            paths: iter.into_iter().collect(),
        }
    }
}

/// Compiled exclude globs.
///
/// A pattern ending in `/` only matches directories.
#[derive(Debug, Clone)]
pub struct ExcludeMatcher {
    any: GlobSet,
    dirs_only: GlobSet,
}

impl ExcludeMatcher {
    pub fn is_match(&self, rel: &str, is_directory: bool) -> bool {
        self.any.is_match(rel) || (is_directory && self.dirs_only.is_match(rel))
    }
}

/// Compile exclude globs. `*` and `?` never match across `/`; `**` does.
pub fn compile_excludes(patterns: &[String]) -> Result<ExcludeMatcher> {
    let mut any = GlobSetBuilder::new();
    let mut dirs_only = GlobSetBuilder::new();
    for pattern in patterns {
        let stripped = pattern.trim_start_matches("./");
        let trimmed = stripped.trim_end_matches('/');
        let glob = GlobBuilder::new(trimmed)
            .literal_separator(true)
            .backslash_escape(true)
            .build()
            .map_err(|source| SyncError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
        if trimmed.len() < stripped.len() {
            dirs_only.add(glob);
        } else {
            any.add(glob);
        }
    }
    let build = |builder: GlobSetBuilder| {
        builder.build().map_err(|source| SyncError::InvalidPattern {
            pattern: patterns.join(" "),
            source,
        })
    };
    Ok(ExcludeMatcher {
        any: build(any)?,
        dirs_only: build(dirs_only)?,
    })
}

/// Resolve exclude patterns against the tree under `root`.
///
/// Every path below `root` is matched on its `/`-joined path relative to
/// `root`; the root itself is never excluded. Unreadable entries are skipped.
pub fn resolve_excludes(root: &Path, patterns: &[String]) -> Result<ExcludedPathSet> {
    let mut excluded = ExcludedPathSet::new();
    if patterns.is_empty() {
        return Ok(excluded);
    }
    let matcher = compile_excludes(patterns)?;

    for entry in WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        let rel = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if matcher.is_match(&rel, entry.file_type().is_dir()) {
            excluded.insert(entry.path().to_path_buf());
        }
    }

    Ok(excluded)
}
