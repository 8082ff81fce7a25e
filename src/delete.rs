//! Deletion planning
//!
//! Every remote entry is mapped onto the local tree. Entries whose local
//! counterpart is missing, or exists with the other kind, are deleted. The
//! plan never lists a path below one that is already being deleted, because
//! `rm -rf` on the ancestor removes it and a second call would fail.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::listing::RemoteEntry;
use crate::remote_path::RemotePath;

/// How deletion candidates are collapsed under already planned ancestors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CollapseMode {
    /// Assume every directory is listed before anything below it, which the
    /// remote tool guarantees. A candidate is dropped when one of its
    /// ancestors was already accepted.
    #[default]
    PreOrder,
    /// Make no ordering assumption: additionally, accepting a directory
    /// removes any of its descendants accepted earlier.
    FullAncestry,
}

/// Whether the local counterpart of a remote entry is missing.
fn missing_locally(local: &Path, is_directory: bool) -> bool {
    if is_directory {
        !local.is_dir()
    } else {
        !local.is_file()
    }
}

/// Compute the remote paths to delete, in the order they should be removed.
///
/// Entries that cannot be re-rooted under `remote_root` are ignored.
pub fn plan_deletions(
    local_root: &Path,
    remote_root: &RemotePath,
    entries: &[RemoteEntry],
    mode: CollapseMode,
) -> Vec<RemotePath> {
    let mut planned: Vec<RemotePath> = Vec::new();
    let mut accepted: HashSet<RemotePath> = HashSet::new();

    for entry in entries {
        // Directories appear both in their parent's block and as their own
        // context line.
        if accepted.contains(&entry.path) {
            continue;
        }
        if entry.path.ancestors().any(|a| accepted.contains(&a)) {
            continue;
        }

        let Some(local) = entry.path.to_local(remote_root, local_root) else {
            continue;
        };
        if !missing_locally(&local, entry.is_directory) {
            continue;
        }

        if mode == CollapseMode::FullAncestry {
            let before = planned.len();
            planned.retain(|p| !entry.path.is_ancestor_of(p));
            if planned.len() != before {
                accepted.retain(|p| !entry.path.is_ancestor_of(p));
            }
        }
        accepted.insert(entry.path.clone());
        planned.push(entry.path.clone());
    }

    planned
}
