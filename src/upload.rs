//! Upload unit planning
//!
//! An upload unit is a local path handed to the remote tool in a single
//! `put` call. A directory is uploaded whole unless an exclusion lies inside
//! it, in which case it is split into its children, recursively, along the
//! path towards each exclusion. Every other subtree stays one unit.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::fs_enum::{list_children, ExcludedPathSet};

/// Compute the upload units for `dir` given the exclusions that apply to it.
///
/// No returned unit is an excluded path or lies below one, and no unit lies
/// below another unit.
pub fn plan_uploads(dir: &Path, excluded: &ExcludedPathSet) -> Result<Vec<PathBuf>> {
    let inside = excluded.within(dir);
    if inside.is_empty() {
        return Ok(vec![dir.to_path_buf()]);
    }

    let mut found_exclude = false;
    let mut units = Vec::new();

    for child in list_children(dir)? {
        if inside.contains(&child.path) {
            found_exclude = true;
            continue;
        }

        let below_child = inside.within(&child.path);
        if below_child.is_empty() {
            units.push(child.path);
            continue;
        }

        let split = plan_uploads(&child.path, &below_child)?;
        if split.len() != 1 || split[0] != child.path {
            found_exclude = true;
        }
        units.extend(split);
    }

    if found_exclude {
        Ok(units)
    } else {
        // Exclusions resolved to paths that no longer exist
        Ok(vec![dir.to_path_buf()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs_enum::resolve_excludes;
    use std::collections::BTreeSet;
    use std::fs;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"x").unwrap();
    }

    fn plan(root: &Path, patterns: &[&str]) -> BTreeSet<PathBuf> {
        let patterns: Vec<String> = patterns.iter().map(|s| s.to_string()).collect();
        let excluded = resolve_excludes(root, &patterns).unwrap();
        plan_uploads(root, &excluded).unwrap().into_iter().collect()
    }

    fn set(paths: &[PathBuf]) -> BTreeSet<PathBuf> {
        paths.iter().cloned().collect()
    }

    #[test]
    fn test_no_excludes_uploads_root_whole() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("a/b/c.txt"));
        touch(&tmp.path().join("d.txt"));

        let units = plan_uploads(tmp.path(), &ExcludedPathSet::new()).unwrap();
        assert_eq!(units, vec![tmp.path().to_path_buf()]);
    }

    #[test]
    fn test_unmatched_pattern_same_as_no_excludes() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("a/b/c.txt"));

        assert_eq!(plan(tmp.path(), &["zzz", "*.nothing"]), set(&[tmp.path().to_path_buf()]));
    }

    #[test]
    fn test_excluded_directory_dropped() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        touch(&root.join("keep.txt"));
        touch(&root.join("drop/x.txt"));
        touch(&root.join("drop/y.txt"));

        assert_eq!(plan(root, &["drop"]), set(&[root.join("keep.txt")]));
    }

    #[test]
    fn test_nested_exclude_splits_parent() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        touch(&root.join("a/1.txt"));
        touch(&root.join("a/2.txt"));
        touch(&root.join("b.txt"));

        assert_eq!(
            plan(root, &["a/1.txt"]),
            set(&[root.join("a/2.txt"), root.join("b.txt")])
        );
    }

    #[test]
    fn test_untouched_siblings_stay_whole() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        touch(&root.join("big/deep/tree/file.txt"));
        touch(&root.join("big/other.txt"));
        touch(&root.join("src/a/cache/blob"));
        touch(&root.join("src/a/main.rs"));
        touch(&root.join("src/b/lib.rs"));

        assert_eq!(
            plan(root, &["src/a/cache"]),
            set(&[root.join("big"), root.join("src/a/main.rs"), root.join("src/b")])
        );
    }

    #[test]
    fn test_units_never_cover_excluded_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        touch(&root.join("x/keep.txt"));
        touch(&root.join("x/skip.tmp"));
        touch(&root.join("y/z/skip.tmp"));
        touch(&root.join("y/z/keep.txt"));

        let patterns = vec!["**/*.tmp".to_string()];
        let excluded = resolve_excludes(root, &patterns).unwrap();
        let units = plan_uploads(root, &excluded).unwrap();

        for unit in &units {
            for ex in excluded.iter() {
                assert!(!ex.starts_with(unit), "{} covers excluded {}", unit.display(), ex.display());
            }
        }
        for (i, a) in units.iter().enumerate() {
            for (j, b) in units.iter().enumerate() {
                if i != j {
                    assert!(!b.starts_with(a), "{} nested in {}", b.display(), a.display());
                }
            }
        }
        assert_eq!(
            units.into_iter().collect::<BTreeSet<_>>(),
            set(&[root.join("x/keep.txt"), root.join("y/z/keep.txt")])
        );
    }

    #[test]
    fn test_everything_excluded_yields_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        touch(&root.join("a.txt"));
        touch(&root.join("b/c.txt"));

        assert!(plan(root, &["*"]).is_empty());
    }

    #[test]
    fn test_stale_exclusion_keeps_dir_whole() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        touch(&root.join("a/1.txt"));

        let excluded: ExcludedPathSet = vec![root.join("a/gone.txt")].into_iter().collect();
        assert_eq!(plan_uploads(root, &excluded).unwrap(), vec![root.to_path_buf()]);
    }
}
