//! POSIX paths on the remote side
//!
//! Remote paths are always absolute, `/`-separated and free of `.`
//! components, duplicate separators and trailing slashes. Local paths are
//! mapped onto them by re-rooting the part below the local root.

use std::fmt;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RemotePath(String);

impl RemotePath {
    /// The remote filesystem root.
    pub fn root() -> Self {
        RemotePath("/".to_string())
    }

    /// Normalize a user- or tool-supplied remote path to absolute form.
    ///
    /// `backup/docs` becomes `/backup/docs`, `//a/./b/` becomes `/a/b`.
    pub fn normalize(raw: &str) -> Self {
        let parts: Vec<&str> = raw
            .split('/')
            .filter(|p| !p.is_empty() && *p != ".")
            .collect();
        if parts.is_empty() {
            return Self::root();
        }
        RemotePath(format!("/{}", parts.join("/")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Append one or more `/`-separated components.
    pub fn join(&self, name: &str) -> Self {
        if self.is_root() {
            Self::normalize(name)
        } else {
            Self::normalize(&format!("{}/{}", self.0, name))
        }
    }

    /// Parent directory; the root is its own parent.
    pub fn parent(&self) -> Self {
        match self.0.rfind('/') {
            Some(0) | None => Self::root(),
            Some(idx) => RemotePath(self.0[..idx].to_string()),
        }
    }

    /// Strict, component-aware ancestry: `/r/a` is an ancestor of `/r/a/b`
    /// but not of `/r/ab` nor of itself.
    pub fn is_ancestor_of(&self, other: &RemotePath) -> bool {
        if self.0 == other.0 {
            return false;
        }
        if self.is_root() {
            return true;
        }
        other
            .0
            .strip_prefix(self.0.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Strict ancestors, nearest first, ending with `/`.
    pub fn ancestors(&self) -> impl Iterator<Item = RemotePath> {
        let mut next = (!self.is_root()).then(|| self.parent());
        std::iter::from_fn(move || {
            let current = next.take()?;
            if !current.is_root() {
                next = Some(current.parent());
            }
            Some(current)
        })
    }

    /// Components of `self` below `root`, or `None` when `self` lies outside it.
    pub fn strip_root(&self, root: &RemotePath) -> Option<Vec<&str>> {
        if self == root {
            return Some(Vec::new());
        }
        if !root.is_ancestor_of(self) {
            return None;
        }
        let rest = if root.is_root() {
            &self.0[1..]
        } else {
            &self.0[root.0.len() + 1..]
        };
        Some(rest.split('/').collect())
    }

    /// Map this remote path to the local path with the same position below
    /// `local_root`.
    pub fn to_local(&self, remote_root: &RemotePath, local_root: &Path) -> Option<PathBuf> {
        let parts = self.strip_root(remote_root)?;
        let mut local = local_root.to_path_buf();
        for part in parts {
            local.push(part);
        }
        Some(local)
    }

    /// Map a local path below `local_root` to its position below `remote_root`.
    ///
    /// `None` when `local` is outside `local_root` or a component below it is
    /// not valid UTF-8.
    pub fn from_local(local_root: &Path, remote_root: &RemotePath, local: &Path) -> Option<Self> {
        let rel = local.strip_prefix(local_root).ok()?;
        let mut remote = remote_root.clone();
        for component in rel.components() {
            match component {
                Component::Normal(name) => remote = remote.join(name.to_str()?),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(remote)
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RemotePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
