//! One-way sync orchestration
//!
//! A run is strictly sequential: resolve exclusions, make sure the remote
//! root exists, list it, delete what has no local counterpart, then upload.
//! Bad local input is reported before the remote is touched. Deletions finish
//! before any upload starts so that a path whose kind changed locally is
//! removed first and re-uploaded with the new kind.
//!
//! The remote listing is a snapshot taken once per run. Changes made to the
//! remote tree by someone else between the listing and the delete/upload
//! calls are not detected.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::delete::{plan_deletions, CollapseMode};
use crate::error::{Result, SyncError};
use crate::fs_enum::{list_children, resolve_excludes, ExcludedPathSet};
use crate::listing::{parse_listing, ListingPatterns};
use crate::logger::Logger;
use crate::remote::RemoteTool;
use crate::remote_path::RemotePath;
use crate::upload::plan_uploads;

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub excludes: Vec<String>,
    pub dry_run: bool,
    pub collapse: CollapseMode,
    pub verbose: bool,
}

/// A local path uploaded in one call, and where it goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedUpload {
    pub local: PathBuf,
    pub remote_parent: RemotePath,
}

/// Everything a run will do, computed before any mutating call.
#[derive(Debug, Clone)]
pub struct SyncPlan {
    pub local_root: PathBuf,
    pub remote_root: RemotePath,
    pub excluded: ExcludedPathSet,
    pub deletions: Vec<RemotePath>,
    pub uploads: Vec<PlannedUpload>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub deleted: u64,
    pub uploaded: u64,
    pub excluded: u64,
    pub seconds: f64,
    pub dry_run: bool,
}

/// Resolve the local root to an absolute path to an existing directory.
pub fn resolve_local_root(raw: &Path) -> Result<PathBuf> {
    let root = raw.canonicalize().map_err(|e| match e.kind() {
        ErrorKind::NotFound => SyncError::LocalPathNotFound {
            path: raw.to_path_buf(),
        },
        _ => SyncError::io(raw, e),
    })?;
    if !root.is_dir() {
        return Err(SyncError::NotADirectory { path: root });
    }
    Ok(root)
}

/// Remote directory that receives `local` when uploaded.
pub fn remote_parent_for(local_root: &Path, remote_root: &RemotePath, local: &Path) -> Result<RemotePath> {
    RemotePath::from_local(local_root, remote_root, local)
        .map(|remote| remote.parent())
        .ok_or_else(|| SyncError::NonUtf8Path {
            path: local.to_path_buf(),
        })
}

fn same_name(local_root: &Path, remote_root: &RemotePath) -> bool {
    match local_root.file_name() {
        Some(name) => remote_root.as_str().rsplit('/').next() == Some(&*name.to_string_lossy()),
        None => false,
    }
}

pub struct Syncer<'a> {
    tool: &'a dyn RemoteTool,
    patterns: &'a ListingPatterns,
    logger: &'a dyn Logger,
    options: SyncOptions,
}

impl<'a> Syncer<'a> {
    pub fn new(
        tool: &'a dyn RemoteTool,
        patterns: &'a ListingPatterns,
        logger: &'a dyn Logger,
        options: SyncOptions,
    ) -> Self {
        Self {
            tool,
            patterns,
            logger,
            options,
        }
    }

    fn tag(&self) -> &'static str {
        if self.options.dry_run {
            "[dry-run] "
        } else {
            ""
        }
    }

    /// Compute the plan for an already resolved local root. Only the
    /// remote listing is read.
    pub fn plan(&self, local_root: &Path, remote_root: &RemotePath) -> Result<SyncPlan> {
        let excluded = resolve_excludes(local_root, &self.options.excludes)?;
        self.plan_with(local_root, remote_root, excluded)
    }

    fn plan_with(
        &self,
        local_root: &Path,
        remote_root: &RemotePath,
        excluded: ExcludedPathSet,
    ) -> Result<SyncPlan> {
        let listing = self.tool.list_recursive(remote_root)?;
        let entries = parse_listing(self.patterns, remote_root, &listing);
        if self.options.verbose {
            println!("Remote listing: {} entries", entries.len());
        }

        let deletions = plan_deletions(local_root, remote_root, &entries, self.options.collapse);

        let mut units = plan_uploads(local_root, &excluded)?;
        if units.len() == 1 && units[0].as_path() == local_root && !same_name(local_root, remote_root) {
            // `put` of the root into the remote parent would land under the
            // local directory's name, so push its children instead
            units = list_children(local_root)?.into_iter().map(|c| c.path).collect();
        }

        let uploads = units
            .into_iter()
            .map(|local| {
                Ok(PlannedUpload {
                    remote_parent: remote_parent_for(local_root, remote_root, &local)?,
                    local,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(SyncPlan {
            local_root: local_root.to_path_buf(),
            remote_root: remote_root.clone(),
            excluded,
            deletions,
            uploads,
        })
    }

    /// Report the plan and, unless dry-run, carry it out. The first failing
    /// remote call aborts the rest of the plan.
    pub fn execute(&self, plan: &SyncPlan) -> Result<(u64, u64)> {
        let dry_run = self.options.dry_run;
        let mut deleted = 0u64;
        let mut uploaded = 0u64;

        for path in &plan.deletions {
            println!("{}Delete from remote: {}", self.tag(), path);
            self.logger.delete(path, dry_run);
            if !dry_run {
                if let Err(e) = self.tool.remove(path) {
                    self.logger.error("delete", &e.to_string());
                    return Err(e);
                }
            }
            deleted += 1;
        }

        for upload in &plan.uploads {
            println!(
                "{}Upload {} into {}",
                self.tag(),
                upload.local.display(),
                upload.remote_parent
            );
            self.logger.upload(&upload.local, &upload.remote_parent, dry_run);
            if !dry_run {
                if let Err(e) = self.tool.put(&upload.local, &upload.remote_parent) {
                    self.logger.error("upload", &e.to_string());
                    return Err(e);
                }
            }
            uploaded += 1;
        }

        Ok((deleted, uploaded))
    }

    /// Full run: resolve roots and exclusions, ensure the remote root, plan,
    /// execute.
    pub fn run(&self, local: &Path, remote: &str) -> Result<SyncReport> {
        let start = Instant::now();
        let dry_run = self.options.dry_run;

        let local_root = resolve_local_root(local)?;
        let remote_root = RemotePath::normalize(remote);
        println!("{}Syncing from {} to {}", self.tag(), local_root.display(), remote_root);
        self.logger.start(&local_root, &remote_root, dry_run);

        let excluded = match resolve_excludes(&local_root, &self.options.excludes) {
            Ok(excluded) => excluded,
            Err(e) => {
                self.logger.error("exclude", &e.to_string());
                return Err(e);
            }
        };
        println!("Excluding paths:");
        for path in excluded.iter() {
            println!("- {}", path.display());
            self.logger.exclude(path);
        }

        if !dry_run {
            self.tool.mkdir_p(&remote_root)?;
        }

        let plan = match self.plan_with(&local_root, &remote_root, excluded) {
            Ok(plan) => plan,
            Err(e) => {
                self.logger.error("plan", &e.to_string());
                return Err(e);
            }
        };

        if self.options.verbose {
            println!(
                "Planned {} deletions and {} uploads",
                plan.deletions.len(),
                plan.uploads.len()
            );
        }

        let (deleted, uploaded) = self.execute(&plan)?;
        let seconds = start.elapsed().as_secs_f64();
        self.logger.done(deleted, uploaded, seconds);
        if self.options.verbose {
            println!("Done: {deleted} deleted, {uploaded} uploaded in {seconds:.2}s");
        }

        Ok(SyncReport {
            deleted,
            uploaded,
            excluded: plan.excluded.len() as u64,
            seconds,
            dry_run,
        })
    }
}
