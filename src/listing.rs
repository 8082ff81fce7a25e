//! Parser for `ls -R -l` output of the remote tool
//!
//! The recursive long listing is a sequence of directory context lines
//! (`/backup/docs:`) each followed by one line per child:
//!
//! ```text
//! /backup/docs:
//! FLAGS VERS   SIZE  DATE      NAME
//! d---    -       -  05Jan2024 10:15:02 photos
//! ----    1    1024  05Jan2024 10:15:02 notes.txt
//! ```
//!
//! Entries are emitted in listing order, which for the remote tool is a
//! pre-order depth-first walk of the tree.

use regex::Regex;

use crate::remote_path::RemotePath;

/// Compiled line patterns for the remote listing format.
///
/// Built once at startup and handed to every parser.
#[derive(Debug, Clone)]
pub struct ListingPatterns {
    dir_context: Regex,
    entry: Regex,
}

impl ListingPatterns {
    pub fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            dir_context: Regex::new(r"^(.+):$")?,
            entry: Regex::new(
                r"^(.{4})\s+([\-0-9]+)\s+([\-0-9]+)\s+(\d\d\w\w\w\d\d\d\d)\s+(\d\d:\d\d:\d\d)\s+(.+)$",
            )?,
        })
    }
}

/// One remote file or directory seen in the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub path: RemotePath,
    pub is_directory: bool,
}

impl RemoteEntry {
    pub fn dir(path: &str) -> Self {
        Self {
            path: RemotePath::normalize(path),
            is_directory: true,
        }
    }

    pub fn file(path: &str) -> Self {
        Self {
            path: RemotePath::normalize(path),
            is_directory: false,
        }
    }
}

/// Line-at-a-time parser tracking the current directory context.
pub struct ListingParser<'a> {
    patterns: &'a ListingPatterns,
    current_dir: RemotePath,
}

impl<'a> ListingParser<'a> {
    /// `listed_root` is the directory passed to the listing command; it is
    /// the context for entry lines that precede the first context line.
    pub fn new(patterns: &'a ListingPatterns, listed_root: RemotePath) -> Self {
        Self {
            patterns,
            current_dir: listed_root,
        }
    }

    pub fn current_dir(&self) -> &RemotePath {
        &self.current_dir
    }

    /// Feed one line; returns the entry it describes, if any.
    pub fn feed_line(&mut self, line: &str) -> Option<RemoteEntry> {
        let line = line.trim_end_matches('\r');

        // Entry lines first: a name may legitimately end with ':'
        if let Some(caps) = self.patterns.entry.captures(line) {
            let is_directory = caps[1].starts_with('d');
            let name = &caps[6];
            return Some(RemoteEntry {
                path: self.current_dir.join(name),
                is_directory,
            });
        }

        if let Some(caps) = self.patterns.dir_context.captures(line) {
            self.current_dir = RemotePath::normalize(&caps[1]);
            return Some(RemoteEntry {
                path: self.current_dir.clone(),
                is_directory: true,
            });
        }

        None
    }
}

/// Parse a complete listing into entries, in listing order.
pub fn parse_listing(
    patterns: &ListingPatterns,
    listed_root: &RemotePath,
    text: &str,
) -> Vec<RemoteEntry> {
    let mut parser = ListingParser::new(patterns, listed_root.clone());
    text.lines().filter_map(|line| parser.feed_line(line)).collect()
}
