use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{Result, SyncError};
use crate::remote_path::RemotePath;

/// Action log written alongside the progress output.
pub trait Logger: Send + Sync {
    fn start(&self, _local: &Path, _remote: &RemotePath, _dry_run: bool) {}
    fn exclude(&self, _path: &Path) {}
    fn delete(&self, _remote: &RemotePath, _dry_run: bool) {}
    fn upload(&self, _local: &Path, _remote_parent: &RemotePath, _dry_run: bool) {}
    fn error(&self, _context: &str, _msg: &str) {}
    fn done(&self, _deleted: u64, _uploaded: u64, _seconds: f64) {}
}

pub struct NoopLogger;
impl Logger for NoopLogger {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

fn open_append(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| SyncError::io(path, e))
}

/// Open the action log for `path` in the requested format.
pub fn open_logger(path: &Path, format: LogFormat) -> Result<Box<dyn Logger>> {
    Ok(match format {
        LogFormat::Text => Box::new(TextLogger::new(path)?),
        LogFormat::Json => Box::new(JsonLogger::new(path)?),
    })
}

pub struct TextLogger {
    file: Mutex<File>,
}

impl TextLogger {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            file: Mutex::new(open_append(path.as_ref())?),
        })
    }

    fn line(&self, s: &str) {
        if let Ok(mut f) = self.file.lock() {
            let _ = writeln!(f, "[{}] {}", Utc::now().to_rfc3339(), s);
        }
    }
}

fn mode(dry_run: bool) -> &'static str {
    if dry_run {
        " dry_run=true"
    } else {
        ""
    }
}

impl Logger for TextLogger {
    fn start(&self, local: &Path, remote: &RemotePath, dry_run: bool) {
        self.line(&format!("START local={} remote={}{}", local.display(), remote, mode(dry_run)));
    }
    fn exclude(&self, path: &Path) {
        self.line(&format!("EXCLUDE path={}", path.display()));
    }
    fn delete(&self, remote: &RemotePath, dry_run: bool) {
        self.line(&format!("DELETE remote={}{}", remote, mode(dry_run)));
    }
    fn upload(&self, local: &Path, remote_parent: &RemotePath, dry_run: bool) {
        self.line(&format!(
            "UPLOAD local={} into={}{}",
            local.display(),
            remote_parent,
            mode(dry_run)
        ));
    }
    fn error(&self, context: &str, msg: &str) {
        self.line(&format!("ERROR ctx={} msg={}", context, msg));
    }
    fn done(&self, deleted: u64, uploaded: u64, seconds: f64) {
        self.line(&format!("DONE deleted={deleted} uploaded={uploaded} seconds={seconds:.3}"));
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    Start {
        local: PathBuf,
        remote: String,
        dry_run: bool,
    },
    Exclude {
        path: PathBuf,
    },
    Delete {
        remote: String,
        dry_run: bool,
    },
    Upload {
        local: PathBuf,
        remote_parent: String,
        dry_run: bool,
    },
    Error {
        context: String,
        message: String,
    },
    Done {
        deleted: u64,
        uploaded: u64,
        seconds: f64,
    },
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LogEntry {
    pub timestamp: String,
    pub sync_job_id: String,
    #[serde(flatten)]
    pub event: LogEvent,
}

/// One JSON object per line, tagged with a per-run job id.
pub struct JsonLogger {
    file: Mutex<File>,
    sync_job_id: String,
}

impl JsonLogger {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            file: Mutex::new(open_append(path.as_ref())?),
            sync_job_id: uuid::Uuid::new_v4().to_string(),
        })
    }

    fn write(&self, event: LogEvent) {
        let entry = LogEntry {
            timestamp: Utc::now().to_rfc3339(),
            sync_job_id: self.sync_job_id.clone(),
            event,
        };
        if let Ok(mut f) = self.file.lock() {
            if serde_json::to_writer(&mut *f, &entry).is_ok() {
                let _ = f.write_all(b"\n");
            }
        }
    }
}

impl Logger for JsonLogger {
    fn start(&self, local: &Path, remote: &RemotePath, dry_run: bool) {
        self.write(LogEvent::Start {
            local: local.to_path_buf(),
            remote: remote.to_string(),
            dry_run,
        });
    }
    fn exclude(&self, path: &Path) {
        self.write(LogEvent::Exclude {
            path: path.to_path_buf(),
        });
    }
    fn delete(&self, remote: &RemotePath, dry_run: bool) {
        self.write(LogEvent::Delete {
            remote: remote.to_string(),
            dry_run,
        });
    }
    fn upload(&self, local: &Path, remote_parent: &RemotePath, dry_run: bool) {
        self.write(LogEvent::Upload {
            local: local.to_path_buf(),
            remote_parent: remote_parent.to_string(),
            dry_run,
        });
    }
    fn error(&self, context: &str, msg: &str) {
        self.write(LogEvent::Error {
            context: context.to_string(),
            message: msg.to_string(),
        });
    }
    fn done(&self, deleted: u64, uploaded: u64, seconds: f64) {
        self.write(LogEvent::Done {
            deleted,
            uploaded,
            seconds,
        });
    }
}
