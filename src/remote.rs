//! Remote tool boundary
//!
//! All remote state is reached through four commands of the megacmd suite
//! (`mega-mkdir`, `mega-ls`, `mega-put`, `mega-rm`). Commands are spawned
//! directly with an argument vector, never through a shell.

use std::ffi::OsString;
use std::io::Read;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{Result, SyncError};
use crate::remote_path::RemotePath;

pub const DEFAULT_TOOL_PREFIX: &str = "mega-";

/// Operations the sync needs from the remote storage tool.
pub trait RemoteTool {
    /// Create `dir` and its parents. Failures (typically "already exists")
    /// are ignored.
    fn mkdir_p(&self, dir: &RemotePath) -> Result<()>;

    /// Recursive long listing of `dir`. A directory that does not exist
    /// yields an empty listing.
    fn list_recursive(&self, dir: &RemotePath) -> Result<String>;

    /// Upload a local file or directory into `remote_parent`.
    fn put(&self, local: &Path, remote_parent: &RemotePath) -> Result<()>;

    /// Recursively delete `path`.
    fn remove(&self, path: &RemotePath) -> Result<()>;
}

/// Captured result of one finished command.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// Human-readable command line, used in logs and errors.
pub fn display_command(program: &str, args: &[OsString]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        let arg = arg.to_string_lossy();
        if arg.contains(' ') {
            line.push('"');
            line.push_str(&arg);
            line.push('"');
        } else {
            line.push_str(&arg);
        }
    }
    line
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

fn lossy(bytes: Vec<u8>) -> String {
    String::from_utf8_lossy(&bytes).trim_end_matches('\n').to_string()
}

/// Run `program` to completion, optionally killing it after `timeout`.
///
/// A non-zero exit is not an error here; callers decide whether it is fatal.
pub fn run_command(program: &str, args: &[OsString], timeout: Option<Duration>) -> Result<CommandOutput> {
    let command_line = || display_command(program, args);

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| SyncError::Spawn {
            command: command_line(),
            source,
        })?;

    // Drain both pipes so a chatty child never blocks on a full buffer
    let out = drain(child.stdout.take());
    let err = drain(child.stderr.take());

    let status = match timeout {
        None => child.wait(),
        Some(limit) => {
            let deadline = Instant::now() + limit;
            loop {
                match child.try_wait() {
                    Ok(Some(status)) => break Ok(status),
                    Ok(None) if Instant::now() >= deadline => {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(SyncError::Timeout {
                            command: command_line(),
                            secs: limit.as_secs(),
                        });
                    }
                    Ok(None) => thread::sleep(Duration::from_millis(50)),
                    Err(e) => break Err(e),
                }
            }
        }
    }
    .map_err(|source| SyncError::Spawn {
        command: command_line(),
        source,
    })?;

    Ok(CommandOutput {
        status,
        stdout: lossy(out.join().unwrap_or_default()),
        stderr: lossy(err.join().unwrap_or_default()),
    })
}

/// The megacmd command-line tools.
#[derive(Debug, Clone)]
pub struct MegaCmd {
    prefix: String,
    timeout: Option<Duration>,
    verbose: bool,
}

impl Default for MegaCmd {
    fn default() -> Self {
        Self::new(DEFAULT_TOOL_PREFIX)
    }
}

impl MegaCmd {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            timeout: None,
            verbose: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn program(&self, sub: &str) -> String {
        format!("{}{}", self.prefix, sub)
    }

    /// Run a subcommand; a non-zero exit is fatal unless `ignore_errors`.
    fn cmd(&self, sub: &str, args: Vec<OsString>, ignore_errors: bool) -> Result<Option<String>> {
        let program = self.program(sub);
        let output = run_command(&program, &args, self.timeout)?;
        if output.status.success() {
            return Ok(Some(output.stdout));
        }

        let code = output.status.code().unwrap_or(-1);
        if ignore_errors {
            if self.verbose {
                eprintln!(
                    "Ignoring failure of {} (code {}): {}",
                    display_command(&program, &args),
                    code,
                    output.stderr
                );
            }
            return Ok(None);
        }
        Err(SyncError::RemoteCommand {
            command: display_command(&program, &args),
            code,
            stderr: output.stderr,
        })
    }
}

impl RemoteTool for MegaCmd {
    fn mkdir_p(&self, dir: &RemotePath) -> Result<()> {
        self.cmd("mkdir", vec!["-p".into(), dir.as_str().into()], true)?;
        Ok(())
    }

    fn list_recursive(&self, dir: &RemotePath) -> Result<String> {
        let listing = self.cmd("ls", vec!["-R".into(), "-l".into(), dir.as_str().into()], true)?;
        Ok(listing.unwrap_or_default())
    }

    fn put(&self, local: &Path, remote_parent: &RemotePath) -> Result<()> {
        self.cmd(
            "put",
            vec!["-c".into(), local.as_os_str().to_owned(), remote_parent.as_str().into()],
            false,
        )?;
        Ok(())
    }

    fn remove(&self, path: &RemotePath) -> Result<()> {
        self.cmd("rm", vec!["-rf".into(), path.as_str().into()], false)?;
        Ok(())
    }
}
