use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

fn bin(config_home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("mega-sync-one-way").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home)
        .env_remove("MEGA_SYNC_CONFIG");
    cmd
}

#[test]
fn missing_arguments_exit_2() {
    let tmp = tempfile::tempdir().unwrap();
    bin(tmp.path())
        .arg("/only/local")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn missing_local_dir_fails() {
    let tmp = tempfile::tempdir().unwrap();
    bin(tmp.path())
        .arg(tmp.path().join("absent"))
        .arg("/r")
        .arg("--tool-prefix")
        .arg(tmp.path().join("no-such-tool-"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("local path does not exist"));
}

#[cfg(unix)]
mod fake_tool {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// Install fake `mega-*` scripts; mutating ones append to `calls.log`.
    pub fn install(dir: &Path, listing: Option<&str>) -> (String, PathBuf) {
        let log = dir.join("calls.log");
        let script = |name: &str, body: String| {
            let path = dir.join(format!("mega-{name}"));
            fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        };
        for name in ["mkdir", "put", "rm"] {
            script(name, format!("echo \"{name} $*\" >> \"{}\"\n", log.display()));
        }
        match listing {
            Some(text) => script("ls", format!("cat <<'LISTING'\n{text}\nLISTING\n")),
            None => script("ls", "echo \"Couldn't find folder\" >&2\nexit 53\n".to_string()),
        }
        (format!("{}/mega-", dir.display()), log)
    }
}

#[cfg(unix)]
#[test]
fn dryrun_prints_plan_without_mutating() {
    let tmp = tempfile::tempdir().unwrap();
    let tools = tmp.path().join("tools");
    fs::create_dir_all(&tools).unwrap();
    let local = tmp.path().join("r");
    fs::create_dir_all(local.join("drop")).unwrap();
    fs::write(local.join("keep.txt"), b"k").unwrap();
    fs::write(local.join("drop/x.txt"), b"x").unwrap();

    let listing = "/r:\n----    1       12  05Jan2024 10:15:02 old.txt";
    let (prefix, log) = fake_tool::install(&tools, Some(listing));

    bin(tmp.path())
        .arg(&local)
        .arg("r")
        .args(["--exclude", "drop", "--dryrun", "--tool-prefix", &prefix])
        .assert()
        .success()
        .stdout(predicate::str::contains("Excluding paths:"))
        .stdout(predicate::str::contains("[dry-run] Delete from remote: /r/old.txt"))
        .stdout(predicate::str::contains("[dry-run] Upload "))
        .stdout(predicate::str::contains("keep.txt into /r"));

    assert!(!log.exists(), "dry run invoked a mutating command");
}

#[cfg(unix)]
#[test]
fn sync_uploads_when_remote_missing() {
    let tmp = tempfile::tempdir().unwrap();
    let tools = tmp.path().join("tools");
    fs::create_dir_all(&tools).unwrap();
    let local = tmp.path().join("r");
    fs::create_dir_all(&local).unwrap();
    fs::write(local.join("a.txt"), b"a").unwrap();
    let local = local.canonicalize().unwrap();

    let (prefix, log) = fake_tool::install(&tools, None);

    bin(tmp.path())
        .arg(&local)
        .arg("/r")
        .args(["--tool-prefix", &prefix])
        .assert()
        .success()
        .stdout(predicate::str::contains("Syncing from"));

    let calls = fs::read_to_string(&log).unwrap();
    let calls: Vec<&str> = calls.lines().collect();
    assert_eq!(
        calls,
        vec!["mkdir -p /r".to_string(), format!("put -c {} /", local.display())]
    );
}

#[cfg(unix)]
#[test]
fn json_log_written() {
    let tmp = tempfile::tempdir().unwrap();
    let tools = tmp.path().join("tools");
    fs::create_dir_all(&tools).unwrap();
    let local = tmp.path().join("r");
    fs::create_dir_all(&local).unwrap();
    fs::write(local.join("a.txt"), b"a").unwrap();
    let (prefix, _log) = fake_tool::install(&tools, None);
    let action_log = tmp.path().join("actions.jsonl");

    bin(tmp.path())
        .arg(&local)
        .arg("/r")
        .args(["--tool-prefix", &prefix, "--log-format", "json"])
        .arg("--log-file")
        .arg(&action_log)
        .assert()
        .success();

    let text = fs::read_to_string(&action_log).unwrap();
    let events: Vec<serde_json::Value> = text
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    let kinds: Vec<&str> = events.iter().map(|e| e["event"].as_str().unwrap()).collect();
    assert_eq!(kinds, vec!["start", "upload", "done"]);
}
