// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace-level CLI specs.
//!
//! Drives the built `bm` binary against a temp config directory. These
//! cover the config-store surface end to end; daemon behavior is covered
//! by the per-crate tests against the fake RPC client.

use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::TempDir;

struct Project {
    dir: TempDir,
}

struct Run {
    stdout: String,
    stderr: String,
    success: bool,
}

// `bm` lives in a sibling workspace crate, so it isn't covered by the
// `CARGO_BIN_EXE_bm` variable Cargo only sets for a package's own binaries.
// It is still built alongside this test as part of the workspace, so we
// can find it next to this test binary's `deps` directory.
fn bm_exe() -> PathBuf {
    let mut path = std::env::current_exe().expect("current test exe");
    path.pop();
    if path.ends_with("deps") {
        path.pop();
    }
    path.push(if cfg!(windows) { "bm.exe" } else { "bm" });
    path
}

impl Project {
    fn empty() -> Self {
        Self {
            dir: TempDir::new().expect("tempdir"),
        }
    }

    fn run(&self, args: &[&str]) -> Run {
        let output = Command::new(bm_exe())
            .arg("--config-dir")
            .arg(self.dir.path())
            .args(args)
            .output()
            .expect("run bm");
        Run {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            success: output.status.success(),
        }
    }

    fn passes(&self, args: &[&str]) -> Run {
        let run = self.run(args);
        assert!(
            run.success,
            "expected success for {args:?}\nstdout: {}\nstderr: {}",
            run.stdout, run.stderr
        );
        run
    }

    fn fails(&self, args: &[&str]) -> Run {
        let run = self.run(args);
        assert!(
            !run.success,
            "expected failure for {args:?}\nstdout: {}",
            run.stdout
        );
        run
    }

    fn board_json(&self, address: &str) -> serde_json::Value {
        let raw = std::fs::read_to_string(
            self.dir.path().join("boards").join(format!("{address}.json")),
        )
        .expect("board file");
        serde_json::from_str(&raw).expect("board json")
    }
}

impl Run {
    fn stdout_has(&self, needle: &str) -> &Self {
        assert!(
            self.stdout.contains(needle),
            "stdout missing {needle:?}:\n{}",
            self.stdout
        );
        self
    }

    fn stderr_has(&self, needle: &str) -> &Self {
        assert!(
            self.stderr.contains(needle),
            "stderr missing {needle:?}:\n{}",
            self.stderr
        );
        self
    }
}

#[test]
fn help_shows_usage() {
    Project::empty().passes(&["--help"]).stdout_has("Usage:");
}

#[test]
fn board_add_writes_the_config_file() {
    let project = Project::empty();
    project.passes(&["board", "add", "general.eth", "--per-page", "10", "--pages", "3"]);

    let board = project.board_json("general.eth");
    assert_eq!(board["address"], "general.eth");
    assert_eq!(board["perPage"], 10);
    assert_eq!(board["pages"], 3);
    assert!(board.get("bumpLimit").is_none());
}

#[test]
fn board_add_refuses_duplicates() {
    let project = Project::empty();
    project.passes(&["board", "add", "general.eth"]);
    project
        .fails(&["board", "add", "general.eth"])
        .stderr_has("already exists");
}

#[test]
fn board_add_refuses_zero_tunables() {
    Project::empty()
        .fails(&["board", "add", "general.eth", "--per-page", "0"])
        .stderr_has("positive integer");
}

#[test]
fn board_list_shows_declared_boards() {
    let project = Project::empty();
    project.passes(&["board", "add", "general.eth", "--bump-limit", "500"]);
    project.passes(&["board", "add", "random.eth"]);

    project
        .passes(&["board", "list"])
        .stdout_has("ADDRESS")
        .stdout_has("general.eth")
        .stdout_has("500")
        .stdout_has("random.eth");
}

#[test]
fn board_edit_sets_and_resets_fields() {
    let project = Project::empty();
    project.passes(&["board", "add", "general.eth", "--per-page", "10"]);
    project.passes(&["board", "edit", "general.eth", "--pages", "4", "--reset", "perPage"]);

    let board = project.board_json("general.eth");
    assert_eq!(board["pages"], 4);
    assert!(board.get("perPage").is_none());
}

#[test]
fn board_edit_refuses_set_and_reset_conflicts() {
    let project = Project::empty();
    project.passes(&["board", "add", "general.eth"]);
    project
        .fails(&["board", "edit", "general.eth", "--pages", "4", "--reset", "pages"])
        .stderr_has("Cannot set and reset the same field");
}

#[test]
fn board_remove_deletes_the_file() {
    let project = Project::empty();
    project.passes(&["board", "add", "general.eth"]);
    project.passes(&["board", "remove", "general.eth"]);

    assert!(!project
        .dir
        .path()
        .join("boards")
        .join("general.eth.json")
        .exists());
}

#[test]
fn board_remove_unknown_board_fails() {
    Project::empty()
        .fails(&["board", "remove", "ghost"])
        .stderr_has("not found");
}

#[test]
fn defaults_set_writes_the_global_file() {
    let project = Project::empty();
    project.passes(&["defaults", "set", "--bump-limit", "350"]);

    let raw = std::fs::read_to_string(project.dir.path().join("global.json")).unwrap();
    let global: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(global["defaults"]["bumpLimit"], 350);
}

#[test]
fn defaults_reset_prunes_the_record() {
    let project = Project::empty();
    project.passes(&["defaults", "set", "--bump-limit", "350"]);
    project.passes(&["defaults", "set", "--reset", "bumpLimit"]);

    let raw = std::fs::read_to_string(project.dir.path().join("global.json")).unwrap();
    let global: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert!(global.get("defaults").is_none());
}

#[test]
fn start_with_invalid_config_exits_nonzero() {
    let project = Project::empty();
    std::fs::create_dir_all(project.dir.path().join("boards")).unwrap();
    std::fs::write(
        project.dir.path().join("boards").join("bad.json"),
        r#"{"address": "bad", "perPage": 0}"#,
    )
    .unwrap();

    project.fails(&["start"]).stderr_has("perPage");
}
