//! End-to-end tests for the `tacboard` binary against a temporary board.

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Board {
    dir: TempDir,
}

impl Board {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn path(&self) -> PathBuf {
        self.dir.path().join("board.json")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("tacboard").unwrap();
        cmd.env("HOME", self.dir.path())
            .env("TACBOARD_ACTOR", "TC")
            .env_remove("TACBOARD_BOARD")
            .env_remove("RUST_LOG")
            .arg("--board")
            .arg(self.path())
            .arg("--json");
        cmd
    }

    fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self.cmd().args(args).output().unwrap();
        assert!(
            output.status.success(),
            "{args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }

    fn document(&self) -> serde_json::Value {
        read_json(&self.path())
    }
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_missing_board_reports_not_found() {
    let board = Board::new();
    let output = board.cmd().args(["list"]).output().unwrap();

    assert_eq!(output.status.code(), Some(2));
    let err: serde_json::Value = serde_json::from_slice(&output.stderr).unwrap();
    assert_eq!(err["error"]["code"], "BOARD_NOT_FOUND");
}

#[test]
fn test_init_refuses_to_overwrite() {
    let board = Board::new();
    board.json(&["init", "--block-start", "100", "--callsign", "RAVEN 1"]);
    assert_eq!(board.document()["blockStartNum"], 100);

    let output = board
        .cmd()
        .args(["init", "--block-start", "200"])
        .output()
        .unwrap();
    assert!(!output.status.success());

    board.json(&["init", "--block-start", "200", "--force"]);
    assert_eq!(board.document()["blockStartNum"], 200);
}

#[test]
fn test_tacrep_lifecycle() {
    let board = Board::new();
    board.json(&["init", "--block-start", "100"]);

    let added = board.json(&["add", "golf", "--course", "090", "--speed", "12"]);
    assert_eq!(added["code"], "G100");

    let echo = board.json(&["add", "e", "--emitter", "SPS-73"]);
    assert_eq!(echo["code"], "E100");

    board.json(&["add", "golf"]);
    let list = board.json(&["list"]);
    assert_eq!(list.as_array().unwrap().len(), 3);

    let group = board.json(&["correlate", "new", "G100", "E100"]);
    assert_eq!(group["group"], 1);

    let updated = board.json(&["edit", "G100", "--kind", "update", "--course", "180"]);
    assert_eq!(updated["change"], "update");
    let history = board.json(&["history", "G100"]);
    assert_eq!(history[0]["kind"], "update");

    let deleted = board.json(&["delete", "G100"]);
    assert_eq!(deleted["code"], "G100");
    assert_eq!(deleted["groupsTrimmed"], 1);
    // A two-member group dissolves when one member leaves.
    assert_eq!(board.json(&["correlate", "list"]).as_array().unwrap().len(), 0);

    // Restore never reuses a freed number below the highest active one.
    let restored = board.json(&["restore", "G100"]);
    assert_eq!(restored["originalCode"], "G100");
    assert_eq!(restored["code"], "G102");
}

#[test]
fn test_unknown_code_suggests_similar() {
    let board = Board::new();
    board.json(&["init", "--block-start", "100"]);
    board.json(&["add", "golf"]);

    let output = board.cmd().args(["show", "G10"]).output().unwrap();
    assert_eq!(output.status.code(), Some(3));
    let err: serde_json::Value = serde_json::from_slice(&output.stderr).unwrap();
    assert!(err["error"]["hint"].as_str().unwrap().contains("G100"));
}

#[test]
fn test_live_mode_applies_stdin_commands() {
    let board = Board::new();
    board.json(&["init", "--block-start", "100"]);

    board
        .cmd()
        .arg("live")
        .write_stdin("add golf --info \"two masts\"\nadd alpha\nquit\n")
        .assert()
        .success();

    let doc = board.document();
    assert_eq!(doc["columns"]["Golf"][0]["code"], "G100");
    assert_eq!(doc["columns"]["Alpha"][0]["code"], "A100");
}
