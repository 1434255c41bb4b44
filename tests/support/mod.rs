#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use chrono::{NaiveDate, NaiveDateTime};
use kanban::config::ScheduleConfig;
use kanban::TaskManager;
use tempfile::TempDir;

pub const BASE: &str = "2026-01-01 00:00:00";

pub fn base() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .expect("valid base")
}

/// `2026-<month>-<day> <hour>:<minute>:00`
pub fn at(month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, 0))
        .expect("valid time")
}

pub fn schedule() -> ScheduleConfig {
    ScheduleConfig::starting_at(base())
}

pub fn manager() -> TaskManager {
    TaskManager::new(base())
}

/// Scratch directory with a `kanban.toml` pinning the horizon start
pub struct TestBoard {
    dir: TempDir,
}

impl TestBoard {
    pub fn init() -> std::io::Result<Self> {
        let dir = tempfile::tempdir()?;
        fs::write(
            dir.path().join("kanban.toml"),
            format!("[schedule]\nbase = \"{BASE}\"\n"),
        )?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn data_file(&self) -> PathBuf {
        self.dir.path().join("tasks.csv")
    }

    pub fn read_data(&self) -> std::io::Result<String> {
        fs::read_to_string(self.data_file())
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("kanban").expect("binary");
        cmd.current_dir(self.path());
        cmd.env_remove("KANBAN_FILE");
        cmd.env_remove("RUST_LOG");
        cmd
    }

    /// Run with `--json` and return the `data` member of the envelope
    pub fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self
            .cmd()
            .args(args)
            .arg("--json")
            .output()
            .expect("run kanban");
        assert!(
            output.status.success(),
            "kanban {args:?} failed: {}",
            String::from_utf8_lossy(&output.stdout)
        );
        let envelope: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("json envelope");
        envelope["data"].clone()
    }
}
