//! Shared helpers for end-to-end tests against the compiled binary.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

/// Handle for invoking the `invisible-cost` binary.
pub struct InvisibleCostProcess;

impl InvisibleCostProcess {
    /// Path of the binary built for this test run.
    pub fn binary() -> PathBuf {
        PathBuf::from(env!("CARGO_BIN_EXE_invisible-cost"))
    }

    /// Path of a file under `tests/fixtures/`.
    pub fn fixture_path(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join(name)
    }

    /// Runs a command to completion with stdin closed.
    pub fn spawn_command(args: &[&str]) -> Output {
        Self::command(args)
            .output()
            .expect("failed to run invisible-cost")
    }

    /// A prepared command with a clean environment for our variables.
    pub fn command(args: &[&str]) -> Command {
        let mut cmd = Command::new(Self::binary());
        cmd.args(args)
            .stdin(Stdio::null())
            .env_remove("INVISIBLE_COST_CONFIG")
            .env_remove("INVISIBLE_COST_BRIDGE")
            .env_remove("INVISIBLE_COST_ASSETS")
            .env_remove("INVISIBLE_COST_METRICS_PORT")
            .env_remove("INVISIBLE_COST_LOG_LEVEL")
            .env("INVISIBLE_COST_COLOR", "never");
        cmd
    }
}

/// Lossy stdout of `output`.
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Lossy stderr of `output`.
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
