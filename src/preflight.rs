// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Host environment validation.
//!
//! A fixed sequence of independent checks runs before anything mutates the
//! machine. Failures accumulate instead of short-circuiting, so the user
//! sees every problem in one pass. Success is silent.

use std::{
    fs::{remove_file, File},
    path::{Path, PathBuf},
};
use tracing::error;

/// Operating system family the bootstrap supports.
pub const SUPPORTED_OS: &str = "macos";

/// External executables every run depends on.
pub const REQUIRED_TOOLS: [&str; 2] = ["git", "curl"];

/// Validate the host, reporting every failure before aborting.
///
/// # Errors
///
/// - Return [`PreflightError`] listing how many checks failed, after logging
///   one error line per failure.
pub fn check(target: &Path) -> Result<()> {
    let failures = examine(std::env::consts::OS, target);
    if failures.is_empty() {
        return Ok(());
    }

    for failure in &failures {
        error!("{failure}");
    }

    Err(PreflightError {
        count: failures.len(),
    })
}

/// Run every check against the given OS family and target directory.
///
/// Pure with respect to ordering: checks are independent of one another and
/// always run in the same fixed sequence.
pub fn examine(os: &str, target: &Path) -> Vec<Failure> {
    let mut failures = Vec::new();

    if os != SUPPORTED_OS {
        failures.push(Failure::WrongOs { os: os.to_string() });
    }

    if crate::syscall::run_capture("xcode-select", ["-p"]).is_err() {
        failures.push(Failure::MissingDeveloperTools);
    }

    for tool in REQUIRED_TOOLS {
        if which::which(tool).is_err() {
            failures.push(Failure::MissingExecutable { name: tool.into() });
        }
    }

    if !is_writable(target) {
        failures.push(Failure::TargetNotWritable {
            path: target.to_path_buf(),
        });
    }

    failures
}

/// Probe write permission by creating and removing a marker file.
fn is_writable(target: &Path) -> bool {
    let probe = target.join(".dotboot-write-probe");
    match File::create(&probe) {
        Ok(_) => {
            let _ = remove_file(&probe);
            true
        }
        Err(_) => false,
    }
}

/// A single failed precondition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Failure {
    #[error("unsupported operating system {os:?}; this tool provisions macOS machines")]
    WrongOs { os: String },

    #[error("developer command-line tools missing; run `xcode-select --install` first")]
    MissingDeveloperTools,

    #[error("required executable {name:?} not found on PATH")]
    MissingExecutable { name: String },

    #[error("target directory {:?} is not writable", path.display())]
    TargetNotWritable { path: PathBuf },
}

/// One or more preconditions failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{count} precondition check(s) failed")]
pub struct PreflightError {
    pub count: usize,
}

/// Friendly result alias :3
pub type Result<T, E = PreflightError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use sealed_test::prelude::*;

    #[sealed_test]
    fn wrong_os_is_accumulated_with_other_failures() {
        std::fs::create_dir("target").unwrap();
        let failures = examine("plan9", Path::new("target"));

        assert!(failures.contains(&Failure::WrongOs { os: "plan9".into() }));
    }

    #[sealed_test]
    fn writable_target_passes_probe() {
        std::fs::create_dir("target").unwrap();
        assert!(is_writable(Path::new("target")));

        // Probe file must not survive the check.
        assert!(!Path::new("target/.dotboot-write-probe").exists());
    }

    #[sealed_test]
    fn missing_target_fails_probe() {
        assert!(!is_writable(Path::new("no-such-dir")));
    }

    #[sealed_test]
    fn missing_target_is_reported() {
        let failures = examine(SUPPORTED_OS, Path::new("no-such-dir"));
        assert!(failures.contains(&Failure::TargetNotWritable {
            path: PathBuf::from("no-such-dir"),
        }));
    }
}
