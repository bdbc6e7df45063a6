// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! External process invocation.
//!
//! Every external collaborator (git, tar, brew, defaults, dscl) is reached
//! through a blocking system call. Calls either capture combined output or
//! inherit the caller's stdio; both treat a non-zero exit status as an error.

use std::{ffi::OsStr, process::Command};

/// Run command to completion, capturing stdout and stderr.
///
/// # Errors
///
/// - Return [`SyscallError::Spawn`] if the command cannot be started.
/// - Return [`SyscallError::NonZeroExit`] if it exits with a failure status.
pub fn run_capture(
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
) -> Result<String> {
    capture(Command::new(cmd.as_ref()).args(args))
}

/// Run command to completion with inherited stdio.
///
/// Used for long-running collaborators whose progress output belongs on the
/// user's terminal, e.g. a bulk package install.
///
/// # Errors
///
/// - Return [`SyscallError::Spawn`] if the command cannot be started.
/// - Return [`SyscallError::NonZeroExit`] if it exits with a failure status.
pub fn run_status(
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
) -> Result<()> {
    status(Command::new(cmd.as_ref()).args(args))
}

/// Capture variant for a caller-prepared [`Command`], e.g. one carrying extra
/// environment variables.
pub fn capture(command: &mut Command) -> Result<String> {
    let name = command_name(command);
    let output = command
        .output()
        .map_err(|source| SyscallError::Spawn { source, name: name.clone() })?;

    let stdout = String::from_utf8_lossy(output.stdout.as_slice()).into_owned();
    let stderr = String::from_utf8_lossy(output.stderr.as_slice()).into_owned();
    let mut message = String::new();

    if !stdout.is_empty() {
        message.push_str(stdout.as_str());
    }

    if !stderr.is_empty() {
        message.push_str(stderr.as_str());
    }

    // INVARIANT: Chomp trailing newlines.
    let message = message
        .strip_suffix("\r\n")
        .or(message.strip_suffix('\n'))
        .map(ToString::to_string)
        .unwrap_or(message);

    if !output.status.success() {
        return Err(SyscallError::NonZeroExit { name, message });
    }

    Ok(message)
}

/// Status variant for a caller-prepared [`Command`].
pub fn status(command: &mut Command) -> Result<()> {
    let name = command_name(command);
    let status = command
        .spawn()
        .map_err(|source| SyscallError::Spawn { source, name: name.clone() })?
        .wait()
        .map_err(|source| SyscallError::Spawn { source, name: name.clone() })?;

    if !status.success() {
        return Err(SyscallError::NonZeroExit {
            name,
            message: status.to_string(),
        });
    }

    Ok(())
}

fn command_name(command: &Command) -> String {
    command.get_program().to_string_lossy().into_owned()
}

/// System call error types.
#[derive(Debug, thiserror::Error)]
pub enum SyscallError {
    /// Command could not be started at all.
    #[error("failed to spawn command {name:?}")]
    Spawn {
        #[source]
        source: std::io::Error,
        name: String,
    },

    /// Command ran, but exited with a failure status.
    #[error("command {name:?} failed:\n{message}")]
    NonZeroExit { name: String, message: String },
}

/// Friendly result alias :3
pub type Result<T, E = SyscallError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn run_capture_chomps_trailing_newline() {
        let result = run_capture("echo", ["hello"]).unwrap();
        assert_eq!(result, "hello");
    }

    #[test]
    fn run_capture_reports_non_zero_exit() {
        let result = run_capture("false", Vec::<&str>::new());
        assert!(matches!(
            result,
            Err(SyscallError::NonZeroExit { name, .. }) if name == "false"
        ));
    }

    #[test]
    fn run_capture_reports_missing_command() {
        let result = run_capture("definitely-no-such-binary", ["--version"]);
        assert!(matches!(result, Err(SyscallError::Spawn { .. })));
    }
}
