// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Package manager client and bootstrapper.
//!
//! Homebrew is consumed as an opaque external collaborator: version and
//! prefix queries, the documented non-interactive self-installer, bulk
//! install from a manifest, and cask management. This module never reasons
//! about package resolution itself; it only invokes brew and interprets exit
//! status.
//!
//! # Bootstrap State Machine
//!
//! Presence moves through three states: `NotPresent`, `Present`, and
//! `FailedInstall`. A fresh machine starts `NotPresent`; running the
//! self-installer and re-resolving (PATH first, then the well-known install
//! prefixes) transitions to `Present`. If the executable still cannot be
//! found after all that, `FailedInstall` is terminal and aborts the run.
//! Test mode never installs: it stays `NotPresent` with a warning, and every
//! later package operation is skipped.
//!
//! After any transition to `Present`, brew's shell environment is loaded
//! into the current process so every later step resolves the same
//! installation.

use crate::{context::RunConfig, syscall::{self, SyscallError}};

use std::{
    env,
    ffi::OsString,
    path::{Path, PathBuf},
    process::Command,
};
use tracing::{debug, info, instrument, warn};

/// Name of the package manager executable.
pub const BREW_BIN: &str = "brew";

/// Well-known install prefixes probed when PATH resolution fails.
pub const WELL_KNOWN_PREFIXES: [&str; 3] = [
    "/opt/homebrew",
    "/usr/local",
    "/home/linuxbrew/.linuxbrew",
];

/// Documented non-interactive installer script.
pub const INSTALL_SCRIPT_URL: &str =
    "https://raw.githubusercontent.com/Homebrew/install/HEAD/install.sh";

/// Presence states of the package manager on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrewState {
    /// Executable not resolvable anywhere.
    NotPresent,

    /// Executable resolved and environment loaded.
    Present,

    /// Self-install ran, but the executable still cannot be resolved.
    /// Terminal.
    FailedInstall,
}

/// Layer of indirection for package manager access.
pub trait PackageManager {
    /// Resolve the executable, PATH first, then well-known prefixes.
    /// Remembers the resolved location for every later call.
    fn resolve(&mut self) -> bool;

    /// First line of the version report.
    fn version(&self) -> Result<String>;

    /// Install prefix of the resolved installation.
    fn prefix(&self) -> Result<PathBuf>;

    /// Run the documented non-interactive self-installer.
    fn self_install(&self) -> Result<()>;

    /// Export the package manager's environment variables into the current
    /// process.
    fn load_shellenv(&self) -> Result<()>;

    /// Bulk-install every package declared in the manifest.
    fn bundle_install(&self, manifest: &Path) -> Result<()>;

    /// Install a single cask application.
    fn install_cask(&self, name: &str) -> Result<()>;

    /// Check whether a cask application is installed.
    fn is_cask_installed(&self, name: &str) -> Result<bool>;

    /// Path of a package-manager-installed shell under the install prefix.
    fn shell_path(&self, shell: &str) -> Result<PathBuf>;
}

/// Package manager access through the brew binary.
#[derive(Debug, Default)]
pub struct Homebrew {
    binary: Option<PathBuf>,
}

impl Homebrew {
    pub fn new() -> Self {
        Self::default()
    }

    fn binary(&self) -> Result<&Path> {
        self.binary.as_deref().ok_or(BrewError::NotResolved)
    }
}

impl PackageManager for Homebrew {
    fn resolve(&mut self) -> bool {
        if let Ok(path) = which::which(BREW_BIN) {
            self.binary = Some(path);
            return true;
        }

        for prefix in WELL_KNOWN_PREFIXES {
            let candidate = Path::new(prefix).join("bin").join(BREW_BIN);
            if candidate.is_file() {
                self.binary = Some(candidate);
                return true;
            }
        }

        false
    }

    fn version(&self) -> Result<String> {
        let output = syscall::run_capture(self.binary()?, ["--version"])?;
        Ok(output.lines().next().unwrap_or_default().to_string())
    }

    fn prefix(&self) -> Result<PathBuf> {
        let output = syscall::run_capture(self.binary()?, ["--prefix"])?;
        Ok(PathBuf::from(output.trim()))
    }

    #[instrument(skip(self), level = "debug")]
    fn self_install(&self) -> Result<()> {
        // Fetch with curl, hand the script to bash. Both tools were verified
        // by preflight.
        let script = syscall::run_capture("curl", ["-fsSL", INSTALL_SCRIPT_URL])?;
        syscall::status(
            Command::new("/bin/bash")
                .args(["-c", script.as_str()])
                .env("NONINTERACTIVE", "1"),
        )?;

        Ok(())
    }

    fn load_shellenv(&self) -> Result<()> {
        let binary = self.binary()?;
        let command = format!(
            "eval \"$({} shellenv)\" >/dev/null 2>&1; env",
            binary.display()
        );
        let output = syscall::run_capture("/bin/bash", ["-c", command.as_str()])?;

        for line in output.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            if key.starts_with("HOMEBREW_") || matches!(key, "PATH" | "MANPATH" | "INFOPATH") {
                env::set_var(key, value);
            }
        }

        Ok(())
    }

    fn bundle_install(&self, manifest: &Path) -> Result<()> {
        let args: Vec<OsString> = vec![
            "bundle".into(),
            "install".into(),
            "--file".into(),
            manifest.into(),
        ];
        // Inherit stdio so install progress lands on the user's terminal.
        syscall::run_status(self.binary()?, args)?;

        Ok(())
    }

    fn install_cask(&self, name: &str) -> Result<()> {
        syscall::run_status(self.binary()?, ["install", "--cask", name])?;

        Ok(())
    }

    fn is_cask_installed(&self, name: &str) -> Result<bool> {
        match syscall::run_capture(self.binary()?, ["list", "--cask", name]) {
            Ok(_) => Ok(true),
            Err(SyscallError::NonZeroExit { .. }) => Ok(false),
            Err(error) => Err(error.into()),
        }
    }

    fn shell_path(&self, shell: &str) -> Result<PathBuf> {
        Ok(self.prefix()?.join("bin").join(shell))
    }
}

/// Drive the presence state machine until `Present`, or fail.
///
/// # Errors
///
/// - Return [`BrewError::FailedInstall`] if the executable is still not
///   resolvable after the self-installer and the well-known-prefix probe.
/// - Return [`BrewError::Syscall`] if the installer or shellenv invocation
///   fails outright.
pub fn ensure_present(config: &RunConfig, brew: &mut impl PackageManager) -> Result<BrewState> {
    if brew.resolve() {
        brew.load_shellenv()?;
        if config.verbose {
            debug!("package manager present: {}", brew.version()?);
        }
        return Ok(BrewState::Present);
    }

    if config.test_mode {
        warn!("package manager not found; test mode skips installation");
        return Ok(BrewState::NotPresent);
    }

    info!("package manager not found; running its non-interactive installer");
    brew.self_install()?;

    // INVARIANT: Transition to Present only once the fresh install resolves.
    if !brew.resolve() {
        return Err(BrewError::FailedInstall);
    }

    brew.load_shellenv()?;
    info!("package manager installed");

    Ok(BrewState::Present)
}

/// Package manager error types.
#[derive(Debug, thiserror::Error)]
pub enum BrewError {
    /// Executable unresolvable after install and well-known-prefix probe.
    #[error("package manager executable still unresolvable after install")]
    FailedInstall,

    /// Operation requested before the executable was resolved.
    #[error("package manager executable has not been resolved")]
    NotResolved,

    /// External invocation of brew, curl, or bash fails.
    #[error(transparent)]
    Syscall(#[from] SyscallError),
}

/// Friendly result alias :3
pub type Result<T, E = BrewError> = std::result::Result<T, E>;
