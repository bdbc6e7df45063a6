// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration application.
//!
//! The four sequential sub-steps that turn a validated machine into a
//! provisioned one: checkout of the registry's tracked files, bulk package
//! install from the declared manifest, terminal-emulator preference
//! rewiring, and the login-shell comparison.
//!
//! The first two sub-steps abort the run on failure, each with its own exit
//! code. The last two never abort: losing them costs convenience, not
//! consistency, so they degrade to warnings and manual follow-up actions.

use crate::{
    brew::{BrewError, PackageManager},
    context::{Context, ManualActions, RunConfig},
    registry::{RegistryAccess, RegistryError},
    syscall::{self, SyscallError},
};

use std::{
    env,
    fs::{read_to_string, File},
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

/// Cask name of the terminal emulator.
pub const ITERM_CASK: &str = "iterm2";

/// Preference domain of the terminal emulator.
pub const ITERM_DOMAIN: &str = "com.googlecode.iterm2";

/// Canonical preference file expected inside the tracked settings directory.
pub const ITERM_PLIST: &str = "com.googlecode.iterm2.plist";

/// Shell the package manager provides and the user should log in with.
pub const PREFERRED_SHELL: &str = "zsh";

/// Registered login shells on the host.
pub const ALLOWED_SHELLS_FILE: &str = "/etc/shells";

/// Layer of indirection for the platform preference store.
pub trait PrefStore {
    fn write_string(&self, domain: &str, key: &str, value: &str) -> syscall::Result<()>;

    fn write_bool(&self, domain: &str, key: &str, value: bool) -> syscall::Result<()>;

    fn write_int(&self, domain: &str, key: &str, value: i64) -> syscall::Result<()>;

    /// Drop the preference daemon's cache so rewired settings take effect.
    fn flush(&self) -> syscall::Result<()>;
}

/// Preference store access through the defaults binary.
#[derive(Debug, Default)]
pub struct DefaultsStore;

impl PrefStore for DefaultsStore {
    fn write_string(&self, domain: &str, key: &str, value: &str) -> syscall::Result<()> {
        syscall::run_capture("defaults", ["write", domain, key, "-string", value])?;
        Ok(())
    }

    fn write_bool(&self, domain: &str, key: &str, value: bool) -> syscall::Result<()> {
        let value = if value { "true" } else { "false" };
        syscall::run_capture("defaults", ["write", domain, key, "-bool", value])?;
        Ok(())
    }

    fn write_int(&self, domain: &str, key: &str, value: i64) -> syscall::Result<()> {
        let value = value.to_string();
        syscall::run_capture("defaults", ["write", domain, key, "-int", value.as_str()])?;
        Ok(())
    }

    fn flush(&self) -> syscall::Result<()> {
        syscall::run_capture("killall", ["cfprefsd"])?;
        Ok(())
    }
}

/// Layer of indirection for the platform user-directory service.
pub trait UserDirectory {
    /// Currently configured login shell of the invoking user.
    fn login_shell(&self) -> Result<PathBuf, LookupError>;
}

/// User directory access through the dscl binary.
#[derive(Debug, Default)]
pub struct DsclDirectory;

impl UserDirectory for DsclDirectory {
    fn login_shell(&self) -> Result<PathBuf, LookupError> {
        let user = env::var("USER").map_err(|_| LookupError::NoUser)?;
        let record = format!("/Users/{user}");
        let output = syscall::run_capture("dscl", [".", "-read", record.as_str(), "UserShell"])?;

        output
            .split_once("UserShell:")
            .map(|(_, shell)| PathBuf::from(shell.trim()))
            .ok_or(LookupError::Unparsable { output })
    }
}

/// Force-checkout the registry's tracked files into the target directory.
///
/// # Errors
///
/// - Return [`ApplyError::Checkout`] if the checkout fails; the run cannot
///   proceed without a consistent file set.
pub fn checkout(registry: &impl RegistryAccess, target: &Path) -> Result<()> {
    info!("checking out tracked files into {:?}", target.display());
    registry
        .checkout(target)
        .map_err(|source| ApplyError::Checkout {
            source,
            target: target.to_path_buf(),
        })
}

/// Bulk-install every package the manifest declares.
///
/// The manifest readability check runs in every mode; only the install
/// itself is skipped under test mode.
///
/// # Errors
///
/// - Return [`ApplyError::ManifestMissing`] if the manifest does not exist
///   or cannot be opened. No package has been installed at that point.
/// - Return [`ApplyError::InstallFailed`] if the bulk install exits
///   non-zero.
pub fn install_packages(
    config: &RunConfig,
    brew: &impl PackageManager,
    manifest: &Path,
) -> Result<()> {
    // INVARIANT: Manifest must be readable before any install, in every mode.
    File::open(manifest).map_err(|source| ApplyError::ManifestMissing {
        source,
        path: manifest.to_path_buf(),
    })?;

    if config.test_mode {
        warn!("test mode skips bulk package install");
        return Ok(());
    }

    info!("installing declared packages from {:?}", manifest.display());
    brew.bundle_install(manifest)
        .map_err(|source| ApplyError::InstallFailed {
            source,
            path: manifest.to_path_buf(),
        })
}

/// Point the terminal emulator at its tracked settings directory.
///
/// Installs the application if missing, rewires its preference loading to
/// the tracked directory, and silences the preference-sync nag. Nothing in
/// here aborts the run: every failure degrades to a warning, and a missing
/// canonical preference file additionally queues a manual action.
pub fn apply_app_settings(
    ctx: &mut Context,
    brew: &impl PackageManager,
    prefs: &impl PrefStore,
    prefs_dir: &Path,
) {
    ensure_app_installed(&ctx.config, brew);

    if ctx.config.test_mode {
        warn!("test mode skips terminal emulator preference rewiring");
    } else if let Err(error) = point_prefs_at(prefs, prefs_dir) {
        warn!("could not rewire terminal emulator preferences: {error}");
    }

    if !prefs_dir.join(ITERM_PLIST).is_file() {
        warn!(
            "no {ITERM_PLIST} under {:?}; preferences will not load from it",
            prefs_dir.display()
        );
        ctx.actions.push(format!(
            "Export iTerm2 settings manually: Settings -> General -> Settings, \
             point the custom folder at {} and trigger a save",
            prefs_dir.display()
        ));
    }
}

fn ensure_app_installed(config: &RunConfig, brew: &impl PackageManager) {
    match brew.is_cask_installed(ITERM_CASK) {
        Ok(true) => debug!("{ITERM_CASK} already installed"),
        Ok(false) if config.test_mode => {
            warn!("{ITERM_CASK} not installed; test mode skips install");
        }
        Ok(false) => {
            if let Err(error) = brew.install_cask(ITERM_CASK) {
                warn!("could not install {ITERM_CASK}: {error}");
            }
        }
        Err(error) => warn!("could not query {ITERM_CASK} install state: {error}"),
    }
}

fn point_prefs_at(prefs: &impl PrefStore, prefs_dir: &Path) -> syscall::Result<()> {
    let folder = prefs_dir.to_string_lossy();
    prefs.write_string(ITERM_DOMAIN, "PrefsCustomFolder", folder.as_ref())?;
    prefs.write_bool(ITERM_DOMAIN, "LoadPrefsFromCustomFolder", true)?;
    // Silence the "save changes to folder" reminder on quit.
    prefs.write_int(
        ITERM_DOMAIN,
        "NoSyncNeverRemindPrefsChangesLostForFile_selection",
        2,
    )?;
    prefs.flush()?;

    Ok(())
}

/// Compare the desired login shell against the configured one, queueing
/// manual actions for any gap.
///
/// Changing a login shell requires interactive authentication, and
/// registering a new one requires privilege, so neither is ever automated.
/// Lookup failures degrade to warnings.
pub fn queue_shell_change(
    ctx: &mut Context,
    brew: &impl PackageManager,
    users: &impl UserDirectory,
) {
    let desired = match brew.shell_path(PREFERRED_SHELL) {
        Ok(path) => path,
        Err(error) => {
            warn!("cannot determine package-manager shell path: {error}");
            return;
        }
    };

    let current = match users.login_shell() {
        Ok(path) => path,
        Err(error) => {
            warn!("cannot read current login shell: {error}");
            return;
        }
    };

    enqueue_shell_actions(
        &mut ctx.actions,
        &desired,
        &current,
        Path::new(ALLOWED_SHELLS_FILE),
    );
}

fn enqueue_shell_actions(
    actions: &mut ManualActions,
    desired: &Path,
    current: &Path,
    allowed: &Path,
) {
    if current == desired {
        debug!("login shell already {:?}", desired.display());
        return;
    }

    let registered = read_to_string(allowed)
        .map(|content| content.lines().any(|line| Path::new(line.trim()) == desired))
        .unwrap_or(false);
    if !registered {
        actions.push(format!(
            "Register the shell as a login shell: sudo sh -c 'echo {} >> {}'",
            desired.display(),
            allowed.display()
        ));
    }

    actions.push(format!(
        "Change your login shell: chsh -s {}",
        desired.display()
    ));
}

/// Login-shell lookup error types.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// Invoking user cannot be determined from the environment.
    #[error("cannot determine current user")]
    NoUser,

    /// User directory service returned something unrecognizable.
    #[error("unexpected user directory output: {output}")]
    Unparsable { output: String },

    /// User directory service invocation fails.
    #[error(transparent)]
    Syscall(#[from] SyscallError),
}

/// Configuration application error types.
#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    /// Checkout into the target directory fails.
    #[error("checkout into {:?} failed", target.display())]
    Checkout {
        #[source]
        source: RegistryError,
        target: PathBuf,
    },

    /// Declared package manifest does not exist or cannot be opened.
    #[error("package manifest missing or unreadable at {:?}", path.display())]
    ManifestMissing {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Bulk package install exits non-zero.
    #[error("bulk package install from {:?} failed", path.display())]
    InstallFailed {
        #[source]
        source: BrewError,
        path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = ApplyError> = std::result::Result<T, E>;
