// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Bootstrap pipeline.
//!
//! The single-threaded, strictly linear flow:
//! PreFlight (preconditions, registry verification, package-manager
//! bootstrap, backup) then ApplyConfig (checkout, packages, application
//! settings, shell comparison) then PostFlight (postcondition hook, summary,
//! manual actions).
//!
//! Every step hands back a structured error; [`BootstrapError::exit_code`]
//! maps error kinds to the process exit-code contract, so no component ever
//! terminates the process itself.

use crate::{
    apply::{self, ApplyError, DefaultsStore, DsclDirectory, PrefStore, UserDirectory},
    backup::{self, Archiver, BackupError, TarArchiver},
    brew::{self, BrewError, Homebrew, PackageManager},
    cli::{EXIT_FAILURE, EXIT_INSTALL_FAILED, EXIT_MANIFEST_MISSING},
    context::Context,
    path::{Layout, NoWayHome},
    preflight::{self, PreflightError},
    registry::{Git2Registry, RegistryAccess, RegistryError},
    report::{self, RunDetails},
};

use tracing::debug;

/// Run the full bootstrap against the real machine.
///
/// Wires the production collaborators (libgit2 registry, brew, tar,
/// defaults, dscl) into [`provision`], then prints the summary.
///
/// # Errors
///
/// - Return [`BootstrapError`] from whichever step failed first.
pub fn run(ctx: &mut Context) -> Result<RunDetails> {
    let layout = Layout::try_default()?;
    preflight::check(layout.target())?;

    let registry = Git2Registry::try_open(layout.registry_dir())?;
    let mut brew = Homebrew::new();
    let details = provision(
        ctx,
        &layout,
        &registry,
        &mut brew,
        &TarArchiver,
        &DefaultsStore,
        &DsclDirectory,
    )?;

    check_postconditions(ctx);
    report::print(ctx, &details);

    Ok(details)
}

/// Provision the target directory through the given collaborators.
///
/// Preconditions are assumed already checked; everything else of the
/// pipeline lives here so tests can drive it with fakes.
///
/// # Errors
///
/// - Return [`BootstrapError`] from whichever step failed first.
pub fn provision<R, P, A, S, U>(
    ctx: &mut Context,
    layout: &Layout,
    registry: &R,
    brew: &mut P,
    archiver: &A,
    prefs: &S,
    users: &U,
) -> Result<RunDetails>
where
    R: RegistryAccess,
    P: PackageManager,
    A: Archiver,
    S: PrefStore,
    U: UserDirectory,
{
    let revision = registry.revision()?;
    debug!("registry at revision {} ({})", revision.id, revision.label);

    brew::ensure_present(&ctx.config, brew)?;

    let tracked = registry.tracked_files()?;
    let archive = backup::run_backup(&tracked, layout.target(), &layout.scratch, archiver)?;

    apply::checkout(registry, layout.target())?;
    apply::install_packages(&ctx.config, brew, &layout.manifest())?;
    apply::apply_app_settings(ctx, brew, prefs, &layout.iterm_prefs_dir());
    apply::queue_shell_change(ctx, brew, users);

    Ok(RunDetails {
        revision,
        brew_prefix: brew.prefix().ok(),
        archive,
    })
}

/// PostFlight extension point. No postconditions are defined yet.
fn check_postconditions(_ctx: &Context) {}

/// Top-level bootstrap error, one variant per failing subsystem.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// Home directory path cannot be determined.
    #[error(transparent)]
    NoWayHome(#[from] NoWayHome),

    /// Host environment is unsuitable.
    #[error(transparent)]
    Preflight(#[from] PreflightError),

    /// Registry missing or inaccessible.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Package manager bootstrap fails.
    #[error(transparent)]
    PackageManager(#[from] BrewError),

    /// Backup of pre-existing tracked files fails.
    #[error(transparent)]
    Backup(#[from] BackupError),

    /// Configuration application fails.
    #[error(transparent)]
    Apply(#[from] ApplyError),
}

impl BootstrapError {
    /// Map this error onto the process exit-code contract.
    ///
    /// Manifest and bulk-install failures carry their own codes; every other
    /// fatal error shares the generic one.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Apply(ApplyError::ManifestMissing { .. }) => EXIT_MANIFEST_MISSING,
            Self::Apply(ApplyError::InstallFailed { .. }) => EXIT_INSTALL_FAILED,
            _ => EXIT_FAILURE,
        }
    }
}

/// Friendly result alias :3
pub type Result<T, E = BootstrapError> = std::result::Result<T, E>;
