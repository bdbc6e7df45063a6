// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Machine bootstrap engine.
//!
//! Provision a new machine from a pre-existing bare-alias dotfiles
//! repository: validate the host, bootstrap the package manager, archive
//! anything the checkout would clobber, deploy the registry's tracked files
//! into the home directory, bulk-install declared packages, rewire
//! application preferences, and report whatever must be finished by hand.
//!
//! The flow is strictly linear and synchronous. External collaborators
//! (git, brew, tar, defaults, dscl) sit behind narrow traits so every step
//! can run in isolation against fakes.

pub mod apply;
pub mod backup;
pub mod bootstrap;
pub mod brew;
pub mod cli;
pub mod context;
pub mod logging;
pub mod path;
pub mod preflight;
pub mod registry;
pub mod report;
pub mod syscall;

#[cfg(test)]
pub(crate) mod testutil;

pub use bootstrap::{run, BootstrapError};
pub use cli::{Cli, Invocation};
pub use context::{Context, ManualActions, RunConfig};
