// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Final run summary.
//!
//! Everything here goes to stdout as plain text so it stays pipeable;
//! diagnostics belong to the tracing layer.

use crate::{context::Context, path::REGISTRY_DIR_NAME, registry::Revision};

use std::{fmt::Write, path::PathBuf};

/// Facts collected over a completed run, reported at the end.
#[derive(Debug, Clone)]
pub struct RunDetails {
    pub revision: Revision,
    pub brew_prefix: Option<PathBuf>,
    pub archive: Option<PathBuf>,
}

/// Ready-to-use alias for interacting with the registry directly.
pub fn registry_alias() -> String {
    format!("alias dotfiles='git --git-dir=$HOME/{REGISTRY_DIR_NAME} --work-tree=$HOME'")
}

/// Render the completion summary.
///
/// Verbose runs additionally report the registry revision, the package
/// manager prefix, and the backup archive path. Manual follow-ups come last,
/// one per line; nothing prints for an empty list.
pub fn render(ctx: &Context, details: &RunDetails) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "dotboot: machine setup complete.");
    let _ = writeln!(out);
    let _ = writeln!(out, "Interact with the registry directly:");
    let _ = writeln!(out, "  {}", registry_alias());

    if ctx.config.verbose {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "registry revision: {} ({})",
            details.revision.id, details.revision.label
        );
        if let Some(prefix) = &details.brew_prefix {
            let _ = writeln!(out, "package manager prefix: {}", prefix.display());
        }
        if let Some(archive) = &details.archive {
            let _ = writeln!(out, "backup archive: {}", archive.display());
        }
    }

    if !ctx.actions.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Manual follow-ups:");
        for action in ctx.actions.iter() {
            let _ = writeln!(out, "  -> {action}");
        }
    }

    out
}

/// Print the completion summary to stdout.
pub fn print(ctx: &Context, details: &RunDetails) {
    print!("{}", render(ctx, details));
}
