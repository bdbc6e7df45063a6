// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Diagnostic output setup.
//!
//! One-shot [`tracing_subscriber`] initialization driven by the run
//! configuration. Must happen right after argument parsing and before any
//! component that logs; anything emitted earlier falls back to plain text.

use crate::context::RunConfig;

use std::io::{stderr, IsTerminal};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber for this run.
///
/// Verbose mode widens the default filter from `info` to `debug`. A `RUST_LOG`
/// environment filter takes precedence over both. ANSI color applies only
/// when color was not disabled by flag and stderr is an interactive terminal.
///
/// # Panics
///
/// - May panic if called more than once per process.
pub fn init(config: &RunConfig) {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time()
        .with_ansi(config.color && stderr().is_terminal())
        .with_writer(stderr);
    let default = if config.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default))
        .unwrap();
    tracing_subscriber::registry().with(layer).with(filter).init();
}
