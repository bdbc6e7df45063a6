// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Command-line surface.
//!
//! Flag parsing, the run configuration derived from it, and the process exit
//! code contract. Parsing happens before any side effect, so rejecting an
//! invocation here is always safe.

use crate::context::RunConfig;

use clap::{error::ErrorKind, Parser};
use std::ffi::OsString;

/// Run completed without error.
pub const EXIT_SUCCESS: i32 = 0;

/// Generic failure: unsuitable environment, missing registry, checkout or
/// package-manager bootstrap failure.
pub const EXIT_FAILURE: i32 = 1;

/// Declared package manifest is missing or unreadable.
pub const EXIT_MANIFEST_MISSING: i32 = 3;

/// Bulk package install returned a non-zero status.
pub const EXIT_INSTALL_FAILED: i32 = 4;

/// Malformed invocation, e.g. an unrecognized flag.
pub const EXIT_USAGE: i32 = 64;

#[derive(Debug, Clone, Parser)]
#[command(about, override_usage = "dotboot [options]", version)]
pub struct Cli {
    /// Emit verbose diagnostic output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Exercise the control flow without mutating package or application
    /// state.
    #[arg(short, long)]
    pub test_mode: bool,

    /// Disable ANSI color in diagnostic output.
    #[arg(long)]
    pub no_color: bool,

    /// Trailing tokens after "--" are accepted and ignored.
    #[arg(last = true, hide = true)]
    pub rest: Vec<OsString>,
}

impl Cli {
    /// Derive the immutable run configuration from parsed flags.
    pub fn to_config(&self) -> RunConfig {
        RunConfig {
            verbose: self.verbose,
            test_mode: self.test_mode,
            color: !self.no_color,
        }
    }
}

/// Outcome of argument parsing.
#[derive(Debug, Clone)]
pub enum Invocation {
    /// Proceed with a full run.
    Run(Cli),

    /// Terminate immediately with the given exit code. Help and version
    /// requests exit zero; anything else is a usage error.
    Exit(i32),
}

/// Parse raw arguments into an [`Invocation`].
///
/// Help and version output is rendered by clap itself. Unrecognized flags
/// map to [`EXIT_USAGE`]; no prior flag has had any effect at that point.
pub fn parse_from<I, T>(args: I) -> Invocation
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => Invocation::Run(cli),
        Err(error) => {
            let code = exit_code_for(error.kind());
            let _ = error.print();
            Invocation::Exit(code)
        }
    }
}

fn exit_code_for(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => EXIT_SUCCESS,
        _ => EXIT_USAGE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use simple_test_case::test_case;

    #[test_case(&["dotboot", "-v"]; "short form")]
    #[test_case(&["dotboot", "--verbose"]; "long form")]
    #[test]
    fn parse_verbose_flag(args: &[&str]) {
        let cli = Cli::try_parse_from(args.iter().copied()).unwrap();
        assert!(cli.verbose);
        assert!(cli.to_config().verbose);
    }

    #[test_case(&["dotboot", "-t"]; "short form")]
    #[test_case(&["dotboot", "--test-mode"]; "long form")]
    #[test]
    fn parse_test_mode_flag(args: &[&str]) {
        let cli = Cli::try_parse_from(args.iter().copied()).unwrap();
        assert!(cli.test_mode);
        assert!(cli.to_config().test_mode);
    }

    #[test]
    fn no_color_disables_color() {
        let cli = Cli::try_parse_from(["dotboot", "--no-color"]).unwrap();
        assert!(!cli.to_config().color);

        let cli = Cli::try_parse_from(["dotboot"]).unwrap();
        assert!(cli.to_config().color);
    }

    #[test]
    fn unknown_flag_is_usage_error() {
        let result = Cli::try_parse_from(["dotboot", "--bogus"]);
        let error = result.unwrap_err();
        assert_eq!(exit_code_for(error.kind()), EXIT_USAGE);
    }

    #[test]
    fn help_exits_zero() {
        let error = Cli::try_parse_from(["dotboot", "--help"]).unwrap_err();
        assert_eq!(exit_code_for(error.kind()), EXIT_SUCCESS);

        let error = Cli::try_parse_from(["dotboot", "-h"]).unwrap_err();
        assert_eq!(exit_code_for(error.kind()), EXIT_SUCCESS);
    }

    #[test]
    fn double_dash_terminates_flag_parsing() {
        let cli = Cli::try_parse_from(["dotboot", "-v", "--", "--bogus", "extra"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.rest.len(), 2);
    }

    #[test]
    fn defaults_are_off() {
        let config = Cli::try_parse_from(["dotboot"]).unwrap().to_config();
        assert_eq!(
            config,
            crate::context::RunConfig {
                verbose: false,
                test_mode: false,
                color: true,
            }
        );
    }
}
