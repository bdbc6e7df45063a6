// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use dotboot::{
    cli::{self, Invocation, EXIT_SUCCESS},
    logging, Context,
};

use std::process::exit;
use tracing::error;

fn main() {
    let cli = match cli::parse_from(std::env::args_os()) {
        Invocation::Run(cli) => cli,
        Invocation::Exit(code) => exit(code),
    };

    // INVARIANT: Logging setup follows argument parsing; nothing logs before
    // this point.
    let config = cli.to_config();
    logging::init(&config);

    let mut ctx = Context::new(config);
    if let Err(error) = dotboot::run(&mut ctx) {
        let code = error.exit_code();
        error!("{:?}", anyhow::Error::new(error));
        exit(code);
    }

    exit(EXIT_SUCCESS)
}
