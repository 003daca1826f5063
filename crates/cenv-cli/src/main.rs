// Copyright (c) Contributors to the cenv project.
// SPDX-License-Identifier: Apache-2.0

//! cenv - Cascading Environment Loader CLI

use clap::{Args, Parser, Subcommand};
use miette::Result;

mod cmd_hook;
mod cmd_load;

use cmd_hook::CmdHook;
use cmd_load::CmdLoad;

#[derive(Parser)]
#[clap(
    name = "cenv",
    about = "Cascading environment loader",
    version,
    long_about = "Load directory-based env files and emit shell environment diffs"
)]
struct Opt {
    #[clap(flatten)]
    logging: Logging,

    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Parser)]
struct Logging {
    /// Increase verbosity (-v, -vv, -vvv)
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[clap(short, long)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Manage environment variables
    Env(CmdEnv),
}

/// Manage environment variables
#[derive(Args)]
struct CmdEnv {
    #[clap(subcommand)]
    cmd: EnvCommand,
}

#[derive(Subcommand)]
enum EnvCommand {
    /// Load the environment and print the diff
    Load(CmdLoad),

    /// Print the hook script for a shell
    Hook(CmdHook),
}

impl Opt {
    fn run(self) -> Result<i32> {
        let log_level = match (self.logging.quiet, self.logging.verbose) {
            (true, _) => tracing::Level::ERROR,
            (false, 0) => tracing::Level::WARN,
            (false, 1) => tracing::Level::INFO,
            (false, 2) => tracing::Level::DEBUG,
            (false, _) => tracing::Level::TRACE,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .init();

        match self.cmd {
            Command::Env(env) => match env.cmd {
                EnvCommand::Load(mut cmd) => cmd.run(),
                EnvCommand::Hook(cmd) => cmd.run(),
            },
        }
    }
}

fn main() -> Result<()> {
    let opt = Opt::parse();
    let code = opt.run()?;
    std::process::exit(code);
}
