// Copyright (c) Contributors to the cenv project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `cenv env load` command.

use std::io::Write;

use clap::Args;
use colored::Colorize;
use miette::{IntoDiagnostic, Result};

use cenv::config::{EnvConfig, LoadConfig};
use cenv::{Config, Loader};

/// Load the environment and print the diff
#[derive(Debug, Args)]
pub struct CmdLoad {
    /// Start discovery from DIR
    #[clap(short, long, env = "CENV_ENV_LOAD_DIR")]
    pub dir: Option<String>,

    /// Env-file name to look for in each directory
    #[clap(short, long, env = "CENV_ENV_LOAD_FILENAME")]
    pub filename: Option<String>,

    /// Suppress the duration line on stderr
    #[clap(long)]
    pub no_log_duration: bool,

    /// Show what would be loaded without emitting a diff
    #[clap(long)]
    pub dry_run: bool,
}

impl CmdLoad {
    pub fn run(&mut self) -> Result<i32> {
        let mut config = Config::find()?;

        // Layer flags over the configuration file.
        let env = config.env.get_or_insert_with(EnvConfig::default);
        let load = env.load.get_or_insert_with(LoadConfig::default);

        if let Some(dir) = &self.dir {
            load.dir = dir.clone();
        }

        if let Some(filename) = &self.filename {
            load.filename = filename.clone();
        }

        if self.no_log_duration {
            load.no_log_duration = true;
        }

        let mut loader = Loader::new(config);

        if self.dry_run {
            let files = loader.find_files()?;

            println!("{}", "Discovered files:".bold());

            for file in files {
                println!("  - {}", file.filepath.display());

                for cmd in &file.commands {
                    if let Some(action) = cmd.action() {
                        let (verb, key) = match action {
                            cenv::Action::Add(key) => ("add", key),
                            cenv::Action::Set(key) => ("set", key),
                            cenv::Action::Del(key) => ("del", key),
                        };

                        println!("      {} {}", verb.green(), key);
                    }
                }
            }

            return Ok(0);
        }

        // The diff reaches stdout only once the whole load has succeeded.
        let mut out = Vec::new();
        loader.load(&mut out)?;

        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&out).into_diagnostic()?;

        Ok(0)
    }
}
