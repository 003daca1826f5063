// Copyright (c) Contributors to the cenv project.
// SPDX-License-Identifier: Apache-2.0

//! Env-file records and the loader that applies them.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::command::{Command, CommandLoader};
use crate::container::Container;
use crate::error::{Error, Result};

#[cfg(test)]
#[path = "./file_test.rs"]
mod file_test;

/// A parsed env file plus where it was found.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EnvFile {
    /// Halts file discovery after this file is added.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub root: bool,

    #[serde(default, alias = "cmds", skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<Command>,

    /// Directory the loader changes to before processing.
    #[serde(skip)]
    pub dir: PathBuf,

    /// Source path, for diagnostics.
    #[serde(skip)]
    pub filepath: PathBuf,
}

/// Applies a file's commands in declaration order.
///
/// The process working directory is changed to the file's directory first, so
/// relative paths in templates and path-list values resolve against it.
pub(crate) struct FileLoader {
    pub command_loader: CommandLoader,
}

impl FileLoader {
    pub fn load(&self, container: &mut Container, file: &EnvFile) -> Result<()> {
        std::env::set_current_dir(&file.dir).map_err(|err| Error::Filesystem {
            detail: format!("Failed to change directory to {:?}", file.dir),
            source: err,
        })?;

        for cmd in &file.commands {
            self.command_loader.load(container, cmd)?;
        }

        Ok(())
    }
}
