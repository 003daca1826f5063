// Copyright (c) Contributors to the cenv project.
// SPDX-License-Identifier: Apache-2.0

//! cenv - Cascading Environment Loader
//!
//! This crate computes, from a hierarchy of declarative env files discovered
//! by walking up from a starting directory, a forward diff that brings the
//! calling shell's environment to the desired state and a reverse diff that
//! undoes it. The reverse diff is stored in the [`ENV_REVERSE_VAR`] variable
//! so the next invocation can replay it before applying its own changes,
//! which is what makes the environment follow the user around the tree.
//!
//! # Example
//!
//! ```yaml
//! # .cenv.yaml
//! root: true
//! commands:
//!   - set: PROJECT
//!     value: demo
//!   - add: PATH
//!     value: ./bin
//!   - add: PATH
//!     value: ./tools/bin
//!     platform: linux_amd64
//!     append: true
//! ```
//!
//! The diff is emitted one token per line (`SET`/key/value triples and
//! `DEL`/key pairs) for a shell hook to apply.

pub mod command;
pub mod config;
pub mod container;
pub mod discovery;
pub mod error;
pub mod file;
pub mod loader;
pub mod path;
pub mod paths;
pub mod platform;
pub mod template;

pub use command::{Action, Command};
pub use config::{Config, EnvConfig, LoadConfig, Overwrite};
pub use container::Container;
pub use discovery::find_files;
pub use error::{Error, ErrorKind, Result};
pub use file::EnvFile;
pub use loader::Loader;

/// Environment variable prefix for all well-known names.
pub const ENV_PREFIX: &str = "CENV";

/// Variable naming the configuration file to load.
pub const ENV_CONFIG_PATH_VAR: &str = "CENV_CONFIG_PATH";

/// Reserved variable carrying the JSON reversal list across invocations.
pub const ENV_REVERSE_VAR: &str = "CENV_REVERSE";

/// Default directory discovery starts from.
pub const DEFAULT_ENV_LOAD_DIR: &str = ".";

/// Well-known filename for env files.
pub const DEFAULT_ENV_FILENAME: &str = ".cenv.yaml";
