// Copyright (c) Contributors to the cenv project.
// SPDX-License-Identifier: Apache-2.0

//! Top-level configuration consumed by the loader.
//!
//! Configuration normally arrives from the file named by `CENV_CONFIG_PATH`
//! (YAML, or TOML by extension), with `$VAR` references in the raw body
//! expanded from the process environment before parsing. The CLI then layers
//! its flags on top.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::template::expand_vars;
use crate::ENV_CONFIG_PATH_VAR;

#[cfg(test)]
#[path = "./config_test.rs"]
mod config_test;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<EnvConfig>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub log_level: String,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub no_log_color: bool,

    /// Whether variable names compare case-insensitively. Defaults to the
    /// platform's discipline (true on Windows).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_insensitive_environment: Option<bool>,

    /// Whether path-list de-duplication honors case. Defaults to the
    /// platform's discipline (false on Windows and macOS).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_sensitive_filesystem: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EnvConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load: Option<LoadConfig>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overwrites: Vec<Overwrite>,

    /// Template data files: name -> path of a `.yaml`/`.toml` document made
    /// available to templates under that name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoadConfig {
    /// Directory discovery starts from. Defaults to `.`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dir: String,

    /// Env-file name looked for in each directory. Defaults to `.cenv.yaml`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub filename: String,

    /// Suppress the duration line on stderr.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub no_log_duration: bool,

    /// Explicit starting environment (`KEY=VALUE` entries) instead of the
    /// process environment. Used by tests.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environ: Vec<String>,
}

/// An externally-configured file processed in place of the directory-default
/// env file when discovery reaches `dir`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Overwrite {
    /// Absolute directory this override applies to.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dir: String,

    /// File to process; `~/` resolves against the home directory.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file: String,

    /// Halt discovery once this entry is handled.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub root: bool,

    /// Honor `root` but do not read the file.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub skip: bool,
}

impl Config {
    /// Load configuration from the file named by `CENV_CONFIG_PATH`, or the
    /// default configuration when the variable is unset.
    pub fn find() -> Result<Self> {
        match std::env::var(ENV_CONFIG_PATH_VAR) {
            Ok(path) if !path.trim().is_empty() => Self::load(Path::new(path.trim())),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from `path`, expanding `$VAR` references in the
    /// raw body from the process environment.
    pub fn load(path: &Path) -> Result<Self> {
        let body = std::fs::read_to_string(path).map_err(|err| Error::File {
            path: String::new(),
            filepath: path.to_path_buf(),
            source: err,
        })?;

        let body = expand_vars(&body, |name| std::env::var(name).unwrap_or_default());

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        let config = if ext == "toml" {
            toml::from_str(&body).map_err(|err| Error::Serialization {
                path: String::new(),
                detail: format!("Failed to unmarshal toml config {path:?}"),
                source: Box::new(err),
            })?
        } else {
            serde_yaml::from_str(&body).map_err(|err| Error::Serialization {
                path: String::new(),
                detail: format!("Failed to unmarshal yaml config {path:?}"),
                source: Box::new(err),
            })?
        };

        Ok(config)
    }
}
