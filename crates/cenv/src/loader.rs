// Copyright (c) Contributors to the cenv project.
// SPDX-License-Identifier: Apache-2.0

//! The load pipeline: discover files, ingest the environment, replay the
//! stored reversal, apply every file's commands, emit the diff streams.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::command::{CommandLoader, CommandMethods};
use crate::config::Config;
use crate::container::Container;
use crate::discovery;
use crate::error::{Error, Result};
use crate::file::{EnvFile, FileLoader};
use crate::path::{PathHandler, PathLoader};
use crate::platform;
use crate::template::TemplateHandler;

#[cfg(test)]
#[path = "./loader_test.rs"]
mod loader_test;

/// File processing changes the process working directory, which is
/// process-global state; loads within one process are serialized behind
/// this lock. Callers that also touch the working directory must not run
/// concurrently with a load.
pub(crate) static CWD_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Runs a full environment load for one configuration.
pub struct Loader {
    config: Config,
    platform: String,
    data: HashMap<String, Value>,
    files: Vec<EnvFile>,
}

impl Loader {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            platform: platform::tag(),
            data: HashMap::new(),
            files: Vec::new(),
        }
    }

    /// Discover the env files this load would process, innermost first.
    ///
    /// Also loads the template data files, since both come from the same
    /// configuration section.
    pub fn find_files(&mut self) -> Result<&[EnvFile]> {
        let env = self.config.env.as_ref().ok_or_else(|| Error::MissingValue {
            path: ".env".to_string(),
            detail: "Missing config.env".to_string(),
        })?;

        let load = env.load.as_ref().ok_or_else(|| Error::MissingValue {
            path: ".env.load".to_string(),
            detail: "Missing config.env.load".to_string(),
        })?;

        let mut data = HashMap::with_capacity(env.data.len() + 1);
        data.insert(
            "_PLATFORM".to_string(),
            Value::String(self.platform.clone()),
        );

        for (data_key, data_file) in &env.data {
            let value = load_data_file(data_key, Path::new(data_file))?;
            data.insert(data_key.clone(), value);
        }

        self.data = data;
        self.files = discovery::find_files(load, &env.overwrites)?;

        Ok(&self.files)
    }

    /// Run the load and write the forward diff to `out`.
    ///
    /// Nothing is written unless the whole load succeeds. The duration line
    /// goes to stderr unless suppressed by configuration.
    pub fn load(&mut self, out: &mut dyn Write) -> Result<()> {
        let start = Instant::now();

        self.find_files()?;

        // Presence was validated by find_files.
        let load = self.config.env.as_ref().unwrap().load.as_ref().unwrap();

        let environ: Vec<String> = if load.environ.is_empty() {
            std::env::vars().map(|(k, v)| format!("{k}={v}")).collect()
        } else {
            load.environ.clone()
        };

        let case_insensitive = self
            .config
            .case_insensitive_environment
            .unwrap_or(platform::default_case_insensitive_environment());

        let mut container = Container::new(case_insensitive);
        container.load_environ(&environ);
        container.apply_reverse()?;

        let path_handler = PathHandler {
            case_sensitive_filesystem: self
                .config
                .case_sensitive_filesystem
                .unwrap_or(platform::default_case_sensitive_filesystem()),
        };

        let file_loader = FileLoader {
            command_loader: CommandLoader {
                platform: self.platform.clone(),
                command_methods: CommandMethods {
                    path_handler,
                    path_loader: PathLoader { path_handler },
                    template_handler: TemplateHandler::new(self.data.clone()),
                },
            },
        };

        {
            let _cwd = CWD_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
            let saved_dir = std::env::current_dir().ok();

            // Reverse discovery order: outermost first, innermost overrides.
            let result = self
                .files
                .iter()
                .rev()
                .try_for_each(|file| file_loader.load(&mut container, file));

            // The directory changes are only meaningful while commands run;
            // put the process back where the caller left it.
            if let Some(dir) = saved_dir {
                let _ = std::env::set_current_dir(dir);
            }

            result?;
        }

        container.make_diff();
        container.write_diff(out)?;

        if !load.no_log_duration {
            eprintln!("cenv: env loaded in {:.1?}", start.elapsed());
        }

        Ok(())
    }

    /// The discovered files, in discovery (innermost-first) order.
    pub fn files(&self) -> &[EnvFile] {
        &self.files
    }

    /// The runtime platform tag commands are filtered against.
    pub fn platform(&self) -> &str {
        &self.platform
    }
}

/// Read one template data file (`.toml` or `.yaml`) into a data value.
fn load_data_file(data_key: &str, data_file: &Path) -> Result<Value> {
    let path = format!(".env.data[{data_key}]");

    let body = std::fs::read_to_string(data_file).map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound {
                path: path.clone(),
                filepath: data_file.to_path_buf(),
                source: err,
            }
        } else {
            Error::File {
                path: path.clone(),
                filepath: data_file.to_path_buf(),
                source: err,
            }
        }
    })?;

    let ext = data_file
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    if ext == "toml" {
        toml::from_str(&body).map_err(|err| Error::Serialization {
            path,
            detail: format!("Failed to unmarshal toml file {data_file:?}"),
            source: Box::new(err),
        })
    } else {
        serde_yaml::from_str(&body).map_err(|err| Error::Serialization {
            path,
            detail: format!("Failed to unmarshal yaml file {data_file:?}"),
            source: Box::new(err),
        })
    }
}
