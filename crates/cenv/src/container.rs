// Copyright (c) Contributors to the cenv project.
// SPDX-License-Identifier: Apache-2.0

//! Variable container and diff engine.
//!
//! The container holds one record per environment variable, ingests the
//! starting environment, replays the reversal stored in [`ENV_REVERSE_VAR`]
//! by the previous invocation, and finally computes the forward diff plus the
//! reverse diff that undoes it.

use std::collections::{HashMap, HashSet};
use std::io::Write;

use crate::error::{Error, Result};
use crate::platform;
use crate::ENV_REVERSE_VAR;

#[cfg(test)]
#[path = "./container_test.rs"]
mod container_test;

/// State of a single environment variable during a load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct EnvVar {
    /// Original key name, casing preserved.
    pub key: String,

    /// Value when the environment was ingested (empty if unseen).
    pub original_value: String,

    /// Value under edit.
    pub current_value: String,

    /// Whether this key is a path list, and the list data.
    pub path_list: bool,
    pub path_elements: Vec<String>,
    pub path_seen: HashSet<String>,

    /// Whether this key was created by commands.
    pub created: bool,

    /// Whether this key should be unset in the forward diff.
    pub delete: bool,

    /// Whether this key was set by a reversal replay. If the value is
    /// unchanged after all operations the replay must still be applied.
    pub reversal: bool,

    /// Whether the reversal intent is specifically a deletion. Kept separate
    /// so a later write does not lose the undo-by-delete intent.
    pub reversal_delete: bool,
}

impl EnvVar {
    /// Clear the value and mark the record for deletion, dropping any
    /// path-list state.
    pub fn reset_and_delete(&mut self) {
        self.current_value.clear();
        self.delete = true;

        if self.path_list {
            self.path_list = false;
            self.path_elements = Vec::new();
            self.path_seen = HashSet::new();
        }
    }

    /// The value this record would contribute to the forward diff.
    pub fn effective_value(&self) -> String {
        if self.path_list {
            let sep = platform::LIST_SEPARATOR.to_string();
            self.path_elements.join(&sep)
        } else {
            self.current_value.clone()
        }
    }
}

/// Variable state map plus the computed diff streams.
#[derive(Debug, Default)]
pub struct Container {
    case_insensitive: bool,

    pub(crate) env: HashMap<String, EnvVar>,

    diff: Vec<String>,
    reverse: Vec<String>,
}

impl Container {
    pub fn new(case_insensitive_environment: bool) -> Self {
        Self {
            case_insensitive: case_insensitive_environment,
            ..Self::default()
        }
    }

    /// The map key identifying `name`: its upper-case form under a
    /// case-insensitive environment, the literal name otherwise.
    pub fn canonical_key(&self, name: &str) -> String {
        if self.case_insensitive {
            name.to_uppercase()
        } else {
            name.to_string()
        }
    }

    /// Fetch the record for `name`, or create one marked `created`.
    pub(crate) fn fetch_or_create(&mut self, name: &str) -> &mut EnvVar {
        let key_name = self.canonical_key(name);

        self.env.entry(key_name).or_insert_with(|| EnvVar {
            key: name.to_string(),
            created: true,
            ..EnvVar::default()
        })
    }

    /// The current effective value of `name` as templates observe it: the
    /// joined path list where applicable, empty if absent or marked for
    /// deletion.
    pub fn lookup(&self, name: &str) -> String {
        let key_name = self.canonical_key(name);

        match self.env.get(&key_name) {
            Some(env_var) if !env_var.delete => env_var.effective_value(),
            _ => String::new(),
        }
    }

    /// Ingest `"KEY=VALUE"` entries as the starting environment.
    ///
    /// The separator is the first `=`; values keep any further `=`. Under a
    /// case-insensitive environment, entries differing only in key casing
    /// collapse to the lexically later one.
    pub fn load_environ(&mut self, environ: &[String]) {
        self.env = HashMap::with_capacity(environ.len());

        for entry in environ {
            let (key, value) = entry.split_once('=').unwrap_or((entry.as_str(), ""));

            let env_var = EnvVar {
                key: key.to_string(),
                original_value: value.to_string(),
                current_value: value.to_string(),
                ..EnvVar::default()
            };

            let key_name = self.canonical_key(key);
            self.env.insert(key_name, env_var);
        }
    }

    /// Replay the reversal list stored by the previous invocation.
    ///
    /// The reserved variable holds a JSON array of interleaved tokens:
    /// `"SET", key, value` restores a value, `"DEL", key` marks a deletion.
    /// The reserved record itself is marked for deletion once consumed;
    /// whether it is re-emitted is decided during diff.
    pub fn apply_reverse(&mut self) -> Result<()> {
        let Some(reverse_var) = self.env.get_mut(ENV_REVERSE_VAR) else {
            return Ok(());
        };

        let reverse: Vec<String> =
            serde_json::from_str(&reverse_var.original_value).map_err(|err| {
                Error::Serialization {
                    path: String::new(),
                    detail: format!("Env var {ENV_REVERSE_VAR:?} has an invalid format."),
                    source: Box::new(err),
                }
            })?;

        // Ensure this key will be deleted since it has been consumed.
        reverse_var.delete = true;

        let mut i = 0;

        while i < reverse.len() {
            let cmd = reverse[i].clone();

            let Some(key) = reverse.get(i + 1).cloned() else {
                return Err(Error::MissingValue {
                    path: String::new(),
                    detail: format!("Cmd {ENV_REVERSE_VAR:?} is missing a key."),
                });
            };

            match cmd.as_str() {
                "SET" => {
                    let Some(value) = reverse.get(i + 2).cloned() else {
                        return Err(Error::MissingValue {
                            path: String::new(),
                            detail: format!(
                                "Cmd {ENV_REVERSE_VAR:?} is missing a value for key {key:?}."
                            ),
                        });
                    };

                    // Set the original value too, so the restoration is
                    // propagated if the key changes again.
                    let env_var = self.reversal_record(&key);
                    env_var.original_value = value.clone();
                    env_var.current_value = value;
                    i += 3;
                }
                "DEL" => {
                    let env_var = self.reversal_record(&key);
                    env_var.delete = true;
                    env_var.reversal_delete = true;
                    env_var.original_value.clear();
                    env_var.current_value.clear();
                    i += 2;
                }
                _ => {
                    return Err(Error::InvalidValue {
                        path: String::new(),
                        detail: format!("Unsupported command {cmd:?} on key {key:?}"),
                    });
                }
            }
        }

        Ok(())
    }

    /// Fetch the record for `key`, creating a bare one if absent, and mark it
    /// as touched by the reversal replay.
    fn reversal_record(&mut self, key: &str) -> &mut EnvVar {
        let key_name = self.canonical_key(key);

        let env_var = self.env.entry(key_name).or_insert_with(|| EnvVar {
            key: key.to_string(),
            ..EnvVar::default()
        });

        env_var.reversal = true;
        env_var
    }

    /// Compute the forward and reverse streams from the record map.
    pub fn make_diff(&mut self) {
        self.diff = Vec::new();
        self.reverse = Vec::new();

        let mut have_reverse_var = false;

        for env_var in self.env.values() {
            let key = env_var.key.clone();

            if env_var.delete {
                if key == ENV_REVERSE_VAR {
                    // Decided later, after all reversals are known.
                    have_reverse_var = true;
                    continue;
                }

                self.diff.push("DEL".to_string());
                self.diff.push(key.clone());

                // No reversal for deletions propagated from the previous env,
                // nor for keys that never existed before this run.
                if !env_var.reversal_delete && !env_var.created {
                    self.reverse.push("SET".to_string());
                    self.reverse.push(key);
                    self.reverse.push(env_var.original_value.clone());
                }

                continue;
            }

            let value = env_var.effective_value();

            // A record whose effective value matches ingestion produces no
            // diff, except that a pending reversal must still be applied.
            // A reversal-delete later updated with an empty value would look
            // unchanged as well, so it is excluded explicitly.
            if !(env_var.created || env_var.reversal_delete) && value == env_var.original_value {
                if env_var.reversal {
                    self.diff.push("SET".to_string());
                    self.diff.push(key);
                    self.diff.push(env_var.original_value.clone());
                }

                continue;
            }

            self.diff.push("SET".to_string());
            self.diff.push(key.clone());
            self.diff.push(value);

            if env_var.reversal_delete {
                // Propagate the undo-by-delete intent.
                self.reverse.push("DEL".to_string());
                self.reverse.push(key);
            } else if env_var.reversal {
                self.reverse.push("SET".to_string());
                self.reverse.push(key);
                self.reverse.push(env_var.original_value.clone());
            } else if env_var.original_value.is_empty() {
                // Key was created.
                self.reverse.push("DEL".to_string());
                self.reverse.push(key);
            } else {
                // Key was updated.
                self.reverse.push("SET".to_string());
                self.reverse.push(key);
                self.reverse.push(env_var.original_value.clone());
            }
        }

        if have_reverse_var && self.reverse.is_empty() {
            self.diff.push("DEL".to_string());
            self.diff.push(ENV_REVERSE_VAR.to_string());
        }
    }

    /// Write the forward diff, one token per line. When a reverse diff
    /// exists, its JSON encoding is appended as a final `SET` of the
    /// reserved variable.
    pub fn write_diff(&mut self, w: &mut dyn Write) -> Result<()> {
        if !self.reverse.is_empty() {
            let encoded =
                serde_json::to_string(&self.reverse).map_err(|err| Error::Serialization {
                    path: String::new(),
                    detail: "Failed to serialize reverse env var".to_string(),
                    source: Box::new(err),
                })?;

            self.diff.push("SET".to_string());
            self.diff.push(ENV_REVERSE_VAR.to_string());
            self.diff.push(encoded);
        }

        if self.diff.is_empty() {
            return Ok(());
        }

        writeln!(w, "{}", self.diff.join("\n")).map_err(|err| Error::Buffer { source: err })?;

        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn diff_tokens(&self) -> &[String] {
        &self.diff
    }

    #[cfg(test)]
    pub(crate) fn reverse_tokens(&self) -> &[String] {
        &self.reverse
    }
}
