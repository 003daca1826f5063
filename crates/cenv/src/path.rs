// Copyright (c) Contributors to the cenv project.
// SPDX-License-Identifier: Apache-2.0

//! Path-list handling for `PATH`-style variables.
//!
//! The ordered element list is the canonical form of such a variable; the
//! scalar value is split into it lazily on first mutation.

use std::path::Path;

use crate::container::EnvVar;
use crate::error::{Error, Result};
use crate::{paths, platform};

#[cfg(test)]
#[path = "./path_test.rs"]
mod path_test;

/// Inserts normalized, de-duplicated elements into a record's path list.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PathHandler {
    pub case_sensitive_filesystem: bool,
}

impl PathHandler {
    /// Insert `value` into the record's path list at `index`.
    ///
    /// The value is trimmed and lexically absolutized first. Membership is
    /// decided by the filesystem's case discipline, so a path differing only
    /// in casing from an existing element is a no-op on case-insensitive
    /// filesystems. Negative indices count from the end (`-1` appends);
    /// out-of-range indices clamp.
    pub fn add(&self, env_var: &mut EnvVar, value: &str, index: isize) -> Result<()> {
        let clean_value = paths::absolutize(Path::new(value.trim())).map_err(|err| {
            Error::Filesystem {
                detail: format!(
                    "Failed to calculate absolute path value for key {}: {value}.",
                    env_var.key
                ),
                source: err,
            }
        })?;

        let clean_value = clean_value.to_string_lossy().into_owned();

        let compare_value = if self.case_sensitive_filesystem {
            clean_value.clone()
        } else {
            clean_value.to_uppercase()
        };

        // The provided path is already in the list.
        if !env_var.path_seen.insert(compare_value) {
            return Ok(());
        }

        let len = env_var.path_elements.len() as isize;
        let position = if index < 0 { len + index + 1 } else { index };
        let position = position.clamp(0, len) as usize;

        env_var.path_elements.insert(position, clean_value);

        Ok(())
    }
}

/// Promotes a record to path-list form by splitting its current value.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PathLoader {
    pub path_handler: PathHandler,
}

impl PathLoader {
    /// Split the record's current value into its ordered path list.
    ///
    /// Idempotent: a record already in path-list form is left untouched. The
    /// scalar value is cleared once consumed; empty elements are dropped.
    pub fn load(&self, env_var: &mut EnvVar) -> Result<()> {
        if env_var.path_list {
            return Ok(());
        }

        env_var.path_list = true;
        let value = std::mem::take(&mut env_var.current_value);

        if value.is_empty() {
            return Ok(());
        }

        for element in value.split(platform::LIST_SEPARATOR) {
            if element.is_empty() {
                continue;
            }

            self.path_handler.add(env_var, element, -1)?;
        }

        Ok(())
    }
}
