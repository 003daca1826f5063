// Copyright (c) Contributors to the cenv project.
// SPDX-License-Identifier: Apache-2.0

//! Command records and the methods that apply them to the container.

use serde::{Deserialize, Serialize};

use crate::container::Container;
use crate::error::{Error, Result};
use crate::path::{PathHandler, PathLoader};
use crate::template::TemplateHandler;

#[cfg(test)]
#[path = "./command_test.rs"]
mod command_test;

/// A single declarative command from an env file.
///
/// Exactly one of `add`/`set`/`del` is non-empty in a well-formed command,
/// carrying the target key. `declare` and `uri` are accepted by the format
/// but not interpreted by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Command {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub add: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub set: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub del: String,

    /// Template source for the value of `add` and `set`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,

    /// Platform tag constraint, e.g. `linux_amd64`. Non-matching commands
    /// are skipped.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub platform: String,

    /// Insert at the tail instead of the head (`add` only).
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub append: bool,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub declare: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uri: String,
}

/// The action a command performs, with its target key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action<'a> {
    Add(&'a str),
    Set(&'a str),
    Del(&'a str),
}

impl Command {
    /// The command's action, or `None` for a malformed command that names no
    /// target at all.
    pub fn action(&self) -> Option<Action<'_>> {
        if !self.add.is_empty() {
            Some(Action::Add(&self.add))
        } else if !self.set.is_empty() {
            Some(Action::Set(&self.set))
        } else if !self.del.is_empty() {
            Some(Action::Del(&self.del))
        } else {
            None
        }
    }
}

/// Applies `add`/`set`/`del` semantics to the container.
pub(crate) struct CommandMethods {
    pub path_handler: PathHandler,
    pub path_loader: PathLoader,
    pub template_handler: TemplateHandler,
}

impl CommandMethods {
    /// Insert the expanded value into the key's path list, promoting the
    /// record to path-list form first. Prepends by default; `append` inserts
    /// at the tail. Resurrects a previously deleted key.
    pub fn add(&self, container: &mut Container, cmd: &Command) -> Result<()> {
        if cmd.value.is_empty() {
            return Err(Error::MissingValue {
                path: String::new(),
                detail: format!("Missing value for add on key {:?}", cmd.add),
            });
        }

        let value = self.template_handler.handle(&cmd.value, container)?;

        let env_var = container.fetch_or_create(&cmd.add);

        // Ensure key persists if it was deleted before.
        env_var.delete = false;

        self.path_loader.load(env_var)?;

        let index = if cmd.append { -1 } else { 0 };
        self.path_handler.add(env_var, &value, index)?;

        Ok(())
    }

    /// Assign the expanded value to the key. Resurrects a previously deleted
    /// key. A record already promoted to path-list form keeps its list and
    /// flag: the scalar write lands in `current_value` but the emitted value
    /// remains the joined list.
    pub fn set(&self, container: &mut Container, cmd: &Command) -> Result<()> {
        let value = self.template_handler.handle(&cmd.value, container)?;

        let env_var = container.fetch_or_create(&cmd.set);
        env_var.current_value = value;

        // Ensure key persists if it was deleted before.
        env_var.delete = false;

        Ok(())
    }

    /// Mark the key for deletion; `*` deletes every known key. A missing key
    /// is a silent no-op.
    pub fn del(&self, container: &mut Container, cmd: &Command) -> Result<()> {
        if cmd.del == "*" {
            for env_var in container.env.values_mut() {
                env_var.reset_and_delete();
            }

            return Ok(());
        }

        let key_name = container.canonical_key(&cmd.del);

        if let Some(env_var) = container.env.get_mut(&key_name) {
            env_var.reset_and_delete();
        }

        Ok(())
    }
}

/// Filters commands by platform and dispatches them to the methods.
pub(crate) struct CommandLoader {
    pub platform: String,
    pub command_methods: CommandMethods,
}

impl CommandLoader {
    pub fn load(&self, container: &mut Container, cmd: &Command) -> Result<()> {
        if !cmd.platform.is_empty() && cmd.platform != self.platform {
            return Ok(());
        }

        match cmd.action() {
            Some(Action::Add(_)) => self.command_methods.add(container, cmd),
            Some(Action::Set(_)) => self.command_methods.set(container, cmd),
            Some(Action::Del(_)) => self.command_methods.del(container, cmd),
            None => Err(Error::InvalidValue {
                path: String::new(),
                detail: "Command has none of add/set/del".to_string(),
            }),
        }
    }
}
