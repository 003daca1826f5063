// Copyright (c) Contributors to the cenv project.
// SPDX-License-Identifier: Apache-2.0

//! Discovery of env files: walk from the start directory up to the
//! filesystem root, honoring configured overrides and root markers.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::{LoadConfig, Overwrite};
use crate::error::{Error, Result};
use crate::file::EnvFile;
use crate::paths;
use crate::{DEFAULT_ENV_FILENAME, DEFAULT_ENV_LOAD_DIR};

#[cfg(test)]
#[path = "./discovery_test.rs"]
mod discovery_test;

/// Find the ordered list of env files for a load.
///
/// The result is innermost-first: index 0 is closest to the start directory.
/// Execution iterates the list in reverse, so outermost files apply first and
/// inner files override them. Entries configured for the same directory are
/// therefore inserted in reverse declaration order.
pub fn find_files(load: &LoadConfig, overwrites: &[Overwrite]) -> Result<Vec<EnvFile>> {
    let load_dir = load.dir.trim();
    let load_dir = if load_dir.is_empty() {
        DEFAULT_ENV_LOAD_DIR
    } else {
        load_dir
    };

    let mut dir = paths::absolutize(Path::new(load_dir)).map_err(|err| Error::Filesystem {
        detail: format!("Failed to get absolute path of load dir {load_dir:?}"),
        source: err,
    })?;

    let filename = load.filename.trim();
    let filename = if filename.is_empty() {
        DEFAULT_ENV_FILENAME
    } else {
        filename
    };

    // There might be multiple overwrites for the same directory. The cleaned
    // dir is the only lookup key.
    let mut global_overwrites: HashMap<PathBuf, Vec<(usize, &Overwrite)>> =
        HashMap::with_capacity(overwrites.len());

    for (i, overwrite) in overwrites.iter().enumerate() {
        let overwrite_dir = overwrite.dir.trim();

        if overwrite_dir.is_empty() {
            return Err(Error::MissingValue {
                path: format!(".env.overwrites[{i}].dir"),
                detail: "Overwrite dir cannot be empty.".to_string(),
            });
        }

        let clean_dir = paths::clean(Path::new(overwrite_dir));

        if !clean_dir.is_absolute() {
            return Err(Error::InvalidValue {
                path: format!(".env.overwrites[{i}].dir"),
                detail: "Overwrite dir must be absolute.".to_string(),
            });
        }

        global_overwrites.entry(clean_dir).or_default().push((i, overwrite));
    }

    let mut files: Vec<EnvFile> = Vec::new();

    'walk: loop {
        match global_overwrites.get(dir.as_path()) {
            Some(entries) => {
                // Index among the files actually added for this directory;
                // skipped entries do not shift their siblings.
                let mut added = 0;

                for (config_index, overwrite) in entries {
                    if overwrite.skip {
                        if overwrite.root {
                            break 'walk;
                        }

                        continue;
                    }

                    let filepath = resolve_override_file(*config_index, &overwrite.file)?;
                    let mut file = read_env_file(&filepath, Some(*config_index))?;

                    if overwrite.root {
                        file.root = true;
                    }

                    file.dir = dir.clone();
                    file.filepath = filepath;

                    let file_index = if added == 0 {
                        files.len()
                    } else {
                        files.len() - added
                    };

                    tracing::debug!(
                        dir = %file.dir.display(),
                        file = %file.filepath.display(),
                        file_index,
                        overwrite_index = added,
                        root = file.root,
                        "env file"
                    );

                    let root = file.root;
                    files.insert(file_index, file);
                    added += 1;

                    if root {
                        break 'walk;
                    }
                }
            }
            None => {
                let filepath = dir.join(filename);

                match std::fs::read_to_string(&filepath) {
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                        // The directory simply has no env file.
                    }
                    Err(err) => {
                        return Err(Error::File {
                            path: String::new(),
                            filepath,
                            source: err,
                        });
                    }
                    Ok(body) => {
                        let mut file = parse_env_file(&filepath, &body, None)?;
                        file.dir = dir.clone();
                        file.filepath = filepath;

                        tracing::debug!(
                            dir = %file.dir.display(),
                            file = %file.filepath.display(),
                            file_index = files.len(),
                            root = file.root,
                            "env file"
                        );

                        let root = file.root;
                        files.push(file);

                        if root {
                            break;
                        }
                    }
                }
            }
        }

        match dir.parent() {
            Some(parent) if parent != dir => dir = parent.to_path_buf(),
            _ => break,
        }
    }

    Ok(files)
}

/// Resolve an override's file path, expanding a leading `~/` against the
/// home directory.
fn resolve_override_file(config_index: usize, file: &str) -> Result<PathBuf> {
    if let Some(rest) = file.strip_prefix("~/") {
        let home = dirs::home_dir().ok_or_else(|| Error::InvalidValue {
            path: format!(".env.overwrites[{config_index}].file"),
            detail: "Cannot resolve ~ without a home directory.".to_string(),
        })?;

        return Ok(home.join(rest));
    }

    Ok(PathBuf::from(file))
}

/// Read and parse an override env file. Not-found is fatal here, unlike for
/// directory-default files.
fn read_env_file(filepath: &Path, config_index: Option<usize>) -> Result<EnvFile> {
    let path = config_index
        .map(|i| format!(".env.overwrites[{i}].file"))
        .unwrap_or_default();

    let body = std::fs::read_to_string(filepath).map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound {
                path: path.clone(),
                filepath: filepath.to_path_buf(),
                source: err,
            }
        } else {
            Error::File {
                path: path.clone(),
                filepath: filepath.to_path_buf(),
                source: err,
            }
        }
    })?;

    parse_env_file(filepath, &body, config_index)
}

/// Parse an env-file body as TOML when the extension says so, YAML otherwise.
fn parse_env_file(filepath: &Path, body: &str, config_index: Option<usize>) -> Result<EnvFile> {
    let path = config_index
        .map(|i| format!(".env.overwrites[{i}].file"))
        .unwrap_or_default();

    let ext = filepath
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    if ext == "toml" {
        toml::from_str(body).map_err(|err| Error::Serialization {
            path,
            detail: format!("Failed to unmarshal toml file {filepath:?}"),
            source: Box::new(err),
        })
    } else {
        // An empty or comment-only document is a valid, empty env file.
        let value: serde_yaml::Value =
            serde_yaml::from_str(body).map_err(|err| Error::Serialization {
                path: path.clone(),
                detail: format!("Failed to unmarshal yaml file {filepath:?}"),
                source: Box::new(err),
            })?;

        if value.is_null() {
            return Ok(EnvFile::default());
        }

        serde_yaml::from_value(value).map_err(|err| Error::Serialization {
            path,
            detail: format!("Failed to unmarshal yaml file {filepath:?}"),
            source: Box::new(err),
        })
    }
}
