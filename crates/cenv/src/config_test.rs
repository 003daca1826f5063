// Copyright (c) Contributors to the cenv project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;
use tempfile::TempDir;

use super::*;
use crate::error::ErrorKind;

#[rstest]
fn load_yaml_config() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("config.yaml");

    std::fs::write(
        &path,
        r#"
log_level: debug
case_sensitive_filesystem: true
env:
  load:
    dir: /srv/project
    filename: .env.yaml
    no_log_duration: true
  overwrites:
    - dir: /srv
      file: /etc/cenv/base.yaml
      root: true
"#,
    )
    .unwrap();

    let config = Config::load(&path).unwrap();

    assert_eq!(config.log_level, "debug");
    assert_eq!(config.case_sensitive_filesystem, Some(true));
    assert_eq!(config.case_insensitive_environment, None);

    let env = config.env.unwrap();
    let load = env.load.unwrap();
    assert_eq!(load.dir, "/srv/project");
    assert_eq!(load.filename, ".env.yaml");
    assert!(load.no_log_duration);

    assert_eq!(env.overwrites.len(), 1);
    assert_eq!(env.overwrites[0].dir, "/srv");
    assert!(env.overwrites[0].root);
    assert!(!env.overwrites[0].skip);
}

#[rstest]
fn load_toml_config_by_extension() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("config.toml");

    std::fs::write(
        &path,
        r#"
log_level = "warn"

[env.load]
dir = "/work"
"#,
    )
    .unwrap();

    let config = Config::load(&path).unwrap();

    assert_eq!(config.log_level, "warn");
    assert_eq!(config.env.unwrap().load.unwrap().dir, "/work");
}

#[rstest]
fn body_expands_process_env_vars() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("config.yaml");

    std::env::set_var("CENV_CONFIG_TEST_HOME", "/home/tester");

    std::fs::write(
        &path,
        "env:\n  load:\n    dir: $CENV_CONFIG_TEST_HOME/project\n",
    )
    .unwrap();

    let config = Config::load(&path).unwrap();

    assert_eq!(
        config.env.unwrap().load.unwrap().dir,
        "/home/tester/project"
    );

    std::env::remove_var("CENV_CONFIG_TEST_HOME");
}

#[rstest]
fn unreadable_config_is_file_error() {
    let tmp = TempDir::new().unwrap();

    let err = Config::load(&tmp.path().join("missing.yaml")).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::File);
}

#[rstest]
fn invalid_config_is_serialization_error() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("config.yaml");

    std::fs::write(&path, "env: [not, a, mapping]").unwrap();

    let err = Config::load(&path).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Serialization);
    assert_eq!(err.status(), 400);
}

#[rstest]
fn find_without_config_path_is_default() {
    // The test environment does not set CENV_CONFIG_PATH.
    if std::env::var_os(crate::ENV_CONFIG_PATH_VAR).is_none() {
        let config = Config::find().unwrap();

        assert!(config.env.is_none());
        assert!(config.log_level.is_empty());
    }
}
