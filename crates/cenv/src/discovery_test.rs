// Copyright (c) Contributors to the cenv project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;
use tempfile::TempDir;

use super::*;
use crate::error::ErrorKind;

const FILENAME: &str = ".cenv-discovery-test.yaml";

fn load_config(dir: &Path) -> LoadConfig {
    LoadConfig {
        dir: dir.to_string_lossy().into_owned(),
        filename: FILENAME.to_string(),
        ..LoadConfig::default()
    }
}

fn overwrite(dir: &Path, file: &Path) -> Overwrite {
    Overwrite {
        dir: dir.to_string_lossy().into_owned(),
        file: file.to_string_lossy().into_owned(),
        ..Overwrite::default()
    }
}

fn write_file(path: &Path, content: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn paths_of(files: &[EnvFile]) -> Vec<(PathBuf, PathBuf)> {
    files
        .iter()
        .map(|f| (f.dir.clone(), f.filepath.clone()))
        .collect()
}

#[rstest]
fn empty_overwrite_dir_is_missing_value() {
    let tmp = TempDir::new().unwrap();

    let overwrites = vec![Overwrite::default()];
    let err = find_files(&load_config(tmp.path()), &overwrites).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MissingValue);
    assert_eq!(err.path(), ".env.overwrites[0].dir");
}

#[rstest]
fn non_absolute_overwrite_dir_is_invalid_value() {
    let tmp = TempDir::new().unwrap();

    let overwrites = vec![
        overwrite(tmp.path(), Path::new("whatever.yaml")),
        Overwrite {
            dir: ".".to_string(),
            ..Overwrite::default()
        },
    ];

    let err = find_files(&load_config(tmp.path()), &overwrites).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidValue);
    assert_eq!(err.path(), ".env.overwrites[1].dir");
}

#[rstest]
fn missing_overwrite_file_is_fatal() {
    let tmp = TempDir::new().unwrap();

    let overwrites = vec![overwrite(tmp.path(), &tmp.path().join("missing.yaml"))];
    let err = find_files(&load_config(tmp.path()), &overwrites).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.path(), ".env.overwrites[0].file");
    assert_eq!(err.status(), 404);
}

#[rstest]
fn unparseable_file_is_serialization_error() {
    let tmp = TempDir::new().unwrap();
    write_file(&tmp.path().join(FILENAME), "commands: {not a list");

    let err = find_files(&load_config(tmp.path()), &[]).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Serialization);
}

#[rstest]
fn no_env_files_anywhere() {
    let tmp = TempDir::new().unwrap();

    let files = find_files(&load_config(tmp.path()), &[]).unwrap();

    assert!(files.is_empty());
}

#[rstest]
fn walk_is_innermost_first() {
    let tmp = TempDir::new().unwrap();
    let one = tmp.path().join("1");
    let two = one.join("2");

    write_file(&two.join(FILENAME), "");
    write_file(&one.join(FILENAME), "");
    write_file(&tmp.path().join(FILENAME), "root: true");

    let files = find_files(&load_config(&two), &[]).unwrap();

    assert_eq!(
        paths_of(&files),
        [
            (two.clone(), two.join(FILENAME)),
            (one.clone(), one.join(FILENAME)),
            (tmp.path().to_path_buf(), tmp.path().join(FILENAME)),
        ]
    );
}

#[rstest]
fn walk_tolerates_gaps() {
    let tmp = TempDir::new().unwrap();
    let two = tmp.path().join("1").join("2");

    // No file in `1`; the walk simply moves past it.
    std::fs::create_dir_all(&two).unwrap();
    write_file(&two.join(FILENAME), "");
    write_file(&tmp.path().join(FILENAME), "root: true");

    let files = find_files(&load_config(&two), &[]).unwrap();

    assert_eq!(
        paths_of(&files),
        [
            (two.clone(), two.join(FILENAME)),
            (tmp.path().to_path_buf(), tmp.path().join(FILENAME)),
        ]
    );
}

#[rstest]
fn root_file_stops_walk() {
    let tmp = TempDir::new().unwrap();
    let one = tmp.path().join("1");

    write_file(&one.join(FILENAME), "root: true");
    write_file(&tmp.path().join(FILENAME), "");

    let files = find_files(&load_config(&one), &[]).unwrap();

    assert_eq!(paths_of(&files), [(one.clone(), one.join(FILENAME))]);
    assert!(files[0].root);
}

#[rstest]
fn overwrite_root_short_circuits() {
    let tmp = TempDir::new().unwrap();
    let b = tmp.path().join("a").join("b");
    let c = b.join("c");
    let ov_file = tmp.path().join("ov.yaml");

    write_file(&c.join(FILENAME), "");
    write_file(&tmp.path().join("a").join(FILENAME), "");
    write_file(&tmp.path().join(FILENAME), "");
    write_file(&ov_file, "");

    let mut ov = overwrite(&b, &ov_file);
    ov.root = true;

    let files = find_files(&load_config(&c), &[ov]).unwrap();

    // The override stands in for b's env file and terminates the walk; the
    // files above b are never read.
    assert_eq!(
        paths_of(&files),
        [(c.clone(), c.join(FILENAME)), (b.clone(), ov_file.clone())]
    );
    assert!(files[1].root);
}

#[rstest]
fn overwrite_skip_skips_directory() {
    let tmp = TempDir::new().unwrap();
    let one = tmp.path().join("1");
    let two = one.join("2");

    write_file(&two.join(FILENAME), "");
    write_file(&one.join(FILENAME), "");
    write_file(&tmp.path().join(FILENAME), "root: true");

    let mut ov = overwrite(&one, Path::new("/unread.yaml"));
    ov.skip = true;

    let files = find_files(&load_config(&two), &[ov]).unwrap();

    assert_eq!(
        paths_of(&files),
        [
            (two.clone(), two.join(FILENAME)),
            (tmp.path().to_path_buf(), tmp.path().join(FILENAME)),
        ]
    );
}

#[rstest]
fn overwrite_skip_with_root_stops_walk() {
    let tmp = TempDir::new().unwrap();
    let one = tmp.path().join("1");
    let two = one.join("2");

    write_file(&two.join(FILENAME), "");
    write_file(&tmp.path().join(FILENAME), "");

    let mut ov = overwrite(&one, Path::new("/unread.yaml"));
    ov.skip = true;
    ov.root = true;

    let files = find_files(&load_config(&two), &[ov]).unwrap();

    assert_eq!(paths_of(&files), [(two.clone(), two.join(FILENAME))]);
}

#[rstest]
fn multiple_overwrites_same_dir_reverse_declaration_order() {
    let tmp = TempDir::new().unwrap();
    let one = tmp.path().join("1");
    let two = one.join("2");

    let ov1 = tmp.path().join("overwrite-1.yaml");
    let ov2 = tmp.path().join("overwrite-2.yaml");
    let ov3 = tmp.path().join("overwrite-3.yaml");

    write_file(&two.join(FILENAME), "");
    write_file(&tmp.path().join(FILENAME), "root: true");
    write_file(&ov1, "");
    write_file(&ov2, "");
    write_file(&ov3, "");

    let overwrites = vec![
        overwrite(&one, &ov1),
        overwrite(&one, &ov2),
        overwrite(&one, &ov3),
    ];

    let files = find_files(&load_config(&two), &overwrites).unwrap();

    // Same-directory entries land in reverse declaration order so that
    // reverse-order execution applies ov1 first.
    assert_eq!(
        paths_of(&files),
        [
            (two.clone(), two.join(FILENAME)),
            (one.clone(), ov3.clone()),
            (one.clone(), ov2.clone()),
            (one.clone(), ov1.clone()),
            (tmp.path().to_path_buf(), tmp.path().join(FILENAME)),
        ]
    );
}

#[rstest]
fn overwrite_content_root_stops_mid_directory() {
    let tmp = TempDir::new().unwrap();
    let one = tmp.path().join("1");

    let ov1 = tmp.path().join("overwrite-1.yaml");
    let ov2 = tmp.path().join("overwrite-2.yaml");
    let ov3 = tmp.path().join("overwrite-3.yaml");

    std::fs::create_dir_all(&one).unwrap();
    write_file(&ov1, "");
    write_file(&ov2, "root: true");
    write_file(&ov3, "");

    let overwrites = vec![
        overwrite(&one, &ov1),
        overwrite(&one, &ov2),
        overwrite(&one, &ov3),
    ];

    let files = find_files(&load_config(&one), &overwrites).unwrap();

    // ov2's own root flag terminates the walk; ov3 is never read.
    assert_eq!(
        paths_of(&files),
        [(one.clone(), ov2.clone()), (one.clone(), ov1.clone())]
    );
}

#[rstest]
fn toml_files_parse_by_extension() {
    let tmp = TempDir::new().unwrap();
    let ov_file = tmp.path().join("ov.toml");

    write_file(
        &ov_file,
        r#"
root = true

[[commands]]
set = "FOO"
value = "bar"
"#,
    );

    let mut ov = overwrite(tmp.path(), &ov_file);
    ov.root = true;

    let files = find_files(&load_config(tmp.path()), &[ov]).unwrap();

    assert_eq!(files.len(), 1);
    assert_eq!(files[0].commands.len(), 1);
    assert_eq!(files[0].commands[0].set, "FOO");
    assert_eq!(files[0].commands[0].value, "bar");
}

#[rstest]
fn commands_parse_with_cmds_alias() {
    let tmp = TempDir::new().unwrap();

    write_file(
        &tmp.path().join(FILENAME),
        r#"
root: true
cmds:
  - add: PATH
    value: ./bin
    append: true
    platform: linux_amd64
  - del: TEMP
"#,
    );

    let files = find_files(&load_config(tmp.path()), &[]).unwrap();

    assert_eq!(files.len(), 1);

    let commands = &files[0].commands;
    assert_eq!(commands.len(), 2);
    assert_eq!(commands[0].add, "PATH");
    assert_eq!(commands[0].value, "./bin");
    assert!(commands[0].append);
    assert_eq!(commands[0].platform, "linux_amd64");
    assert_eq!(commands[1].del, "TEMP");
}

#[rstest]
fn no_duplicate_dir_file_pairs() {
    let tmp = TempDir::new().unwrap();
    let one = tmp.path().join("1");
    let two = one.join("2");

    write_file(&two.join(FILENAME), "");
    write_file(&one.join(FILENAME), "");
    write_file(&tmp.path().join(FILENAME), "root: true");

    let files = find_files(&load_config(&two), &[]).unwrap();

    let mut pairs = paths_of(&files);
    pairs.sort();
    pairs.dedup();
    assert_eq!(pairs.len(), files.len());
}
