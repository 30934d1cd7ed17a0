// shelf-rs: Central Package Release Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::builder::{ProcessBuilder, StreamFlags};
use crate::error::ProcessError;

#[tokio::test]
async fn test_process_echo() {
    let output = ProcessBuilder::which("echo")
        .expect("echo should resolve")
        .arg("hello")
        .capture_stdout()
        .run()
        .await
        .expect("echo should succeed");

    assert!(output.success());
    insta::assert_snapshot!(output.stdout().trim(), @"hello");
}

#[tokio::test]
async fn test_non_zero_exit_folds_output_into_error() {
    let err = ProcessBuilder::raw("echo 'compiler exploded' >&2; exit 3")
        .name("build")
        .stderr_flags(StreamFlags::FORWARD_TO_LOG | StreamFlags::KEEP_IN_STRING)
        .run()
        .await
        .expect_err("non-zero exit should fail");

    let process_err = err
        .downcast_ref::<ProcessError>()
        .expect("should be a ProcessError");
    insta::assert_snapshot!(process_err.to_string(), @r"
    process 'build' exited with code 3:
    compiler exploded
    ");
}

#[tokio::test]
async fn test_non_zero_exit_falls_back_to_stdout() {
    let err = ProcessBuilder::raw("echo 'stdout only'; exit 1")
        .name("install")
        .capture_stdout()
        .run()
        .await
        .expect_err("non-zero exit should fail");

    assert!(err.to_string().contains("stdout only"), "{err}");
}

#[tokio::test]
async fn test_process_env_layers_over_inherited() {
    let output = ProcessBuilder::raw("echo \"$SHELF_TEST_VAR:${PATH:+has-path}\"")
        .env("SHELF_TEST_VAR", "test_value")
        .capture_stdout()
        .run()
        .await
        .expect("process should succeed");

    insta::assert_snapshot!(output.stdout().trim(), @"test_value:has-path");
}

#[tokio::test]
async fn test_process_cwd() {
    let temp = tempfile::tempdir().expect("temp dir");
    std::fs::write(temp.path().join("marker.txt"), "x").expect("write");
    let output = ProcessBuilder::raw("ls")
        .cwd(temp.path())
        .capture_stdout()
        .run()
        .await
        .expect("process should succeed");

    assert_eq!(output.stdout().trim(), "marker.txt");
}

#[test]
fn test_executable_lookup() {
    let builder = ProcessBuilder::which("sh").expect("sh should resolve");
    assert!(builder.program().is_absolute());
    assert!(builder.program().exists());

    let program = "nonexistent_program_12345";
    let err = ProcessBuilder::which(program).expect_err("should not resolve");
    assert!(matches!(err, ProcessError::ExecutableNotFound { .. }));
    assert!(err.to_string().contains(program));
}
