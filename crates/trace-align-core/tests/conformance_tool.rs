//! Subprocess behaviour of the conformance jar runner.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::tempdir;
use trace_align_core::{AlignError, AlignmentEngine, JarConformanceChecker, ToolConfig};

fn script(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-java.sh");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn config(program: &Path, output_dir: &Path, timeout_secs: u64) -> ToolConfig {
    ToolConfig {
        program: program.display().to_string(),
        jar_path: PathBuf::from("align.jar"),
        output_dir: output_dir.to_path_buf(),
        log_file: "purchasing.xes".to_string(),
        timeout_secs,
    }
}

#[tokio::test]
async fn hung_tool_times_out() {
    let dir = tempdir().unwrap();
    let program = script(dir.path(), "sleep 5");
    let engine = JarConformanceChecker::new(config(&program, dir.path(), 1));

    let err = engine.compute_alignments().await.unwrap_err();
    assert!(matches!(err, AlignError::ToolTimeout { secs: 1 }));
}

#[tokio::test]
async fn tool_receives_jar_arguments() {
    let dir = tempdir().unwrap();
    let program = script(dir.path(), "echo \"$@\"");
    let engine = JarConformanceChecker::new(config(&program, dir.path(), 10));

    let run = engine.compute_alignments().await.unwrap();
    assert!(run.stdout.starts_with("-jar align.jar"));
    assert!(run.stdout.contains("purchasing.xes purchasing.bpmn true"));
}

#[tokio::test]
async fn failing_tool_surfaces_stderr() {
    let dir = tempdir().unwrap();
    let program = script(dir.path(), "echo 'cannot open model' >&2\nexit 3");
    let engine = JarConformanceChecker::new(config(&program, dir.path(), 10));

    match engine.compute_alignments().await.unwrap_err() {
        AlignError::ToolFailed { exit_code, stderr } => {
            assert_eq!(exit_code, 3);
            assert_eq!(stderr, "cannot open model");
        }
        other => panic!("expected ToolFailed, got {other:?}"),
    }
}
