// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::fake::FakeLauncher;
use super::*;
use std::path::PathBuf;

fn spec() -> ChildSpec {
    ChildSpec {
        program: "agent-harness".to_string(),
        args: vec!["--task".to_string(), "t-1".to_string()],
        log_path: PathBuf::from("/tmp/does-not-matter.jsonl"),
        cwd: None,
    }
}

#[tokio::test]
async fn fake_launcher_records_the_spec() {
    let launcher = FakeLauncher::new();
    let handle = launcher.spawn(&spec()).await.unwrap();
    assert!(handle.pid >= 1000);
    assert_eq!(launcher.call_count(), 1);
    assert_eq!(launcher.calls()[0].program, "agent-harness");
}

#[tokio::test]
async fn fake_launcher_default_exit_is_zero() {
    let launcher = FakeLauncher::new();
    let handle = launcher.spawn(&spec()).await.unwrap();
    assert_eq!(handle.wait().await, 0);
}

#[tokio::test]
async fn fake_launcher_scripted_exit_codes_are_fifo() {
    let launcher = FakeLauncher::new();
    launcher.push_exit(2);
    launcher.push_exit(0);
    let h1 = launcher.spawn(&spec()).await.unwrap();
    let h2 = launcher.spawn(&spec()).await.unwrap();
    assert_eq!(h1.wait().await, 2);
    assert_eq!(h2.wait().await, 0);
}

#[cfg(unix)]
#[tokio::test]
async fn real_process_launcher_spawns_and_waits() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("agent.jsonl");
    let spec = ChildSpec {
        program: "/bin/sh".to_string(),
        args: vec!["-c".to_string(), "exit 7".to_string()],
        log_path,
        cwd: None,
    };
    let launcher = ProcessLauncher;
    let handle = launcher.spawn(&spec).await.unwrap();
    assert_eq!(handle.wait().await, 7);
}

#[cfg(unix)]
#[test]
fn is_alive_reports_false_for_a_pid_that_cannot_exist() {
    assert!(!is_alive(u32::MAX));
}
