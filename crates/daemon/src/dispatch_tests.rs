use super::*;
use std::time::Duration;

use crate::config::{Config, SpawnPolicy};

fn test_config(state_dir: std::path::PathBuf) -> Config {
    let socket_path = state_dir.join("daemon.sock");
    Config {
        project: Some("demo".to_string()),
        spawn_policy: SpawnPolicy::Manual,
        pool_size: 2,
        poll_interval: Duration::from_secs(10),
        reconcile_interval: Duration::from_secs(30),
        max_retries: 3,
        solo: true,
        spawn_cmd: vec!["true".to_string()],
        prompt_dir: None,
        log_dir: state_dir.join("logs"),
        branch_prefix: "agent".to_string(),
        plan_label: "plan".to_string(),
        repo_path: std::path::PathBuf::from("."),
        main_ref: "origin/main".to_string(),
        state_dir,
        socket_path,
        name_allocator_wordlist: None,
    }
}

async fn build_state() -> (tempfile::TempDir, DaemonState, tokio::net::UnixListener) {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path().to_path_buf());
    let (state, listener) = crate::startup::startup(config).await.expect("startup");
    (dir, state, listener)
}

#[tokio::test]
async fn status_full_reports_empty_pool() {
    let (_dir, state, _listener) = build_state().await;
    let response = dispatch(&state, Request::StatusFull).await;
    assert!(response.success);
    let result = response.result.expect("result present");
    assert_eq!(result["pool_mode"], "active");
    assert_eq!(result["agents"].as_array().expect("agents array").len(), 0);
}

#[tokio::test]
async fn pool_mode_transitions_round_trip() {
    let (_dir, state, _listener) = build_state().await;
    let response = dispatch(&state, Request::PoolDrain).await;
    assert!(response.success);
    assert_eq!(response.result.expect("result")["mode"], "draining");
    assert_eq!(state.pool.mode(), af_core::PoolMode::Draining);

    let response = dispatch(&state, Request::PoolResume).await;
    assert!(response.success);
    assert_eq!(response.result.expect("result")["mode"], "active");
    assert_eq!(state.pool.mode(), af_core::PoolMode::Active);
}

#[tokio::test]
async fn invalid_pool_transition_is_reported_as_invalid_input() {
    let (_dir, state, _listener) = build_state().await;
    let paused = dispatch(&state, Request::PoolPause).await;
    assert!(paused.success);
    let response = dispatch(&state, Request::PoolDrain).await;
    assert!(!response.success);
    assert_eq!(response.code, Some(af_core::ErrorCode::InvalidInput));
}

#[tokio::test]
async fn status_agent_for_unknown_agent_is_not_found() {
    let (_dir, state, _listener) = build_state().await;
    let response =
        dispatch(&state, Request::StatusAgent { agent_name: "ghost".to_string(), limit: None }).await;
    assert!(!response.success);
    assert_eq!(response.code, Some(af_core::ErrorCode::NotFound));
}

#[tokio::test]
async fn spawn_register_then_logs_path_then_deregister() {
    let (_dir, state, _listener) = build_state().await;
    let register = dispatch(
        &state,
        Request::SpawnRegister {
            spawn_id: "sp1".to_string(),
            pid: 4242,
            prompt: "do the thing".to_string(),
        },
    )
    .await;
    assert!(register.success);

    let logs = dispatch(&state, Request::LogsPath { agent_name: "sp1".to_string() }).await;
    assert!(logs.success);
    assert!(logs.result.expect("result")["path"].as_str().expect("path string").contains("sp1"));

    let deregister = dispatch(&state, Request::SpawnDeregister { spawn_id: "sp1".to_string() }).await;
    assert!(deregister.success);

    let missing = dispatch(&state, Request::LogsPath { agent_name: "sp1".to_string() }).await;
    assert!(!missing.success);
    assert_eq!(missing.code, Some(af_core::ErrorCode::NotFound));
}

#[tokio::test]
async fn duplicate_spawn_register_is_conflict() {
    let (_dir, state, _listener) = build_state().await;
    let first = dispatch(
        &state,
        Request::SpawnRegister { spawn_id: "dup".to_string(), pid: 1, prompt: "x".to_string() },
    )
    .await;
    assert!(first.success);
    let second = dispatch(
        &state,
        Request::SpawnRegister { spawn_id: "dup".to_string(), pid: 2, prompt: "y".to_string() },
    )
    .await;
    assert!(!second.success);
    assert_eq!(second.code, Some(af_core::ErrorCode::Conflict));
}

#[tokio::test]
async fn session_event_without_agent_is_unknown_agent_but_still_ok() {
    let (_dir, state, _listener) = build_state().await;
    let response = dispatch(
        &state,
        Request::SessionEvent {
            agent_id: "ghost".to_string(),
            event_type: "session.created".to_string(),
            session_id: None,
            data: serde_json::json!({ "info": { "id": "sess-1" } }),
        },
    )
    .await;
    assert!(response.success);
}

#[tokio::test]
async fn events_list_for_unknown_session_is_empty() {
    let (_dir, state, _listener) = build_state().await;
    let response = dispatch(
        &state,
        Request::EventsList { session_id: "nope".to_string(), after: None, limit: None },
    )
    .await;
    assert!(response.success);
    assert_eq!(response.result.expect("result").as_array().expect("array").len(), 0);
}

#[tokio::test]
async fn shutdown_cancels_the_token() {
    let (_dir, state, _listener) = build_state().await;
    assert!(!state.shutdown.is_cancelled());
    let response = dispatch(&state, Request::Shutdown).await;
    assert!(response.success);
    assert!(state.shutdown.is_cancelled());
}
