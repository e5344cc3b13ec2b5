use super::*;
use crate::config::{Config, SpawnPolicy};
use af_wire::{read_message, write_message};
use std::time::Duration;

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

#[tokio::test]
async fn round_trips_one_request_per_connection() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path().to_path_buf());
    let socket_path = config.socket_path.clone();
    let (state, listener) = crate::startup::startup(config).await.expect("startup");
    let shutdown = state.shutdown.clone();
    let state = Arc::new(state);

    let server = tokio::spawn(run_listener(listener, Arc::clone(&state), shutdown.clone()));

    let mut client = UnixStream::connect(&socket_path).await.expect("connect");
    write_message(&mut client, &Request::StatusFull).await.expect("write request");
    let response: Response = read_message(&mut client).await.expect("read response");
    assert!(response.success);

    shutdown.cancel();
    server.await.expect("listener task joins cleanly");
}

#[tokio::test]
async fn client_disconnect_before_sending_is_logged_not_panicked() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path().to_path_buf());
    let socket_path = config.socket_path.clone();
    let (state, listener) = crate::startup::startup(config).await.expect("startup");
    let shutdown = state.shutdown.clone();
    let state = Arc::new(state);

    let server = tokio::spawn(run_listener(listener, Arc::clone(&state), shutdown.clone()));

    {
        let client = UnixStream::connect(&socket_path).await.expect("connect");
        drop(client);
    }
    // Give the spawned per-connection task a chance to observe the close.
    tokio::time::sleep(Duration::from_millis(50)).await;

    shutdown.cancel();
    server.await.expect("listener task joins cleanly");
}
