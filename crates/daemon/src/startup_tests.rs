use super::*;
use crate::config::SpawnPolicy;
use std::time::Duration;

fn test_config(state_dir: std::path::PathBuf, socket_path: std::path::PathBuf) -> Config {
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
async fn startup_binds_socket_and_wires_components() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path().to_path_buf(), dir.path().join("daemon.sock"));
    let (state, _listener) = startup(config).await.expect("startup should succeed");
    assert!(state.config.socket_path.exists());
    assert_eq!(state.pool.status().await.len(), 0);
}

#[tokio::test]
async fn second_startup_with_same_lock_path_fails_fast() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config_a = test_config(dir.path().to_path_buf(), dir.path().join("daemon.sock"));
    let (state_a, _listener_a) = startup(config_a).await.expect("first startup succeeds");

    let config_b = test_config(dir.path().to_path_buf(), dir.path().join("daemon.sock"));
    let err = startup(config_b).await.expect_err("second startup must fail");
    assert!(matches!(err, StartupError::LockFailed(_, _)));
    drop(state_a);
}

#[tokio::test]
async fn second_startup_against_a_live_socket_from_a_different_state_dir_is_already_running() {
    let dir_a = tempfile::tempdir().expect("tempdir a");
    let dir_b = tempfile::tempdir().expect("tempdir b");
    let shared_socket = dir_a.path().join("daemon.sock");

    let config_a = test_config(dir_a.path().to_path_buf(), shared_socket.clone());
    let (state_a, _listener_a) = startup(config_a).await.expect("first startup succeeds");

    let config_b = test_config(dir_b.path().to_path_buf(), shared_socket);
    let err = startup(config_b).await.expect_err("second startup must see the live socket");
    assert!(matches!(err, StartupError::AlreadyRunning(_)));
    drop(state_a);
}

#[tokio::test]
async fn stale_socket_file_is_removed_and_rebound() {
    let dir = tempfile::tempdir().expect("tempdir");
    let socket_path = dir.path().join("daemon.sock");

    // A leftover socket file with nothing listening behind it.
    {
        let listener = UnixListener::bind(&socket_path).expect("bind stale listener");
        drop(listener);
    }
    assert!(socket_path.exists(), "bind() leaves the file behind after drop");

    let config = test_config(dir.path().to_path_buf(), socket_path);
    let (_state, _listener) = startup(config).await.expect("stale socket must be cleaned up and rebound");
}

#[tokio::test]
async fn manual_spawn_policy_skips_the_startup_reclaim_pass() {
    use crate::task_store::JsonTaskStore;
    use af_core::{TaskMeta, TaskStatus};
    use std::collections::BTreeSet;

    let dir = tempfile::tempdir().expect("tempdir");
    let store = JsonTaskStore::open(dir.path()).expect("open task store");
    store
        .put(TaskMeta {
            id: "t-1".to_string(),
            title: "orphaned".to_string(),
            description: String::new(),
            definition_of_done: String::new(),
            status: TaskStatus::InProgress,
            priority: 1,
            labels: BTreeSet::new(),
            dependencies: Vec::new(),
            logs: Vec::new(),
        })
        .expect("seed in-progress task");
    drop(store);

    let config = test_config(dir.path().to_path_buf(), dir.path().join("daemon.sock"));
    assert_eq!(config.spawn_policy, SpawnPolicy::Manual);
    let (state, _listener) = startup(config).await.expect("startup should succeed");

    // Reclaim never ran: no agent was spawned for the orphaned task.
    assert_eq!(state.pool.status().await.len(), 0);
}

#[test]
fn wordlist_loader_falls_back_to_empty_on_missing_file() {
    let (adjectives, nouns) = load_wordlists(std::path::Path::new("/nonexistent/wordlist.txt"));
    assert!(adjectives.is_empty());
    assert!(nouns.is_empty());
}

#[test]
fn wordlist_loader_splits_lines_in_half() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("words.txt");
    std::fs::write(&path, "brisk\nnoble\nwolf\nhawk\n").expect("write wordlist");
    let (adjectives, nouns) = load_wordlists(&path);
    assert_eq!(adjectives, vec!["brisk".to_string(), "noble".to_string()]);
    assert_eq!(nouns, vec!["wolf".to_string(), "hawk".to_string()]);
}
