// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use af_adapters::worksource::fake::FakeWorkSource;
use af_adapters::FakeLauncher;
use af_core::{FakeClock, TaskMeta, TaskRef, TaskStatus};
use std::collections::BTreeSet;
use tempfile::tempdir;

fn meta(id: &str) -> TaskMeta {
    TaskMeta {
        id: id.to_string(),
        title: "hello".to_string(),
        description: String::new(),
        definition_of_done: String::new(),
        status: TaskStatus::Open,
        priority: 1,
        labels: BTreeSet::new(),
        dependencies: Vec::new(),
        logs: Vec::new(),
    }
}

fn make_pool(
    pool_size: usize,
    max_retries: u32,
    log_dir: std::path::PathBuf,
) -> (Arc<AgentPool<FakeWorkSource, FakeLauncher, FakeClock>>, Arc<FakeWorkSource>, FakeLauncher) {
    let work_source = Arc::new(FakeWorkSource::new());
    let launcher = FakeLauncher::new();
    let config = PoolConfig {
        pool_size,
        plan_label: "plan".to_string(),
        spawn_cmd: vec!["agent-harness".to_string()],
        log_dir,
        max_retries,
        project: "proj".to_string(),
        prompt_dir: None,
    };
    let pool = AgentPool::new(
        config,
        Arc::clone(&work_source),
        Arc::new(launcher.clone()),
        FakeClock::new(),
        Arc::new(EventBufferRegistry::new()),
    );
    (pool, work_source, launcher)
}

#[tokio::test]
async fn happy_path_spawns_claims_once_and_frees_on_clean_exit() {
    let dir = tempdir().unwrap();
    let (pool, work_source, launcher) = make_pool(1, 3, dir.path().to_path_buf());
    work_source.insert_meta(meta("t-1"));
    launcher.push_exit(0);

    let assigned = pool
        .try_assign(&[TaskRef { id: "t-1".into(), priority: 1, title: "hello".into() }])
        .await;
    assert_eq!(assigned, 1);
    assert_eq!(work_source.claimed(), vec!["t-1".to_string()]);
    assert_eq!(pool.status().await.len(), 1);

    let record = pool.status().await.into_iter().next().unwrap();
    // The rendered prompt is the final argv element.
    let call = &launcher.calls()[0];
    assert_eq!(call.args.last().unwrap(), &record.task_id_prompt_placeholder());

    Arc::clone(&pool).run_reap_loop().await;
    assert_eq!(pool.status().await.len(), 0);
    assert_eq!(work_source.claimed().len(), 1, "no additional claim on clean exit");
}

// Helper trait only for the happy-path prompt assertion above.
trait PromptPlaceholder {
    fn task_id_prompt_placeholder(&self) -> String;
}
impl PromptPlaceholder for af_core::AgentRecord {
    fn task_id_prompt_placeholder(&self) -> String {
        format!("You are an autonomous worker agent. Complete task {}.", self.task_id)
    }
}

#[tokio::test]
async fn try_assign_skips_already_owned_tasks() {
    let dir = tempdir().unwrap();
    let (pool, work_source, launcher) = make_pool(2, 3, dir.path().to_path_buf());
    work_source.insert_meta(meta("t-1"));
    launcher.push_exit_delayed(0, 50);

    let tasks = vec![
        TaskRef { id: "t-1".into(), priority: 1, title: "hello".into() },
        TaskRef { id: "t-1".into(), priority: 1, title: "hello".into() },
    ];
    let assigned = pool.try_assign(&tasks).await;
    assert_eq!(assigned, 1, "duplicate ready-list entries spawn at most once");
    assert_eq!(launcher.call_count(), 1);
}

#[tokio::test]
async fn try_assign_stops_when_pool_is_full() {
    let dir = tempdir().unwrap();
    let (pool, work_source, launcher) = make_pool(1, 3, dir.path().to_path_buf());
    work_source.insert_meta(meta("t-1"));
    work_source.insert_meta(meta("t-2"));
    launcher.push_exit_delayed(0, 200);

    let tasks = vec![
        TaskRef { id: "t-1".into(), priority: 1, title: "a".into() },
        TaskRef { id: "t-2".into(), priority: 1, title: "b".into() },
    ];
    let assigned = pool.try_assign(&tasks).await;
    assert_eq!(assigned, 1);
    assert_eq!(pool.status().await.len(), 1);
}

#[tokio::test]
async fn crash_and_retry_yields_max_retries_plus_one_spawns() {
    let dir = tempdir().unwrap();
    let (pool, work_source, launcher) = make_pool(1, 3, dir.path().to_path_buf());
    work_source.insert_meta(meta("t-1"));
    launcher.push_exit(2);
    launcher.push_exit(2);
    launcher.push_exit(2);
    launcher.push_exit(0);

    pool.try_assign(&[TaskRef { id: "t-1".into(), priority: 1, title: "a".into() }]).await;

    let pool_clone = Arc::clone(&pool);
    let reap_task = tokio::spawn(pool_clone.run_reap_loop());
    // Give the reap loop a moment to drain the scripted exits.
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    reap_task.abort();

    assert_eq!(launcher.call_count(), 4, "three failures plus the final success");
    assert_eq!(work_source.claimed().len(), 1, "no additional claim calls on respawn");
}

#[tokio::test]
async fn draining_mode_blocks_new_work_but_still_respawns_crashes() {
    let dir = tempdir().unwrap();
    let (pool, work_source, launcher) = make_pool(2, 3, dir.path().to_path_buf());
    work_source.insert_meta(meta("t-1"));
    work_source.insert_meta(meta("t-2"));
    launcher.push_exit_delayed(2, 10);

    pool.try_assign(&[TaskRef { id: "t-1".into(), priority: 1, title: "a".into() }]).await;
    pool.transition(PoolMode::Draining).unwrap();

    let assigned =
        pool.try_assign(&[TaskRef { id: "t-2".into(), priority: 1, title: "b".into() }]).await;
    assert_eq!(assigned, 0, "draining mode does not schedule new work");

    let pool_clone = Arc::clone(&pool);
    let reap_task = tokio::spawn(pool_clone.run_reap_loop());
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    reap_task.abort();
    assert!(launcher.call_count() >= 2, "a crashed agent is still respawned while draining");
}

#[tokio::test]
async fn reclaim_spawns_without_claiming() {
    let dir = tempdir().unwrap();
    let (pool, work_source, launcher) = make_pool(1, 3, dir.path().to_path_buf());
    work_source.insert_meta(meta("t-1"));
    work_source.set_in_progress(vec![TaskRef { id: "t-1".into(), priority: 1, title: "a".into() }]);
    launcher.push_exit_delayed(0, 200);

    let reclaimed = pool.reclaim().await;
    assert_eq!(reclaimed, 1);
    assert!(work_source.claimed().is_empty(), "reclaim must not call claim");
}

#[tokio::test]
async fn mode_cannot_transition_from_paused_to_draining() {
    let dir = tempdir().unwrap();
    let (pool, _work_source, _launcher) = make_pool(1, 3, dir.path().to_path_buf());
    pool.transition(PoolMode::Paused).unwrap();
    let err = pool.transition(PoolMode::Draining).unwrap_err();
    assert!(matches!(err, PoolError::InvalidTransition));
}

#[tokio::test]
async fn empty_pool_never_spawns() {
    let dir = tempdir().unwrap();
    let (pool, work_source, _launcher) = make_pool(0, 3, dir.path().to_path_buf());
    work_source.insert_meta(meta("t-1"));
    let assigned =
        pool.try_assign(&[TaskRef { id: "t-1".into(), priority: 1, title: "a".into() }]).await;
    assert_eq!(assigned, 0);
    assert!(pool.status().await.is_empty());
}
