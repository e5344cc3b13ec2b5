// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup: lock acquisition, the singleton socket check, component
//! wiring, and the one-shot reclaim pass (spec §4.4, §6.1).
//!
//! Sequencing mirrors the rule that matters most here: acquire the lock
//! file first (a failure there belongs to the already-running daemon, not
//! to us), validate everything else, and only bind the socket last, after
//! every other startup step has succeeded.

use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use af_adapters::ProcessLauncher;
use af_core::{NameAllocator, SystemClock};
use af_engine::{AgentPool, EventBufferRegistry, PoolConfig, SpawnRegistry};
use af_storage::SessionRegistryStore;
use fs2::FileExt;
use thiserror::Error;
use tokio::net::{UnixListener, UnixStream};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{Config, SpawnPolicy};
use crate::task_store::JsonTaskStore;

pub type DaemonPool = AgentPool<JsonTaskStore, ProcessLauncher, SystemClock>;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("another daemon is already running at {0}")]
    AlreadyRunning(PathBuf),
    #[error("failed to acquire lock at {0}: {1}")]
    LockFailed(PathBuf, std::io::Error),
    #[error("failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Store(#[from] af_storage::StoreError),
    #[error(transparent)]
    TaskStore(#[from] crate::task_store::TaskStoreError),
}

/// Fully wired daemon state, ready for the listener and control loops.
pub struct DaemonState {
    pub config: Config,
    pub pool: Arc<DaemonPool>,
    pub work_source: Arc<JsonTaskStore>,
    pub events: Arc<EventBufferRegistry>,
    pub spawn_registry: Arc<SpawnRegistry>,
    pub sessions: Arc<SessionRegistryStore>,
    pub shutdown: CancellationToken,
    /// Identifies this daemon's stream endpoint for session-registry keys
    /// (spec §3).
    pub server_ref: String,
    // Held only to keep the exclusive file lock alive; released on drop.
    #[allow(dead_code)]
    lock_file: std::fs::File,
}

/// Start the daemon: acquire the lock, verify no live instance owns the
/// socket, wire every component, run the one-shot reclaim pass, and bind
/// the listener (spec §4.4, §6.1).
pub async fn startup(config: Config) -> Result<(DaemonState, UnixListener), StartupError> {
    std::fs::create_dir_all(&config.state_dir)?;
    std::fs::create_dir_all(&config.log_dir)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&config.log_dir, std::fs::Permissions::from_mode(0o700))?;
    }

    let lock_path = config.state_dir.join("daemon.lock");
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)?;
    lock_file.try_lock_exclusive().map_err(|e| StartupError::LockFailed(lock_path.clone(), e))?;
    lock_file.set_len(0)?;
    {
        let mut f = &lock_file;
        writeln!(f, "{}", std::process::id())?;
    }

    // Singleton check (spec §6.1): only a confirmed-dead endpoint may be
    // removed before (re)binding.
    if config.socket_path.exists() {
        if UnixStream::connect(&config.socket_path).await.is_ok() {
            return Err(StartupError::AlreadyRunning(config.socket_path.clone()));
        }
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| StartupError::BindFailed(config.socket_path.clone(), e))?;

    let work_source = Arc::new(JsonTaskStore::open(&config.state_dir)?);
    let events = Arc::new(EventBufferRegistry::new());
    let names = match &config.name_allocator_wordlist {
        Some(path) => {
            let (adjectives, nouns) = load_wordlists(path);
            NameAllocator::with_wordlists(adjectives, nouns)
        }
        None => NameAllocator::new(),
    };
    let pool_config = PoolConfig {
        pool_size: config.pool_size,
        plan_label: config.plan_label.clone(),
        spawn_cmd: config.spawn_cmd.clone(),
        log_dir: config.log_dir.clone(),
        max_retries: config.max_retries,
        project: config.project.clone().unwrap_or_default(),
        prompt_dir: config.prompt_dir.clone(),
    };
    let pool = AgentPool::with_names(
        pool_config,
        Arc::clone(&work_source),
        Arc::new(ProcessLauncher),
        SystemClock,
        Arc::clone(&events),
        names,
    );
    let spawn_registry = Arc::new(SpawnRegistry::new(config.log_dir.clone()));
    let sessions = Arc::new(SessionRegistryStore::open(&config.state_dir)?);

    // spec §6.4: `spawn_policy = manual` disables poll/reclaim/reconcile.
    if config.spawn_policy == SpawnPolicy::Auto {
        let reclaimed = pool.reclaim().await;
        if reclaimed > 0 {
            info!(reclaimed, "reclaimed in-progress tasks on startup");
        }
    }

    let server_ref = config.socket_path.to_string_lossy().into_owned();

    Ok((
        DaemonState {
            config,
            pool,
            work_source,
            events,
            spawn_registry,
            sessions,
            shutdown: CancellationToken::new(),
            server_ref,
            lock_file,
        },
        listener,
    ))
}

/// `name_allocator_wordlist` holds one word per line: the first half seeds
/// the adjective pool, the second half the noun pool. An unreadable file
/// falls back to the built-in pool (handled by
/// `NameAllocator::with_wordlists`, which treats an empty side the same
/// way).
fn load_wordlists(path: &std::path::Path) -> (Vec<String>, Vec<String>) {
    let lines: Vec<String> = match std::fs::read_to_string(path) {
        Ok(contents) => {
            contents.lines().map(str::trim).filter(|l| !l.is_empty()).map(str::to_string).collect()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read name_allocator_wordlist, using built-in");
            return (Vec::new(), Vec::new());
        }
    };
    let mid = lines.len() / 2;
    let (adjectives, nouns) = lines.split_at(mid);
    (adjectives.to_vec(), nouns.to_vec())
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
