// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The agent pool (spec §2 "Agent pool", §4.1, §4.2).
//!
//! Holds up to `pool_size` slots and spawns/reaps/respawns child processes
//! with strict accounting against the task store. Every public operation
//! takes the pool's single async lock for its whole duration, which is
//! what makes the claim-then-spawn sequence (I1) and the mode/poller
//! ordering guarantee (spec §5) hold without extra coordination.
//!
//! The waiter per live agent (Design Note §9) is a plain tokio task that
//! blocks on `ChildHandle::wait` and sends a reap message down an
//! unbounded channel; `run_reap_loop` is the single consumer that performs
//! the actual state transition under the pool lock, so no waiter ever
//! blocks on I/O while holding it.

use af_adapters::launcher::terminate;
use af_adapters::prompt::{builtin_template, render};
use af_adapters::role::infer_role;
use af_adapters::{ChildSpec, LaunchError, Launcher, PromptError, WorkSource, WorkSourceError};
use af_core::{AgentRecord, Clock, ErrorCode, NameAllocator, PoolMode, Role};
use parking_lot::Mutex as SyncMutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tracing::{info, warn};

use crate::events::EventBufferRegistry;
use crate::spawn_registry::sanitize;

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub pool_size: usize,
    pub plan_label: String,
    /// `spawn_cmd[0]` is the program; the rest are fixed leading args. The
    /// rendered prompt is appended as the terminal argument (spec §4.1
    /// step 7).
    pub spawn_cmd: Vec<String>,
    pub log_dir: PathBuf,
    pub max_retries: u32,
    pub project: String,
    /// Overrides the built-in `{{task_id}}`-only templates when set
    /// (SPEC_FULL §5): `prompt_dir/worker.txt` / `prompt_dir/planner.txt`.
    pub prompt_dir: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error(transparent)]
    WorkSource(#[from] WorkSourceError),
    #[error(transparent)]
    Launch(#[from] LaunchError),
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("pool is at capacity")]
    Full,
    #[error("task {0} is already owned by a live agent")]
    AlreadyOwned,
    #[error("agent {0} not found")]
    NotFound(String),
    #[error("invalid mode transition")]
    InvalidTransition,
}

impl PoolError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::WorkSource(e) => e.code(),
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::Full => ErrorCode::RegistryFull,
            Self::InvalidTransition | Self::AlreadyOwned => ErrorCode::InvalidInput,
            Self::Launch(_) | Self::Io(_) => ErrorCode::StoreError,
            Self::Prompt(_) => ErrorCode::InvalidInput,
        }
    }
}

struct PoolState {
    agents: HashMap<String, AgentRecord>,
}

struct ReapMsg {
    agent_id: String,
    exit_code: i32,
}

pub struct AgentPool<W, L, C> {
    config: PoolConfig,
    mode: SyncMutex<PoolMode>,
    state: AsyncMutex<PoolState>,
    work_source: Arc<W>,
    launcher: Arc<L>,
    clock: C,
    names: NameAllocator,
    events: Arc<EventBufferRegistry>,
    reap_tx: mpsc::UnboundedSender<ReapMsg>,
    reap_rx: AsyncMutex<Option<mpsc::UnboundedReceiver<ReapMsg>>>,
}

impl<W, L, C> AgentPool<W, L, C>
where
    W: WorkSource + 'static,
    L: Launcher + 'static,
    C: Clock + 'static,
{
    pub fn new(
        config: PoolConfig,
        work_source: Arc<W>,
        launcher: Arc<L>,
        clock: C,
        events: Arc<EventBufferRegistry>,
    ) -> Arc<Self> {
        Self::with_names(config, work_source, launcher, clock, events, NameAllocator::new())
    }

    /// Like `new`, but with a caller-supplied name allocator (used by the
    /// daemon to honor `name_allocator_wordlist`, SPEC_FULL §1.3).
    pub fn with_names(
        config: PoolConfig,
        work_source: Arc<W>,
        launcher: Arc<L>,
        clock: C,
        events: Arc<EventBufferRegistry>,
        names: NameAllocator,
    ) -> Arc<Self> {
        let (reap_tx, reap_rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            config,
            mode: SyncMutex::new(PoolMode::Active),
            state: AsyncMutex::new(PoolState { agents: HashMap::new() }),
            work_source,
            launcher,
            clock,
            names,
            events,
            reap_tx,
            reap_rx: AsyncMutex::new(Some(reap_rx)),
        })
    }

    pub fn mode(&self) -> PoolMode {
        *self.mode.lock()
    }

    /// The configured `pool_size` (spec §4.7, §6.4): max concurrent agents,
    /// independent of how many slots are currently filled.
    pub fn capacity(&self) -> usize {
        self.config.pool_size
    }

    /// Serialized with the pool lock as a whole (spec §4.2): the mode is
    /// a plain `parking_lot::Mutex`, but every caller that needs a
    /// consistent view of mode-plus-slots already holds `self.state`
    /// across its decision, so a transition here is visible to the
    /// poller before its next tick (spec §5).
    pub fn transition(&self, next: PoolMode) -> Result<PoolMode, PoolError> {
        let mut mode = self.mode.lock();
        if !mode.can_transition_to(next) {
            return Err(PoolError::InvalidTransition);
        }
        *mode = next;
        Ok(next)
    }

    pub async fn status(&self) -> Vec<AgentRecord> {
        self.state.lock().await.agents.values().cloned().collect()
    }

    pub async fn get(&self, agent_id: &str) -> Option<AgentRecord> {
        self.state.lock().await.agents.get(agent_id).cloned()
    }

    /// `kill(name)`: send a termination signal and let the reaper clean up
    /// (spec §4.1 "Kill", §4.9).
    pub async fn kill(&self, agent_id: &str) -> Result<(String, u32), PoolError> {
        let pid = {
            let state = self.state.lock().await;
            state
                .agents
                .get(agent_id)
                .map(|a| a.pid)
                .ok_or_else(|| PoolError::NotFound(agent_id.to_string()))?
        };
        terminate(pid).map_err(PoolError::Io)?;
        Ok((agent_id.to_string(), pid))
    }

    /// Bind a session id to an agent (spec §4.6, I4). Idempotent and
    /// monotonic: accepts a later event with the same id, rejects one with
    /// a different id.
    pub async fn bind_session(&self, agent_id: &str, session_id: &str) -> bool {
        let mut state = self.state.lock().await;
        match state.agents.get_mut(agent_id) {
            Some(record) => record.bind_session(session_id),
            None => false,
        }
    }

    /// Push eligible tasks into the pool, in the order the task store
    /// returned them, skipping already-owned ids and stopping once the
    /// pool is full (spec §4.1 "try_assign", §4.3 ordering).
    pub async fn try_assign(self: &Arc<Self>, tasks: &[af_core::TaskRef]) -> usize {
        if !self.mode().schedules_new_work() {
            return 0;
        }
        let mut assigned = 0;
        for task in tasks {
            match self.spawn_for_task(&task.id, false, 0).await {
                Ok(()) => assigned += 1,
                Err(PoolError::AlreadyOwned) => continue,
                Err(PoolError::Full) => break,
                Err(e) => warn!(task_id = %task.id, error = %e, "spawn failed"),
            }
        }
        assigned
    }

    /// One-shot startup recovery: respawn sessions for tasks the store
    /// reports `in_progress` but the pool doesn't own, capped at
    /// `pool_size` (spec §4.4).
    pub async fn reclaim(self: &Arc<Self>) -> usize {
        let tasks = match self.work_source.in_progress(&self.config.project).await {
            Ok(tasks) => tasks,
            Err(e) => {
                warn!(error = %e, "reclaim: in_progress query failed");
                return 0;
            }
        };
        let mut reclaimed = 0;
        for task in tasks {
            if reclaimed >= self.config.pool_size {
                break;
            }
            match self.spawn_for_task(&task.id, true, 0).await {
                Ok(()) => reclaimed += 1,
                Err(PoolError::AlreadyOwned) => continue,
                Err(PoolError::Full) => break,
                Err(e) => warn!(task_id = %task.id, error = %e, "reclaim spawn failed"),
            }
        }
        info!(reclaimed, "reclaim complete");
        reclaimed
    }

    /// The spawn sequence (spec §4.1 steps 1-9), run under the pool lock
    /// for its whole duration so ownership/capacity checks and the claim
    /// stay consistent (I1, I2).
    async fn spawn_for_task(
        self: &Arc<Self>,
        task_id: &str,
        skip_claim: bool,
        retry_count: u32,
    ) -> Result<(), PoolError> {
        let mut state = self.state.lock().await;
        if state.agents.values().any(|a| a.task_id == task_id) {
            return Err(PoolError::AlreadyOwned);
        }
        if state.agents.len() >= self.config.pool_size {
            return Err(PoolError::Full);
        }

        // Step 1: fetch metadata, infer role.
        let meta = self.work_source.meta(task_id).await?;
        let role = infer_role(&meta, &self.config.plan_label);

        // Step 2: render the prompt; reject any unresolved `{{...}}`.
        let mut vars = HashMap::new();
        vars.insert("task_id", task_id);
        let template = resolve_template(self.config.prompt_dir.as_deref(), role);
        let prompt = render(&template, &vars)?;

        // Step 3: derive the log path.
        let log_path = self.config.log_dir.join(format!("{}.jsonl", sanitize(task_id)));

        // Step 4: allocate an agent id.
        let agent_id = self.names.allocate();

        // Step 5: open/create the log file before claiming anything.
        if let Err(e) = touch_log_file(&log_path) {
            self.names.release(&agent_id);
            return Err(e.into());
        }

        // Step 6: claim, unless this is a respawn/reclaim of an
        // already-claimed task.
        if !skip_claim {
            if let Err(e) = self.work_source.claim(task_id).await {
                self.names.release(&agent_id);
                let _ = std::fs::remove_file(&log_path);
                return Err(e.into());
            }
        }

        // Step 7/8: build argv, appending the rendered prompt as the
        // terminal argument, and launch.
        let (program, mut args) = split_spawn_cmd(&self.config.spawn_cmd);
        args.push(prompt);
        let spec = ChildSpec { program, args, log_path: log_path.clone(), cwd: None };
        let handle = match self.launcher.spawn(&spec).await {
            Ok(handle) => handle,
            Err(e) => {
                self.names.release(&agent_id);
                let _ = std::fs::remove_file(&log_path);
                if !skip_claim {
                    let _ = self.work_source.yield_(task_id).await;
                }
                return Err(e.into());
            }
        };

        // Step 9: insert the record and start its waiter.
        let mut record = AgentRecord::new(
            agent_id.clone(),
            task_id.to_string(),
            role,
            handle.pid,
            self.clock.now(),
            self.clock.epoch_ms(),
            log_path,
        );
        record.retry_count = retry_count;
        state.agents.insert(agent_id.clone(), record);
        drop(state);

        self.spawn_waiter(agent_id, handle);
        Ok(())
    }

    fn spawn_waiter(self: &Arc<Self>, agent_id: String, handle: af_adapters::ChildHandle) {
        let pool = Arc::clone(self);
        tokio::spawn(async move {
            let exit_code = handle.wait().await;
            let _ = pool.reap_tx.send(ReapMsg { agent_id, exit_code });
        });
    }

    /// Runs until the channel is dropped. Spawn once at daemon startup;
    /// consumes the receiver so a second call is a no-op.
    pub async fn run_reap_loop(self: Arc<Self>) {
        let mut rx = match self.reap_rx.lock().await.take() {
            Some(rx) => rx,
            None => return,
        };
        while let Some(msg) = rx.recv().await {
            self.handle_reap(msg.agent_id, msg.exit_code).await;
        }
    }

    async fn handle_reap(self: &Arc<Self>, agent_id: String, exit_code: i32) {
        let removed = self.state.lock().await.agents.remove(&agent_id);
        let Some(record) = removed else {
            return;
        };
        self.names.release(&record.id);
        if let Some(session_id) = &record.session_id {
            self.events.remove(session_id);
        }

        if exit_code == 0 {
            info!(agent_id = %record.id, task_id = %record.task_id, "agent exited cleanly");
            return;
        }

        let mode = self.mode();
        if record.retry_count < self.config.max_retries && mode.respawns_on_crash() {
            warn!(
                agent_id = %record.id, task_id = %record.task_id, exit_code,
                retry_count = record.retry_count, "agent crashed, respawning"
            );
            if let Err(e) =
                self.spawn_for_task(&record.task_id, true, record.retry_count + 1).await
            {
                warn!(task_id = %record.task_id, error = %e, "respawn failed");
            }
        } else {
            warn!(
                agent_id = %record.id, task_id = %record.task_id, exit_code,
                retry_count = record.retry_count,
                "giving up respawn; task left in_progress for reclaim"
            );
        }
    }

    /// Force-remove a record whose waiter hasn't fired but whose PID is
    /// observably dead (spec §4.1 "Sweeper").
    pub async fn sweep_dead(&self) -> usize {
        let dead: Vec<String> = {
            let state = self.state.lock().await;
            state
                .agents
                .values()
                .filter(|a| !af_adapters::launcher::is_alive(a.pid))
                .map(|a| a.id.clone())
                .collect()
        };
        for agent_id in &dead {
            let removed = self.state.lock().await.agents.remove(agent_id);
            if let Some(record) = removed {
                self.names.release(&record.id);
                if let Some(session_id) = &record.session_id {
                    self.events.remove(session_id);
                }
            }
        }
        dead.len()
    }
}

/// `prompt_dir/worker.txt` / `prompt_dir/planner.txt` override the built-in
/// templates when present (SPEC_FULL §5); missing or unreadable overrides
/// silently fall back to the built-in so a partial `prompt_dir` never
/// blocks a spawn.
fn resolve_template(prompt_dir: Option<&std::path::Path>, role: Role) -> String {
    if let Some(dir) = prompt_dir {
        let file = match role {
            Role::Worker => "worker.txt",
            Role::Planner => "planner.txt",
            Role::Spawn => "spawn.txt",
        };
        if let Ok(contents) = std::fs::read_to_string(dir.join(file)) {
            return contents;
        }
    }
    builtin_template(role).to_string()
}

/// Creates the log file (and its parent directory) with the restrictive
/// permissions spec §6.3 requires: `0700` on the directory, `0600` on the
/// file.
fn touch_log_file(path: &std::path::Path) -> std::io::Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
        set_dir_permissions(dir)?;
    }
    let file = std::fs::File::create(path)?;
    set_file_permissions(&file)?;
    Ok(())
}

#[cfg(unix)]
fn set_dir_permissions(dir: &std::path::Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700))
}

#[cfg(not(unix))]
fn set_dir_permissions(_dir: &std::path::Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(file: &std::fs::File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn set_file_permissions(_file: &std::fs::File) -> std::io::Result<()> {
    Ok(())
}

fn split_spawn_cmd(cmd: &[String]) -> (String, Vec<String>) {
    match cmd.split_first() {
        Some((program, rest)) => (program.clone(), rest.to_vec()),
        None => (String::new(), Vec::new()),
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
