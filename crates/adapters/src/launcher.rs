// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process launcher (spec §2 "Process launcher", §4.1 steps 7-9).
//!
//! Starts a child in its own process session so a killed daemon never
//! orphans a child shell, redirects stdout/stderr to the per-agent log
//! file the pool already opened, and hands back a handle whose `wait()`
//! is driven by the agent's waiter task (Design Note §9: "one task/fiber
//! per live agent that blocks on process exit").

use async_trait::async_trait;
use std::fs::File;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::{Child, Command};
use tokio::sync::oneshot;

#[derive(Debug, Clone)]
pub struct ChildSpec {
    pub program: String,
    /// Full argv, with the rendered prompt already appended as the final
    /// argument (spec §4.1 step 7).
    pub args: Vec<String>,
    pub log_path: PathBuf,
    pub cwd: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("failed to open log file {0}: {1}")]
    LogOpen(PathBuf, std::io::Error),
    #[error("failed to spawn child: {0}")]
    Spawn(std::io::Error),
}

enum Inner {
    Real(Child),
    Fake(oneshot::Receiver<i32>),
}

/// A running child process. `pid` is fixed at spawn time; `wait` consumes
/// the handle when the owning waiter task observes exit.
pub struct ChildHandle {
    pub pid: u32,
    inner: Inner,
}

impl ChildHandle {
    /// Block until the child exits, returning its exit code (1 if it was
    /// terminated by a signal or the wait itself failed, matching the
    /// teacher's convention of never surfacing a negative/None code to the
    /// reaper).
    pub async fn wait(self) -> i32 {
        match self.inner {
            Inner::Real(mut child) => match child.wait().await {
                Ok(status) => status.code().unwrap_or(1),
                Err(_) => 1,
            },
            Inner::Fake(rx) => rx.await.unwrap_or(1),
        }
    }
}

/// Boundary over child-process creation (spec §2 "Process launcher").
#[async_trait]
pub trait Launcher: Send + Sync {
    async fn spawn(&self, spec: &ChildSpec) -> Result<ChildHandle, LaunchError>;
}

/// Real launcher backed by `tokio::process::Command`.
#[derive(Default)]
pub struct ProcessLauncher;

#[async_trait]
impl Launcher for ProcessLauncher {
    async fn spawn(&self, spec: &ChildSpec) -> Result<ChildHandle, LaunchError> {
        let log_out = File::create(&spec.log_path)
            .map_err(|e| LaunchError::LogOpen(spec.log_path.clone(), e))?;
        let log_err =
            log_out.try_clone().map_err(|e| LaunchError::LogOpen(spec.log_path.clone(), e))?;

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);
        cmd.stdout(Stdio::from(log_out));
        cmd.stderr(Stdio::from(log_err));
        cmd.stdin(Stdio::null());
        if let Some(cwd) = &spec.cwd {
            cmd.current_dir(cwd);
        }
        // New process session so a killed daemon doesn't orphan the child
        // shell (SPEC_FULL §4: `setsid`-equivalent via process_group(0)).
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let child = cmd.spawn().map_err(LaunchError::Spawn)?;
        let pid = child.id().ok_or_else(|| {
            LaunchError::Spawn(std::io::Error::other("child exited before pid was observable"))
        })?;
        Ok(ChildHandle { pid, inner: Inner::Real(child) })
    }
}

/// Send a termination signal to `pid` (spec §4.1 "Kill").
#[cfg(unix)]
pub fn terminate(pid: u32) -> std::io::Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;
    kill(Pid::from_raw(pid as i32), Signal::SIGTERM).map_err(std::io::Error::other)
}

/// Probe whether `pid` is still alive via signal 0 (spec §4.1 "Sweeper").
#[cfg(unix)]
pub fn is_alive(pid: u32) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;
    kill(Pid::from_raw(pid as i32), None).is_ok()
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Scripted exit code/delay for one spawn, consumed in FIFO order.
    struct ScriptedExit {
        delay_ms: u64,
        exit_code: i32,
    }

    /// Records every `spawn` call and lets tests script exit behavior
    /// without touching a real process table (SPEC_FULL §4).
    #[derive(Clone)]
    pub struct FakeLauncher {
        inner: Arc<Mutex<State>>,
    }

    struct State {
        scripts: std::collections::VecDeque<ScriptedExit>,
        calls: Vec<ChildSpec>,
        next_pid: u32,
    }

    impl Default for FakeLauncher {
        fn default() -> Self {
            Self::new()
        }
    }

    impl FakeLauncher {
        pub fn new() -> Self {
            Self {
                inner: Arc::new(Mutex::new(State {
                    scripts: std::collections::VecDeque::new(),
                    calls: Vec::new(),
                    next_pid: 1000,
                })),
            }
        }

        /// Queue the next spawn's exit code (FIFO). Unscripted spawns exit 0.
        pub fn push_exit(&self, exit_code: i32) {
            self.inner.lock().scripts.push_back(ScriptedExit { delay_ms: 0, exit_code });
        }

        pub fn push_exit_delayed(&self, exit_code: i32, delay_ms: u64) {
            self.inner.lock().scripts.push_back(ScriptedExit { delay_ms, exit_code });
        }

        pub fn calls(&self) -> Vec<ChildSpec> {
            self.inner.lock().calls.clone()
        }

        pub fn call_count(&self) -> usize {
            self.inner.lock().calls.len()
        }
    }

    #[async_trait]
    impl Launcher for FakeLauncher {
        async fn spawn(&self, spec: &ChildSpec) -> Result<ChildHandle, LaunchError> {
            let (pid, delay_ms, exit_code) = {
                let mut inner = self.inner.lock();
                inner.calls.push(spec.clone());
                let pid = inner.next_pid;
                inner.next_pid += 1;
                let script =
                    inner.scripts.pop_front().unwrap_or(ScriptedExit { delay_ms: 0, exit_code: 0 });
                (pid, script.delay_ms, script.exit_code)
            };
            let (tx, rx) = oneshot::channel();
            tokio::spawn(async move {
                if delay_ms > 0 {
                    tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
                }
                let _ = tx.send(exit_code);
            });
            Ok(ChildHandle { pid, inner: Inner::Fake(rx) })
        }
    }
}

#[cfg(test)]
#[path = "launcher_tests.rs"]
mod tests;
