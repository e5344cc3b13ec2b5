// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task store data model (spec §3) and the in-pool agent record.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Instant;

/// Read-only view of a ready task, as returned by `WorkSource::ready`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskRef {
    pub id: String,
    pub priority: i64,
    pub title: String,
}

/// Task lifecycle status in the external task store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Open,
    InProgress,
    Reviewing,
    Done,
    Blocked,
    Draft,
    Canceled,
}

/// One entry in a task's log, as stored by the task store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskLogEntry {
    pub message: String,
    pub created_at: String,
}

/// Sparse task metadata — only the fields the core uses are modeled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskMeta {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub definition_of_done: String,
    pub status: TaskStatus,
    pub priority: i64,
    #[serde(default)]
    pub labels: BTreeSet<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub logs: Vec<TaskLogEntry>,
}

impl TaskMeta {
    /// The message of the most recent log entry, if any.
    pub fn tail_log(&self) -> Option<&str> {
        self.logs.last().map(|e| e.message.as_str())
    }
}

/// The role a spawned agent plays, inferred from task labels (spec §4.1).
///
/// `Spawn` is never inferred from a task — it only ever labels an ad-hoc
/// spawn-registry entry (spec §3 "Spawn entry").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Worker,
    Planner,
    Spawn,
}

impl Default for Role {
    fn default() -> Self {
        Self::Worker
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Worker => write!(f, "worker"),
            Self::Planner => write!(f, "planner"),
            Self::Spawn => write!(f, "spawn"),
        }
    }
}

/// One live pool slot (spec §3 "Agent record").
#[derive(Debug, Clone)]
pub struct AgentRecord {
    pub id: String,
    pub task_id: String,
    pub role: Role,
    pub pid: u32,
    /// Monotonic spawn instant, used for liveness bookkeeping and uptime.
    pub spawn_time: Instant,
    /// Wall-clock spawn time, for display.
    pub spawn_time_epoch_ms: u64,
    pub log_path: PathBuf,
    pub session_id: Option<String>,
    pub retry_count: u32,
}

impl AgentRecord {
    pub fn new(
        id: String,
        task_id: String,
        role: Role,
        pid: u32,
        spawn_time: Instant,
        spawn_time_epoch_ms: u64,
        log_path: PathBuf,
    ) -> Self {
        Self {
            id,
            task_id,
            role,
            pid,
            spawn_time,
            spawn_time_epoch_ms,
            log_path,
            session_id: None,
            retry_count: 0,
        }
    }

    /// Bind a session id exactly once. A later call with a different id is
    /// rejected (spec I4 / §8 "binding is idempotent and monotonic").
    pub fn bind_session(&mut self, session_id: &str) -> bool {
        match &self.session_id {
            Some(existing) => existing == session_id,
            None => {
                self.session_id = Some(session_id.to_string());
                true
            }
        }
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
