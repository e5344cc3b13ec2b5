// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status service (spec §4.7, §6.2).
//!
//! `build_full_status` and `build_agent_status` are pure functions over a
//! snapshot of the pool/spawn-registry/event-buffer state plus whatever
//! `TaskMeta` enrichment the task store returns within its timeout —
//! partial enrichment failures are folded into `errors`, never propagated
//! as an RPC failure (spec §4.7).

use af_adapters::worksource::{with_timeout, DEFAULT_TIMEOUT};
use af_adapters::{Launcher, WorkSource};
use af_core::{AgentRecord, Clock, ErrorCode, SpawnEntry};
use serde_json::Value;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

use crate::events::EventBufferRegistry;
use crate::pool::AgentPool;
use crate::spawn_registry::SpawnRegistry;
use af_wire::{AgentDetail, AgentStatus, FullStatus, ToolCallSummary};

#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    #[error("agent {0} not found in the pool or the spawn registry")]
    NotFound(String),
}

impl StatusError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::NotFound,
        }
    }
}

/// `status.full()` (spec §4.7).
#[allow(clippy::too_many_arguments)]
pub async fn build_full_status<W, L, C>(
    pool: &Arc<AgentPool<W, L, C>>,
    spawn_registry: &SpawnRegistry,
    work_source: Option<&W>,
    events: &EventBufferRegistry,
    spawn_policy: &str,
    project: Option<&str>,
) -> FullStatus
where
    W: WorkSource + 'static,
    L: Launcher + 'static,
    C: Clock + 'static,
{
    let mut errors = Vec::new();
    let manual = spawn_policy == "manual";

    let agent_records = pool.status().await;
    let mut agents = Vec::with_capacity(agent_records.len());
    for record in &agent_records {
        agents.push(agent_status(record, work_source.filter(|_| !manual), events, &mut errors).await);
    }

    let spawns = spawn_registry.list().into_iter().map(spawn_status).collect();

    let queue = if manual {
        Vec::new()
    } else {
        match (work_source, project) {
            (Some(ws), Some(project)) => {
                match with_timeout(DEFAULT_TIMEOUT, ws.ready(project)).await {
                    Ok(tasks) => tasks,
                    Err(e) => {
                        errors.push(format!("queue lookup failed: {e}"));
                        Vec::new()
                    }
                }
            }
            _ => Vec::new(),
        }
    };

    FullStatus {
        pool_size: pool.capacity(),
        pool_mode: pool.mode(),
        spawn_policy: spawn_policy.to_string(),
        project: project.map(str::to_string),
        agents,
        spawns,
        queue,
        errors,
    }
}

async fn agent_status<W: WorkSource>(
    record: &AgentRecord,
    work_source: Option<&W>,
    events: &EventBufferRegistry,
    errors: &mut Vec<String>,
) -> AgentStatus {
    let mut task_title = String::new();
    let mut last_log = record.session_id.as_ref().and_then(|sid| {
        events.get(sid).and_then(|ring| ring.newest_text_fragment())
    });

    if let Some(ws) = work_source {
        match with_timeout(DEFAULT_TIMEOUT, ws.meta(&record.task_id)).await {
            Ok(meta) => {
                task_title = meta.title.clone();
                if last_log.is_none() {
                    last_log = meta.tail_log().map(str::to_string);
                }
            }
            Err(e) => errors.push(format!("meta({}) failed: {e}", record.task_id)),
        }
    }

    AgentStatus {
        id: record.id.clone(),
        task_id: record.task_id.clone(),
        task_title,
        role: record.role.to_string(),
        pid: record.pid,
        spawn_time_epoch_ms: record.spawn_time_epoch_ms,
        last_log,
        session_id: record.session_id.clone(),
    }
}

fn spawn_status(entry: SpawnEntry) -> AgentStatus {
    AgentStatus {
        id: entry.spawn_id,
        task_id: String::new(),
        task_title: entry.prompt,
        role: af_core::Role::Spawn.to_string(),
        pid: entry.pid,
        spawn_time_epoch_ms: entry.created_at_ms,
        last_log: None,
        session_id: None,
    }
}

/// `status.agent(name, limit)` (spec §4.7). Falls back to the spawn
/// registry if the agent isn't pool-owned.
pub async fn build_agent_status<W, L, C>(
    pool: &Arc<AgentPool<W, L, C>>,
    spawn_registry: &SpawnRegistry,
    work_source: Option<&W>,
    events: &EventBufferRegistry,
    agent_name: &str,
    limit: usize,
) -> Result<AgentDetail, StatusError>
where
    W: WorkSource + 'static,
    L: Launcher + 'static,
    C: Clock + 'static,
{
    if let Some(record) = pool.get(agent_name).await {
        let mut errors = Vec::new();
        let status = agent_status(&record, work_source, events, &mut errors).await;
        for e in errors {
            warn!(agent = agent_name, error = %e, "status.agent enrichment failure");
        }
        let tool_calls = record
            .session_id
            .as_ref()
            .and_then(|sid| events.get(sid))
            .map(|ring| extract_tool_calls(&ring.list(None, limit)))
            .unwrap_or_default();
        return Ok(AgentDetail { status, tool_calls });
    }

    if let Some(entry) = spawn_registry.get(agent_name) {
        return Ok(AgentDetail { status: spawn_status(entry), tool_calls: Vec::new() });
    }

    Err(StatusError::NotFound(agent_name.to_string()))
}

/// Extract tool-call summaries from `message.part.updated` events (spec
/// §6.2). Other event types contribute nothing.
fn extract_tool_calls(events: &[af_core::SessionEvent]) -> Vec<ToolCallSummary> {
    events
        .iter()
        .filter_map(|e| match &e.event {
            af_core::EventType::MessagePartUpdated { data } => tool_call_from_part(data),
            _ => None,
        })
        .collect()
}

fn tool_call_from_part(data: &Value) -> Option<ToolCallSummary> {
    let part = data.get("part")?;
    let tool = part.get("tool")?.as_str()?.to_string();
    let state = part.get("state")?;
    let status = state.get("status")?.as_str()?.to_string();
    let input = state.get("input");
    let summary_field = input.and_then(|input| tool_input_field(&tool, input));
    let title = state.get("title").and_then(Value::as_str).map(str::to_string);
    let started_at_ms = state.get("time").and_then(|t| t.get("start")).and_then(Value::as_u64);
    let finished_at_ms = state.get("time").and_then(|t| t.get("end")).and_then(Value::as_u64);

    Some(ToolCallSummary { tool, status, summary_field, title, started_at_ms, finished_at_ms })
}

/// The tool-specific input field used to summarize a tool call (spec §6.2):
/// `read|edit|write → filePath`, `bash → command`, `glob|grep → pattern`,
/// otherwise probe a few common field names.
fn tool_input_field(tool: &str, input: &Value) -> Option<String> {
    let key = match tool {
        "read" | "edit" | "write" => "filePath",
        "bash" => "command",
        "glob" | "grep" => "pattern",
        _ => {
            for candidate in ["filePath", "command", "pattern", "query", "path"] {
                if let Some(s) = input.get(candidate).and_then(Value::as_str) {
                    return Some(s.to_string());
                }
            }
            return None;
        }
    };
    input.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Current wall-clock time in milliseconds, used when no `Clock` instance
/// is in scope (e.g. RPC-layer event timestamps before dispatch).
pub fn now_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
