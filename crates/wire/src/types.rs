// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! DTOs returned by the status/logs/events RPC surface (spec §4.7, §6.1).

use af_core::PoolMode;
use serde::{Deserialize, Serialize};

/// One agent's status line, as shown by `status.full` and as the summary
/// half of `status.agent` (spec §4.7).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentStatus {
    pub id: String,
    pub task_id: String,
    pub task_title: String,
    pub role: String,
    pub pid: u32,
    pub spawn_time_epoch_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_log: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// The result of `status.full` (spec §4.7).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FullStatus {
    pub pool_size: usize,
    pub pool_mode: PoolMode,
    pub spawn_policy: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    pub agents: Vec<AgentStatus>,
    pub spawns: Vec<AgentStatus>,
    pub queue: Vec<af_core::TaskRef>,
    pub errors: Vec<String>,
}

/// A single extracted tool call, derived from `message.part.updated` events
/// (spec §6.2).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCallSummary {
    pub tool: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at_ms: Option<u64>,
}

/// The detailed result of `status.agent` (spec §4.7).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentDetail {
    #[serde(flatten)]
    pub status: AgentStatus,
    pub tool_calls: Vec<ToolCallSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpawnRegisterParams {
    pub spawn_id: String,
    pub pid: u32,
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpawnDeregisterParams {
    pub spawn_id: String,
}

/// A raw event as listed by `events.list` / consumed by `session.event`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventEnvelope {
    pub seq: u64,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub data: serde_json::Value,
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
