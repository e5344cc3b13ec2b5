// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! RPC request DTOs (spec §6.1 method table).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A request from a client to the daemon. Each variant corresponds to one
/// row of the method table in spec §6.1.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "method", content = "params", rename_all = "snake_case")]
pub enum Request {
    /// Legacy unstructured status map, kept for compatibility.
    Status,
    #[serde(rename = "status.full")]
    StatusFull,
    #[serde(rename = "status.agent")]
    StatusAgent { agent_name: String, #[serde(default)] limit: Option<usize> },
    #[serde(rename = "logs.path")]
    LogsPath { agent_name: String },
    #[serde(rename = "pool.drain")]
    PoolDrain,
    #[serde(rename = "pool.pause")]
    PoolPause,
    #[serde(rename = "pool.resume")]
    PoolResume,
    #[serde(rename = "pool.kill")]
    PoolKill { agent_name: String },
    #[serde(rename = "spawn.register")]
    SpawnRegister { spawn_id: String, pid: u32, prompt: String },
    #[serde(rename = "spawn.deregister")]
    SpawnDeregister { spawn_id: String },
    #[serde(rename = "events.list")]
    EventsList {
        session_id: String,
        #[serde(default)]
        after: Option<u64>,
        #[serde(default)]
        limit: Option<usize>,
    },
    #[serde(rename = "session.event")]
    SessionEvent { agent_id: String, event_type: String, #[serde(default)] session_id: Option<String>, data: Value },
    Shutdown,
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
