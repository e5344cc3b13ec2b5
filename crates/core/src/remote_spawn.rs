// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk remote-spawn record (spec §3 "Remote-spawn record", §6.3).

use serde::{Deserialize, Serialize};

/// Lifecycle state of a provider-backed spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteSpawnState {
    Requested,
    Spawning,
    Running,
    Failed,
    Terminated,
    Unknown,
}

impl RemoteSpawnState {
    /// Only `Failed`/`Terminated` records are eligible for pruning (I-rule
    /// in spec §6.3, §8 "pruning never removes a record whose state is not
    /// failed/terminated").
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Failed | Self::Terminated)
    }
}

/// A durable record of a provider-backed spawn, outside pool lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteSpawnRecord {
    pub spawn_id: String,
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_sandbox_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_operation_id: Option<String>,
    pub server_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub request_id: String,
    pub project: String,
    pub state: RemoteSpawnState,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// Normalized request payload, used to detect same-key/different-payload
    /// conflicts on upsert (spec §8 scenario 6).
    pub request_fingerprint: String,
}

impl RemoteSpawnRecord {
    /// The idempotency key unique index: `(provider, project, request_id)`.
    pub fn idempotency_key(&self) -> (String, String, String) {
        (self.provider.clone(), self.project.clone(), self.request_id.clone())
    }
}

#[cfg(test)]
#[path = "remote_spawn_tests.rs"]
mod tests;
