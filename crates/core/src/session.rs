// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk session registry record (spec §3, §6.3).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Where a registered session originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginType {
    Pool,
    Spawn,
    Manual,
}

/// Current liveness status of a registered session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Idle,
    Terminated,
    Stale,
}

/// A durable record of a harness session, keyed by `(server_ref, session_id)`.
///
/// `extra` preserves any fields this implementation doesn't understand so
/// that a round trip through an older or newer daemon version doesn't drop
/// forward-compatible data (spec §6.3, §8 "modulo unknown forward-compat
/// fields").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionRecord {
    pub server_ref: String,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    pub origin_type: OriginType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    pub status: SessionStatus,
    pub created_at_ms: u64,
    pub last_seen_at_ms: u64,
    pub updated_at_ms: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SessionRecord {
    pub fn key(&self) -> (String, String) {
        (self.server_ref.clone(), self.session_id.clone())
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
