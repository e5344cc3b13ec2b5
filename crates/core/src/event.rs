// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plugin-ingested session events (spec §3 "Session event", §6.2).
//!
//! The harness plugin's payloads are duck-typed JSON; we parse them once at
//! the ingress boundary into a closed, tagged `EventType` so that session-id
//! extraction becomes a total function on a variant instead of a family of
//! ad hoc field lookups scattered through the codebase (Design Note §9).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum accepted payload size for a single event (spec §3, §8).
pub const MAX_EVENT_PAYLOAD_BYTES: usize = 256 * 1024;

/// The recognized harness event types (spec §3, §6.2).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum EventType {
    #[serde(rename = "session.created")]
    SessionCreated { data: Value },
    #[serde(rename = "session.updated")]
    SessionUpdated { data: Value },
    #[serde(rename = "session.status")]
    SessionStatus { data: Value },
    #[serde(rename = "session.idle")]
    SessionIdle { data: Value },
    #[serde(rename = "session.error")]
    SessionError { data: Value },
    #[serde(rename = "session.diff")]
    SessionDiff { data: Value },
    #[serde(rename = "message.updated")]
    MessageUpdated { data: Value },
    #[serde(rename = "message.part.updated")]
    MessagePartUpdated { data: Value },
    #[serde(rename = "message.part.delta")]
    MessagePartDelta { data: Value },
    /// Any event type not in the recognized set. It still carries a payload
    /// and is stored in the ring, but never yields a session id.
    #[serde(other)]
    Unknown,
}

impl EventType {
    /// Extract the session id per the type-specific rule in spec §6.2.
    /// Returns `None` for event types that carry no session id, or whose
    /// expected field is absent/malformed.
    pub fn session_id(&self) -> Option<String> {
        let field = |data: &Value, path: &[&str]| -> Option<String> {
            let mut cur = data;
            for key in path {
                cur = cur.get(key)?;
            }
            cur.as_str().map(|s| s.to_string())
        };
        match self {
            Self::SessionCreated { data } | Self::SessionUpdated { data } => {
                field(data, &["info", "id"])
            }
            Self::SessionStatus { data }
            | Self::SessionIdle { data }
            | Self::SessionError { data }
            | Self::SessionDiff { data }
            | Self::MessagePartDelta { data } => field(data, &["sessionID"]),
            Self::MessageUpdated { data } => field(data, &["info", "sessionID"]),
            Self::MessagePartUpdated { data } => field(data, &["part", "sessionID"]),
            Self::Unknown => None,
        }
    }

    /// The `type` discriminant string, matching the wire representation.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::SessionCreated { .. } => "session.created",
            Self::SessionUpdated { .. } => "session.updated",
            Self::SessionStatus { .. } => "session.status",
            Self::SessionIdle { .. } => "session.idle",
            Self::SessionError { .. } => "session.error",
            Self::SessionDiff { .. } => "session.diff",
            Self::MessageUpdated { .. } => "message.updated",
            Self::MessagePartUpdated { .. } => "message.part.updated",
            Self::MessagePartDelta { .. } => "message.part.delta",
            Self::Unknown => "unknown",
        }
    }

    /// Maps `session.status`/`idle`/`error` onto the session registry's
    /// status field (spec §4.6). Other event types don't drive a transition.
    pub fn registry_status(&self) -> Option<SessionStatusUpdate> {
        match self {
            Self::SessionStatus { data } => {
                field_str(data, "status").and_then(SessionStatusUpdate::from_str)
            }
            Self::SessionIdle { .. } => Some(SessionStatusUpdate::Idle),
            Self::SessionError { .. } => Some(SessionStatusUpdate::Stale),
            _ => None,
        }
    }
}

fn field_str(data: &Value, key: &str) -> Option<&str> {
    data.get(key).and_then(Value::as_str)
}

/// A registry-status transition derived from an event (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatusUpdate {
    Active,
    Idle,
    Terminated,
    Stale,
}

impl SessionStatusUpdate {
    fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" | "running" => Some(Self::Active),
            "idle" => Some(Self::Idle),
            "terminated" | "done" => Some(Self::Terminated),
            "error" => Some(Self::Stale),
            _ => None,
        }
    }
}

/// A stored session event: the parsed type plus bookkeeping added at the
/// ingress boundary (sequence number within its ring, arrival time).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
    pub seq: u64,
    pub session_id: String,
    pub event: EventType,
    pub received_at_ms: u64,
}

impl SessionEvent {
    /// Approximate in-memory size used against the per-session byte cap.
    pub fn approx_size(&self) -> usize {
        serde_json::to_vec(&self.event).map(|v| v.len()).unwrap_or(0)
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
