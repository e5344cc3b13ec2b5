// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-session event ring and the registry of rings (spec §2 "Event
//! buffer", §3 "Session event", §4.6, I5).

use af_core::event::MAX_EVENT_PAYLOAD_BYTES;
use af_core::{EventType, SessionEvent};
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Maximum number of events retained per session (spec §3).
pub const MAX_RING_EVENTS: usize = 2000;

#[derive(Debug, thiserror::Error)]
pub enum IngressError {
    #[error("event payload exceeds {MAX_EVENT_PAYLOAD_BYTES} bytes")]
    PayloadTooLarge,
}

impl IngressError {
    pub fn code(&self) -> af_core::ErrorCode {
        match self {
            Self::PayloadTooLarge => af_core::ErrorCode::InvalidInput,
        }
    }
}

/// A bounded circular buffer of structured events for one session (spec
/// I5: never exceeds count or payload caps; old events evicted first).
pub struct EventRing {
    events: RwLock<VecDeque<SessionEvent>>,
    next_seq: AtomicU64,
}

impl Default for EventRing {
    fn default() -> Self {
        Self::new()
    }
}

impl EventRing {
    pub fn new() -> Self {
        Self { events: RwLock::new(VecDeque::with_capacity(64)), next_seq: AtomicU64::new(0) }
    }

    /// Append one event, evicting the oldest if at capacity. Rejects
    /// payloads over the per-event cap without truncating (spec §4.6
    /// ingress, I5).
    pub fn push(
        &self,
        session_id: &str,
        event: EventType,
        received_at_ms: u64,
    ) -> Result<u64, IngressError> {
        let payload_size = serde_json::to_vec(&event).map(|v| v.len()).unwrap_or(0);
        if payload_size > MAX_EVENT_PAYLOAD_BYTES {
            return Err(IngressError::PayloadTooLarge);
        }
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let stored =
            SessionEvent { seq, session_id: session_id.to_string(), event, received_at_ms };
        let mut events = self.events.write();
        if events.len() >= MAX_RING_EVENTS {
            events.pop_front();
        }
        events.push_back(stored);
        Ok(seq)
    }

    /// List events in insertion order, optionally after a given sequence
    /// number, bounded by `limit` (spec §4.6 "Read").
    pub fn list(&self, after_seq: Option<u64>, limit: usize) -> Vec<SessionEvent> {
        let events = self.events.read();
        events
            .iter()
            .filter(|e| match after_seq {
                Some(after) => e.seq > after,
                None => true,
            })
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The newest non-empty human-readable text fragment in the ring, used
    /// by the status service's `last_log` derivation (spec §4.7).
    pub fn newest_text_fragment(&self) -> Option<String> {
        let events = self.events.read();
        events.iter().rev().find_map(|e| extract_text(&e.event))
    }
}

fn extract_text(event: &EventType) -> Option<String> {
    let data = match event {
        EventType::MessagePartDelta { data }
        | EventType::MessagePartUpdated { data }
        | EventType::MessageUpdated { data } => data,
        _ => return None,
    };
    for path in [&["part", "text"][..], &["delta", "text"][..], &["info", "text"][..]] {
        let mut cur = data;
        let mut ok = true;
        for key in path {
            match cur.get(key) {
                Some(v) => cur = v,
                None => {
                    ok = false;
                    break;
                }
            }
        }
        if ok {
            if let Some(s) = cur.as_str() {
                if !s.trim().is_empty() {
                    return Some(s.to_string());
                }
            }
        }
    }
    None
}

/// Maps `session_id -> EventRing`, created lazily on first push and torn
/// down when the owning agent is reaped (spec lifecycle in §3).
#[derive(Default)]
pub struct EventBufferRegistry {
    rings: RwLock<HashMap<String, Arc<EventRing>>>,
}

impl EventBufferRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ring_for(&self, session_id: &str) -> Arc<EventRing> {
        if let Some(ring) = self.rings.read().get(session_id) {
            return Arc::clone(ring);
        }
        let mut rings = self.rings.write();
        Arc::clone(rings.entry(session_id.to_string()).or_insert_with(|| Arc::new(EventRing::new())))
    }

    pub fn get(&self, session_id: &str) -> Option<Arc<EventRing>> {
        self.rings.read().get(session_id).cloned()
    }

    /// Torn down when the owning agent is reaped (spec §3 lifecycle).
    pub fn remove(&self, session_id: &str) {
        self.rings.write().remove(session_id);
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
