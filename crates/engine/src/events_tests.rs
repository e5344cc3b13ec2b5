// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

fn idle(session_id: &str) -> EventType {
    EventType::SessionIdle { data: json!({"sessionID": session_id}) }
}

#[test]
fn push_then_list_returns_insertion_order() {
    let ring = EventRing::new();
    ring.push("ses-1", idle("ses-1"), 1).unwrap();
    ring.push("ses-1", idle("ses-1"), 2).unwrap();
    let events = ring.list(None, 10);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].seq, 0);
    assert_eq!(events[1].seq, 1);
}

#[test]
fn after_seq_filters_strictly_greater() {
    let ring = EventRing::new();
    for _ in 0..3 {
        ring.push("ses-1", idle("ses-1"), 1).unwrap();
    }
    let events = ring.list(Some(0), 10);
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e.seq > 0));
}

#[test]
fn limit_bounds_the_result() {
    let ring = EventRing::new();
    for _ in 0..5 {
        ring.push("ses-1", idle("ses-1"), 1).unwrap();
    }
    assert_eq!(ring.list(None, 2).len(), 2);
}

#[test]
fn ring_never_exceeds_count_cap() {
    let ring = EventRing::new();
    for _ in 0..(MAX_RING_EVENTS + 50) {
        ring.push("ses-1", idle("ses-1"), 1).unwrap();
    }
    assert_eq!(ring.len(), MAX_RING_EVENTS);
}

#[test]
fn oldest_events_are_evicted_first() {
    let ring = EventRing::new();
    for _ in 0..(MAX_RING_EVENTS + 1) {
        ring.push("ses-1", idle("ses-1"), 1).unwrap();
    }
    let events = ring.list(None, MAX_RING_EVENTS);
    // The first-pushed event (seq 0) must have been evicted.
    assert!(events.iter().all(|e| e.seq != 0));
}

#[test]
fn oversized_payload_is_rejected() {
    let ring = EventRing::new();
    let huge = "x".repeat(300 * 1024);
    let event = EventType::SessionStatus { data: json!({"status": huge}) };
    let err = ring.push("ses-1", event, 1).unwrap_err();
    assert!(matches!(err, IngressError::PayloadTooLarge));
}

#[test]
fn registry_creates_rings_lazily_and_reuses_them() {
    let registry = EventBufferRegistry::new();
    assert!(registry.get("ses-1").is_none());
    let ring_a = registry.ring_for("ses-1");
    ring_a.push("ses-1", idle("ses-1"), 1).unwrap();
    let ring_b = registry.ring_for("ses-1");
    assert_eq!(ring_b.len(), 1);
}

#[test]
fn registry_remove_tears_down_the_ring() {
    let registry = EventBufferRegistry::new();
    registry.ring_for("ses-1");
    registry.remove("ses-1");
    assert!(registry.get("ses-1").is_none());
}
