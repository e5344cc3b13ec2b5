// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn unknown_fields_round_trip_through_extra() {
    let raw = json!({
        "server_ref": "local",
        "session_id": "ses_abc",
        "origin_type": "pool",
        "status": "active",
        "created_at_ms": 1,
        "last_seen_at_ms": 2,
        "updated_at_ms": 2,
        "future_field": "kept"
    });
    let rec: SessionRecord = serde_json::from_value(raw.clone()).unwrap();
    assert_eq!(rec.extra.get("future_field").and_then(Value::as_str), Some("kept"));
    let back = serde_json::to_value(&rec).unwrap();
    assert_eq!(back.get("future_field").and_then(Value::as_str), Some("kept"));
}

#[test]
fn key_is_server_ref_and_session_id() {
    let rec = SessionRecord {
        server_ref: "local".into(),
        session_id: "ses_abc".into(),
        directory: None,
        project: None,
        origin_type: OriginType::Pool,
        work_ref: None,
        agent_id: None,
        status: SessionStatus::Active,
        created_at_ms: 0,
        last_seen_at_ms: 0,
        updated_at_ms: 0,
        extra: Map::new(),
    };
    assert_eq!(rec.key(), ("local".to_string(), "ses_abc".to_string()));
}
