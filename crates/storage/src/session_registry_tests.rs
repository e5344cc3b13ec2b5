// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use af_core::OriginType;
use serde_json::Map;
use tempfile::tempdir;

fn record(session_id: &str) -> SessionRecord {
    SessionRecord {
        server_ref: "proj".to_string(),
        session_id: session_id.to_string(),
        directory: None,
        project: Some("proj".to_string()),
        origin_type: OriginType::Pool,
        work_ref: Some("t-1".to_string()),
        agent_id: Some("brave-otter".to_string()),
        status: af_core::SessionStatus::Active,
        created_at_ms: 1_000,
        last_seen_at_ms: 1_000,
        updated_at_ms: 1_000,
        extra: Map::new(),
    }
}

#[test]
fn upsert_then_get_round_trips() {
    let dir = tempdir().unwrap();
    let store = SessionRegistryStore::open(dir.path()).unwrap();
    store.upsert(record("ses_abc")).unwrap();
    let got = store.get("proj", "ses_abc").unwrap();
    assert_eq!(got.work_ref.as_deref(), Some("t-1"));
}

#[test]
fn reopen_after_write_yields_same_records() {
    let dir = tempdir().unwrap();
    {
        let store = SessionRegistryStore::open(dir.path()).unwrap();
        store.upsert(record("ses_abc")).unwrap();
    }
    let store2 = SessionRegistryStore::open(dir.path()).unwrap();
    let list = store2.list();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].session_id, "ses_abc");
}

#[test]
fn upsert_replaces_by_key_not_appends() {
    let dir = tempdir().unwrap();
    let store = SessionRegistryStore::open(dir.path()).unwrap();
    store.upsert(record("ses_abc")).unwrap();
    let mut updated = record("ses_abc");
    updated.status = af_core::SessionStatus::Idle;
    store.upsert(updated).unwrap();
    assert_eq!(store.list().len(), 1);
    assert_eq!(store.get("proj", "ses_abc").unwrap().status, af_core::SessionStatus::Idle);
}

#[test]
fn unknown_fields_round_trip_through_extra() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sessions.json");
    let mut rec = record("ses_fwd");
    rec.extra.insert("future_field".to_string(), serde_json::json!("kept"));
    let doc = serde_json::json!({"schema_version": 1, "records": [rec]});
    std::fs::write(&path, serde_json::to_vec(&doc).unwrap()).unwrap();

    let store = SessionRegistryStore::open(dir.path()).unwrap();
    let got = store.get("proj", "ses_fwd").unwrap();
    assert_eq!(got.extra.get("future_field").unwrap(), "kept");
}
