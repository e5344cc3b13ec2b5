// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn status_full_has_no_params() {
    let req = Request::StatusFull;
    let v = serde_json::to_value(&req).unwrap();
    assert_eq!(v, json!({"method": "status.full"}));
}

#[test]
fn pool_kill_round_trips_through_json() {
    let req = Request::PoolKill { agent_name: "brave-otter".into() };
    let v = serde_json::to_value(&req).unwrap();
    assert_eq!(v, json!({"method": "pool.kill", "params": {"agent_name": "brave-otter"}}));
    let back: Request = serde_json::from_value(v).unwrap();
    assert_eq!(back, req);
}

#[test]
fn spawn_register_parses_from_raw_json() {
    let v = json!({
        "method": "spawn.register",
        "params": {"spawn_id": "spawn-1", "pid": 123, "prompt": "hi"}
    });
    let req: Request = serde_json::from_value(v).unwrap();
    assert_eq!(
        req,
        Request::SpawnRegister { spawn_id: "spawn-1".into(), pid: 123, prompt: "hi".into() }
    );
}

#[test]
fn events_list_optional_fields_default() {
    let v = json!({"method": "events.list", "params": {"session_id": "ses_abc"}});
    let req: Request = serde_json::from_value(v).unwrap();
    assert_eq!(req, Request::EventsList { session_id: "ses_abc".into(), after: None, limit: None });
}
