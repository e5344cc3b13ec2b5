// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn ok_wraps_result_and_clears_error_fields() {
    let resp = Response::ok(json!({"mode": "active"}));
    assert!(resp.success);
    assert_eq!(resp.result, Some(json!({"mode": "active"})));
    assert!(resp.error.is_none());
}

#[test]
fn err_carries_stable_code_and_message() {
    let resp = Response::err(ErrorCode::NotFound, "agent not found: brave-otter");
    assert!(!resp.success);
    assert_eq!(resp.code, Some(ErrorCode::NotFound));
    assert_eq!(resp.error.as_deref(), Some("agent not found: brave-otter"));
}

#[test]
fn serialization_omits_absent_optional_fields() {
    let resp = Response::ok_empty();
    let v = serde_json::to_value(&resp).unwrap();
    assert_eq!(v, json!({"success": true}));
}
