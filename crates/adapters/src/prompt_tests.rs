// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashMap;

#[test]
fn substitutes_known_variable() {
    let mut vars = HashMap::new();
    vars.insert("task_id", "t-1");
    let out = render("work on {{task_id}} please", &vars).unwrap();
    assert_eq!(out, "work on t-1 please");
}

#[test]
fn unresolved_variable_is_rejected() {
    let vars = HashMap::new();
    let err = render("work on {{task_id}}", &vars).unwrap_err();
    assert_eq!(err, PromptError::UnresolvedVariable);
}

#[test]
fn unterminated_brace_is_rejected() {
    let mut vars = HashMap::new();
    vars.insert("task_id", "t-1");
    let err = render("work on {{task_id", &vars).unwrap_err();
    assert_eq!(err, PromptError::UnresolvedVariable);
}

#[test]
fn substituted_value_introducing_braces_is_rejected() {
    let mut vars = HashMap::new();
    vars.insert("task_id", "{{nested}}");
    let err = render("work on {{task_id}}", &vars).unwrap_err();
    assert_eq!(err, PromptError::UnresolvedVariable);
}

#[test]
fn builtin_templates_render_for_each_role() {
    let mut vars = HashMap::new();
    vars.insert("task_id", "t-42");
    for role in [Role::Worker, Role::Planner] {
        let rendered = render(builtin_template(role), &vars).unwrap();
        assert!(rendered.contains("t-42"));
    }
}
