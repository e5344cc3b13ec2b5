// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builders shared by other crates' tests (enabled via the `test-support`
//! feature, mirroring the teacher's `oj-core` convention).

use crate::task::{Role, TaskMeta, TaskRef, TaskStatus};
use std::collections::BTreeSet;

pub fn task_ref(id: &str, priority: i64, title: &str) -> TaskRef {
    TaskRef { id: id.to_string(), priority, title: title.to_string() }
}

pub struct TaskMetaBuilder {
    meta: TaskMeta,
}

impl TaskMetaBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            meta: TaskMeta {
                id: id.to_string(),
                title: format!("task {id}"),
                description: String::new(),
                definition_of_done: String::new(),
                status: TaskStatus::Open,
                priority: 1,
                labels: BTreeSet::new(),
                dependencies: vec![],
                logs: vec![],
            },
        }
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.meta.status = status;
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.meta.labels.insert(label.to_string());
        self
    }

    pub fn build(self) -> TaskMeta {
        self.meta
    }
}

pub fn plan_label_meta(id: &str, plan_label: &str) -> TaskMeta {
    TaskMetaBuilder::new(id).label(plan_label).build()
}

pub fn role_for_labels(meta: &TaskMeta, plan_label: &str) -> Role {
    if meta.labels.contains(plan_label) {
        Role::Planner
    } else {
        Role::Worker
    }
}
