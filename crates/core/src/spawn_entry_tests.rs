// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn rejects_empty_id() {
    assert_eq!(SpawnEntry::validate("", "hi"), Err(SpawnEntryError::IdEmpty));
}

#[test]
fn rejects_oversized_id() {
    let id = "x".repeat(MAX_SPAWN_ID_CHARS + 1);
    assert_eq!(SpawnEntry::validate(&id, "hi"), Err(SpawnEntryError::IdTooLong));
}

#[test]
fn rejects_oversized_prompt() {
    let prompt = "x".repeat(MAX_PROMPT_BYTES + 1);
    assert_eq!(SpawnEntry::validate("spawn-1", &prompt), Err(SpawnEntryError::PromptTooLarge));
}

#[test]
fn accepts_well_formed_entry() {
    assert!(SpawnEntry::validate("spawn-1", "hello").is_ok());
}
