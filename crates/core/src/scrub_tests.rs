// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;

#[test]
fn passes_through_plain_text() {
    assert_eq!(scrub("hello world"), "hello world");
}

#[test]
fn keeps_tab_and_newline() {
    assert_eq!(scrub("a\tb\nc"), "a\tb\nc");
}

#[test]
fn strips_other_c0_controls() {
    assert_eq!(scrub("a\u{0}\u{7}b"), "ab");
}

#[test]
fn strips_csi_sequence() {
    assert_eq!(scrub("\u{1b}[31mred\u{1b}[0m"), "red");
}

#[test]
fn strips_osc_sequence_terminated_by_bel() {
    assert_eq!(scrub("\u{1b}]0;title\u{07}rest"), "rest");
}

#[test]
fn strips_osc_sequence_terminated_by_st() {
    assert_eq!(scrub("\u{1b}]0;title\u{1b}\\rest"), "rest");
}

#[test]
fn strips_dcs_sequence() {
    assert_eq!(scrub("\u{1b}Pfoo\u{1b}\\rest"), "rest");
}

#[test]
fn handles_dangling_escape_at_end_of_string() {
    assert_eq!(scrub("abc\u{1b}"), "abc");
}

proptest! {
    /// Invariant: scrub never panics on arbitrary input and never leaves a
    /// bare ESC in its output.
    #[test]
    fn scrub_never_panics_and_strips_every_escape(input in ".{0,200}") {
        let out = scrub(&input);
        prop_assert!(!out.chars().any(|c| c == '\u{1b}'));
    }

    /// Invariant: scrub is idempotent once escapes are gone.
    #[test]
    fn scrub_is_idempotent(input in "[ -~\\n\\t]{0,200}") {
        let once = scrub(&input);
        let twice = scrub(&once);
        prop_assert_eq!(once, twice);
    }
}
