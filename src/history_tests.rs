use super::*;
use crate::span::Span;

fn dummy_change() -> Change {
    Change {
        old: Span::empty(),
        new: Span::single(0, 1),
    }
}

#[test]
fn begin_edit_truncates_redo_only_when_opening_a_new_action() {
    let mut history = History::new();
    assert!(history.begin_edit().is_some());
    history.push_change(dummy_change());
    // Still inside the same action: no truncation, no new Action pushed.
    assert!(history.begin_edit().is_none());
    history.push_change(dummy_change());

    let action = history.take_for_undo().unwrap();
    assert_eq!(action.changes.len(), 2);
}

#[test]
fn snapshot_closes_the_action_so_the_next_edit_opens_a_fresh_one() {
    let mut history = History::new();
    history.begin_edit();
    history.push_change(dummy_change());
    history.snapshot();

    let truncated = history.begin_edit();
    assert!(truncated.is_some(), "snapshot should force a fresh Action");
    history.push_change(dummy_change());

    // Two separate Actions should now be on the stack.
    let second = history.take_for_undo().unwrap();
    assert_eq!(second.changes.len(), 1);
    let first = history.take_for_undo().unwrap();
    assert_eq!(first.changes.len(), 1);
    assert_ne!(first.id, second.id);
}

#[test]
fn undo_then_redo_round_trips_the_action() {
    let mut history = History::new();
    history.begin_edit();
    history.push_change(dummy_change());

    let action = history.take_for_undo().unwrap();
    let id = action.id;
    history.push_to_redo(action);

    let redone = history.take_for_redo().unwrap();
    assert_eq!(redone.id, id);
    history.push_to_undo(redone);

    assert!(history.take_for_undo().is_some());
}

#[test]
fn opening_a_new_action_discards_the_redo_stack() {
    let mut history = History::new();
    history.begin_edit();
    history.push_change(dummy_change());
    let action = history.take_for_undo().unwrap();
    history.push_to_redo(action);
    assert!(!history.redo_is_empty());

    let truncated = history.begin_edit().unwrap();
    assert_eq!(truncated.len(), 1);
    assert!(history.redo_is_empty());
}

#[test]
fn modified_tracks_identity_not_content() {
    let mut history = History::new();
    assert!(!history.modified(), "fresh history has nothing to save");

    history.begin_edit();
    history.push_change(dummy_change());
    assert!(history.modified());

    history.mark_saved();
    assert!(!history.modified());

    history.begin_edit();
    history.push_change(dummy_change());
    assert!(history.modified());
}

#[test]
fn undo_with_nothing_to_undo_returns_none() {
    let mut history = History::new();
    assert!(history.take_for_undo().is_none());
}

#[test]
fn redo_with_nothing_to_redo_returns_none() {
    let mut history = History::new();
    assert!(history.take_for_redo().is_none());
}
