//! Undo/redo history built from reversible span swaps.
//!
//! This is deliberately a linear two-stack history, not the branching undo
//! tree a full editor shell might eventually want. Every Change remembers
//! both the span it replaced and the span it installed; undoing an Action
//! swaps each Change back in reverse-chronological order, redoing swaps them
//! forward again.

use crate::span::Span;
use std::time::SystemTime;

/// Unique sequential identifier assigned to each Action as it is opened.
/// Used only so `modified?` can compare "the same Action" by identity
/// rather than by content — content comparison would call a buffer
/// unmodified after an edit that happens to restore the original bytes,
/// which this history deliberately does not treat as unmodified.
pub type ActionId = u64;

/// One span swap, remembering both sides so it can be undone.
#[derive(Debug, Clone, Copy)]
pub struct Change {
    pub old: Span,
    pub new: Span,
}

/// All Changes performed since the previous snapshot, plus when the Action
/// was opened.
#[derive(Debug, Clone)]
pub struct Action {
    pub id: ActionId,
    pub changes: Vec<Change>,
    pub timestamp: SystemTime,
}

impl Action {
    fn new(id: ActionId) -> Self {
        Self {
            id,
            changes: Vec::new(),
            timestamp: SystemTime::now(),
        }
    }
}

/// The undo and redo stacks plus the bookkeeping needed to group edits into
/// Actions and to answer `modified?` by identity.
#[derive(Debug)]
pub struct History {
    undo: Vec<Action>,
    redo: Vec<Action>,
    action_open: bool,
    next_action_id: ActionId,
    saved_action_id: Option<ActionId>,
}

impl History {
    pub fn new() -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            action_open: false,
            next_action_id: 0,
            saved_action_id: None,
        }
    }

    /// Ensure an Action is open for the edit about to be recorded. Returns
    /// the discarded redo stack when this call opened a fresh Action (the
    /// first edit after a snapshot or an undo) so the caller can free the
    /// pieces those Changes' new sides hold; returns `None` when an Action
    /// was already open, since nothing is truncated mid-Action.
    pub fn begin_edit(&mut self) -> Option<Vec<Action>> {
        if self.action_open {
            return None;
        }
        let id = self.next_action_id;
        self.next_action_id += 1;
        self.undo.push(Action::new(id));
        self.action_open = true;
        Some(std::mem::take(&mut self.redo))
    }

    /// Append a Change to the currently open Action. Panics if called
    /// without a preceding `begin_edit` — every edit path in the editor
    /// calls `begin_edit` first, so this would only fire on an internal bug.
    pub fn push_change(&mut self, change: Change) {
        self.undo
            .last_mut()
            .expect("begin_edit must be called before push_change")
            .changes
            .push(change);
    }

    /// Close the currently open Action so the next edit opens a new one.
    pub fn snapshot(&mut self) {
        self.action_open = false;
    }

    /// Pop the topmost Action off the undo stack for the caller to replay
    /// in reverse. Returns `None` if there is nothing to undo.
    pub fn take_for_undo(&mut self) -> Option<Action> {
        let action = self.undo.pop()?;
        self.action_open = false;
        Some(action)
    }

    pub fn push_to_redo(&mut self, action: Action) {
        self.redo.push(action);
    }

    /// Pop the topmost Action off the redo stack for the caller to replay
    /// forward. Returns `None` if there is nothing to redo.
    pub fn take_for_redo(&mut self) -> Option<Action> {
        let action = self.redo.pop()?;
        self.action_open = false;
        Some(action)
    }

    pub fn push_to_undo(&mut self, action: Action) {
        self.undo.push(action);
    }

    /// Record the current top of the undo stack as the save point.
    pub fn mark_saved(&mut self) {
        self.saved_action_id = self.undo.last().map(|a| a.id);
        self.action_open = false;
    }

    /// True iff the undo stack's top differs, by identity, from the Action
    /// recorded at the last successful save.
    pub fn modified(&self) -> bool {
        self.undo.last().map(|a| a.id) != self.saved_action_id
    }

    pub fn redo_is_empty(&self) -> bool {
        self.redo.is_empty()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;
