//! The editor façade: load, insert, delete, replace, undo, redo, snapshot,
//! save, iterate, modified, free.

use crate::config::Config;
use crate::error::{EditorError, Result};
use crate::history::{Action, Change, History};
use crate::piece::{Content, Piece, PieceArena, PieceId};
use crate::span::Span;
use crate::storage::{InsertionStore, OriginalRegion};

use memmap2::{Mmap, MmapMut};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

/// A byte position canonicalized to a piece and an offset within it.
///
/// At every interior piece boundary this resolves to the *earlier* piece
/// with `offset == piece.len`; insert and delete both depend on that
/// convention to decide whether they're sitting at a boundary (no split
/// needed) or mid-piece (a split is needed).
#[derive(Debug, Clone, Copy)]
struct Location {
    piece: PieceId,
    offset: usize,
}

/// A mutable in-memory document backed by a piece table.
///
/// Not thread-safe: callers embedding an `Editor` in a multi-threaded host
/// must serialize access to a given instance themselves.
#[derive(Debug)]
pub struct Editor {
    arena: PieceArena,
    begin: PieceId,
    end: PieceId,
    original: Option<OriginalRegion>,
    insertions: InsertionStore,
    history: History,
    size: usize,
    path: Option<PathBuf>,
    #[allow(dead_code)]
    config: Config,
}

impl Editor {
    /// Load `path` into a fresh editor, or create an empty document when
    /// `path` is `None`.
    pub fn load(path: Option<&Path>, config: Config) -> Result<Self> {
        let mut arena = PieceArena::new();
        let begin = arena.alloc(Content::Original { offset: 0 }, 0, None, None);
        let end = arena.alloc(Content::Original { offset: 0 }, 0, None, None);
        arena.get_mut(begin).next = Some(end);
        arena.get_mut(end).prev = Some(begin);

        let mut editor = Editor {
            arena,
            begin,
            end,
            original: None,
            insertions: InsertionStore::new(config.insertion_buffer_capacity),
            history: History::new(),
            size: 0,
            path: path.map(Path::to_path_buf),
            config,
        };

        if let Some(path) = path {
            let file = File::open(path)?;
            let metadata = file.metadata()?;
            if !metadata.is_file() {
                return Err(EditorError::NotRegular);
            }

            let len = metadata.len() as usize;
            if len > 0 {
                // SAFETY: the mapping is read-only and scoped to this editor;
                // the file is not written to by this process for as long as
                // the mapping lives, satisfying memmap2's safety contract.
                let mmap = unsafe { Mmap::map(&file)? };
                let region = OriginalRegion::new(mmap);

                let piece = editor
                    .arena
                    .alloc(Content::Original { offset: 0 }, len, Some(begin), Some(end));
                editor.arena.get_mut(begin).next = Some(piece);
                editor.arena.get_mut(end).prev = Some(piece);

                editor.original = Some(region);
                editor.size = len;
            }
        }

        Ok(editor)
    }

    /// Create an empty, unbacked document with the given configuration.
    pub fn empty(config: Config) -> Self {
        Self::load(None, config).expect("creating an empty document cannot fail")
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn modified(&self) -> bool {
        self.history.modified()
    }

    /// Consume and drop the editor. `Drop` already releases every piece,
    /// insertion buffer, and the original mapping; this exists so callers
    /// that want disposal at an explicit point (rather than at scope exit)
    /// have a named operation to call, mirroring the original interface.
    pub fn free(self) {}

    // ---------------------------------------------------------------
    // Locating positions
    // ---------------------------------------------------------------

    fn locate(&self, pos: usize) -> Location {
        debug_assert!(pos <= self.size);
        let mut cur = 0usize;
        let mut node = self
            .arena
            .get(self.begin)
            .next
            .expect("begin always has a next link");
        loop {
            let len = self.arena.get(node).len;
            if pos <= cur + len {
                return Location {
                    piece: node,
                    offset: pos - cur,
                };
            }
            cur += len;
            node = self
                .arena
                .get(node)
                .next
                .expect("pos <= size guarantees a next piece exists");
        }
    }

    fn piece_bytes(&self, id: PieceId) -> &[u8] {
        let piece = self.arena.get(id);
        match piece.content {
            Content::Original { offset } => {
                let region = self
                    .original
                    .as_ref()
                    .expect("a piece referencing the original region implies one was loaded");
                &region.as_bytes()[offset..offset + piece.len]
            }
            Content::Insertion { buffer, offset } => {
                self.insertions.bytes(crate::storage::InsertionHandle {
                    buffer,
                    offset,
                    len: piece.len,
                })
            }
        }
    }

    // ---------------------------------------------------------------
    // The span-swap primitive
    // ---------------------------------------------------------------

    fn swap(&mut self, old: Span, new: Span) {
        match (old.is_empty(), new.is_empty()) {
            (true, true) => {}
            (true, false) => {
                let start = new.start.expect("non-empty span has a start");
                let end = new.end.expect("non-empty span has an end");
                let prev = self.arena.get(start).prev;
                let next = self.arena.get(end).next;
                if let Some(prev) = prev {
                    self.arena.get_mut(prev).next = Some(start);
                }
                if let Some(next) = next {
                    self.arena.get_mut(next).prev = Some(end);
                }
            }
            (false, true) => {
                let start = old.start.expect("non-empty span has a start");
                let end = old.end.expect("non-empty span has an end");
                let prev = self.arena.get(start).prev;
                let next = self.arena.get(end).next;
                if let Some(prev) = prev {
                    self.arena.get_mut(prev).next = next;
                }
                if let Some(next) = next {
                    self.arena.get_mut(next).prev = prev;
                }
            }
            (false, false) => {
                let old_start = old.start.expect("non-empty span has a start");
                let old_end = old.end.expect("non-empty span has an end");
                let new_start = new.start.expect("non-empty span has a start");
                let new_end = new.end.expect("non-empty span has an end");
                let prev = self.arena.get(old_start).prev;
                let next = self.arena.get(old_end).next;
                if let Some(prev) = prev {
                    self.arena.get_mut(prev).next = Some(new_start);
                }
                if let Some(next) = next {
                    self.arena.get_mut(next).prev = Some(new_end);
                }
            }
        }
        self.size = self.size - old.len + new.len;
    }

    // ---------------------------------------------------------------
    // History plumbing shared by insert/delete/replace
    // ---------------------------------------------------------------

    fn record_change(&mut self, change: Change) {
        if let Some(truncated) = self.history.begin_edit() {
            for action in truncated {
                self.free_discarded_action(action);
            }
        }
        self.swap(change.old, change.new);
        self.history.push_change(change);
    }

    /// Free the pieces a discarded redo Action's Changes linked in. The old
    /// side of each Change is left alone: it's still referenced by whatever
    /// sequence came before that Change was made.
    fn free_discarded_action(&mut self, action: Action) {
        for change in action.changes {
            self.free_span(change.new);
        }
    }

    fn free_span(&mut self, span: Span) {
        let Some(start) = span.start else { return };
        let end = span.end.expect("non-empty span has an end");
        let mut node = start;
        loop {
            let next = self.arena.get(node).next;
            self.arena.free(node);
            if node == end {
                break;
            }
            node = next.expect("span pieces remain chained until the end is freed");
        }
    }

    // ---------------------------------------------------------------
    // Insert
    // ---------------------------------------------------------------

    pub fn insert(&mut self, pos: usize, bytes: &[u8]) -> Result<()> {
        if pos > self.size {
            return Err(EditorError::OutOfBounds);
        }
        if bytes.is_empty() {
            return Ok(());
        }

        let handle = self.insertions.store(bytes)?;
        let content = Content::Insertion {
            buffer: handle.buffer,
            offset: handle.offset,
        };

        let (old, new) = if self.size == 0 {
            let piece = self.arena.alloc(content, handle.len, Some(self.begin), Some(self.end));
            (Span::empty(), Span::single(piece, handle.len))
        } else {
            let loc = self.locate(pos);
            let piece_len = self.arena.get(loc.piece).len;

            if loc.offset == 0 {
                // Only possible at pos == 0: nothing in the document precedes
                // loc.piece, so the new piece slots in ahead of it.
                let prev = self.arena.get(loc.piece).prev;
                let piece = self.arena.alloc(content, handle.len, prev, Some(loc.piece));
                (Span::empty(), Span::single(piece, handle.len))
            } else if loc.offset == piece_len {
                let next = self.arena.get(loc.piece).next;
                let piece = self.arena.alloc(content, handle.len, Some(loc.piece), next);
                (Span::empty(), Span::single(piece, handle.len))
            } else {
                let split: Piece = *self.arena.get(loc.piece);
                let before_id =
                    self.arena
                        .alloc(split.content, loc.offset, split.prev, None);
                let middle_id = self.arena.alloc(content, handle.len, Some(before_id), None);
                let after_id = self.arena.alloc(
                    split.content.advance(loc.offset),
                    split.len - loc.offset,
                    Some(middle_id),
                    split.next,
                );
                self.arena.get_mut(before_id).next = Some(middle_id);
                self.arena.get_mut(middle_id).next = Some(after_id);

                let old = Span::single(loc.piece, split.len);
                let new = Span {
                    start: Some(before_id),
                    end: Some(after_id),
                    len: split.len + handle.len,
                };
                (old, new)
            }
        };

        self.record_change(Change { old, new });
        Ok(())
    }

    // ---------------------------------------------------------------
    // Delete
    // ---------------------------------------------------------------

    pub fn delete(&mut self, pos: usize, len: usize) -> Result<()> {
        if len == 0 {
            return Ok(());
        }
        match pos.checked_add(len) {
            Some(end) if end <= self.size => {}
            _ => return Err(EditorError::OutOfBounds),
        }

        let loc = self.locate(pos);
        let loc_len = self.arena.get(loc.piece).len;
        let (start_piece, start_offset, start_prev) = if loc.offset == loc_len {
            // `loc.piece` ends exactly at `pos`: it sits wholly before the
            // deleted range and is left untouched, so the range actually
            // starts at the head of the next piece.
            let next = self
                .arena
                .get(loc.piece)
                .next
                .expect("pos < size guarantees a next piece exists at a boundary");
            (next, 0, Some(loc.piece))
        } else {
            (loc.piece, loc.offset, self.arena.get(loc.piece).prev)
        };

        let mut node = start_piece;
        let mut local_offset = start_offset;
        let mut remaining = len;
        let mut old_len = 0usize;
        let (end_piece, end_offset) = loop {
            let plen = self.arena.get(node).len;
            old_len += plen;
            let available = plen - local_offset;
            if remaining <= available {
                break (node, local_offset + remaining);
            }
            remaining -= available;
            node = self
                .arena
                .get(node)
                .next
                .expect("pos + len <= size guarantees the range stays inside the document");
            local_offset = 0;
        };
        let end_next = self.arena.get(end_piece).next;
        let end_len = self.arena.get(end_piece).len;

        let before = if start_offset == 0 {
            None
        } else {
            let split: Piece = *self.arena.get(start_piece);
            Some(
                self.arena
                    .alloc(split.content, start_offset, start_prev, None),
            )
        };

        let after = if end_offset == end_len {
            None
        } else {
            let split: Piece = *self.arena.get(end_piece);
            Some(self.arena.alloc(
                split.content.advance(end_offset),
                end_len - end_offset,
                None,
                end_next,
            ))
        };

        let new = match (before, after) {
            (None, None) => Span::empty(),
            (Some(b), None) => {
                self.arena.get_mut(b).next = end_next;
                Span::single(b, start_offset)
            }
            (None, Some(a)) => {
                self.arena.get_mut(a).prev = start_prev;
                Span::single(a, end_len - end_offset)
            }
            (Some(b), Some(a)) => {
                self.arena.get_mut(b).next = Some(a);
                self.arena.get_mut(a).prev = Some(b);
                Span {
                    start: Some(b),
                    end: Some(a),
                    len: start_offset + (end_len - end_offset),
                }
            }
        };

        let old = Span {
            start: Some(start_piece),
            end: Some(end_piece),
            len: old_len,
        };
        self.record_change(Change { old, new });
        Ok(())
    }

    // ---------------------------------------------------------------
    // Replace
    // ---------------------------------------------------------------

    pub fn replace(&mut self, pos: usize, bytes: &[u8]) -> Result<()> {
        if pos > self.size {
            return Err(EditorError::OutOfBounds);
        }
        self.delete(pos, bytes.len())?;
        self.insert(pos, bytes)
    }

    // ---------------------------------------------------------------
    // Undo / redo / snapshot
    // ---------------------------------------------------------------

    /// Returns `true` if an Action was undone, `false` if there was nothing
    /// to undo.
    pub fn undo(&mut self) -> bool {
        let Some(action) = self.history.take_for_undo() else {
            return false;
        };
        for change in action.changes.iter().rev() {
            self.swap(change.new, change.old);
        }
        self.history.push_to_redo(action);
        true
    }

    /// Returns `true` if an Action was redone, `false` if there was nothing
    /// to redo.
    pub fn redo(&mut self) -> bool {
        let Some(action) = self.history.take_for_redo() else {
            return false;
        };
        for change in action.changes.iter() {
            self.swap(change.old, change.new);
        }
        self.history.push_to_undo(action);
        true
    }

    pub fn snapshot(&mut self) {
        self.history.snapshot();
    }

    // ---------------------------------------------------------------
    // Iteration
    // ---------------------------------------------------------------

    /// Walk the document from `pos` to the end, invoking `sink(position,
    /// bytes)` once per piece (the first call may cover only the tail of
    /// the piece containing `pos`). Stops early if `sink` returns `false`.
    pub fn iterate<F>(&self, pos: usize, mut sink: F) -> Result<()>
    where
        F: FnMut(usize, &[u8]) -> bool,
    {
        if pos > self.size {
            return Err(EditorError::OutOfBounds);
        }
        if pos == self.size {
            return Ok(());
        }

        let loc = self.locate(pos);
        let mut node = loc.piece;
        let mut offset = loc.offset;
        let mut absolute = pos;

        loop {
            let bytes = &self.piece_bytes(node)[offset..];
            if !bytes.is_empty() {
                if !sink(absolute, bytes) {
                    return Ok(());
                }
                absolute += bytes.len();
            }
            match self.arena.get(node).next {
                Some(next) if next != self.end => {
                    node = next;
                    offset = 0;
                }
                _ => break,
            }
        }
        Ok(())
    }

    /// Collect the whole document into one buffer. Convenience built on
    /// [`Editor::iterate`]; not part of the hot path.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.size);
        let _ = self.iterate(0, |_, bytes| {
            out.extend_from_slice(bytes);
            true
        });
        out
    }

    // ---------------------------------------------------------------
    // Save
    // ---------------------------------------------------------------

    pub fn save(&mut self, path: &Path) -> Result<()> {
        let parent = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("untitled");
        let tmp_path = parent.join(format!(".{file_name}.tmp"));

        if let Err(err) = self.write_and_rename(&tmp_path, path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(err);
        }

        self.history.mark_saved();
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    fn write_and_rename(&self, tmp_path: &Path, final_path: &Path) -> Result<()> {
        let mut options = OpenOptions::new();
        options.read(true).write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);
        let file = options.open(tmp_path)?;
        file.set_len(self.size as u64)?;

        if self.size > 0 {
            // SAFETY: `file` was just created by this process and is not
            // mapped or written to by anyone else for the duration of the
            // mapping below.
            let mut mmap = unsafe { MmapMut::map_mut(&file)? };
            let mut offset = 0usize;
            self.iterate(0, |_, bytes| {
                mmap[offset..offset + bytes.len()].copy_from_slice(bytes);
                offset += bytes.len();
                true
            })?;
            mmap.flush()?;
        }
        drop(file);

        std::fs::rename(tmp_path, final_path)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "editor_tests.rs"]
mod tests;
