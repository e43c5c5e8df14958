//! Backing regions pieces point into: the read-only original mapping and the
//! append-only insertion buffers.

use crate::error::{EditorError, Result};
use memmap2::Mmap;

/// The read-only mapping of the file an editor was loaded from.
///
/// Once created the mapping is never rewritten; it is unmapped when the
/// editor (and this value) is dropped.
#[derive(Debug)]
pub struct OriginalRegion {
    mmap: Mmap,
}

impl OriginalRegion {
    pub fn new(mmap: Mmap) -> Self {
        Self { mmap }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap
    }

    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }
}

/// A stable reference to a byte range inside one of the editor's backing
/// regions, handed back by [`InsertionStore::store`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertionHandle {
    pub buffer: usize,
    pub offset: usize,
    pub len: usize,
}

/// A single append-only heap region. Bytes below `len` are never
/// overwritten; once a piece refers to a range inside this buffer that range
/// stays valid for the editor's lifetime.
#[derive(Debug)]
struct InsertionBuffer {
    bytes: Vec<u8>,
}

impl InsertionBuffer {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    fn remaining(&self) -> usize {
        self.bytes.capacity() - self.bytes.len()
    }

    fn append(&mut self, data: &[u8]) -> usize {
        let offset = self.bytes.len();
        self.bytes.extend_from_slice(data);
        offset
    }

    fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// The chain of insertion buffers an editor writes inserted bytes into.
///
/// New buffers are only appended; existing ones are never rewritten or
/// freed until the whole store is dropped. Space left over in a buffer that
/// is no longer the head is deliberately orphaned rather than
/// reclaimed by splitting pieces to fill it.
#[derive(Debug)]
pub struct InsertionStore {
    buffers: Vec<InsertionBuffer>,
    default_capacity: usize,
}

impl InsertionStore {
    pub fn new(default_capacity: usize) -> Self {
        Self {
            buffers: Vec::new(),
            default_capacity,
        }
    }

    pub fn store(&mut self, data: &[u8]) -> Result<InsertionHandle> {
        if data.is_empty() {
            return Ok(InsertionHandle {
                buffer: 0,
                offset: 0,
                len: 0,
            });
        }

        let needs_new_buffer = match self.buffers.last() {
            Some(head) => head.remaining() < data.len(),
            None => true,
        };

        if needs_new_buffer {
            let capacity = self.default_capacity.max(data.len());
            self.buffers.push(InsertionBuffer::with_capacity(capacity));
        }

        let buffer = self.buffers.len() - 1;
        let head = self
            .buffers
            .last_mut()
            .ok_or(EditorError::OutOfMemory)?;
        let offset = head.append(data);
        Ok(InsertionHandle {
            buffer,
            offset,
            len: data.len(),
        })
    }

    pub fn bytes(&self, handle: InsertionHandle) -> &[u8] {
        if handle.len == 0 {
            return &[];
        }
        &self.buffers[handle.buffer].as_bytes()[handle.offset..handle.offset + handle.len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_within_one_buffer() {
        let mut store = InsertionStore::new(1024);
        let a = store.store(b"hello").unwrap();
        let b = store.store(b" world").unwrap();
        assert_eq!(store.bytes(a), b"hello");
        assert_eq!(store.bytes(b), b" world");
        assert_eq!(a.buffer, b.buffer);
    }

    #[test]
    fn overflow_allocates_new_buffer() {
        let mut store = InsertionStore::new(4);
        let a = store.store(b"abcd").unwrap();
        let b = store.store(b"e").unwrap();
        assert_eq!(a.buffer, 0);
        assert_eq!(b.buffer, 1);
        assert_eq!(store.bytes(a), b"abcd");
        assert_eq!(store.bytes(b), b"e");
    }

    #[test]
    fn oversized_insertion_gets_its_own_buffer() {
        let mut store = InsertionStore::new(4);
        let big = vec![b'x'; 100];
        let handle = store.store(&big).unwrap();
        assert_eq!(store.bytes(handle), big.as_slice());
    }

    #[test]
    fn empty_store_is_a_no_op() {
        let mut store = InsertionStore::new(16);
        let handle = store.store(b"").unwrap();
        assert_eq!(store.bytes(handle), b"");
    }
}
