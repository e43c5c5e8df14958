//! Centralized error handling for the buffer engine.
//! Defines the closed set of failure modes the piece-table core can produce.

use std::fmt;
use std::io;

/// Errors produced by the buffer engine.
#[derive(Debug)]
pub enum EditorError {
    /// Any allocation (piece, insertion buffer, change, action) failed.
    OutOfMemory,
    /// Insert, delete, or iterate past the end of the document.
    OutOfBounds,
    /// `load` target is not a regular file.
    NotRegular,
    /// Open, stat, mmap, ftruncate, write, close, or rename failed.
    Io(io::Error),
}

impl fmt::Display for EditorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory => write!(f, "out of memory"),
            Self::OutOfBounds => write!(f, "position out of bounds"),
            Self::NotRegular => write!(f, "not a regular file"),
            Self::Io(err) => write!(f, "io error: {err}"),
        }
    }
}

impl std::error::Error for EditorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for EditorError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

/// Result alias for buffer engine operations.
pub type Result<T> = std::result::Result<T, EditorError>;
