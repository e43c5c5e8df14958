//! Tunable knobs for the buffer engine.

/// Default capacity of a freshly allocated insertion buffer: one mebibyte.
pub const DEFAULT_INSERTION_BUFFER_CAPACITY: usize = 1024 * 1024;

/// Configuration an [`Editor`](crate::editor::Editor) is constructed with.
///
/// The only knob the data model exposes is the default size of a new
/// insertion buffer: embedders with a known write rate can raise it
/// to cut down on buffer churn, or lower it for memory-constrained hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub insertion_buffer_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            insertion_buffer_capacity: DEFAULT_INSERTION_BUFFER_CAPACITY,
        }
    }
}

impl Config {
    pub fn new(insertion_buffer_capacity: usize) -> Self {
        Self {
            insertion_buffer_capacity,
        }
    }
}
