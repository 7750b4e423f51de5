//! Preview resources.
//!
//! Every image and cover in a collection holds one preview handle (an object
//! URL in the browser). Handles are created when an item arrives and must be
//! released exactly once when the item is removed or replaced.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Preview creation failed: {0}")]
pub struct PreviewError(pub String);

/// Opaque preview reference, displayable by the front-end.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PreviewHandle(String);

impl PreviewHandle {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Creates and releases preview resources.
pub trait PreviewStore {
    fn create(&mut self, bytes: &[u8], mime_type: &str) -> Result<PreviewHandle, PreviewError>;

    fn release(&mut self, handle: &PreviewHandle);
}

/// In-memory store that only tracks which handles are live.
#[derive(Debug, Default)]
pub struct MemoryPreviewStore {
    next: u64,
    live: BTreeSet<PreviewHandle>,
    released: usize,
}

impl MemoryPreviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn is_live(&self, handle: &PreviewHandle) -> bool {
        self.live.contains(handle)
    }

    /// Number of successful releases so far.
    pub fn released_count(&self) -> usize {
        self.released
    }
}

impl PreviewStore for MemoryPreviewStore {
    fn create(&mut self, bytes: &[u8], mime_type: &str) -> Result<PreviewHandle, PreviewError> {
        self.next += 1;
        let handle = PreviewHandle(format!("memory:{}/{}#{}", mime_type, self.next, bytes.len()));
        self.live.insert(handle.clone());
        Ok(handle)
    }

    fn release(&mut self, handle: &PreviewHandle) {
        if self.live.remove(handle) {
            self.released += 1;
        }
    }
}

impl<P: PreviewStore + ?Sized> PreviewStore for &mut P {
    fn create(&mut self, bytes: &[u8], mime_type: &str) -> Result<PreviewHandle, PreviewError> {
        (**self).create(bytes, mime_type)
    }

    fn release(&mut self, handle: &PreviewHandle) {
        (**self).release(handle)
    }
}
