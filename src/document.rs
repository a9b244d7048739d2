//! The immutable input handed to the pipeline.
//!
//! ## Why `Arc<[u8]>`?
//!
//! The in-process recovery engines are CPU-bound and run inside
//! `spawn_blocking`, whose closures must be `'static`. Wrapping the bytes in
//! an `Arc` lets each stage take a cheap shared handle instead of copying a
//! potentially large document once per stage. No stage ever mutates the
//! input; repairs always re-serialise into a fresh buffer.

use crate::identity::ContentId;
use std::sync::Arc;

/// A possibly-corrupt document plus its derived content identifier.
///
/// The identifier is computed exactly once, at construction, and reused for
/// every log line and scratch-file name in the repair call.
#[derive(Debug, Clone)]
pub struct InputDocument {
    data: Arc<[u8]>,
    id: ContentId,
}

impl InputDocument {
    /// Wrap raw document bytes, fingerprinting them once.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        let data: Arc<[u8]> = bytes.into().into();
        let id = ContentId::of_bytes(&data);
        Self { data, id }
    }

    /// The raw input bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// The correlation key for this document.
    pub fn id(&self) -> &ContentId {
        &self.id
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Shared handle for moving the bytes into a `spawn_blocking` closure.
    pub(crate) fn share(&self) -> Arc<[u8]> {
        Arc::clone(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_computed_once_and_stable() {
        let doc = InputDocument::new(b"%PDF-1.4".to_vec());
        let again = InputDocument::new(b"%PDF-1.4".to_vec());
        assert_eq!(doc.id(), again.id());
        assert_eq!(doc.len(), 8);
        assert!(!doc.is_empty());
    }

    #[test]
    fn share_points_at_the_same_bytes() {
        let doc = InputDocument::new(vec![1u8, 2, 3]);
        let shared = doc.share();
        assert_eq!(&shared[..], doc.bytes());
    }
}
