//! Persistent "already animated" marker set

use crate::entry::EntryIdentity;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

/// Collaborator that remembers which entries have completed a typing reveal.
///
/// The animator inserts an identity the moment its reveal animation
/// finishes and clears the whole set when a run reaches a terminal status,
/// so every run animates each entry exactly once.
pub trait AnimatedMarker: Send + Sync {
    /// Whether this identity has already been animated
    fn contains(&self, id: &EntryIdentity) -> bool;
    /// Record a completed reveal
    fn insert(&self, id: EntryIdentity);
    /// Drop every recorded identity (start of a new marker epoch)
    fn clear(&self);
}

/// Session-scoped in-memory marker set.
///
/// All fields are `Arc`-wrapped, so cloning is cheap and clones share state
/// across animator remounts.
#[derive(Clone, Default)]
pub struct InMemoryMarker {
    seen: Arc<Mutex<HashSet<EntryIdentity>>>,
}

impl InMemoryMarker {
    /// Create an empty marker set
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded identities
    pub fn len(&self) -> usize {
        self.seen.lock().len()
    }

    /// Whether no identity has been recorded
    pub fn is_empty(&self) -> bool {
        self.seen.lock().is_empty()
    }
}

impl AnimatedMarker for InMemoryMarker {
    fn contains(&self, id: &EntryIdentity) -> bool {
        self.seen.lock().contains(id)
    }

    fn insert(&self, id: EntryIdentity) {
        self.seen.lock().insert(id);
    }

    fn clear(&self) {
        self.seen.lock().clear();
    }
}
