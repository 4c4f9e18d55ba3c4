//! Shared registry for concurrent hosts
//!
//! The engine itself is single-threaded: nothing in it blocks, sleeps or
//! performs I/O. A host with multiple dispatch threads must put the whole
//! registry behind one mutual-exclusion boundary, because label promotion
//! is a compound remove-and-reinsert across two indices that has to appear
//! atomic to every reader. [`SharedRegistry`] is that boundary; sharded or
//! per-entry locking cannot provide it.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::message::DialogueMessage;
use crate::registry::DialogueRegistry;

/// A cloneable handle to one agent's registry, protected by a single
/// mutex.
pub struct SharedRegistry<M: DialogueMessage, R, E>
where
    R: Copy + Eq + Hash + fmt::Debug,
    E: Copy + Eq + Hash + fmt::Debug,
{
    inner: Arc<Mutex<DialogueRegistry<M, R, E>>>,
}

impl<M, R, E> SharedRegistry<M, R, E>
where
    M: DialogueMessage,
    R: Copy + Eq + Hash + fmt::Debug,
    E: Copy + Eq + Hash + fmt::Debug,
{
    /// Wrap a registry for shared use.
    pub fn new(registry: DialogueRegistry<M, R, E>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(registry)),
        }
    }

    /// Lock the registry for a batch of operations.
    ///
    /// Hold the guard across every step that must appear atomic
    /// (resolution plus extension, or promotion plus reply construction)
    /// and drop it before any I/O.
    pub fn lock(&self) -> MutexGuard<'_, DialogueRegistry<M, R, E>> {
        self.inner.lock()
    }
}

impl<M, R, E> Clone for SharedRegistry<M, R, E>
where
    M: DialogueMessage,
    R: Copy + Eq + Hash + fmt::Debug,
    E: Copy + Eq + Hash + fmt::Debug,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
