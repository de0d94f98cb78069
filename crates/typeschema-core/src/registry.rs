//! Per-session bookkeeping of which types are expanded, expanding, or waiting.
//!
//! A type moves `absent -> in progress -> completed` and never back. Fix-up
//! callbacks registered while a type is in progress are drained, in
//! registration order, by the [`complete`](TypeRegistry::complete) call that
//! finishes it.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::error::RegistryError;
use crate::schema::{SchemaGraph, SchemaId};
use crate::types::TypeKey;

/// Deferred patch applied to the graph once a type's schema is finished.
/// Receives the finished schema's id.
pub type Fixup = Box<dyn FnOnce(&mut SchemaGraph, SchemaId)>;

#[derive(Default)]
pub struct TypeRegistry {
    completed: HashMap<TypeKey, SchemaId>,
    completion_order: Vec<TypeKey>,
    in_progress: HashSet<TypeKey>,
    pending: HashMap<TypeKey, Vec<Fixup>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, key: TypeKey) -> Option<SchemaId> {
        self.completed.get(&key).copied()
    }

    pub fn is_in_progress(&self, key: TypeKey) -> bool {
        self.in_progress.contains(&key)
    }

    pub fn mark_in_progress(&mut self, key: TypeKey) -> Result<(), RegistryError> {
        if self.completed.contains_key(&key) {
            return Err(RegistryError::AlreadyCompleted);
        }
        if !self.in_progress.insert(key) {
            return Err(RegistryError::AlreadyInProgress);
        }
        Ok(())
    }

    /// Record `schema` as the finished expansion of `key` and run every
    /// fix-up waiting on it. Returns how many fix-ups fired.
    pub fn complete(
        &mut self,
        key: TypeKey,
        schema: SchemaId,
        graph: &mut SchemaGraph,
    ) -> Result<usize, RegistryError> {
        if !self.in_progress.remove(&key) {
            return Err(if self.completed.contains_key(&key) {
                RegistryError::AlreadyCompleted
            } else {
                RegistryError::NotInProgress
            });
        }
        self.completed.insert(key, schema);
        self.completion_order.push(key);

        let fixups = self.pending.remove(&key).unwrap_or_default();
        let fired = fixups.len();
        for fixup in fixups {
            fixup(graph, schema);
        }
        Ok(fired)
    }

    /// Queue `callback` until `key` completes. Only valid while `key` is in
    /// progress.
    pub fn register_callback(
        &mut self,
        key: TypeKey,
        callback: impl FnOnce(&mut SchemaGraph, SchemaId) + 'static,
    ) -> Result<(), RegistryError> {
        if !self.in_progress.contains(&key) {
            return Err(RegistryError::NotInProgress);
        }
        self.pending.entry(key).or_default().push(Box::new(callback));
        Ok(())
    }

    pub fn pending_count(&self, key: TypeKey) -> usize {
        self.pending.get(&key).map_or(0, Vec::len)
    }

    /// Some type that still has callbacks queued, if any.
    pub fn first_pending(&self) -> Option<TypeKey> {
        self.pending
            .iter()
            .filter(|(_, callbacks)| !callbacks.is_empty())
            .map(|(key, _)| *key)
            .min()
    }

    /// Completed `(type, schema)` pairs in completion order.
    pub fn completed(&self) -> impl Iterator<Item = (TypeKey, SchemaId)> + '_ {
        self.completion_order
            .iter()
            .map(|key| (*key, self.completed[key]))
    }

    pub fn completed_len(&self) -> usize {
        self.completed.len()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("completed", &self.completion_order)
            .field("in_progress", &self.in_progress)
            .field(
                "pending",
                &self
                    .pending
                    .iter()
                    .map(|(key, callbacks)| (*key, callbacks.len()))
                    .collect::<HashMap<_, _>>(),
            )
            .finish()
    }
}
