// src/engine/visited.rs
// =============================================================================
// The set of elements whose neighbors have already been enumerated.
//
// Backed by a DashSet, so workers read and insert without any engine-level
// lock. Callers check membership and insert later, so two workers racing on
// the same element can both expand it. That duplicate work is bounded (both
// push the same neighbors, which later checks filter) and the set itself
// never holds an element twice.
// =============================================================================

use dashmap::DashSet;

use super::node::Element;

pub struct VisitedSet<E: Element> {
    inner: DashSet<E>,
}

impl<E: Element> VisitedSet<E> {
    pub fn new() -> Self {
        Self {
            inner: DashSet::new(),
        }
    }

    pub fn contains(&self, element: &E) -> bool {
        self.inner.contains(element)
    }

    /// Marks `element` visited. Returns false if it was already there.
    pub fn insert(&self, element: E) -> bool {
        self.inner.insert(element)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Copies the current members out. Order is unspecified.
    pub fn snapshot(&self) -> Vec<E> {
        self.inner.iter().map(|entry| entry.key().clone()).collect()
    }
}

impl<E: Element> Default for VisitedSet<E> {
    fn default() -> Self {
        Self::new()
    }
}
