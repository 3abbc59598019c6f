// src/engine/node.rs
// =============================================================================
// A node in the frontier: an element plus the depth at which it was found.
//
// Identity is the element alone. The depth is bookkeeping for the level
// barrier and the depth limit, so two nodes carrying the same element at
// different depths compare equal and hash the same.
// =============================================================================

use std::fmt;
use std::hash::{Hash, Hasher};

/// Everything the engine needs from an element type.
///
/// Elements cross task boundaries and live in concurrent sets, so they have
/// to be cheap to clone, hashable and shareable between threads.
pub trait Element: Clone + Eq + Hash + Send + Sync + fmt::Debug + 'static {}

impl<T> Element for T where T: Clone + Eq + Hash + Send + Sync + fmt::Debug + 'static {}

#[derive(Clone)]
pub struct Node<E> {
    element: E,
    depth: usize,
}

impl<E> Node<E> {
    pub fn new(element: E, depth: usize) -> Self {
        Self { element, depth }
    }

    /// A node at depth 0, used for seeds and checkpoint resumes.
    pub fn root(element: E) -> Self {
        Self::new(element, 0)
    }

    pub fn element(&self) -> &E {
        &self.element
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The node for a neighbor discovered while expanding `self`.
    pub fn child(&self, element: E) -> Self {
        Self::new(element, self.depth + 1)
    }

    pub fn into_element(self) -> E {
        self.element
    }
}

impl<E: PartialEq> PartialEq for Node<E> {
    fn eq(&self, other: &Self) -> bool {
        self.element == other.element
    }
}

impl<E: Eq> Eq for Node<E> {}

impl<E: Hash> Hash for Node<E> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.element.hash(state);
    }
}

impl<E: fmt::Debug> fmt::Debug for Node<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("element", &self.element)
            .field("depth", &self.depth)
            .finish()
    }
}
