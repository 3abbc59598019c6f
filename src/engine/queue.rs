// src/engine/queue.rs
// =============================================================================
// The shared frontier: nodes waiting to be expanded.
//
// Workers push discovered neighbors to the back. The controller pops from the
// front (FIFO, breadth-first) or from the back (LIFO, depth-first). The lock
// is held only for a single push or pop, never across an await.
//
// The queue is unbounded. A neighbor function that fans out faster than the
// pool drains it will grow it without limit; admission control bounds the
// number of running tasks, not the number of waiting nodes.
// =============================================================================

use std::collections::VecDeque;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::node::Node;

/// Which end of the queue the controller takes the next node from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueOrder {
    /// Oldest node first. Gives breadth-first order.
    Fifo,
    /// Newest node first. Gives depth-first order.
    Lifo,
}

pub struct WorkQueue<E> {
    nodes: Mutex<VecDeque<Node<E>>>,
    order: QueueOrder,
}

impl<E> WorkQueue<E> {
    pub fn new(order: QueueOrder) -> Self {
        Self {
            nodes: Mutex::new(VecDeque::new()),
            order,
        }
    }

    pub fn push(&self, node: Node<E>) {
        self.nodes.lock().push_back(node);
    }

    pub fn push_all<I>(&self, nodes: I)
    where
        I: IntoIterator<Item = Node<E>>,
    {
        self.nodes.lock().extend(nodes);
    }

    /// Takes the next node according to the queue order. Never blocks.
    pub fn pop(&self) -> Option<Node<E>> {
        let mut nodes = self.nodes.lock();
        match self.order {
            QueueOrder::Fifo => nodes.pop_front(),
            QueueOrder::Lifo => nodes.pop_back(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.lock().is_empty()
    }

    /// Empties the queue, returning what was left in pop order.
    pub fn drain(&self) -> Vec<Node<E>> {
        let mut nodes = self.nodes.lock();
        match self.order {
            QueueOrder::Fifo => nodes.drain(..).collect(),
            QueueOrder::Lifo => nodes.drain(..).rev().collect(),
        }
    }
}
