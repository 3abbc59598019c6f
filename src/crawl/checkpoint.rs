// src/crawl/checkpoint.rs
// =============================================================================
// Saving a stopped crawl so it can be picked up later.
//
// The engine itself has no file format. A checkpoint is just the two things a
// resume needs, written as JSON:
// - visited: elements already expanded, restored into the new engine
// - frontier: elements still waiting, fed to continue_traversing_from
// =============================================================================

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::engine::{Element, TraversalEngine};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint<E> {
    pub visited: Vec<E>,
    pub frontier: Vec<E>,
}

impl<E: Element> Checkpoint<E> {
    /// Takes the visited set and the leftover queue of a stopped engine.
    /// `extra` is added to the frontier, e.g. a search match that was reported
    /// but never expanded.
    pub fn capture(engine: &mut TraversalEngine<E>, extra: Option<E>) -> Self {
        let mut frontier = engine.drain_frontier();
        if let Some(element) = extra {
            if !frontier.contains(&element) {
                frontier.push(element);
            }
        }
        Self {
            visited: engine.visited_elements(),
            frontier,
        }
    }

    /// Restores the visited set into `engine` and hands back the frontier to
    /// continue from.
    pub fn restore(self, engine: &mut TraversalEngine<E>) -> Vec<E> {
        engine.restore_visited(self.visited);
        self.frontier
    }
}

impl<E> Checkpoint<E>
where
    E: Serialize + DeserializeOwned,
{
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading checkpoint {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing checkpoint {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path, raw).with_context(|| format!("writing checkpoint {}", path.display()))
    }
}
