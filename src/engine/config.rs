// src/engine/config.rs
// =============================================================================
// Engine configuration.
//
// Every field has a default, so a JSON config file only needs the keys it
// wants to change. Durations are stored in milliseconds to keep the file
// format flat.
// =============================================================================

use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::error::{EngineError, EngineResult};
use super::queue::QueueOrder;

/// How the controller orders and synchronizes expansions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TraversalOrder {
    /// FIFO queue plus the level barrier: each depth finishes before the next
    /// one starts.
    Breadth,
    /// LIFO queue, no barrier.
    Depth,
    /// FIFO queue, no barrier. Only admission control limits how far ahead
    /// the controller runs.
    Unordered,
}

impl TraversalOrder {
    pub fn queue_order(self) -> QueueOrder {
        match self {
            TraversalOrder::Breadth | TraversalOrder::Unordered => QueueOrder::Fifo,
            TraversalOrder::Depth => QueueOrder::Lifo,
        }
    }

    pub fn uses_level_barrier(self) -> bool {
        matches!(self, TraversalOrder::Breadth)
    }
}

/// How the controller decides that a run is finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Done once the queue stays empty for a whole quiescence timeout. Work a
    /// slow worker pushes after that point is dropped.
    Quiescence,
    /// Done once the queue is empty and no task is in flight. The quiescence
    /// timeout becomes a poll interval.
    Exact,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub order: TraversalOrder,
    pub termination: Termination,
    /// How long the controller waits for new work before giving up.
    pub quiescence_timeout_ms: u64,
    /// Budget handed to the neighbor function, and enforced around it.
    pub neighbor_timeout_ms: u64,
    /// Upper bound on concurrently running expansions. `None` is unbounded.
    pub max_in_flight: Option<usize>,
    /// Pause after each submission. Zero disables it.
    pub submit_delay_ms: u64,
    /// Nodes at this depth or deeper are marked visited without expansion.
    pub max_depth: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            order: TraversalOrder::Breadth,
            termination: Termination::Quiescence,
            quiescence_timeout_ms: 5_000,
            neighbor_timeout_ms: 3_000,
            max_in_flight: None,
            submit_delay_ms: 0,
            max_depth: None,
        }
    }
}

impl EngineConfig {
    pub fn quiescence_timeout(&self) -> Duration {
        Duration::from_millis(self.quiescence_timeout_ms)
    }

    pub fn neighbor_timeout(&self) -> Duration {
        Duration::from_millis(self.neighbor_timeout_ms)
    }

    pub fn submit_delay(&self) -> Duration {
        Duration::from_millis(self.submit_delay_ms)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.quiescence_timeout_ms == 0 {
            return Err(EngineError::invalid("quiescence timeout must be > 0 ms"));
        }
        if self.neighbor_timeout_ms == 0 {
            return Err(EngineError::invalid("neighbor timeout must be > 0 ms"));
        }
        if self.max_in_flight == Some(0) {
            return Err(EngineError::invalid("max in-flight tasks must be > 0"));
        }
        Ok(())
    }
}
