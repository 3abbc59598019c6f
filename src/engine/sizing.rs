// src/engine/sizing.rs
// =============================================================================
// Sizing and building the worker pool.
//
// A worker that only computes needs one thread per core. A worker that spends
// a fraction `b` of its time blocked on I/O needs `cores / (1 - b)` threads to
// keep the cores busy. Crawling is almost all waiting on the network, so the
// crawler defaults to b = 0.98.
//
// The pool itself is a tokio multi-thread runtime. Two tunings are offered:
// - Fixed: every worker checks the shared injection queue on every tick, so
//   tasks run roughly in submission order, like a plain fixed-size pool
// - WorkStealing: tokio's default scheduler tuning, where idle workers steal
//   from busy ones. Better when task sizes are uneven, which is the normal
//   case for a crawl with a few pages fanning out to hundreds of links
// =============================================================================

use std::num::NonZeroUsize;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tokio::runtime::{Builder, Runtime};

use super::error::{EngineError, EngineResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PoolKind {
    Fixed,
    WorkStealing,
}

/// Cores available to this process, falling back to 1 when unknown.
pub fn available_cores() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Recommended thread count for `cores` cores and a blocking coefficient in
/// `[0, 1)`. Never returns less than 1.
pub fn pool_size(cores: usize, blocking_coefficient: f64) -> EngineResult<usize> {
    if !(0.0..1.0).contains(&blocking_coefficient) {
        return Err(EngineError::invalid(format!(
            "blocking coefficient must be in [0, 1), got {blocking_coefficient}"
        )));
    }
    let threads = (cores as f64 / (1.0 - blocking_coefficient)).round() as usize;
    Ok(threads.max(1))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    pub kind: PoolKind,
    pub threads: usize,
}

impl ExecutorConfig {
    /// One thread per available core.
    pub fn cpu_default(kind: PoolKind) -> Self {
        Self {
            kind,
            threads: available_cores(),
        }
    }

    pub fn fixed_size(kind: PoolKind, threads: usize) -> EngineResult<Self> {
        if threads == 0 {
            return Err(EngineError::invalid("worker pool needs at least one thread"));
        }
        Ok(Self { kind, threads })
    }

    /// Sized from the available cores and the expected blocking coefficient.
    pub fn for_blocking_coefficient(kind: PoolKind, blocking_coefficient: f64) -> EngineResult<Self> {
        let threads = pool_size(available_cores(), blocking_coefficient)?;
        Ok(Self { kind, threads })
    }

    pub fn build_runtime(&self) -> EngineResult<Runtime> {
        let mut builder = Builder::new_multi_thread();
        builder
            .worker_threads(self.threads)
            .thread_name("graph-crawler-worker")
            .enable_all();

        if self.kind == PoolKind::Fixed {
            builder.global_queue_interval(1);
        }

        Ok(builder.build()?)
    }
}
