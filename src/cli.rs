// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Three subcommands:
// - crawl: visit every page reachable from a URL
// - find: stop at the first page whose URL contains some text
// - resume: pick a crawl (or a find) back up from a checkpoint file
//
// Engine settings are global flags, so they can go before or after the
// subcommand. They start from the defaults, then an optional JSON config
// file, then whatever flags were given on the command line.
// =============================================================================

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};

use graph_crawler::engine::{
    EngineConfig, EngineResult, ExecutorConfig, PoolKind, Termination, TraversalOrder,
};

/// Blocking coefficient assumed when no thread count is given. Crawl workers
/// spend nearly all their time waiting on the network.
const CRAWL_BLOCKING_COEFFICIENT: f64 = 0.98;

#[derive(Parser, Debug)]
#[command(
    name = "graph-crawler",
    version,
    about = "Crawl a website concurrently, or search it for a page",
    long_about = "graph-crawler walks a website with a pool of concurrent workers. \
                  It can visit every reachable page, stop at the first page matching a pattern, \
                  and save or resume its progress through checkpoint files."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub engine: EngineArgs,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Visit every page reachable from a URL
    ///
    /// Example: graph-crawler crawl https://example.com --max-depth 3
    Crawl {
        /// URL to start from (e.g., https://example.com)
        url: String,

        /// Write the visited set to this file when done
        #[arg(long)]
        checkpoint: Option<PathBuf>,
    },

    /// Stop at the first page whose URL contains some text
    ///
    /// Example: graph-crawler find https://example.com --contains /contact
    Find {
        /// URL to start from
        url: String,

        /// Text the page URL must contain
        #[arg(long)]
        contains: String,

        /// Write visited pages and the unexplored frontier to this file
        #[arg(long)]
        checkpoint: Option<PathBuf>,
    },

    /// Continue from a checkpoint written by crawl or find
    Resume {
        /// Checkpoint file to read
        checkpoint: PathBuf,

        /// Search instead of crawling: text the page URL must contain
        #[arg(long)]
        contains: Option<String>,

        /// Write the new checkpoint to this file
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
pub struct EngineArgs {
    /// JSON file with engine settings; flags override it
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Traversal order
    #[arg(long, value_enum, global = true)]
    pub order: Option<TraversalOrder>,

    /// Worker threads (default: sized from CPU cores for I/O-bound work)
    #[arg(long, global = true)]
    pub threads: Option<usize>,

    /// Fraction of time a worker spends blocked on I/O, in [0, 1)
    #[arg(long, global = true, conflicts_with = "threads")]
    pub blocking_coefficient: Option<f64>,

    /// Worker pool flavor
    #[arg(long, value_enum, global = true, default_value_t = PoolKind::WorkStealing)]
    pub pool: PoolKind,

    /// Stop after this many milliseconds without new work
    #[arg(long, global = true)]
    pub quiescence_ms: Option<u64>,

    /// Timeout for fetching one page, in milliseconds
    #[arg(long, global = true)]
    pub fetch_timeout_ms: Option<u64>,

    /// Maximum number of pages fetched at the same time
    #[arg(long, global = true)]
    pub max_in_flight: Option<usize>,

    /// Pause between two submissions, in milliseconds
    #[arg(long, global = true)]
    pub delay_ms: Option<u64>,

    /// Do not follow links deeper than this (the start page is depth 0)
    #[arg(long, global = true)]
    pub max_depth: Option<usize>,

    /// Only stop once no fetch is in flight, instead of after a quiet period
    #[arg(long, global = true)]
    pub exact: bool,

    /// Follow links to other domains too
    #[arg(long, global = true)]
    pub any_domain: bool,

    /// Output results in JSON format instead of a list
    #[arg(long, global = true)]
    pub json: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

impl EngineArgs {
    /// Defaults, then the config file, then flags.
    pub fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => EngineConfig::default(),
        };

        if let Some(order) = self.order {
            config.order = order;
        }
        if let Some(ms) = self.quiescence_ms {
            config.quiescence_timeout_ms = ms;
        }
        if let Some(ms) = self.fetch_timeout_ms {
            config.neighbor_timeout_ms = ms;
        }
        if let Some(limit) = self.max_in_flight {
            config.max_in_flight = Some(limit);
        }
        if let Some(ms) = self.delay_ms {
            config.submit_delay_ms = ms;
        }
        if let Some(depth) = self.max_depth {
            config.max_depth = Some(depth);
        }
        if self.exact {
            config.termination = Termination::Exact;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn executor_config(&self) -> EngineResult<ExecutorConfig> {
        match (self.threads, self.blocking_coefficient) {
            (Some(threads), _) => ExecutorConfig::fixed_size(self.pool, threads),
            (None, Some(coefficient)) => ExecutorConfig::for_blocking_coefficient(self.pool, coefficient),
            (None, None) => ExecutorConfig::for_blocking_coefficient(self.pool, CRAWL_BLOCKING_COEFFICIENT),
        }
    }

    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
