// src/lib.rs
// =============================================================================
// graph-crawler: a concurrent graph traversal engine and the web crawler built
// on top of it.
//
// - engine: generic over the element type; knows nothing about the web
// - crawl: the crawler facade, the reqwest/scraper neighbor function and
//   checkpoints
// =============================================================================

pub mod crawl;
pub mod engine;

pub use crawl::{Crawler, WebCrawler};
pub use engine::{EngineConfig, EngineError, EngineResult, TraversalEngine};
