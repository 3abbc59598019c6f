// src/crawl/mod.rs
// =============================================================================
// The crawler facade: the surface the rest of the application uses.
//
// A Crawler is a thin wrapper over a TraversalEngine. `crawl` visits every
// reachable page, `crawl_and_find` stops at the first page the engine's
// predicate accepts. The crawler keeps no state of its own.
//
// Submodules:
// - web: the reqwest/scraper neighbor function for real web pages
// - checkpoint: JSON save/restore of a stopped crawl
// =============================================================================

pub mod checkpoint;
mod web;

pub use checkpoint::Checkpoint;
pub use web::{normalize_url, WebNeighbors};

use url::Url;

use crate::engine::{
    Element, EngineConfig, EngineResult, Node, RunSummary, TraversalEngine,
};

pub struct Crawler<E: Element> {
    engine: TraversalEngine<E>,
}

impl<E: Element> Crawler<E> {
    pub fn new(engine: TraversalEngine<E>) -> Self {
        Self { engine }
    }

    pub async fn crawl(&mut self, root: E) -> RunSummary {
        self.engine.traverse(root).await
    }

    pub async fn crawl_and_find(&mut self, root: E) -> EngineResult<Option<E>> {
        self.engine.search(root).await
    }

    pub fn engine(&self) -> &TraversalEngine<E> {
        &self.engine
    }

    /// For checkpoint capture and resume.
    pub fn engine_mut(&mut self) -> &mut TraversalEngine<E> {
        &mut self.engine
    }
}

/// A crawler over web pages.
pub type WebCrawler = Crawler<Url>;

impl WebCrawler {
    /// Builds a web crawler. `predicate`, when given, is what
    /// `crawl_and_find` looks for.
    pub fn web<P>(neighbors: WebNeighbors, config: EngineConfig, predicate: Option<P>) -> EngineResult<Self>
    where
        P: Fn(&Node<Url>) -> bool + Send + Sync + 'static,
    {
        let mut builder = TraversalEngine::builder(neighbors)
            .config(config)
            .normalize(normalize_url);
        if let Some(predicate) = predicate {
            builder = builder.predicate(predicate);
        }
        Ok(Self::new(builder.build()?))
    }
}
