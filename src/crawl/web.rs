// src/crawl/web.rs
// =============================================================================
// The neighbor function for the web: one page URL in, the set of URLs it
// links to out.
//
// How it works:
// 1. Fetch the page HTML (with the engine's per-node timeout)
// 2. Select every <a href> element
// 3. Resolve each href against the page URL
// 4. Keep http/https links, optionally only those on the crawl's domain
//
// A fetch that fails (timeout, DNS, non-2xx status) is reported as an error;
// the engine turns that into "no links" and moves on.
//
// Rust concepts:
// - BoxFuture: the engine stores neighbor functions as trait objects, so the
//   async work is boxed and must be Send + 'static
// - Html is not Send, so it is parsed and dropped in a plain function that
//   never crosses an .await
// =============================================================================

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{anyhow, Result};
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

use crate::engine::Neighbors;

/// Expands a page into the pages it links to.
#[derive(Clone)]
pub struct WebNeighbors {
    client: Client,
    // Only links on this domain are followed. None follows everything.
    scope: Option<String>,
}

impl WebNeighbors {
    fn new(client: Client, scope: Option<String>) -> Self {
        Self { client, scope }
    }

    /// A crawler confined to `root`'s domain.
    pub fn same_domain(root: &Url) -> Result<Self> {
        let domain = root
            .domain()
            .ok_or_else(|| anyhow!("URL has no domain: {}", root))?;
        Ok(Self::new(default_client()?, Some(domain.to_string())))
    }

    /// A crawler that follows links to any host.
    pub fn any_domain() -> Result<Self> {
        Ok(Self::new(default_client()?, None))
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }
}

impl Neighbors<Url> for WebNeighbors {
    fn neighbors(&self, page: &Url, timeout: Duration) -> BoxFuture<'static, Result<HashSet<Url>>> {
        let client = self.client.clone();
        let scope = self.scope.clone();
        let page = page.clone();

        async move {
            let html = fetch_page(&client, &page, timeout).await?;
            Ok(extract_links(&html, &page, scope.as_deref()))
        }
        .boxed()
    }
}

/// Canonical form of a crawled URL: fragments point into the same page, so
/// `page#a` and `page#b` are one node.
pub fn normalize_url(mut url: Url) -> Url {
    url.set_fragment(None);
    url
}

fn default_client() -> Result<Client> {
    let client = Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()?;
    Ok(client)
}

// Fetches a web page and returns its HTML content
async fn fetch_page(client: &Client, url: &Url, timeout: Duration) -> Result<String> {
    let response = client.get(url.clone()).timeout(timeout).send().await?;

    if !response.status().is_success() {
        return Err(anyhow!("HTTP {}", response.status()));
    }

    let html = response.text().await?;
    Ok(html)
}

// Extracts the http/https links of a page, restricted to `scope` when set
fn extract_links(html: &str, page: &Url, scope: Option<&str>) -> HashSet<Url> {
    let mut links = HashSet::new();

    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return links;
    };

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(link) = resolve_link(page, href) else {
            continue;
        };

        let is_web = link.scheme() == "http" || link.scheme() == "https";
        let in_scope = scope.map_or(true, |domain| link.domain() == Some(domain));
        if is_web && in_scope {
            links.insert(link);
        }
    }

    links
}

// Resolves a link (possibly relative) to an absolute URL
fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    // Skip anchors and special protocols
    if href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("javascript:")
    {
        return None;
    }

    base.join(href).ok()
}
