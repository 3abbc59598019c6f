// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (tracing, written to stderr)
// 3. Build the worker pool the engine runs on
// 4. Dispatch to the appropriate subcommand handler and print the results
// 5. Exit with proper code (0 = success, 1 = nothing found, 2 = error)
//
// The runtime is built by hand instead of with #[tokio::main] because its
// size and flavor come from the command line.
// =============================================================================

mod cli;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use url::Url;

use cli::{Cli, Commands, EngineArgs};
use graph_crawler::crawl::{Checkpoint, WebNeighbors};
use graph_crawler::engine::{EngineConfig, Node, RunSummary};
use graph_crawler::WebCrawler;

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.engine);

    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// RUST_LOG wins when set; otherwise -v decides.
fn init_logging(args: &EngineArgs) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("graph_crawler={}", args.log_filter())));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// Returns:
//   Ok(0) = done (crawl finished, or find found a page)
//   Ok(1) = find finished without a match
//   Err = unexpected error
fn run(cli: Cli) -> Result<i32> {
    let config = cli.engine.engine_config()?;
    let executor = cli.engine.executor_config()?;
    debug!(?config, ?executor, "starting");

    let runtime = executor.build_runtime()?;
    runtime.block_on(dispatch(cli, config))
}

async fn dispatch(cli: Cli, config: EngineConfig) -> Result<i32> {
    let args = cli.engine;
    match cli.command {
        Commands::Crawl { url, checkpoint } => {
            handle_crawl(&url, &args, config, checkpoint.as_deref()).await
        }
        Commands::Find { url, contains, checkpoint } => {
            handle_find(&url, &contains, &args, config, checkpoint.as_deref()).await
        }
        Commands::Resume { checkpoint, contains, save } => {
            handle_resume(&checkpoint, contains, &args, config, save.as_deref()).await
        }
    }
}

/// What --json prints.
#[derive(Serialize)]
struct CrawlReport {
    root: Option<String>,
    found: Option<String>,
    visited: Vec<String>,
    summary: Option<RunSummary>,
}

// Handles the 'crawl' subcommand
async fn handle_crawl(
    url: &str,
    args: &EngineArgs,
    config: EngineConfig,
    checkpoint: Option<&Path>,
) -> Result<i32> {
    let root = parse_root(url)?;
    if !args.json {
        println!("🔍 Crawling: {}", root);
    }

    let neighbors = neighbors_for(&root, args)?;
    let mut crawler = WebCrawler::web(neighbors, config, None::<fn(&Node<Url>) -> bool>)?;
    crawler.crawl(root.clone()).await;

    if let Some(path) = checkpoint {
        save_checkpoint(&mut crawler, None, path)?;
    }

    print_report(&crawler, Some(&root), None, args.json)?;
    Ok(0)
}

// Handles the 'find' subcommand
async fn handle_find(
    url: &str,
    needle: &str,
    args: &EngineArgs,
    config: EngineConfig,
    checkpoint: Option<&Path>,
) -> Result<i32> {
    let root = parse_root(url)?;
    if !args.json {
        println!("🔍 Searching {} for a page containing {:?}", root, needle);
    }

    let neighbors = neighbors_for(&root, args)?;
    let mut crawler = WebCrawler::web(neighbors, config, Some(url_contains(needle.to_string())))?;
    let found = crawler.crawl_and_find(root.clone()).await?;

    if let Some(path) = checkpoint {
        save_checkpoint(&mut crawler, found.clone(), path)?;
    }

    print_report(&crawler, Some(&root), found.as_ref(), args.json)?;
    Ok(if found.is_some() { 0 } else { 1 })
}

// Handles the 'resume' subcommand
async fn handle_resume(
    path: &Path,
    needle: Option<String>,
    args: &EngineArgs,
    config: EngineConfig,
    save: Option<&Path>,
) -> Result<i32> {
    let checkpoint: Checkpoint<Url> = Checkpoint::load(path)?;
    if !args.json {
        println!(
            "📂 Resuming from {} ({} visited, {} waiting)",
            path.display(),
            checkpoint.visited.len(),
            checkpoint.frontier.len()
        );
    }

    // The crawl's domain is taken from the first page still waiting.
    let neighbors = if args.any_domain {
        WebNeighbors::any_domain()?
    } else {
        let start = checkpoint
            .frontier
            .first()
            .or_else(|| checkpoint.visited.first())
            .context("checkpoint is empty")?;
        WebNeighbors::same_domain(start)?
    };

    let searching = needle.is_some();
    let mut crawler = WebCrawler::web(neighbors, config, needle.map(url_contains))?;
    let frontier = checkpoint.restore(crawler.engine_mut());

    let found = if searching {
        crawler.engine_mut().continue_searching_from(frontier).await?
    } else {
        crawler.engine_mut().continue_traversing_from(frontier).await;
        None
    };

    if let Some(path) = save {
        save_checkpoint(&mut crawler, found.clone(), path)?;
    }

    print_report(&crawler, None, found.as_ref(), args.json)?;
    Ok(if searching && found.is_none() { 1 } else { 0 })
}

fn parse_root(url: &str) -> Result<Url> {
    Url::parse(url).with_context(|| format!("invalid URL: {}", url))
}

fn neighbors_for(root: &Url, args: &EngineArgs) -> Result<WebNeighbors> {
    if args.any_domain {
        WebNeighbors::any_domain()
    } else {
        WebNeighbors::same_domain(root)
    }
}

fn url_contains(needle: String) -> impl Fn(&Node<Url>) -> bool + Send + Sync + 'static {
    move |node: &Node<Url>| node.element().as_str().contains(&needle)
}

fn save_checkpoint(crawler: &mut WebCrawler, found: Option<Url>, path: &Path) -> Result<()> {
    let checkpoint = Checkpoint::capture(crawler.engine_mut(), found);
    checkpoint.save(path)?;
    debug!(path = %path.display(), frontier = checkpoint.frontier.len(), "checkpoint saved");
    Ok(())
}

// Prints the results either as a list or JSON
fn print_report(crawler: &WebCrawler, root: Option<&Url>, found: Option<&Url>, json: bool) -> Result<()> {
    let engine = crawler.engine();
    let mut visited: Vec<String> = engine
        .visited_elements()
        .into_iter()
        .map(String::from)
        .collect();
    visited.sort();

    if json {
        let report = CrawlReport {
            root: root.map(Url::to_string),
            found: found.map(Url::to_string),
            visited,
            summary: engine.last_summary().cloned(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    for page in &visited {
        println!("   {}", page);
    }
    println!();

    if let Some(url) = found {
        println!("✅ Found: {}", url);
    }
    if let Some(depth) = engine.config().max_depth {
        println!("📊 Max crawl depth: {}", depth);
    }

    println!("📊 Summary:");
    println!("   📄 Visited: {}", visited.len());
    if let Some(summary) = engine.last_summary() {
        println!("   🌐 Fetched this run: {}", summary.newly_visited);
        println!("   ⏱️  Elapsed: {} ms", summary.elapsed_ms);
        if summary.abandoned > 0 {
            println!("   ⚠️  Abandoned: {}", summary.abandoned);
        }
    }
    Ok(())
}
