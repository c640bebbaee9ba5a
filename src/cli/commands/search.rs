use anyhow::{Context, Result};
use clap::Args;
use std::time::Instant;

use super::index::descriptor_for;
use super::openai_client;
use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat, SearchResults};
use crate::services::{EmbeddingClient, QueryOrchestrator, create_backend};

#[derive(Debug, Args)]
pub struct SearchArgs {
    #[arg(required = true, help = "Search query text")]
    pub query: String,

    #[arg(long, short = 'k', help = "Number of matches to return")]
    pub top_k: Option<u32>,

    #[arg(
        long,
        short = 'n',
        help = "Index name (defaults to [vector_index].index_name)"
    )]
    pub index: Option<String>,
}

pub async fn handle_search(args: SearchArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let query = args.query.trim();
    if query.is_empty() {
        anyhow::bail!("search query cannot be empty");
    }

    let config = Config::load()?;
    let formatter = get_formatter(format);
    let start_time = Instant::now();
    let descriptor = descriptor_for(&config, args.index);

    let top_k = args.top_k.unwrap_or(config.search.default_top_k);
    if top_k == 0 {
        anyhow::bail!("top_k must be at least 1");
    }

    if verbose {
        eprintln!("Query: \"{query}\"");
        eprintln!("  Index: {}", descriptor.name);
        eprintln!("  Top k: {top_k}");
    }

    let embedding_client =
        EmbeddingClient::new(openai_client(&config)?, &config.openai.embedding_model);
    let service = create_backend(&config.vector_index).context("vector index unavailable")?;
    let orchestrator = QueryOrchestrator::new(service);

    let embed_start = Instant::now();
    let query_embedding = embedding_client
        .embed(query)
        .await
        .context("failed to generate query embedding")?;
    let embed_ms = embed_start.elapsed().as_millis();

    let search_start = Instant::now();
    let result = orchestrator
        .search(&descriptor, &query_embedding, top_k as usize)
        .await
        .context("search failed")?;
    let search_ms = search_start.elapsed().as_millis();

    if verbose {
        let total_ms = start_time.elapsed().as_millis();
        eprintln!("Timing:");
        eprintln!("  Embedding: {embed_ms}ms");
        eprintln!("  Search: {search_ms}ms");
        eprintln!("  Total: {total_ms}ms");
        eprintln!();
    }

    let duration_ms = start_time.elapsed().as_millis() as u64;
    let search_results =
        SearchResults::new(query.to_string(), descriptor.name, result, duration_ms);

    print!("{}", formatter.format_search_results(&search_results));

    Ok(())
}
