use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::output::get_formatter;
use crate::context::AppContext;
use crate::models::{Config, OutputFormat, QueryResults, VectorField};

#[derive(Debug, Args)]
pub struct QueryArgs {
    #[arg(required = true, help = "Topic name or collection name")]
    pub topic: String,

    #[arg(required = true, help = "Query text")]
    pub text: String,

    #[arg(long = "top-k", short = 'k', help = "Number of chunks to return")]
    pub top_k: Option<u32>,

    #[arg(long, help = "Vector to match against: default or summary")]
    pub search_type: Option<String>,
}

pub async fn handle_query(args: QueryArgs, format: OutputFormat, _verbose: bool) -> Result<()> {
    let text = args.text.trim();
    if text.is_empty() {
        anyhow::bail!("query text cannot be empty");
    }

    let config = Config::load()?.config;
    let formatter = get_formatter(format);

    let top_k = args.top_k.unwrap_or(config.search.top_k);
    if top_k == 0 {
        anyhow::bail!("top-k must be at least 1");
    }
    let search_type = args
        .search_type
        .as_deref()
        .map_or(config.search.search_type, VectorField::from_search_type);

    let ctx = AppContext::new(config).context("failed to initialize")?;
    let collection = ctx
        .catalog
        .resolve(&args.topic)
        .map(str::to_string)
        .ok_or_else(|| {
            let known: Vec<&str> = ctx.catalog.names().collect();
            anyhow::anyhow!(
                "unknown topic '{}'. Known topics:\n  {}",
                args.topic,
                known.join("\n  ")
            )
        })?;

    let start = Instant::now();
    let results = ctx
        .index
        .query(&collection, text, u64::from(top_k), search_type)
        .await
        .with_context(|| format!("query against '{}' failed", collection))?;

    let results = QueryResults {
        query: text.to_string(),
        collection,
        search_type,
        results,
        duration_ms: start.elapsed().as_millis() as u64,
    };

    print!("{}", formatter.format_query_results(&results));
    Ok(())
}
