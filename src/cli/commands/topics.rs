use anyhow::Result;

use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat, TopicCatalog};

pub async fn handle_topics(format: OutputFormat, _verbose: bool) -> Result<()> {
    let config = Config::load()?.config;
    let catalog = TopicCatalog::new(&config.topics);
    print!("{}", get_formatter(format).format_topics(catalog.topics()));
    Ok(())
}
