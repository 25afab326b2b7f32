//! Command line interface.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use crate::models::OutputFormat;

/// Question answering over arXiv paper collections.
#[derive(Debug, Parser)]
#[command(name = "paperqa")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(
        long,
        short = 'f',
        global = true,
        help = "Output format: text, json, or markdown"
    )]
    pub format: Option<OutputFormat>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check vector store reachability and per-topic point counts
    Status,

    /// Chunk, embed and upload converted papers
    Ingest(commands::IngestArgs),

    /// Similarity search in one topic collection
    Query(commands::QueryArgs),

    /// Answer a research question
    Ask(commands::AskArgs),

    /// List configured topics and their collections
    Topics,

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::ConfigCommand),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VectorField;

    #[test]
    fn test_parse_query() {
        let cli = Cli::parse_from([
            "paperqa",
            "--format",
            "json",
            "query",
            "Transformer Models for Protein Folding",
            "alphafold accuracy",
            "-k",
            "3",
            "--search-type",
            "summary",
        ]);
        assert_eq!(cli.format, Some(OutputFormat::Json));
        match cli.command {
            Commands::Query(args) => {
                assert_eq!(args.topic, "Transformer Models for Protein Folding");
                assert_eq!(args.text, "alphafold accuracy");
                assert_eq!(args.top_k, Some(3));
                assert_eq!(args.search_type.as_deref(), Some("summary"));
                assert_eq!(
                    VectorField::from_search_type(args.search_type.as_deref().unwrap()),
                    VectorField::Summary
                );
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_ingest() {
        let cli = Cli::parse_from(["paperqa", "ingest", "./data", "--dry-run", "-v"]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Ingest(args) => {
                assert_eq!(args.root.to_str(), Some("./data"));
                assert!(args.dry_run);
                assert!(args.topic_dir.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_ask_and_config() {
        let cli = Cli::parse_from(["paperqa", "ask", "What is AnyI2V?"]);
        assert!(matches!(cli.command, Commands::Ask(ref a) if a.question == "What is AnyI2V?"));

        let cli = Cli::parse_from(["paperqa", "config", "init", "--global"]);
        assert!(matches!(
            cli.command,
            Commands::Config(commands::ConfigCommand::Init { global: true, force: false })
        ));
    }
}
