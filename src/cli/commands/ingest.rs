use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::output::get_formatter;
use crate::context::AppContext;
use crate::models::{Config, OutputFormat};
use crate::services::IngestStats;

#[derive(Debug, Args)]
pub struct IngestArgs {
    #[arg(required = true, help = "Corpus root containing one directory per topic")]
    pub root: PathBuf,

    #[arg(
        long,
        help = "Ingest a single topic directory (relative to the root, or absolute)"
    )]
    pub topic_dir: Option<PathBuf>,

    #[arg(long, help = "Chunk and embed without uploading")]
    pub dry_run: bool,
}

pub async fn handle_ingest(args: IngestArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    if !args.root.is_dir() {
        anyhow::bail!("corpus root is not a directory: {}", args.root.display());
    }

    let config = Config::load()?.config;
    let formatter = get_formatter(format);
    let ctx = AppContext::new(config).context("failed to initialize")?;

    let pb = progress_bar(format, verbose);
    let pipeline = ctx
        .ingestion_pipeline()
        .dry_run(args.dry_run)
        .with_progress(pb.clone());

    let stats = match args.topic_dir {
        Some(dir) => {
            let topic_dir = args.root.join(dir);
            if !topic_dir.is_dir() {
                anyhow::bail!("topic directory not found: {}", topic_dir.display());
            }
            let start = Instant::now();
            let topic = pipeline
                .ingest_topic(&topic_dir)
                .await
                .with_context(|| format!("failed to ingest {}", topic_dir.display()))?;
            IngestStats {
                topics: vec![topic],
                topics_skipped: Vec::new(),
                dry_run: args.dry_run,
                duration_ms: start.elapsed().as_millis() as u64,
            }
        }
        None => pipeline
            .ingest_corpus(&args.root)
            .await
            .with_context(|| format!("failed to ingest {}", args.root.display()))?,
    };
    pb.finish_and_clear();

    print!("{}", formatter.format_ingest_stats(&stats));
    Ok(())
}

fn progress_bar(format: OutputFormat, verbose: bool) -> ProgressBar {
    // Hidden for JSON output, verbose logging and non-interactive stderr
    if format == OutputFormat::Json || verbose || !console::user_attended_stderr() {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}
