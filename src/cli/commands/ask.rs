use anyhow::{Context, Result};
use clap::Args;

use crate::cli::output::get_formatter;
use crate::context::AppContext;
use crate::models::{Config, OutputFormat};

#[derive(Debug, Args)]
pub struct AskArgs {
    #[arg(required = true, help = "Research question")]
    pub question: String,
}

pub async fn handle_ask(args: AskArgs, format: OutputFormat, _verbose: bool) -> Result<()> {
    let question = args.question.trim();
    if question.is_empty() {
        anyhow::bail!("question cannot be empty");
    }

    let config = Config::load()?.config;
    let formatter = get_formatter(format);
    let ctx = AppContext::new(config).context("failed to initialize")?;

    let state = ctx.research_flow().run(question).await;

    print!("{}", formatter.format_answer(&state));
    if state.answer_text().is_empty() {
        eprintln!("Hint: run with --verbose to see which stage failed.");
    }
    Ok(())
}
