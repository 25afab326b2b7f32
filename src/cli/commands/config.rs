use anyhow::{Context, Result};
use clap::Subcommand;

use crate::cli::output::{Formatter, get_formatter};
use crate::models::{Config, OutputFormat};

const MASK: &str = "********";

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Initialize configuration file")]
    Init {
        #[arg(
            long,
            short = 'g',
            help = "Create global config instead of project config"
        )]
        global: bool,
        #[arg(long, help = "Force overwrite existing config")]
        force: bool,
    },
    #[command(about = "Show current configuration")]
    Show,
    #[command(about = "Show configuration file paths")]
    Path {
        #[arg(long, help = "Show all possible config paths")]
        all: bool,
    },
}

pub async fn handle_config(cmd: ConfigCommand, format: OutputFormat, _verbose: bool) -> Result<()> {
    let formatter = get_formatter(format);

    match cmd {
        ConfigCommand::Init { global, force } => handle_init(global, force, formatter.as_ref()),
        ConfigCommand::Show => handle_show(format),
        ConfigCommand::Path { all } => handle_path(all),
    }
}

fn handle_init(global: bool, force: bool, formatter: &dyn Formatter) -> Result<()> {
    let (config_path, scope) = if global {
        let path = Config::global_path()
            .ok_or_else(|| anyhow::anyhow!("could not determine config directory"))?;
        (path, "global")
    } else {
        let dir = Config::project_config_dir()
            .ok_or_else(|| anyhow::anyhow!("could not determine project directory"))?;
        (dir.join("config.toml"), "project")
    };

    if config_path.exists() && !force {
        anyhow::bail!(
            "{} config already exists at: {}\nUse --force to overwrite.",
            scope,
            config_path.display()
        );
    }

    let path = if global {
        Config::init_global()
    } else {
        Config::init_project()
    }
    .with_context(|| format!("failed to create {} config", scope))?;

    print!(
        "{}",
        formatter.format_message(&format!("Created {} config at: {}", scope, path.display()))
    );
    Ok(())
}

/// Copy of `config` with credentials replaced by a mask.
fn redacted(config: &Config) -> Config {
    let mut config = config.clone();
    if config.vector_store.api_key.is_some() {
        config.vector_store.api_key = Some(MASK.to_string());
    }
    if config.web_search.api_key.is_some() {
        config.web_search.api_key = Some(MASK.to_string());
    }
    config
}

fn handle_show(format: OutputFormat) -> Result<()> {
    let resolved = Config::load()?;
    let config = redacted(&resolved.config);

    if format == OutputFormat::Json {
        let output = serde_json::json!({
            "config": config,
            "project_path": resolved.project_path,
            "global_path": resolved.global_path,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    match (&resolved.project_path, &resolved.global_path) {
        (Some(path), _) => println!("# Project config: {}", path.display()),
        (None, Some(path)) => println!("# Global config: {}", path.display()),
        (None, None) => println!("# Built-in defaults"),
    }
    println!();
    print!(
        "{}",
        toml::to_string_pretty(&config).context("failed to render config")?
    );
    Ok(())
}

fn handle_path(show_all: bool) -> Result<()> {
    let project_path = Config::find_project_config();
    let global_path = Config::global_path();

    println!("Configuration paths:");
    println!();

    if let Some(ref path) = project_path {
        println!("Project config (active): {}", path.display());
    } else if show_all && let Some(dir) = Config::project_config_dir() {
        println!(
            "Project config (would be): {}",
            dir.join("config.toml").display()
        );
    }

    if let Some(ref path) = global_path {
        if path.exists() {
            let state = if project_path.is_some() {
                "shadowed"
            } else {
                "active"
            };
            println!("Global config ({}): {}", state, path.display());
        } else if show_all {
            println!("Global config (would be): {}", path.display());
        }
    }

    if show_all && let Ok(cwd) = std::env::current_dir() {
        let env_path = cwd.join(".env");
        if env_path.exists() {
            println!(".env file (active): {}", env_path.display());
        } else {
            println!(".env file (would be): {}", env_path.display());
        }
    }

    Ok(())
}
