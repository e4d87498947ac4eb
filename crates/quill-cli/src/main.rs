// Quill CLI entry point

use anyhow::{Context, Result};
use clap::Parser;
use quill_autocomplete::{init_tracing, ConfigLoader, SuggestionRequest};
use quill_cli::{commands, output, Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let loader = match &cli.config {
        Some(path) => ConfigLoader::with_path(path),
        None => ConfigLoader::new(),
    };
    let mut config = loader.load().context("failed to load configuration")?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    init_tracing(&config.logging)?;

    match cli.command {
        Commands::Suggest {
            text,
            title,
            previous,
            next,
        } => {
            let request = SuggestionRequest {
                title,
                previous_paragraph: previous,
                current_paragraph_prefix: Some(text).filter(|t| !t.is_empty()),
                next_paragraph: next,
            };
            commands::suggest(&config, request).await
        }
        Commands::Session {
            title,
            debounce_ms,
            paragraphs,
        } => commands::session(config, title, debounce_ms, paragraphs).await,
        Commands::Config { action } => commands::config(&loader, &config, action),
    }
}
