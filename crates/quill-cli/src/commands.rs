//! Subcommand handlers

use anyhow::{bail, Context, Result};
use quill_autocomplete::{
    normalize_suggestion, ActiveSession, AutocompleteConfig, ChatCompletionFetcher, ConfigLoader,
    ControllerOptions, GhostController, Keymap, SuggestionFetcher, SuggestionRequest,
};
use quill_document::Document;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::cli::ConfigAction;
use crate::output::OutputStyle;
use crate::session::EditorSession;

/// Fetch one suggestion and print it; prints nothing when there is none
pub async fn suggest(config: &AutocompleteConfig, request: SuggestionRequest) -> Result<()> {
    let fetcher = ChatCompletionFetcher::from_config(&config.provider)
        .context("failed to build completion client")?;
    let raw = fetcher
        .fetch(request)
        .await
        .context("suggestion request failed")?;
    if let Some(text) = normalize_suggestion(&raw) {
        println!("{}", text);
    }
    Ok(())
}

/// Run an interactive session on stdin/stdout
pub async fn session(
    config: AutocompleteConfig,
    title: String,
    debounce_ms: Option<u64>,
    paragraphs: Vec<String>,
) -> Result<()> {
    let fetcher: Arc<dyn SuggestionFetcher> = Arc::new(
        ChatCompletionFetcher::from_config(&config.provider)
            .context("failed to build completion client")?,
    );
    let mut options = ControllerOptions::from_config(&config).with_title(title);
    if let Some(ms) = debounce_ms {
        options = options.with_debounce(Duration::from_millis(ms));
    }

    let document = if paragraphs.is_empty() {
        Document::new()
    } else {
        Document::with_paragraphs(&paragraphs)
    };
    let active = ActiveSession::new();
    let controller = GhostController::new(document, fetcher, active.clone(), options)?;
    let keymap = Keymap::from_config(&config.keymap)?;
    info!(session = %controller.session_id(), "Editing session started");

    let session = EditorSession::new(controller, keymap, active);
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    session.run(stdin, &mut stdout, OutputStyle::default()).await?;

    session.controller().detach();
    println!("{}", session.document().snapshot().text_content());
    Ok(())
}

/// Show, initialise or locate the configuration file
pub fn config(loader: &ConfigLoader, effective: &AutocompleteConfig, action: ConfigAction) -> Result<()> {
    let style = OutputStyle::default();
    match action {
        ConfigAction::Show => {
            print!("{}", toml::to_string_pretty(effective)?);
        }
        ConfigAction::Path => {
            println!("{}", loader.path().display());
        }
        ConfigAction::Init { force } => {
            if loader.path().exists() && !force {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    loader.path().display()
                );
            }
            loader.save(&AutocompleteConfig::default())?;
            println!(
                "{}",
                style.success(&format!("Wrote {}", loader.path().display()))
            );
        }
    }
    Ok(())
}
