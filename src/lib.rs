pub mod api_client;
pub mod cli;
pub mod config;
pub mod display;
pub mod fields;
pub mod filter;
pub mod session;
pub mod validate;

use crate::api_client::{FilterBackend, FilterRequest, HttpFilterBackend};
use crate::config::FilterConfig;
use crate::fields::FieldCatalog;
use crate::session::{EditorSession, authoritative_check, load_catalog};
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Read as _;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

pub use cli::{Cli, ColorMode, Commands, OutputFormat, cli_parse};
pub use fields::FieldInfo;
pub use filter::{
    ConditionNode, ConditionTree, FilterParseError, parse_tree, text_to_tree, tokenize,
    tree_to_text,
};
pub use validate::{ValidationResult, validate};

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file '{}'", path.display()))
    }
}

/// Catalog for commands that never touch the network
fn local_catalog(cli: &Cli, config: &FilterConfig) -> FieldCatalog {
    match &cli.fields {
        Some(names) => FieldCatalog::from_names(names.iter().map(|n| n.trim())),
        None => config.fields.catalog(),
    }
}

fn http_backend(config: &FilterConfig) -> Result<Arc<dyn FilterBackend>> {
    let backend = HttpFilterBackend::new(&config.api).context("Failed to build HTTP client")?;
    Ok(Arc::new(backend))
}

fn exit_status(valid: bool) -> ExitCode {
    if valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

pub async fn run(cli: Cli) -> Result<ExitCode> {
    let config = crate::config::load_config(cli.config.as_deref())
        .context("Failed to load config")?;
    let format = cli.format;

    match cli.color {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        // Let the terminal decide
        ColorMode::Auto => {}
    }

    if let Some(path) = &cli.config {
        debug!(config = %path.display(), "loaded config file");
    }

    match &cli.command {
        Commands::Tokenize { expression } => {
            let tokens = tokenize(expression, &local_catalog(&cli, &config));
            match format {
                OutputFormat::Text => print!("{}", display::format_tokens(&tokens)),
                OutputFormat::Json => print_json(&tokens)?,
            }
        }
        Commands::Validate { expression, server } => {
            let backend = if *server {
                Some(http_backend(&config)?)
            } else {
                None
            };
            let catalog = match (&backend, &cli.fields) {
                (Some(backend), None) => load_catalog(backend.as_ref(), &config).await,
                _ => local_catalog(&cli, &config),
            };

            let mut result = validate(expression, &catalog);
            if let Some(backend) = &backend {
                if result.valid {
                    let request = FilterRequest::new(expression.as_str(), &config.editor);
                    let use_test = config.editor.source_id.is_some();
                    result.merge_server(
                        authoritative_check(backend.as_ref(), &request, use_test).await,
                    );
                } else {
                    debug!("local validation failed, skipping server check");
                }
            }

            match format {
                OutputFormat::Text => print!("{}", display::format_validation(expression, &result)),
                OutputFormat::Json => print_json(&result)?,
            }
            return Ok(exit_status(result.valid));
        }
        Commands::ToTree {
            expression,
            envelope,
        } => {
            let root = text_to_tree(expression).context("Failed to parse filter expression")?;
            if *envelope {
                print_json(&ConditionTree::new(root))?;
            } else {
                print_json(&root)?;
            }
        }
        Commands::ToText { input } => {
            let raw = read_input(input)?;
            let tree = filter::record::load_tree(&raw).context("Failed to load condition tree")?;
            let text = tree_to_text(&tree.root);
            match format {
                OutputFormat::Text => println!("{text}"),
                OutputFormat::Json => print_json(&serde_json::json!({ "text": text }))?,
            }
        }
        Commands::Normalize { expression } => {
            let root = text_to_tree(expression).context("Failed to parse filter expression")?;
            let canonical = tree_to_text(&root);
            match format {
                OutputFormat::Text => {
                    print!("{}", display::format_normalization(expression, &canonical));
                }
                OutputFormat::Json => print_json(&serde_json::json!({
                    "input": expression,
                    "canonical": canonical,
                    "changed": expression.as_str() != canonical,
                }))?,
            }
        }
        Commands::Test { expression } => {
            let backend = http_backend(&config)?;
            let request = FilterRequest::new(expression.as_str(), &config.editor);
            let response = backend
                .test_expression(&request)
                .await
                .context("Filter test request failed")?;
            match format {
                OutputFormat::Text => print!("{}", display::format_test_response(&response)),
                OutputFormat::Json => print_json(&response)?,
            }
            return Ok(exit_status(response.is_valid));
        }
        Commands::Fields => {
            let catalog = match &cli.fields {
                Some(_) => local_catalog(&cli, &config),
                None => load_catalog(http_backend(&config)?.as_ref(), &config).await,
            };
            match format {
                OutputFormat::Text => print!("{}", display::format_fields(&catalog)),
                OutputFormat::Json => print_json(&catalog.fields())?,
            }
        }
        Commands::Edit => {
            let backend = http_backend(&config)?;
            let mut session = match &cli.fields {
                Some(_) => EditorSession::with_catalog(
                    backend,
                    local_catalog(&cli, &config),
                    config.editor.clone(),
                ),
                None => EditorSession::start(backend, &config).await,
            };
            run_edit_loop(&mut session, &config, format).await?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn print_update(update: &session::SessionUpdate, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => println!("{}", display::format_session_update(update)),
        OutputFormat::Json => {
            let json = serde_json::to_string(update).context("Failed to serialize output")?;
            println!("{json}");
        }
    }
    Ok(())
}

/// Each stdin line replaces the expression being edited. Local results are
/// printed per line; server results only for the line that was current when
/// they arrived.
async fn run_edit_loop(
    session: &mut EditorSession,
    config: &FilterConfig,
    format: OutputFormat,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut updates = session.subscribe();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                session.on_input(&line);
                if let Some(update) = updates.borrow_and_update().clone() {
                    print_update(&update, format)?;
                }
            }
            Ok(()) = updates.changed() => {
                let update = updates.borrow_and_update().clone();
                if let Some(update) = update.filter(|u| u.is_authoritative()) {
                    print_update(&update, format)?;
                }
            }
        }
    }

    // Input closed: wait for the check still owed to the last line
    let grace = config.editor.debounce()
        + Duration::from_secs(config.api.timeout_secs)
        + Duration::from_secs(1);
    let awaiting_server = |update: &Option<session::SessionUpdate>| {
        update
            .as_ref()
            .is_some_and(|u| u.result.local_valid() && !u.is_authoritative())
    };
    // An unseen value can only be a server result that landed after the loop
    let owed = updates.has_changed().unwrap_or(false) || awaiting_server(&*updates.borrow());
    if owed {
        let wait = updates.wait_for(|u| !awaiting_server(u));
        match tokio::time::timeout(grace, wait).await {
            Ok(Ok(update)) => {
                let update = update.as_ref().filter(|u| u.is_authoritative()).cloned();
                if let Some(update) = update {
                    print_update(&update, format)?;
                }
            }
            _ => debug!("gave up waiting for the final server check"),
        }
    }

    Ok(())
}
