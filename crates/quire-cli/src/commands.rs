use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use quire_append::{normalize_image_path, AppendRequest};
use quire_server::{AppState, QuireConfig, QuireServer};
use quire_types::{DocumentId, JobId, PageKey};
use serde_json::json;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        command,
        format,
        config,
        ..
    } = cli;
    let config = load_config(config.as_deref())?;
    match command {
        Command::Serve(args) => cmd_serve(config, args).await,
        Command::Append(args) => cmd_append(&config, args, &format).await,
        Command::Show(args) => cmd_show(&config, args, &format).await,
        Command::Unlock(args) => cmd_unlock(&config, args, &format).await,
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<QuireConfig> {
    match path {
        Some(path) => QuireConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(QuireConfig::default()),
    }
}

fn document(args: &DocumentArgs) -> anyhow::Result<DocumentId> {
    Ok(DocumentId::new(args.role, JobId::new(args.job.clone())?))
}

async fn cmd_serve(mut config: QuireConfig, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    println!(
        "{} quire server on {} (store: {})",
        "✓".green().bold(),
        config.bind_addr.to_string().bold(),
        config.store_url
    );
    QuireServer::new(config)?.serve().await?;
    Ok(())
}

async fn cmd_append(
    config: &QuireConfig,
    args: AppendArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let state = AppState::from_config(config)?;
    let doc = document(&args.doc)?;
    let image_path = normalize_image_path(&args.image, &config.image_prefixes())?;
    let mut request = AppendRequest::new(doc, PageKey::new(args.key)?, image_path);
    request.meta.title = args.title;
    request.meta.author = args.hero;

    let outcome = state.appender.append(&request).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
        OutputFormat::Text if outcome.appended => {
            println!(
                "{} Appended {} to {}",
                "✓".green().bold(),
                request.page.as_str().yellow(),
                outcome.version_key.as_str().bold()
            );
            if let Some(pages) = outcome.page_count {
                println!("  Pages: {pages}");
            }
            println!("  URL: {}", outcome.url.blue());
        }
        OutputFormat::Text => {
            println!(
                "{} {} already in {}",
                "=".dimmed(),
                request.page.as_str().yellow(),
                outcome.version_key.as_str().bold()
            );
            println!("  URL: {}", outcome.url.blue());
        }
    }
    Ok(())
}

async fn cmd_show(
    config: &QuireConfig,
    args: DocumentArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let state = AppState::from_config(config)?;
    let doc = document(&args)?;
    let current = state.appender.current(&doc).await?;
    let lock = state.appender.lock_status(&doc).await?;
    match (format, current) {
        (OutputFormat::Json, current) => {
            let locked_secs = lock.as_ref().map(|l| l.age.as_secs());
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "current": current, "lockedSecs": locked_secs }))?
            )
        }
        (OutputFormat::Text, None) => println!("No version of {} yet.", doc.to_string().bold()),
        (OutputFormat::Text, Some(current)) => {
            println!("{} → {}", doc.to_string().bold(), current.version_key.as_str().yellow());
            println!("  URL: {}", current.url.blue());
            println!("  Pages ({}):", current.pages.len());
            for page in &current.pages {
                println!("    {page}");
            }
        }
    }
    if let (OutputFormat::Text, Some(lock)) = (format, lock) {
        println!(
            "  {} locked for {}s (since {})",
            "!".yellow().bold(),
            lock.age.as_secs(),
            lock.since.to_rfc3339()
        );
    }
    Ok(())
}

async fn cmd_unlock(
    config: &QuireConfig,
    args: DocumentArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let state = AppState::from_config(config)?;
    let doc = document(&args)?;
    let held_secs = state
        .appender
        .lock_status(&doc)
        .await?
        .map(|l| l.age.as_secs());
    let removed = state.appender.force_unlock(&doc).await?;
    match format {
        OutputFormat::Json => println!(
            "{}",
            json!({ "document": doc.to_string(), "removed": removed, "heldSecs": held_secs })
        ),
        OutputFormat::Text if removed => {
            print!("{} Removed lock on {}", "✓".green().bold(), doc.to_string().bold());
            match held_secs {
                Some(secs) => println!(" (held {secs}s)"),
                None => println!(),
            }
        }
        OutputFormat::Text => println!("{} was not locked.", doc.to_string().bold()),
    }
    Ok(())
}
