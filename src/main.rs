//! # Trend Gene Map
//!
//! Fetches social-media trending topics through a fallback chain of sources,
//! classifies them, estimates their short-interval rise, and annotates them
//! with LLM-produced "gene-map" analyses (sentiment, domain, content form,
//! lifecycle, keywords, virality).
//!
//! ## Usage
//!
//! ```sh
//! trend_gene_map fetch
//! trend_gene_map analyze "某话题"
//! trend_gene_map overview
//! trend_gene_map watch --interval 120
//! ```
//!
//! ## Architecture
//!
//! 1. **Sources**: primary endpoint → backup endpoint → generated list →
//!    placeholder notice, each tier tried only when the previous one failed
//! 2. **Normalization**: keyword classifier assigns categories, the heat
//!    estimator assigns a synthetic rise
//! 3. **Analysis**: per-item analyses go through a persistent cache;
//!    aggregate analysis and big-event detection run concurrently
//! 4. **Output**: Markdown tables/reports and JSON snapshots

use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod analysis;
mod api;
mod cache;
mod classifier;
mod cli;
mod config;
mod error;
mod heat;
mod models;
mod outputs;
mod prompts;
mod refresh;
mod settings;
mod sources;
mod store;
mod utils;

#[cfg(test)]
mod testing;

use analysis::Analyst;
use api::ChatClient;
use cache::{AnalysisCache, Provenance, analyze_cached};
use cli::{Cli, Command, SettingsAction};
use config::AppConfig;
use outputs::{json, markdown};
use settings::Settings;
use sources::{HttpFeed, SourceChain, Tier};
use store::{FileStore, KeyValueStore, MemoryStore};
use utils::ensure_writable_dir;

type Chain = SourceChain<HttpFeed, ChatClient>;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    debug!(?args.config, ?args.store, ephemeral = args.ephemeral, "Parsed CLI arguments");

    let config = AppConfig::load(args.config.as_deref())?;

    // --- Local state ---
    let store: Arc<dyn KeyValueStore> = if args.ephemeral {
        info!("Using in-memory store");
        Arc::new(MemoryStore::new())
    } else {
        let file = FileStore::open(&args.store)?;
        info!(path = %file.path().display(), "Using file store");
        Arc::new(file)
    };
    let settings = Settings::new(Arc::clone(&store));
    let cache = AnalysisCache::new(Arc::clone(&store));

    // --- Clients ---
    let http = reqwest::Client::new();
    let api_key = settings.resolve_api_key(args.api_key.as_deref());
    let chat = ChatClient::new(
        http.clone(),
        &config.llm.base_url,
        &config.llm.model,
        config.llm.temperature,
        api_key,
    )?;
    info!(has_credential = chat.has_credential(), model = %config.llm.model, "Completion client ready");

    let chain: Chain = SourceChain::new(
        HttpFeed::new(http),
        chat.clone(),
        config.sources.proxy.clone(),
        config.sources.primary.clone(),
        config.sources.backup.clone(),
    );
    let analyst = Analyst::new(chat);

    match args.command {
        Command::Fetch {
            json,
            json_output_dir,
        } => run_fetch(&chain, json, json_output_dir.as_deref()).await?,
        Command::Analyze { title, refresh } => {
            run_analyze(&cache, &analyst, &title, refresh).await?
        }
        Command::Overview {
            limit,
            markdown_output,
        } => {
            let limit = limit.unwrap_or(config.analysis_limit);
            run_overview(&chain, &analyst, limit, markdown_output).await?
        }
        Command::Watch { interval } => {
            let every = Duration::from_secs(interval.unwrap_or(config.refresh_secs).max(1));
            info!(every_secs = every.as_secs(), "Watching trends; Ctrl-C to stop");
            refresh::watch(Arc::new(chain), every, None, |outcome| {
                println!(
                    "\n[{}] source: {}\n{}",
                    Local::now().format("%H:%M:%S"),
                    outcome.source,
                    markdown::trends_to_markdown(&outcome.items)
                );
            })
            .await;
        }
        Command::Settings { action } => run_settings(&settings, &cache, action)?,
    }

    let elapsed = start_time.elapsed();
    info!(?elapsed, "Execution complete");
    Ok(())
}

#[instrument(level = "info", skip(chain))]
async fn run_fetch(
    chain: &Chain,
    as_json: bool,
    json_output_dir: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    let outcome = chain.fetch_trends().await;
    if outcome.source == Tier::Placeholder {
        warn!("No live or generated trend data; showing placeholder notice");
    }

    if as_json {
        println!("{}", serde_json::to_string_pretty(&outcome.items)?);
    } else {
        println!("source: {}\n", outcome.source);
        println!("{}", markdown::trends_to_markdown(&outcome.items));
    }

    if let Some(dir) = json_output_dir {
        ensure_writable_dir(dir).await?;
        let snapshot = json::snapshot_at(Local::now(), &outcome.source.to_string(), outcome.items);
        let path = json::write_snapshot(&snapshot, dir).await?;
        info!(path = %path.display(), "Snapshot written");
    }
    Ok(())
}

#[instrument(level = "info", skip(cache, analyst))]
async fn run_analyze(
    cache: &AnalysisCache,
    analyst: &Analyst<ChatClient>,
    title: &str,
    refresh: bool,
) -> Result<(), Box<dyn Error>> {
    if refresh {
        cache.invalidate(title)?;
    }
    let (result, provenance) = match analyze_cached(cache, analyst, title).await {
        Ok(r) => r,
        Err(e) => return Err(surface(e)),
    };

    println!("{}", markdown::analysis_to_markdown(title, &result.analysis));
    match provenance {
        Provenance::Cache => println!("_(cached)_"),
        Provenance::Fallback => println!("_分析暂不可用，请稍后重试_"),
        Provenance::Fresh => {
            if let Some(usage) = result.usage {
                println!("_tokens: {}_", usage.total_tokens);
            }
        }
    }
    Ok(())
}

#[instrument(level = "info", skip(chain, analyst))]
async fn run_overview(
    chain: &Chain,
    analyst: &Analyst<ChatClient>,
    limit: usize,
    markdown_output: Option<std::path::PathBuf>,
) -> Result<(), Box<dyn Error>> {
    let outcome = chain.fetch_trends().await;
    if outcome.source == Tier::Placeholder {
        println!("{}", markdown::trends_to_markdown(&outcome.items));
        warn!("No trend data to analyze");
        return Ok(());
    }

    let overview = match analyst.overview(&outcome.items, limit).await {
        Ok(o) => o,
        Err(e) => return Err(surface(e)),
    };
    let report = markdown::overview_to_markdown(&overview);
    match markdown_output {
        Some(path) => {
            tokio::fs::write(&path, report).await?;
            info!(path = %path.display(), "Wrote overview report");
        }
        None => println!("{report}"),
    }
    Ok(())
}

fn run_settings(
    settings: &Settings,
    cache: &AnalysisCache,
    action: SettingsAction,
) -> Result<(), Box<dyn Error>> {
    match action {
        SettingsAction::Show => {
            let key = settings
                .api_key()
                .map(|k| format!("{}****", k.chars().take(3).collect::<String>()))
                .unwrap_or_else(|| "(not set)".to_string());
            println!("api_key:     {key}");
            println!("theme:       {}", settings.theme());
            println!("bg_image:    {}", if settings.background_image().is_some() { "set" } else { "(not set)" });
            println!("bg_opacity:  {}", settings.background_opacity());
            println!("cached:      {} analyses", cache.titles().len());
        }
        SettingsAction::SetKey { key } => {
            settings.set_api_key(&key)?;
            info!("API key stored");
        }
        SettingsAction::ClearKey => {
            settings.clear_api_key()?;
            info!("API key removed");
        }
        SettingsAction::Theme { theme } => settings.set_theme(theme)?,
        SettingsAction::Opacity { value } => settings.set_background_opacity(value)?,
        SettingsAction::ClearBackground => {
            settings.set_background_image(None)?;
            info!("Background image removed");
        }
        SettingsAction::ClearCache => {
            let titles = cache.titles();
            for title in &titles {
                cache.invalidate(title)?;
            }
            info!(count = titles.len(), "Cleared cached analyses");
        }
    }
    Ok(())
}

/// Print the user-facing notice for a failed analysis and hand the error back.
fn surface(e: error::Error) -> Box<dyn Error> {
    if e.is_missing_credential() {
        eprintln!(
            "未配置 API Key：运行 `trend_gene_map settings set-key <KEY>` 或设置环境变量 LLM_API_KEY"
        );
    } else {
        eprintln!("分析失败，请稍后重试");
    }
    e.into()
}
