use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use siteward_engine::{
    EngineConfig, EventOutcome, HttpFetcher, InterceptEngine, InterceptedRequest, ManifestEntry,
    MemoryStore, WorkerEvent,
};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use url::Url;

mod cli;
mod error;

use cli::CliArgs;
use error::AppError;

fn main() {
    if let Err(e) = bootstrap() {
        eprintln!("Error: {e}");
        // Log the full error for debugging
        error!(error = ?e, "Application failed");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn bootstrap() -> Result<(), AppError> {
    // Parse command-line arguments
    let args = CliArgs::parse();

    // Setup logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| AppError::Initialization(e.to_string()))?;

    let urls = parse_urls(&args.urls)?;
    let scope = resolve_scope(args.scope.as_deref(), &urls)?;
    let manifest = load_manifest(args.manifest.as_deref())?;
    let output_dir = args.output_dir.unwrap_or_else(|| PathBuf::from("out"));

    let config = EngineConfig::builder()
        .with_cache_prefix(&args.prefix)
        .with_version(&args.cache_version)
        .with_scope(scope)
        .build();

    info!(
        precache = config.precache_name(),
        manifest_entries = manifest.len(),
        "starting interception engine"
    );

    let fetcher = Arc::new(HttpFetcher::new(&config.fetch).map_err(siteward_engine::PolicyError::from)?);
    let engine = InterceptEngine::new(config, Arc::new(MemoryStore::new()), fetcher, manifest)?;

    engine.dispatch(WorkerEvent::Install).await?;
    engine.dispatch(WorkerEvent::Activate).await?;

    tokio::fs::create_dir_all(&output_dir).await?;
    for url in urls {
        resolve(&engine, url, args.range.as_deref(), &output_dir).await?;
    }

    Ok(())
}

fn parse_urls(inputs: &[String]) -> Result<Vec<Url>, AppError> {
    inputs
        .iter()
        .map(|raw| {
            Url::parse(raw).map_err(|e| AppError::InvalidInput(format!("bad URL '{raw}': {e}")))
        })
        .collect()
}

/// Scope given explicitly, or derived from the first URL's origin
fn resolve_scope(scope: Option<&str>, urls: &[Url]) -> Result<Url, AppError> {
    match scope {
        Some(raw) => {
            Url::parse(raw).map_err(|e| AppError::InvalidInput(format!("bad scope '{raw}': {e}")))
        }
        None => {
            let first = urls
                .first()
                .ok_or_else(|| AppError::InvalidInput("no URLs given".to_string()))?;
            first
                .join("/")
                .map_err(|e| AppError::InvalidInput(format!("cannot derive scope: {e}")))
        }
    }
}

fn load_manifest(path: Option<&Path>) -> Result<Vec<ManifestEntry>, AppError> {
    let Some(path) = path else {
        warn!("no manifest given, running with an empty precache");
        return Ok(Vec::new());
    };
    let json = std::fs::read_to_string(path)?;
    let manifest = serde_json::from_str(&json).map_err(siteward_engine::PolicyError::from)?;
    Ok(manifest)
}

async fn resolve(
    engine: &InterceptEngine,
    url: Url,
    range: Option<&str>,
    output_dir: &Path,
) -> Result<(), AppError> {
    let mut request = InterceptedRequest::get(url.clone());
    if let Some(range) = range {
        request = request.with_header("Range", range);
    }

    match engine.dispatch(WorkerEvent::Fetch(request)).await? {
        EventOutcome::Respond(response) => {
            let target = output_dir.join(file_name_for(&url));
            tokio::fs::write(&target, response.body()).await?;
            info!(
                url = %url,
                status = %response.status(),
                bytes = response.len(),
                output = %target.display(),
                "resolved"
            );
        }
        EventOutcome::Passthrough => {
            warn!(url = %url, "request declined by policy, nothing written");
        }
        outcome => {
            warn!(url = %url, ?outcome, "unexpected outcome");
        }
    }
    Ok(())
}

/// Last path segment of the URL, or index.html at the root
fn file_name_for(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .unwrap_or("index.html")
        .to_string()
}
