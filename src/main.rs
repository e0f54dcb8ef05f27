use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tweet_tracker::classifier::Classifier;
use tweet_tracker::config::Config;
use tweet_tracker::session::CardRegistry;
use tweet_tracker::store::{export_file_name, export_json, format_usage, PostStore, SqliteStore};
use tweet_tracker::{classify_snapshot, PostRecord};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_tracing()?;

    let snapshots: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    if snapshots.is_empty() {
        bail!("Usage: tweet-tracker <page.html>...");
    }

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!(
        database = %config.database_path.display(),
        origin = %config.site_origin,
        "Configuration loaded"
    );

    if let Some(parent) = config.database_path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let store = SqliteStore::new(&config.database_path).await?;
    let classifier = Classifier::new(config.classifier());
    let mut registry = CardRegistry::new();

    for path in &snapshots {
        // Each snapshot is a fresh page.
        registry.reset_on_navigation();

        let records = match load_snapshot(&classifier, path).await {
            Ok(records) => records,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping snapshot");
                continue;
            }
        };

        let mut saved = 0usize;
        for record in records {
            if !registry.mark_processed(&record.id) {
                continue;
            }
            if let Err(e) = store.put(&record).await {
                // Allow a later pass to retry this post.
                registry.release(&record.id);
                warn!(post_id = %record.id, error = %e, "Failed to save post");
                continue;
            }
            println!("{}", serde_json::to_string(&record)?);
            saved += 1;
        }

        info!(path = %path.display(), saved, "Processed snapshot");
    }

    let usage = store.usage_bytes().await?;
    info!(usage = %format_usage(usage), "Storage usage");

    if let Some(dir) = &config.export_path {
        let file = dir.join(export_file_name(chrono::Local::now().date_naive()));
        let json = export_json(&store).await?;
        tokio::fs::write(&file, json)
            .await
            .with_context(|| format!("Failed to write export to {}", file.display()))?;
        info!(path = %file.display(), "Exported saved posts");
    }

    Ok(())
}

/// Read a saved page and classify its cards.
async fn load_snapshot(classifier: &Classifier, path: &Path) -> Result<Vec<PostRecord>> {
    let html = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(classify_snapshot(classifier, &html))
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tweet_tracker=debug"));

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    // Logs go to stderr; stdout carries the saved records.
    if use_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}
