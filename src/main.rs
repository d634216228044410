//! catalog-extract: scrape 1688.com offer pages into a WooCommerce CSV

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catalog_extract::export::write_batch_outputs;
use catalog_extract::translate::Language;
use catalog_extract::url_list::read_url_file;
use catalog_extract::{Pipeline, ScrapeConfig};

#[derive(Parser, Debug)]
#[command(name = "catalog-extract", version, about)]
struct Args {
    /// File with one product URL per line
    #[arg(long)]
    urls: PathBuf,

    /// Output directory for the CSV and JSON backup
    #[arg(long, default_value = "output")]
    out: PathBuf,

    /// Target language code (en, ar, fr, es, de, zh)
    #[arg(long)]
    language: Option<Language>,

    /// Seconds to wait before every request
    #[arg(long)]
    delay: Option<f64>,

    /// Process at most this many URLs
    #[arg(long)]
    limit: Option<usize>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for raw HTML snapshots
    #[arg(long)]
    snapshots: Option<PathBuf>,

    /// Self-hosted LibreTranslate endpoint
    #[arg(long)]
    libretranslate_url: Option<String>,
}

impl Args {
    fn into_config(self) -> anyhow::Result<(ScrapeConfig, PathBuf, PathBuf)> {
        let mut config = match &self.config {
            Some(path) => ScrapeConfig::from_toml_file(path)?,
            None => ScrapeConfig::default(),
        };
        if let Some(language) = self.language {
            config.target_language = language;
        }
        if let Some(delay) = self.delay {
            config.request_delay_secs = delay;
        }
        if self.limit.is_some() {
            config.url_limit = self.limit;
        }
        if self.snapshots.is_some() {
            config.snapshot_dir = self.snapshots;
        }
        if self.libretranslate_url.is_some() {
            config.libretranslate_url = self.libretranslate_url;
        }
        Ok((config, self.urls, self.out))
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "catalog_extract=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let (config, urls_path, out_dir) = Args::parse().into_config()?;
    let urls = read_url_file(&urls_path)?;
    info!(
        "Processing {} URLs into {} ({})",
        urls.len(),
        out_dir.display(),
        config.target_language
    );

    let pipeline = Pipeline::from_config(config);
    let report = pipeline.run(&urls);
    for failure in &report.failures {
        warn!("Skipped {}: {}", failure.url, failure.reason);
    }

    let outputs = write_batch_outputs(&out_dir, &report.records, pipeline.context().events())
        .with_context(|| format!("writing batch output to {}", out_dir.display()))?;
    info!(
        "Done: {} products, {} skipped; CSV {}, backup {}",
        report.records.len(),
        report.failures.len(),
        outputs.csv.display(),
        outputs.json_backup.display()
    );
    Ok(())
}
