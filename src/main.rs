mod archiver;
mod catalog;
mod config;
mod downloader;
mod error;
mod fetcher;
mod models;
mod parser;
mod pipeline;
mod selector;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::config::ScraperConfig;
use crate::fetcher::HttpFetcher;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let config = ScraperConfig::from_env().context("Failed to load configuration")?;
    let fetcher = HttpFetcher::new(&config)?;

    let summary = pipeline::run(&fetcher, &config, chrono::Local::now)?;
    println!(
        "Scraped {} products ({} files) into '{}', summary at '{}'",
        summary.products,
        summary.assets,
        summary.bundle_dir.display(),
        summary.csv_path.display()
    );
    Ok(())
}
