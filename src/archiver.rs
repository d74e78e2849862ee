//! Materializes a run on disk: one bundle directory per run, one folder of
//! downloaded assets per product, and `products.csv` at the bundle root.
//!
//! The CSV is written last and renamed into place, so its presence marks a
//! bundle whose downloads all completed. Any failure before that leaves the
//! folders created so far on disk.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::CollisionPolicy;
use crate::downloader::{asset_filename, download_asset};
use crate::error::{Result, ScrapeError};
use crate::fetcher::Fetch;
use crate::models::ProductRecord;

pub const CSV_FILE_NAME: &str = "products.csv";
const CSV_PART_FILE_NAME: &str = "products.csv.part";
const CSV_HEADER: [&str; 6] = ["url", "name", "reference", "description", "image_url", "docs_urls"];

/// Per-run state threaded through the writer.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub started_at: DateTime<Local>,
    pub bundle_dir: PathBuf,
    pub collision: CollisionPolicy,
}

impl RunContext {
    pub fn new(output_root: &Path, started_at: DateTime<Local>, collision: CollisionPolicy) -> Self {
        Self {
            bundle_dir: output_root.join(bundle_name(&started_at)),
            started_at,
            collision,
        }
    }

    pub fn csv_path(&self) -> PathBuf {
        self.bundle_dir.join(CSV_FILE_NAME)
    }
}

/// `Scraping output - 2024-05-01T134501`: local time to the second, colons dropped.
pub fn bundle_name(at: &DateTime<Local>) -> String {
    format!("Scraping output - {}", at.format("%Y-%m-%dT%H%M%S"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSummary {
    pub bundle_dir: PathBuf,
    pub csv_path: PathBuf,
    pub products: usize,
    pub assets: usize,
}

#[derive(Serialize)]
struct CsvRow<'a> {
    url: &'a str,
    name: Option<&'a str>,
    reference: Option<&'a str>,
    description: Option<&'a str>,
    image_url: Option<&'a str>,
    docs_urls: String,
}

impl<'a> From<&'a ProductRecord> for CsvRow<'a> {
    fn from(record: &'a ProductRecord) -> Self {
        Self {
            url: &record.source_url,
            name: record.name.as_deref(),
            reference: record.reference.as_deref(),
            description: record.description.as_deref(),
            image_url: record.image_url.as_deref(),
            docs_urls: record.docs_column(),
        }
    }
}

pub fn write_output<F: Fetch + ?Sized>(
    fetcher: &F,
    records: &[ProductRecord],
    ctx: &RunContext,
) -> Result<OutputSummary> {
    std::fs::create_dir_all(&ctx.bundle_dir).map_err(|e| ScrapeError::io(&ctx.bundle_dir, e))?;

    let mut assets = 0;
    for record in records {
        let folder = create_product_dir(&ctx.bundle_dir, &product_dir_name(record), ctx.collision)?;
        for url in record.asset_urls() {
            download_asset(fetcher, url, &folder)?;
            assets += 1;
        }
    }

    let csv_path = ctx.csv_path();
    write_csv(records, &csv_path)?;

    info!("Data saved into folder: '{}'", ctx.bundle_dir.display());
    info!("List of products scraped saved in: '{}'", csv_path.display());

    Ok(OutputSummary {
        bundle_dir: ctx.bundle_dir.clone(),
        csv_path,
        products: records.len(),
        assets,
    })
}

/// Writes the summary table next to `path` and renames it into place.
pub fn write_csv(records: &[ProductRecord], path: &Path) -> Result<()> {
    let partial = path.with_file_name(CSV_PART_FILE_NAME);
    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&partial)?;
        writer.write_record(CSV_HEADER)?;
        for record in records {
            writer.serialize(CsvRow::from(record))?;
        }
        writer.flush().map_err(|e| ScrapeError::io(&partial, e))?;
    }
    std::fs::rename(&partial, path).map_err(|e| ScrapeError::io(path, e))
}

/// Directory label for a record: its name, else the listing name, else the
/// last segment of its URL, made safe for common filesystems. Names that
/// would shadow the summary table get a trailing `_`.
pub fn product_dir_name(record: &ProductRecord) -> String {
    let url_segment = asset_filename(&record.source_url).ok();
    let name = [record.name.as_deref(), Some(record.listing_name.as_str()), url_segment.as_deref()]
        .into_iter()
        .flatten()
        .map(sanitize_dir_name)
        .find(|name| !name.is_empty())
        .unwrap_or_else(|| "product".to_string());

    if [CSV_FILE_NAME, CSV_PART_FILE_NAME]
        .iter()
        .any(|reserved| name.eq_ignore_ascii_case(reserved))
    {
        format!("{name}_")
    } else {
        name
    }
}

pub fn sanitize_dir_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    replaced
        .trim_matches(|c: char| c.is_whitespace() || c == '.')
        .to_string()
}

fn create_product_dir(bundle: &Path, name: &str, policy: CollisionPolicy) -> Result<PathBuf> {
    let mut path = bundle.join(name);
    let mut attempt = 1;
    loop {
        match std::fs::create_dir(&path) {
            Ok(()) => return Ok(path),
            Err(e) if e.kind() == ErrorKind::AlreadyExists && policy == CollisionPolicy::Suffix => {
                attempt += 1;
                warn!("Folder '{name}' already exists, trying suffix ({attempt})");
                path = bundle.join(format!("{name} ({attempt})"));
            }
            Err(e) => return Err(ScrapeError::io(&path, e)),
        }
    }
}
