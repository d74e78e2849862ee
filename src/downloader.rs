use std::path::{Path, PathBuf};

use tracing::debug;
use url::Url;

use crate::error::{Result, ScrapeError};
use crate::fetcher::Fetch;

/// Last segment of the URL path, as written in `url`. Query and fragment
/// play no part, and no percent-encoding is added or removed.
pub fn asset_filename(url: &str) -> Result<String> {
    Url::parse(url).map_err(|e| ScrapeError::Parse(format!("invalid asset url '{url}': {e}")))?;

    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let path = match without_query.split_once("://") {
        Some((_, rest)) => rest.find('/').map_or("", |i| &rest[i..]),
        None => without_query,
    };
    path.rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ScrapeError::Parse(format!("asset url '{url}' has no file name")))
}

/// Fetches `url` into `dest_dir`, which must already exist. A file with the
/// same name is overwritten.
pub fn download_asset<F: Fetch + ?Sized>(fetcher: &F, url: &str, dest_dir: &Path) -> Result<PathBuf> {
    let filename = asset_filename(url)?;
    let content = fetcher.get_bytes(url)?;
    let path = dest_dir.join(filename);
    std::fs::write(&path, &content).map_err(|e| ScrapeError::io(&path, e))?;
    debug!("Saved {} ({} bytes)", path.display(), content.len());
    Ok(path)
}
