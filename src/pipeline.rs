use chrono::{DateTime, Local};
use tracing::info;

use crate::archiver::{self, OutputSummary, RunContext};
use crate::catalog;
use crate::config::ScraperConfig;
use crate::error::Result;
use crate::fetcher::Fetch;

/// Listing, then every detail page, then the bundle. The first error ends the run.
///
/// `clock` is read once, after all detail pages are in, to name the bundle.
pub fn run<F, C>(fetcher: &F, config: &ScraperConfig, clock: C) -> Result<OutputSummary>
where
    F: Fetch + Sync + ?Sized,
    C: FnOnce() -> DateTime<Local>,
{
    let references = catalog::fetch_listing(fetcher, config)?;
    let records = catalog::fetch_all_details(fetcher, &references, config)?;

    let ctx = RunContext::new(&config.output_root, clock(), config.name_collision);
    info!(
        "Writing {} products, bundle stamped {}",
        records.len(),
        ctx.started_at.to_rfc3339()
    );
    archiver::write_output(fetcher, &records, &ctx)
}
