use rayon::prelude::*;
use tracing::info;

use crate::config::{DetailSelectors, ScraperConfig};
use crate::error::{Result, ScrapeError};
use crate::fetcher::Fetch;
use crate::models::{ProductRecord, ProductReference};
use crate::parser;

pub fn fetch_listing<F: Fetch + ?Sized>(
    fetcher: &F,
    config: &ScraperConfig,
) -> Result<Vec<ProductReference>> {
    info!("Getting products urls ...");
    let url = config.listing_request_url()?;
    let html = fetcher.get_text(url.as_str())?;
    let products = parser::parse_listing(url.as_str(), &html, &config.selectors.listing)?;
    info!("Gotten products urls for {} products", products.len());
    Ok(products)
}

pub fn fetch_details<F: Fetch + ?Sized>(
    fetcher: &F,
    reference: &ProductReference,
    selectors: &DetailSelectors,
) -> Result<ProductRecord> {
    info!("Getting product details from '{}' ...", reference.detail_url);
    let html = fetcher.get_text(&reference.detail_url)?;
    parser::parse_product(reference, &html, selectors)
}

/// Details for every reference, in listing order.
///
/// With `detail_workers > 1` pages are fetched on a bounded pool; results
/// are still returned in listing order and any failure fails the batch.
pub fn fetch_all_details<F: Fetch + Sync + ?Sized>(
    fetcher: &F,
    references: &[ProductReference],
    config: &ScraperConfig,
) -> Result<Vec<ProductRecord>> {
    let selectors = &config.selectors.detail;

    if config.detail_workers <= 1 {
        return references
            .iter()
            .map(|reference| fetch_details(fetcher, reference, selectors))
            .collect();
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.detail_workers)
        .build()
        .map_err(|e| ScrapeError::Config(format!("cannot start worker pool: {e}")))?;

    pool.install(|| {
        references
            .par_iter()
            .map(|reference| fetch_details(fetcher, reference, selectors))
            .collect()
    })
}
