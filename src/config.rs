//! Run configuration.
//!
//! Every field has a default matching the live catalog, so a run with no
//! config file scrapes the same site with the same selectors. A JSON file
//! named by `CATALOG_SCRAPER_CONFIG` may override any subset of fields.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use url::Url;

use crate::error::{Result, ScrapeError};
use crate::selector::FieldSpec;

pub const CONFIG_ENV_VAR: &str = "CATALOG_SCRAPER_CONFIG";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Catalog index page, without query string.
    pub listing_url: String,

    /// Query parameters appended to `listing_url`, in order.
    pub listing_query: Vec<(String, String)>,

    /// Directory under which the run bundle is created.
    pub output_root: PathBuf,

    pub selectors: Selectors,

    /// Sent on every request when set; otherwise the client default is used.
    pub user_agent: Option<String>,

    /// Number of detail pages fetched at once. 1 keeps the run strictly sequential.
    pub detail_workers: usize,

    pub name_collision: CollisionPolicy,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            listing_url: "https://www.lesindispensables.fr/produits/".to_string(),
            listing_query: vec![
                ("limit".to_string(), "2000".to_string()),
                ("order".to_string(), "name".to_string()),
                ("page".to_string(), "1".to_string()),
            ],
            output_root: PathBuf::from("."),
            selectors: Selectors::default(),
            user_agent: None,
            detail_workers: 1,
            name_collision: CollisionPolicy::Reject,
        }
    }
}

impl ScraperConfig {
    /// Reads the file named by `CATALOG_SCRAPER_CONFIG`, or returns defaults when unset.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::from_path(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| ScrapeError::io(path, e))?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| ScrapeError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.detail_workers == 0 {
            return Err(ScrapeError::Config(
                "detail_workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Full listing request URL with the configured query parameters.
    pub fn listing_request_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.listing_url).map_err(|e| {
            ScrapeError::Config(format!("invalid listing_url '{}': {e}", self.listing_url))
        })?;
        if !self.listing_query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.listing_query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Selectors {
    pub listing: ListingSelectors,
    pub detail: DetailSelectors,
}

/// Where product links live on the listing page.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListingSelectors {
    /// Must be present; its absence fails the listing fetch.
    pub container: String,
    pub anchor: String,
    pub name_attr: String,
    pub url_attr: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            container: "div#liste-produits".to_string(),
            anchor: "a.prod".to_string(),
            name_attr: "title".to_string(),
            url_attr: "href".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetailSelectors {
    pub name: FieldSpec,
    pub description: FieldSpec,
    pub reference: FieldSpec,
    pub image: FieldSpec,
    pub documents: FieldSpec,
}

impl Default for DetailSelectors {
    fn default() -> Self {
        Self {
            name: FieldSpec::text("div.produit-top div.produit-title"),
            description: FieldSpec::text("div.produit-top div.desc"),
            reference: FieldSpec::text("div.reference"),
            image: FieldSpec::attr("div.img-ct img", "src"),
            documents: FieldSpec::attr("#docsProduit a", "href"),
        }
    }
}

/// What to do when two products map to the same directory name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Fail the run, like any other directory creation error.
    #[default]
    Reject,
    /// Append ` (2)`, ` (3)`, ... until the name is free.
    Suffix,
}
