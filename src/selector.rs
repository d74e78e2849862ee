use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;

use crate::error::{Result, ScrapeError};

/// A CSS selector plus what to read from the matched element.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldSpec {
    pub css: String,
    /// Attribute to read. When absent the element's trimmed text is used.
    #[serde(default)]
    pub attr: Option<String>,
}

impl FieldSpec {
    pub fn text(css: &str) -> Self {
        Self {
            css: css.to_string(),
            attr: None,
        }
    }

    pub fn attr(css: &str, attr: &str) -> Self {
        Self {
            css: css.to_string(),
            attr: Some(attr.to_string()),
        }
    }

    fn read(&self, element: ElementRef<'_>) -> Option<String> {
        match &self.attr {
            Some(name) => element.value().attr(name).map(str::to_string),
            None => Some(element_text(element)),
        }
    }
}

pub fn compile(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScrapeError::Parse(format!("invalid selector '{css}': {e}")))
}

/// Concatenated descendant text, trimmed.
pub fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Reads the field from the first matching element.
///
/// `Ok(None)` means the page simply lacks the field; only a malformed
/// selector is an error.
pub fn extract_field(doc: &Html, spec: &FieldSpec) -> Result<Option<String>> {
    let selector = compile(&spec.css)?;
    Ok(doc.select(&selector).next().and_then(|e| spec.read(e)))
}

/// Reads the field from every matching element in document order.
/// Elements lacking the attribute are skipped; duplicates are kept.
pub fn extract_all(doc: &Html, spec: &FieldSpec) -> Result<Vec<String>> {
    let selector = compile(&spec.css)?;
    Ok(doc.select(&selector).filter_map(|e| spec.read(e)).collect())
}
