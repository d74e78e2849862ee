/// A product link found on the listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductReference {
    pub name: String,
    pub detail_url: String,
}

/// Fields extracted from one detail page. Missing page elements leave the
/// matching field empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    pub source_url: String,
    /// Name shown on the listing page, used when the detail page has none.
    pub listing_name: String,
    pub name: Option<String>,
    pub reference: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub document_urls: Vec<String>,
}

impl ProductRecord {
    /// Image first, then documents in page order.
    pub fn asset_urls(&self) -> impl Iterator<Item = &str> {
        self.image_url
            .as_deref()
            .into_iter()
            .chain(self.document_urls.iter().map(String::as_str))
    }

    pub fn docs_column(&self) -> String {
        self.document_urls.join(", ")
    }
}
