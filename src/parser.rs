use scraper::Html;
use tracing::{debug, warn};
use url::Url;

use crate::config::{DetailSelectors, ListingSelectors};
use crate::error::{Result, ScrapeError};
use crate::models::{ProductRecord, ProductReference};
use crate::selector::{compile, extract_all, extract_field};

/// Product links in document order. Anchors lacking a name or a URL are skipped.
pub fn parse_listing(
    page_url: &str,
    html: &str,
    selectors: &ListingSelectors,
) -> Result<Vec<ProductReference>> {
    let doc = Html::parse_document(html);
    let container_selector = compile(&selectors.container)?;
    let anchor_selector = compile(&selectors.anchor)?;

    let container = doc.select(&container_selector).next().ok_or_else(|| {
        ScrapeError::Parse(format!(
            "listing container '{}' not found on {page_url}",
            selectors.container
        ))
    })?;

    let mut products = Vec::new();
    for anchor in container.select(&anchor_selector) {
        let name = anchor.value().attr(&selectors.name_attr).map(str::trim);
        let href = anchor.value().attr(&selectors.url_attr);

        match (name, href) {
            (Some(name), Some(href)) => products.push(ProductReference {
                name: name.to_string(),
                detail_url: resolve_url(page_url, href),
            }),
            _ => warn!("Skipping listing anchor without name or url: {}", anchor.html()),
        }
    }

    Ok(products)
}

pub fn parse_product(
    reference: &ProductReference,
    html: &str,
    selectors: &DetailSelectors,
) -> Result<ProductRecord> {
    let doc = Html::parse_document(html);
    let page_url = reference.detail_url.as_str();

    let name = extract_field(&doc, &selectors.name)?.map(|n| title_case(&n));
    let description = extract_field(&doc, &selectors.description)?;
    let product_reference = extract_field(&doc, &selectors.reference)?;
    let image_url = extract_field(&doc, &selectors.image)?.map(|src| resolve_url(page_url, &src));
    let document_urls = extract_all(&doc, &selectors.documents)?
        .iter()
        .map(|href| resolve_url(page_url, href))
        .collect();

    if name.is_none() {
        debug!("No product name on {page_url}");
    }
    if image_url.is_none() {
        debug!("No product image on {page_url}");
    }

    Ok(ProductRecord {
        source_url: reference.detail_url.clone(),
        listing_name: reference.name.clone(),
        name,
        reference: product_reference,
        description,
        image_url,
        document_urls,
    })
}

/// Uppercases the first cased letter of every run and lowercases the rest.
/// Uncased characters, digits included, end a run: `"o'neil 3d"` becomes `"O'Neil 3D"`.
///
/// A letter whose uppercase form expands keeps only its first character
/// uppercased (`"ßa"` becomes `"Ssa"`). Digraphs such as `ǆ` take their
/// uppercase form `Ǆ`, not the titlecase `ǅ`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        let cased = c.is_uppercase() || c.is_lowercase();
        if cased && in_word {
            out.extend(c.to_lowercase());
        } else if cased {
            let mut upper = c.to_uppercase();
            out.extend(upper.next());
            out.extend(upper.flat_map(char::to_lowercase));
        } else {
            out.push(c);
        }
        in_word = cased;
    }
    out
}

/// Absolute links are kept exactly as written; anything else is joined
/// onto the page it was found on. Unresolvable links are kept verbatim.
fn resolve_url(page_url: &str, href: &str) -> String {
    if Url::parse(href).is_ok() {
        return href.to_string();
    }
    Url::parse(page_url)
        .and_then(|base| base.join(href))
        .map(String::from)
        .unwrap_or_else(|_| href.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING_URL: &str = "https://shop.test/produits/?limit=2000&order=name&page=1";

    fn listing(anchors: &str) -> String {
        format!(
            r#"<html><body>
                 <a class="prod" title="Outside" href="https://shop.test/outside">x</a>
                 <div id="liste-produits">{anchors}</div>
               </body></html>"#
        )
    }

    fn reference() -> ProductReference {
        ProductReference {
            name: "Widget".to_string(),
            detail_url: "https://shop.test/produits/widget/".to_string(),
        }
    }

    #[test]
    fn listing_returns_valid_anchors_in_order() {
        let html = listing(
            r#"<a class="prod" title="  Beta  " href="https://shop.test/beta">B</a>
               <a class="prod" href="https://shop.test/no-title">?</a>
               <a class="prod" title="No href">?</a>
               <a class="other" title="Wrong class" href="https://shop.test/other">?</a>
               <a class="prod" title="   " href="https://shop.test/blank">?</a>
               <a class="prod" title="Alpha" href="/alpha">A</a>"#,
        );
        let products = parse_listing(LISTING_URL, &html, &ListingSelectors::default()).unwrap();
        assert_eq!(
            products,
            vec![
                ProductReference {
                    name: "Beta".to_string(),
                    detail_url: "https://shop.test/beta".to_string(),
                },
                ProductReference {
                    name: String::new(),
                    detail_url: "https://shop.test/blank".to_string(),
                },
                ProductReference {
                    name: "Alpha".to_string(),
                    detail_url: "https://shop.test/alpha".to_string(),
                },
            ]
        );
    }

    #[test]
    fn listing_without_container_is_a_parse_error() {
        let html = r#"<html><body><a class="prod" title="A" href="/a">A</a></body></html>"#;
        let err = parse_listing(LISTING_URL, html, &ListingSelectors::default()).unwrap_err();
        assert!(matches!(err, ScrapeError::Parse(_)));
    }

    #[test]
    fn empty_container_yields_no_products() {
        let products = parse_listing(LISTING_URL, &listing(""), &ListingSelectors::default()).unwrap();
        assert!(products.is_empty());
    }

    #[test]
    fn detail_page_extracts_every_field() {
        let html = r#"
            <div class="produit-top">
              <div class="produit-title">  super WIDGET  </div>
              <div class="desc"> A fine widget. </div>
            </div>
            <div class="reference"> REF1 </div>
            <div class="img-ct"><img src="/media/w.png"></div>
            <div id="docsProduit">
              <a href="https://cdn.test/spec.pdf">Spec</a>
              <a href="docs/manual.pdf">Manual</a>
              <a href="https://cdn.test/spec.pdf">Spec again</a>
            </div>"#;

        let record = parse_product(&reference(), html, &DetailSelectors::default()).unwrap();
        assert_eq!(record.source_url, "https://shop.test/produits/widget/");
        assert_eq!(record.listing_name, "Widget");
        assert_eq!(record.name.as_deref(), Some("Super Widget"));
        assert_eq!(record.description.as_deref(), Some("A fine widget."));
        assert_eq!(record.reference.as_deref(), Some("REF1"));
        assert_eq!(record.image_url.as_deref(), Some("https://shop.test/media/w.png"));
        assert_eq!(
            record.document_urls,
            vec![
                "https://cdn.test/spec.pdf",
                "https://shop.test/produits/widget/docs/manual.pdf",
                "https://cdn.test/spec.pdf",
            ]
        );
    }

    #[test]
    fn missing_optional_fields_are_none() {
        let html = r#"<div class="img-ct"><img src="https://cdn.test/w.png"></div>"#;
        let record = parse_product(&reference(), html, &DetailSelectors::default()).unwrap();
        assert_eq!(record.name, None);
        assert_eq!(record.description, None);
        assert_eq!(record.reference, None);
        assert_eq!(record.image_url.as_deref(), Some("https://cdn.test/w.png"));
        assert!(record.document_urls.is_empty());
    }

    #[test]
    fn missing_image_is_none() {
        let html = r#"<div class="reference">R</div>"#;
        let record = parse_product(&reference(), html, &DetailSelectors::default()).unwrap();
        assert_eq!(record.image_url, None);
        assert_eq!(record.reference.as_deref(), Some("R"));
    }

    #[test]
    fn title_case_matches_word_runs() {
        assert_eq!(title_case("widget"), "Widget");
        assert_eq!(title_case("GEL DOUCHE bio"), "Gel Douche Bio");
        assert_eq!(title_case("o'neil 3d"), "O'Neil 3D");
        assert_eq!(title_case("crème-éclat"), "Crème-Éclat");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn title_case_expanding_uppercase_keeps_one_capital() {
        assert_eq!(title_case("ßa"), "Ssa");
        assert_eq!(title_case("ﬁlm noir"), "Film Noir");
    }

    #[test]
    fn absolute_links_keep_their_text() {
        let raw = "https://cdn.test/docs/Fiche technique é.pdf";
        assert_eq!(resolve_url("https://shop.test/produits/widget/", raw), raw);

        let html = format!(
            r#"<div class="img-ct"><img src="https://cdn.test/img/Crème solaire.png"></div>
               <div id="docsProduit"><a href="{raw}">Fiche</a></div>"#
        );
        let record = parse_product(&reference(), &html, &DetailSelectors::default()).unwrap();
        assert_eq!(record.image_url.as_deref(), Some("https://cdn.test/img/Crème solaire.png"));
        assert_eq!(record.document_urls, vec![raw]);
    }

    #[test]
    fn relative_links_are_joined_onto_the_page() {
        let base = "https://shop.test/produits/widget/";
        assert_eq!(resolve_url(base, "/media/w.png"), "https://shop.test/media/w.png");
        assert_eq!(resolve_url(base, "//cdn.test/x.pdf"), "https://cdn.test/x.pdf");
        assert_eq!(resolve_url("not a url", "x.pdf"), "x.pdf");
    }
}
