use scraper::{Html, Selector};
use url::Url;

use crate::application::ports::ImageLinkExtractor;

/// Reads `<img src>` references with the `scraper` HTML parser.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScraperImageLinkExtractor;

impl ScraperImageLinkExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl ImageLinkExtractor for ScraperImageLinkExtractor {
    fn extract(&self, html: &str, base: &Url) -> Vec<Url> {
        let Ok(selector) = Selector::parse("img[src]") else {
            return Vec::new();
        };

        let document = Html::parse_document(html);
        document
            .select(&selector)
            .filter_map(|img| img.value().attr("src"))
            .map(str::trim)
            .filter(|src| !src.is_empty())
            .filter_map(|src| match base.join(src) {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::debug!(src, error = %e, "Skip unresolvable image reference");
                    None
                }
            })
            .collect()
    }
}
