//! Auxiliary "as of now" quote scraped from a web page

use std::time::Duration;

use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, info};

use crate::shared::errors::ScrapeError;

pub const DEFAULT_QUOTE_URL: &str = "https://kr.investing.com/currencies/jpy-krw";
pub const DEFAULT_QUOTE_SELECTOR: &str = "[data-test=\"instrument-price-last\"]";

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) fairfx/0.2";

/// Single-GET quote scraper
pub struct QuoteScraper {
    http_client: Client,
}

impl QuoteScraper {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { http_client })
    }

    /// Fetch `url` and return the text under `selector`.
    pub async fn fetch_quote(&self, url: &str, selector: &str) -> Result<String, ScrapeError> {
        info!("Scraping quote from {}", url);
        let response = self.http_client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status(status.as_u16()));
        }
        let html = response.text().await?;
        debug!("Quote page is {} bytes", html.len());
        extract_text(&html, selector)
    }
}

/// Trimmed, non-empty text nodes under every node matching `selector`, one per line.
pub fn extract_text(html: &str, selector: &str) -> Result<String, ScrapeError> {
    let parsed = Selector::parse(selector)
        .map_err(|e| ScrapeError::InvalidSelector(format!("{}: {:?}", selector, e)))?;
    let document = Html::parse_document(html);

    let parts: Vec<&str> = document
        .select(&parsed)
        .flat_map(|element| element.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect();

    if parts.is_empty() {
        return Err(ScrapeError::NodeNotFound(selector.to_string()));
    }
    Ok(parts.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body><div id="__next">
        <div class="quote">
            <div data-test="instrument-price-last">
                9.0412
            </div>
            <span data-test="instrument-price-change"> +0.0123 </span>
        </div>
    </div></body></html>"#;

    #[test]
    fn test_extract_text_trims() {
        assert_eq!(extract_text(PAGE, DEFAULT_QUOTE_SELECTOR).unwrap(), "9.0412");
    }

    #[test]
    fn test_extract_text_joins_nodes() {
        let text = extract_text(PAGE, "div.quote").unwrap();
        assert_eq!(text, "9.0412\n+0.0123");
    }

    #[test]
    fn test_missing_node() {
        assert!(matches!(
            extract_text(PAGE, "#nothing-here"),
            Err(ScrapeError::NodeNotFound(_))
        ));
    }

    #[test]
    fn test_invalid_selector() {
        assert!(matches!(
            extract_text(PAGE, "div[[["),
            Err(ScrapeError::InvalidSelector(_))
        ));
    }
}
