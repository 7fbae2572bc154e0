//! Page scraping through a scoped browser session
//!
//! A session is acquired from a [`BrowserLauncher`] for every scrape and is
//! closed before `scrape` returns, whether navigation succeeded, failed or
//! timed out. Visible text, title, meta tags and outbound links are then
//! derived from the rendered HTML.
//!
//! The bundled [`HttpBrowser`] returns the HTML the server sends. It runs no
//! JavaScript and does not wait for network activity to settle, so pages
//! assembled client-side yield little text. A launcher driving a headless
//! browser can replace it without changes to [`PageScraper`].

mod browser;
mod fixture;
mod page;

pub use browser::{BrowserLauncher, BrowserSession, HttpBrowser, LaunchOptions, RenderedPage};
pub use fixture::StaticLauncher;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::config::ScraperConfig;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScrapeError {
    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("navigation to {url} timed out after {seconds}s")]
    Timeout { url: String, seconds: u64 },

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("browser failed to launch: {0}")]
    Launch(String),

    #[error("browser crashed: {0}")]
    Crashed(String),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;

/// One rendered page, reduced to what the analysis prompt needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedSite {
    pub url: String,
    pub html: String,
    /// Visible text, capped at `ScraperConfig::max_text_chars`
    pub text: String,
    pub title: String,
    pub meta: BTreeMap<String, String>,
    /// Absolute http(s) links, deduplicated, capped at `ScraperConfig::max_links`
    pub links: Vec<String>,
}

impl ScrapedSite {
    pub fn meta_description(&self) -> Option<&str> {
        self.meta
            .get("description")
            .or_else(|| self.meta.get("og:description"))
            .map(String::as_str)
            .filter(|d| !d.is_empty())
    }
}

/// Parse a user-supplied URL, accepting only absolute http(s) URLs
pub fn parse_target(raw: &str) -> Result<Url> {
    let invalid = |reason: &str| ScrapeError::InvalidUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(&e.to_string()))?;
    match url.scheme() {
        "http" | "https" if url.host().is_some() => Ok(url),
        "http" | "https" => Err(invalid("missing host")),
        other => Err(invalid(&format!("unsupported scheme '{other}'"))),
    }
}

#[derive(Clone)]
pub struct PageScraper {
    launcher: Arc<dyn BrowserLauncher>,
    config: ScraperConfig,
}

impl PageScraper {
    pub fn new(launcher: Arc<dyn BrowserLauncher>, config: ScraperConfig) -> Self {
        Self { launcher, config }
    }

    pub async fn scrape(&self, raw_url: &str) -> Result<ScrapedSite> {
        let url = parse_target(raw_url)?;
        let timeout = self.config.navigation_timeout();

        let mut session = self
            .launcher
            .launch(&LaunchOptions {
                user_agent: self.config.user_agent.clone(),
            })
            .await?;

        let navigation = tokio::time::timeout(timeout, session.navigate(&url)).await;
        session.close().await;

        let page = match navigation {
            Ok(Ok(page)) => page,
            Ok(Err(e)) => {
                warn!(url = %url, error = %e, "Navigation failed");
                return Err(e);
            }
            Err(_) => {
                warn!(url = %url, seconds = timeout.as_secs(), "Navigation timed out");
                return Err(ScrapeError::Timeout {
                    url: url.to_string(),
                    seconds: timeout.as_secs(),
                });
            }
        };

        let site = page::build_site(&page, self.config.max_text_chars, self.config.max_links);
        info!(
            url = %site.url,
            text_chars = site.text.chars().count(),
            links = site.links.len(),
            "Page scraped"
        );

        Ok(site)
    }
}
