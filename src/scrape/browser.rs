//! Browser automation seam and the HTTP-backed default browser

use async_trait::async_trait;
use bytes::BytesMut;
use reqwest::{Client, header};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::ScrapeError;

/// Options applied to a freshly acquired browser session
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub user_agent: String,
}

/// Raw result of a navigation
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// Final URL after redirects
    pub url: Url,
    pub html: String,
}

/// Acquires browser sessions.
///
/// Every session handed out must be given back through
/// [`BrowserSession::close`]; `PageScraper` does so on every exit path.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn BrowserSession>, ScrapeError>;
}

#[async_trait]
pub trait BrowserSession: Send {
    /// Navigate and wait until the page is quiescent
    async fn navigate(&mut self, url: &Url) -> Result<RenderedPage, ScrapeError>;

    /// Release the session. Failures are logged by the implementation.
    async fn close(self: Box<Self>);
}

/// Browser that fetches server-rendered HTML over HTTP.
///
/// Pages that build their content with JavaScript come back mostly empty;
/// a rendering launcher can be plugged in behind the same traits.
#[derive(Debug, Clone)]
pub struct HttpBrowser {
    connect_timeout: Duration,
    max_html_bytes: usize,
}

impl HttpBrowser {
    pub fn new(connect_timeout: Duration, max_html_bytes: usize) -> Self {
        Self {
            connect_timeout,
            max_html_bytes,
        }
    }
}

impl Default for HttpBrowser {
    fn default() -> Self {
        Self::new(Duration::from_secs(10), 5 * 1024 * 1024)
    }
}

#[async_trait]
impl BrowserLauncher for HttpBrowser {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn BrowserSession>, ScrapeError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            header::HeaderValue::from_static("en-US,en;q=0.5"),
        );
        headers.insert(
            header::UPGRADE_INSECURE_REQUESTS,
            header::HeaderValue::from_static("1"),
        );

        let client = Client::builder()
            .connect_timeout(self.connect_timeout)
            .user_agent(&options.user_agent)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| ScrapeError::Launch(e.to_string()))?;

        debug!("HTTP browser session opened");

        Ok(Box::new(HttpSession {
            client,
            max_html_bytes: self.max_html_bytes,
        }))
    }
}

struct HttpSession {
    client: Client,
    max_html_bytes: usize,
}

#[async_trait]
impl BrowserSession for HttpSession {
    async fn navigate(&mut self, url: &Url) -> Result<RenderedPage, ScrapeError> {
        let navigation_error = |reason: String| ScrapeError::Navigation {
            url: url.to_string(),
            reason,
        };

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    navigation_error(format!("connection failed: {e}"))
                } else if e.is_redirect() {
                    navigation_error("too many redirects".to_string())
                } else {
                    navigation_error(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(navigation_error(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let final_url = response.url().clone();
        let mut body = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| navigation_error(format!("failed to read body: {e}")))?
        {
            body.extend_from_slice(&chunk);
            if body.len() >= self.max_html_bytes {
                warn!(url = %final_url, limit = self.max_html_bytes, "Page body truncated");
                body.truncate(self.max_html_bytes);
                break;
            }
        }

        debug!(url = %final_url, size = body.len(), "Page fetched");

        Ok(RenderedPage {
            url: final_url,
            html: String::from_utf8_lossy(&body).into_owned(),
        })
    }

    async fn close(self: Box<Self>) {
        debug!("HTTP browser session closed");
    }
}
