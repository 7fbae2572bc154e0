//! In-memory browser for tests and offline runs

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use url::Url;

use super::{BrowserLauncher, BrowserSession, LaunchOptions, RenderedPage, ScrapeError};

#[derive(Clone)]
enum Fixture {
    Page(String),
    Fail(ScrapeError),
}

/// Launcher serving canned pages.
///
/// Tracks how many sessions were launched and how many are still open, so
/// tests can assert that every acquired session was released.
#[derive(Clone, Default)]
pub struct StaticLauncher {
    fixtures: HashMap<String, Fixture>,
    delay: Option<Duration>,
    fail_launch: bool,
    launches: Arc<AtomicUsize>,
    open: Arc<AtomicUsize>,
    last_user_agent: Arc<std::sync::Mutex<Option<String>>>,
}

impl StaticLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.fixtures.insert(normalize(url), Fixture::Page(html.into()));
        self
    }

    pub fn with_failure(mut self, url: &str, error: ScrapeError) -> Self {
        self.fixtures.insert(normalize(url), Fixture::Fail(error));
        self
    }

    /// Delay every navigation, e.g. to exercise navigation timeouts
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing_launch(mut self) -> Self {
        self.fail_launch = true;
        self
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn open_sessions(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    pub fn last_user_agent(&self) -> Option<String> {
        self.last_user_agent.lock().ok().and_then(|ua| ua.clone())
    }
}

fn normalize(url: &str) -> String {
    Url::parse(url)
        .map(String::from)
        .unwrap_or_else(|_| url.to_string())
}

#[async_trait]
impl BrowserLauncher for StaticLauncher {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn BrowserSession>, ScrapeError> {
        if self.fail_launch {
            return Err(ScrapeError::Launch("static launcher configured to fail".into()));
        }

        self.launches.fetch_add(1, Ordering::SeqCst);
        self.open.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut ua) = self.last_user_agent.lock() {
            *ua = Some(options.user_agent.clone());
        }

        Ok(Box::new(StaticSession {
            fixtures: self.fixtures.clone(),
            delay: self.delay,
            open: self.open.clone(),
        }))
    }
}

struct StaticSession {
    fixtures: HashMap<String, Fixture>,
    delay: Option<Duration>,
    open: Arc<AtomicUsize>,
}

#[async_trait]
impl BrowserSession for StaticSession {
    async fn navigate(&mut self, url: &Url) -> Result<RenderedPage, ScrapeError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.fixtures.get(url.as_str()) {
            Some(Fixture::Page(html)) => Ok(RenderedPage {
                url: url.clone(),
                html: html.clone(),
            }),
            Some(Fixture::Fail(e)) => Err(e.clone()),
            None => Err(ScrapeError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            }),
        }
    }

    async fn close(self: Box<Self>) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}
