//! Content fetchers.
//!
//! A [`ContentFetcher`] turns a locator into text with a single read. The
//! service runs fetchers on the blocking pool, so implementations are plain
//! synchronous code.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use tracing::{debug, warn};
use ureq::Agent;
use url::Url;

use crate::error::FetchError;

/// Default `User-Agent` header.
const DEFAULT_USER_AGENT: &str = concat!("mdview/", env!("CARGO_PKG_VERSION"));

/// Reads the text behind a locator.
pub trait ContentFetcher: Send + Sync {
    /// Read `locator` and return its text. No retries.
    fn fetch_text(&self, locator: &str) -> Result<String, FetchError>;
}

/// HTTP(S) fetcher backed by a `ureq` agent.
///
/// Relative locators are joined onto the base URL, the way a browser resolves
/// them against the page origin.
pub struct HttpFetcher {
    agent: Agent,
    base_url: Option<Url>,
    user_agent: String,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    /// Create a fetcher with no base URL and no timeout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            agent: build_agent(None),
            base_url: None,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }

    /// Resolve relative locators against `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidLocator`] if `base_url` is not an absolute
    /// http(s) URL.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, FetchError> {
        let url = Url::parse(base_url)
            .map_err(|e| FetchError::invalid_locator(base_url, e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::invalid_locator(
                base_url,
                "base URL must use http or https",
            ));
        }
        self.base_url = Some(url);
        Ok(self)
    }

    /// Abort requests that take longer than `timeout` overall.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = build_agent(Some(timeout));
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Turn `locator` into an absolute URL.
    fn resolve(&self, locator: &str) -> Result<Url, FetchError> {
        match Url::parse(locator) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => match &self.base_url {
                Some(base) => base
                    .join(locator)
                    .map_err(|e| FetchError::invalid_locator(locator, e.to_string())),
                None => Err(FetchError::invalid_locator(
                    locator,
                    "relative locator without base URL",
                )),
            },
            Err(e) => Err(FetchError::invalid_locator(locator, e.to_string())),
        }
    }
}

fn build_agent(timeout: Option<Duration>) -> Agent {
    Agent::config_builder()
        .timeout_global(timeout)
        .http_status_as_error(false)
        .build()
        .into()
}

impl ContentFetcher for HttpFetcher {
    fn fetch_text(&self, locator: &str) -> Result<String, FetchError> {
        let url = self.resolve(locator)?;
        debug!(url = %url, "GET");

        let response = self
            .agent
            .get(url.as_str())
            .header("User-Agent", &self.user_agent)
            .header("Accept", "text/markdown, text/plain, */*")
            .call()?;

        let status = response.status();
        let mut body = response.into_body();

        if status.as_u16() >= 400 {
            let error_body = body
                .read_to_string()
                .unwrap_or_else(|_| "(unable to read error body)".to_owned());
            warn!(url = %url, status = status.as_u16(), "Content request failed");
            return Err(FetchError::http_response(
                status.as_u16(),
                status.canonical_reason().unwrap_or_default(),
                error_body,
            ));
        }

        Ok(body.read_to_string()?)
    }
}

/// Filesystem fetcher rooted at a directory.
///
/// Locators are paths relative to the root; a leading `/` is ignored and
/// `..` is rejected so reads cannot leave the root.
#[derive(Debug, Clone)]
pub struct FileFetcher {
    root: PathBuf,
}

impl FileFetcher {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, locator: &str) -> Result<PathBuf, FetchError> {
        let relative = Path::new(locator.trim_start_matches('/'));
        let mut resolved = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(FetchError::invalid_locator(
                        locator,
                        "path escapes the content root",
                    ));
                }
            }
        }
        if resolved == self.root {
            return Err(FetchError::invalid_locator(locator, "empty path"));
        }
        Ok(resolved)
    }
}

impl ContentFetcher for FileFetcher {
    fn fetch_text(&self, locator: &str) -> Result<String, FetchError> {
        let path = self.resolve(locator)?;
        debug!(path = %path.display(), "Reading content");
        std::fs::read_to_string(&path).map_err(|source| FetchError::Io { path, source })
    }
}
