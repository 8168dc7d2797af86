//! Fetch-then-compile service.

use std::sync::Arc;

use mdview_renderer::{Markdown, OptionOverrides, Plugin, RenderEnv};
use tracing::{debug, info};

use crate::error::FetchError;
use crate::fetch::ContentFetcher;
use crate::sanitize::{AmmoniaSanitizer, HtmlSanitizer};

/// How compiled HTML is treated before it is returned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SecurityContext {
    /// Returned as the renderer produced it.
    None,
    /// Passed through the service's [`HtmlSanitizer`].
    #[default]
    Html,
}

/// Owns a [`Markdown`] instance together with the fetcher and sanitizer it is
/// used with.
///
/// # Example
///
/// ```no_run
/// use mdview_service::{HttpFetcher, MarkdownService};
///
/// # async fn run() -> Result<(), mdview_service::FetchError> {
/// let fetcher = HttpFetcher::new().with_base_url("https://example.com/docs/")?;
/// let service = MarkdownService::new(fetcher);
/// let html = service.render_remote("guide.md", Some("/guide")).await?;
/// # Ok(())
/// # }
/// ```
pub struct MarkdownService {
    markdown: Markdown,
    fetcher: Arc<dyn ContentFetcher>,
    sanitizer: Box<dyn HtmlSanitizer>,
}

impl MarkdownService {
    /// Create a service with a default [`Markdown`] instance and the ammonia
    /// sanitizer.
    pub fn new(fetcher: impl ContentFetcher + 'static) -> Self {
        Self::with_markdown(Markdown::new(), fetcher)
    }

    /// Create a service around an existing renderer instance.
    pub fn with_markdown(markdown: Markdown, fetcher: impl ContentFetcher + 'static) -> Self {
        Self {
            markdown,
            fetcher: Arc::new(fetcher),
            sanitizer: Box::new(AmmoniaSanitizer::new()),
        }
    }

    /// Replace the sanitizer used for [`SecurityContext::Html`].
    #[must_use]
    pub fn with_sanitizer(mut self, sanitizer: impl HtmlSanitizer + 'static) -> Self {
        self.sanitizer = Box::new(sanitizer);
        self
    }

    /// Fetch the text behind `path`.
    ///
    /// The blocking read runs on tokio's blocking pool; this is the only
    /// suspension point of the service.
    ///
    /// # Errors
    ///
    /// Returns the fetcher's [`FetchError`]; its `Display` is the normalized
    /// message. A panicked or cancelled read becomes [`FetchError::Task`].
    pub async fn get_content(&self, path: &str) -> Result<String, FetchError> {
        info!(path, "Fetching content");
        let fetcher = Arc::clone(&self.fetcher);
        let locator = path.to_owned();
        let body = tokio::task::spawn_blocking(move || fetcher.fetch_text(&locator))
            .await
            .map_err(|e| FetchError::Task(e.to_string()))??;
        Ok(Self::extract_data(Some(body)))
    }

    /// Turn a possibly missing response body into text; absent means empty.
    #[must_use]
    pub fn extract_data(body: Option<String>) -> String {
        body.unwrap_or_default()
    }

    /// Recompute renderer options from the defaults and `overrides`.
    pub fn set_options(&mut self, overrides: &OptionOverrides) -> &mut Self {
        self.markdown.set_options(overrides);
        self
    }

    /// Compile markdown without sanitization.
    #[must_use]
    pub fn compile(&self, markdown: &str) -> String {
        self.markdown.compile(markdown)
    }

    /// Compile markdown for the page at `page_path`, without sanitization.
    #[must_use]
    pub fn compile_for_page(&self, markdown: &str, page_path: Option<&str>) -> String {
        let env = page_path.map_or_else(RenderEnv::default, RenderEnv::for_page);
        self.markdown.compile_with_env(markdown, &env)
    }

    /// Compile markdown and treat the result according to `context`.
    #[must_use]
    pub fn compile_with(&self, markdown: &str, context: SecurityContext) -> String {
        let html = self.compile(markdown);
        self.secure(html, context)
    }

    /// Compile markdown and sanitize the result.
    #[must_use]
    pub fn compile_safe(&self, markdown: &str) -> String {
        self.compile_with(markdown, SecurityContext::Html)
    }

    /// Fetch `path` and compile it, sanitized, for the page at `page_path`.
    ///
    /// # Errors
    ///
    /// Returns the [`FetchError`] from [`get_content`](Self::get_content).
    pub async fn render_remote(
        &self,
        path: &str,
        page_path: Option<&str>,
    ) -> Result<String, FetchError> {
        let text = self.get_content(path).await?;
        let html = self.compile_for_page(&text, page_path);
        Ok(self.secure(html, SecurityContext::Html))
    }

    /// Load a plugin into the renderer and return `self` for chaining.
    pub fn load_plugin<P: Plugin>(&mut self, plugin: P) -> &mut Self {
        self.markdown.load_plugin(plugin);
        self
    }

    /// The renderer instance.
    #[must_use]
    pub fn renderer(&self) -> &Markdown {
        &self.markdown
    }

    pub fn renderer_mut(&mut self) -> &mut Markdown {
        &mut self.markdown
    }

    fn secure(&self, html: String, context: SecurityContext) -> String {
        match context {
            SecurityContext::None => html,
            SecurityContext::Html => {
                let clean = self.sanitizer.sanitize(&html);
                if clean.len() != html.len() {
                    debug!(
                        before = html.len(),
                        after = clean.len(),
                        "Sanitizer changed output"
                    );
                }
                clean
            }
        }
    }
}
