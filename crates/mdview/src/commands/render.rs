//! `mdview render` command implementation.

use std::path::PathBuf;

use clap::Args;
use mdview_config::{Config, FetchConfig};
use mdview_renderer::Markdown;
use mdview_service::{FetchError, FileFetcher, HttpFetcher, MarkdownService};
use tracing::info;

use super::{RenderFlags, write_html};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// URL or path of the markdown document.
    locator: String,

    /// Path to configuration file (default: auto-discover mdview.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL relative locators are resolved against (overrides config).
    #[arg(long, env = "MDVIEW_BASE_URL")]
    base_url: Option<String>,

    /// Read the locator from the local content root instead of over HTTP.
    #[arg(long)]
    local: bool,

    /// Root directory for local content (overrides config).
    #[arg(long)]
    root_dir: Option<PathBuf>,

    /// Request timeout in seconds (overrides config).
    #[arg(long)]
    timeout: Option<u64>,

    #[command(flatten)]
    flags: RenderFlags,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid or the fetch fails.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let mut cli_settings = self.flags.cli_settings();
        cli_settings.base_url = self.base_url;
        cli_settings.root_dir = self.root_dir;
        cli_settings.timeout_secs = self.timeout;

        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let markdown = Markdown::with_options(&config.render.options);
        let fetch = &config.fetch_resolved;

        let service = if use_local(&self.locator, self.local, fetch) {
            info!(root = %fetch.root_dir.display(), "Reading local content");
            MarkdownService::with_markdown(markdown, FileFetcher::new(&fetch.root_dir))
        } else {
            MarkdownService::with_markdown(markdown, http_fetcher(fetch)?)
        };

        let page_path = config.render.page_path.as_deref();
        let html = if self.flags.raw {
            output.warning("Output is not sanitized");
            let text = service.get_content(&self.locator).await?;
            service.compile_for_page(&text, page_path)
        } else {
            service.render_remote(&self.locator, page_path).await?
        };

        if self.verbose {
            output.info(&format!("Rendered {} ({} bytes)", self.locator, html.len()));
        }
        write_html(&html)
    }
}

/// Whether the locator should be read from disk rather than over HTTP.
///
/// Absolute http(s) URLs always go over HTTP; other locators do too when a
/// base URL is configured.
fn use_local(locator: &str, local: bool, fetch: &FetchConfig) -> bool {
    if local {
        return true;
    }
    let absolute = locator.starts_with("http://") || locator.starts_with("https://");
    !absolute && fetch.base_url.is_none()
}

/// Build an HTTP fetcher from the resolved fetch configuration.
fn http_fetcher(fetch: &FetchConfig) -> Result<HttpFetcher, FetchError> {
    let mut fetcher = HttpFetcher::new();
    if let Some(base_url) = &fetch.base_url {
        fetcher = fetcher.with_base_url(base_url)?;
    }
    if let Some(timeout) = fetch.timeout {
        fetcher = fetcher.with_timeout(timeout);
    }
    if let Some(user_agent) = &fetch.user_agent {
        fetcher = fetcher.with_user_agent(user_agent.clone());
    }
    Ok(fetcher)
}
