//! Long-lived renderer instance: options, rule table and loaded plugins.

use std::sync::Arc;

use tracing::debug;

use crate::options::{OptionOverrides, RenderOptions};
use crate::plugin::{ExternalLinks, PageFootnotes, Plugin};
use crate::renderer::{MarkdownRenderer, RenderResult};
use crate::rules::{RenderEnv, RenderRules};

/// Markdown to HTML converter owned by a host.
///
/// Holds the option record and the [`RenderRules`] table. Each call to
/// [`compile`](Self::compile) runs a fresh [`MarkdownRenderer`] against them,
/// so the instance itself is only mutated through `&mut self` configuration
/// methods.
///
/// # Example
///
/// ```
/// use mdview_renderer::{Markdown, RenderEnv};
///
/// let md = Markdown::new();
/// let html = md.compile("**bold**");
/// assert_eq!(html, "<p><strong>bold</strong></p>");
///
/// let html = md.compile_with_env("Note[^1]\n\n[^1]: Text", &RenderEnv::for_page("/guide"));
/// assert!(html.contains(r#"href="/guide#fn1""#));
/// ```
#[derive(Debug)]
pub struct Markdown {
    options: RenderOptions,
    rules: Arc<RenderRules>,
    plugins: Vec<&'static str>,
    env: RenderEnv,
}

impl Default for Markdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Markdown {
    /// Create an instance with default options and the built-in overrides
    /// ([`ExternalLinks`], [`PageFootnotes`]) installed.
    #[must_use]
    pub fn new() -> Self {
        let mut md = Self::bare();
        md.load_plugin(ExternalLinks::default())
            .load_plugin(PageFootnotes);
        md
    }

    /// Create an instance with default options and no rule overrides.
    #[must_use]
    pub fn bare() -> Self {
        Self {
            options: RenderOptions::default(),
            rules: Arc::new(RenderRules::new()),
            plugins: Vec::new(),
            env: RenderEnv::default(),
        }
    }

    /// [`new`](Self::new) followed by [`set_options`](Self::set_options).
    #[must_use]
    pub fn with_options(overrides: &OptionOverrides) -> Self {
        let mut md = Self::new();
        md.set_options(overrides);
        md
    }

    /// Replace the options with the defaults merged with `overrides`.
    ///
    /// Options are recomputed from the defaults on every call; earlier
    /// overrides do not accumulate.
    pub fn set_options(&mut self, overrides: &OptionOverrides) -> &mut Self {
        self.options = RenderOptions::default().merge(overrides);
        debug!(options = ?self.options, "Render options updated");
        self
    }

    /// Current effective options.
    #[must_use]
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Set the page path used by [`compile`](Self::compile).
    pub fn set_page_path(&mut self, path: Option<String>) -> &mut Self {
        self.env.page_path = path;
        self
    }

    /// Environment used by [`compile`](Self::compile).
    #[must_use]
    pub fn env(&self) -> &RenderEnv {
        &self.env
    }

    /// Load a plugin and return `self` for chaining.
    ///
    /// Loading a plugin again re-applies it; its name is recorded once.
    pub fn load_plugin<P: Plugin>(&mut self, plugin: P) -> &mut Self {
        let name = plugin.name();
        plugin.install(self);
        if !self.plugins.contains(&name) {
            self.plugins.push(name);
        }
        debug!(plugin = name, "Plugin loaded");
        self
    }

    /// Names of loaded plugins, in load order.
    #[must_use]
    pub fn plugins(&self) -> &[&'static str] {
        &self.plugins
    }

    #[must_use]
    pub fn rules(&self) -> &RenderRules {
        &self.rules
    }

    /// Mutable access to the rule table for direct overrides.
    pub fn rules_mut(&mut self) -> &mut RenderRules {
        Arc::make_mut(&mut self.rules)
    }

    /// Convert markdown to HTML using the instance's page path.
    ///
    /// The output is not sanitized beyond what the `sanitize` option does.
    #[must_use]
    pub fn compile(&self, markdown: &str) -> String {
        self.render(markdown, &self.env).html
    }

    /// Convert markdown to HTML for the page described by `env`.
    #[must_use]
    pub fn compile_with_env(&self, markdown: &str, env: &RenderEnv) -> String {
        self.render(markdown, env).html
    }

    /// Convert markdown and also return the title and table of contents.
    #[must_use]
    pub fn render(&self, markdown: &str, env: &RenderEnv) -> RenderResult {
        debug!(
            bytes = markdown.len(),
            page_path = env.page_path.as_deref(),
            "Compiling markdown"
        );
        MarkdownRenderer::new()
            .with_title_extraction()
            .with_options(self.options)
            .with_rules(Arc::clone(&self.rules))
            .with_env(env.clone())
            .render_markdown(markdown)
    }
}
