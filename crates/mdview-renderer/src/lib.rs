//! Markdown to HTML renderer with named render hooks and plugins.
//!
//! This crate provides [`Markdown`], a long-lived converter that owns an
//! option record and a table of render hooks, and [`MarkdownRenderer`], the
//! per-document event walker it drives.
//!
//! # Architecture
//!
//! - [`RenderRules`]: named hooks ([`Rule`]) for links, footnotes and task list
//!   markers, overridable at runtime
//! - [`Plugin`]: bundles of rule overrides, loaded with [`Markdown::load_plugin`]
//!
//! Tokenization is done by `pulldown-cmark`.
//!
//! # Example
//!
//! ```
//! use mdview_renderer::Markdown;
//!
//! let md = Markdown::new();
//! let html = md.compile("[Rust](https://www.rust-lang.org)");
//! assert!(html.contains(r#"target="_blank""#));
//! ```

mod html;
mod markdown;
mod options;
mod plugin;
mod renderer;
mod rules;
mod state;
mod util;

pub use markdown::Markdown;
pub use options::{OptionOverrides, RenderOptions};
pub use plugin::{ExternalLinks, PageFootnotes, Plugin};
pub use renderer::{MarkdownRenderer, RenderResult};
pub use rules::{FootnoteMark, RenderEnv, RenderRules, Rule, RuleFn, Token};
pub use state::{TocEntry, escape_html, slugify};
pub use util::is_external_url;
