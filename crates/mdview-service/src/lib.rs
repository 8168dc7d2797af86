//! Fetch markdown from a remote or local source and compile it to HTML.
//!
//! [`MarkdownService`] combines a [`ContentFetcher`] (HTTP via `ureq`, or the
//! filesystem), a [`mdview_renderer::Markdown`] instance and an
//! [`HtmlSanitizer`]. Fetch failures are normalized into [`FetchError`],
//! whose `Display` is the message shown to users.

mod error;
mod fetch;
mod sanitize;
mod service;

pub use error::FetchError;
pub use fetch::{ContentFetcher, FileFetcher, HttpFetcher};
pub use sanitize::{AmmoniaSanitizer, HtmlSanitizer};
pub use service::{MarkdownService, SecurityContext};
