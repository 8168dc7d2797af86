//! Plugins extend a [`Markdown`] instance by installing rule overrides or
//! adjusting its options.
//!
//! Two plugins ship with the crate and are loaded by [`Markdown::new`]:
//! - [`ExternalLinks`]: external links open in a new browsing context
//! - [`PageFootnotes`]: footnote anchors are scoped to the current page path

use crate::markdown::Markdown;
use crate::rules::{
    RenderRules, Rule, Token, write_footnote_anchor, write_footnote_ref, write_link_open,
};
use crate::state::escape_html;
use crate::util::is_external_url;

/// Extension loaded with [`Markdown::load_plugin`].
///
/// Installing a plugin twice must leave the instance in the same state as
/// installing it once. Rule overrides replace each other, so plugins that
/// only call [`RenderRules::set`] get this for free.
pub trait Plugin {
    /// Stable name, recorded in [`Markdown::plugins`].
    fn name(&self) -> &'static str;

    /// Apply the plugin to `md`.
    fn install(&self, md: &mut Markdown);
}

/// Adds `target` and `rel` attributes to links pointing off-site.
#[derive(Clone, Debug)]
pub struct ExternalLinks {
    target: String,
    rel: Option<String>,
}

impl Default for ExternalLinks {
    fn default() -> Self {
        Self {
            target: "_blank".to_owned(),
            rel: Some("noopener noreferrer".to_owned()),
        }
    }
}

impl ExternalLinks {
    /// Use `target` instead of `_blank`.
    #[must_use]
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    /// Use `rel` instead of `noopener noreferrer`; `None` omits the attribute.
    #[must_use]
    pub fn rel(mut self, rel: Option<String>) -> Self {
        self.rel = rel;
        self
    }

    fn extra_attrs(&self) -> String {
        let mut attrs = format!(r#" target="{}""#, escape_html(&self.target));
        if let Some(rel) = &self.rel {
            attrs.push_str(&format!(r#" rel="{}""#, escape_html(rel)));
        }
        attrs
    }
}

impl Plugin for ExternalLinks {
    fn name(&self) -> &'static str {
        "external-links"
    }

    fn install(&self, md: &mut Markdown) {
        let extra = self.extra_attrs();
        md.rules_mut().set(Rule::LinkOpen, move |token, _env, out| {
            match token {
                Token::LinkOpen { href, title } if is_external_url(href) => {
                    write_link_open(href, title, &extra, out);
                }
                _ => RenderRules::render_default(token, out),
            }
        });
    }
}

/// Prefixes footnote reference and backreference hrefs with the page path.
///
/// Under client-side routing a bare `#fn1` resolves against the document base
/// URL rather than the current route, so the anchors carry the route
/// explicitly: `/docs/guide#fn1`. Any fragment on the page path is dropped.
#[derive(Clone, Copy, Debug, Default)]
pub struct PageFootnotes;

impl Plugin for PageFootnotes {
    fn name(&self) -> &'static str {
        "page-footnotes"
    }

    fn install(&self, md: &mut Markdown) {
        md.rules_mut()
            .set(Rule::FootnoteRef, |token, env, out| match token {
                Token::FootnoteRef(mark) => write_footnote_ref(mark, env.page_base(), out),
                _ => RenderRules::render_default(token, out),
            })
            .set(Rule::FootnoteAnchor, |token, env, out| match token {
                Token::FootnoteAnchor(mark) => {
                    write_footnote_anchor(mark, env.page_base(), out);
                }
                _ => RenderRules::render_default(token, out),
            });
    }
}
