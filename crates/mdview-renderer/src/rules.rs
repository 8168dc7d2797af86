//! Named render hooks.
//!
//! The renderer emits HTML for a handful of token kinds through a
//! [`RenderRules`] table instead of writing it directly. Each [`Rule`] can be
//! overridden with a closure; rules without an override use
//! [`RenderRules::render_default`].

use std::collections::HashMap;
use std::fmt;
use std::fmt::Write;
use std::sync::Arc;

use crate::state::escape_html;

/// Signature of a render hook.
pub type RuleFn = dyn Fn(&Token<'_>, &RenderEnv, &mut String) + Send + Sync;

/// Name of a render hook.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rule {
    LinkOpen,
    LinkClose,
    FootnoteRef,
    FootnoteBlockOpen,
    FootnoteBlockClose,
    FootnoteOpen,
    FootnoteClose,
    FootnoteAnchor,
    TaskListMarker,
}

impl Rule {
    /// Every rule, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::LinkOpen,
        Self::LinkClose,
        Self::FootnoteRef,
        Self::FootnoteBlockOpen,
        Self::FootnoteBlockClose,
        Self::FootnoteOpen,
        Self::FootnoteClose,
        Self::FootnoteAnchor,
        Self::TaskListMarker,
    ];

    /// Conventional snake-case name of the rule (e.g. `footnote_ref`).
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::LinkOpen => "link_open",
            Self::LinkClose => "link_close",
            Self::FootnoteRef => "footnote_ref",
            Self::FootnoteBlockOpen => "footnote_block_open",
            Self::FootnoteBlockClose => "footnote_block_close",
            Self::FootnoteOpen => "footnote_open",
            Self::FootnoteClose => "footnote_close",
            Self::FootnoteAnchor => "footnote_anchor",
            Self::TaskListMarker => "task_list_marker",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A footnote reference or backreference position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FootnoteMark<'a> {
    /// Label as written in the source (`[^label]`).
    pub label: &'a str,
    /// 1-based footnote number, in order of first reference.
    pub number: usize,
    /// 0 for the first reference to this footnote, 1 for the second, ...
    pub occurrence: usize,
}

impl FootnoteMark<'_> {
    /// Id of the footnote list item (`fn3`).
    #[must_use]
    pub fn item_id(&self) -> String {
        format!("fn{}", self.number)
    }

    /// Id of the reference marker (`fnref3`, `fnref3:1`).
    #[must_use]
    pub fn ref_id(&self) -> String {
        if self.occurrence == 0 {
            format!("fnref{}", self.number)
        } else {
            format!("fnref{}:{}", self.number, self.occurrence)
        }
    }

    /// Visible caption of the reference marker (`[3]`, `[3:1]`).
    #[must_use]
    pub fn caption(&self) -> String {
        if self.occurrence == 0 {
            format!("[{}]", self.number)
        } else {
            format!("[{}:{}]", self.number, self.occurrence)
        }
    }
}

/// Value handed to a render hook.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Token<'a> {
    LinkOpen { href: &'a str, title: &'a str },
    LinkClose,
    FootnoteRef(FootnoteMark<'a>),
    FootnoteBlockOpen,
    FootnoteBlockClose,
    FootnoteOpen { label: &'a str, number: usize },
    FootnoteClose,
    FootnoteAnchor(FootnoteMark<'a>),
    TaskListMarker { checked: bool },
}

impl Token<'_> {
    /// The rule that renders this token.
    #[must_use]
    pub fn rule(&self) -> Rule {
        match self {
            Self::LinkOpen { .. } => Rule::LinkOpen,
            Self::LinkClose => Rule::LinkClose,
            Self::FootnoteRef(_) => Rule::FootnoteRef,
            Self::FootnoteBlockOpen => Rule::FootnoteBlockOpen,
            Self::FootnoteBlockClose => Rule::FootnoteBlockClose,
            Self::FootnoteOpen { .. } => Rule::FootnoteOpen,
            Self::FootnoteClose => Rule::FootnoteClose,
            Self::FootnoteAnchor(_) => Rule::FootnoteAnchor,
            Self::TaskListMarker { .. } => Rule::TaskListMarker,
        }
    }
}

/// Per-render data available to hooks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderEnv {
    /// Path of the page the HTML will be displayed on (e.g. `/docs/guide`).
    pub page_path: Option<String>,
}

impl RenderEnv {
    /// Environment for a page at `path`.
    #[must_use]
    pub fn for_page(path: impl Into<String>) -> Self {
        Self {
            page_path: Some(path.into()),
        }
    }

    /// Page path with any `#fragment` removed, or `""` when unset.
    #[must_use]
    pub fn page_base(&self) -> &str {
        let path = self.page_path.as_deref().unwrap_or("");
        path.split_once('#').map_or(path, |(base, _)| base)
    }
}

/// Table of render hook overrides.
#[derive(Clone, Default)]
pub struct RenderRules {
    overrides: HashMap<Rule, Arc<RuleFn>>,
}

impl fmt::Debug for RenderRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.overrides.keys().copied().collect();
        names.sort();
        f.debug_struct("RenderRules")
            .field("overrides", &names)
            .finish()
    }
}

impl RenderRules {
    /// Create a table with no overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override `rule`, replacing any previous override.
    pub fn set<F>(&mut self, rule: Rule, hook: F) -> &mut Self
    where
        F: Fn(&Token<'_>, &RenderEnv, &mut String) + Send + Sync + 'static,
    {
        self.overrides.insert(rule, Arc::new(hook));
        self
    }

    /// Drop the override for `rule`. Returns whether one existed.
    pub fn reset(&mut self, rule: Rule) -> bool {
        self.overrides.remove(&rule).is_some()
    }

    #[must_use]
    pub fn is_overridden(&self, rule: Rule) -> bool {
        self.overrides.contains_key(&rule)
    }

    /// Render `token` through its override, or the default when there is none.
    pub fn render(&self, token: &Token<'_>, env: &RenderEnv, out: &mut String) {
        match self.overrides.get(&token.rule()) {
            Some(hook) => hook(token, env, out),
            None => Self::render_default(token, out),
        }
    }

    /// Built-in rendering for `token`.
    ///
    /// Overrides that only need to tweak the default output can call this
    /// and post-process the result.
    pub fn render_default(token: &Token<'_>, out: &mut String) {
        match token {
            Token::LinkOpen { href, title } => {
                write_link_open(href, title, "", out);
            }
            Token::LinkClose => out.push_str("</a>"),
            Token::FootnoteRef(mark) => write_footnote_ref(mark, "", out),
            Token::FootnoteBlockOpen => out.push_str(
                r#"<hr class="footnotes-sep"><section class="footnotes"><ol class="footnotes-list">"#,
            ),
            Token::FootnoteBlockClose => out.push_str("</ol></section>"),
            Token::FootnoteOpen { number, .. } => {
                write!(out, r#"<li id="fn{number}" class="footnote-item">"#).unwrap();
            }
            Token::FootnoteClose => out.push_str("</li>"),
            Token::FootnoteAnchor(mark) => write_footnote_anchor(mark, "", out),
            Token::TaskListMarker { checked } => {
                if *checked {
                    out.push_str(
                        r#"<input class="task-list-item-checkbox" type="checkbox" checked disabled> "#,
                    );
                } else {
                    out.push_str(
                        r#"<input class="task-list-item-checkbox" type="checkbox" disabled> "#,
                    );
                }
            }
        }
    }
}

/// Write `<a href=".." title="..">` followed by `extra_attrs` (raw, must
/// start with a space when non-empty).
pub(crate) fn write_link_open(href: &str, title: &str, extra_attrs: &str, out: &mut String) {
    write!(out, r#"<a href="{}""#, escape_html(href)).unwrap();
    if !title.is_empty() {
        write!(out, r#" title="{}""#, escape_html(title)).unwrap();
    }
    out.push_str(extra_attrs);
    out.push('>');
}

/// Write a footnote reference whose href is `{prefix}#fn{n}`.
pub(crate) fn write_footnote_ref(mark: &FootnoteMark<'_>, prefix: &str, out: &mut String) {
    write!(
        out,
        r##"<sup class="footnote-ref"><a href="{}#{}" id="{}">{}</a></sup>"##,
        escape_html(prefix),
        mark.item_id(),
        escape_html(&mark.ref_id()),
        mark.caption()
    )
    .unwrap();
}

/// Write a footnote backreference whose href is `{prefix}#fnref{n}`.
pub(crate) fn write_footnote_anchor(mark: &FootnoteMark<'_>, prefix: &str, out: &mut String) {
    write!(
        out,
        " <a href=\"{}#{}\" class=\"footnote-backref\">\u{21a9}\u{fe0e}</a>",
        escape_html(prefix),
        escape_html(&mark.ref_id())
    )
    .unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render(rules: &RenderRules, token: &Token<'_>) -> String {
        let mut out = String::new();
        rules.render(token, &RenderEnv::default(), &mut out);
        out
    }

    const FIRST: FootnoteMark<'static> = FootnoteMark {
        label: "note",
        number: 1,
        occurrence: 0,
    };

    const SECOND: FootnoteMark<'static> = FootnoteMark {
        label: "note",
        number: 1,
        occurrence: 1,
    };

    #[test]
    fn test_default_link_open() {
        let rules = RenderRules::new();
        assert_eq!(
            render(
                &rules,
                &Token::LinkOpen {
                    href: "/a?b=1&c=2",
                    title: ""
                }
            ),
            r#"<a href="/a?b=1&amp;c=2">"#
        );
        assert_eq!(
            render(
                &rules,
                &Token::LinkOpen {
                    href: "x",
                    title: "T"
                }
            ),
            r#"<a href="x" title="T">"#
        );
    }

    #[test]
    fn test_default_footnote_ref() {
        let rules = RenderRules::new();
        assert_eq!(
            render(&rules, &Token::FootnoteRef(FIRST)),
            r##"<sup class="footnote-ref"><a href="#fn1" id="fnref1">[1]</a></sup>"##
        );
        assert_eq!(
            render(&rules, &Token::FootnoteRef(SECOND)),
            r##"<sup class="footnote-ref"><a href="#fn1" id="fnref1:1">[1:1]</a></sup>"##
        );
    }

    #[test]
    fn test_default_footnote_anchor() {
        let rules = RenderRules::new();
        assert_eq!(
            render(&rules, &Token::FootnoteAnchor(SECOND)),
            " <a href=\"#fnref1:1\" class=\"footnote-backref\">\u{21a9}\u{fe0e}</a>"
        );
    }

    #[test]
    fn test_default_task_list_marker() {
        let rules = RenderRules::new();
        assert!(render(&rules, &Token::TaskListMarker { checked: true }).contains("checked"));
        assert!(!render(&rules, &Token::TaskListMarker { checked: false }).contains("checked"));
    }

    #[test]
    fn test_override_replaces_default() {
        let mut rules = RenderRules::new();
        rules.set(Rule::LinkClose, |_, _, out| out.push_str("</a><!-- end -->"));
        assert!(rules.is_overridden(Rule::LinkClose));
        assert_eq!(render(&rules, &Token::LinkClose), "</a><!-- end -->");
    }

    #[test]
    fn test_override_sees_env() {
        let mut rules = RenderRules::new();
        rules.set(Rule::FootnoteBlockOpen, |_, env, out| {
            out.push_str(env.page_base());
        });
        let mut out = String::new();
        rules.render(
            &Token::FootnoteBlockOpen,
            &RenderEnv::for_page("/guide#top"),
            &mut out,
        );
        assert_eq!(out, "/guide");
    }

    #[test]
    fn test_reset_restores_default() {
        let mut rules = RenderRules::new();
        rules.set(Rule::LinkClose, |_, _, out| out.push_str("X"));
        assert!(rules.reset(Rule::LinkClose));
        assert!(!rules.reset(Rule::LinkClose));
        assert_eq!(render(&rules, &Token::LinkClose), "</a>");
    }

    #[test]
    fn test_set_twice_keeps_last() {
        let mut rules = RenderRules::new();
        rules
            .set(Rule::LinkClose, |_, _, out| out.push_str("1"))
            .set(Rule::LinkClose, |_, _, out| out.push_str("2"));
        assert_eq!(render(&rules, &Token::LinkClose), "2");
    }

    #[test]
    fn test_token_rule_mapping() {
        assert_eq!(Token::FootnoteRef(FIRST).rule(), Rule::FootnoteRef);
        assert_eq!(Token::FootnoteAnchor(FIRST).rule(), Rule::FootnoteAnchor);
        assert_eq!(
            Token::TaskListMarker { checked: false }.rule(),
            Rule::TaskListMarker
        );
    }

    #[test]
    fn test_rule_names() {
        assert_eq!(Rule::FootnoteRef.to_string(), "footnote_ref");
        assert_eq!(Rule::ALL.len(), 9);
    }

    #[test]
    fn test_page_base_strips_fragment() {
        assert_eq!(RenderEnv::for_page("/docs/guide#intro").page_base(), "/docs/guide");
        assert_eq!(RenderEnv::for_page("/docs/guide").page_base(), "/docs/guide");
        assert_eq!(RenderEnv::default().page_base(), "");
    }

    #[test]
    fn test_debug_lists_overrides() {
        let mut rules = RenderRules::new();
        rules.set(Rule::FootnoteRef, |_, _, _| {});
        assert!(format!("{rules:?}").contains("FootnoteRef"));
    }
}
