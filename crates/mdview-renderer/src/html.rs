//! HTML markup for code blocks, alerts and images.

use std::fmt::Write;

use pulldown_cmark::BlockQuoteKind;

use crate::state::escape_html;

/// GitHub-style alert kind (`> [!NOTE]`, `> [!TIP]`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AlertKind {
    Note,
    Tip,
    Important,
    Warning,
    Caution,
}

impl AlertKind {
    fn class(self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Tip => "tip",
            Self::Important => "important",
            Self::Warning => "warning",
            Self::Caution => "caution",
        }
    }

    fn title(self) -> &'static str {
        match self {
            Self::Note => "Note",
            Self::Tip => "Tip",
            Self::Important => "Important",
            Self::Warning => "Warning",
            Self::Caution => "Caution",
        }
    }
}

impl From<BlockQuoteKind> for AlertKind {
    fn from(kind: BlockQuoteKind) -> Self {
        match kind {
            BlockQuoteKind::Note => Self::Note,
            BlockQuoteKind::Tip => Self::Tip,
            BlockQuoteKind::Important => Self::Important,
            BlockQuoteKind::Warning => Self::Warning,
            BlockQuoteKind::Caution => Self::Caution,
        }
    }
}

/// Append ` name="value"` with the value escaped.
fn push_attr(out: &mut String, name: &str, value: &str) {
    write!(out, r#" {name}="{}""#, escape_html(value)).unwrap();
}

/// `<pre><code>` with a `language-*` class when the fence names one.
pub(crate) fn code_block(lang: Option<&str>, content: &str, out: &mut String) {
    out.push_str("<pre><code");
    if let Some(lang) = lang {
        push_attr(out, "class", &format!("language-{lang}"));
    }
    write!(out, ">{}</code></pre>", escape_html(content)).unwrap();
}

/// Open a `markdown-alert` container and write its title paragraph.
pub(crate) fn alert_start(kind: AlertKind, out: &mut String) {
    write!(
        out,
        r#"<div class="markdown-alert markdown-alert-{}"><p class="markdown-alert-title">{}</p>"#,
        kind.class(),
        kind.title()
    )
    .unwrap();
}

pub(crate) fn image(src: &str, alt: &str, title: &str, out: &mut String) {
    out.push_str("<img");
    push_attr(out, "src", src);
    push_attr(out, "alt", alt);
    if !title.is_empty() {
        push_attr(out, "title", title);
    }
    out.push('>');
}
