//! HTML sanitization for compiled markdown.

use std::borrow::Cow;

use ammonia::Builder;

/// Cleans HTML before it is handed to an untrusted sink.
pub trait HtmlSanitizer: Send + Sync {
    fn sanitize(&self, html: &str) -> String;
}

/// Sanitizer that keeps everything the renderer emits and strips the rest.
///
/// Allowed beyond ammonia's defaults: `target` on links, `id` and `class`
/// everywhere, disabled task list checkboxes, footnote sections and
/// `text-align` styles on table cells. Every link leaves with
/// `rel="noopener noreferrer"`, whatever `rel` the input carried, so a raw
/// `target="_blank"` link cannot reach its opener.
pub struct AmmoniaSanitizer {
    builder: Builder<'static>,
}

impl Default for AmmoniaSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

impl AmmoniaSanitizer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            builder: build_sanitizer(),
        }
    }
}

impl HtmlSanitizer for AmmoniaSanitizer {
    fn sanitize(&self, html: &str) -> String {
        self.builder.clean(html).to_string()
    }
}

fn build_sanitizer() -> Builder<'static> {
    let mut builder = Builder::default();

    builder.add_tags(&["input", "section", "div"]);
    builder.add_generic_attributes(&["id", "class"]);

    builder.link_rel(Some("noopener noreferrer"));
    builder.add_tag_attributes("a", &["target"]);
    builder.add_tag_attributes("img", &["title"]);
    builder.add_tag_attributes("input", &["type", "checked", "disabled"]);
    builder.add_tag_attributes("th", &["style"]);
    builder.add_tag_attributes("td", &["style"]);

    builder.attribute_filter(|element, attribute, value| match (element, attribute) {
        ("th" | "td", "style") => text_align_style(value).map(Cow::Borrowed),
        ("input", "type") => (value == "checkbox").then_some(Cow::Borrowed(value)),
        _ => Some(Cow::Borrowed(value)),
    });

    builder
}

/// Accept only the `text-align` declarations produced for table columns.
fn text_align_style(value: &str) -> Option<&'static str> {
    let (property, align) = value.trim().trim_end_matches(';').split_once(':')?;
    if !property.trim().eq_ignore_ascii_case("text-align") {
        return None;
    }
    match align.trim().to_ascii_lowercase().as_str() {
        "left" => Some("text-align:left"),
        "center" => Some("text-align:center"),
        "right" => Some("text-align:right"),
        _ => None,
    }
}
