//! Event walker turning pulldown-cmark events into HTML.

use std::fmt::Write;
use std::sync::Arc;

use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag, TagEnd};

use crate::html::{self, AlertKind};
use crate::options::RenderOptions;
use crate::rules::{FootnoteMark, RenderEnv, RenderRules, Token};
use crate::state::{
    CodeBlockState, FootnoteState, HeadingState, ImageState, TableState, TocEntry, escape_html,
};
use crate::util::heading_level_to_num;

/// Result of rendering markdown.
#[derive(Clone, Debug)]
pub struct RenderResult {
    /// Rendered HTML.
    pub html: String,
    /// Title extracted from first H1 heading (if title extraction was enabled).
    pub title: Option<String>,
    /// Table of contents entries.
    pub toc: Vec<TocEntry>,
}

/// Per-document markdown to HTML renderer.
///
/// Links, footnotes and task list markers go through the [`RenderRules`]
/// table so hosts can override them; everything else is fixed markup.
///
/// A renderer holds per-document state and is meant to render one document.
pub struct MarkdownRenderer {
    output: String,
    code: CodeBlockState,
    table: TableState,
    image: ImageState,
    heading: HeadingState,
    footnotes: FootnoteState,
    pending_image: Option<(String, String)>,
    options: RenderOptions,
    rules: Arc<RenderRules>,
    env: RenderEnv,
    /// Open blockquotes, innermost last; `true` for GFM alerts.
    quote_stack: Vec<bool>,
}

impl MarkdownRenderer {
    /// Create a new renderer with default options and no rule overrides.
    #[must_use]
    pub fn new() -> Self {
        Self {
            output: String::with_capacity(4096),
            code: CodeBlockState::default(),
            table: TableState::default(),
            image: ImageState::default(),
            heading: HeadingState::new(false),
            footnotes: FootnoteState::default(),
            pending_image: None,
            options: RenderOptions::default(),
            rules: Arc::new(RenderRules::default()),
            env: RenderEnv::default(),
            quote_stack: Vec::new(),
        }
    }

    /// Enable title extraction from first H1 heading.
    ///
    /// The H1 is still rendered, but is left out of the table of contents.
    #[must_use]
    pub fn with_title_extraction(mut self) -> Self {
        self.heading = HeadingState::new(true);
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    /// Use `rules` for hookable tokens.
    #[must_use]
    pub fn with_rules(mut self, rules: Arc<RenderRules>) -> Self {
        self.rules = rules;
        self
    }

    /// Set the environment passed to render hooks.
    #[must_use]
    pub fn with_env(mut self, env: RenderEnv) -> Self {
        self.env = env;
        self
    }

    /// Create a configured parser for the given markdown text.
    #[must_use]
    pub fn create_parser<'a>(&self, markdown: &'a str) -> Parser<'a> {
        Parser::new_ext(markdown, self.options.parser_options())
    }

    /// Render markdown text directly using configured parser options.
    pub fn render_markdown(&mut self, markdown: &str) -> RenderResult {
        self.render(self.create_parser(markdown))
    }

    /// Render markdown events and return the result.
    pub fn render<'a, I>(&mut self, events: I) -> RenderResult
    where
        I: Iterator<Item = Event<'a>>,
    {
        let events: Vec<_> = events.collect();
        self.footnotes.plan(&events);
        for event in events {
            self.process_event(event);
        }

        self.write_footnotes();

        RenderResult {
            html: std::mem::take(&mut self.output),
            title: self.heading.take_title(),
            toc: self.heading.take_toc(),
        }
    }

    /// Push content to output or heading buffer based on context.
    fn push_inline(&mut self, content: &str) {
        // Alt text is plain text; markup inside an image is dropped
        if self.image.is_active() {
            return;
        }
        if self.heading.is_active() {
            self.heading.push_html(content);
        } else {
            self.output.push_str(content);
        }
    }

    /// Render a hookable token inline.
    fn push_token(&mut self, token: &Token<'_>) {
        let mut html = String::new();
        self.rules.render(token, &self.env, &mut html);
        self.push_inline(&html);
    }

    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.inline_code(&code),
            Event::Html(html) | Event::InlineHtml(html) => self.raw_html(&html),
            Event::SoftBreak => self.soft_break(),
            Event::HardBreak => self.hard_break(),
            Event::Rule => self.output.push_str("<hr>"),
            Event::TaskListMarker(checked) => {
                self.push_token(&Token::TaskListMarker { checked });
            }
            Event::FootnoteReference(label) => self.footnote_reference(&label),
            Event::InlineMath(_) | Event::DisplayMath(_) => {
                // Not enabled in parser options
            }
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                if !self.code.is_active() {
                    self.output.push_str("<p>");
                }
            }
            Tag::Heading { level, .. } => {
                // Opening tag is written in end_tag once the ID is known
                self.heading.start_heading(heading_level_to_num(level));
            }
            Tag::BlockQuote(kind) => {
                if let Some(kind) = kind {
                    html::alert_start(AlertKind::from(kind), &mut self.output);
                } else {
                    self.output.push_str("<blockquote>");
                }
                self.quote_stack.push(kind.is_some());
            }
            Tag::CodeBlock(kind) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(ref info) => info
                        .split_whitespace()
                        .next()
                        .map(ToOwned::to_owned),
                    CodeBlockKind::Indented => None,
                };
                self.code.start(lang);
            }
            Tag::List(start) => match start {
                Some(1) => self.output.push_str("<ol>"),
                Some(n) => write!(self.output, r#"<ol start="{n}">"#).unwrap(),
                None => self.output.push_str("<ul>"),
            },
            Tag::Item => self.output.push_str("<li>"),
            Tag::FootnoteDefinition(label) => {
                let outer = std::mem::take(&mut self.output);
                self.footnotes.start_definition(&label, outer);
            }
            Tag::HtmlBlock | Tag::MetadataBlock(_) => {}
            Tag::DefinitionList => self.output.push_str("<dl>"),
            Tag::DefinitionListTitle => self.output.push_str("<dt>"),
            Tag::DefinitionListDefinition => self.output.push_str("<dd>"),
            Tag::Table(alignments) => {
                self.table.start(alignments);
                self.output.push_str("<table>");
            }
            Tag::TableHead => {
                self.table.start_head();
                self.output.push_str("<thead><tr>");
            }
            Tag::TableRow => {
                self.table.start_row();
                self.output.push_str("<tr>");
            }
            Tag::TableCell => {
                let align = self.table.current_alignment_style();
                let tag = if self.table.is_in_head() { "th" } else { "td" };
                write!(self.output, "<{tag}{align}>").unwrap();
            }
            Tag::Emphasis => self.push_inline("<em>"),
            Tag::Strong => self.push_inline("<strong>"),
            Tag::Strikethrough => self.push_inline("<s>"),
            Tag::Link {
                dest_url, title, ..
            } => {
                self.push_token(&Token::LinkOpen {
                    href: &dest_url,
                    title: &title,
                });
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                // Alt text is collected until the end tag
                self.image.start();
                self.pending_image = Some((dest_url.to_string(), title.to_string()));
            }
            Tag::Superscript => self.push_inline("<sup>"),
            Tag::Subscript => self.push_inline("<sub>"),
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                if !self.code.is_active() {
                    self.output.push_str("</p>");
                }
            }
            TagEnd::Heading(_level) => {
                if let Some((level, id, html)) = self.heading.complete_heading() {
                    write!(
                        self.output,
                        r#"<h{level} id="{id}">{}</h{level}>"#,
                        html.trim()
                    )
                    .unwrap();
                }
            }
            TagEnd::BlockQuote(_) => {
                let is_alert = self.quote_stack.pop().unwrap_or(false);
                self.output
                    .push_str(if is_alert { "</div>" } else { "</blockquote>" });
            }
            TagEnd::CodeBlock => {
                let (lang, content) = self.code.end();
                html::code_block(lang.as_deref(), &content, &mut self.output);
            }
            TagEnd::List(ordered) => {
                self.output
                    .push_str(if ordered { "</ol>" } else { "</ul>" });
            }
            TagEnd::Item => self.output.push_str("</li>"),
            TagEnd::FootnoteDefinition => {
                if self.footnotes.is_capturing() {
                    let body = std::mem::take(&mut self.output);
                    self.output = self.footnotes.end_definition(body);
                }
            }
            TagEnd::HtmlBlock | TagEnd::MetadataBlock(_) => {}
            TagEnd::Image => {
                let alt = self.image.end();
                if let Some((src, title)) = self.pending_image.take() {
                    let mut markup = String::new();
                    html::image(&src, &alt, &title, &mut markup);
                    self.push_inline(&markup);
                }
            }
            TagEnd::DefinitionList => self.output.push_str("</dl>"),
            TagEnd::DefinitionListTitle => self.output.push_str("</dt>"),
            TagEnd::DefinitionListDefinition => self.output.push_str("</dd>"),
            TagEnd::Table => self.output.push_str("</tbody></table>"),
            TagEnd::TableHead => {
                self.output.push_str("</tr></thead><tbody>");
                self.table.end_head();
            }
            TagEnd::TableRow => self.output.push_str("</tr>"),
            TagEnd::TableCell => {
                self.output.push_str(if self.table.is_in_head() {
                    "</th>"
                } else {
                    "</td>"
                });
                self.table.next_cell();
            }
            TagEnd::Emphasis => self.push_inline("</em>"),
            TagEnd::Strong => self.push_inline("</strong>"),
            TagEnd::Strikethrough => self.push_inline("</s>"),
            TagEnd::Link => self.push_token(&Token::LinkClose),
            TagEnd::Superscript => self.push_inline("</sup>"),
            TagEnd::Subscript => self.push_inline("</sub>"),
        }
    }

    fn text(&mut self, text: &str) {
        if self.code.is_active() {
            self.code.push_str(text);
        } else if self.image.is_active() {
            self.image.push_str(text);
        } else if self.heading.is_active() {
            self.heading.push_text(text);
            self.heading.push_html(&escape_html(text));
        } else {
            self.output.push_str(&escape_html(text));
        }
    }

    fn inline_code(&mut self, code: &str) {
        if self.image.is_active() {
            self.image.push_str(code);
            return;
        }
        if self.heading.is_active() {
            self.heading.push_text(code);
        }
        self.push_inline(&format!("<code>{}</code>", escape_html(code)));
    }

    fn raw_html(&mut self, html: &str) {
        if self.options.sanitize {
            let escaped = escape_html(html);
            self.push_inline(&escaped);
        } else {
            self.push_inline(html);
        }
    }

    fn soft_break(&mut self) {
        if self.code.is_active() {
            self.code.push_newline();
        } else if self.image.is_active() {
            self.image.push_str(" ");
        } else if self.heading.is_active() {
            self.heading.push_text(" ");
            self.heading.push_html("\n");
        } else if self.options.hard_soft_breaks() {
            self.output.push_str("<br>\n");
        } else {
            self.output.push('\n');
        }
    }

    fn hard_break(&mut self) {
        self.push_inline("<br>");
    }

    fn footnote_reference(&mut self, label: &str) {
        let Some((number, occurrence)) = self.footnotes.reference(label) else {
            return;
        };
        self.push_token(&Token::FootnoteRef(FootnoteMark {
            label,
            number,
            occurrence,
        }));
    }

    /// Append the collected footnotes, with one backreference per reference.
    fn write_footnotes(&mut self) {
        let notes = self.footnotes.take_collected();
        if notes.is_empty() {
            return;
        }

        let rules = Arc::clone(&self.rules);
        let out = &mut self.output;
        rules.render(&Token::FootnoteBlockOpen, &self.env, out);
        for note in &notes {
            rules.render(
                &Token::FootnoteOpen {
                    label: &note.label,
                    number: note.number,
                },
                &self.env,
                out,
            );

            let mut anchors = String::new();
            for occurrence in 0..note.references {
                let mark = FootnoteMark {
                    label: &note.label,
                    number: note.number,
                    occurrence,
                };
                rules.render(&Token::FootnoteAnchor(mark), &self.env, &mut anchors);
            }

            // Backreferences go inside the last paragraph when there is one
            match note.body.strip_suffix("</p>") {
                Some(body) => {
                    out.push_str(body);
                    out.push_str(&anchors);
                    out.push_str("</p>");
                }
                None => {
                    out.push_str(&note.body);
                    out.push_str(&anchors);
                }
            }

            rules.render(&Token::FootnoteClose, &self.env, out);
        }
        rules.render(&Token::FootnoteBlockClose, &self.env, out);
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Rule;
    use pretty_assertions::assert_eq;

    fn render_html(markdown: &str) -> RenderResult {
        MarkdownRenderer::new().render_markdown(markdown)
    }

    fn render_with(options: RenderOptions, markdown: &str) -> RenderResult {
        MarkdownRenderer::new()
            .with_options(options)
            .render_markdown(markdown)
    }

    #[test]
    fn test_basic_paragraph() {
        assert_eq!(render_html("Hello, world!").html, "<p>Hello, world!</p>");
    }

    #[test]
    fn test_heading_with_id() {
        let result = render_html("## Section Title");
        assert_eq!(result.html, r#"<h2 id="section-title">Section Title</h2>"#);
        assert_eq!(result.toc.len(), 1);
        assert_eq!(result.toc[0].title, "Section Title");
    }

    #[test]
    fn test_title_extraction() {
        let result = MarkdownRenderer::new()
            .with_title_extraction()
            .render_markdown("# My Title\n\n## Section");
        assert_eq!(result.title, Some("My Title".to_owned()));
        assert!(result.html.contains(r#"<h1 id="my-title">My Title</h1>"#));
        assert_eq!(result.toc.len(), 1);
    }

    #[test]
    fn test_heading_with_inline_code() {
        let result = render_html("## Install `npm`");
        assert!(result.html.contains("<code>npm</code>"));
        assert_eq!(result.toc[0].title, "Install npm");
    }

    #[test]
    fn test_emphasis() {
        let result = render_html("*italic* and **bold**");
        assert!(result.html.contains("<em>italic</em>"));
        assert!(result.html.contains("<strong>bold</strong>"));
    }

    #[test]
    fn test_code_block() {
        let result = render_html("```rust ignore\nfn main() {}\n```");
        assert_eq!(
            result.html,
            "<pre><code class=\"language-rust\">fn main() {}\n</code></pre>"
        );
    }

    #[test]
    fn test_lists() {
        let result = render_html("- Item 1\n- Item 2");
        assert_eq!(result.html, "<ul><li>Item 1</li><li>Item 2</li></ul>");

        let result = render_html("3. Third\n4. Fourth");
        assert!(result.html.starts_with(r#"<ol start="3">"#));
        assert!(result.html.ends_with("</ol>"));
    }

    #[test]
    fn test_table() {
        let result = render_html("| A | B |\n|:--|---|\n| 1 | 2 |");
        assert_eq!(
            result.html,
            r#"<table><thead><tr><th style="text-align:left">A</th><th>B</th></tr></thead><tbody><tr><td style="text-align:left">1</td><td>2</td></tr></tbody></table>"#
        );
    }

    #[test]
    fn test_tables_disabled_without_gfm() {
        let options = RenderOptions {
            gfm: false,
            ..RenderOptions::default()
        };
        let result = render_with(options, "| A | B |\n|---|---|\n| 1 | 2 |");
        assert!(!result.html.contains("<table>"));
    }

    #[test]
    fn test_tables_flag() {
        let options = RenderOptions {
            tables: false,
            ..RenderOptions::default()
        };
        let result = render_with(options, "| A | B |\n|---|---|\n| 1 | 2 |");
        assert!(!result.html.contains("<table>"));
        // Strikethrough still works with gfm on
        assert!(render_with(options, "~~x~~").html.contains("<s>x</s>"));
    }

    #[test]
    fn test_alert() {
        let result = render_html("> [!NOTE]\n> This is a **note**.");
        assert!(result.html.contains("markdown-alert-note"));
        assert!(result.html.contains("<strong>note</strong>"));
    }

    #[test]
    fn test_regular_blockquote() {
        let result = render_html("> Just a quote");
        assert_eq!(result.html, "<blockquote><p>Just a quote</p></blockquote>");
    }

    #[test]
    fn test_image() {
        let result = render_html("![Alt *text*](image.png)");
        assert_eq!(result.html, r#"<p><img src="image.png" alt="Alt text"></p>"#);
    }

    #[test]
    fn test_soft_break_default() {
        assert_eq!(render_html("a\nb").html, "<p>a\nb</p>");
    }

    #[test]
    fn test_breaks_option() {
        let options = RenderOptions {
            breaks: true,
            ..RenderOptions::default()
        };
        assert_eq!(render_with(options, "a\nb").html, "<p>a<br>\nb</p>");
    }

    #[test]
    fn test_hard_break() {
        assert_eq!(render_html("a  \nb").html, "<p>a<br>b</p>");
    }

    #[test]
    fn test_raw_html_passthrough() {
        let result = render_html("<span>hi</span>");
        assert!(result.html.contains("<span>hi</span>"));
    }

    #[test]
    fn test_sanitize_option_escapes_raw_html() {
        let options = RenderOptions {
            sanitize: true,
            ..RenderOptions::default()
        };
        let result = render_with(options, "<script>alert(1)</script>\n\ntext <b>x</b>");
        assert!(!result.html.contains("<script>"));
        assert!(result.html.contains("&lt;script&gt;"));
        assert!(result.html.contains("&lt;b&gt;"));
    }

    #[test]
    fn test_smartypants() {
        let options = RenderOptions {
            smartypants: true,
            ..RenderOptions::default()
        };
        let result = render_with(options, "\"quoted\" -- dash");
        assert!(result.html.contains('\u{201c}'));
        assert!(result.html.contains('\u{2013}'));
    }

    #[test]
    fn test_task_list() {
        let result = render_html("- [ ] Todo\n- [x] Done");
        assert!(
            result
                .html
                .contains(r#"<input class="task-list-item-checkbox" type="checkbox" disabled> Todo"#)
        );
        assert!(result.html.contains("checked disabled> Done"));
    }

    #[test]
    fn test_link_default_rule() {
        let result = render_html("[x](http://e.com \"T\")");
        assert_eq!(result.html, r#"<p><a href="http://e.com" title="T">x</a></p>"#);
    }

    #[test]
    fn test_link_in_heading_goes_to_heading() {
        let result = render_html("## See [docs](/docs)");
        assert_eq!(
            result.html,
            r#"<h2 id="see-docs">See <a href="/docs">docs</a></h2>"#
        );
    }

    #[test]
    fn test_rule_override_applies() {
        let mut rules = RenderRules::new();
        rules.set(Rule::LinkOpen, |token, _, out| {
            if let Token::LinkOpen { href, .. } = token {
                write!(out, r#"<a data-x href="{href}">"#).unwrap();
            }
        });
        let result = MarkdownRenderer::new()
            .with_rules(Arc::new(rules))
            .render_markdown("[a](b)");
        assert_eq!(result.html, r#"<p><a data-x href="b">a</a></p>"#);
    }

    #[test]
    fn test_footnotes_collected_at_end() {
        let result = render_html("Text[^a].\n\n[^a]: The note.\n\nAfter.");
        assert_eq!(
            result.html,
            concat!(
                r##"<p>Text<sup class="footnote-ref"><a href="#fn1" id="fnref1">[1]</a></sup>.</p>"##,
                "<p>After.</p>",
                r#"<hr class="footnotes-sep"><section class="footnotes"><ol class="footnotes-list">"#,
                r#"<li id="fn1" class="footnote-item"><p>The note."#,
                " <a href=\"#fnref1\" class=\"footnote-backref\">\u{21a9}\u{fe0e}</a></p></li>",
                "</ol></section>"
            )
        );
    }

    #[test]
    fn test_footnotes_numbered_by_first_reference() {
        let markdown = "[^b]: Bee.\n\n[^a]: Ay.\n\nOne[^a] two[^b] three[^a].";
        let result = render_html(markdown);
        let html = &result.html;

        assert!(html.contains(r##"<a href="#fn1" id="fnref1">[1]</a>"##));
        assert!(html.contains(r##"<a href="#fn2" id="fnref2">[2]</a>"##));
        assert!(html.contains(r##"<a href="#fn1" id="fnref1:1">[1:1]</a>"##));

        // Ay (fn1) is listed before Bee (fn2)
        let ay = html.find(r#"<li id="fn1""#).unwrap();
        let bee = html.find(r#"<li id="fn2""#).unwrap();
        assert!(ay < bee);
        assert!(html[ay..bee].contains("Ay."));

        // Two backreferences for the twice-referenced note
        assert!(html.contains(r##"href="#fnref1""##));
        assert!(html.contains(r##"href="#fnref1:1""##));
    }

    #[test]
    fn test_unreferenced_footnote_dropped() {
        let result = render_html("Body.\n\n[^x]: Never used.");
        assert_eq!(result.html, "<p>Body.</p>");
    }

    #[test]
    fn test_footnote_only_referenced_from_dropped_definition() {
        let result = render_html("Text[^a].\n\n[^a]: A.\n\n[^b]: see[^c].\n\n[^c]: C.");
        let html = &result.html;
        assert!(html.contains(r#"<li id="fn1" class="footnote-item"><p>A."#));
        assert!(!html.contains(r#"id="fn2""#));
        assert!(!html.contains("#fnref2"));
        assert!(!html.contains("C."));
    }

    #[test]
    fn test_nested_footnote_reachable_through_definition() {
        let result = render_html("[^b]: see[^c].\n\n[^c]: C.\n\nOne[^a] two[^b].\n\n[^a]: A.");
        let html = &result.html;

        // Body references first, then the one inside [^b]
        assert!(html.contains(r##"<a href="#fn1" id="fnref1">[1]</a></sup> two"##));
        assert!(
            html.contains(r##"see<sup class="footnote-ref"><a href="#fn3" id="fnref3">[3]</a>"##)
        );

        // Every backreference points at an id that exists
        for n in 1..=3 {
            assert!(html.contains(&format!(r##"href="#fnref{n}""##)), "{n}");
            assert!(html.contains(&format!(r#"id="fnref{n}""#)), "{n}");
        }
        let c = html.find(r#"<li id="fn3""#).unwrap();
        assert!(html[c..].starts_with(r#"<li id="fn3" class="footnote-item"><p>C."#));
    }

    #[test]
    fn test_footnote_with_env_rule() {
        let mut rules = RenderRules::new();
        rules.set(Rule::FootnoteRef, |_, env, out| {
            out.push_str(env.page_base());
        });
        let result = MarkdownRenderer::new()
            .with_rules(Arc::new(rules))
            .with_env(RenderEnv::for_page("/p#frag"))
            .render_markdown("x[^1]\n\n[^1]: y");
        assert!(result.html.starts_with("<p>x/p</p>"));
    }

    #[test]
    fn test_default_renderer() {
        let parser = Parser::new("Hello");
        let mut renderer = MarkdownRenderer::default();
        assert_eq!(renderer.render(parser).html, "<p>Hello</p>");
    }

    #[test]
    fn test_malformed_markdown_rendered_best_effort() {
        let result = render_html("**unclosed *emphasis [link](");
        assert!(result.html.starts_with("<p>"));
        assert!(result.html.contains("unclosed"));
    }
}
