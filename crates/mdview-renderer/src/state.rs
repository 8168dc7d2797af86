//! Shared state structs for markdown rendering.
//!
//! These structs track context while events are processed.

use std::collections::HashMap;

use pulldown_cmark::{Alignment, Event, Tag, TagEnd};

/// State for tracking code block rendering.
#[derive(Default)]
pub(crate) struct CodeBlockState {
    active: bool,
    language: Option<String>,
    buffer: String,
}

impl CodeBlockState {
    /// Start a new code block with optional language.
    pub(crate) fn start(&mut self, language: Option<String>) {
        self.active = true;
        self.language = language;
        self.buffer.clear();
    }

    /// End the current code block and return (language, content).
    pub(crate) fn end(&mut self) -> (Option<String>, String) {
        self.active = false;
        (self.language.take(), std::mem::take(&mut self.buffer))
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn push_str(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    pub(crate) fn push_newline(&mut self) {
        self.buffer.push('\n');
    }
}

/// State for tracking table rendering.
#[derive(Default)]
pub(crate) struct TableState {
    in_head: bool,
    alignments: Vec<Alignment>,
    cell_index: usize,
}

impl TableState {
    /// Start a new table with column alignments.
    pub(crate) fn start(&mut self, alignments: Vec<Alignment>) {
        self.alignments = alignments;
        self.in_head = false;
        self.cell_index = 0;
    }

    pub(crate) fn start_head(&mut self) {
        self.in_head = true;
        self.cell_index = 0;
    }

    pub(crate) fn end_head(&mut self) {
        self.in_head = false;
    }

    pub(crate) fn start_row(&mut self) {
        self.cell_index = 0;
    }

    pub(crate) fn next_cell(&mut self) {
        self.cell_index += 1;
    }

    pub(crate) fn is_in_head(&self) -> bool {
        self.in_head
    }

    /// Alignment attribute for the current cell.
    pub(crate) fn current_alignment_style(&self) -> &'static str {
        match self.alignments.get(self.cell_index) {
            Some(Alignment::Left) => r#" style="text-align:left""#,
            Some(Alignment::Center) => r#" style="text-align:center""#,
            Some(Alignment::Right) => r#" style="text-align:right""#,
            Some(Alignment::None) | None => "",
        }
    }
}

/// State for capturing image alt text.
#[derive(Default)]
pub(crate) struct ImageState {
    active: bool,
    alt_text: String,
}

impl ImageState {
    pub(crate) fn start(&mut self) {
        self.active = true;
        self.alt_text.clear();
    }

    /// End image capture and return the alt text.
    pub(crate) fn end(&mut self) -> String {
        self.active = false;
        std::mem::take(&mut self.alt_text)
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn push_str(&mut self, text: &str) {
        self.alt_text.push_str(text);
    }
}

/// Table of contents entry.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TocEntry {
    /// Heading level (1-6).
    pub level: u8,
    /// Heading text.
    pub title: String,
    /// Anchor ID for linking.
    pub id: String,
}

/// Heading buffers, id generation and title extraction.
pub(crate) struct HeadingState {
    extract_title: bool,
    title: Option<String>,
    current_level: Option<u8>,
    /// Plain text of the current heading (for the slug and ToC).
    text: String,
    /// HTML of the current heading (with inline formatting).
    html: String,
    toc: Vec<TocEntry>,
    id_counts: HashMap<String, usize>,
}

impl HeadingState {
    pub(crate) fn new(extract_title: bool) -> Self {
        Self {
            extract_title,
            title: None,
            current_level: None,
            text: String::new(),
            html: String::new(),
            toc: Vec::new(),
            id_counts: HashMap::new(),
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.current_level.is_some()
    }

    pub(crate) fn start_heading(&mut self, level: u8) {
        self.current_level = Some(level);
        self.text.clear();
        self.html.clear();
    }

    /// Complete heading and record its ToC entry.
    /// Returns (level, id, html) or None if not in a heading.
    pub(crate) fn complete_heading(&mut self) -> Option<(u8, String, String)> {
        let level = self.current_level.take()?;
        let text = std::mem::take(&mut self.text);
        let html = std::mem::take(&mut self.html);
        let id = self.generate_id(&text);

        // The first H1 becomes the title and stays out of the ToC
        let is_title = self.extract_title && level == 1 && self.title.is_none();
        if is_title {
            self.title = Some(text.trim().to_owned());
        } else {
            self.toc.push(TocEntry {
                level,
                title: text.trim().to_owned(),
                id: id.clone(),
            });
        }

        Some((level, id, html))
    }

    fn generate_id(&mut self, text: &str) -> String {
        let base_id = slugify(text);
        let count = self.id_counts.entry(base_id.clone()).or_default();
        let id = match *count {
            0 => base_id,
            n => format!("{base_id}-{n}"),
        };
        *count += 1;
        id
    }

    pub(crate) fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub(crate) fn push_html(&mut self, html: &str) {
        self.html.push_str(html);
    }

    pub(crate) fn take_title(&mut self) -> Option<String> {
        self.title.take()
    }

    pub(crate) fn take_toc(&mut self) -> Vec<TocEntry> {
        std::mem::take(&mut self.toc)
    }
}

/// A defined and referenced footnote, ready to be written out.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct CollectedFootnote {
    pub(crate) label: String,
    pub(crate) number: usize,
    pub(crate) references: usize,
    pub(crate) body: String,
}

/// Where a footnote reference sits in the document.
enum RefScope {
    Body,
    /// Inside the first definition of the given normalized label.
    Definition(String),
    /// Inside a repeated definition, which is never rendered.
    Ignored,
}

/// Footnote numbering and definition capture.
///
/// [`plan`](Self::plan) numbers footnotes before rendering starts. Only
/// footnotes reachable from the main body, directly or through the
/// definitions of other reachable footnotes, get a number: body references
/// first, then references inside each numbered definition in number order.
///
/// Definition bodies are rendered into a side buffer while the main output is
/// parked in `parked_output`.
#[derive(Default)]
pub(crate) struct FootnoteState {
    /// Normalized label -> number.
    numbers: HashMap<String, usize>,
    /// Normalized label -> references rendered so far.
    seen: HashMap<String, usize>,
    /// Normalized label -> (label as written, rendered body).
    definitions: HashMap<String, (String, String)>,
    capturing: Option<String>,
    /// Whether references in the captured definition end up in the output.
    capturing_live: bool,
    parked_output: String,
}

fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}

impl FootnoteState {
    /// Assign footnote numbers for the whole event list.
    pub(crate) fn plan(&mut self, events: &[Event<'_>]) {
        let mut body_refs = Vec::new();
        let mut nested_refs: HashMap<String, Vec<String>> = HashMap::new();
        let mut scope = RefScope::Body;

        for event in events {
            match event {
                Event::Start(Tag::FootnoteDefinition(label)) => {
                    let key = normalize_label(label);
                    scope = if nested_refs.contains_key(&key) {
                        RefScope::Ignored
                    } else {
                        nested_refs.insert(key.clone(), Vec::new());
                        RefScope::Definition(key)
                    };
                }
                Event::End(TagEnd::FootnoteDefinition) => scope = RefScope::Body,
                Event::FootnoteReference(label) => match &scope {
                    RefScope::Body => body_refs.push(normalize_label(label)),
                    RefScope::Definition(def) => {
                        if let Some(refs) = nested_refs.get_mut(def) {
                            refs.push(normalize_label(label));
                        }
                    }
                    RefScope::Ignored => {}
                },
                _ => {}
            }
        }

        self.numbers.clear();
        self.seen.clear();
        let mut order = Vec::new();
        for key in body_refs {
            self.assign_number(key, &mut order);
        }
        // `order` grows while it is walked
        let mut next = 0;
        while let Some(key) = order.get(next).cloned() {
            next += 1;
            for nested in nested_refs.remove(&key).unwrap_or_default() {
                self.assign_number(nested, &mut order);
            }
        }
    }

    fn assign_number(&mut self, key: String, order: &mut Vec<String>) {
        if !self.numbers.contains_key(&key) {
            order.push(key.clone());
            self.numbers.insert(key, order.len());
        }
    }

    /// Register a rendered reference to `label`. Returns (number, occurrence),
    /// or `None` when the reference sits in a definition that is dropped.
    pub(crate) fn reference(&mut self, label: &str) -> Option<(usize, usize)> {
        if self.capturing.is_some() && !self.capturing_live {
            return None;
        }
        let key = normalize_label(label);
        let number = *self.numbers.get(&key)?;
        let seen = self.seen.entry(key).or_default();
        let occurrence = *seen;
        *seen += 1;
        Some((number, occurrence))
    }

    pub(crate) fn is_capturing(&self) -> bool {
        self.capturing.is_some()
    }

    /// Begin capturing a definition body. `output` is the main buffer, which
    /// is parked until [`end_definition`](Self::end_definition).
    pub(crate) fn start_definition(&mut self, label: &str, output: String) {
        let key = normalize_label(label);
        self.capturing_live =
            self.numbers.contains_key(&key) && !self.definitions.contains_key(&key);
        self.capturing = Some(label.to_owned());
        self.parked_output = output;
    }

    /// Store the captured `body` and hand back the parked main buffer.
    pub(crate) fn end_definition(&mut self, body: String) -> String {
        if let Some(label) = self.capturing.take() {
            // First definition of a label wins
            self.definitions
                .entry(normalize_label(&label))
                .or_insert((label, body));
        }
        self.capturing_live = false;
        std::mem::take(&mut self.parked_output)
    }

    /// Numbered footnotes that have a definition, in number order.
    pub(crate) fn take_collected(&mut self) -> Vec<CollectedFootnote> {
        let mut notes: Vec<_> = self
            .numbers
            .drain()
            .filter_map(|(key, number)| {
                let references = self.seen.get(&key).copied().unwrap_or_default();
                self.definitions
                    .remove(&key)
                    .map(|(label, body)| CollectedFootnote {
                        label,
                        number,
                        references,
                        body,
                    })
            })
            .collect();
        self.definitions.clear();
        self.seen.clear();
        notes.sort_by_key(|note| note.number);
        notes
    }
}

/// Convert text to URL-safe slug.
///
/// Converts to lowercase, replaces whitespace/dashes/underscores with single dashes,
/// and removes other non-alphanumeric characters.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut result = String::new();
    let mut last_was_dash = true;

    for c in text.trim().chars() {
        if c.is_alphanumeric() {
            result.extend(c.to_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && (c.is_whitespace() || c == '-' || c == '_') {
            result.push('-');
            last_was_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }

    result
}

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}
