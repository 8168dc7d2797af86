//! Render option record and right-biased option merging.

use pulldown_cmark::Options;

/// Rendering flags.
///
/// Field names follow the flags hosts already pass around for markdown
/// rendering (`gfm`, `tables`, `breaks`, ...), but as a typed record.
#[allow(clippy::struct_excessive_bools)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderOptions {
    /// GitHub Flavored Markdown: strikethrough, task lists, alerts and (with
    /// [`tables`](Self::tables)) pipe tables.
    pub gfm: bool,
    /// Pipe tables. Only effective together with `gfm`.
    pub tables: bool,
    /// Render soft line breaks as `<br>`. Only effective together with `gfm`.
    pub breaks: bool,
    /// Plain CommonMark: turns off every GFM extension regardless of `gfm`.
    pub pedantic: bool,
    /// Escape raw HTML found in the input instead of passing it through.
    pub sanitize: bool,
    /// Accepted for compatibility. CommonMark list parsing already starts a
    /// new list when the bullet character changes.
    pub smart_lists: bool,
    /// Smart quotes and dashes.
    pub smartypants: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            gfm: true,
            tables: true,
            breaks: false,
            pedantic: false,
            sanitize: false,
            smart_lists: true,
            smartypants: false,
        }
    }
}

/// Caller-supplied overrides for [`RenderOptions`].
///
/// `None` keeps the value being merged onto.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OptionOverrides {
    pub gfm: Option<bool>,
    pub tables: Option<bool>,
    pub breaks: Option<bool>,
    pub pedantic: Option<bool>,
    pub sanitize: Option<bool>,
    pub smart_lists: Option<bool>,
    pub smartypants: Option<bool>,
}

impl OptionOverrides {
    /// Whether no flag is overridden.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl RenderOptions {
    /// Overlay `overrides` onto `self`. Every `Some` wins.
    #[must_use]
    pub fn merge(self, overrides: &OptionOverrides) -> Self {
        Self {
            gfm: overrides.gfm.unwrap_or(self.gfm),
            tables: overrides.tables.unwrap_or(self.tables),
            breaks: overrides.breaks.unwrap_or(self.breaks),
            pedantic: overrides.pedantic.unwrap_or(self.pedantic),
            sanitize: overrides.sanitize.unwrap_or(self.sanitize),
            smart_lists: overrides.smart_lists.unwrap_or(self.smart_lists),
            smartypants: overrides.smartypants.unwrap_or(self.smartypants),
        }
    }

    /// Whether GFM extensions are in effect after `pedantic` is applied.
    #[must_use]
    pub fn gfm_enabled(&self) -> bool {
        self.gfm && !self.pedantic
    }

    /// Whether soft breaks should be rendered as `<br>`.
    #[must_use]
    pub fn hard_soft_breaks(&self) -> bool {
        self.breaks && self.gfm_enabled()
    }

    /// Parser options for these flags. Footnotes are always enabled.
    #[must_use]
    pub fn parser_options(&self) -> Options {
        let mut options = Options::ENABLE_FOOTNOTES;
        if self.gfm_enabled() {
            options |=
                Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS | Options::ENABLE_GFM;
            if self.tables {
                options |= Options::ENABLE_TABLES;
            }
        }
        if self.smartypants {
            options |= Options::ENABLE_SMART_PUNCTUATION;
        }
        options
    }
}
