//! CLI command implementations.

pub(crate) mod compile;
pub(crate) mod render;

use std::io::{self, Write};

use clap::Args;
use mdview_config::CliSettings;
use mdview_renderer::OptionOverrides;

use crate::error::CliError;

pub(crate) use compile::CompileArgs;
pub(crate) use render::RenderArgs;

/// Rendering flags shared by `render` and `compile`.
///
/// Flags only ever override; options left unset keep their config file or
/// default value.
#[derive(Args, Debug, Default)]
pub(crate) struct RenderFlags {
    /// Path of the page the HTML is shown on (prefixes footnote anchors).
    #[arg(long)]
    page_path: Option<String>,

    /// Disable GitHub Flavored Markdown extensions.
    #[arg(long)]
    no_gfm: bool,

    /// Disable pipe tables.
    #[arg(long)]
    no_tables: bool,

    /// Render soft line breaks as <br>.
    #[arg(long)]
    breaks: bool,

    /// Plain CommonMark, no extensions.
    #[arg(long)]
    pedantic: bool,

    /// Escape raw HTML found in the markdown.
    #[arg(long)]
    escape_html: bool,

    /// Smart quotes and dashes.
    #[arg(long)]
    smartypants: bool,

    /// Print the HTML without sanitizing it.
    #[arg(long)]
    pub raw: bool,
}

impl RenderFlags {
    /// Option overrides expressed by the flags.
    fn overrides(&self) -> OptionOverrides {
        OptionOverrides {
            gfm: self.no_gfm.then_some(false),
            tables: self.no_tables.then_some(false),
            breaks: self.breaks.then_some(true),
            pedantic: self.pedantic.then_some(true),
            sanitize: self.escape_html.then_some(true),
            smart_lists: None,
            smartypants: self.smartypants.then_some(true),
        }
    }

    /// Config overrides carrying the page path and option flags.
    pub(crate) fn cli_settings(&self) -> CliSettings {
        CliSettings {
            page_path: self.page_path.clone(),
            render: self.overrides(),
            ..Default::default()
        }
    }
}

/// Write HTML followed by a newline to stdout.
pub(crate) fn write_html(html: &str) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{html}")?;
    stdout.flush()?;
    Ok(())
}
