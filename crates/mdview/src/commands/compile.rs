//! `mdview compile` command implementation.

use std::io::Read;
use std::path::PathBuf;

use clap::Args;
use mdview_config::{Config, RenderConfig};
use mdview_renderer::Markdown;
use mdview_service::{AmmoniaSanitizer, HtmlSanitizer};

use super::{RenderFlags, write_html};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the compile command.
#[derive(Args)]
pub(crate) struct CompileArgs {
    /// Markdown file to convert (default: read stdin).
    file: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover mdview.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    flags: RenderFlags,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CompileArgs {
    /// Execute the compile command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid or the input cannot be read.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = self.flags.cli_settings();
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let text = match &self.file {
            Some(path) => std::fs::read_to_string(path)?,
            None => {
                let mut text = String::new();
                std::io::stdin().read_to_string(&mut text)?;
                text
            }
        };

        if self.flags.raw {
            output.warning("Output is not sanitized");
        }
        write_html(&compile_text(&text, &config.render, self.flags.raw))
    }
}

/// Convert `text` with the configured options and page path.
fn compile_text(text: &str, render: &RenderConfig, raw: bool) -> String {
    let mut markdown = Markdown::with_options(&render.options);
    markdown.set_page_path(render.page_path.clone());
    let html = markdown.compile(text);
    if raw {
        html
    } else {
        AmmoniaSanitizer::new().sanitize(&html)
    }
}
