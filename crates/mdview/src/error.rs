//! CLI error types.

use mdview_config::ConfigError;
use mdview_service::FetchError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Fetch(#[from] FetchError),
}
