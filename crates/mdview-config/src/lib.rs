//! Configuration management for mdview.
//!
//! Parses `mdview.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `fetch.base_url`
//! - `fetch.user_agent`
//! - `render.page_path`

mod expand;

use std::path::{Path, PathBuf};
use std::time::Duration;

use mdview_renderer::OptionOverrides;
use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the base URL relative locators are resolved against.
    pub base_url: Option<String>,
    /// Override the root directory for local content.
    pub root_dir: Option<PathBuf>,
    /// Override the request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Override the page path used for footnote anchors.
    pub page_path: Option<String>,
    /// Per-flag render option overrides, layered over the file's.
    pub render: OptionOverrides,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "mdview.toml";

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fetch configuration as written in TOML (paths as strings).
    fetch: FetchConfigRaw,
    /// Render configuration.
    pub render: RenderConfig,

    /// Resolved fetch configuration (set after loading).
    #[serde(skip)]
    pub fetch_resolved: FetchConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Raw fetch configuration as parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FetchConfigRaw {
    base_url: Option<String>,
    root_dir: Option<String>,
    timeout_secs: Option<u64>,
    user_agent: Option<String>,
}

/// Resolved fetch configuration.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Base URL for relative locators. Without it only absolute URLs and
    /// local files can be fetched.
    pub base_url: Option<String>,
    /// Root directory for local content.
    pub root_dir: PathBuf,
    /// Overall request timeout. `None` waits as long as the server does.
    pub timeout: Option<Duration>,
    /// `User-Agent` header; the fetcher's default when `None`.
    pub user_agent: Option<String>,
}

/// Render configuration: option overrides plus the page path.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Option overrides merged onto the defaults.
    #[serde(flatten)]
    pub options: OptionOverrides,
    /// Path of the page the HTML is displayed on.
    pub page_path: Option<String>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`fetch.base_url`").
        field: String,
        /// Error message (e.g., "${`DOCS_HOST`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `mdview.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, and the
    /// result is validated again.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails or
    /// the final configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(base_url) = &settings.base_url {
            self.fetch_resolved.base_url = Some(base_url.clone());
        }
        if let Some(root_dir) = &settings.root_dir {
            self.fetch_resolved.root_dir.clone_from(root_dir);
        }
        if let Some(secs) = settings.timeout_secs {
            self.fetch_resolved.timeout = Some(Duration::from_secs(secs));
        }
        if let Some(page_path) = &settings.page_path {
            self.render.page_path = Some(page_path.clone());
        }
        let cli = &settings.render;
        let options = &mut self.render.options;
        for (target, value) in [
            (&mut options.gfm, cli.gfm),
            (&mut options.tables, cli.tables),
            (&mut options.breaks, cli.breaks),
            (&mut options.pedantic, cli.pedantic),
            (&mut options.sanitize, cli.sanitize),
            (&mut options.smart_lists, cli.smart_lists),
            (&mut options.smartypants, cli.smartypants),
        ] {
            if value.is_some() {
                *target = value;
            }
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            fetch_resolved: FetchConfig {
                root_dir: base.to_path_buf(),
                ..FetchConfig::default()
            },
            ..Self::default()
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fetch = &self.fetch_resolved;
        if let Some(base_url) = &fetch.base_url {
            require_non_empty(base_url, "fetch.base_url")?;
            require_http_url(base_url, "fetch.base_url")?;
        }
        if fetch.timeout == Some(Duration::ZERO) {
            return Err(ConfigError::Validation(
                "fetch.timeout_secs must be greater than 0".to_owned(),
            ));
        }
        if let Some(user_agent) = &fetch.user_agent {
            require_non_empty(user_agent, "fetch.user_agent")?;
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        expand::expand_opt(&mut self.fetch.base_url, "fetch.base_url")?;
        expand::expand_opt(&mut self.fetch.user_agent, "fetch.user_agent")?;
        expand::expand_opt(&mut self.render.page_path, "render.page_path")?;
        Ok(())
    }

    /// Resolve raw fetch values against the config directory.
    fn resolve(&mut self, config_dir: &Path) {
        self.fetch_resolved = FetchConfig {
            base_url: self.fetch.base_url.clone(),
            root_dir: self
                .fetch
                .root_dir
                .as_deref()
                .map_or_else(|| config_dir.to_path_buf(), |dir| config_dir.join(dir)),
            timeout: self.fetch.timeout_secs.map(Duration::from_secs),
            user_agent: self.fetch.user_agent.clone(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));
        assert_eq!(
            config.fetch_resolved,
            FetchConfig {
                base_url: None,
                root_dir: PathBuf::from("/test"),
                timeout: None,
                user_agent: None,
            }
        );
        assert!(config.render.options.is_empty());
        assert_eq!(config.render.page_path, None);
        assert!(config.config_path.is_none());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.render.options.is_empty());
        assert!(config.fetch.base_url.is_none());
    }

    #[test]
    fn test_parse_render_config() {
        let toml = r#"
[render]
gfm = false
breaks = true
smart_lists = false
page_path = "/guide"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.render,
            RenderConfig {
                options: OptionOverrides {
                    gfm: Some(false),
                    breaks: Some(true),
                    smart_lists: Some(false),
                    ..Default::default()
                },
                page_path: Some("/guide".to_owned()),
            }
        );
    }

    #[test]
    fn test_resolve_fetch_config() {
        let toml = r#"
[fetch]
base_url = "https://example.com/docs/"
root_dir = "content"
timeout_secs = 30
user_agent = "mdview-test"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve(Path::new("/project"));
        assert_eq!(
            config.fetch_resolved,
            FetchConfig {
                base_url: Some("https://example.com/docs/".to_owned()),
                root_dir: PathBuf::from("/project/content"),
                timeout: Some(Duration::from_secs(30)),
                user_agent: Some("mdview-test".to_owned()),
            }
        );
    }

    #[test]
    fn test_resolve_defaults_root_to_config_dir() {
        let mut config: Config = toml::from_str("").unwrap();
        config.resolve(Path::new("/project"));
        assert_eq!(config.fetch_resolved.root_dir, PathBuf::from("/project"));
    }

    #[test]
    fn test_validate_base_url_scheme() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.fetch_resolved.base_url = Some("ftp://example.com".to_owned());
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("fetch.base_url"));

        config.fetch_resolved.base_url = Some(String::new());
        assert!(config.validate().unwrap_err().to_string().contains("cannot be empty"));
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.fetch_resolved.timeout = Some(Duration::ZERO);
        assert!(
            config
                .validate()
                .unwrap_err()
                .to_string()
                .contains("timeout_secs")
        );
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.render.options.gfm = Some(false);
        config.render.options.breaks = Some(true);

        config.apply_cli_settings(&CliSettings {
            base_url: Some("https://cli.example.com/".to_owned()),
            timeout_secs: Some(5),
            page_path: Some("/cli".to_owned()),
            render: OptionOverrides {
                gfm: Some(true),
                smartypants: Some(true),
                ..Default::default()
            },
            ..Default::default()
        });

        assert_eq!(
            config.fetch_resolved.base_url.as_deref(),
            Some("https://cli.example.com/")
        );
        assert_eq!(config.fetch_resolved.timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.fetch_resolved.root_dir, PathBuf::from("/test")); // Unchanged
        assert_eq!(config.render.page_path.as_deref(), Some("/cli"));
        assert_eq!(
            config.render.options,
            OptionOverrides {
                gfm: Some(true),
                breaks: Some(true),
                smartypants: Some(true),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.apply_cli_settings(&CliSettings::default());
        let before = Config::default_with_base(Path::new("/test"));
        assert_eq!(config.fetch_resolved, before.fetch_resolved);
        assert_eq!(config.render, before.render);
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mdview.toml");
        std::fs::write(
            &path,
            r#"
[fetch]
base_url = "${MDVIEW_TEST_LOAD_BASE:-https://docs.example.com/}"
root_dir = "docs"

[render]
smartypants = true
"#,
        )
        .unwrap();

        let config = Config::load(Some(path.as_path()), None).unwrap();
        assert_eq!(
            config.fetch_resolved.base_url.as_deref(),
            Some("https://docs.example.com/")
        );
        assert_eq!(config.fetch_resolved.root_dir, dir.path().join("docs"));
        assert_eq!(config.render.options.smartypants, Some(true));
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/mdview.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mdview.toml");
        std::fs::write(&path, "[render\ngfm = ").unwrap();
        let err = Config::load(Some(path.as_path()), None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_unset_env_var() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mdview.toml");
        std::fs::write(&path, "[fetch]\nbase_url = \"${MDVIEW_TEST_LOAD_UNSET}\"\n").unwrap();
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("MDVIEW_TEST_LOAD_UNSET");
        }
        let err = Config::load(Some(path.as_path()), None).unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
    }

    #[test]
    fn test_load_validates_cli_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mdview.toml");
        std::fs::write(&path, "").unwrap();
        let settings = CliSettings {
            base_url: Some("example.com".to_owned()),
            ..Default::default()
        };
        let err = Config::load(Some(path.as_path()), Some(&settings)).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
