//! Run configuration.
//!
//! Values are layered: built-in defaults, then an optional YAML file
//! (`--config`), then command-line flags. Relative paths are resolved against
//! the output root.
//!
//! ```yaml
//! model: gemini-2.5-flash
//! articles_per_day: 10
//! field_encoding: base64
//! daily_dir: daily
//! state_file: generator/state.json
//! index_file: README.md
//! ```

use crate::cli::Cli;
use crate::error::{GeneratorError, Result};
use crate::models::FieldEncoding;
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};
use tracing::{info, instrument};
use url::Url;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const DEFAULT_ARTICLES_PER_DAY: usize = 10;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Root of the generated tree; the other paths are relative to it.
    pub root: PathBuf,
    pub model: String,
    pub articles_per_day: usize,
    pub field_encoding: FieldEncoding,
    pub api_base: String,
    /// Name of the environment variable the API key is read from.
    pub api_key_env: String,
    /// Never read from the YAML file; set only by `--api-key`.
    #[serde(skip)]
    pub api_key: Option<String>,
    pub request_timeout_secs: u64,
    pub daily_dir: PathBuf,
    pub state_file: PathBuf,
    pub index_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            model: DEFAULT_MODEL.to_string(),
            articles_per_day: DEFAULT_ARTICLES_PER_DAY,
            field_encoding: FieldEncoding::default(),
            api_base: DEFAULT_API_BASE.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            api_key: None,
            request_timeout_secs: 300,
            daily_dir: PathBuf::from("daily"),
            state_file: PathBuf::from("generator/state.json"),
            index_file: PathBuf::from("README.md"),
        }
    }
}

impl Config {
    /// Parse a YAML config document.
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text)
            .map_err(|e| GeneratorError::configuration(format!("invalid config file: {e}")))
    }

    /// Build the effective configuration from CLI arguments.
    ///
    /// # Errors
    ///
    /// [`GeneratorError::Configuration`] if the config file cannot be read or
    /// parsed, or the result fails [`Config::validate`].
    #[instrument(level = "info", skip_all)]
    pub async fn load(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => {
                let text = tokio::fs::read_to_string(path).await.map_err(|e| {
                    GeneratorError::configuration(format!("cannot read config {}: {e}", path.display()))
                })?;
                info!(path = %path.display(), "Loaded config file");
                Self::from_yaml(&text)?
            }
            None => Self::default(),
        };

        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Overlay any flags given on the command line.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(root) = &cli.root {
            self.root = root.clone();
        }
        if let Some(model) = &cli.model {
            self.model = model.clone();
        }
        if let Some(count) = cli.count {
            self.articles_per_day = count;
        }
        if let Some(encoding) = cli.encoding {
            self.field_encoding = encoding;
        }
        if cli.api_key.is_some() {
            self.api_key = cli.api_key.clone();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.articles_per_day == 0 {
            return Err(GeneratorError::configuration(
                "articles_per_day must be at least 1",
            ));
        }
        if self.model.trim().is_empty() {
            return Err(GeneratorError::configuration("model must not be empty"));
        }
        Url::parse(&self.api_base).map_err(|e| {
            GeneratorError::configuration(format!("invalid api_base '{}': {e}", self.api_base))
        })?;
        // Index links are relative to the index file, so batches must sit below it.
        let index_dir = self
            .index_path()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let daily = self.daily_path();
        let linkable = daily.strip_prefix(&index_dir).is_ok_and(|rel| {
            rel.components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        });
        if !linkable {
            return Err(GeneratorError::configuration(format!(
                "daily_dir {} must be inside {}, the directory holding index_file",
                daily.display(),
                index_dir.display()
            )));
        }
        Ok(())
    }

    fn under_root(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn daily_path(&self) -> PathBuf {
        self.under_root(&self.daily_dir)
    }

    pub fn state_path(&self) -> PathBuf {
        self.under_root(&self.state_file)
    }

    pub fn index_path(&self) -> PathBuf {
        self.under_root(&self.index_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.articles_per_day, 10);
        assert_eq!(config.field_encoding, FieldEncoding::Base64);
        assert_eq!(config.state_path(), Path::new("./generator/state.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_overrides_defaults() {
        let config = Config::from_yaml(
            "model: gemini-2.0-flash\narticles_per_day: 4\nfield_encoding: plain\ndaily_dir: out\n",
        )
        .unwrap();
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.articles_per_day, 4);
        assert_eq!(config.field_encoding, FieldEncoding::Plain);
        assert_eq!(config.daily_path(), Path::new("./out"));
        assert_eq!(config.index_file, Path::new("README.md"));
    }

    #[test]
    fn test_yaml_rejects_unknown_keys() {
        let err = Config::from_yaml("modle: typo\n").unwrap_err();
        assert!(matches!(err, GeneratorError::Configuration { .. }));
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut config = Config::from_yaml("articles_per_day: 4\nmodel: from-file\n").unwrap();
        let cli = Cli::parse_from([
            "dsa_daily",
            "--root",
            "/srv/dsa",
            "--count",
            "7",
            "--encoding",
            "plain",
            "--api-key",
            "k",
        ]);
        config.apply_cli(&cli);

        assert_eq!(config.articles_per_day, 7);
        assert_eq!(config.model, "from-file");
        assert_eq!(config.field_encoding, FieldEncoding::Plain);
        assert_eq!(config.api_key.as_deref(), Some("k"));
        assert_eq!(config.index_path(), Path::new("/srv/dsa/README.md"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = Config {
            articles_per_day: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            api_base: "not a url".into(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_requires_daily_dir_below_index() {
        let outside = |daily_dir: &str, index_file: &str| Config {
            root: PathBuf::from("/srv/dsa"),
            daily_dir: PathBuf::from(daily_dir),
            index_file: PathBuf::from(index_file),
            ..Config::default()
        };

        assert!(outside("/var/www/daily", "README.md").validate().is_err());
        assert!(outside("../daily", "README.md").validate().is_err());
        assert!(outside("daily", "docs/README.md").validate().is_err());

        let err = outside("/var/www/daily", "README.md").validate().unwrap_err();
        assert!(err.to_string().contains("daily_dir /var/www/daily"));

        assert!(outside("/srv/dsa/daily", "README.md").validate().is_ok());
        assert!(outside("docs/daily", "docs/README.md").validate().is_ok());
    }
}
