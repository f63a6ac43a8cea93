//! Configuration for class imports and the logging setup around them.
//!
//! ```toml
//! resolve_missing_dependencies_from_classpath = true
//! classpath = ["build/classes", "/opt/jdk/classes"]
//!
//! [logging]
//! level = "archsig.import=debug,info"
//! json = false
//! ```

use std::path::{Path, PathBuf};
use std::sync::Once;

use archsig_import::{DirectoryClasspath, ImportOptions};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImportConfig {
    /// Load classes outside the import batch from `classpath` on demand.
    #[serde(default = "ImportConfig::default_resolve_missing")]
    pub resolve_missing_dependencies_from_classpath: bool,

    /// Directories holding `.class` files laid out by package.
    ///
    /// Relative entries are resolved against the config file's directory by
    /// [`ImportConfig::load_from_path`].
    #[serde(default)]
    pub classpath: Vec<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ImportConfig {
    fn default_resolve_missing() -> bool {
        true
    }

    /// Load a config file from TOML.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut config = Self::load_from_str(&text)?;
        if let Some(dir) = path.parent() {
            config.resolve_relative_paths(dir);
        }
        Ok(config)
    }

    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    fn resolve_relative_paths(&mut self, base: &Path) {
        for entry in &mut self.classpath {
            if entry.is_relative() {
                *entry = base.join(&*entry);
            }
        }
    }

    /// The options every import started from this config runs with.
    pub fn import_options(&self) -> ImportOptions {
        ImportOptions {
            resolve_missing_dependencies_from_classpath: self
                .resolve_missing_dependencies_from_classpath,
        }
    }

    pub fn directory_classpath(&self) -> DirectoryClasspath {
        DirectoryClasspath::new(self.classpath.iter().cloned())
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            resolve_missing_dependencies_from_classpath: Self::default_resolve_missing(),
            classpath: Vec::new(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// A simple level (`info`, `debug`, ...) or an `EnvFilter` directive string.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    pub(crate) fn normalize_level_directives(input: &str) -> String {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Self::default_level();
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "trace" => "trace".to_owned(),
            "debug" => "debug".to_owned(),
            "info" => "info".to_owned(),
            "warn" | "warning" => "warn".to_owned(),
            "error" => "error".to_owned(),
            _ => trimmed.to_owned(),
        }
    }

    fn config_env_filter(&self) -> tracing_subscriber::EnvFilter {
        let directives = Self::normalize_level_directives(&self.level);
        tracing_subscriber::EnvFilter::try_new(directives).unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::default()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        })
    }

    /// The effective filter: the configured level, with `RUST_LOG` directives appended when set.
    pub fn env_filter(&self) -> tracing_subscriber::EnvFilter {
        let env_directives = std::env::var("RUST_LOG")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        match env_directives {
            Some(env_directives) => {
                let config_directives = Self::normalize_level_directives(&self.level);
                let combined = format!("{config_directives},{env_directives}");
                tracing_subscriber::EnvFilter::try_new(combined)
                    .or_else(|_| tracing_subscriber::EnvFilter::try_new(env_directives))
                    .unwrap_or_else(|_| self.config_env_filter())
            }
            None => self.config_env_filter(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // The default `Display` quotes a snippet of the input; keep only the message.
        ConfigError::Toml(err.message().to_owned())
    }
}

static TRACING_INIT: Once = Once::new();

/// Installs a global `tracing` subscriber writing to stderr.
///
/// Only the first call has an effect.
pub fn init_tracing(config: &LoggingConfig) {
    TRACING_INIT.call_once(|| {
        let filter = config.env_filter();
        // `TestWriter` keeps output captured under `cargo test`.
        let layer: Box<dyn tracing_subscriber::Layer<_> + Send + Sync> =
            match (config.json, cfg!(debug_assertions)) {
                (true, true) => tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(tracing_subscriber::fmt::writer::TestWriter::with_stderr)
                    .with_ansi(false)
                    .boxed(),
                (true, false) => tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_ansi(false)
                    .boxed(),
                (false, true) => tracing_subscriber::fmt::layer()
                    .with_writer(tracing_subscriber::fmt::writer::TestWriter::with_stderr)
                    .with_ansi(false)
                    .boxed(),
                (false, false) => tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false)
                    .boxed(),
            };

        let subscriber = tracing_subscriber::registry().with(filter).with(layer);
        if tracing::subscriber::set_global_default(subscriber).is_err() {
            tracing::debug!(
                target: "archsig.config",
                "a global tracing subscriber is already installed"
            );
        }
    });
}
