//! Configuration management for `livepatch.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── watch      # [watch]
//! │   ├── chunks     # [chunks]
//! │   ├── serve      # [serve]
//! │   └── client     # [client]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError
//! │   └── handle     # Global config handle
//! └── mod.rs         # LivepatchConfig (this file)
//! ```
//!
//! A missing config file is not an error: every section has defaults, and
//! paths then resolve against the current directory.

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{ChunksConfig, ClientConfig, DEFAULT_WS_PORT, ServeConfig, WatchConfig};
pub use types::{ConfigError, cfg, init_config};

use crate::{
    cli::{Cli, Commands, WatchArgs},
    log,
};
use crate::actor::fs::ChunkPairing;
use crate::reload::kind::ChunkShapes;
use crate::reload::snapshot::SnapshotPolicy;
use crate::reload::url::{HashPattern, UrlMapper};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing livepatch.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LivepatchConfig {
    /// Absolute path to the config file, if one was found (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Directory relative paths resolve against (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub chunks: ChunksConfig,

    #[serde(default)]
    pub serve: ServeConfig,

    #[serde(default)]
    pub client: ClientConfig,
}

impl LivepatchConfig {
    /// Load configuration for the given CLI invocation.
    ///
    /// Searches upward from cwd for the config file. The project root is the
    /// config file's directory, or cwd when there is none.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current working directory")?;

        let mut config = match find_config_file(&cli.config, &cwd) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.root = path.parent().map(Path::to_path_buf).unwrap_or_default();
                config.config_path = Some(path);
                config
            }
            None => {
                crate::debug!("config"; "no {} found, using defaults", cli.config.display());
                Self {
                    root: cwd,
                    ..Self::default()
                }
            }
        };

        config.apply_cli(cli);
        config.normalize_paths();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// CLI flags override the file.
    fn apply_cli(&mut self, cli: &Cli) {
        crate::logger::set_verbose(cli.verbose);

        if let Some(args) = cli.watch_args() {
            self.apply_watch_args(args);
        }

        match &cli.command {
            Commands::Serve { interface, port, .. } => {
                Self::update_option(&mut self.serve.interface, interface.as_ref());
                Self::update_option(&mut self.serve.port, port.as_ref());
            }
            Commands::Notify { port, .. } | Commands::Tail { port, .. } => {
                Self::update_option(&mut self.serve.port, port.as_ref());
            }
            Commands::Snapshot { .. } => {}
        }
    }

    fn apply_watch_args(&mut self, args: &WatchArgs) {
        Self::update_option(&mut self.watch.root, args.root.as_ref());
        Self::update_option(&mut self.watch.url_prefix, args.url_prefix.as_ref());
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Make the watch root absolute, relative to the project root.
    fn normalize_paths(&mut self) {
        self.root = crate::utils::path::normalize_path(&self.root);
        self.watch.root = crate::utils::path::resolve_from(&self.watch.root, &self.root);
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Check every pattern compiles and the timing values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.watch.debounce_ms == 0 {
            return Err(ConfigError::Validation(
                "[watch] debounce_ms must be greater than 0".into(),
            ));
        }
        if self.client.max_retries > 0 && self.client.base_delay_ms == 0 {
            return Err(ConfigError::Validation(
                "[client] base_delay_ms must be greater than 0".into(),
            ));
        }
        if !self.watch.url_prefix.starts_with('/') && !self.watch.url_prefix.contains("://") {
            return Err(ConfigError::Validation(format!(
                "[watch] url_prefix `{}` must start with `/` or be an absolute URL",
                self.watch.url_prefix
            )));
        }
        self.hash_pattern()?;
        self.chunk_shapes()?;
        Ok(())
    }

    // ========================================================================
    // derived values
    // ========================================================================

    pub fn hash_pattern(&self) -> Result<HashPattern, ConfigError> {
        HashPattern::new(&self.watch.hash_pattern)
            .map_err(|e| ConfigError::Validation(format!("[watch] hash_pattern: {e}")))
    }

    pub fn chunk_shapes(&self) -> Result<ChunkShapes, ConfigError> {
        ChunkShapes::new(&self.chunks.page_pattern, &self.chunks.shared_pattern)
            .map_err(|e| ConfigError::Validation(format!("[chunks]: {e}")))
    }

    pub fn url_mapper(&self) -> Result<UrlMapper, ConfigError> {
        Ok(UrlMapper::new(
            &self.watch.root,
            &self.watch.url_prefix,
            self.hash_pattern()?,
        ))
    }

    pub fn snapshot_policy(&self) -> SnapshotPolicy {
        SnapshotPolicy::new(self.watch.exclude.iter().cloned())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.watch.debounce_ms)
    }

    /// Shared/page chunk batch pairing, `None` when `pair_hold_ms` is 0.
    pub fn chunk_pairing(&self) -> Result<Option<ChunkPairing>, ConfigError> {
        if self.watch.pair_hold_ms == 0 {
            return Ok(None);
        }
        Ok(Some(ChunkPairing::new(
            self.url_mapper()?,
            self.chunk_shapes()?,
            Duration::from_millis(self.watch.pair_hold_ms),
        )))
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields (to catch typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> LivepatchConfig {
    let (parsed, ignored) = LivepatchConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_invalid_toml() {
        let result = LivepatchConfig::parse_with_ignored("[watch\nroot = \"dist\"");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[watch]\nroot = \"out\"\n[unknown_section]\nfield = \"value\"";
        let (config, ignored) = LivepatchConfig::parse_with_ignored(content).unwrap();

        assert_eq!(config.watch.root, PathBuf::from("out"));
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn test_defaults_validate() {
        assert!(LivepatchConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_debounce() {
        let config = test_parse_config("[watch]\ndebounce_ms = 0");
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_pattern_without_hash_group() {
        let config = test_parse_config("[watch]\nhash_pattern = '-[0-9a-f]{8}\\.js$'");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("hash"));
    }

    #[test]
    fn test_validate_rejects_bad_chunk_regex() {
        let config = test_parse_config("[chunks]\npage_pattern = '('");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_relative_prefix() {
        let config = test_parse_config("[watch]\nurl_prefix = \"public\"");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_absolute_prefix_validates_and_maps() {
        let mut config =
            test_parse_config("[watch]\nurl_prefix = \"http://localhost:3000/public/\"");
        config.watch.root = PathBuf::from("/srv/out");
        assert!(config.validate().is_ok());

        let mapper = config.url_mapper().unwrap();
        assert_eq!(
            mapper.to_url(Path::new("/srv/out/a-1a2b3c4d.css")).as_deref(),
            Some("http://localhost:3000/public/a-1a2b3c4d.css")
        );
    }

    #[test]
    fn test_chunk_pairing_off_at_zero() {
        let config = test_parse_config("[watch]\npair_hold_ms = 0");
        assert!(config.chunk_pairing().unwrap().is_none());

        let pairing = LivepatchConfig::default().chunk_pairing().unwrap().unwrap();
        assert_eq!(pairing.hold(), Duration::from_millis(250));
    }

    #[test]
    fn test_cli_overrides_and_root_resolution() {
        let cli = Cli::parse_from([
            "livepatch",
            "serve",
            "--root",
            "build",
            "--url-prefix",
            "/",
            "--port",
            "4100",
        ]);
        let mut config = test_parse_config("[watch]\nroot = \"dist\"\n[serve]\nport = 4000");
        config.root = PathBuf::from("/nonexistent/project");

        config.apply_cli(&cli);
        config.normalize_paths();

        assert_eq!(config.watch.root, PathBuf::from("/nonexistent/project/build"));
        assert_eq!(config.watch.url_prefix, "/");
        assert_eq!(config.serve.port, 4100);
    }

    #[test]
    fn test_url_mapper_uses_watch_section() {
        let mut config = test_parse_config("[watch]\nurl_prefix = \"/static/\"");
        config.watch.root = PathBuf::from("/srv/out");

        let mapper = config.url_mapper().unwrap();
        assert_eq!(
            mapper.to_url(Path::new("/srv/out/app-1a2b3c4d.css")).as_deref(),
            Some("/static/app-1a2b3c4d.css")
        );
    }
}
