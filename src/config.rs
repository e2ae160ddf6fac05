use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::figma::client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::resolve::{ResolveMode, Tolerances};

/// Descriptor recursion in the classifier is bounded by this as well.
pub const MAX_DEPTH_LIMIT: usize = 512;
pub const DEFAULT_MAX_DEPTH: usize = 64;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}")]
    Parse(#[from] toml::de::Error),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub file_key: Option<String>,
    /// Restrict the fetch to these node subtrees.
    pub node_ids: Vec<String>,
    pub base_url: String,
    /// Read the document from disk instead of the API.
    pub document_path: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub snapshot_path: PathBuf,
    /// Replaces the bundled sample token set.
    pub sample_tokens: Option<PathBuf>,
    pub templates_dir: Option<PathBuf>,
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    #[serde(with = "humantime_serde")]
    pub fetch_timeout: Duration,
    pub max_depth: usize,
    pub resolve_mode: ResolveMode,
    pub tolerances: Tolerances,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            file_key: None,
            node_ids: Vec::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            document_path: None,
            output_dir: PathBuf::from("Generated"),
            snapshot_path: PathBuf::from(".dsync/snapshot.json"),
            sample_tokens: None,
            templates_dir: None,
            poll_interval: Duration::from_secs(30),
            fetch_timeout: DEFAULT_TIMEOUT,
            max_depth: DEFAULT_MAX_DEPTH,
            resolve_mode: ResolveMode::default(),
            tolerances: Tolerances::default(),
        }
    }
}

impl Config {
    /// Load from `path`, else the central config file when it exists, else
    /// defaults. An explicit path that cannot be read is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::central_config_path().filter(|p| p.is_file()) {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };
        let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// `$XDG_CONFIG_HOME/dsync/config.toml`, falling back to
    /// `~/.config/dsync/config.toml`.
    pub fn central_config_path() -> Option<PathBuf> {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var_os("HOME")
                    .filter(|v| !v.is_empty())
                    .map(|home| PathBuf::from(home).join(".config"))
            })?;
        Some(base.join("dsync").join("config.toml"))
    }

    /// Fill `file_key` from `FIGMA_FILE_KEY` when the file does not set one.
    pub fn with_env_overrides(mut self) -> Self {
        if self.file_key.is_none() {
            self.file_key = std::env::var("FIGMA_FILE_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty());
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "poll_interval must be greater than zero".to_string(),
            ));
        }
        if self.fetch_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "fetch_timeout must be greater than zero".to_string(),
            ));
        }
        if self.max_depth == 0 || self.max_depth > MAX_DEPTH_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "max_depth must be between 1 and {MAX_DEPTH_LIMIT}, got {}",
                self.max_depth
            )));
        }
        let tolerances = [
            ("color", self.tolerances.color),
            ("spacing", self.tolerances.spacing),
            ("radius", self.tolerances.radius),
            ("font_size", self.tolerances.font_size),
        ];
        for (name, value) in tolerances {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "tolerances.{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("output_dir must not be empty".to_string()));
        }
        if self.file_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
            return Err(ConfigError::Invalid("file_key must not be blank".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_values_match_expected() {
        let cfg = Config::default();

        assert_eq!(cfg.base_url, "https://api.figma.com");
        assert_eq!(cfg.output_dir, PathBuf::from("Generated"));
        assert_eq!(cfg.poll_interval, Duration::from_secs(30));
        assert_eq!(cfg.max_depth, 64);
        assert_eq!(cfg.resolve_mode, ResolveMode::Fallback);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn parses_durations_and_tolerances() {
        let cfg = Config::from_toml(
            r#"
file_key = "abc123"
node_ids = ["1:2", "3:4"]
poll_interval = "2m"
fetch_timeout = "5s"
resolve_mode = "register"

[tolerances]
color = 10.0
"#,
        )
        .unwrap();

        assert_eq!(cfg.file_key.as_deref(), Some("abc123"));
        assert_eq!(cfg.node_ids, vec!["1:2", "3:4"]);
        assert_eq!(cfg.poll_interval, Duration::from_secs(120));
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(5));
        assert_eq!(cfg.resolve_mode, ResolveMode::Register);
        assert_eq!(cfg.tolerances.color, 10.0);
        assert_eq!(cfg.tolerances.spacing, 2.0);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            Config::from_toml("poll_seconds = 30"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn validate_rejects_zero_interval_and_negative_tolerance() {
        let cfg = Config {
            poll_interval: Duration::ZERO,
            ..Config::default()
        };
        assert!(cfg.validate().unwrap_err().to_string().contains("poll_interval"));

        let mut cfg = Config::default();
        cfg.tolerances.radius = -1.0;
        assert!(cfg.validate().unwrap_err().to_string().contains("tolerances.radius"));
    }

    #[test]
    fn validate_bounds_depth() {
        for depth in [0, MAX_DEPTH_LIMIT + 1] {
            let cfg = Config {
                max_depth: depth,
                ..Config::default()
            };
            assert!(cfg.validate().is_err(), "depth {depth} accepted");
        }
    }

    #[test]
    fn load_reads_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dsync.toml");
        fs::write(&path, "output_dir = \"Sources/UI\"\nmax_depth = 32\n").unwrap();

        let cfg = Config::load(Some(&path)).unwrap();
        assert_eq!(cfg.output_dir, PathBuf::from("Sources/UI"));
        assert_eq!(cfg.max_depth, 32);
    }

    #[test]
    fn load_missing_explicit_path_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = Config::load(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
