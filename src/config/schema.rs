//! Configuration schema for crossgo
//!
//! Configuration is stored at `~/.config/crossgo/config.toml`

use crate::request::DEFAULT_GOPROXY;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default image repository holding the cross compilation toolchains
pub const DEFAULT_IMAGE_REPOSITORY: &str = "ghcr.io/crazy-max/xgo";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Container runtime settings
    pub runtime: RuntimeConfig,

    /// Build image settings
    pub image: ImageConfig,

    /// Dependency cache settings
    pub cache: CacheConfig,

    /// Build defaults
    pub build: BuildConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Container runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Docker-compatible CLI to invoke
    pub binary: String,

    /// Arguments placed before every subcommand (e.g. `--context`, `remote`)
    pub args: Vec<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            binary: "docker".to_string(),
            args: Vec::new(),
        }
    }
}

/// Build image configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Repository the `<repository>:<go version>` image is taken from
    pub repository: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            repository: DEFAULT_IMAGE_REPOSITORY.to_string(),
        }
    }
}

/// Dependency cache configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Host directory for downloaded archives (default: <temp>/xgo-cache)
    pub dir: Option<PathBuf>,
}

impl CacheConfig {
    /// Cache directory, falling back to the system temp dir
    pub fn dir_or_default(&self) -> PathBuf {
        self.dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("xgo-cache"))
    }
}

/// Build defaults applied when the request leaves them unset
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Go module proxy
    pub goproxy: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            goproxy: DEFAULT_GOPROXY.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[runtime]"));
        assert!(toml.contains("[image]"));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.runtime.binary, "docker");
        assert_eq!(config.image.repository, DEFAULT_IMAGE_REPOSITORY);
        assert!(config.cache.dir.is_none());
    }

    #[test]
    fn config_deserializes_partial() {
        let toml = r#"
            [runtime]
            binary = "podman"

            [cache]
            dir = "/var/cache/xgo"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.runtime.binary, "podman");
        assert_eq!(config.cache.dir_or_default(), PathBuf::from("/var/cache/xgo"));
        assert_eq!(config.build.goproxy, DEFAULT_GOPROXY); // default preserved
    }

    #[test]
    fn cache_dir_defaults_under_temp() {
        let cache = CacheConfig::default();
        assert_eq!(cache.dir_or_default(), std::env::temp_dir().join("xgo-cache"));
    }
}
