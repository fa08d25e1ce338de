//! Configuration Module
//!
//! Handles loading cache sizes and the disk root from environment variables.

use std::env;
use std::path::PathBuf;

use crate::cache::MemoryCacheConfig;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory of the disk tier
    pub cache_dir: PathBuf,
    /// Byte budget of the small-object memory cache
    pub small_memory_limit: usize,
    /// Largest object the small-object memory cache accepts
    pub small_object_limit: usize,
    /// Byte budget of the large-object memory cache
    pub large_memory_limit: usize,
    /// Largest object kept in memory at all
    pub large_object_limit: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DIR` - Disk cache root (default: `cache`)
    /// - `SMALL_MEMORY_LIMIT` - Small-object tier budget in bytes (default: 16 MiB)
    /// - `SMALL_OBJECT_LIMIT` - Small-object ceiling in bytes (default: 16 KiB)
    /// - `LARGE_MEMORY_LIMIT` - Large-object tier budget in bytes (default: 64 MiB)
    /// - `LARGE_OBJECT_LIMIT` - Large-object ceiling in bytes (default: 8 MiB)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_dir: env::var("CACHE_DIR")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            small_memory_limit: parse_env("SMALL_MEMORY_LIMIT")
                .unwrap_or(defaults.small_memory_limit),
            small_object_limit: parse_env("SMALL_OBJECT_LIMIT")
                .unwrap_or(defaults.small_object_limit),
            large_memory_limit: parse_env("LARGE_MEMORY_LIMIT")
                .unwrap_or(defaults.large_memory_limit),
            large_object_limit: parse_env("LARGE_OBJECT_LIMIT")
                .unwrap_or(defaults.large_object_limit),
        }
    }

    /// Settings for the small-object memory tier.
    pub fn small_memory(&self) -> MemoryCacheConfig {
        MemoryCacheConfig {
            memory_limit: self.small_memory_limit,
            object_limit: self.small_object_limit,
        }
    }

    /// Settings for the large-object memory tier.
    pub fn large_memory(&self) -> MemoryCacheConfig {
        MemoryCacheConfig {
            memory_limit: self.large_memory_limit,
            object_limit: self.large_object_limit,
        }
    }
}

fn parse_env(name: &str) -> Option<usize> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("cache"),
            small_memory_limit: 16 * 1024 * 1024,
            small_object_limit: 16 * 1024,
            large_memory_limit: 64 * 1024 * 1024,
            large_object_limit: 8 * 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.cache_dir, PathBuf::from("cache"));
        assert_eq!(config.small_memory_limit, 16 * 1024 * 1024);
        assert_eq!(config.small_object_limit, 16 * 1024);
        assert_eq!(config.large_memory_limit, 64 * 1024 * 1024);
        assert_eq!(config.large_object_limit, 8 * 1024 * 1024);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("CACHE_DIR");
        env::remove_var("SMALL_MEMORY_LIMIT");
        env::remove_var("SMALL_OBJECT_LIMIT");
        env::remove_var("LARGE_MEMORY_LIMIT");
        env::remove_var("LARGE_OBJECT_LIMIT");

        let config = Config::from_env();
        let defaults = Config::default();
        assert_eq!(config.cache_dir, defaults.cache_dir);
        assert_eq!(config.small_object_limit, defaults.small_object_limit);
        assert_eq!(config.large_object_limit, defaults.large_object_limit);
    }

    #[test]
    fn test_tier_configs() {
        let config = Config::default();
        let small = config.small_memory();
        assert_eq!(small.memory_limit, config.small_memory_limit);
        assert_eq!(small.object_limit, config.small_object_limit);
        let large = config.large_memory();
        assert_eq!(large.object_limit, config.large_object_limit);
    }
}
