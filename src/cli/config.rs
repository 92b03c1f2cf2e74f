//! TOML configuration file support.
//!
//! Engine and cache settings can be kept in a config file instead of being
//! passed as flags on every invocation:
//!
//! ```toml
//! # msql.toml
//! [engine]
//! threads = 8
//! variable_max = 1000.0
//! variable_delta = 0.1
//! max_subquery_depth = 8
//! ms1_mz_cross_table = true
//! bin_width = 0.1
//!
//! [cache]
//! enabled = true
//! compression_level = 3
//! row_group_size = 100000
//! ```
//!
//! Flags given on the command line take precedence over the file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use msql::engine::EngineConfig;
use msql::provider::CompressionType;

/// Root configuration structure for msql.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Query engine settings.
    #[serde(default)]
    pub engine: EngineSection,

    /// Table cache settings.
    #[serde(default)]
    pub cache: CacheSection,
}

/// The `[engine]` table.
#[derive(Debug, Default, Deserialize)]
pub struct EngineSection {
    /// Worker threads (0 = one per logical CPU).
    pub threads: Option<usize>,

    /// Exclusive upper bound of the variable range.
    pub variable_max: Option<f64>,

    /// Step of the variable range.
    pub variable_delta: Option<f64>,

    /// Maximum subquery nesting depth.
    pub max_subquery_depth: Option<usize>,

    /// Cross-table `ms1-mz` predicate.
    pub ms1_mz_cross_table: Option<bool>,

    /// `scan-range-sum` bin width.
    pub bin_width: Option<f64>,
}

/// The `[cache]` table.
#[derive(Debug, Default, Deserialize)]
pub struct CacheSection {
    /// Read and write the Parquet table cache.
    pub enabled: Option<bool>,

    /// ZSTD compression level (1-22).
    pub compression_level: Option<i32>,

    /// Number of peaks per Parquet row group.
    pub row_group_size: Option<usize>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// Load the file if one was given, otherwise use the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Apply every setting present in the file onto `config`.
    pub fn apply(&self, mut config: EngineConfig) -> EngineConfig {
        let engine = &self.engine;
        if let Some(threads) = engine.threads {
            config.threads = threads;
        }
        if let Some(max) = engine.variable_max {
            config.variable_max = max;
        }
        if let Some(delta) = engine.variable_delta {
            config.variable_delta = delta;
        }
        if let Some(depth) = engine.max_subquery_depth {
            config.max_subquery_depth = depth;
        }
        if let Some(cross_table) = engine.ms1_mz_cross_table {
            config.ms1_mz_cross_table = cross_table;
        }
        if let Some(bin_width) = engine.bin_width {
            config.bin_width = bin_width;
        }

        let cache = &self.cache;
        if let Some(enabled) = cache.enabled {
            config.use_disk_cache = enabled;
        }
        if let Some(level) = cache.compression_level {
            config.cache.compression = CompressionType::Zstd(level);
        }
        if let Some(row_group_size) = cache.row_group_size {
            config.cache.row_group_size = row_group_size;
        }

        config
    }
}
