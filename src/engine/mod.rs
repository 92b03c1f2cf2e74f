//! # Query Engine
//!
//! Executes a [`Query`] against one run:
//!
//! 1. Subquery values are replaced by the flattened results of their inner
//!    queries, evaluated recursively against the same run.
//! 2. A query mentioning the variable `X` is expanded into one candidate per
//!    value of the variable range.
//! 3. Every candidate is evaluated independently on the executor's worker
//!    pool: the run's tables are loaded and narrowed condition by condition.
//! 4. Candidate outputs are concatenated in candidate order, deduplicated,
//!    and collated into the [`ResultTable`] the output clause asks for.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use msql::engine::{Engine, EngineConfig};
//! use msql::provider::{MemorySource, ScanRecord};
//!
//! let source = MemorySource::new().with_run(
//!     "run.mzML",
//!     vec![
//!         ScanRecord::ms1(1, 0.1, &[(300.0, 1000.0)]),
//!         ScanRecord::ms2(2, 0.2, 300.0, &[(150.02, 50.0)]),
//!     ],
//! );
//! let config = EngineConfig::default().with_disk_cache(false);
//! let engine = Engine::with_source(config, Arc::new(source))?;
//!
//! let result = engine.execute("QUERY scannum(MS2DATA) WHERE MS2PROD=150.0", "run.mzML")?;
//! assert_eq!(result.len(), 1);
//! # Ok::<(), msql::engine::QueryError>(())
//! ```

mod collator;
mod error;
mod evaluator;
mod executor;
mod expander;
mod subquery;
mod tolerance;

#[cfg(test)]
mod tests;

use std::path::Path;
use std::sync::Arc;

use log::{debug, info};

pub use collator::{Collator, DEFAULT_BIN_WIDTH};
pub use error::{ConfigError, QueryError};
pub use evaluator::ConditionEvaluator;
pub use executor::QueryExecutor;
pub use expander::{
    expand, substitute, Candidate, VariableRange, DEFAULT_VARIABLE_DELTA, DEFAULT_VARIABLE_MAX,
};
pub use subquery::resolve_subqueries;
pub use tolerance::{resolve_tolerance, DEFAULT_TOLERANCE};

use crate::provider::{CacheConfig, SpectralTableProvider, SpectrumSource};
use crate::query::{parse, Query};
use crate::result::ResultTable;
use crate::table::RunTables;

/// Default maximum nesting depth of subqueries
pub const DEFAULT_MAX_SUBQUERY_DEPTH: usize = 8;

/// Configuration for the query engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Worker threads for candidate evaluation (0 = one per logical CPU)
    pub threads: usize,

    /// Exclusive upper bound of the variable range
    pub variable_max: f64,

    /// Step of the variable range
    pub variable_delta: f64,

    /// Maximum nesting depth of subqueries
    pub max_subquery_depth: usize,

    /// Check the lower `ms1-mz` bound against the MS2 row with the same label
    pub ms1_mz_cross_table: bool,

    /// m/z bin width of `scan-range-sum`
    pub bin_width: f64,

    /// Persist peak tables next to the run
    pub use_disk_cache: bool,

    /// Keep loaded tables in memory for the engine's lifetime
    pub memoize: bool,

    /// Parquet settings of the disk cache
    pub cache: CacheConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            variable_max: DEFAULT_VARIABLE_MAX,
            variable_delta: DEFAULT_VARIABLE_DELTA,
            max_subquery_depth: DEFAULT_MAX_SUBQUERY_DEPTH,
            ms1_mz_cross_table: true,
            bin_width: DEFAULT_BIN_WIDTH,
            use_disk_cache: true,
            memoize: true,
            cache: CacheConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Set the worker thread count
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Set the variable range
    pub fn with_variable_range(mut self, max: f64, delta: f64) -> Self {
        self.variable_max = max;
        self.variable_delta = delta;
        self
    }

    /// Set the maximum subquery depth
    pub fn with_max_subquery_depth(mut self, depth: usize) -> Self {
        self.max_subquery_depth = depth;
        self
    }

    /// Select the cross-table or row-local `ms1-mz` predicate
    pub fn with_ms1_mz_cross_table(mut self, enabled: bool) -> Self {
        self.ms1_mz_cross_table = enabled;
        self
    }

    /// Set the `scan-range-sum` bin width
    pub fn with_bin_width(mut self, bin_width: f64) -> Self {
        self.bin_width = bin_width;
        self
    }

    /// Enable or disable the disk cache
    pub fn with_disk_cache(mut self, enabled: bool) -> Self {
        self.use_disk_cache = enabled;
        self
    }

    /// Enable or disable the in-memory table memo
    pub fn with_memo(mut self, enabled: bool) -> Self {
        self.memoize = enabled;
        self
    }

    /// Set the Parquet settings of the disk cache
    pub fn with_cache_config(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// Variable range described by this configuration
    pub fn variable_range(&self) -> Result<VariableRange, ConfigError> {
        VariableRange::new(self.variable_max, self.variable_delta)
    }

    /// Check every setting
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.variable_range()?;
        if self.bin_width.is_nan() || self.bin_width <= 0.0 {
            return Err(ConfigError::NonPositiveBinWidth(self.bin_width));
        }
        Ok(())
    }
}

/// Executes queries against runs
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    range: VariableRange,
    provider: SpectralTableProvider,
    executor: QueryExecutor,
    evaluator: ConditionEvaluator,
    collator: Collator,
}

impl Engine {
    /// Create an engine reading mzML runs
    #[cfg(feature = "mzml")]
    pub fn new(config: EngineConfig) -> Result<Self, QueryError> {
        Self::with_source(config, Arc::new(crate::provider::MzMLSource::new()))
    }

    /// Create an engine over a custom spectrum source
    pub fn with_source(
        config: EngineConfig,
        source: Arc<dyn SpectrumSource>,
    ) -> Result<Self, QueryError> {
        config.validate()?;
        let range = config.variable_range()?;

        let provider = SpectralTableProvider::new(source)
            .with_cache_config(config.cache.clone())
            .with_disk_cache(config.use_disk_cache)
            .with_memo(config.memoize);
        let executor = QueryExecutor::new(config.threads)?;
        debug!("Engine started with {} worker threads", executor.num_threads());

        Ok(Self {
            range,
            provider,
            executor,
            evaluator: ConditionEvaluator::new(config.ms1_mz_cross_table),
            collator: Collator::new(config.bin_width),
            config,
        })
    }

    /// The engine's configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The table provider, for loading runs without a query
    pub fn provider(&self) -> &SpectralTableProvider {
        &self.provider
    }

    /// Parse and execute query text against `run`
    pub fn execute(&self, query: &str, run: impl AsRef<Path>) -> Result<ResultTable, QueryError> {
        let query = parse(query)?;
        self.execute_query(&query, run)
    }

    /// Execute a parsed query against `run`
    pub fn execute_query(
        &self,
        query: &Query,
        run: impl AsRef<Path>,
    ) -> Result<ResultTable, QueryError> {
        let run = run.as_ref();
        info!("Executing query against {}", run.display());
        let result = self.execute_at_depth(query, run, 0)?;
        info!("Query produced {} rows of {}", result.len(), result.shape());
        Ok(result)
    }

    fn execute_at_depth(
        &self,
        query: &Query,
        run: &Path,
        depth: usize,
    ) -> Result<ResultTable, QueryError> {
        let resolved = resolve_subqueries(
            query,
            depth,
            self.config.max_subquery_depth,
            |inner, inner_depth| self.execute_at_depth(inner, run, inner_depth),
        )?;

        let candidates = expand(&resolved, &self.range);
        debug!("Query expanded into {} candidates", candidates.len());

        let outputs = self
            .executor
            .run(&candidates, |candidate| self.evaluate(&candidate.query, run))?;
        let merged = RunTables::merge(outputs.iter());

        Ok(self.collator.collate(&query.output, &merged))
    }

    /// Load `run` and apply the conditions of a fully resolved query
    pub fn evaluate(&self, query: &Query, run: &Path) -> Result<RunTables, QueryError> {
        let tables = self.provider.load(run)?;
        self.evaluator.apply_all(&query.conditions, tables)
    }

    /// Stop the worker pool
    pub fn shutdown(self) {
        debug!("Shutting down engine");
        drop(self);
    }
}
