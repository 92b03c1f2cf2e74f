//! # msql - Query Language for Mass Spectrometry Runs
//!
//! `msql` parses and executes MassQL-style queries against raw mass
//! spectrometry runs. A run is reduced to two long peak tables (one row per
//! peak, MS1 and MS2), which are narrowed by the query's conditions and shaped
//! into the requested result.
//!
//! ## Key Features
//!
//! - **Typed Query Tree**: Query text is parsed into a `serde`-serializable tree
//!   of conditions, values and qualifiers.
//!
//! - **Variable Expansion**: Queries containing the free variable `X` are
//!   evaluated for every value of a discretized m/z range, in parallel on a
//!   dedicated worker pool.
//!
//! - **Subqueries**: A nested query's result supplies the values of a
//!   condition.
//!
//! - **Parquet Table Cache**: Peak tables are persisted next to the run with
//!   ZSTD compression so repeated queries skip raw-file parsing.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use msql::engine::{Engine, EngineConfig};
//! use msql::result::ResultTable;
//!
//! let engine = Engine::new(EngineConfig::default())?;
//! let result = engine.execute(
//!     "QUERY scaninfo(MS2DATA) WHERE MS2PROD=226.18:TOLERANCEPPM=5",
//!     "sample.mzML",
//! )?;
//!
//! if let ResultTable::Ms2ScanInfo(rows) = &result {
//!     for row in rows {
//!         println!("scan {} precursor {:.4}", row.scan, row.precursor_mz);
//!     }
//! }
//! # Ok::<(), msql::engine::QueryError>(())
//! ```
//!
//! ## Architecture
//!
//! The library is organized into the following modules:
//!
//! - [`query`]: Lexer, parser and typed query tree
//! - [`table`]: MS1/MS2 peak tables and their Arrow schemas
//! - [`provider`]: Raw-run loading, peak filtering and the Parquet cache
//! - [`engine`]: Subquery resolution, variable expansion, evaluation and collation
//! - [`result`]: Result shapes and TSV export
//! - `mzml`: Streaming mzML reader (feature `mzml`)
//!
//! ## Peak Tables
//!
//! | Column | MS1 | MS2 | Description |
//! |--------|-----|-----|-------------|
//! | mz | Float64 | Float64 | Peak m/z |
//! | i | Float64 | Float64 | Peak intensity |
//! | scan | Int64 | Int64 | Scan number |
//! | rt | Float64 | Float64 | Retention time in minutes |
//! | precmz | | Float64 | Precursor m/z |
//! | ms1scan | | Int64 | Most recent MS1 scan before the MS2 scan |

#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod engine;
#[cfg(feature = "mzml")]
pub mod mzml;
pub mod provider;
pub mod query;
pub mod result;
pub mod table;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::engine::{ConfigError, Engine, EngineConfig, QueryError};
    pub use crate::provider::{
        CacheConfig, MemorySource, ScanRecord, SourceError, SpectralTableProvider, SpectrumSource,
    };
    #[cfg(feature = "mzml")]
    pub use crate::provider::MzMLSource;
    pub use crate::query::{
        parse, Aggregate, Clause, Condition, ConditionKind, ConditionValue, DataKind, ParseError,
        Qualifiers, Query,
    };
    pub use crate::result::ResultTable;
    pub use crate::table::{Ms1Peak, Ms1Table, Ms2Peak, Ms2Table, RunTables};
}
