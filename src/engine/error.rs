use crate::provider::SourceError;
use crate::query::{Clause, ConditionKind, ParseError};

/// Invalid engine configuration
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Variable range upper bound must be positive
    #[error("variable maximum must be positive, got {0}")]
    NonPositiveMax(f64),

    /// Variable step must be positive
    #[error("variable step must be positive, got {0}")]
    NonPositiveDelta(f64),

    /// Binning width must be positive
    #[error("bin width must be positive, got {0}")]
    NonPositiveBinWidth(f64),
}

/// Errors raised while executing a query
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// Query text could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// No evaluator exists for this clause and condition kind
    #[error("Condition {index}: {kind} is not supported in a {clause} clause")]
    UnsupportedCondition {
        /// Position of the condition in the query
        index: usize,
        /// Clause of the condition
        clause: Clause,
        /// Kind of the condition
        kind: ConditionKind,
    },

    /// A variable or subquery value reached the evaluator
    #[error("Condition {index}: value was not resolved to a number before evaluation")]
    UnresolvedValue {
        /// Position of the condition in the query
        index: usize,
    },

    /// A subquery failed or produced a result without an m/z column
    #[error("Condition {index}: subquery failed: {source}")]
    SubqueryResolution {
        /// Position of the condition in the query
        index: usize,
        /// Cause
        #[source]
        source: Box<QueryError>,
    },

    /// Subqueries are nested deeper than allowed
    #[error("Subqueries nested deeper than {depth} levels")]
    SubqueryDepthExceeded {
        /// Configured maximum depth
        depth: usize,
    },

    /// A subquery result has no column that can feed a condition
    #[error("A result of {shape} cannot be used as a condition value")]
    NotFlattenable {
        /// Shape of the offending result
        shape: &'static str,
    },

    /// Evaluating one variable candidate failed
    #[error("Evaluation failed for X = {candidate}: {source}")]
    TaskExecution {
        /// Candidate value of the variable
        candidate: f64,
        /// Cause
        #[source]
        source: Box<QueryError>,
    },

    /// The raw run could not be read
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Engine configuration is invalid
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The worker pool could not be built
    #[error("Failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
