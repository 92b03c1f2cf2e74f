//! # Query Language
//!
//! This module defines the typed query tree and the parser that produces it
//! from query text.
//!
//! ## Example
//!
//! ```text
//! QUERY scaninfo(MS2DATA)
//!     WHERE MS2PROD=226.18:TOLERANCEPPM=5 AND MS2PREC=X
//!     FILTER MS1MZ=100
//! ```
//!
//! A query selects either MS1 or MS2 peak data, optionally through an
//! aggregate function, and narrows it with `WHERE` conditions (which join
//! across MS1/MS2 scans) and `FILTER` conditions (which trim rows in place).
//!
//! A condition value is a literal m/z, the free variable `X` (optionally with
//! an offset, `X+14.01`), an alternative list `(150 OR 160)` or a nested query
//! in parentheses whose result supplies the values.
//!
//! The tree is `serde` serializable so that parsed queries can be inspected as
//! JSON and JSON trees can be executed without going through the text parser.

mod error;
mod lexer;
mod parser;


use std::fmt;

use serde::{Deserialize, Serialize};

pub use error::ParseError;
pub use lexer::{Lexer, Token};
pub use parser::{parse, Parser, MAX_NESTING_DEPTH};

/// A complete query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Selection conditions, in source order
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Requested output shape
    pub output: Output,
}

impl Query {
    /// Query returning the raw table of `data_kind`, with no conditions
    pub fn new(data_kind: DataKind) -> Self {
        Self {
            conditions: Vec::new(),
            output: Output {
                data_kind,
                aggregate: None,
            },
        }
    }

    /// Set the aggregate function
    pub fn with_aggregate(mut self, aggregate: Aggregate) -> Self {
        self.output.aggregate = Some(aggregate);
        self
    }

    /// Append a condition
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Whether any condition value refers to the free variable
    pub fn has_variable(&self) -> bool {
        self.conditions
            .iter()
            .flat_map(|c| c.value.iter())
            .any(ConditionValue::is_variable)
    }
}

/// Output shape of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    /// Which peak table is selected
    pub data_kind: DataKind,
    /// Optional aggregate applied to the selected table
    #[serde(default)]
    pub aggregate: Option<Aggregate>,
}

/// Peak table selected by a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    /// MS1 peaks (`MS1DATA`)
    Ms1,
    /// MS2 peaks (`MS2DATA`)
    Ms2,
}

/// Aggregate functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Aggregate {
    /// `scansum`: summed intensity per scan
    ScanSum,
    /// `scanmz`: distinct precursor m/z values
    ScanMz,
    /// `scannum`: distinct scan numbers
    ScanNum,
    /// `scaninfo`: one descriptive row per scan
    ScanInfo,
    /// `scanrangesum`: summed intensity per scan within 0.1 m/z bins
    ScanRangeSum,
}

/// Clause a condition belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Clause {
    /// `WHERE`: selects scans, joining MS1 and MS2
    Where,
    /// `FILTER`: trims rows of the selected data
    Filter,
}

/// What a condition constrains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConditionKind {
    /// `MS1MZ`: an MS1 peak m/z
    Ms1Mz,
    /// `MS2PROD`: an MS2 product ion m/z
    Ms2Product,
    /// `MS2PREC`: the MS2 precursor m/z
    Ms2Precursor,
    /// `MS2NL`: an MS2 neutral loss
    Ms2NeutralLoss,
}

/// A single selection condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Clause the condition appeared in
    pub clause: Clause,
    /// Constrained quantity
    pub kind: ConditionKind,
    /// Target values; only the first is matched against the tables
    pub value: Vec<ConditionValue>,
    /// Tolerance qualifiers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifiers: Option<Qualifiers>,
}

impl Condition {
    /// Condition with a single value and no qualifiers
    pub fn new(clause: Clause, kind: ConditionKind, value: ConditionValue) -> Self {
        Self {
            clause,
            kind,
            value: vec![value],
            qualifiers: None,
        }
    }

    /// `WHERE` condition on a literal target
    pub fn where_literal(kind: ConditionKind, target: f64) -> Self {
        Self::new(Clause::Where, kind, ConditionValue::Literal(target))
    }

    /// Attach qualifiers
    pub fn with_qualifiers(mut self, qualifiers: Qualifiers) -> Self {
        self.qualifiers = Some(qualifiers);
        self
    }
}

/// A condition value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConditionValue {
    /// A concrete m/z (or mass) value
    Literal(f64),
    /// The free variable, optionally shifted by a constant
    Variable {
        /// Constant added to every candidate value
        #[serde(default, skip_serializing_if = "Option::is_none")]
        offset: Option<f64>,
    },
    /// A nested query whose result supplies the values
    Subquery(Box<Query>),
}

impl ConditionValue {
    /// Whether this value is the free variable
    pub fn is_variable(&self) -> bool {
        matches!(self, ConditionValue::Variable { .. })
    }

    /// The literal value, if concrete
    pub fn as_literal(&self) -> Option<f64> {
        match self {
            ConditionValue::Literal(v) => Some(*v),
            _ => None,
        }
    }
}

/// Tolerance qualifiers of a condition
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Qualifiers {
    /// Relative tolerance in parts per million (`TOLERANCEPPM`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ppm_tolerance: Option<f64>,
    /// Absolute tolerance in m/z units (`TOLERANCEMZ`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mz_tolerance: Option<f64>,
}

impl Qualifiers {
    /// Relative tolerance qualifier
    pub fn ppm(ppm: f64) -> Self {
        Self {
            ppm_tolerance: Some(ppm),
            mz_tolerance: None,
        }
    }

    /// Absolute tolerance qualifier
    pub fn mz(tolerance: f64) -> Self {
        Self {
            ppm_tolerance: None,
            mz_tolerance: Some(tolerance),
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataKind::Ms1 => write!(f, "MS1DATA"),
            DataKind::Ms2 => write!(f, "MS2DATA"),
        }
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Aggregate::ScanSum => "scansum",
            Aggregate::ScanMz => "scanmz",
            Aggregate::ScanNum => "scannum",
            Aggregate::ScanInfo => "scaninfo",
            Aggregate::ScanRangeSum => "scanrangesum",
        };
        write!(f, "{}", name)
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clause::Where => write!(f, "WHERE"),
            Clause::Filter => write!(f, "FILTER"),
        }
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConditionKind::Ms1Mz => "MS1MZ",
            ConditionKind::Ms2Product => "MS2PROD",
            ConditionKind::Ms2Precursor => "MS2PREC",
            ConditionKind::Ms2NeutralLoss => "MS2NL",
        };
        write!(f, "{}", name)
    }
}
