//! Applies resolved conditions to a run's table pair.
//!
//! All windows are open intervals. Conditions in the `where` clause run first,
//! in order, followed by the `filter` clause; each one narrows the tables it
//! is given and returns new ones.

use std::collections::HashSet;

use log::debug;

use super::tolerance::{resolve_tolerance, DEFAULT_TOLERANCE};
use super::QueryError;
use crate::query::{Clause, Condition, ConditionKind, ConditionValue};
use crate::table::RunTables;

/// Open m/z interval
#[derive(Debug, Clone, Copy, PartialEq)]
struct Window {
    lower: f64,
    upper: f64,
}

impl Window {
    fn around(target: f64, tolerance: f64) -> Self {
        Self {
            lower: target - tolerance,
            upper: target + tolerance,
        }
    }

    #[inline]
    fn contains(&self, value: f64) -> bool {
        self.lower < value && value < self.upper
    }
}

/// Applies conditions to table pairs
#[derive(Debug, Clone, Copy)]
pub struct ConditionEvaluator {
    ms1_mz_cross_table: bool,
}

impl Default for ConditionEvaluator {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ConditionEvaluator {
    /// Create an evaluator
    ///
    /// With `ms1_mz_cross_table` set, the lower bound of an `ms1-mz` window is
    /// checked against the m/z of the MS2 row that carries the same row label.
    pub fn new(ms1_mz_cross_table: bool) -> Self {
        Self { ms1_mz_cross_table }
    }

    /// Apply every condition: `where` clauses first, then `filter` clauses
    pub fn apply_all(
        &self,
        conditions: &[Condition],
        tables: RunTables,
    ) -> Result<RunTables, QueryError> {
        let ordered = conditions
            .iter()
            .enumerate()
            .filter(|(_, c)| c.clause == Clause::Where)
            .chain(
                conditions
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| c.clause == Clause::Filter),
            );

        let mut tables = tables;
        for (index, condition) in ordered {
            tables = self.apply(index, condition, &tables)?;
        }
        Ok(tables)
    }

    /// Apply one condition; `index` is its position in the query
    pub fn apply(
        &self,
        index: usize,
        condition: &Condition,
        tables: &RunTables,
    ) -> Result<RunTables, QueryError> {
        let target = match condition.value.first() {
            Some(ConditionValue::Literal(value)) => Some(*value),
            Some(ConditionValue::Variable { .. }) | Some(ConditionValue::Subquery(_)) => {
                return Err(QueryError::UnresolvedValue { index });
            }
            // No values: nothing can match
            None => None,
        };

        if condition.qualifiers.is_some() && condition.kind != ConditionKind::Ms2Product {
            debug!(
                "Condition {}: qualifiers are ignored for {}",
                index, condition.kind
            );
        }

        let window = |tolerance: f64| target.map(|t| Window::around(t, tolerance));
        let matches = |window: Option<Window>, value: f64| window.is_some_and(|w| w.contains(value));

        match (condition.clause, condition.kind) {
            (Clause::Where, ConditionKind::Ms2Product) => {
                let window = target.map(|t| {
                    Window::around(t, resolve_tolerance(condition.qualifiers.as_ref(), t))
                });
                let hits = tables.ms2.filter(|row| matches(window, row.mz));
                Ok(propagate_ms2_scans(tables, &hits.scans()))
            }
            (Clause::Where, ConditionKind::Ms2Precursor) => {
                let window = window(DEFAULT_TOLERANCE);
                Ok(RunTables::new(
                    tables.ms1.clone(),
                    tables.ms2.filter(|row| matches(window, row.precursor_mz)),
                ))
            }
            (Clause::Where, ConditionKind::Ms2NeutralLoss) => {
                let window = window(DEFAULT_TOLERANCE);
                let hits = tables.ms2.filter(|row| matches(window, row.neutral_loss()));
                Ok(propagate_ms2_scans(tables, &hits.scans()))
            }
            (Clause::Where, ConditionKind::Ms1Mz) => {
                let hits = self.ms1_mz_rows(tables, window(DEFAULT_TOLERANCE));
                Ok(RunTables::new(
                    tables.ms1.retain_scans(&hits.scans()),
                    tables.ms2.clone(),
                ))
            }
            (Clause::Filter, ConditionKind::Ms1Mz) => {
                let hits = self.ms1_mz_rows(tables, window(DEFAULT_TOLERANCE));
                Ok(RunTables::new(hits, tables.ms2.clone()))
            }
            (clause @ Clause::Filter, kind) => Err(QueryError::UnsupportedCondition {
                index,
                clause,
                kind,
            }),
        }
    }

    /// MS1 rows inside an `ms1-mz` window
    fn ms1_mz_rows(&self, tables: &RunTables, window: Option<Window>) -> crate::table::Ms1Table {
        let Some(window) = window else {
            return tables.ms1.filter(|_| false);
        };

        if !self.ms1_mz_cross_table {
            return tables.ms1.filter(|row| window.contains(row.mz));
        }

        let lower_ok: HashSet<usize> = tables
            .ms2
            .iter()
            .zip(tables.ms2.labels())
            .filter(|(row, _)| row.mz > window.lower)
            .map(|(_, &label)| label)
            .collect();

        tables
            .ms1
            .filter_labelled(|label, row| lower_ok.contains(&label) && row.mz < window.upper)
    }
}

/// Keep MS2 rows of the given scans and the MS1 rows of their parent scans
fn propagate_ms2_scans(tables: &RunTables, scans: &HashSet<i64>) -> RunTables {
    let ms2 = tables.ms2.retain_scans(scans);
    let parents: HashSet<i64> = ms2.iter().map(|row| row.parent_ms1_scan).collect();
    let ms1 = tables.ms1.retain_scans(&parents);
    RunTables::new(ms1, ms2)
}
