//! Expansion of the free variable `X` into concrete candidate queries.

use super::ConfigError;
use crate::query::{ConditionValue, Query};

/// Default upper bound (exclusive) of the variable range
pub const DEFAULT_VARIABLE_MAX: f64 = 1000.0;

/// Default step of the variable range
pub const DEFAULT_VARIABLE_DELTA: f64 = 0.1;

/// The discretized range `[0, max)` the variable is enumerated over
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariableRange {
    max: f64,
    delta: f64,
}

impl Default for VariableRange {
    fn default() -> Self {
        Self {
            max: DEFAULT_VARIABLE_MAX,
            delta: DEFAULT_VARIABLE_DELTA,
        }
    }
}

impl VariableRange {
    /// Create a range; both bounds must be positive
    pub fn new(max: f64, delta: f64) -> Result<Self, ConfigError> {
        if max.is_nan() || max <= 0.0 {
            return Err(ConfigError::NonPositiveMax(max));
        }
        if delta.is_nan() || delta <= 0.0 {
            return Err(ConfigError::NonPositiveDelta(delta));
        }
        Ok(Self { max, delta })
    }

    /// Upper bound (exclusive)
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Step
    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Number of candidates
    pub fn len(&self) -> usize {
        (self.max / self.delta).round() as usize
    }

    /// Whether the range has no candidates
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Candidate values `i * delta`, ascending
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.len()).map(move |i| i as f64 * self.delta)
    }
}

/// One concrete query to evaluate
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Value substituted for the variable; `None` for a query without one
    pub value: Option<f64>,
    /// The query with every variable replaced by a literal
    pub query: Query,
}

/// Expand `query` into one candidate per variable value
///
/// A query without the variable is its own single candidate.
pub fn expand(query: &Query, range: &VariableRange) -> Vec<Candidate> {
    if !query.has_variable() {
        return vec![Candidate {
            value: None,
            query: query.clone(),
        }];
    }

    range
        .values()
        .map(|x| Candidate {
            value: Some(x),
            query: substitute(query, x),
        })
        .collect()
}

/// Replace every variable occurrence with `x + offset`
pub fn substitute(query: &Query, x: f64) -> Query {
    let mut concrete = query.clone();
    for condition in &mut concrete.conditions {
        for value in &mut condition.value {
            if let ConditionValue::Variable { offset } = *value {
                *value = ConditionValue::Literal(x + offset.unwrap_or(0.0));
            }
        }
    }
    concrete
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::parse;

    #[test]
    fn test_no_variable_single_candidate() {
        let query = parse("QUERY MS2DATA WHERE MS2PROD=150").unwrap();
        let candidates = expand(&query, &VariableRange::default());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].value, None);
        assert_eq!(candidates[0].query, query);
    }

    #[test]
    fn test_default_range() {
        let range = VariableRange::default();
        assert_eq!(range.len(), 10_000);
        let values: Vec<f64> = range.values().take(3).collect();
        assert_eq!(values, vec![0.0, 0.1, 0.2]);
    }

    #[test]
    fn test_substitution_with_offsets() {
        let query = parse("QUERY MS2DATA WHERE MS2PREC=X AND MS2PROD=(X+14 OR 100 OR X-2)").unwrap();
        let range = VariableRange::new(3.0, 1.0).unwrap();
        let candidates = expand(&query, &range);

        assert_eq!(candidates.len(), 3);
        let last = &candidates[2];
        assert_eq!(last.value, Some(2.0));
        assert_eq!(last.query.conditions[0].value, vec![ConditionValue::Literal(2.0)]);
        assert_eq!(
            last.query.conditions[1].value,
            vec![
                ConditionValue::Literal(16.0),
                ConditionValue::Literal(100.0),
                ConditionValue::Literal(0.0),
            ]
        );
        assert!(candidates.iter().all(|c| !c.query.has_variable()));
    }

    #[test]
    fn test_invalid_range() {
        assert_eq!(
            VariableRange::new(0.0, 0.1),
            Err(ConfigError::NonPositiveMax(0.0))
        );
        assert_eq!(
            VariableRange::new(10.0, -1.0),
            Err(ConfigError::NonPositiveDelta(-1.0))
        );
    }
}
