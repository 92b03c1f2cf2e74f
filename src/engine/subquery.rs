//! Replaces subquery values with the flattened result of the inner query.

use log::debug;

use super::QueryError;
use crate::query::{ConditionValue, Query};
use crate::result::ResultTable;

/// Resolve every condition whose first value is a subquery
///
/// `execute` runs an inner query at the given nesting depth. `depth` is the
/// depth of `query` itself; the top-level query is at depth 0.
pub fn resolve_subqueries<E>(
    query: &Query,
    depth: usize,
    max_depth: usize,
    mut execute: E,
) -> Result<Query, QueryError>
where
    E: FnMut(&Query, usize) -> Result<ResultTable, QueryError>,
{
    let mut resolved = query.clone();

    for (index, condition) in resolved.conditions.iter_mut().enumerate() {
        let Some(ConditionValue::Subquery(inner)) = condition.value.first() else {
            continue;
        };

        if depth + 1 > max_depth {
            return Err(QueryError::SubqueryDepthExceeded { depth: max_depth });
        }

        let wrap = |source: QueryError| match source {
            depth_error @ QueryError::SubqueryDepthExceeded { .. } => depth_error,
            source => QueryError::SubqueryResolution {
                index,
                source: Box::new(source),
            },
        };

        let result = execute(&**inner, depth + 1).map_err(wrap)?;
        let values = result.value_column().ok_or_else(|| {
            wrap(QueryError::NotFlattenable {
                shape: result.shape(),
            })
        })?;

        debug!(
            "Condition {}: subquery produced {} values",
            index,
            values.len()
        );
        condition.value = values.into_iter().map(ConditionValue::Literal).collect();
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::parse;

    #[test]
    fn test_flattens_precursor_values() {
        let query =
            parse("QUERY MS2DATA WHERE MS2PREC=(QUERY scanmz(MS2DATA) WHERE MS2PROD=85)").unwrap();
        let resolved = resolve_subqueries(&query, 0, 8, |_, depth| {
            assert_eq!(depth, 1);
            Ok(ResultTable::PrecursorMz(vec![300.0, 301.0]))
        })
        .unwrap();

        assert_eq!(
            resolved.conditions[0].value,
            vec![ConditionValue::Literal(300.0), ConditionValue::Literal(301.0)]
        );
    }

    #[test]
    fn test_scan_numbers_are_not_flattenable() {
        let query =
            parse("QUERY MS2DATA WHERE MS2PREC=(QUERY scannum(MS2DATA) WHERE MS2PROD=85)").unwrap();
        let err = resolve_subqueries(&query, 0, 8, |_, _| Ok(ResultTable::ScanNumbers(vec![1])))
            .unwrap_err();

        match err {
            QueryError::SubqueryResolution { index, source } => {
                assert_eq!(index, 0);
                assert!(matches!(*source, QueryError::NotFlattenable { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_depth_limit() {
        let query =
            parse("QUERY MS2DATA WHERE MS2PREC=(QUERY scanmz(MS2DATA) WHERE MS2PROD=85)").unwrap();
        let err = resolve_subqueries(&query, 2, 2, |_, _| Ok(ResultTable::PrecursorMz(vec![])))
            .unwrap_err();
        assert!(matches!(err, QueryError::SubqueryDepthExceeded { depth: 2 }));
    }

    #[test]
    fn test_empty_subquery_result() {
        let query =
            parse("QUERY MS2DATA WHERE MS2PREC=(QUERY scanmz(MS2DATA) WHERE MS2PROD=85)").unwrap();
        let resolved =
            resolve_subqueries(&query, 0, 8, |_, _| Ok(ResultTable::PrecursorMz(vec![]))).unwrap();
        assert!(resolved.conditions[0].value.is_empty());
    }
}
