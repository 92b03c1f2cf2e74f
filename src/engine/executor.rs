//! Fan-out of candidate evaluations over a dedicated worker pool.

use std::sync::atomic::{AtomicUsize, Ordering};

use log::info;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use super::expander::Candidate;
use super::QueryError;

/// Owns the worker pool candidate evaluations run on
pub struct QueryExecutor {
    pool: ThreadPool,
}

impl std::fmt::Debug for QueryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryExecutor")
            .field("threads", &self.pool.current_num_threads())
            .finish()
    }
}

impl QueryExecutor {
    /// Build a pool with `threads` workers (0 = one per logical CPU)
    pub fn new(threads: usize) -> Result<Self, QueryError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("msql-worker-{}", i))
            .build()?;
        Ok(Self { pool })
    }

    /// Number of worker threads
    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Evaluate `task` for every candidate and return the outputs in
    /// candidate order
    ///
    /// A single candidate runs on the calling thread. Otherwise all tasks run
    /// to completion on the pool; the first failure in candidate order is
    /// returned.
    pub fn run<T, F>(&self, candidates: &[Candidate], task: F) -> Result<Vec<T>, QueryError>
    where
        T: Send,
        F: Fn(&Candidate) -> Result<T, QueryError> + Sync,
    {
        if let [candidate] = candidates {
            return task(candidate)
                .map(|output| vec![output])
                .map_err(|e| with_candidate(candidate, e));
        }

        let total = candidates.len();
        let step = (total / 10).max(1);
        let done = AtomicUsize::new(0);

        info!(
            "Evaluating {} candidates on {} threads",
            total,
            self.num_threads()
        );

        let outputs: Vec<Result<T, QueryError>> = self.pool.install(|| {
            candidates
                .par_iter()
                .map(|candidate| {
                    let output = task(candidate);
                    let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                    if finished % step == 0 || finished == total {
                        info!("Evaluated {}/{} candidates", finished, total);
                    }
                    output
                })
                .collect()
        });

        outputs
            .into_iter()
            .zip(candidates)
            .map(|(output, candidate)| output.map_err(|e| with_candidate(candidate, e)))
            .collect()
    }
}

fn with_candidate(candidate: &Candidate, source: QueryError) -> QueryError {
    match candidate.value {
        Some(value) => QueryError::TaskExecution {
            candidate: value,
            source: Box::new(source),
        },
        None => source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{DataKind, Query};

    fn candidates(n: usize) -> Vec<Candidate> {
        (0..n)
            .map(|i| Candidate {
                value: Some(i as f64),
                query: Query::new(DataKind::Ms1),
            })
            .collect()
    }

    #[test]
    fn test_preserves_candidate_order() {
        let executor = QueryExecutor::new(4).unwrap();
        let outputs = executor
            .run(&candidates(100), |c| Ok(c.value.unwrap_or(-1.0)))
            .unwrap();
        let expected: Vec<f64> = (0..100).map(|i| i as f64).collect();
        assert_eq!(outputs, expected);
    }

    #[test]
    fn test_first_failure_in_candidate_order() {
        let executor = QueryExecutor::new(4).unwrap();
        let err = executor
            .run(&candidates(50), |c| match c.value {
                Some(v) if v >= 20.0 => Err(QueryError::UnresolvedValue { index: v as usize }),
                _ => Ok(()),
            })
            .unwrap_err();

        match err {
            QueryError::TaskExecution { candidate, source } => {
                assert_eq!(candidate, 20.0);
                assert!(matches!(*source, QueryError::UnresolvedValue { index: 20 }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_single_candidate_without_value() {
        let executor = QueryExecutor::new(1).unwrap();
        let single = vec![Candidate {
            value: None,
            query: Query::new(DataKind::Ms2),
        }];
        let err = executor
            .run(&single, |_| -> Result<(), QueryError> {
                Err(QueryError::UnresolvedValue { index: 0 })
            })
            .unwrap_err();
        assert!(matches!(err, QueryError::UnresolvedValue { index: 0 }));
    }
}
