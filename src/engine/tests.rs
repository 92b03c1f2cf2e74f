use super::*;
use crate::provider::{MemorySource, ScanRecord};
use crate::query::{Clause, ConditionKind};
use proptest::prelude::*;

const RUN: &str = "sample.mzML";

fn sample_scans() -> Vec<ScanRecord> {
    vec![
        ScanRecord::ms1(1, 0.1, &[(300.0, 1000.0), (400.0, 200.0)]),
        ScanRecord::ms2(2, 0.2, 300.0, &[(150.02, 50.0)]),
        ScanRecord::ms2(3, 0.3, 400.0, &[(90.0, 20.0), (310.0, 5.0)]),
        ScanRecord::ms1(4, 0.4, &[(500.0, 80.0)]),
        ScanRecord::ms2(5, 0.5, 500.0, &[(85.0, 40.0)]),
    ]
}

fn engine_with(config: EngineConfig, scans: Vec<ScanRecord>) -> Engine {
    let source = MemorySource::new().with_run(RUN, scans);
    Engine::with_source(config.with_disk_cache(false), Arc::new(source)).unwrap()
}

fn engine() -> Engine {
    engine_with(EngineConfig::default().with_threads(2), sample_scans())
}

#[test]
fn test_product_ion_selects_ms2_and_parent_ms1() {
    let engine = engine();

    let ResultTable::Ms2Peaks(ms2) = engine.execute("QUERY MS2DATA WHERE MS2PROD=150.0", RUN).unwrap()
    else {
        panic!("expected MS2 peaks");
    };
    assert_eq!(ms2.len(), 1);
    assert_eq!(ms2.rows()[0].scan, 2);
    assert_eq!(ms2.rows()[0].parent_ms1_scan, 1);

    let ResultTable::Ms1Peaks(ms1) = engine.execute("QUERY MS1DATA WHERE MS2PROD=150.0", RUN).unwrap()
    else {
        panic!("expected MS1 peaks");
    };
    assert!(ms1.iter().all(|p| p.scan == 1));
    assert_eq!(ms1.len(), 2);
}

#[test]
fn test_no_match_is_empty() {
    let engine = engine();
    let result = engine.execute("QUERY MS2DATA WHERE MS2PROD=200.0", RUN).unwrap();
    assert!(result.is_empty());

    let scans = engine.execute("QUERY scannum(MS1DATA) WHERE MS2PROD=200.0", RUN).unwrap();
    assert_eq!(scans, ResultTable::ScanNumbers(vec![]));
}

#[test]
fn test_precursor_and_scan_info() {
    let engine = engine();
    let result = engine
        .execute("QUERY scaninfo(MS2DATA) WHERE MS2PREC=400.05", RUN)
        .unwrap();
    let ResultTable::Ms2ScanInfo(rows) = result else {
        panic!("expected MS2 scan info");
    };
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].scan, 3);
    assert_eq!(rows[0].parent_ms1_scan, 1);
}

#[test]
fn test_neutral_loss() {
    let engine = engine();
    // 500 - 85 = 415
    let result = engine
        .execute("QUERY scannum(MS2DATA) WHERE MS2NL=415", RUN)
        .unwrap();
    assert_eq!(result, ResultTable::ScanNumbers(vec![5]));
}

#[test]
fn test_execution_is_idempotent() {
    let engine = engine();
    let text = "QUERY MS1DATA WHERE MS2PROD=X";
    let config = EngineConfig::default().with_variable_range(200.0, 1.0);
    let engine_small = engine_with(config, sample_scans());

    let first = engine_small.execute(text, RUN).unwrap();
    let second = engine_small.execute(text, RUN).unwrap();
    assert_eq!(first, second);

    let a = engine.execute("QUERY scansum(MS1DATA)", RUN).unwrap();
    let b = engine.execute("QUERY scansum(MS1DATA)", RUN).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_variable_candidates_are_merged() {
    let config = EngineConfig::default().with_variable_range(200.0, 1.0);
    let engine = engine_with(config, sample_scans());

    // X = 85 and X = 90 hit scans 5 and 3, X = 150 hits scan 2
    let result = engine
        .execute("QUERY scanmz(MS2DATA) WHERE MS2PROD=X", RUN)
        .unwrap();
    assert_eq!(result, ResultTable::PrecursorMz(vec![300.0, 400.0, 500.0]));
}

#[test]
fn test_subquery_end_to_end() {
    let engine = engine();
    let result = engine
        .execute(
            "QUERY scaninfo(MS2DATA) WHERE MS2PREC=(QUERY scanmz(MS2DATA) WHERE MS2PROD=150.0)",
            RUN,
        )
        .unwrap();
    let ResultTable::Ms2ScanInfo(rows) = result else {
        panic!("expected MS2 scan info");
    };
    let scans: Vec<i64> = rows.iter().map(|r| r.scan).collect();
    assert_eq!(scans, vec![2]);
}

#[test]
fn test_empty_subquery_matches_nothing() {
    let engine = engine();
    let result = engine
        .execute(
            "QUERY MS2DATA WHERE MS2PREC=(QUERY scanmz(MS2DATA) WHERE MS2PROD=999.0)",
            RUN,
        )
        .unwrap();
    assert!(result.is_empty());
}

#[test]
fn test_subquery_depth_limit() {
    let config = EngineConfig::default().with_max_subquery_depth(1);
    let engine = engine_with(config, sample_scans());
    let err = engine
        .execute(
            "QUERY MS2DATA WHERE MS2PREC=(QUERY scanmz(MS2DATA) WHERE MS2PREC=(QUERY scanmz(MS2DATA) WHERE MS2PROD=150.0))",
            RUN,
        )
        .unwrap_err();
    assert!(matches!(err, QueryError::SubqueryDepthExceeded { depth: 1 }));
}

#[test]
fn test_unsupported_filter_condition() {
    let engine = engine();
    let err = engine
        .execute("QUERY MS2DATA FILTER MS2PROD=150.0", RUN)
        .unwrap_err();
    assert!(matches!(
        err,
        QueryError::UnsupportedCondition {
            index: 0,
            clause: Clause::Filter,
            kind: ConditionKind::Ms2Product,
        }
    ));
}

#[test]
fn test_unresolved_value_in_evaluate() {
    let engine = engine();
    let query = parse("QUERY MS2DATA WHERE MS2PREC=X").unwrap();
    let err = engine.evaluate(&query, Path::new(RUN)).unwrap_err();
    assert!(matches!(err, QueryError::UnresolvedValue { index: 0 }));
}

#[test]
fn test_unknown_run() {
    let engine = engine();
    let err = engine.execute("QUERY MS1DATA", "missing.mzML").unwrap_err();
    assert!(matches!(err, QueryError::Source(_)));
}

#[test]
fn test_parse_error_is_reported() {
    let engine = engine();
    let err = engine.execute("QUERY MS3DATA", RUN).unwrap_err();
    assert!(matches!(err, QueryError::Parse(_)));
}

#[test]
fn test_invalid_config() {
    let config = EngineConfig::default().with_variable_range(1000.0, 0.0);
    assert_eq!(config.validate(), Err(ConfigError::NonPositiveDelta(0.0)));

    let source = Arc::new(MemorySource::new());
    let err = Engine::with_source(config, source).unwrap_err();
    assert!(matches!(
        err,
        QueryError::Config(ConfigError::NonPositiveDelta(_))
    ));

    let config = EngineConfig::default().with_bin_width(-0.1);
    assert_eq!(
        config.validate(),
        Err(ConfigError::NonPositiveBinWidth(-0.1))
    );
}

#[test]
fn test_filter_ms1_mz_row_local() {
    let config = EngineConfig::default().with_ms1_mz_cross_table(false);
    let engine = engine_with(config, sample_scans());
    let result = engine
        .execute("QUERY MS1DATA FILTER MS1MZ=400.0", RUN)
        .unwrap();
    let ResultTable::Ms1Peaks(ms1) = result else {
        panic!("expected MS1 peaks");
    };
    assert_eq!(ms1.len(), 1);
    assert_eq!(ms1.rows()[0].mz, 400.0);
}

fn ms1_rows(result: ResultTable) -> Vec<(f64, i64)> {
    let ResultTable::Ms1Peaks(ms1) = result else {
        panic!("expected MS1 peaks");
    };
    ms1.iter().map(|p| (p.mz, p.scan)).collect()
}

// Sample row labels, after peaks are sorted by intensity:
// MS1 0:(400, scan 1) 1:(300, scan 1) 2:(500, scan 4)
// MS2 0:(150.02, scan 2) 1:(310, scan 3) 2:(90, scan 3) 3:(85, scan 5)

#[test]
fn test_ms1_mz_cross_table_misses() {
    let engine = engine();
    // No MS2 row reaches the lower bounds of these windows
    let result = engine.execute("QUERY MS1DATA WHERE MS1MZ=400.0", RUN).unwrap();
    assert!(result.is_empty());
    let result = engine.execute("QUERY MS1DATA FILTER MS1MZ=500.0", RUN).unwrap();
    assert!(result.is_empty());
}

#[test]
fn test_ms1_mz_cross_table_where_keeps_scan() {
    let engine = engine();
    // MS2 label 1 (310) is above 299.9 and MS1 label 1 (300) is below 300.1
    let mut rows = ms1_rows(engine.execute("QUERY MS1DATA WHERE MS1MZ=300.0", RUN).unwrap());
    rows.sort_by(|a, b| a.0.total_cmp(&b.0));
    assert_eq!(rows, vec![(300.0, 1), (400.0, 1)]);
}

#[test]
fn test_ms1_mz_cross_table_filter_uses_ms2_lower_bound() {
    // 300 lies outside 310 +/- 0.1 but its label partner in MS2 is inside
    let engine = engine();
    let rows = ms1_rows(engine.execute("QUERY MS1DATA FILTER MS1MZ=310.0", RUN).unwrap());
    assert_eq!(rows, vec![(300.0, 1)]);

    let config = EngineConfig::default().with_ms1_mz_cross_table(false);
    let row_local = engine_with(config, sample_scans());
    let result = row_local
        .execute("QUERY MS1DATA FILTER MS1MZ=310.0", RUN)
        .unwrap();
    assert!(result.is_empty());
}

#[test]
fn test_where_conditions_are_idempotent() {
    let engine = engine();
    let tables = engine.provider().load(Path::new(RUN)).unwrap();

    for cross_table in [true, false] {
        let evaluator = ConditionEvaluator::new(cross_table);
        for text in [
            "QUERY MS1DATA WHERE MS2PROD=150.0",
            "QUERY MS1DATA WHERE MS2NL=415",
            "QUERY MS1DATA WHERE MS2PREC=400.0",
            "QUERY MS1DATA WHERE MS1MZ=300.0",
        ] {
            let query = parse(text).unwrap();
            let condition = &query.conditions[0];
            let once = evaluator.apply(0, condition, &tables).unwrap();
            let twice = evaluator.apply(0, condition, &once).unwrap();
            assert_eq!(twice, once, "{} changed on second application", text);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_thread_count_does_not_change_result(
        products in prop::collection::vec(1.0f64..60.0, 1..6),
    ) {
        let mut scans = vec![ScanRecord::ms1(1, 0.1, &[(300.0, 1000.0)])];
        for (i, mz) in products.iter().enumerate() {
            scans.push(ScanRecord::ms2(i as i64 + 2, 0.2, 300.0 + i as f64, &[(*mz, 10.0)]));
        }

        let text = "QUERY scaninfo(MS2DATA) WHERE MS2PROD=X";
        let base = EngineConfig::default().with_variable_range(60.0, 1.0);

        let single = engine_with(base.clone().with_threads(1), scans.clone())
            .execute(text, RUN)
            .unwrap();
        let parallel = engine_with(base.with_threads(4), scans)
            .execute(text, RUN)
            .unwrap();
        prop_assert_eq!(single, parallel);
    }
}
