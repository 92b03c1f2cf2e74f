use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use msql::engine::{ConditionEvaluator, Engine, EngineConfig};
use msql::provider::{MemorySource, ScanRecord};
use msql::query::parse;
use msql::table::RunTables;
use std::path::Path;
use std::sync::Arc;

const RUN: &str = "bench.mzML";

/// Synthetic run: one MS1 scan followed by nine MS2 scans, repeated
fn synthetic_scans(num_scans: usize, peaks_per_scan: usize) -> Vec<ScanRecord> {
    (0..num_scans)
        .map(|i| {
            let scan = i as i64 + 1;
            let rt = i as f64 * 0.01;
            let peaks: Vec<(f64, f64)> = (0..peaks_per_scan)
                .map(|j| (50.0 + j as f64 * 7.3 + (i % 13) as f64 * 0.01, 100.0 + j as f64))
                .collect();
            if i % 10 == 0 {
                ScanRecord::ms1(scan, rt, &peaks)
            } else {
                ScanRecord::ms2(scan, rt, 200.0 + (i % 50) as f64 * 5.0, &peaks)
            }
        })
        .collect()
}

fn engine(config: EngineConfig, num_scans: usize) -> Engine {
    let source = MemorySource::new().with_run(RUN, synthetic_scans(num_scans, 50));
    Engine::with_source(config.with_disk_cache(false), Arc::new(source)).unwrap()
}

/// Benchmark single-candidate condition evaluation
fn bench_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluation");
    let evaluator = ConditionEvaluator::default();

    for num_scans in [1_000, 10_000] {
        let engine = engine(EngineConfig::default(), num_scans);
        let tables: RunTables = engine.provider().load(Path::new(RUN)).unwrap();
        let query = parse("QUERY MS2DATA WHERE MS2PROD=123.0 AND MS2PREC=300").unwrap();

        group.throughput(Throughput::Elements(tables.ms2.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}scans", num_scans)),
            &tables,
            |b, tables| {
                b.iter(|| {
                    let result = evaluator
                        .apply_all(black_box(&query.conditions), tables.clone())
                        .unwrap();
                    black_box(result);
                });
            },
        );
    }

    group.finish();
}

/// Benchmark variable fan-out across thread counts
fn bench_variable_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("variable_fanout");
    group.sample_size(10);

    for threads in [1, 4] {
        let config = EngineConfig::default()
            .with_threads(threads)
            .with_variable_range(500.0, 1.0);
        let engine = engine(config, 1_000);
        // Warm the memo so only evaluation is measured
        engine.provider().load(Path::new(RUN)).unwrap();

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}threads", threads)),
            &engine,
            |b, engine| {
                b.iter(|| {
                    let result = engine
                        .execute(black_box("QUERY scanmz(MS2DATA) WHERE MS2PROD=X"), RUN)
                        .unwrap();
                    black_box(result);
                });
            },
        );
    }

    group.finish();
}

/// Benchmark query parsing
fn bench_parse(c: &mut Criterion) {
    let text = "QUERY scaninfo(MS2DATA) WHERE MS2PROD=226.18:TOLERANCEPPM=5 AND \
                MS2PREC=(QUERY scanmz(MS2DATA) WHERE MS2NL=163) FILTER MS1MZ=X+2.0";

    c.bench_function("parse", |b| {
        b.iter(|| black_box(parse(black_box(text)).unwrap()));
    });
}

criterion_group!(benches, bench_evaluation, bench_variable_fanout, bench_parse);
criterion_main!(benches);
