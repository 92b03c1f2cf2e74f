use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Barrier;
use std::time::Duration;
use tempfile::tempdir;

struct CountingSource {
    inner: MemorySource,
    calls: AtomicUsize,
}

impl SpectrumSource for CountingSource {
    fn for_each_scan(
        &self,
        run: &Path,
        visit: &mut dyn FnMut(ScanRecord),
    ) -> Result<(), SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Widen the window in which concurrent loads overlap
        std::thread::sleep(Duration::from_millis(20));
        self.inner.for_each_scan(run, visit)
    }
}

fn sample_scans() -> Vec<ScanRecord> {
    vec![
        // MS2 before any MS1
        ScanRecord::ms2(1, 0.1, 250.0, &[(120.0, 30.0)]),
        ScanRecord::ms1(2, 0.2, &[(100.0, 500.0), (0.5, 900.0), (200.0, 0.2), (300.0, 50.0)]),
        ScanRecord::ms2(3, 0.3, 300.0, &[(150.02, 50.0), (85.0, 10.0)]),
        ScanRecord {
            ms_level: 3,
            ..ScanRecord::ms2(4, 0.35, 150.0, &[(60.0, 10.0)])
        },
        ScanRecord {
            precursor_mz: None,
            ..ScanRecord::ms2(5, 0.4, 0.0, &[(70.0, 10.0)])
        },
        ScanRecord::ms1(6, 0.5, &[(400.0, 20.0)]),
        ScanRecord::ms2(7, 0.6, 400.0, &[(110.0, 15.0)]),
    ]
}

fn counting(run: &Path) -> Arc<CountingSource> {
    Arc::new(CountingSource {
        inner: MemorySource::new().with_run(run, sample_scans()),
        calls: AtomicUsize::new(0),
    })
}

#[test]
fn test_peak_filtering_and_order() {
    let source = Arc::new(MemorySource::new().with_run("run.mzML", sample_scans()));
    let provider = SpectralTableProvider::new(source).with_disk_cache(false);
    let tables = provider.load(Path::new("run.mzML")).unwrap();

    // (0.5, 900) and (200, 0.2) are dropped; ascending intensity within the scan
    let scan2: Vec<(f64, f64)> = tables
        .ms1
        .iter()
        .filter(|p| p.scan == 2)
        .map(|p| (p.mz, p.intensity))
        .collect();
    assert_eq!(scan2, vec![(300.0, 50.0), (100.0, 500.0)]);

    let scan3: Vec<f64> = tables
        .ms2
        .iter()
        .filter(|p| p.scan == 3)
        .map(|p| p.mz)
        .collect();
    assert_eq!(scan3, vec![85.0, 150.02]);
}

#[test]
fn test_parent_scan_tracking() {
    let source = Arc::new(MemorySource::new().with_run("run.mzML", sample_scans()));
    let provider = SpectralTableProvider::new(source).with_disk_cache(false);
    let tables = provider.load(Path::new("run.mzML")).unwrap();

    let parents: Vec<(i64, i64)> = tables
        .ms2
        .first_per_scan()
        .iter()
        .map(|p| (p.scan, p.parent_ms1_scan))
        .collect();
    // Scan 4 (MS3) and scan 5 (no precursor) are skipped
    assert_eq!(parents, vec![(1, 0), (3, 2), (7, 6)]);
}

#[test]
fn test_cache_round_trip() {
    let dir = tempdir().unwrap();
    let run = dir.path().join("sample.mzML");
    let source = counting(&run);

    let provider = SpectralTableProvider::new(source.clone()).with_memo(false);
    let first = provider.load(&run).unwrap();

    let paths = CachePaths::for_run(&run);
    assert!(paths.exists());
    assert_eq!(
        paths.ms1.file_name().unwrap().to_str().unwrap(),
        "sample.mzML_ms1.parquet"
    );

    let second = provider.load(&run).unwrap();
    assert_eq!(first, second);
    assert_eq!(second.ms1.labels(), first.ms1.labels());
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_corrupt_cache_is_rebuilt() {
    let dir = tempdir().unwrap();
    let run = dir.path().join("sample.mzML");
    let source = counting(&run);
    let provider = SpectralTableProvider::new(source.clone()).with_memo(false);

    let original = provider.load(&run).unwrap();

    let paths = CachePaths::for_run(&run);
    std::fs::write(&paths.ms1, b"not a parquet file").unwrap();

    let reloaded = provider.load(&run).unwrap();
    assert_eq!(reloaded, original);
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);

    // The rewritten cache is readable again
    let cached = read_tables(&paths).unwrap().unwrap();
    assert_eq!(cached, original);
}

#[test]
fn test_missing_half_triggers_reload() {
    let dir = tempdir().unwrap();
    let run = dir.path().join("sample.mzML");
    let source = counting(&run);
    let provider = SpectralTableProvider::new(source.clone()).with_memo(false);

    provider.load(&run).unwrap();
    std::fs::remove_file(CachePaths::for_run(&run).ms2).unwrap();
    provider.load(&run).unwrap();

    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    assert!(CachePaths::for_run(&run).exists());
}

#[test]
fn test_memo_shares_tables() {
    let dir = tempdir().unwrap();
    let run = dir.path().join("sample.mzML");
    let source = counting(&run);
    let provider = SpectralTableProvider::new(source.clone()).with_disk_cache(false);

    let first = provider.load(&run).unwrap();
    let second = provider.load(&run).unwrap();
    assert_eq!(first, second);
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    assert!(!CachePaths::for_run(&run).ms1.exists());

    provider.clear_memo();
    provider.load(&run).unwrap();
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_concurrent_loads_read_run_once() {
    let dir = tempdir().unwrap();
    let run = dir.path().join("sample.mzML");
    let source = counting(&run);
    let provider = SpectralTableProvider::new(source.clone()).with_disk_cache(false);
    let barrier = Barrier::new(8);

    let loaded: Vec<RunTables> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    provider.load(&run).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    assert!(loaded.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn test_concurrent_loads_share_disk_cache() {
    let dir = tempdir().unwrap();
    let run = dir.path().join("sample.mzML");
    let source = counting(&run);
    let provider = SpectralTableProvider::new(source.clone()).with_memo(false);
    let barrier = Barrier::new(4);

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                barrier.wait();
                provider.load(&run).unwrap();
            });
        }
    });

    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    assert!(CachePaths::for_run(&run).exists());
}

#[test]
fn test_unknown_run() {
    let provider = SpectralTableProvider::new(Arc::new(MemorySource::new())).with_disk_cache(false);
    let err = provider.load(Path::new("missing.mzML")).unwrap_err();
    assert!(matches!(err, SourceError::RunNotFound(_)));
}

#[test]
fn test_writer_properties() {
    let props = CacheConfig::default()
        .with_compression(CompressionType::Snappy)
        .with_row_group_size(1234)
        .to_writer_properties("ms1");
    assert_eq!(props.max_row_group_size(), 1234);

    let metadata = props.key_value_metadata().unwrap();
    assert!(metadata
        .iter()
        .any(|kv| kv.key == "msql:table" && kv.value.as_deref() == Some("ms1")));
}
