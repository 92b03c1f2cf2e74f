use super::*;

fn ms1(mz: f64, intensity: f64, scan: i64) -> Ms1Peak {
    Ms1Peak {
        mz,
        intensity,
        scan,
        retention_time: scan as f64 * 0.5,
    }
}

fn ms2(mz: f64, scan: i64, parent: i64) -> Ms2Peak {
    Ms2Peak {
        mz,
        intensity: 100.0,
        scan,
        retention_time: 1.0,
        precursor_mz: 300.0,
        parent_ms1_scan: parent,
    }
}

#[test]
fn test_new_assigns_positional_labels() {
    let table = Ms1Table::new(vec![ms1(100.0, 5.0, 1), ms1(200.0, 6.0, 2)]);
    assert_eq!(table.labels(), &[0, 1]);
    assert_eq!(table.len(), 2);
}

#[test]
fn test_filter_keeps_labels() {
    let table = Ms1Table::new(vec![
        ms1(100.0, 5.0, 1),
        ms1(200.0, 6.0, 2),
        ms1(300.0, 7.0, 3),
    ]);
    let filtered = table.filter(|row| row.mz > 150.0);
    assert_eq!(filtered.len(), 2);
    assert_eq!(filtered.labels(), &[1, 2]);
    // Source is untouched
    assert_eq!(table.len(), 3);
}

#[test]
fn test_retain_scans() {
    let table = Ms2Table::new(vec![ms2(100.0, 2, 1), ms2(110.0, 2, 1), ms2(120.0, 4, 3)]);
    let scans: HashSet<i64> = [4].into_iter().collect();
    let kept = table.retain_scans(&scans);
    assert_eq!(kept.len(), 1);
    assert_eq!(kept.rows()[0].scan, 4);
}

#[test]
fn test_distinct_ignores_labels() {
    let a = Ms1Table::new(vec![ms1(100.0, 5.0, 1), ms1(200.0, 6.0, 2)]);
    let b = Ms1Table::new(vec![ms1(200.0, 6.0, 2), ms1(300.0, 7.0, 3)]);
    let merged = Ms1Table::concat([&a, &b]).distinct();
    assert_eq!(merged.len(), 3);
    assert_eq!(merged.labels(), &[0, 1, 1]);
}

#[test]
fn test_scan_sum_uses_first_row_fields() {
    let table = Ms1Table::new(vec![
        ms1(150.0, 10.0, 2),
        ms1(100.0, 5.0, 1),
        ms1(120.0, 7.0, 1),
    ]);
    let summed = table.scan_sum();
    assert_eq!(summed.len(), 2);
    assert_eq!(summed.rows()[0].scan, 1);
    assert_eq!(summed.rows()[0].mz, 100.0);
    assert_eq!(summed.rows()[0].intensity, 12.0);
    assert_eq!(summed.rows()[1].scan, 2);
    assert_eq!(summed.rows()[1].intensity, 10.0);
}

#[test]
fn test_first_per_scan_orders_by_scan() {
    let table = Ms2Table::new(vec![ms2(100.0, 5, 4), ms2(110.0, 3, 1), ms2(90.0, 3, 1)]);
    let firsts = table.first_per_scan();
    let scans: Vec<i64> = firsts.iter().map(|r| r.scan).collect();
    assert_eq!(scans, vec![3, 5]);
    assert_eq!(firsts[0].mz, 110.0);
}

#[test]
fn test_merge_deduplicates_each_table() {
    let pair = RunTables::new(
        Ms1Table::new(vec![ms1(100.0, 5.0, 1)]),
        Ms2Table::new(vec![ms2(100.0, 2, 1)]),
    );
    let merged = RunTables::merge([&pair, &pair, &pair]);
    assert_eq!(merged.ms1.len(), 1);
    assert_eq!(merged.ms2.len(), 1);
}

#[test]
fn test_neutral_loss() {
    let peak = ms2(120.0, 2, 1);
    assert!((peak.neutral_loss() - 180.0).abs() < 1e-12);
}

#[test]
fn test_batch_round_trip_preserves_values() {
    let rows = vec![ms2(100.123456789, 2, 1), ms2(250.5, 3, 1)];
    let batch = ms2_to_batch(&rows).unwrap();
    assert_eq!(batch.num_rows(), 2);

    let mut decoded = Vec::new();
    ms2_from_batch(&batch, &mut decoded).unwrap();
    assert_eq!(decoded, rows);
}

#[test]
fn test_ms1_from_batch_rejects_wrong_schema() {
    let batch = ms2_to_batch(&[ms2(100.0, 2, 1)]).unwrap();
    let projected = batch.project(&[0, 1]).unwrap();
    let mut out = Vec::new();
    assert!(ms1_from_batch(&projected, &mut out).is_err());
}
