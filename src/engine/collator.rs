//! Shapes merged tables into the result a query's output clause asks for.

use std::collections::BTreeMap;

use log::debug;

use crate::query::{Aggregate, DataKind, Output};
use crate::result::{BinnedPeak, Ms1ScanInfo, Ms2ScanInfo, ResultTable};
use crate::table::{Ms1Peak, Ms1Table, RunTables};

/// Default m/z bin width of `scan-range-sum`
pub const DEFAULT_BIN_WIDTH: f64 = 0.1;

/// Maps merged tables to a [`ResultTable`]
#[derive(Debug, Clone, Copy)]
pub struct Collator {
    bin_width: f64,
}

impl Default for Collator {
    fn default() -> Self {
        Self {
            bin_width: DEFAULT_BIN_WIDTH,
        }
    }
}

impl Collator {
    /// Create a collator with the given `scan-range-sum` bin width
    pub fn new(bin_width: f64) -> Self {
        Self { bin_width }
    }

    /// Collate `tables` according to `output`
    pub fn collate(&self, output: &Output, tables: &RunTables) -> ResultTable {
        match (output.data_kind, output.aggregate) {
            (DataKind::Ms1, None) => ResultTable::Ms1Peaks(tables.ms1.clone()),
            (DataKind::Ms2, None) => ResultTable::Ms2Peaks(tables.ms2.clone()),

            (DataKind::Ms1, Some(Aggregate::ScanSum)) => ResultTable::Ms1Peaks(tables.ms1.scan_sum()),
            (DataKind::Ms2, Some(Aggregate::ScanSum)) => ResultTable::Ms2Peaks(tables.ms2.scan_sum()),

            (_, Some(Aggregate::ScanMz)) => {
                let mut values: Vec<f64> = tables.ms2.iter().map(|p| p.precursor_mz).collect();
                values.sort_by(f64::total_cmp);
                values.dedup();
                ResultTable::PrecursorMz(values)
            }

            (DataKind::Ms1, Some(Aggregate::ScanNum)) => {
                ResultTable::ScanNumbers(tables.ms1.group_by_scan().into_keys().collect())
            }
            (DataKind::Ms2, Some(Aggregate::ScanNum)) => {
                ResultTable::ScanNumbers(tables.ms2.group_by_scan().into_keys().collect())
            }

            (DataKind::Ms1, Some(Aggregate::ScanInfo)) => ResultTable::Ms1ScanInfo(
                tables
                    .ms1
                    .first_per_scan()
                    .into_iter()
                    .map(|p| Ms1ScanInfo {
                        scan: p.scan,
                        retention_time: p.retention_time,
                    })
                    .collect(),
            ),
            (DataKind::Ms2, Some(Aggregate::ScanInfo)) => ResultTable::Ms2ScanInfo(
                tables
                    .ms2
                    .first_per_scan()
                    .into_iter()
                    .map(|p| Ms2ScanInfo {
                        scan: p.scan,
                        precursor_mz: p.precursor_mz,
                        parent_ms1_scan: p.parent_ms1_scan,
                        retention_time: p.retention_time,
                    })
                    .collect(),
            ),

            (DataKind::Ms1, Some(Aggregate::ScanRangeSum)) => {
                ResultTable::Ms1Binned(self.range_sum(&tables.ms1))
            }
            (DataKind::Ms2, Some(Aggregate::ScanRangeSum)) => {
                debug!("scanrangesum over MS2 data is summed per scan without binning");
                ResultTable::Ms2Peaks(tables.ms2.scan_sum())
            }
        }
    }

    /// Per-scan sums within each m/z bin, bins ascending
    fn range_sum(&self, ms1: &Ms1Table) -> Vec<BinnedPeak> {
        let mut bins: BTreeMap<i64, Vec<Ms1Peak>> = BTreeMap::new();
        for peak in ms1.iter() {
            let bin = (peak.mz / self.bin_width).floor() as i64;
            bins.entry(bin).or_default().push(*peak);
        }

        bins.into_iter()
            .flat_map(|(bin, peaks)| {
                Ms1Table::new(peaks)
                    .scan_sum()
                    .iter()
                    .map(|&peak| BinnedPeak { bin, peak })
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}
