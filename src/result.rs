//! Query result tables and TSV export.

use std::io::Write;

use serde::Serialize;

use crate::table::{columns, Ms1Peak, Ms1Table, Ms2Table};

/// Scan-level summary of an MS1 scan
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Ms1ScanInfo {
    /// Scan identifier
    pub scan: i64,
    /// Retention time in minutes
    pub retention_time: f64,
}

/// Scan-level summary of an MS2 scan
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Ms2ScanInfo {
    /// Scan identifier
    pub scan: i64,
    /// Selected precursor m/z
    pub precursor_mz: f64,
    /// Parent MS1 scan
    pub parent_ms1_scan: i64,
    /// Retention time in minutes
    pub retention_time: f64,
}

/// A per-scan intensity sum within one m/z bin
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BinnedPeak {
    /// Bin index, `floor(mz / bin_width)`
    pub bin: i64,
    /// First peak of the scan within the bin, with the summed intensity
    pub peak: Ms1Peak,
}

/// The outcome of a query, shaped by its output clause
#[derive(Debug, Clone, PartialEq)]
pub enum ResultTable {
    /// Raw MS1 peaks
    Ms1Peaks(Ms1Table),
    /// Raw MS2 peaks
    Ms2Peaks(Ms2Table),
    /// Distinct precursor m/z values, ascending
    PrecursorMz(Vec<f64>),
    /// Distinct scan identifiers, ascending
    ScanNumbers(Vec<i64>),
    /// One row per MS1 scan
    Ms1ScanInfo(Vec<Ms1ScanInfo>),
    /// One row per MS2 scan
    Ms2ScanInfo(Vec<Ms2ScanInfo>),
    /// Per-scan sums within m/z bins
    Ms1Binned(Vec<BinnedPeak>),
}

impl ResultTable {
    /// Number of rows
    pub fn len(&self) -> usize {
        match self {
            ResultTable::Ms1Peaks(t) => t.len(),
            ResultTable::Ms2Peaks(t) => t.len(),
            ResultTable::PrecursorMz(v) => v.len(),
            ResultTable::ScanNumbers(v) => v.len(),
            ResultTable::Ms1ScanInfo(v) => v.len(),
            ResultTable::Ms2ScanInfo(v) => v.len(),
            ResultTable::Ms1Binned(v) => v.len(),
        }
    }

    /// Whether the result has no rows
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short name of the result shape, used in logs and errors
    pub fn shape(&self) -> &'static str {
        match self {
            ResultTable::Ms1Peaks(_) => "MS1 peaks",
            ResultTable::Ms2Peaks(_) => "MS2 peaks",
            ResultTable::PrecursorMz(_) => "precursor m/z values",
            ResultTable::ScanNumbers(_) => "scan numbers",
            ResultTable::Ms1ScanInfo(_) => "MS1 scan info",
            ResultTable::Ms2ScanInfo(_) => "MS2 scan info",
            ResultTable::Ms1Binned(_) => "binned MS1 sums",
        }
    }

    /// Column names of the exported table
    pub fn column_names(&self) -> &'static [&'static str] {
        const PEAK: &[&str] = &[
            columns::MZ,
            columns::INTENSITY,
            columns::SCAN,
            columns::RETENTION_TIME,
        ];
        const MS2_PEAK: &[&str] = &[
            columns::MZ,
            columns::INTENSITY,
            columns::SCAN,
            columns::RETENTION_TIME,
            columns::PRECURSOR_MZ,
            columns::PARENT_MS1_SCAN,
        ];
        const BINNED: &[&str] = &[
            columns::MZ,
            columns::INTENSITY,
            columns::SCAN,
            columns::RETENTION_TIME,
            columns::BIN,
        ];

        match self {
            ResultTable::Ms1Peaks(_) => PEAK,
            ResultTable::Ms2Peaks(_) => MS2_PEAK,
            ResultTable::PrecursorMz(_) => &[columns::PRECURSOR_MZ],
            ResultTable::ScanNumbers(_) => &[columns::SCAN],
            ResultTable::Ms1ScanInfo(_) => &[columns::SCAN, columns::RETENTION_TIME],
            ResultTable::Ms2ScanInfo(_) => &[
                columns::SCAN,
                columns::PRECURSOR_MZ,
                columns::PARENT_MS1_SCAN,
                columns::RETENTION_TIME,
            ],
            ResultTable::Ms1Binned(_) => BINNED,
        }
    }

    /// The column a subquery contributes to its enclosing condition
    ///
    /// MS2 shapes yield precursor m/z, MS1 peak shapes yield m/z. Scan numbers
    /// and MS1 scan info have no m/z column and yield `None`.
    pub fn value_column(&self) -> Option<Vec<f64>> {
        match self {
            ResultTable::Ms2Peaks(t) => Some(t.iter().map(|p| p.precursor_mz).collect()),
            ResultTable::Ms2ScanInfo(rows) => Some(rows.iter().map(|r| r.precursor_mz).collect()),
            ResultTable::PrecursorMz(values) => Some(values.clone()),
            ResultTable::Ms1Peaks(t) => Some(t.iter().map(|p| p.mz).collect()),
            ResultTable::Ms1Binned(rows) => Some(rows.iter().map(|r| r.peak.mz).collect()),
            ResultTable::ScanNumbers(_) | ResultTable::Ms1ScanInfo(_) => None,
        }
    }

    /// Write a header line and one tab-separated line per row
    pub fn write_tsv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut tsv = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(writer);
        tsv.write_record(self.column_names())?;

        match self {
            ResultTable::Ms1Peaks(t) => {
                for p in t.iter() {
                    tsv.write_record([
                        p.mz.to_string(),
                        p.intensity.to_string(),
                        p.scan.to_string(),
                        p.retention_time.to_string(),
                    ])?;
                }
            }
            ResultTable::Ms2Peaks(t) => {
                for p in t.iter() {
                    tsv.write_record([
                        p.mz.to_string(),
                        p.intensity.to_string(),
                        p.scan.to_string(),
                        p.retention_time.to_string(),
                        p.precursor_mz.to_string(),
                        p.parent_ms1_scan.to_string(),
                    ])?;
                }
            }
            ResultTable::PrecursorMz(values) => {
                for v in values {
                    tsv.write_record([v.to_string()])?;
                }
            }
            ResultTable::ScanNumbers(scans) => {
                for s in scans {
                    tsv.write_record([s.to_string()])?;
                }
            }
            ResultTable::Ms1ScanInfo(rows) => {
                for r in rows {
                    tsv.write_record([r.scan.to_string(), r.retention_time.to_string()])?;
                }
            }
            ResultTable::Ms2ScanInfo(rows) => {
                for r in rows {
                    tsv.write_record([
                        r.scan.to_string(),
                        r.precursor_mz.to_string(),
                        r.parent_ms1_scan.to_string(),
                        r.retention_time.to_string(),
                    ])?;
                }
            }
            ResultTable::Ms1Binned(rows) => {
                for r in rows {
                    tsv.write_record([
                        r.peak.mz.to_string(),
                        r.peak.intensity.to_string(),
                        r.peak.scan.to_string(),
                        r.peak.retention_time.to_string(),
                        r.bin.to_string(),
                    ])?;
                }
            }
        }

        tsv.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Ms2Peak;

    fn ms2_table() -> Ms2Table {
        Ms2Table::new(vec![Ms2Peak {
            mz: 150.5,
            intensity: 50.0,
            scan: 2,
            retention_time: 0.25,
            precursor_mz: 300.0,
            parent_ms1_scan: 1,
        }])
    }

    #[test]
    fn test_write_tsv_ms2() {
        let result = ResultTable::Ms2Peaks(ms2_table());
        let mut out = Vec::new();
        result.write_tsv(&mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "mz\ti\tscan\trt\tprecmz\tms1scan\n150.5\t50\t2\t0.25\t300\t1\n");
    }

    #[test]
    fn test_write_tsv_empty_has_header() {
        let result = ResultTable::ScanNumbers(Vec::new());
        let mut out = Vec::new();
        result.write_tsv(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "scan\n");
        assert!(result.is_empty());
    }

    #[test]
    fn test_value_column() {
        assert_eq!(
            ResultTable::Ms2Peaks(ms2_table()).value_column(),
            Some(vec![300.0])
        );
        assert_eq!(
            ResultTable::PrecursorMz(vec![1.0, 2.0]).value_column(),
            Some(vec![1.0, 2.0])
        );
        assert_eq!(ResultTable::ScanNumbers(vec![1]).value_column(), None);
        assert_eq!(
            ResultTable::Ms1ScanInfo(vec![Ms1ScanInfo {
                scan: 1,
                retention_time: 0.1
            }])
            .value_column(),
            None
        );
    }

    #[test]
    fn test_column_names() {
        let binned = ResultTable::Ms1Binned(Vec::new());
        assert_eq!(binned.column_names(), &["mz", "i", "scan", "rt", "bin"]);
        assert_eq!(binned.shape(), "binned MS1 sums");
    }
}
