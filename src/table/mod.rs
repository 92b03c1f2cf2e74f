//! # Peak Tables
//!
//! Every run is reduced to two "long" peak tables: one row per MS1 peak and one
//! row per MS2 peak. MS2 rows repeat their scan-level metadata (precursor m/z,
//! parent MS1 scan) so that every predicate of the query language can be
//! evaluated row by row.
//!
//! ## Immutability
//!
//! A [`PeakTable`] never changes after construction. Rows live behind an
//! [`Arc`], so cloning a table is cheap and the same run can be shared by
//! thousands of candidate evaluations. Every relational primitive
//! ([`PeakTable::filter`], [`PeakTable::retain_scans`], ...) returns a new table.
//!
//! ## Row labels
//!
//! Each row carries a label: its position in the table as produced by the
//! provider. Filtering keeps labels, concatenation keeps labels, and labels are
//! ignored by equality and deduplication. They are the positional index used by
//! the cross-table `ms1-mz` predicate.

mod schema;

#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use schema::{
    columns, ms1_from_batch, ms1_schema, ms1_to_batch, ms2_from_batch, ms2_schema, ms2_to_batch,
};

/// A single MS1 peak
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ms1Peak {
    /// Mass-to-charge ratio
    pub mz: f64,
    /// Peak intensity
    pub intensity: f64,
    /// Scan identifier
    pub scan: i64,
    /// Retention time in minutes
    pub retention_time: f64,
}

/// A single MS2 (fragment) peak with its scan-level precursor information
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ms2Peak {
    /// Fragment mass-to-charge ratio
    pub mz: f64,
    /// Peak intensity
    pub intensity: f64,
    /// Scan identifier
    pub scan: i64,
    /// Retention time in minutes
    pub retention_time: f64,
    /// Selected precursor m/z of the scan
    pub precursor_mz: f64,
    /// Most recent MS1 scan preceding this scan in acquisition order
    pub parent_ms1_scan: i64,
}

impl Ms2Peak {
    /// Mass lost between the precursor and this fragment
    #[inline]
    pub fn neutral_loss(&self) -> f64 {
        self.precursor_mz - self.mz
    }
}

/// Common access to the columns shared by MS1 and MS2 rows.
pub trait PeakRow: Copy + Send + Sync + 'static {
    /// Hashable identity of a row used for deduplication.
    type Key: Eq + Hash;

    /// Scan identifier
    fn scan(&self) -> i64;
    /// Mass-to-charge ratio
    fn mz(&self) -> f64;
    /// Peak intensity
    fn intensity(&self) -> f64;
    /// Retention time in minutes
    fn retention_time(&self) -> f64;
    /// Copy of this row with a replaced intensity
    fn with_intensity(&self, intensity: f64) -> Self;
    /// Full-row identity (bit patterns of every column)
    fn row_key(&self) -> Self::Key;
}

impl PeakRow for Ms1Peak {
    type Key = (u64, u64, i64, u64);

    fn scan(&self) -> i64 {
        self.scan
    }

    fn mz(&self) -> f64 {
        self.mz
    }

    fn intensity(&self) -> f64 {
        self.intensity
    }

    fn retention_time(&self) -> f64 {
        self.retention_time
    }

    fn with_intensity(&self, intensity: f64) -> Self {
        Self { intensity, ..*self }
    }

    fn row_key(&self) -> Self::Key {
        (
            self.mz.to_bits(),
            self.intensity.to_bits(),
            self.scan,
            self.retention_time.to_bits(),
        )
    }
}

impl PeakRow for Ms2Peak {
    type Key = (u64, u64, i64, u64, u64, i64);

    fn scan(&self) -> i64 {
        self.scan
    }

    fn mz(&self) -> f64 {
        self.mz
    }

    fn intensity(&self) -> f64 {
        self.intensity
    }

    fn retention_time(&self) -> f64 {
        self.retention_time
    }

    fn with_intensity(&self, intensity: f64) -> Self {
        Self { intensity, ..*self }
    }

    fn row_key(&self) -> Self::Key {
        (
            self.mz.to_bits(),
            self.intensity.to_bits(),
            self.scan,
            self.retention_time.to_bits(),
            self.precursor_mz.to_bits(),
            self.parent_ms1_scan,
        )
    }
}

/// Immutable, cheaply clonable table of peak rows with positional labels.
#[derive(Debug, Clone)]
pub struct PeakTable<T> {
    rows: Arc<[T]>,
    labels: Arc<[usize]>,
}

/// Table of MS1 peaks
pub type Ms1Table = PeakTable<Ms1Peak>;

/// Table of MS2 peaks
pub type Ms2Table = PeakTable<Ms2Peak>;

impl<T: PeakRow> PeakTable<T> {
    /// Create a table whose labels are the row positions
    pub fn new(rows: Vec<T>) -> Self {
        let labels: Vec<usize> = (0..rows.len()).collect();
        Self {
            rows: rows.into(),
            labels: labels.into(),
        }
    }

    /// Create an empty table
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    fn from_parts(rows: Vec<T>, labels: Vec<usize>) -> Self {
        debug_assert_eq!(rows.len(), labels.len());
        Self {
            rows: rows.into(),
            labels: labels.into(),
        }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Borrow all rows
    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    /// Borrow all row labels (parallel to [`rows`](Self::rows))
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Iterate over rows
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.rows.iter()
    }

    /// Keep the rows matching `predicate`
    pub fn filter<F>(&self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool,
    {
        self.filter_labelled(|_, row| predicate(row))
    }

    /// Keep the rows matching `predicate`, which also sees each row's label
    pub fn filter_labelled<F>(&self, predicate: F) -> Self
    where
        F: Fn(usize, &T) -> bool,
    {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for (row, &label) in self.rows.iter().zip(self.labels.iter()) {
            if predicate(label, row) {
                rows.push(*row);
                labels.push(label);
            }
        }
        Self::from_parts(rows, labels)
    }

    /// Distinct scan identifiers present in the table
    pub fn scans(&self) -> HashSet<i64> {
        self.rows.iter().map(PeakRow::scan).collect()
    }

    /// Keep the rows whose scan is in `scans`
    pub fn retain_scans(&self, scans: &HashSet<i64>) -> Self {
        self.filter(|row| scans.contains(&row.scan()))
    }

    /// Concatenate tables in order, keeping each row's label
    pub fn concat<'a, I>(tables: I) -> Self
    where
        I: IntoIterator<Item = &'a Self>,
    {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for table in tables {
            rows.extend_from_slice(&table.rows);
            labels.extend_from_slice(&table.labels);
        }
        Self::from_parts(rows, labels)
    }

    /// Drop rows equal (on every column) to an earlier row
    pub fn distinct(&self) -> Self {
        let mut seen = HashSet::with_capacity(self.rows.len());
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for (row, &label) in self.rows.iter().zip(self.labels.iter()) {
            if seen.insert(row.row_key()) {
                rows.push(*row);
                labels.push(label);
            }
        }
        Self::from_parts(rows, labels)
    }

    /// Rows grouped by scan, in ascending scan order, preserving row order
    /// within each group
    pub fn group_by_scan(&self) -> BTreeMap<i64, Vec<&T>> {
        let mut groups: BTreeMap<i64, Vec<&T>> = BTreeMap::new();
        for row in self.rows.iter() {
            groups.entry(row.scan()).or_default().push(row);
        }
        groups
    }

    /// First row of every scan, in ascending scan order
    pub fn first_per_scan(&self) -> Vec<T> {
        self.group_by_scan()
            .into_values()
            .filter_map(|group| group.first().map(|row| **row))
            .collect()
    }

    /// One row per scan: the scan's first row with the summed intensity
    pub fn scan_sum(&self) -> Self {
        let rows = self
            .group_by_scan()
            .into_values()
            .filter_map(|group| {
                let total: f64 = group.iter().map(|row| row.intensity()).sum();
                group.first().map(|row| row.with_intensity(total))
            })
            .collect();
        Self::new(rows)
    }
}

impl<T: PeakRow> Default for PeakTable<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: PeakRow + PartialEq> PartialEq for PeakTable<T> {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows
    }
}

impl<T: PeakRow> FromIterator<T> for PeakTable<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// The MS1/MS2 table pair of one run (or of one evaluation step)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunTables {
    /// MS1 peaks
    pub ms1: Ms1Table,
    /// MS2 peaks
    pub ms2: Ms2Table,
}

impl RunTables {
    /// Pair two tables
    pub fn new(ms1: Ms1Table, ms2: Ms2Table) -> Self {
        Self { ms1, ms2 }
    }

    /// Union of many table pairs, deduplicated on full-row equality.
    ///
    /// Rows keep the order in which the pairs are given, first occurrence wins.
    pub fn merge<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = &'a RunTables>,
    {
        let pairs: Vec<&RunTables> = pairs.into_iter().collect();
        let ms1 = Ms1Table::concat(pairs.iter().map(|p| &p.ms1)).distinct();
        let ms2 = Ms2Table::concat(pairs.iter().map(|p| &p.ms2)).distinct();
        Self { ms1, ms2 }
    }
}
