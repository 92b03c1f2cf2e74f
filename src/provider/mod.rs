//! # Spectral Table Provider
//!
//! Turns a raw run into its MS1/MS2 peak tables. The first load of a run reads
//! the raw file through a [`SpectrumSource`] and persists the tables next to
//! it as Parquet; later loads are served from that cache, or from an
//! in-process memo when the same provider is asked again.
//!
//! Peaks with an m/z or intensity below 1.0 are dropped, and the surviving
//! peaks of each scan are stored in ascending intensity order.

mod cache;
mod error;
mod source;

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, info, warn};

pub use cache::{read_tables, write_tables, CacheConfig, CachePaths, CompressionType};
pub use error::{CacheError, SourceError};
#[cfg(feature = "mzml")]
pub use source::MzMLSource;
pub use source::{MemorySource, ScanRecord, SpectrumSource};

use crate::table::{Ms1Peak, Ms1Table, Ms2Peak, Ms2Table, RunTables};

/// Peaks with either coordinate below this value are discarded
pub const MIN_PEAK_VALUE: f64 = 1.0;

/// Loads and caches the peak tables of runs
pub struct SpectralTableProvider {
    source: Arc<dyn SpectrumSource>,
    cache_config: CacheConfig,
    use_disk_cache: bool,
    memoize: bool,
    memo: Mutex<HashMap<PathBuf, RunTables>>,
    run_locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for SpectralTableProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectralTableProvider")
            .field("cache_config", &self.cache_config)
            .field("use_disk_cache", &self.use_disk_cache)
            .field("memoize", &self.memoize)
            .finish_non_exhaustive()
    }
}

impl SpectralTableProvider {
    /// Create a provider over `source` with disk cache and memo enabled
    pub fn new(source: Arc<dyn SpectrumSource>) -> Self {
        Self {
            source,
            cache_config: CacheConfig::default(),
            use_disk_cache: true,
            memoize: true,
            memo: Mutex::new(HashMap::new()),
            run_locks: Mutex::new(HashMap::new()),
            write_lock: Mutex::new(()),
        }
    }

    /// Set the Parquet writer settings of the cache
    pub fn with_cache_config(mut self, config: CacheConfig) -> Self {
        self.cache_config = config;
        self
    }

    /// Enable or disable the on-disk cache
    pub fn with_disk_cache(mut self, enabled: bool) -> Self {
        self.use_disk_cache = enabled;
        self
    }

    /// Enable or disable the in-process memo
    pub fn with_memo(mut self, enabled: bool) -> Self {
        self.memoize = enabled;
        self
    }

    /// Load the tables of `run`
    ///
    /// Concurrent loads of the same run are serialized: one caller reads the
    /// run while the others wait and are then served from the memo or the
    /// disk cache.
    pub fn load(&self, run: &Path) -> Result<RunTables, SourceError> {
        if self.memoize {
            if let Some(tables) = self.memo_get(run) {
                return Ok(tables);
            }
        }

        let run_lock = self.run_lock(run);
        let _guard = lock_unpoisoned(&run_lock);
        if self.memoize {
            if let Some(tables) = self.memo_get(run) {
                debug!("Tables for {} were loaded by another worker", run.display());
                return Ok(tables);
            }
        }

        let tables = if self.use_disk_cache {
            self.load_through_cache(run)?
        } else {
            self.read_raw(run)?
        };

        if self.memoize {
            if let Ok(mut memo) = self.memo.lock() {
                memo.entry(run.to_path_buf())
                    .or_insert_with(|| tables.clone());
            }
        }
        Ok(tables)
    }

    /// Forget memoized tables
    pub fn clear_memo(&self) {
        if let Ok(mut memo) = self.memo.lock() {
            memo.clear();
        }
    }

    fn memo_get(&self, run: &Path) -> Option<RunTables> {
        self.memo.lock().ok()?.get(run).cloned()
    }

    fn run_lock(&self, run: &Path) -> Arc<Mutex<()>> {
        let mut locks = lock_unpoisoned(&self.run_locks);
        Arc::clone(locks.entry(run.to_path_buf()).or_default())
    }

    fn load_through_cache(&self, run: &Path) -> Result<RunTables, SourceError> {
        let paths = CachePaths::for_run(run);

        match read_tables(&paths) {
            Ok(Some(tables)) => {
                debug!("Loaded cached tables for {}", run.display());
                return Ok(tables);
            }
            Ok(None) => {}
            Err(CacheError::Corrupt { path, reason }) => {
                warn!(
                    "Discarding corrupt cache file {}: {}",
                    path.display(),
                    reason
                );
                if let Err(e) = paths.remove() {
                    warn!("Failed to remove cache for {}: {}", run.display(), e);
                }
            }
            Err(e) => {
                warn!("Failed to read cache for {}: {}", run.display(), e);
            }
        }

        let tables = self.read_raw(run)?;
        self.persist(run, &paths, &tables);
        Ok(tables)
    }

    fn persist(&self, run: &Path, paths: &CachePaths, tables: &RunTables) {
        let _guard = lock_unpoisoned(&self.write_lock);
        match write_tables(paths, tables, &self.cache_config) {
            Ok(()) => debug!("Wrote cache for {}", run.display()),
            Err(e) => warn!("Failed to write cache for {}: {}", run.display(), e),
        }
    }

    /// Read the raw run and build both tables
    pub fn read_raw(&self, run: &Path) -> Result<RunTables, SourceError> {
        info!("Reading raw run {}", run.display());
        let mut builder = TableBuilder::default();
        self.source
            .for_each_scan(run, &mut |record| builder.push(record))?;
        let tables = builder.finish();
        info!(
            "Loaded {} MS1 peaks and {} MS2 peaks from {}",
            tables.ms1.len(),
            tables.ms2.len(),
            run.display()
        );
        Ok(tables)
    }
}

/// A panicking loader leaves no partial state behind, so poisoning is ignored
fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Accumulates rows while scans stream by in acquisition order
#[derive(Default)]
struct TableBuilder {
    ms1: Vec<Ms1Peak>,
    ms2: Vec<Ms2Peak>,
    last_ms1_scan: i64,
}

impl TableBuilder {
    fn push(&mut self, record: ScanRecord) {
        match record.ms_level {
            1 => {
                self.last_ms1_scan = record.scan;
                for (mz, intensity) in sorted_peaks(&record) {
                    self.ms1.push(Ms1Peak {
                        mz,
                        intensity,
                        scan: record.scan,
                        retention_time: record.retention_time,
                    });
                }
            }
            2 => {
                let Some(precursor_mz) = record.precursor_mz else {
                    warn!("Skipping MS2 scan {} without precursor m/z", record.scan);
                    return;
                };
                for (mz, intensity) in sorted_peaks(&record) {
                    self.ms2.push(Ms2Peak {
                        mz,
                        intensity,
                        scan: record.scan,
                        retention_time: record.retention_time,
                        precursor_mz,
                        parent_ms1_scan: self.last_ms1_scan,
                    });
                }
            }
            level => debug!("Skipping scan {} with MS level {}", record.scan, level),
        }
    }

    fn finish(self) -> RunTables {
        RunTables::new(Ms1Table::new(self.ms1), Ms2Table::new(self.ms2))
    }
}

/// Peaks of a scan above the noise floor, by ascending intensity
fn sorted_peaks(record: &ScanRecord) -> Vec<(f64, f64)> {
    let mut peaks: Vec<(f64, f64)> = record
        .mz
        .iter()
        .zip(record.intensity.iter())
        .map(|(&mz, &intensity)| (mz, intensity))
        .filter(|&(mz, intensity)| mz >= MIN_PEAK_VALUE && intensity >= MIN_PEAK_VALUE)
        .collect();
    peaks.sort_by(|a, b| a.1.total_cmp(&b.1));
    peaks
}
