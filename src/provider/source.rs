//! Raw spectrum sources feeding the table provider.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::SourceError;

/// One scan as read from a raw run
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScanRecord {
    /// MS level (1, 2, ...)
    pub ms_level: i16,
    /// Scan identifier
    pub scan: i64,
    /// Scan start time in minutes
    pub retention_time: f64,
    /// m/z values
    pub mz: Vec<f64>,
    /// Intensity values (parallel to `mz`)
    pub intensity: Vec<f64>,
    /// Selected precursor m/z (MS2+)
    pub precursor_mz: Option<f64>,
}

impl ScanRecord {
    /// An MS1 scan
    pub fn ms1(scan: i64, retention_time: f64, peaks: &[(f64, f64)]) -> Self {
        Self {
            ms_level: 1,
            scan,
            retention_time,
            mz: peaks.iter().map(|p| p.0).collect(),
            intensity: peaks.iter().map(|p| p.1).collect(),
            precursor_mz: None,
        }
    }

    /// An MS2 scan with a precursor
    pub fn ms2(scan: i64, retention_time: f64, precursor_mz: f64, peaks: &[(f64, f64)]) -> Self {
        Self {
            ms_level: 2,
            precursor_mz: Some(precursor_mz),
            ..Self::ms1(scan, retention_time, peaks)
        }
    }
}

/// A reader that streams the scans of a run in acquisition order
pub trait SpectrumSource: Send + Sync {
    /// Call `visit` for every scan of `run`, in file order
    fn for_each_scan(
        &self,
        run: &Path,
        visit: &mut dyn FnMut(ScanRecord),
    ) -> Result<(), SourceError>;
}

/// Reads mzML and indexedmzML files
#[cfg(feature = "mzml")]
#[derive(Debug, Clone)]
pub struct MzMLSource {
    buffer_size: usize,
}

#[cfg(feature = "mzml")]
impl Default for MzMLSource {
    fn default() -> Self {
        Self {
            buffer_size: crate::mzml::DEFAULT_INPUT_BUFFER_SIZE,
        }
    }
}

#[cfg(feature = "mzml")]
impl MzMLSource {
    /// Create a source with the default 64KB input buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the input buffer size in bytes
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }
}

#[cfg(feature = "mzml")]
impl SpectrumSource for MzMLSource {
    fn for_each_scan(
        &self,
        run: &Path,
        visit: &mut dyn FnMut(ScanRecord),
    ) -> Result<(), SourceError> {
        use crate::mzml::{MzMLError, MzMLStreamer};

        let wrap = |source: MzMLError| match source {
            MzMLError::IoError(source) => SourceError::Io {
                path: run.to_path_buf(),
                source,
            },
            source => SourceError::MzML {
                path: run.to_path_buf(),
                source,
            },
        };

        let streamer = MzMLStreamer::open_with_buffer_size(run, self.buffer_size).map_err(wrap)?;
        for spectrum in streamer.spectra() {
            let spectrum = spectrum.map_err(wrap)?;
            let scan = spectrum.scan_number().unwrap_or(spectrum.index + 1);
            let precursor_mz = spectrum.precursor_mz();
            visit(ScanRecord {
                ms_level: spectrum.ms_level,
                scan,
                retention_time: spectrum.retention_time.unwrap_or(0.0),
                mz: spectrum.mz_array,
                intensity: spectrum.intensity_array,
                precursor_mz,
            });
        }
        Ok(())
    }
}

/// Serves pre-built scans keyed by run path
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    runs: HashMap<PathBuf, Vec<ScanRecord>>,
}

impl MemorySource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the scans of a run
    pub fn with_run(mut self, run: impl Into<PathBuf>, scans: Vec<ScanRecord>) -> Self {
        self.runs.insert(run.into(), scans);
        self
    }
}

impl SpectrumSource for MemorySource {
    fn for_each_scan(
        &self,
        run: &Path,
        visit: &mut dyn FnMut(ScanRecord),
    ) -> Result<(), SourceError> {
        let scans = self
            .runs
            .get(run)
            .ok_or_else(|| SourceError::RunNotFound(run.to_path_buf()))?;
        for scan in scans {
            visit(scan.clone());
        }
        Ok(())
    }
}

/// Placeholder used when no raw reader is compiled in
#[cfg(not(feature = "mzml"))]
#[derive(Debug, Clone, Default)]
pub(crate) struct NoSource;

#[cfg(not(feature = "mzml"))]
impl SpectrumSource for NoSource {
    fn for_each_scan(
        &self,
        run: &Path,
        _visit: &mut dyn FnMut(ScanRecord),
    ) -> Result<(), SourceError> {
        Err(SourceError::UnsupportedFormat(run.to_path_buf()))
    }
}
