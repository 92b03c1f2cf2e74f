//! Streaming mzML parser using quick-xml
//!
//! This module provides a pull-based streaming parser for mzML files,
//! designed to handle arbitrarily large files with minimal memory usage.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::Reader;

pub use error::MzMLError;
pub use iterators::SpectrumIterator;

mod error;
mod helpers;
mod iterators;
mod spectrum;


/// Default input buffer size for mzML parsing (64KB)
pub const DEFAULT_INPUT_BUFFER_SIZE: usize = 64 * 1024;

/// Streaming parser for mzML files
pub struct MzMLStreamer<R: BufRead> {
    reader: Reader<R>,
    in_spectrum_list: bool,
    finished: bool,
    current_spectrum_index: i64,
}

impl<R: BufRead> MzMLStreamer<R> {
    /// Create a new streamer from a BufRead source
    pub fn new(reader: R) -> Result<Self, MzMLError> {
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.config_mut().trim_text(true);

        Ok(Self {
            reader: xml_reader,
            in_spectrum_list: false,
            finished: false,
            current_spectrum_index: 0,
        })
    }

    /// Number of spectra read so far
    pub fn spectra_read(&self) -> i64 {
        self.current_spectrum_index
    }

    /// Iterate over all spectra
    pub fn spectra(self) -> SpectrumIterator<R> {
        SpectrumIterator::new(self)
    }
}

impl MzMLStreamer<BufReader<File>> {
    /// Open an mzML file for streaming with default buffer size (64KB)
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, MzMLError> {
        Self::open_with_buffer_size(path, DEFAULT_INPUT_BUFFER_SIZE)
    }

    /// Open an mzML file for streaming with custom buffer size
    ///
    /// # Arguments
    /// * `path` - Path to the mzML file
    /// * `buffer_size` - Size of the input buffer in bytes
    ///
    /// # Example
    /// ```rust,no_run
    /// use msql::mzml::MzMLStreamer;
    ///
    /// // Use 256KB buffer for better throughput
    /// let streamer = MzMLStreamer::open_with_buffer_size("data.mzML", 256 * 1024)?;
    /// # Ok::<(), msql::mzml::MzMLError>(())
    /// ```
    pub fn open_with_buffer_size<P: AsRef<Path>>(
        path: P,
        buffer_size: usize,
    ) -> Result<Self, MzMLError> {
        let file = File::open(path.as_ref())?;
        let reader = BufReader::with_capacity(buffer_size, file);
        Self::new(reader)
    }
}
