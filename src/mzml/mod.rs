//! # mzML Reader Module
//!
//! Streaming extraction of spectra from mzML, the XML-based community
//! standard for mass spectrometry data defined by HUPO-PSI.
//!
//! Only what the peak tables need is read: MS level, native ID, scan start
//! time, precursor m/z and the m/z and intensity arrays. Everything else in
//! the document is skipped by the pull parser.
//!
//! ## mzML Structure
//!
//! ```text
//! indexedmzML (optional wrapper)
//! └── mzML
//!     └── run
//!         └── spectrumList
//!             └── spectrum* (many)
//!                 ├── cvParam* (ms level)
//!                 ├── scanList
//!                 │   └── scan
//!                 │       └── cvParam (scan start time)
//!                 ├── precursorList (for MS2+)
//!                 │   └── precursor
//!                 │       ├── isolationWindow
//!                 │       └── selectedIonList
//!                 └── binaryDataArrayList
//!                     └── binaryDataArray*
//!                         ├── cvParam* (encoding info)
//!                         └── binary (base64 data)
//! ```

mod binary;
mod cv_params;
mod models;
mod streamer;

pub use binary::{BinaryDecodeError, BinaryDecoder, BinaryEncoding, CompressionType};
pub use cv_params::{retention_time_minutes, CvParam, MS_CV_ACCESSIONS};
pub use models::{MzMLSpectrum, Precursor};
pub use streamer::{MzMLError, MzMLStreamer, SpectrumIterator, DEFAULT_INPUT_BUFFER_SIZE};
