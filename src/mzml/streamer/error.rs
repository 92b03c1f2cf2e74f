use crate::mzml::binary::BinaryDecodeError;

/// Errors that can occur during mzML parsing
#[derive(Debug, thiserror::Error)]
pub enum MzMLError {
    /// Error parsing XML
    #[error("XML parsing error: {0}")]
    XmlError(#[from] quick_xml::Error),

    /// I/O error while reading the file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error decoding binary data arrays
    #[error("Binary decode error: {0}")]
    BinaryError(#[from] BinaryDecodeError),

    /// Invalid mzML document structure
    #[error("Invalid mzML structure: {0}")]
    InvalidStructure(String),

    /// m/z and intensity arrays of one spectrum differ in length
    #[error("Spectrum {id}: m/z array has {mz} values but intensity array has {intensity}")]
    ArrayLengthMismatch {
        /// Native ID of the spectrum
        id: String,
        /// Length of the m/z array
        mz: usize,
        /// Length of the intensity array
        intensity: usize,
    },

    /// UTF-8 encoding error in text content
    #[error("UTF-8 encoding error: {0}")]
    Utf8Error(#[from] std::str::Utf8Error),
}
