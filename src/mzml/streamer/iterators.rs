use std::io::BufRead;

use super::{MzMLError, MzMLStreamer};
use crate::mzml::models::MzMLSpectrum;

/// Iterator over the spectra of an mzML document
///
/// Yields at most one error; iteration ends after it.
pub struct SpectrumIterator<R: BufRead> {
    streamer: MzMLStreamer<R>,
    failed: bool,
}

impl<R: BufRead> SpectrumIterator<R> {
    pub(super) fn new(streamer: MzMLStreamer<R>) -> Self {
        Self {
            streamer,
            failed: false,
        }
    }
}

impl<R: BufRead> Iterator for SpectrumIterator<R> {
    type Item = Result<MzMLSpectrum, MzMLError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let next = self.streamer.next_spectrum().transpose();
        self.failed = matches!(next, Some(Err(_)));
        next
    }
}
