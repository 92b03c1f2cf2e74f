#![no_main]

use libfuzzer_sys::fuzz_target;
use msql::mzml::MzMLStreamer;
use std::io::{BufReader, Cursor};

fuzz_target!(|data: &[u8]| {
    // Malformed input must surface as an error, never a panic
    let Ok(streamer) = MzMLStreamer::new(BufReader::new(Cursor::new(data))) else {
        return;
    };

    for spectrum in streamer.spectra().take(100) {
        match spectrum {
            Ok(spectrum) => {
                let _ = spectrum.scan_number();
                let _ = spectrum.precursor_mz();
            }
            Err(_) => break,
        }
    }
});
