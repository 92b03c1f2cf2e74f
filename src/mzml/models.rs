//! Data models for spectra read from mzML

/// A spectrum extracted from mzML
#[derive(Debug, Clone, Default)]
pub struct MzMLSpectrum {
    /// Spectrum index (0-based position in file)
    pub index: i64,

    /// Native spectrum ID (e.g., "controllerType=0 controllerNumber=1 scan=1")
    pub id: String,

    /// Default array length declared on the spectrum element
    pub default_array_length: usize,

    /// MS level (1, 2, 3, ...)
    pub ms_level: i16,

    /// Scan start time in minutes
    pub retention_time: Option<f64>,

    /// Precursor information (for MS2+)
    pub precursors: Vec<Precursor>,

    /// m/z values
    pub mz_array: Vec<f64>,

    /// Intensity values
    pub intensity_array: Vec<f64>,
}

impl MzMLSpectrum {
    /// Get the scan number from the native ID
    pub fn scan_number(&self) -> Option<i64> {
        // Common formats:
        // "scan=12345"
        // "controllerType=0 controllerNumber=1 scan=12345"
        // "S12345"
        if let Some(pos) = self.id.find("scan=") {
            let start = pos + 5;
            let end = self.id[start..]
                .find(|c: char| !c.is_ascii_digit())
                .map(|i| start + i)
                .unwrap_or(self.id.len());
            self.id[start..end].parse().ok()
        } else if let Some(rest) = self.id.strip_prefix('S') {
            rest.parse().ok()
        } else {
            // Fall back to index + 1
            Some(self.index + 1)
        }
    }

    /// Precursor m/z of the first precursor
    ///
    /// The selected ion m/z is preferred; the isolation window target is used
    /// when no selected ion is reported.
    pub fn precursor_mz(&self) -> Option<f64> {
        let precursor = self.precursors.first()?;
        precursor
            .selected_ion_mz
            .or(precursor.isolation_window_target)
    }

    /// Get the number of peaks
    pub fn peak_count(&self) -> usize {
        self.mz_array.len()
    }
}

/// Precursor ion information
#[derive(Debug, Clone, Default)]
pub struct Precursor {
    /// Reference to the precursor spectrum
    pub spectrum_ref: Option<String>,

    /// Isolation window target m/z
    pub isolation_window_target: Option<f64>,

    /// Selected ion m/z
    pub selected_ion_mz: Option<f64>,
}
