//! Controlled Vocabulary (CV) parameter handling for mzML
//!
//! Only the PSI-MS terms needed to build peak tables are mapped here.

/// A controlled vocabulary parameter from mzML
#[derive(Debug, Clone, Default)]
pub struct CvParam {
    /// Accession number (e.g., "MS:1000511")
    pub accession: String,

    /// Optional value
    pub value: Option<String>,

    /// Unit accession
    pub unit_accession: Option<String>,
}

impl CvParam {
    /// Get the value as f64 if possible
    pub fn value_as_f64(&self) -> Option<f64> {
        self.value.as_ref()?.trim().parse().ok()
    }

    /// Get the value as i64 if possible
    pub fn value_as_i64(&self) -> Option<i64> {
        self.value.as_ref()?.trim().parse().ok()
    }
}

/// MS CV accessions consulted by the reader
#[allow(non_snake_case)]
pub mod MS_CV_ACCESSIONS {
    /// MS level
    pub const MS_LEVEL: &str = "MS:1000511";

    /// Scan start time (retention time)
    pub const SCAN_START_TIME: &str = "MS:1000016";

    /// Selected ion m/z
    pub const SELECTED_ION_MZ: &str = "MS:1000744";

    /// Isolation window target m/z
    pub const ISOLATION_WINDOW_TARGET_MZ: &str = "MS:1000827";

    /// 32-bit float
    pub const FLOAT_32_BIT: &str = "MS:1000521";

    /// 64-bit float
    pub const FLOAT_64_BIT: &str = "MS:1000523";

    /// zlib compression
    pub const ZLIB_COMPRESSION: &str = "MS:1000574";

    /// No compression
    pub const NO_COMPRESSION: &str = "MS:1000576";

    /// MS-Numpress linear prediction
    pub const NUMPRESS_LINEAR: &str = "MS:1002312";

    /// MS-Numpress positive integer compression
    pub const NUMPRESS_PIC: &str = "MS:1002313";

    /// MS-Numpress short logged float compression
    pub const NUMPRESS_SLOF: &str = "MS:1002314";

    /// m/z array
    pub const MZ_ARRAY: &str = "MS:1000514";

    /// Intensity array
    pub const INTENSITY_ARRAY: &str = "MS:1000515";

    /// Unit: second
    pub const UNIT_SECOND: &str = "UO:0000010";

    /// Unit: minute
    pub const UNIT_MINUTE: &str = "UO:0000031";

    /// Unit: millisecond
    pub const UNIT_MILLISECOND: &str = "UO:0000028";
}

/// Convert a scan start time to minutes based on its unit
pub fn retention_time_minutes(value: f64, unit_accession: Option<&str>) -> f64 {
    match unit_accession {
        Some(MS_CV_ACCESSIONS::UNIT_SECOND) => value / 60.0,
        Some(MS_CV_ACCESSIONS::UNIT_MILLISECOND) => value / 60_000.0,
        _ => value, // Default to minutes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cv_param_value_parsing() {
        let param = CvParam {
            accession: MS_CV_ACCESSIONS::MS_LEVEL.to_string(),
            value: Some("2".to_string()),
            ..Default::default()
        };
        assert_eq!(param.value_as_i64(), Some(2));
        assert_eq!(param.value_as_f64(), Some(2.0));

        let flag = CvParam::default();
        assert_eq!(flag.value_as_f64(), None);
    }

    #[test]
    fn test_retention_time_units() {
        assert_eq!(retention_time_minutes(90.0, Some(MS_CV_ACCESSIONS::UNIT_SECOND)), 1.5);
        assert_eq!(retention_time_minutes(1.5, Some(MS_CV_ACCESSIONS::UNIT_MINUTE)), 1.5);
        assert_eq!(
            retention_time_minutes(90_000.0, Some(MS_CV_ACCESSIONS::UNIT_MILLISECOND)),
            1.5
        );
        assert_eq!(retention_time_minutes(2.0, None), 2.0);
    }
}
