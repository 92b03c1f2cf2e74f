use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};

use super::helpers::{get_attribute, parse_cv_param};
use super::{MzMLError, MzMLStreamer};
use crate::mzml::binary::{BinaryDecoder, BinaryEncoding, CompressionType};
use crate::mzml::cv_params::{retention_time_minutes, CvParam, MS_CV_ACCESSIONS};
use crate::mzml::models::{MzMLSpectrum, Precursor};

/// Which part of a spectrum element the parser is inside
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Spectrum,
    ScanList,
    PrecursorList,
    BinaryDataArrayList,
}

#[derive(Default)]
struct BinaryArrayContext {
    cv_params: Vec<CvParam>,
    base64_data: String,
}

impl<R: BufRead> MzMLStreamer<R> {
    /// Read the next spectrum from the stream
    pub fn next_spectrum(&mut self) -> Result<Option<MzMLSpectrum>, MzMLError> {
        if self.finished {
            return Ok(None);
        }
        if !self.in_spectrum_list && !self.seek_spectrum_list()? {
            self.finished = true;
            return Ok(None);
        }

        let mut buf = Vec::new();
        loop {
            match self.reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    if e.name().as_ref() == b"spectrum" {
                        let spectrum = self.parse_spectrum(&e)?;
                        self.current_spectrum_index += 1;
                        return Ok(Some(spectrum));
                    }
                }
                Ok(Event::Empty(e)) => {
                    // A spectrum with no children has no peaks and no MS level
                    if e.name().as_ref() == b"spectrum" {
                        let spectrum = self.spectrum_header(&e)?;
                        self.current_spectrum_index += 1;
                        return Ok(Some(spectrum));
                    }
                }
                Ok(Event::End(ref e)) => {
                    if e.name().as_ref() == b"spectrumList" {
                        self.in_spectrum_list = false;
                        self.finished = true;
                        return Ok(None);
                    }
                }
                Ok(Event::Eof) => {
                    self.finished = true;
                    return Ok(None);
                }
                Err(e) => return Err(MzMLError::XmlError(e)),
                _ => {}
            }
            buf.clear();
        }
    }

    /// Advance to the opening `spectrumList` tag; false if the document has none
    fn seek_spectrum_list(&mut self) -> Result<bool, MzMLError> {
        let mut buf = Vec::new();
        loop {
            match self.reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) if e.name().as_ref() == b"spectrumList" => {
                    self.in_spectrum_list = true;
                    return Ok(true);
                }
                Ok(Event::Empty(ref e)) if e.name().as_ref() == b"spectrumList" => {
                    return Ok(false);
                }
                Ok(Event::Eof) => return Ok(false),
                Err(e) => return Err(MzMLError::XmlError(e)),
                _ => {}
            }
            buf.clear();
        }
    }

    fn spectrum_header(&self, start_event: &BytesStart) -> Result<MzMLSpectrum, MzMLError> {
        Ok(MzMLSpectrum {
            index: get_attribute(start_event, "index")?
                .and_then(|s| s.parse().ok())
                .unwrap_or(self.current_spectrum_index),
            id: get_attribute(start_event, "id")?.unwrap_or_default(),
            default_array_length: get_attribute(start_event, "defaultArrayLength")?
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            ..Default::default()
        })
    }

    /// Parse a single spectrum element
    fn parse_spectrum(&mut self, start_event: &BytesStart) -> Result<MzMLSpectrum, MzMLError> {
        let mut spectrum = self.spectrum_header(start_event)?;

        let mut depth = 1;
        let mut section = Section::Spectrum;
        let mut current_precursor: Option<Precursor> = None;
        let mut current_binary_array: Option<BinaryArrayContext> = None;
        let mut buf = Vec::new();

        loop {
            match self.reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    depth += 1;
                    match e.name().as_ref() {
                        b"cvParam" => {
                            let cv_param = parse_cv_param(e)?;
                            Self::route_cv_param(
                                section,
                                &mut spectrum,
                                current_precursor.as_mut(),
                                current_binary_array.as_mut(),
                                cv_param,
                            );
                        }
                        b"scanList" => section = Section::ScanList,
                        b"precursorList" => section = Section::PrecursorList,
                        b"precursor" => {
                            current_precursor = Some(Precursor {
                                spectrum_ref: get_attribute(e, "spectrumRef")?,
                                ..Default::default()
                            });
                        }
                        b"binaryDataArrayList" => section = Section::BinaryDataArrayList,
                        b"binaryDataArray" => {
                            current_binary_array = Some(BinaryArrayContext::default());
                        }
                        _ => {}
                    }
                }
                Ok(Event::Empty(ref e)) => {
                    if e.name().as_ref() == b"cvParam" {
                        let cv_param = parse_cv_param(e)?;
                        Self::route_cv_param(
                            section,
                            &mut spectrum,
                            current_precursor.as_mut(),
                            current_binary_array.as_mut(),
                            cv_param,
                        );
                    }
                }
                Ok(Event::Text(ref t)) => {
                    if let Some(ref mut ctx) = current_binary_array {
                        ctx.base64_data.push_str(&t.unescape()?);
                    }
                }
                Ok(Event::End(ref e)) => {
                    depth -= 1;
                    match e.name().as_ref() {
                        b"spectrum" => {
                            if depth == 0 {
                                break;
                            }
                        }
                        b"scanList" | b"precursorList" | b"binaryDataArrayList" => {
                            section = Section::Spectrum;
                        }
                        b"precursor" => {
                            if let Some(prec) = current_precursor.take() {
                                spectrum.precursors.push(prec);
                            }
                        }
                        b"binaryDataArray" => {
                            if let Some(ctx) = current_binary_array.take() {
                                Self::decode_binary_array(&mut spectrum, ctx)?;
                            }
                        }
                        _ => {}
                    }
                }
                Ok(Event::Eof) => {
                    return Err(MzMLError::InvalidStructure(
                        "Unexpected EOF in spectrum".to_string(),
                    ));
                }
                Err(e) => return Err(MzMLError::XmlError(e)),
                _ => {}
            }
            buf.clear();
        }

        if spectrum.mz_array.len() != spectrum.intensity_array.len() {
            return Err(MzMLError::ArrayLengthMismatch {
                id: spectrum.id,
                mz: spectrum.mz_array.len(),
                intensity: spectrum.intensity_array.len(),
            });
        }

        Ok(spectrum)
    }

    fn route_cv_param(
        section: Section,
        spectrum: &mut MzMLSpectrum,
        precursor: Option<&mut Precursor>,
        binary_array: Option<&mut BinaryArrayContext>,
        cv: CvParam,
    ) {
        match section {
            Section::BinaryDataArrayList => {
                if let Some(ctx) = binary_array {
                    ctx.cv_params.push(cv);
                }
            }
            Section::PrecursorList => {
                if let Some(prec) = precursor {
                    Self::apply_precursor_cv_param(prec, &cv);
                }
            }
            Section::ScanList => Self::apply_scan_cv_param(spectrum, &cv),
            Section::Spectrum => Self::apply_spectrum_cv_param(spectrum, &cv),
        }
    }

    /// Apply CV param to spectrum properties
    fn apply_spectrum_cv_param(spectrum: &mut MzMLSpectrum, cv: &CvParam) {
        if cv.accession == MS_CV_ACCESSIONS::MS_LEVEL {
            spectrum.ms_level = cv.value_as_i64().unwrap_or(1) as i16;
        }
    }

    /// Apply CV param from the scan list
    fn apply_scan_cv_param(spectrum: &mut MzMLSpectrum, cv: &CvParam) {
        match cv.accession.as_str() {
            MS_CV_ACCESSIONS::SCAN_START_TIME => {
                // First scan of the list wins
                if spectrum.retention_time.is_none() {
                    spectrum.retention_time = cv
                        .value_as_f64()
                        .map(|val| retention_time_minutes(val, cv.unit_accession.as_deref()));
                }
            }
            _ => Self::apply_spectrum_cv_param(spectrum, cv),
        }
    }

    /// Apply CV param to precursor properties
    fn apply_precursor_cv_param(precursor: &mut Precursor, cv: &CvParam) {
        match cv.accession.as_str() {
            MS_CV_ACCESSIONS::ISOLATION_WINDOW_TARGET_MZ => {
                precursor.isolation_window_target = cv.value_as_f64();
            }
            MS_CV_ACCESSIONS::SELECTED_ION_MZ => {
                if precursor.selected_ion_mz.is_none() {
                    precursor.selected_ion_mz = cv.value_as_f64();
                }
            }
            _ => {}
        }
    }

    /// Decode a binary data array and attach it to the spectrum
    fn decode_binary_array(
        spectrum: &mut MzMLSpectrum,
        ctx: BinaryArrayContext,
    ) -> Result<(), MzMLError> {
        let mut encoding = BinaryEncoding::Float64;
        let mut compression = CompressionType::None;
        let mut is_mz = false;
        let mut is_intensity = false;

        for cv in &ctx.cv_params {
            match cv.accession.as_str() {
                MS_CV_ACCESSIONS::FLOAT_32_BIT => encoding = BinaryEncoding::Float32,
                MS_CV_ACCESSIONS::FLOAT_64_BIT => encoding = BinaryEncoding::Float64,
                MS_CV_ACCESSIONS::ZLIB_COMPRESSION => compression = CompressionType::Zlib,
                MS_CV_ACCESSIONS::NO_COMPRESSION => compression = CompressionType::None,
                MS_CV_ACCESSIONS::NUMPRESS_LINEAR
                | MS_CV_ACCESSIONS::NUMPRESS_PIC
                | MS_CV_ACCESSIONS::NUMPRESS_SLOF => compression = CompressionType::Numpress,
                MS_CV_ACCESSIONS::MZ_ARRAY => is_mz = true,
                MS_CV_ACCESSIONS::INTENSITY_ARRAY => is_intensity = true,
                _ => {}
            }
        }

        // Other arrays (ion mobility, charge, ...) are not needed
        if !is_mz && !is_intensity {
            return Ok(());
        }

        let expected = (spectrum.default_array_length > 0).then_some(spectrum.default_array_length);
        let values = BinaryDecoder::decode(&ctx.base64_data, encoding, compression, expected)?;

        if is_mz {
            spectrum.mz_array = values;
        } else {
            spectrum.intensity_array = values;
        }
        Ok(())
    }
}
