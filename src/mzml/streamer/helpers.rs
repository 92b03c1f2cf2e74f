use quick_xml::events::BytesStart;

use super::MzMLError;
use crate::mzml::cv_params::CvParam;

fn attributes<'a>(
    e: &'a BytesStart<'a>,
) -> impl Iterator<Item = Result<(&'a [u8], String), MzMLError>> + 'a {
    e.attributes().map(|attr| {
        let attr = attr.map_err(|err| MzMLError::XmlError(quick_xml::Error::from(err)))?;
        let value = std::str::from_utf8(&attr.value)?.to_owned();
        Ok((attr.key.into_inner(), value))
    })
}

/// Value of the attribute `name`, if present
pub(super) fn get_attribute(e: &BytesStart, name: &str) -> Result<Option<String>, MzMLError> {
    for attr in attributes(e) {
        let (key, value) = attr?;
        if key == name.as_bytes() {
            return Ok(Some(value));
        }
    }
    Ok(None)
}

/// The accession, value and unit of a `cvParam`, read in one attribute pass
pub(super) fn parse_cv_param(e: &BytesStart) -> Result<CvParam, MzMLError> {
    let mut param = CvParam::default();
    for attr in attributes(e) {
        match attr? {
            (b"accession", value) => param.accession = value,
            (b"value", value) => param.value = Some(value),
            (b"unitAccession", value) => param.unit_accession = Some(value),
            _ => {}
        }
    }
    Ok(param)
}
