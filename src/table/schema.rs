//! Arrow schemas and record batch conversion for the peak tables.
//!
//! Column names follow the MassQL conventions (`i`, `rt`, `precmz`,
//! `ms1scan`) so cached tables and exported results stay readable by existing
//! downstream scripts.

use std::collections::HashMap;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array, Float64Builder, Int64Array, Int64Builder};
use arrow::datatypes::{DataType, Field, SchemaBuilder, SchemaRef};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;

use super::{Ms1Peak, Ms2Peak};

/// Column names as constants
pub mod columns {
    /// Mass-to-charge ratio
    pub const MZ: &str = "mz";
    /// Peak intensity
    pub const INTENSITY: &str = "i";
    /// Scan identifier
    pub const SCAN: &str = "scan";
    /// Retention time in minutes
    pub const RETENTION_TIME: &str = "rt";
    /// Precursor m/z (MS2 only)
    pub const PRECURSOR_MZ: &str = "precmz";
    /// Parent MS1 scan (MS2 only)
    pub const PARENT_MS1_SCAN: &str = "ms1scan";
    /// m/z bin index (binned aggregates only)
    pub const BIN: &str = "bin";
}

/// Creates a Field with CV term metadata annotation
fn field_with_cv(name: &str, data_type: DataType, cv_accession: &str) -> Field {
    let mut metadata = HashMap::new();
    metadata.insert("cv_accession".to_string(), cv_accession.to_string());
    Field::new(name, data_type, false).with_metadata(metadata)
}

fn push_common_fields(builder: &mut SchemaBuilder) {
    builder.push(field_with_cv(columns::MZ, DataType::Float64, "MS:1000040"));
    builder.push(field_with_cv(
        columns::INTENSITY,
        DataType::Float64,
        "MS:1000042",
    ));
    builder.push(field_with_cv(columns::SCAN, DataType::Int64, "MS:1000797"));
    builder.push(field_with_cv(
        columns::RETENTION_TIME,
        DataType::Float64,
        "MS:1000016",
    ));
}

/// Schema of the MS1 peak table
pub fn ms1_schema() -> SchemaRef {
    let mut builder = SchemaBuilder::new();
    push_common_fields(&mut builder);
    Arc::new(builder.finish())
}

/// Schema of the MS2 peak table
pub fn ms2_schema() -> SchemaRef {
    let mut builder = SchemaBuilder::new();
    push_common_fields(&mut builder);
    builder.push(field_with_cv(
        columns::PRECURSOR_MZ,
        DataType::Float64,
        "MS:1000744",
    ));
    builder.push(field_with_cv(
        columns::PARENT_MS1_SCAN,
        DataType::Int64,
        "MS:1000796",
    ));
    Arc::new(builder.finish())
}

#[inline]
fn build_f64_array<I: Iterator<Item = f64>>(len: usize, values: I) -> ArrayRef {
    let mut builder = Float64Builder::with_capacity(len);
    for value in values {
        builder.append_value(value);
    }
    Arc::new(builder.finish())
}

#[inline]
fn build_i64_array<I: Iterator<Item = i64>>(len: usize, values: I) -> ArrayRef {
    let mut builder = Int64Builder::with_capacity(len);
    for value in values {
        builder.append_value(value);
    }
    Arc::new(builder.finish())
}

/// Convert MS1 rows into a record batch
pub fn ms1_to_batch(rows: &[Ms1Peak]) -> Result<RecordBatch, ArrowError> {
    let len = rows.len();
    RecordBatch::try_new(
        ms1_schema(),
        vec![
            build_f64_array(len, rows.iter().map(|r| r.mz)),
            build_f64_array(len, rows.iter().map(|r| r.intensity)),
            build_i64_array(len, rows.iter().map(|r| r.scan)),
            build_f64_array(len, rows.iter().map(|r| r.retention_time)),
        ],
    )
}

/// Convert MS2 rows into a record batch
pub fn ms2_to_batch(rows: &[Ms2Peak]) -> Result<RecordBatch, ArrowError> {
    let len = rows.len();
    RecordBatch::try_new(
        ms2_schema(),
        vec![
            build_f64_array(len, rows.iter().map(|r| r.mz)),
            build_f64_array(len, rows.iter().map(|r| r.intensity)),
            build_i64_array(len, rows.iter().map(|r| r.scan)),
            build_f64_array(len, rows.iter().map(|r| r.retention_time)),
            build_f64_array(len, rows.iter().map(|r| r.precursor_mz)),
            build_i64_array(len, rows.iter().map(|r| r.parent_ms1_scan)),
        ],
    )
}

/// Get a required Float64 column by name.
fn get_float64_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Float64Array, ArrowError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| ArrowError::SchemaError(format!("column not found: {}", name)))?
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| ArrowError::SchemaError(format!("{} is not Float64", name)))
}

/// Get a required Int64 column by name.
fn get_int64_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Int64Array, ArrowError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| ArrowError::SchemaError(format!("column not found: {}", name)))?
        .as_any()
        .downcast_ref::<Int64Array>()
        .ok_or_else(|| ArrowError::SchemaError(format!("{} is not Int64", name)))
}

fn reject_nulls(array: &dyn Array, name: &str) -> Result<(), ArrowError> {
    if array.null_count() > 0 {
        return Err(ArrowError::InvalidArgumentError(format!(
            "{} contains {} null values",
            name,
            array.null_count()
        )));
    }
    Ok(())
}

/// Append the rows of an MS1 record batch to `out`
pub fn ms1_from_batch(batch: &RecordBatch, out: &mut Vec<Ms1Peak>) -> Result<(), ArrowError> {
    let mz = get_float64_column(batch, columns::MZ)?;
    let intensity = get_float64_column(batch, columns::INTENSITY)?;
    let scan = get_int64_column(batch, columns::SCAN)?;
    let rt = get_float64_column(batch, columns::RETENTION_TIME)?;
    reject_nulls(mz, columns::MZ)?;
    reject_nulls(intensity, columns::INTENSITY)?;
    reject_nulls(scan, columns::SCAN)?;
    reject_nulls(rt, columns::RETENTION_TIME)?;

    out.reserve(batch.num_rows());
    for i in 0..batch.num_rows() {
        out.push(Ms1Peak {
            mz: mz.value(i),
            intensity: intensity.value(i),
            scan: scan.value(i),
            retention_time: rt.value(i),
        });
    }
    Ok(())
}

/// Append the rows of an MS2 record batch to `out`
pub fn ms2_from_batch(batch: &RecordBatch, out: &mut Vec<Ms2Peak>) -> Result<(), ArrowError> {
    let mz = get_float64_column(batch, columns::MZ)?;
    let intensity = get_float64_column(batch, columns::INTENSITY)?;
    let scan = get_int64_column(batch, columns::SCAN)?;
    let rt = get_float64_column(batch, columns::RETENTION_TIME)?;
    let precursor_mz = get_float64_column(batch, columns::PRECURSOR_MZ)?;
    let parent = get_int64_column(batch, columns::PARENT_MS1_SCAN)?;
    reject_nulls(mz, columns::MZ)?;
    reject_nulls(intensity, columns::INTENSITY)?;
    reject_nulls(scan, columns::SCAN)?;
    reject_nulls(rt, columns::RETENTION_TIME)?;
    reject_nulls(precursor_mz, columns::PRECURSOR_MZ)?;
    reject_nulls(parent, columns::PARENT_MS1_SCAN)?;

    out.reserve(batch.num_rows());
    for i in 0..batch.num_rows() {
        out.push(Ms2Peak {
            mz: mz.value(i),
            intensity: intensity.value(i),
            scan: scan.value(i),
            retention_time: rt.value(i),
            precursor_mz: precursor_mz.value(i),
            parent_ms1_scan: parent.value(i),
        });
    }
    Ok(())
}
