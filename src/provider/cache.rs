//! Parquet persistence of the peak tables of a run.
//!
//! Every run gets two sibling files, `<run>_ms1.parquet` and
//! `<run>_ms2.parquet`. Files are written to a temporary file in the same
//! directory and then persisted without clobbering, so concurrent writers
//! never observe a partially written cache.

use std::ffi::OsString;
use std::fs::File;
use std::path::{Path, PathBuf};

use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, Encoding, ZstdLevel};
use parquet::file::metadata::KeyValue;
use parquet::file::properties::{EnabledStatistics, WriterProperties};
use parquet::schema::types::ColumnPath;
use tempfile::NamedTempFile;

use super::CacheError;
use crate::table::{
    columns, ms1_from_batch, ms1_to_batch, ms2_from_batch, ms2_to_batch, Ms1Table, Ms2Table,
    RunTables,
};

/// Compression type for cache files
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompressionType {
    /// ZSTD compression with the given level
    Zstd(i32),
    /// Snappy compression (faster, slightly larger files)
    Snappy,
    /// No compression (fastest write, largest files)
    Uncompressed,
}

impl Default for CompressionType {
    fn default() -> Self {
        Self::Zstd(3)
    }
}

/// Settings for writing cache files
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Compression type to use
    pub compression: CompressionType,

    /// Target row group size (number of rows per group)
    pub row_group_size: usize,

    /// Data page size in bytes
    pub data_page_size: usize,

    /// Whether to write statistics for columns
    pub write_statistics: bool,

    /// Enable BYTE_STREAM_SPLIT encoding for the m/z and intensity columns
    pub use_byte_stream_split: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            compression: CompressionType::default(),
            row_group_size: 100_000,
            data_page_size: 1024 * 1024,
            write_statistics: true,
            use_byte_stream_split: true,
        }
    }
}

impl CacheConfig {
    /// Configuration optimized for fast writing (larger files)
    pub fn fast_write() -> Self {
        Self {
            compression: CompressionType::Snappy,
            row_group_size: 50_000,
            data_page_size: 512 * 1024,
            ..Self::default()
        }
    }

    /// Set the compression type
    pub fn with_compression(mut self, compression: CompressionType) -> Self {
        self.compression = compression;
        self
    }

    /// Set the row group size
    pub fn with_row_group_size(mut self, row_group_size: usize) -> Self {
        self.row_group_size = row_group_size;
        self
    }

    /// Create writer properties for one of the two tables
    pub(crate) fn to_writer_properties(&self, table: &str) -> WriterProperties {
        let compression = match self.compression {
            CompressionType::Zstd(level) => {
                Compression::ZSTD(ZstdLevel::try_new(level).unwrap_or_default())
            }
            CompressionType::Snappy => Compression::SNAPPY,
            CompressionType::Uncompressed => Compression::UNCOMPRESSED,
        };

        let statistics = if self.write_statistics {
            EnabledStatistics::Chunk
        } else {
            EnabledStatistics::None
        };

        let mut builder = WriterProperties::builder()
            .set_compression(compression)
            .set_data_page_size_limit(self.data_page_size)
            .set_statistics_enabled(statistics)
            .set_max_row_group_size(self.row_group_size);

        // Scan-level columns repeat for every peak of a scan
        let dict_columns = [
            columns::SCAN,
            columns::RETENTION_TIME,
            columns::PRECURSOR_MZ,
            columns::PARENT_MS1_SCAN,
        ];
        for col in dict_columns {
            builder = builder
                .set_column_dictionary_enabled(ColumnPath::new(vec![col.to_string()]), true);
        }

        let float_columns = [columns::MZ, columns::INTENSITY];
        for col in float_columns {
            builder = builder
                .set_column_dictionary_enabled(ColumnPath::new(vec![col.to_string()]), false);
            if self.use_byte_stream_split {
                builder = builder.set_column_encoding(
                    ColumnPath::new(vec![col.to_string()]),
                    Encoding::BYTE_STREAM_SPLIT,
                );
            }
        }

        builder = builder.set_key_value_metadata(Some(vec![
            KeyValue {
                key: "msql:table".to_string(),
                value: Some(table.to_string()),
            },
            KeyValue {
                key: "msql:version".to_string(),
                value: Some(env!("CARGO_PKG_VERSION").to_string()),
            },
        ]));

        builder.build()
    }
}

/// Paths of the two cache files of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePaths {
    /// MS1 table file
    pub ms1: PathBuf,
    /// MS2 table file
    pub ms2: PathBuf,
}

impl CachePaths {
    /// Cache locations for `run`
    pub fn for_run(run: &Path) -> Self {
        Self {
            ms1: sibling(run, "_ms1.parquet"),
            ms2: sibling(run, "_ms2.parquet"),
        }
    }

    /// Whether both files are present
    pub fn exists(&self) -> bool {
        self.ms1.is_file() && self.ms2.is_file()
    }

    /// Remove both files, ignoring ones that are already gone
    pub fn remove(&self) -> Result<(), CacheError> {
        for path in [&self.ms1, &self.ms2] {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

fn sibling(run: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(run.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Read both tables from the cache; `None` when either file is missing
pub fn read_tables(paths: &CachePaths) -> Result<Option<RunTables>, CacheError> {
    if !paths.exists() {
        return Ok(None);
    }

    let mut ms1 = Vec::new();
    for batch in read_batches(&paths.ms1)? {
        ms1_from_batch(&batch, &mut ms1).map_err(|e| corrupt(&paths.ms1, e))?;
    }

    let mut ms2 = Vec::new();
    for batch in read_batches(&paths.ms2)? {
        ms2_from_batch(&batch, &mut ms2).map_err(|e| corrupt(&paths.ms2, e))?;
    }

    Ok(Some(RunTables::new(Ms1Table::new(ms1), Ms2Table::new(ms2))))
}

fn corrupt(path: &Path, reason: impl ToString) -> CacheError {
    CacheError::Corrupt {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn read_batches(path: &Path) -> Result<Vec<RecordBatch>, CacheError> {
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .and_then(|builder| builder.build())
        .map_err(|e| corrupt(path, e))?;

    reader
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| corrupt(path, e))
}

/// Write both tables unless the files already exist
pub fn write_tables(
    paths: &CachePaths,
    tables: &RunTables,
    config: &CacheConfig,
) -> Result<(), CacheError> {
    let ms1 = ms1_to_batch(tables.ms1.rows())?;
    write_if_absent(&paths.ms1, &ms1, config.to_writer_properties("ms1"))?;

    let ms2 = ms2_to_batch(tables.ms2.rows())?;
    write_if_absent(&paths.ms2, &ms2, config.to_writer_properties("ms2"))?;

    Ok(())
}

fn write_if_absent(
    path: &Path,
    batch: &RecordBatch,
    props: WriterProperties,
) -> Result<(), CacheError> {
    if path.exists() {
        return Ok(());
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;

    let mut writer = ArrowWriter::try_new(&mut tmp, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;

    match tmp.persist_noclobber(path) {
        Ok(_) => Ok(()),
        // Another writer got there first
        Err(_) if path.exists() => Ok(()),
        Err(e) => Err(e.error.into()),
    }
}
