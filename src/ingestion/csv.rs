//! Raw CSV record readers.
//!
//! These readers only split records. They never interpret headers or field types; see
//! [`super::unified`] for that.

use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;

use csv::StringRecord;
use flate2::read::MultiGzDecoder;
use tempfile::NamedTempFile;

use crate::error::QueryResult;

/// Field and quote characters used to split records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvDialect {
    pub delimiter: u8,
    pub quote: u8,
}

impl Default for CsvDialect {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
        }
    }
}

impl CsvDialect {
    fn reader_builder(&self) -> csv::ReaderBuilder {
        let mut builder = csv::ReaderBuilder::new();
        builder
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .quote(self.quote);
        builder
    }
}

/// A forward-only sequence of raw records.
///
/// Owns its file handle and, for gzip input, the decompressed scratch file. Both are released
/// when the value is dropped.
pub struct RawRecords<R = File> {
    // Declared before `scratch` so the handle closes before the scratch file is removed.
    reader: csv::Reader<R>,
    scratch: Option<NamedTempFile>,
    decompressed_bytes: Option<u64>,
}

impl RawRecords<File> {
    /// Read records from a plain delimited file.
    pub fn plain(path: impl AsRef<Path>, dialect: CsvDialect) -> QueryResult<Self> {
        let file = File::open(path)?;
        Ok(Self::from_reader(file, dialect))
    }

    /// Read records from a gzip-compressed delimited file.
    ///
    /// The whole decompressed stream is first copied, in chunks, into a temporary file, which is
    /// then parsed like a plain file. The temporary file is created in `scratch_dir`, or in the
    /// platform temp directory when `None`.
    pub fn gzip(
        path: impl AsRef<Path>,
        dialect: CsvDialect,
        scratch_dir: Option<&Path>,
    ) -> QueryResult<Self> {
        let compressed = File::open(path)?;
        let mut decoder = MultiGzDecoder::new(BufReader::new(compressed));

        let mut scratch = match scratch_dir {
            Some(dir) => NamedTempFile::new_in(dir)?,
            None => NamedTempFile::new()?,
        };
        let copied = io::copy(&mut decoder, &mut scratch)?;
        scratch.flush()?;
        scratch.as_file().sync_all()?;

        let file = scratch.reopen()?;
        Ok(Self {
            reader: dialect.reader_builder().from_reader(file),
            scratch: Some(scratch),
            decompressed_bytes: Some(copied),
        })
    }

    /// Location of the decompressed scratch file, for gzip input.
    pub fn scratch_path(&self) -> Option<&Path> {
        self.scratch.as_ref().map(NamedTempFile::path)
    }
}

impl<R: Read> RawRecords<R> {
    /// Read records from any byte source.
    pub fn from_reader(reader: R, dialect: CsvDialect) -> Self {
        Self {
            reader: dialect.reader_builder().from_reader(reader),
            scratch: None,
            decompressed_bytes: None,
        }
    }

    /// Size of the decompressed input, for gzip input.
    pub fn decompressed_bytes(&self) -> Option<u64> {
        self.decompressed_bytes
    }

    /// Read the next record into `record`, reusing its allocation.
    ///
    /// Returns `false` once the input is exhausted.
    pub fn read_into(&mut self, record: &mut StringRecord) -> QueryResult<bool> {
        Ok(self.reader.read_record(record)?)
    }
}

impl<R: Read> Iterator for RawRecords<R> {
    type Item = QueryResult<StringRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut record = StringRecord::new();
        match self.read_into(&mut record) {
            Ok(true) => Some(Ok(record)),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
