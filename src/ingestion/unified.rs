//! Typed row iteration.
//!
//! Most callers should use [`iter_rows`], which lazily reads a `.csv` or `.csv.gz` file into
//! [`crate::types::Row`]s.
//!
//! - The format is selected by the file's double extension.
//! - Nothing is opened until the first row (or [`Rows::headers`]) is requested.
//! - If an [`super::observability::RowsObserver`] is configured, completion and failure are
//!   reported to it.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ::csv::StringRecord;

use crate::error::{QueryError, QueryResult};
use crate::types::Row;

use super::csv::{CsvDialect, RawRecords};
use super::infer::infer_value;
use super::observability::{RowsContext, RowsObserver, RowsStats, Severity};
use super::path::SourceFormat;

/// Options controlling row iteration.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct ReadOptions {
    /// Field delimiter. Defaults to `b','`.
    pub delimiter: u8,
    /// Quote character. Defaults to `b'"'`.
    pub quote: u8,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn RowsObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: Severity,
    /// Directory for the decompressed copy of `.csv.gz` input. Defaults to the platform temp
    /// directory.
    pub scratch_dir: Option<PathBuf>,
}

impl ReadOptions {
    fn dialect(&self) -> CsvDialect {
        CsvDialect {
            delimiter: self.delimiter,
            quote: self.quote,
        }
    }
}

impl fmt::Debug for ReadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadOptions")
            .field("delimiter", &char::from(self.delimiter))
            .field("quote", &char::from(self.quote))
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .field("scratch_dir", &self.scratch_dir)
            .finish()
    }
}

impl Default for ReadOptions {
    fn default() -> Self {
        let dialect = CsvDialect::default();
        Self {
            delimiter: dialect.delimiter,
            quote: dialect.quote,
            observer: None,
            alert_at_or_above: Severity::Critical,
            scratch_dir: None,
        }
    }
}

/// Lazily iterate the typed rows of a `.csv` or `.csv.gz` file.
///
/// The first record is the header; every later record becomes a [`Row`] whose fields are
/// inferred with [`super::infer_value`]. Errors are yielded as items:
///
/// - `File does not exist: <path>` if `path` is not a regular file
/// - `File extension must be '.csv' or '.csv.gz'; it is '<ext>'` for other extensions
/// - `CSV is empty` if there is no header record
///
/// all as [`QueryError::InvalidFile`]. The stream ends after the first error.
///
/// Blank lines are skipped and produce no row, so a file holding only blank lines counts as
/// empty.
///
/// # Examples
///
/// ```no_run
/// use csv_query::ingestion::iter_rows;
/// use csv_query::processing::{filter_rows, sum_columns, Predicate};
///
/// # fn main() -> csv_query::QueryResult<()> {
/// let rows = iter_rows("sales.csv.gz", b',');
/// let emea = filter_rows(rows, &Predicate::new().with("region", "EMEA"));
/// let total = sum_columns(emea, &["net", "tax"])?;
/// println!("total={total}");
/// # Ok(())
/// # }
/// ```
pub fn iter_rows(path: impl AsRef<Path>, delimiter: u8) -> Rows {
    let options = ReadOptions {
        delimiter,
        ..Default::default()
    };
    iter_rows_with_options(path, &options)
}

/// Like [`iter_rows`], with full [`ReadOptions`].
///
/// ## Observability (stderr logging + alert threshold)
///
/// ```no_run
/// use std::sync::Arc;
///
/// use csv_query::ingestion::{iter_rows_with_options, ReadOptions, Severity, StdErrObserver};
///
/// let opts = ReadOptions {
///     delimiter: b'\t',
///     observer: Some(Arc::new(StdErrObserver::default())),
///     alert_at_or_above: Severity::Error,
///     ..Default::default()
/// };
/// for row in iter_rows_with_options("events.csv", &opts) {
///     let _row = row?;
/// }
/// # Ok::<(), csv_query::QueryError>(())
/// ```
pub fn iter_rows_with_options(path: impl AsRef<Path>, options: &ReadOptions) -> Rows {
    Rows {
        path: path.as_ref().to_path_buf(),
        options: options.clone(),
        format: None,
        header: None,
        decompressed_bytes: None,
        rows: 0,
        state: State::Pending,
    }
}

/// Read typed rows from any byte source.
///
/// Unlike [`iter_rows`], the header is read immediately, so an empty input fails here with
/// `CSV is empty`.
pub fn iter_rows_from_reader<R: Read>(reader: R, delimiter: u8) -> QueryResult<RowStream<R>> {
    let dialect = CsvDialect {
        delimiter,
        ..Default::default()
    };
    RowStream::new(RawRecords::from_reader(reader, dialect))
}

/// Typed rows over an open record source whose header has been read.
pub struct RowStream<R = File> {
    header: Arc<[String]>,
    // Column index -> position of its (deduplicated) field name in `header`.
    slots: Vec<usize>,
    records: RawRecords<R>,
    record: StringRecord,
    // 1-based record number of the last record read; the header is record 1.
    record_no: u64,
    finished: bool,
}

impl<R: Read> RowStream<R> {
    fn new(mut records: RawRecords<R>) -> QueryResult<Self> {
        let mut first = StringRecord::new();
        if !records.read_into(&mut first)? {
            return Err(QueryError::invalid_file("CSV is empty"));
        }

        let mut names: Vec<String> = Vec::with_capacity(first.len());
        let mut slots = Vec::with_capacity(first.len());
        for name in first.iter() {
            match names.iter().position(|n| n == name) {
                Some(slot) => slots.push(slot),
                None => {
                    slots.push(names.len());
                    names.push(name.to_owned());
                }
            }
        }

        Ok(Self {
            header: names.into(),
            slots,
            records,
            record: first,
            record_no: 1,
            finished: false,
        })
    }

    /// Field names in header order (duplicates collapsed).
    pub fn headers(&self) -> &[String] {
        &self.header
    }

    fn materialize(&self) -> QueryResult<Row> {
        let mut values = Vec::with_capacity(self.header.len());
        for (idx, &slot) in self.slots.iter().enumerate() {
            let raw = self
                .record
                .get(idx)
                .ok_or_else(|| QueryError::FieldOutOfRange {
                    record: self.record_no,
                    index: idx,
                    field: self.header[slot].clone(),
                })?;
            let value = infer_value(raw);
            // Slots are numbered by first appearance, so a new slot is always the next one.
            if slot == values.len() {
                values.push(value);
            } else {
                values[slot] = value;
            }
        }
        Ok(Row::from_parts(Arc::clone(&self.header), values))
    }
}

impl<R: Read> Iterator for RowStream<R> {
    type Item = QueryResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = match self.records.read_into(&mut self.record) {
            Ok(true) => {
                self.record_no += 1;
                self.materialize()
            }
            Ok(false) => {
                self.finished = true;
                return None;
            }
            Err(e) => Err(e),
        };
        if result.is_err() {
            self.finished = true;
        }
        Some(result)
    }
}

enum State {
    Pending,
    Open(RowStream<File>),
    Done,
}

/// Lazy typed rows of a file, returned by [`iter_rows`].
///
/// The file handle (and, for gzip input, the decompressed scratch file) is acquired on first
/// demand and released as soon as the stream ends, fails, or is dropped.
pub struct Rows {
    path: PathBuf,
    options: ReadOptions,
    format: Option<SourceFormat>,
    header: Option<Arc<[String]>>,
    decompressed_bytes: Option<u64>,
    rows: u64,
    state: State,
}

impl fmt::Debug for Rows {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            State::Pending => "pending",
            State::Open(_) => "open",
            State::Done => "done",
        };
        f.debug_struct("Rows")
            .field("path", &self.path)
            .field("format", &self.format)
            .field("rows", &self.rows)
            .field("state", &state)
            .finish()
    }
}

impl Rows {
    /// Open the source if needed and return its field names.
    ///
    /// Returns `Ok(None)` if the stream already ended without reading a header. An error from
    /// opening is returned here and ends the stream.
    pub fn headers(&mut self) -> QueryResult<Option<&[String]>> {
        if matches!(self.state, State::Pending) {
            match self.open() {
                Ok(stream) => self.state = State::Open(stream),
                Err(e) => {
                    self.state = State::Done;
                    return Err(self.report_failure(e));
                }
            }
        }
        Ok(self.header.as_deref())
    }

    fn open(&mut self) -> QueryResult<RowStream<File>> {
        if !self.path.is_file() {
            return Err(QueryError::invalid_file(format!(
                "File does not exist: {}",
                self.path.display()
            )));
        }
        let format = SourceFormat::from_path(&self.path)?;
        self.format = Some(format);

        let dialect = self.options.dialect();
        let records = match format {
            SourceFormat::Csv => RawRecords::plain(&self.path, dialect)?,
            SourceFormat::CsvGzip => {
                RawRecords::gzip(&self.path, dialect, self.options.scratch_dir.as_deref())?
            }
        };
        self.decompressed_bytes = records.decompressed_bytes();
        let stream = RowStream::new(records)?;
        self.header = Some(Arc::clone(&stream.header));
        Ok(stream)
    }

    fn context(&self) -> RowsContext {
        RowsContext {
            path: self.path.clone(),
            format: self.format,
            fields: self.header.as_ref().map(|h| h.len()),
            decompressed_bytes: self.decompressed_bytes,
        }
    }

    fn report_failure(&self, error: QueryError) -> QueryError {
        if let Some(obs) = self.options.observer.as_ref() {
            let ctx = self.context();
            let sev = Severity::for_error(&error);
            obs.on_failure(&ctx, sev, &error);
            if sev >= self.options.alert_at_or_above {
                obs.on_alert(&ctx, sev, &error);
            }
        }
        error
    }

    fn report_success(&self) {
        if let Some(obs) = self.options.observer.as_ref() {
            obs.on_success(&self.context(), RowsStats { rows: self.rows });
        }
    }
}

impl Iterator for Rows {
    type Item = QueryResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Err(e) = self.headers() {
            return Some(Err(e));
        }
        let State::Open(stream) = &mut self.state else {
            return None;
        };
        match stream.next() {
            Some(Ok(row)) => {
                self.rows += 1;
                Some(Ok(row))
            }
            Some(Err(e)) => {
                self.state = State::Done;
                Some(Err(self.report_failure(e)))
            }
            None => {
                self.state = State::Done;
                self.report_success();
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{iter_rows_from_reader, ReadOptions};
    use crate::error::QueryError;
    use crate::types::Value;

    #[test]
    fn header_names_become_keys() {
        let rows: Vec<_> = iter_rows_from_reader("s,i,f\na,1,1.0\n".as_bytes(), b',')
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].field_names().collect::<Vec<_>>(), vec!["s", "i", "f"]);
        assert_eq!(rows[0].get("s"), Some(&Value::Str("a".to_string())));
        assert_eq!(rows[0].get("i"), Some(&Value::Int(1)));
        assert_eq!(rows[0].get("f"), Some(&Value::Float(1.0)));
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = iter_rows_from_reader("".as_bytes(), b',').err().unwrap();
        assert!(matches!(err, QueryError::InvalidFile(ref m) if m == "CSV is empty"));
    }

    #[test]
    fn header_only_yields_no_rows() {
        let stream = iter_rows_from_reader("a,b\n".as_bytes(), b',').unwrap();
        assert_eq!(stream.headers(), ["a", "b"]);
        assert_eq!(stream.count(), 0);
    }

    #[test]
    fn short_record_fails_and_ends_the_stream() {
        let input = "a,b,c\n1,2,3\n4,5\n6,7,8\n";
        let mut stream = iter_rows_from_reader(input.as_bytes(), b',').unwrap();
        assert!(stream.next().unwrap().is_ok());
        match stream.next().unwrap() {
            Err(QueryError::FieldOutOfRange { record, index, field }) => {
                assert_eq!(record, 3);
                assert_eq!(index, 2);
                assert_eq!(field, "c");
            }
            other => panic!("expected FieldOutOfRange, got {other:?}"),
        }
        assert!(stream.next().is_none());
    }

    #[test]
    fn blank_lines_produce_no_rows() {
        let rows: Vec<_> = iter_rows_from_reader("a,b\n1,2\n\n\n3,4\n".as_bytes(), b',')
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("a"), Some(&Value::Int(3)));
    }

    #[test]
    fn only_blank_lines_is_empty() {
        let err = iter_rows_from_reader("\n\n".as_bytes(), b',').err().unwrap();
        assert!(matches!(err, QueryError::InvalidFile(ref m) if m == "CSV is empty"));
    }

    #[test]
    fn surplus_fields_are_ignored() {
        let rows: Vec<_> = iter_rows_from_reader("a,b\n1,2,3\n".as_bytes(), b',')
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[0].get("b"), Some(&Value::Int(2)));
    }

    #[test]
    fn duplicate_headers_keep_last_value() {
        let rows: Vec<_> = iter_rows_from_reader("a,b,a\n1,2,3\n".as_bytes(), b',')
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(rows[0].field_names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(rows[0].get("a"), Some(&Value::Int(3)));
    }

    #[test]
    fn options_debug_hides_observer() {
        let dbg = format!("{:?}", ReadOptions::default());
        assert!(dbg.contains("delimiter: ','"));
        assert!(dbg.contains("observer_set: false"));
        assert!(dbg.contains("scratch_dir: None"));
    }
}
