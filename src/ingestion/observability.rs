use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::QueryError;

use super::path::SourceFormat;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (the stream failed on its input).
    Error,
    /// Critical error (I/O or other infrastructure failures).
    Critical,
}

impl Severity {
    /// Classify an error: anything raised by the operating system is critical.
    pub fn for_error(error: &QueryError) -> Self {
        if error.is_io() {
            Severity::Critical
        } else {
            Severity::Error
        }
    }

    fn label(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
        }
    }
}

/// What is known about one row stream at the time of an event.
#[derive(Debug, Clone)]
pub struct RowsContext {
    /// The input path.
    pub path: PathBuf,
    /// Detected format; `None` if the stream failed before detection.
    pub format: Option<SourceFormat>,
    /// Number of header fields; `None` until the header has been read.
    pub fields: Option<usize>,
    /// Size of the decompressed scratch copy, for gzip input.
    pub decompressed_bytes: Option<u64>,
}

/// Stats reported when a stream is read to the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowsStats {
    /// Number of typed rows yielded (header excluded).
    pub rows: u64,
}

/// Observer interface for row stream outcomes.
///
/// Streams that are dropped before exhaustion report nothing.
pub trait RowsObserver: Send + Sync {
    /// Called when a stream is exhausted without error.
    fn on_success(&self, _ctx: &RowsContext, _stats: RowsStats) {}

    /// Called when a stream yields an error.
    fn on_failure(&self, _ctx: &RowsContext, _severity: Severity, _error: &QueryError) {}

    /// Called when a failure meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &RowsContext, severity: Severity, error: &QueryError) {
        self.on_failure(ctx, severity, error)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn RowsObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn RowsObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl RowsObserver for CompositeObserver {
    fn on_success(&self, ctx: &RowsContext, stats: RowsStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &RowsContext, severity: Severity, error: &QueryError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &RowsContext, severity: Severity, error: &QueryError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// A single stream outcome, displayed as one `key=value` log line.
///
/// ```text
/// rows.completed path=sales.csv.gz format=.csv.gz fields=4 rows=120 decompressed_bytes=5120
/// rows.failed severity=error path=sales.csv format=.csv fields=4 kind=field-out-of-range
///     record=7 field=net
/// ```
#[derive(Debug, Clone, Copy)]
pub enum RowsEvent<'a> {
    Completed {
        ctx: &'a RowsContext,
        stats: RowsStats,
    },
    Failed {
        ctx: &'a RowsContext,
        severity: Severity,
        error: &'a QueryError,
        alert: bool,
    },
}

fn write_context(f: &mut fmt::Formatter<'_>, ctx: &RowsContext) -> fmt::Result {
    write!(f, " path={}", ctx.path.display())?;
    match ctx.format {
        Some(format) => write!(f, " format={}", format.extension())?,
        None => f.write_str(" format=-")?,
    }
    if let Some(fields) = ctx.fields {
        write!(f, " fields={fields}")?;
    }
    Ok(())
}

impl fmt::Display for RowsEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            RowsEvent::Completed { ctx, stats } => {
                f.write_str("rows.completed")?;
                write_context(f, ctx)?;
                write!(f, " rows={}", stats.rows)?;
                if let Some(bytes) = ctx.decompressed_bytes {
                    write!(f, " decompressed_bytes={bytes}")?;
                }
                Ok(())
            }
            RowsEvent::Failed {
                ctx,
                severity,
                error,
                alert,
            } => {
                let name = if alert { "rows.alert" } else { "rows.failed" };
                write!(f, "{name} severity={}", severity.label())?;
                write_context(f, ctx)?;
                write!(f, " kind={}", error.kind())?;
                match error {
                    QueryError::FieldOutOfRange { record, field, .. } => {
                        write!(f, " record={record} field={field}")
                    }
                    QueryError::KeyNotFound { key } => write!(f, " field={key}"),
                    QueryError::TypeMismatch { column, .. } => write!(f, " field={column}"),
                    _ => write!(f, " err={:?}", error.to_string()),
                }
            }
        }
    }
}

/// Writes one line per stream outcome to `W`.
///
/// Write failures are ignored so logging never interrupts iteration.
#[derive(Debug)]
pub struct WriterObserver<W> {
    out: Mutex<W>,
    timestamps: bool,
}

/// Logs stream events to stderr.
pub type StdErrObserver = WriterObserver<io::Stderr>;

/// Appends stream events, prefixed with a unix timestamp, to a local log file.
pub type FileObserver = WriterObserver<File>;

impl<W: Write + Send> WriterObserver<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
            timestamps: false,
        }
    }

    /// Prefix each line with the unix time in seconds.
    pub fn with_timestamps(mut self) -> Self {
        self.timestamps = true;
        self
    }

    /// Recover the underlying writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn emit(&self, event: RowsEvent<'_>) {
        let Ok(mut out) = self.out.lock() else {
            return;
        };
        let _ = if self.timestamps {
            writeln!(out, "{} {event}", unix_ts())
        } else {
            writeln!(out, "{event}")
        };
    }
}

impl Default for StdErrObserver {
    fn default() -> Self {
        Self::new(io::stderr())
    }
}

impl FileObserver {
    /// Open `path` for appending, creating it if needed.
    pub fn append_to(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(file).with_timestamps())
    }
}

impl<W: Write + Send> RowsObserver for WriterObserver<W> {
    fn on_success(&self, ctx: &RowsContext, stats: RowsStats) {
        self.emit(RowsEvent::Completed { ctx, stats });
    }

    fn on_failure(&self, ctx: &RowsContext, severity: Severity, error: &QueryError) {
        self.emit(RowsEvent::Failed {
            ctx,
            severity,
            error,
            alert: false,
        });
    }

    fn on_alert(&self, ctx: &RowsContext, severity: Severity, error: &QueryError) {
        self.emit(RowsEvent::Failed {
            ctx,
            severity,
            error,
            alert: true,
        });
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
