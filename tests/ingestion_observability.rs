use std::fs::File;
use std::io::Write;
use std::sync::{Arc, Mutex};

use flate2::write::GzEncoder;
use flate2::Compression;

use csv_query::ingestion::{
    iter_rows_with_options, CompositeObserver, FileObserver, ReadOptions, RowsContext,
    RowsObserver, RowsStats, Severity, SourceFormat, WriterObserver,
};
use csv_query::QueryError;

type Success = (Option<SourceFormat>, Option<usize>, u64, Option<u64>);

#[derive(Default)]
struct RecordingObserver {
    successes: Mutex<Vec<Success>>,
    failures: Mutex<Vec<Severity>>,
    alerts: Mutex<Vec<Severity>>,
}

impl RowsObserver for RecordingObserver {
    fn on_success(&self, ctx: &RowsContext, stats: RowsStats) {
        let success = (ctx.format, ctx.fields, stats.rows, ctx.decompressed_bytes);
        self.successes.lock().unwrap().push(success);
    }

    fn on_failure(&self, _ctx: &RowsContext, severity: Severity, _error: &QueryError) {
        self.failures.lock().unwrap().push(severity);
    }

    fn on_alert(&self, _ctx: &RowsContext, severity: Severity, _error: &QueryError) {
        self.alerts.lock().unwrap().push(severity);
    }
}

fn options(obs: Arc<RecordingObserver>, alert_at_or_above: Severity) -> ReadOptions {
    ReadOptions {
        delimiter: b' ',
        observer: Some(obs),
        alert_at_or_above,
        ..Default::default()
    }
}

#[test]
fn observer_receives_success_with_stream_shape() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = options(obs.clone(), Severity::Critical);

    let n = iter_rows_with_options("tests/fixtures/test.csv.gz", &opts).count();
    assert_eq!(n, 3);

    let successes = obs.successes.lock().unwrap().clone();
    assert_eq!(successes, vec![(Some(SourceFormat::CsvGzip), Some(3), 3, Some(30))]);
    assert!(obs.failures.lock().unwrap().is_empty());
}

#[test]
fn observer_receives_failure_without_alert_for_invalid_file() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = options(obs.clone(), Severity::Critical);

    let _ = iter_rows_with_options("tests/fixtures/empty.csv", &opts).count();

    assert_eq!(obs.failures.lock().unwrap().clone(), vec![Severity::Error]);
    assert!(obs.alerts.lock().unwrap().is_empty());
    assert!(obs.successes.lock().unwrap().is_empty());
}

#[test]
fn observer_receives_failure_and_alert_on_critical_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corrupt.csv.gz");
    std::fs::write(&path, "not gzip at all").unwrap();

    let obs = Arc::new(RecordingObserver::default());
    let opts = options(obs.clone(), Severity::Critical);
    let _ = iter_rows_with_options(&path, &opts).count();

    assert_eq!(obs.failures.lock().unwrap().clone(), vec![Severity::Critical]);
    assert_eq!(obs.alerts.lock().unwrap().clone(), vec![Severity::Critical]);
}

#[test]
fn abandoned_stream_reports_nothing() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = options(obs.clone(), Severity::Info);

    let mut rows = iter_rows_with_options("tests/fixtures/test.csv", &opts);
    assert!(rows.next().unwrap().is_ok());
    drop(rows);

    assert!(obs.successes.lock().unwrap().is_empty());
    assert!(obs.failures.lock().unwrap().is_empty());
}

#[test]
fn file_and_composite_observers_log_each_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("rows.log");

    let recorder = Arc::new(RecordingObserver::default());
    let file_observer: Arc<dyn RowsObserver> = Arc::new(FileObserver::append_to(&log).unwrap());
    let composite = CompositeObserver::new(vec![file_observer, recorder.clone()]);
    let opts = ReadOptions {
        delimiter: b' ',
        observer: Some(Arc::new(composite)),
        alert_at_or_above: Severity::Error,
        ..Default::default()
    };

    let _ = iter_rows_with_options("tests/fixtures/test.csv", &opts).count();
    let _ = iter_rows_with_options("tests/fixtures/test.txt", &opts).count();

    let text = std::fs::read_to_string(&log).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3, "log was:\n{text}");
    assert!(lines[0].ends_with(
        " rows.completed path=tests/fixtures/test.csv format=.csv fields=3 rows=3"
    ));
    assert!(lines[1].contains(
        " rows.failed severity=error path=tests/fixtures/test.txt format=- kind=invalid-file"
    ));
    assert!(lines[2].contains(" rows.alert severity=error "));
    assert!(lines[2].contains("it is '.txt'"));

    assert_eq!(recorder.successes.lock().unwrap().len(), 1);
    assert_eq!(recorder.alerts.lock().unwrap().clone(), vec![Severity::Error]);
}

#[test]
fn writer_observer_names_the_short_record() {
    let dir = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.csv.gz");
    let mut enc = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
    enc.write_all(b"id,name,score\n1,Ada,98.5\n2,Grace\n").unwrap();
    enc.finish().unwrap();

    let writer = Arc::new(WriterObserver::new(Vec::new()));
    let opts = ReadOptions {
        observer: Some(writer.clone()),
        scratch_dir: Some(scratch.path().to_path_buf()),
        ..Default::default()
    };
    let results: Vec<_> = iter_rows_with_options(&path, &opts).collect();
    assert_eq!(results.len(), 2);
    drop(opts);

    let writer = Arc::try_unwrap(writer).unwrap();
    let text = String::from_utf8(writer.into_inner()).unwrap();
    assert_eq!(
        text,
        format!(
            "rows.failed severity=error path={} format=.csv.gz fields=3 \
             kind=field-out-of-range record=3 field=score\n",
            path.display()
        )
    );
}
