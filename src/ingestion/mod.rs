//! Ingestion entrypoints and implementations.
//!
//! Most callers should use [`iter_rows`] (from [`unified`]) which:
//!
//! - validates the path and selects plain or gzip reading by double extension ([`path`])
//! - lazily yields typed [`crate::types::Row`]s, inferring each field's type ([`infer`])
//! - optionally reports completion/failure/alerts to a [`RowsObserver`]
//!
//! Raw record readers are available under [`csv`].

pub mod csv;
pub mod infer;
pub mod observability;
pub mod path;
pub mod unified;

pub use infer::infer_value;
pub use observability::{
    CompositeObserver, FileObserver, RowsContext, RowsEvent, RowsObserver, RowsStats, Severity,
    StdErrObserver, WriterObserver,
};
pub use path::{double_extension, SourceFormat};
pub use unified::{
    iter_rows, iter_rows_from_reader, iter_rows_with_options, ReadOptions, RowStream, Rows,
};
