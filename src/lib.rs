//! `csv-query` is a small library for reading, filtering, and aggregating CSV files (optionally
//! gzip-compressed) without loading them into memory.
//!
//! The primary entrypoint is [`ingestion::iter_rows`], which lazily yields one typed
//! [`types::Row`] per data record, using the first record as field names.
//!
//! ## What you can read
//!
//! **File formats (selected by the double extension, exact match):**
//!
//! - **CSV**: `.csv`
//! - **Gzip-compressed CSV**: `.csv.gz` (decompressed to a temporary file, removed when the row
//!   stream ends or is dropped)
//!
//! Any other extension is rejected before the file is read.
//!
//! **Value types:**
//!
//! Each field is inferred independently as a [`types::Value`]:
//!
//! - [`types::Value::Int`] if it parses as an `i64`
//! - [`types::Value::Float`] if it parses as an `f64`
//! - [`types::Value::Str`] otherwise (verbatim)
//!
//! ## Quick example: read, filter, sum
//!
//! ```no_run
//! use csv_query::ingestion::iter_rows;
//! use csv_query::processing::{filter_rows, sum_columns, Predicate};
//!
//! # fn main() -> Result<(), csv_query::QueryError> {
//! let rows = iter_rows("orders.csv.gz", b',');
//! let shipped = filter_rows(rows, &Predicate::new().with("status", "shipped"));
//! let total = sum_columns(shipped, &["amount"])?;
//! println!("shipped total={total}");
//! # Ok(())
//! # }
//! ```
//!
//! Every stage is pull-based: nothing is read until a row is requested, and at most one record is
//! held at a time.
//!
//! ## Modules
//!
//! - [`ingestion`]: row iteration, raw readers, type inference, format detection, observers
//! - [`types`]: typed values and rows
//! - [`processing`]: streaming filter and sum
//! - [`error`]: the error type shared across the crate

pub mod error;
pub mod ingestion;
pub mod processing;
pub mod types;

pub use error::{QueryError, QueryResult};
