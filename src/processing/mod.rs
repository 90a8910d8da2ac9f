//! Streaming row transformations.
//!
//! The processing layer works on any iterator of row items: owned [`Row`]s, borrowed `&Row`s, or
//! the `QueryResult<Row>` items produced by [`crate::ingestion::iter_rows`]. Upstream errors pass
//! through filters untouched and are returned by aggregations.
//!
//! Currently implemented:
//!
//! - [`filter_rows()`]: lazy AND-of-equalities filtering
//! - [`sum_columns()`]: sum of numeric columns across all rows
//!
//! ## Example: filter → sum
//!
//! ```rust
//! use csv_query::processing::{filter_rows, sum_columns, Predicate};
//! use csv_query::types::{Row, Value};
//!
//! let rows = vec![
//!     Row::from_iter([("s", Value::from("a")), ("i", Value::from(1)), ("f", Value::from(1.0))]),
//!     Row::from_iter([("s", Value::from("b")), ("i", Value::from(2)), ("f", Value::from(2.0))]),
//!     Row::from_iter([("s", Value::from("c")), ("i", Value::from(3)), ("f", Value::from(3.0))]),
//! ];
//!
//! // Numbers compare by value: the int 2 matches the float 2.0.
//! let matched = filter_rows(&rows, &Predicate::new().with("f", 2));
//! assert_eq!(sum_columns(matched, &["i"]).unwrap(), 2.0);
//!
//! assert_eq!(sum_columns(&rows, &["i", "f"]).unwrap(), 12.0);
//! ```

pub mod filter;
pub mod reduce;

pub use filter::{filter_rows, FilterRows, Predicate};
pub use reduce::sum_columns;

use crate::error::{QueryError, QueryResult};
use crate::types::Row;

/// An item of a row sequence: either a row, or an error raised upstream.
pub trait RowItem {
    /// The row, or `None` if this item carries an upstream error.
    fn as_row(&self) -> Option<&Row>;

    /// Consume the item, returning its upstream error if it carries one.
    fn into_error(self) -> Option<QueryError>;
}

impl RowItem for Row {
    fn as_row(&self) -> Option<&Row> {
        Some(self)
    }

    fn into_error(self) -> Option<QueryError> {
        None
    }
}

impl RowItem for &Row {
    fn as_row(&self) -> Option<&Row> {
        Some(*self)
    }

    fn into_error(self) -> Option<QueryError> {
        None
    }
}

impl RowItem for QueryResult<Row> {
    fn as_row(&self) -> Option<&Row> {
        self.as_ref().ok()
    }

    fn into_error(self) -> Option<QueryError> {
        self.err()
    }
}
