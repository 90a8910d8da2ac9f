//! Numeric aggregation over row sequences.

use crate::error::{QueryError, QueryResult};

use super::RowItem;

/// Sum the named numeric columns over every row, as a float.
///
/// - Returns `0.0` if `columns` or `rows` is empty.
/// - Returns [`QueryError::KeyNotFound`] if a row lacks one of `columns`.
/// - Returns [`QueryError::TypeMismatch`] if a referenced value is a string.
/// - Returns the first upstream error item unchanged.
///
/// Rows are still drained when `columns` is empty, so upstream errors surface.
pub fn sum_columns<I, S>(rows: I, columns: &[S]) -> QueryResult<f64>
where
    I: IntoIterator,
    I::Item: RowItem,
    S: AsRef<str>,
{
    let mut total = 0.0;
    for item in rows {
        let row = match item.as_row() {
            Some(row) => row,
            None => match item.into_error() {
                Some(e) => return Err(e),
                None => continue,
            },
        };
        for column in columns {
            let column = column.as_ref();
            let value = row.try_get(column)?;
            total += value.as_f64().ok_or_else(|| QueryError::TypeMismatch {
                column: column.to_owned(),
                value: value.to_string(),
                type_name: value.type_name(),
            })?;
        }
    }
    Ok(total)
}
