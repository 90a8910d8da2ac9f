//! Equality filtering for row sequences.

use crate::types::{Row, Value};

use super::RowItem;

/// Required field values; a row matches when every pair is present and equal.
///
/// Pairs are ANDed. Numbers compare by value, so `Int(2)` matches `Float(2.0)`. An empty
/// predicate matches every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    pairs: Vec<(String, Value)>,
}

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field == value`. Requiring the same field twice keeps the last value.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        let field = field.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == field) {
            Some((_, v)) => *v = value,
            None => self.pairs.push((field, value)),
        }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Returns `true` if `row` holds every required field with an equal value.
    pub fn matches(&self, row: &Row) -> bool {
        self.pairs.iter().all(|(k, v)| row.get(k) == Some(v))
    }
}

impl<K, V> FromIterator<(K, V)> for Predicate
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut predicate = Self::new();
        for (k, v) in iter {
            predicate.insert(k, v);
        }
        predicate
    }
}

/// Lazily keep the rows matching `predicate`.
///
/// Rows are passed through unchanged. Error items from upstream are passed through as well.
pub fn filter_rows<I>(rows: I, predicate: &Predicate) -> FilterRows<I::IntoIter>
where
    I: IntoIterator,
    I::Item: RowItem,
{
    FilterRows {
        inner: rows.into_iter(),
        predicate: predicate.clone(),
    }
}

/// Iterator returned by [`filter_rows`].
#[derive(Debug, Clone)]
pub struct FilterRows<I> {
    inner: I,
    predicate: Predicate,
}

impl<I> Iterator for FilterRows<I>
where
    I: Iterator,
    I::Item: RowItem,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .by_ref()
            .find(|item| item.as_row().is_none_or(|row| self.predicate.matches(row)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.inner.size_hint().1)
    }
}

#[cfg(test)]
mod tests {
    use super::{filter_rows, Predicate};
    use crate::error::{QueryError, QueryResult};
    use crate::types::{Row, Value};

    fn row(s: &str, i: i64, f: f64) -> Row {
        Row::from_iter([("s", Value::from(s)), ("i", Value::from(i)), ("f", Value::from(f))])
    }

    fn sample_rows() -> Vec<Row> {
        vec![
            row("a", 1, 1.0),
            row("b", 2, 2.0),
            row("c", 3, 3.0),
        ]
    }

    #[test]
    fn empty_predicate_is_identity() {
        let rows = sample_rows();
        let out: Vec<Row> = filter_rows(rows.clone(), &Predicate::new()).collect();
        assert_eq!(out, rows);
    }

    #[test]
    fn all_pairs_must_match() {
        let rows = sample_rows();
        let predicate = Predicate::new().with("i", 2).with("f", 2.0);
        let out: Vec<&Row> = filter_rows(&rows, &predicate).collect();
        assert_eq!(out, vec![&rows[1]]);
    }

    #[test]
    fn ints_match_equal_floats() {
        let rows = sample_rows();
        let predicate = Predicate::new().with("f", 3).with("i", 3.0);
        let out: Vec<&Row> = filter_rows(&rows, &predicate).collect();
        assert_eq!(out, vec![&rows[2]]);
    }

    #[test]
    fn absent_key_excludes_row() {
        let rows = sample_rows();
        let predicate: Predicate = [
            ("i", Value::from(2)),
            ("f", Value::from(2.0)),
            ("s", Value::from("b")),
            ("x", Value::from("hi")),
        ]
        .into_iter()
        .collect();
        assert_eq!(filter_rows(&rows, &predicate).count(), 0);
    }

    #[test]
    fn string_never_matches_number() {
        let rows = sample_rows();
        assert_eq!(filter_rows(&rows, &Predicate::new().with("i", "1")).count(), 0);
    }

    #[test]
    fn errors_pass_through() {
        let items: Vec<QueryResult<Row>> = vec![
            Ok(sample_rows().remove(0)),
            Err(QueryError::KeyNotFound { key: "k".to_string() }),
            Ok(sample_rows().remove(1)),
        ];
        let predicate = Predicate::new().with("s", "b");
        let out: Vec<QueryResult<Row>> = filter_rows(items, &predicate).collect();
        assert_eq!(out.len(), 2);
        assert!(out[0].is_err());
        assert_eq!(out[1].as_ref().unwrap().get("s"), Some(&Value::from("b")));
    }

    #[test]
    fn repeated_field_keeps_last_value() {
        let predicate = Predicate::new().with("i", 1).with("i", 2);
        assert_eq!(predicate.len(), 1);
        assert!(predicate.matches(&sample_rows()[1]));
    }

    #[test]
    fn is_lazy() {
        let mut pulled = 0;
        let source = sample_rows().into_iter().inspect(|_| pulled += 1);
        let mut filtered = filter_rows(source, &Predicate::new().with("s", "a"));
        assert!(filtered.next().is_some());
        drop(filtered);
        assert_eq!(pulled, 1);
    }
}
