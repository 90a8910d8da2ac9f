//! Extension-based format detection.

use std::path::Path;

use crate::error::{QueryError, QueryResult};

/// Source formats accepted by [`super::iter_rows`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Plain delimited text (`.csv`).
    Csv,
    /// Whole-file gzip-compressed delimited text (`.csv.gz`).
    CsvGzip,
}

impl SourceFormat {
    /// Parse a format from a double extension. Matching is exact and case-sensitive.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            ".csv" => Some(Self::Csv),
            ".csv.gz" => Some(Self::CsvGzip),
            _ => None,
        }
    }

    /// The double extension this format is detected from.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => ".csv",
            Self::CsvGzip => ".csv.gz",
        }
    }

    /// Detect the format of `path` from its double extension.
    pub fn from_path(path: impl AsRef<Path>) -> QueryResult<Self> {
        let ext = double_extension(path);
        Self::from_extension(&ext).ok_or_else(|| {
            QueryError::invalid_file(format!(
                "File extension must be '.csv' or '.csv.gz'; it is '{ext}'"
            ))
        })
    }
}

/// The last two dot-suffixes of the file name, concatenated.
///
/// `archive.csv.gz` gives `.csv.gz`, `archive.txt` gives `.txt`, and a name without an
/// extension gives an empty string. Leading dots never start an extension, so `.bashrc` has
/// none.
pub fn double_extension(path: impl AsRef<Path>) -> String {
    let name = path
        .as_ref()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (stem, ext) = split_extension(&name);
    let (_, sub_ext) = split_extension(stem);
    format!("{sub_ext}{ext}")
}

fn split_extension(name: &str) -> (&str, &str) {
    let leading_dots = name.len() - name.trim_start_matches('.').len();
    match name[leading_dots..].rfind('.') {
        Some(idx) => name.split_at(leading_dots + idx),
        None => (name, ""),
    }
}
