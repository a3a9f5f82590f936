use bytes::Bytes;
use std::io::Cursor;

use crate::error::LoadError;

/// A single record (row) from the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// 1-based line in the source object where the record starts
    pub line: u64,
    pub fields: Vec<String>,
}

/// Configuration for delimited file reading
#[derive(Debug, Clone)]
pub struct DelimitedConfig {
    pub delimiter: u8,
    pub quote: u8,
}

impl Default for DelimitedConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
        }
    }
}

impl DelimitedConfig {
    pub fn csv() -> Self {
        Self::default()
    }
}

/// A parsed object: the header plus a cursor over the data rows
pub struct ParsedFile {
    pub header: Vec<String>,
    pub rows: DataRows,
}

/// Single-pass cursor over the data rows of a parsed object
///
/// Rows are parsed lazily as the cursor advances and each is yielded once. The
/// cursor cannot be rewound; reading the rows again means fetching the object
/// again.
pub struct DataRows {
    records: csv::StringRecordsIntoIter<Cursor<Bytes>>,
}

impl DataRows {
    pub(crate) fn new(records: csv::StringRecordsIntoIter<Cursor<Bytes>>) -> Self {
        Self { records }
    }
}

impl Iterator for DataRows {
    type Item = Result<Record, LoadError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.records.next()? {
            Ok(record) => record,
            Err(e) => return Some(Err(LoadError::Parse(e))),
        };

        let line = record.position().map(|p| p.line()).unwrap_or(0);
        Some(Ok(Record {
            line,
            fields: record.iter().map(|s| s.to_string()).collect(),
        }))
    }
}
