use bytes::Bytes;

use crate::error::LoadError;
use crate::formats::reader::{DataRows, DelimitedConfig, ParsedFile};

/// Parse an object's bytes into a header and a lazy cursor over the data rows
///
/// The whole buffer must be valid UTF-8. Blank lines are skipped. Records may
/// have any number of fields; matching them against the header is left to the
/// database.
pub fn parse(bytes: Bytes, config: &DelimitedConfig) -> Result<ParsedFile, LoadError> {
    std::str::from_utf8(&bytes)?;

    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(config.delimiter)
        .quote(config.quote)
        .has_headers(true)
        .flexible(true)
        .from_reader(std::io::Cursor::new(bytes));

    let header: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|s| s.to_string())
        .collect();

    if header.is_empty() {
        return Err(LoadError::MissingHeader);
    }

    Ok(ParsedFile {
        header,
        rows: DataRows::new(csv_reader.into_records()),
    })
}
