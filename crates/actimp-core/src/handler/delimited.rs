//! Conversion of a delimited-text page into rows.

use csv::{ReaderBuilder, Trim};

use crate::error::ParserError;
use crate::models::activity::Page;

/// Split the lines of a delimited-text page into rows of trimmed cells.
///
/// The first row is the header. Blank lines are skipped, quoted cells are unquoted.
pub fn rows_from_page(page: &[String], delimiter: u8) -> Result<Vec<Page>, ParserError> {
    let text = page.join("\n");
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    if rows.is_empty() {
        return Err(ParserError::MissingHeader);
    }

    Ok(rows)
}
