//! File intake: raw bytes to pages.

use tracing::debug;

use crate::error::{DocumentError, ParserError, Result};
use crate::models::activity::Page;
use crate::models::config::DocumentConfig;
use crate::pdf::render_pages;

/// A file rendered into pages, with its normalized extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFile {
    pub pages: Vec<Page>,
    pub extension: String,
}

/// Lower-cased text after the last `.` of a file name.
pub fn file_extension(file_name: &str) -> String {
    file_name.rsplit('.').next().unwrap_or_default().to_lowercase()
}

/// Render a file's bytes into pages.
///
/// PDF files yield one page per PDF page. Any other accepted extension is read
/// as UTF-8 text and yields a single page of lines.
pub fn parse_file(file_name: &str, bytes: &[u8], config: &DocumentConfig) -> Result<ParsedFile> {
    let extension = file_extension(file_name);
    if !config.accepts(&extension) {
        return Err(DocumentError::UnsupportedExtension {
            file_name: file_name.to_string(),
            extension,
            accepted: config.accepted_extensions.clone(),
        }
        .into());
    }

    let pages = if extension == "pdf" {
        render_pages(bytes)?
    } else {
        text_pages(bytes)?
    };

    debug!("Rendered {} into {} pages", file_name, pages.len());
    Ok(ParsedFile { pages, extension })
}

fn text_pages(bytes: &[u8]) -> std::result::Result<Vec<Page>, ParserError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| ParserError::InvalidContent(format!("expected UTF-8 text: {e}")))?;
    let text = text.trim_start_matches('\u{feff}');

    let lines: Page = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    Ok(if lines.is_empty() { Vec::new() } else { vec![lines] })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("Abrechnung.PDF"), "pdf");
        assert_eq!(file_extension("export.2021.csv"), "csv");
        assert_eq!(file_extension("README"), "readme");
    }

    #[test]
    fn test_parse_text_file() {
        let bytes = "\u{feff}date;isin\r\n05.01.2021;US0378331005\r\n\r\n".as_bytes();
        let parsed = parse_file("export.csv", bytes, &DocumentConfig::default()).unwrap();
        assert_eq!(parsed.extension, "csv");
        assert_eq!(parsed.pages, vec![vec!["date;isin", "05.01.2021;US0378331005"]]);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = parse_file("scan.jpg", b"", &DocumentConfig::default()).unwrap_err();
        assert_eq!(err.status().code(), 4);
        assert!(err.to_string().contains("[pdf,csv]"));
    }

    #[test]
    fn test_invalid_utf8() {
        let err = parse_file("export.csv", &[0xff, 0xfe, 0x00], &DocumentConfig::default()).unwrap_err();
        assert_eq!(err.status().code(), 3);
    }

    #[test]
    fn test_broken_pdf() {
        let err = parse_file("statement.pdf", b"garbage", &DocumentConfig::default()).unwrap_err();
        assert_eq!(err.status().code(), 3);
    }
}
