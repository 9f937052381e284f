//! Configuration structures for the import pipeline.

use serde::{Deserialize, Serialize};

/// Main configuration for the actimp pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImporterConfig {
    /// Document intake configuration.
    pub document: DocumentConfig,

    /// Output configuration.
    pub output: OutputConfig,
}

/// Document intake configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// File extensions accepted for import (lower case, without dot).
    pub accepted_extensions: Vec<String>,

    /// Column delimiter of delimited-text documents.
    pub delimiter: char,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            accepted_extensions: vec!["pdf".to_string(), "csv".to_string()],
            delimiter: ';',
        }
    }
}

impl DocumentConfig {
    /// Delimiter as a single byte, falling back to `;` for non-ASCII characters.
    pub fn delimiter_byte(&self) -> u8 {
        if self.delimiter.is_ascii() {
            self.delimiter as u8
        } else {
            b';'
        }
    }

    /// Whether an extension is accepted for import.
    pub fn accepts(&self, extension: &str) -> bool {
        self.accepted_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(extension))
    }
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format (json, csv, text).
    pub format: String,

    /// Pretty-print JSON output.
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
            pretty: false,
        }
    }
}

impl ImporterConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Whether an extension is accepted for import.
    pub fn accepts(&self, extension: &str) -> bool {
        self.document.accepts(extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ImporterConfig::default();
        assert!(config.accepts("pdf"));
        assert!(config.accepts("CSV"));
        assert!(!config.accepts("xlsx"));
        assert_eq!(config.document.delimiter_byte(), b';');
        assert_eq!(config.output.format, "json");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ImporterConfig =
            serde_json::from_str(r#"{ "document": { "delimiter": "," } }"#).unwrap();
        assert_eq!(config.document.delimiter_byte(), b',');
        assert_eq!(config.document.accepted_extensions, vec!["pdf", "csv"]);
        assert!(!config.output.pretty);
    }
}
