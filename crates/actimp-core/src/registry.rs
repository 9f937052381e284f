//! Handler registry and dispatcher.

use std::path::Path;

use lazy_static::lazy_static;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::document::parse_file;
use crate::error::{ActivityValidationError, DocumentError, Result};
use crate::handler::delimited::rows_from_page;
use crate::handler::{builtin_handlers, Handler};
use crate::models::activity::{Activity, Page, ParserStatus};
use crate::models::config::{DocumentConfig, ImporterConfig};

lazy_static! {
    static ref DEFAULT_REGISTRY: Registry = Registry::builtin();
}

/// Outcome of importing one file, as handed to the consumer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportReport {
    pub file: String,
    pub activities: Vec<Activity>,
    pub status: ParserStatus,
    pub successful: bool,
}

impl ImportReport {
    fn failed(file: &str, status: ParserStatus) -> Self {
        Self {
            file: file.to_string(),
            activities: Vec::new(),
            status,
            successful: false,
        }
    }
}

/// The set of handlers a document is dispatched to.
pub struct Registry {
    handlers: Vec<Box<dyn Handler>>,
    document: DocumentConfig,
}

impl Registry {
    /// Registry with every bundled handler and default document settings.
    pub fn builtin() -> Self {
        Self::from_config(&ImporterConfig::default())
    }

    /// Registry with every bundled handler, applying the document settings of `config`.
    pub fn from_config(config: &ImporterConfig) -> Self {
        Self {
            handlers: builtin_handlers(),
            document: config.document.clone(),
        }
    }

    /// Registry with a custom handler set.
    pub fn with_handlers(handlers: Vec<Box<dyn Handler>>) -> Self {
        Self {
            handlers,
            document: DocumentConfig::default(),
        }
    }

    pub fn handlers(&self) -> &[Box<dyn Handler>] {
        &self.handlers
    }

    pub fn document_config(&self) -> &DocumentConfig {
        &self.document
    }

    /// Select the single handler that recognizes the first page.
    ///
    /// Handlers see the extension in lower case.
    pub fn find_implementation(&self, pages: &[Page], file_name: &str, extension: &str) -> Result<&dyn Handler> {
        let first = &pages[..pages.len().min(1)];
        let extension = extension.to_ascii_lowercase();

        let matches: Vec<&dyn Handler> = self
            .handlers
            .iter()
            .map(|h| &**h)
            .filter(|h| {
                let accepted = h.can_parse_document(first, &extension);
                debug!("Detect {} -> {}", h.name(), accepted);
                accepted
            })
            .collect();

        match matches.as_slice() {
            [] => Err(DocumentError::UnknownImplementation {
                file_name: file_name.to_string(),
            }
            .into()),
            [handler] => {
                info!("Selected handler {} for {}", handler.name(), file_name);
                Ok(*handler)
            }
            _ => Err(DocumentError::AmbiguousImplementation {
                file_name: file_name.to_string(),
                handlers: matches.iter().map(|h| h.name()).collect(),
            }
            .into()),
        }
    }

    /// Dispatch the document and return its validated activities.
    pub fn parse_activities_from_pages(
        &self,
        pages: &[Page],
        file_name: &str,
        extension: &str,
    ) -> Result<Vec<Activity>> {
        let extension = extension.to_ascii_lowercase();
        if pages.is_empty() {
            return Err(DocumentError::EmptyDocument {
                file_name: file_name.to_string(),
            }
            .into());
        }

        if !self.document.accepts(&extension) {
            return Err(DocumentError::UnsupportedExtension {
                file_name: file_name.to_string(),
                extension: extension.clone(),
                accepted: self.document.accepted_extensions.clone(),
            }
            .into());
        }

        let handler = self.find_implementation(pages, file_name, &extension)?;

        // Delimited text arrives as one page of lines and is handed over as rows.
        let result = if extension == "pdf" {
            handler.parse_pages(pages)
        } else {
            rows_from_page(&pages[0], self.document.delimiter_byte())
                .map_err(Into::into)
                .and_then(|rows| handler.parse_pages(&rows))
        };

        let result = result.inspect_err(|e| error!("{} failed on {}: {}", handler.name(), file_name, e))?;

        if result.activities.is_empty() {
            return Err(ActivityValidationError::NoActivities.into());
        }

        info!("Extracted {} activities from {}", result.activities.len(), file_name);
        Ok(result.activities)
    }

    /// Import already rendered pages, folding any failure into the report.
    pub fn import_pages(&self, pages: &[Page], file_name: &str, extension: &str) -> ImportReport {
        match self.parse_activities_from_pages(pages, file_name, extension) {
            Ok(activities) => ImportReport {
                file: file_name.to_string(),
                activities,
                status: ParserStatus::Success,
                successful: true,
            },
            Err(e) => {
                error!("Import of {} failed: {}", file_name, e);
                ImportReport::failed(file_name, e.status())
            }
        }
    }

    /// Read, render and import a file.
    pub fn import_file(&self, path: &Path) -> ImportReport {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let parsed = std::fs::read(path)
            .map_err(Into::into)
            .and_then(|bytes| parse_file(&file_name, &bytes, &self.document));

        match parsed {
            Ok(parsed) => self.import_pages(&parsed.pages, &file_name, &parsed.extension),
            Err(e) => {
                error!("Reading {} failed: {}", file_name, e);
                ImportReport::failed(&file_name, e.status())
            }
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// [`Registry::find_implementation`] over the bundled handlers.
pub fn find_implementation(pages: &[Page], file_name: &str, extension: &str) -> Result<&'static dyn Handler> {
    DEFAULT_REGISTRY.find_implementation(pages, file_name, extension)
}

/// [`Registry::parse_activities_from_pages`] over the bundled handlers.
pub fn parse_activities_from_pages(pages: &[Page], file_name: &str, extension: &str) -> Result<Vec<Activity>> {
    DEFAULT_REGISTRY.parse_activities_from_pages(pages, file_name, extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::activity::ParserResult;
    use pretty_assertions::assert_eq;

    /// Detection-only handler accepting pages that contain `marker`.
    struct Marker {
        name: &'static str,
        marker: &'static str,
    }

    impl Handler for Marker {
        fn name(&self) -> &'static str {
            self.name
        }

        fn can_parse_document(&self, pages: &[Page], _extension: &str) -> bool {
            pages.first().is_some_and(|p| p.iter().any(|l| l == self.marker))
        }

        fn parse_pages(&self, _pages: &[Page]) -> Result<ParserResult> {
            Ok(ParserResult::from_activities(Vec::new()))
        }
    }

    fn page(lines: &[&str]) -> Page {
        lines.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_detection_sees_first_page_only() {
        let registry = Registry::with_handlers(vec![Box::new(Marker {
            name: "marker",
            marker: "X",
        })]);
        let pages = vec![page(&["a"]), page(&["X"])];
        let err = registry.find_implementation(&pages, "a.pdf", "pdf").err().unwrap();
        assert_eq!(err.status(), ParserStatus::UnknownImplementation);
    }

    #[test]
    fn test_ambiguity_names_handlers() {
        let registry = Registry::with_handlers(vec![
            Box::new(Marker { name: "one", marker: "X" }),
            Box::new(Marker { name: "two", marker: "X" }),
        ]);
        let err = registry.find_implementation(&[page(&["X"])], "a.pdf", "pdf").err().unwrap();
        assert_eq!(err.status(), ParserStatus::AmbiguousImplementation);
        assert!(err.to_string().contains("one, two"));
    }

    #[test]
    fn test_empty_result_is_no_activities() {
        let registry = Registry::with_handlers(vec![Box::new(Marker { name: "m", marker: "X" })]);
        let err = registry
            .parse_activities_from_pages(&[page(&["X"])], "a.pdf", "pdf")
            .unwrap_err();
        assert_eq!(err.status(), ParserStatus::NoActivities);
    }

    #[test]
    fn test_unaccepted_extension() {
        let registry = Registry::with_handlers(vec![Box::new(Marker { name: "m", marker: "X" })]);
        let report = registry.import_pages(&[page(&["X"])], "a.txt", "txt");
        assert_eq!(report.status, ParserStatus::UnsupportedFileType);
        assert!(!report.successful);
        assert!(report.activities.is_empty());
    }

    #[test]
    fn test_builtin_registry() {
        let registry = Registry::default();
        let names: Vec<&str> = registry.handlers().iter().map(|h| h.name()).collect();
        assert_eq!(names, vec!["sbroker", "quirion", "generic_csv"]);
        assert_eq!(registry.document_config().delimiter, ';');
    }

    #[test]
    fn test_import_missing_file() {
        let report = Registry::builtin().import_file(Path::new("/nonexistent/statement.pdf"));
        assert_eq!(report.file, "statement.pdf");
        assert_eq!(report.status, ParserStatus::FatalError);
    }
}
