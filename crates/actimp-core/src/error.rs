//! Error types for the actimp-core library.

use thiserror::Error;

use crate::models::activity::{ActivityField, ParserStatus};

/// Main error type for the actimp library.
#[derive(Error, Debug)]
pub enum ImportError {
    /// Dispatch-time error (no/ambiguous handler, unsupported extension, ignored document).
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// A token did not have the shape its normalizer or anchor requires.
    #[error(transparent)]
    Parser(#[from] ParserError),

    /// A parsed candidate broke an activity invariant.
    #[error(transparent)]
    Validation(#[from] ActivityValidationError),

    /// The PDF collaborator could not render the document.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ImportError {
    /// Stable status code callers branch on.
    pub fn status(&self) -> ParserStatus {
        match self {
            ImportError::Document(e) => e.status(),
            ImportError::Parser(_) | ImportError::Pdf(_) | ImportError::Io(_) => ParserStatus::FatalError,
            ImportError::Validation(e) => e.status(),
        }
    }
}

/// Errors raised while deciding whether and how a document can be parsed.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The page list was empty.
    #[error("invalid document, document is empty\nFile: {file_name}")]
    EmptyDocument { file_name: String },

    /// No registered handler accepted the document.
    #[error("invalid document, failed to find parser implementation for document\nFile: {file_name}")]
    UnknownImplementation { file_name: String },

    /// More than one handler accepted the document.
    #[error("invalid document, found multiple parser implementations for document ({})\nFile: {file_name}", handlers.join(", "))]
    AmbiguousImplementation {
        file_name: String,
        handlers: Vec<&'static str>,
    },

    /// The file extension is not accepted.
    #[error("invalid document, unsupported file type '{extension}', extension must be one of [{}]\nFile: {file_name}", accepted.join(","))]
    UnsupportedExtension {
        file_name: String,
        extension: String,
        accepted: Vec<String>,
    },

    /// The document is recognized but deliberately not supported.
    #[error("unsupported document: {reason}")]
    Unsupported { reason: String },
}

impl DocumentError {
    pub fn status(&self) -> ParserStatus {
        match self {
            DocumentError::EmptyDocument { .. } | DocumentError::UnknownImplementation { .. } => {
                ParserStatus::UnknownImplementation
            }
            DocumentError::AmbiguousImplementation { .. } => ParserStatus::AmbiguousImplementation,
            DocumentError::UnsupportedExtension { .. } => ParserStatus::UnsupportedFileType,
            DocumentError::Unsupported { .. } => ParserStatus::InvalidDocument,
        }
    }
}

/// Errors raised when a token does not match its required shape.
#[derive(Error, Debug)]
pub enum ParserError {
    #[error("invalid decimal, value must be numeric\nInput: {input}")]
    InvalidDecimal { input: String },

    #[error("invalid date, value must be of format dd.MM.yyyy or yyyy-MM-dd\nInput: {input}")]
    InvalidDate { input: String },

    #[error("invalid time, value must be of format HH:mm:ss\nInput: {input}")]
    InvalidTime { input: String },

    #[error("invalid datetime, value does not match '{format}'\nInput: {input}")]
    InvalidDateTime { input: String, format: String },

    #[error("invalid currency, value must be exactly three capitalized letters\nInput: {input}")]
    InvalidCurrency { input: String },

    /// A required landmark was not found in the content.
    #[error("landmark '{landmark}' not found")]
    MissingLandmark { landmark: String },

    /// A landmark was found but the relative offset points outside the content.
    #[error("offset {offset} from landmark '{landmark}' at index {index} is out of range")]
    OffsetOutOfRange {
        landmark: String,
        index: usize,
        offset: isize,
    },

    /// Arithmetic on extracted values left the decimal range.
    #[error("value of '{field}' is out of range")]
    Overflow { field: &'static str },

    /// Delimited text had no header row.
    #[error("could not extract headers from delimited text")]
    MissingHeader,

    /// Delimited text could not be split into rows.
    #[error("malformed delimited text: {0}")]
    Delimited(#[from] csv::Error),

    /// File content could not be decoded as text.
    #[error("invalid file content: {0}")]
    InvalidContent(String),
}

/// Errors raised after successful parsing.
#[derive(Error, Debug)]
pub enum ActivityValidationError {
    /// A candidate activity broke an invariant.
    #[error("invalid '{field}': {reason}\nActivity: {activity}")]
    InvalidField {
        field: ActivityField,
        reason: String,
        /// Serialized candidate that failed.
        activity: String,
    },

    /// A recognized document produced no activities.
    #[error("empty document, no activities found in parsable document")]
    NoActivities,
}

impl ActivityValidationError {
    pub fn status(&self) -> ParserStatus {
        match self {
            ActivityValidationError::InvalidField { .. } => ParserStatus::InvalidActivity,
            ActivityValidationError::NoActivities => ParserStatus::NoActivities,
        }
    }

    /// Field that failed, if the error refers to one.
    pub fn field(&self) -> Option<ActivityField> {
        match self {
            ActivityValidationError::InvalidField { field, .. } => Some(*field),
            ActivityValidationError::NoActivities => None,
        }
    }
}

/// Errors related to rendering PDF bytes into pages.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from a page.
    #[error("failed to extract text from page {page}: {reason}")]
    TextExtraction { page: u32, reason: String },

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF has no pages.
    #[error("PDF has no pages")]
    NoPages,
}

/// Result type for the actimp library.
pub type Result<T> = std::result::Result<T, ImportError>;
