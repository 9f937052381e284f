//! Core library for importing broker and app documents as portfolio activities.
//!
//! This crate provides:
//! - Locale-aware value normalizers (decimals, dates, times, currencies)
//! - Anchor-based extraction over rendered page fragments
//! - Activity validation
//! - Format handlers and the registry that dispatches documents to them
//! - File intake for PDF and delimited text

pub mod anchor;
pub mod document;
pub mod error;
pub mod handler;
pub mod models;
pub mod normalize;
pub mod pdf;
pub mod registry;
pub mod validate;

pub use document::{parse_file, ParsedFile};
pub use error::{
    ActivityValidationError, DocumentError, ImportError, ParserError, PdfError, Result,
};
pub use handler::{builtin_handlers, Handler};
pub use models::activity::{
    Activity, ActivityCandidate, ActivityField, ActivityType, Page, ParserResult, ParserStatus,
};
pub use models::config::ImporterConfig;
pub use registry::{find_implementation, parse_activities_from_pages, ImportReport, Registry};
pub use validate::{validate_activity, validate_cash_activity, ActivityValidator};
