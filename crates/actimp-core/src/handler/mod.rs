//! Document format handlers.
//!
//! A handler recognizes one provider's document layout and turns its pages
//! into validated activities.

pub mod delimited;
pub mod generic_csv;
pub mod quirion;
pub mod sbroker;

pub use generic_csv::GenericCsvHandler;
pub use quirion::QuirionHandler;
pub use sbroker::SBrokerHandler;

use rust_decimal::Decimal;

use crate::error::Result;
use crate::models::activity::{Page, ParserResult};

/// Capability interface every document format implements.
pub trait Handler: Send + Sync {
    /// Stable handler name, used in logs and ambiguity reports.
    fn name(&self) -> &'static str;

    /// Cheap textual detection. Only the first page is inspected.
    fn can_parse_document(&self, pages: &[Page], extension: &str) -> bool;

    /// Extract and validate all activities of the document.
    ///
    /// For delimited text the pages are rows, with the header row first.
    fn parse_pages(&self, pages: &[Page]) -> Result<ParserResult>;

    /// Whether the handler expects already linearized text.
    fn parsing_is_text_based(&self) -> bool {
        true
    }
}

/// Every handler shipped with the crate.
pub fn builtin_handlers() -> Vec<Box<dyn Handler>> {
    vec![
        Box::new(SBrokerHandler),
        Box::new(QuirionHandler),
        Box::new(GenericCsvHandler),
    ]
}

/// Price per share. Zero shares yield a zero price and are rejected by validation.
pub(crate) fn unit_price(amount: Decimal, shares: Decimal) -> Decimal {
    amount.checked_div(shares).unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_builtin_handler_names_are_unique() {
        let handlers = builtin_handlers();
        let names: HashSet<&str> = handlers.iter().map(|h| h.name()).collect();
        assert_eq!(names.len(), handlers.len());
    }

    #[test]
    fn test_unit_price() {
        assert_eq!(unit_price(Decimal::new(98670, 2), Decimal::new(33, 0)), Decimal::new(299, 1));
        assert_eq!(unit_price(Decimal::ONE, Decimal::ZERO), Decimal::ZERO);
    }
}
