//! Common regex patterns for token shapes.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Security identifiers
    /// ISO 6166 shape: country, nine alphanumerics, check digit (not verified).
    pub static ref ISIN: Regex = Regex::new(r"^[A-Z]{2}[0-9A-Z]{9}[0-9]$").unwrap();

    pub static ref WKN: Regex = Regex::new(r"^[A-Z0-9]{6}$").unwrap();

    pub static ref CURRENCY: Regex = Regex::new(r"^[A-Z]{3}$").unwrap();

    // Dates and times
    pub static ref DATE_GERMAN: Regex = Regex::new(r"^\d{2}\.\d{2}\.\d{4}$").unwrap();

    pub static ref DATE_ISO: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();

    pub static ref TIME_HMS: Regex = Regex::new(r"^(?:[01]\d|2[0-3]):[0-5]\d:[0-5]\d$").unwrap();

    /// Loose check deciding whether a token carries a time at all.
    pub static ref TIME_SHAPED: Regex = Regex::new(r"[0-2][0-9]:[0-9]{2}(?::[0-9]{2})?").unwrap();

    // Numbers, after locale normalization
    pub static ref DECIMAL: Regex = Regex::new(r"^-?\d+(?:\.\d+)?$").unwrap();
}
