//! Text, currency and identifier normalizers.

use super::patterns::{CURRENCY, ISIN, WKN};
use crate::error::ParserError;

/// Trim a token; empty tokens become `None`.
pub fn parse_text(token: &str) -> Option<String> {
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Parse a three-letter uppercase currency code.
pub fn parse_currency(token: &str) -> Result<Option<String>, ParserError> {
    let token = token.trim();
    if token.is_empty() {
        return Ok(None);
    }

    if CURRENCY.is_match(token) {
        Ok(Some(token.to_string()))
    } else {
        Err(ParserError::InvalidCurrency {
            input: token.to_string(),
        })
    }
}

/// Remove `(`, `)`, `{` and `}` from a token, e.g. `(916018)` -> `916018`.
pub fn strip_brackets(token: &str) -> String {
    token
        .chars()
        .filter(|c| !matches!(c, '(' | ')' | '{' | '}'))
        .collect::<String>()
        .trim()
        .to_string()
}

pub fn is_isin(token: &str) -> bool {
    ISIN.is_match(token)
}

pub fn is_wkn(token: &str) -> bool {
    WKN.is_match(token)
}
