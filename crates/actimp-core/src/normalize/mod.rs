//! Locale-aware value normalizers.
//!
//! Every normalizer takes a raw token, returns `Ok(None)` when the token is
//! empty, and fails with a [`ParserError`](crate::error::ParserError) naming
//! the token when it is non-empty but malformed. Callers apply their own
//! defaults with `unwrap_or`.

pub mod dates;
pub mod numbers;
pub mod patterns;
pub mod text;

pub use dates::{format_german_date, parse_date, parse_iso_datetime, parse_time};
pub use numbers::{
    format_german_decimal, parse_german_decimal, parse_plain_decimal, parse_stripped_decimal,
};
pub use patterns::*;
pub use text::{is_isin, is_wkn, parse_currency, parse_text, strip_brackets};
