//! Decimal parsing for the supported locale conventions.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::patterns::DECIMAL;
use crate::error::ParserError;

/// Parse a comma-decimal token (`1.234,56`): `.` groups thousands, `,` separates decimals.
pub fn parse_german_decimal(token: &str) -> Result<Option<Decimal>, ParserError> {
    let token = token.trim();
    if token.is_empty() {
        return Ok(None);
    }

    let normalized = token.replace('.', "").replace(',', ".");
    to_decimal(&normalized, token).map(Some)
}

/// Parse a token after dropping every character that is not a digit, `-` or `.`.
///
/// Used by providers that print `CHF 1'234.50` style amounts.
pub fn parse_stripped_decimal(token: &str) -> Result<Option<Decimal>, ParserError> {
    let token = token.trim();
    if token.is_empty() {
        return Ok(None);
    }

    let normalized: String = token
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '-' || *c == '.')
        .collect();
    to_decimal(&normalized, token).map(Some)
}

/// Parse a plain decimal where the separator may be written as `,` or `.` (no grouping).
pub fn parse_plain_decimal(token: &str) -> Result<Option<Decimal>, ParserError> {
    let token = token.trim();
    if token.is_empty() {
        return Ok(None);
    }

    let normalized = token.replacen(',', ".", 1);
    to_decimal(&normalized, token).map(Some)
}

fn to_decimal(normalized: &str, original: &str) -> Result<Decimal, ParserError> {
    if !DECIMAL.is_match(normalized) {
        return Err(ParserError::InvalidDecimal {
            input: original.to_string(),
        });
    }

    Decimal::from_str(normalized).map_err(|_| ParserError::InvalidDecimal {
        input: original.to_string(),
    })
}

/// Format a decimal in comma-decimal style (`1.234,56`), keeping its scale.
pub fn format_german_decimal(amount: Decimal) -> String {
    let s = amount.abs().to_string();
    let (integer_part, decimal_part) = match s.split_once('.') {
        Some((i, d)) => (i.to_string(), Some(d.to_string())),
        None => (s, None),
    };

    let chars: Vec<char> = integer_part.chars().collect();
    let mut formatted = String::new();
    if amount.is_sign_negative() && !amount.is_zero() {
        formatted.push('-');
    }
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            formatted.push('.');
        }
        formatted.push(*c);
    }

    match decimal_part {
        Some(d) => format!("{},{}", formatted, d),
        None => formatted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_german_decimal() {
        assert_eq!(parse_german_decimal("1.234,56").unwrap(), Some(dec("1234.56")));
        assert_eq!(parse_german_decimal("986,70").unwrap(), Some(dec("986.7")));
        assert_eq!(parse_german_decimal("-984,92").unwrap(), Some(dec("-984.92")));
        assert_eq!(parse_german_decimal("33").unwrap(), Some(dec("33")));
        assert_eq!(parse_german_decimal("  ").unwrap(), None);
    }

    #[test]
    fn test_parse_german_decimal_rejects_garbage() {
        let err = parse_german_decimal("12,3 EUR").unwrap_err();
        assert!(matches!(err, ParserError::InvalidDecimal { ref input } if input == "12,3 EUR"));
        assert!(parse_german_decimal("1,2,3").is_err());
        assert!(parse_german_decimal("abc").is_err());
    }

    #[test]
    fn test_parse_stripped_decimal() {
        assert_eq!(parse_stripped_decimal("CHF 1'234.50").unwrap(), Some(dec("1234.50")));
        assert_eq!(parse_stripped_decimal("-12.5 USD").unwrap(), Some(dec("-12.5")));
        assert!(parse_stripped_decimal("n/a").is_err());
        assert!(parse_stripped_decimal("1.2.3").is_err());
    }

    #[test]
    fn test_parse_plain_decimal() {
        assert_eq!(parse_plain_decimal("5.00").unwrap(), Some(dec("5")));
        assert_eq!(parse_plain_decimal("5,25").unwrap(), Some(dec("5.25")));
        assert!(parse_plain_decimal("1.000,00").is_err());
    }

    #[test]
    fn test_format_german_decimal() {
        assert_eq!(format_german_decimal(dec("1234.56")), "1.234,56");
        assert_eq!(format_german_decimal(dec("12345678.90")), "12.345.678,90");
        assert_eq!(format_german_decimal(dec("-984.92")), "-984,92");
        assert_eq!(format_german_decimal(dec("33")), "33");
    }

    #[test]
    fn test_decimal_roundtrip_both_locales() {
        for s in ["0", "0.01", "29.9", "986.70", "1234.5678", "-1000000.5", "123456789"] {
            let value = dec(s);
            assert_eq!(
                parse_german_decimal(&format_german_decimal(value)).unwrap(),
                Some(value),
                "german roundtrip of {s}"
            );
            assert_eq!(
                parse_stripped_decimal(&value.to_string()).unwrap(),
                Some(value),
                "stripped roundtrip of {s}"
            );
        }
    }
}
