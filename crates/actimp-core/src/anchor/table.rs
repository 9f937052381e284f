//! Declarative field tables: landmark, relative offset and value kind per field.

use std::collections::HashMap;

use rust_decimal::Decimal;
use tracing::trace;

use super::{find_first_index_matching, offset_index};
use crate::error::ParserError;
use crate::normalize::{parse_german_decimal, parse_text};

/// How a field's landmark fragment is recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Landmark {
    /// Fragment equals the term.
    Exact(&'static str),
    /// Fragment contains the term.
    Contains(&'static str),
}

impl Landmark {
    fn locate<S: AsRef<str>>(&self, content: &[S], from: usize) -> Option<usize> {
        match self {
            Landmark::Exact(term) => find_first_index_matching(content, from, |l| l == *term),
            Landmark::Contains(term) => find_first_index_matching(content, from, |l| l.contains(term)),
        }
    }

    fn describe(&self) -> String {
        match self {
            Landmark::Exact(term) | Landmark::Contains(term) => term.to_string(),
        }
    }
}

/// Normalizer applied to the fragment a rule points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    GermanDecimal,
    /// German decimal taken from the n-th whitespace-separated word.
    /// A fragment with fewer words yields no value.
    GermanDecimalWord(usize),
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub name: &'static str,
    pub landmark: Landmark,
    pub offset: isize,
    pub kind: ValueKind,
    /// Missing landmark or out-of-range offset is an error instead of an absent value.
    pub required: bool,
}

impl FieldRule {
    pub const fn required(name: &'static str, landmark: Landmark, offset: isize, kind: ValueKind) -> Self {
        Self {
            name,
            landmark,
            offset,
            kind,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, landmark: Landmark, offset: isize, kind: ValueKind) -> Self {
        Self {
            name,
            landmark,
            offset,
            kind,
            required: false,
        }
    }

    fn parse(&self, token: &str) -> Result<Option<FieldValue>, ParserError> {
        let value = match self.kind {
            ValueKind::GermanDecimal => parse_german_decimal(token)?.map(FieldValue::Decimal),
            ValueKind::GermanDecimalWord(n) => match token.split_whitespace().nth(n) {
                Some(word) => parse_german_decimal(word)?.map(FieldValue::Decimal),
                None => None,
            },
            ValueKind::Text => parse_text(token).map(FieldValue::Text),
        };
        Ok(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Decimal(Decimal),
    Text(String),
}

/// Values read by an [`OffsetTable`], keyed by rule name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValues(HashMap<&'static str, FieldValue>);

impl FieldValues {
    pub fn decimal(&self, name: &str) -> Option<Decimal> {
        match self.0.get(name) {
            Some(FieldValue::Decimal(d)) => Some(*d),
            _ => None,
        }
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.0.get(name) {
            Some(FieldValue::Text(t)) => Some(t.as_str()),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// An ordered set of field rules evaluated against one fragment sequence.
#[derive(Debug, Clone, Copy)]
pub struct OffsetTable(pub &'static [FieldRule]);

impl OffsetTable {
    /// Evaluate every rule, searching landmarks at or after `from`.
    pub fn read<S: AsRef<str>>(&self, content: &[S], from: usize) -> Result<FieldValues, ParserError> {
        let mut values = HashMap::with_capacity(self.0.len());

        for rule in self.0 {
            let Some(base) = rule.landmark.locate(content, from) else {
                if rule.required {
                    return Err(ParserError::MissingLandmark {
                        landmark: rule.landmark.describe(),
                    });
                }
                trace!("Optional field {} has no landmark", rule.name);
                continue;
            };

            let Some(idx) = offset_index(content, base, rule.offset) else {
                if rule.required {
                    return Err(ParserError::OffsetOutOfRange {
                        landmark: rule.landmark.describe(),
                        index: base,
                        offset: rule.offset,
                    });
                }
                continue;
            };

            if let Some(value) = rule.parse(content[idx].as_ref())? {
                values.insert(rule.name, value);
            }
        }

        Ok(FieldValues(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    const TABLE: OffsetTable = OffsetTable(&[
        FieldRule::required("isin", Landmark::Exact("ISIN"), -1, ValueKind::Text),
        FieldRule::required("wkn", Landmark::Exact("WKN"), -1, ValueKind::Text),
        FieldRule::required("shares", Landmark::Contains("Stück"), -1, ValueKind::GermanDecimalWord(0)),
        FieldRule::optional("fee", Landmark::Exact("Provision"), 1, ValueKind::GermanDecimal),
        FieldRule::optional("tail", Landmark::Exact("Ende"), 1, ValueKind::Text),
    ]);

    fn content() -> Vec<&'static str> {
        vec!["Kopf", "US0378331005", "ISIN", "865985", "WKN", "12,5 Stk.", "Nominal/Stück", "Ende"]
    }

    #[test]
    fn test_read_values() {
        let values = TABLE.read(&content(), 0).unwrap();
        assert_eq!(values.text("isin"), Some("US0378331005"));
        assert_eq!(values.text("wkn"), Some("865985"));
        assert_eq!(values.decimal("shares"), Some(Decimal::from_str("12.5").unwrap()));
        assert_eq!(values.decimal("fee"), None);
        assert_eq!(values.text("tail"), None);
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn test_missing_required_landmark() {
        let err = TABLE.read(&content(), 3).unwrap_err();
        assert!(matches!(err, ParserError::MissingLandmark { ref landmark } if landmark == "ISIN"));
    }

    #[test]
    fn test_missing_word_yields_no_value() {
        const PRICE: OffsetTable = OffsetTable(&[FieldRule::optional(
            "price",
            Landmark::Contains("pro Anteil"),
            0,
            ValueKind::GermanDecimalWord(3),
        )]);

        let values = PRICE.read(&["EUR 0,2688 pro Anteil"], 0).unwrap();
        assert_eq!(values.decimal("price"), None);
        assert!(values.is_empty());
    }

    #[test]
    fn test_malformed_value_is_an_error() {
        let mut lines = content();
        lines[5] = "viele Stk.";
        assert!(matches!(
            TABLE.read(&lines, 0),
            Err(ParserError::InvalidDecimal { ref input }) if input == "viele"
        ));
    }
}
