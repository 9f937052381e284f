//! Date and time parsing.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use super::patterns::{DATE_GERMAN, DATE_ISO, TIME_HMS};
use crate::error::ParserError;

const ISO_FORMAT: &str = "ISO 8601";

/// Parse a calendar date written as `dd.MM.yyyy` or `yyyy-MM-dd`.
pub fn parse_date(token: &str) -> Result<Option<NaiveDate>, ParserError> {
    let token = token.trim();
    if token.is_empty() {
        return Ok(None);
    }

    let format = if DATE_GERMAN.is_match(token) {
        "%d.%m.%Y"
    } else if DATE_ISO.is_match(token) {
        "%Y-%m-%d"
    } else {
        return Err(ParserError::InvalidDate {
            input: token.to_string(),
        });
    };

    NaiveDate::parse_from_str(token, format)
        .map(Some)
        .map_err(|_| ParserError::InvalidDate {
            input: token.to_string(),
        })
}

/// Parse a time of day written as `HH:mm:ss`.
pub fn parse_time(token: &str) -> Result<Option<NaiveTime>, ParserError> {
    let token = token.trim();
    if token.is_empty() {
        return Ok(None);
    }

    if !TIME_HMS.is_match(token) {
        return Err(ParserError::InvalidTime {
            input: token.to_string(),
        });
    }

    NaiveTime::parse_from_str(token, "%H:%M:%S")
        .map(Some)
        .map_err(|_| ParserError::InvalidTime {
            input: token.to_string(),
        })
}

/// Parse an ISO 8601 timestamp. Timestamps without an offset are taken as UTC.
pub fn parse_iso_datetime(token: &str) -> Result<Option<DateTime<Utc>>, ParserError> {
    let token = token.trim();
    if token.is_empty() {
        return Ok(None);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(token) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(token, format) {
            return Ok(Some(naive.and_utc()));
        }
    }

    Err(ParserError::InvalidDateTime {
        input: token.to_string(),
        format: ISO_FORMAT.to_string(),
    })
}

/// Format a date as `dd.MM.yyyy`.
pub fn format_german_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2021, 11, 30);
        assert_eq!(parse_date("30.11.2021").unwrap(), expected);
        assert_eq!(parse_date("2021-11-30").unwrap(), expected);
        assert_eq!(parse_date("").unwrap(), None);
    }

    #[test]
    fn test_parse_date_rejects_invalid() {
        assert!(parse_date("30.11.21").is_err());
        assert!(parse_date("31.02.2021").is_err());
        assert!(parse_date("2021/11/30").is_err());
        assert!(matches!(
            parse_date("Schlusstag"),
            Err(ParserError::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_parse_time() {
        let time = parse_time("10:27:32").unwrap().unwrap();
        assert_eq!((time.hour(), time.minute(), time.second()), (10, 27, 32));
        assert_eq!(parse_time(" ").unwrap(), None);
        assert!(parse_time("10:27").is_err());
        assert!(parse_time("25:00:00").is_err());
    }

    #[test]
    fn test_parse_iso_datetime() {
        let dt = parse_iso_datetime("2021-11-30T10:27:32+01:00").unwrap().unwrap();
        assert_eq!(dt.to_rfc3339(), "2021-11-30T09:27:32+00:00");

        let naive = parse_iso_datetime("2021-11-30T10:27:32").unwrap().unwrap();
        assert_eq!(naive.hour(), 10);
        assert_eq!(naive.day(), 30);

        assert!(matches!(
            parse_iso_datetime("30.11.2021 10:27"),
            Err(ParserError::InvalidDateTime { .. })
        ));
    }

    #[test]
    fn test_format_german_date_roundtrip() {
        let date = NaiveDate::from_ymd_opt(2020, 1, 5).unwrap();
        assert_eq!(format_german_date(date), "05.01.2020");
        assert_eq!(parse_date(&format_german_date(date)).unwrap(), Some(date));
    }
}
