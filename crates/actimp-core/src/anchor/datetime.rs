//! Composition of activity date and instant from document tokens.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::trace;

use crate::error::ParserError;
use crate::normalize::patterns::TIME_SHAPED;

/// Formats and zone used to interpret a document's date and time tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DateTimeLayout {
    /// chrono format of the date token.
    pub date_format: &'static str,
    /// chrono format of `"{date} {time}"`.
    pub datetime_format: &'static str,
    /// Zone the document's wall-clock values are written in.
    pub zone: Tz,
}

impl Default for DateTimeLayout {
    fn default() -> Self {
        Self {
            date_format: "%d.%m.%Y",
            datetime_format: "%d.%m.%Y %H:%M",
            zone: chrono_tz::Europe::Berlin,
        }
    }
}

impl DateTimeLayout {
    pub fn with_datetime_format(mut self, datetime_format: &'static str) -> Self {
        self.datetime_format = datetime_format;
        self
    }

    pub fn with_date_format(mut self, date_format: &'static str) -> Self {
        self.date_format = date_format;
        self
    }

    pub fn with_zone(mut self, zone: Tz) -> Self {
        self.zone = zone;
        self
    }
}

/// Local calendar date and UTC instant of an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityDateTime {
    pub date: NaiveDate,
    pub datetime: DateTime<Utc>,
}

/// Compose date and instant, using the current wall-clock time when `time` is missing.
pub fn compose_activity_datetime(
    date: &str,
    time: Option<&str>,
    layout: &DateTimeLayout,
) -> Result<ActivityDateTime, ParserError> {
    compose_activity_datetime_at(date, time, layout, Utc::now())
}

/// Same as [`compose_activity_datetime`] with an explicit clock.
///
/// A missing or non-time-shaped `time` is replaced by `now`'s hour and
/// minute in the layout's zone.
pub fn compose_activity_datetime_at(
    date: &str,
    time: Option<&str>,
    layout: &DateTimeLayout,
    now: DateTime<Utc>,
) -> Result<ActivityDateTime, ParserError> {
    let date = date.trim();
    let time = time.map(str::trim).filter(|t| TIME_SHAPED.is_match(t));

    let (input, format) = match time {
        Some(time) => (format!("{date} {time}"), layout.datetime_format.to_string()),
        None => {
            let local_now = now.with_timezone(&layout.zone);
            trace!("No time for {}, using current time {}", date, local_now.format("%H:%M"));
            (
                format!("{date} {}", local_now.format("%H:%M")),
                format!("{} %H:%M", layout.date_format),
            )
        }
    };

    let naive = match NaiveDateTime::parse_from_str(&input, &format) {
        Ok(naive) => naive,
        Err(_) => return Err(ParserError::InvalidDateTime { input, format }),
    };

    let local = match resolve_local(&layout.zone, naive) {
        Some(local) => local,
        None => return Err(ParserError::InvalidDateTime { input, format }),
    };

    Ok(ActivityDateTime {
        date: local.date_naive(),
        datetime: local.with_timezone(&Utc),
    })
}

/// Map a wall-clock value to an instant. Repeated hours take the earlier
/// instant; skipped hours move forward by the size of the gap.
fn resolve_local(zone: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    match zone.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => zone.from_local_datetime(&(naive + Duration::hours(1))).earliest(),
    }
}
