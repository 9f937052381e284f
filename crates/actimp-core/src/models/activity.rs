//! Activity data models shared by every handler.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};

/// One rendered PDF page or one delimited-text row, as ordered trimmed fragments.
pub type Page = Vec<String>;

/// Kind of transaction an activity describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityType {
    Buy,
    Sell,
    Dividend,
    TransferIn,
    TransferOut,
    /// Emitted by extended handlers only; not accepted by the shared validator.
    Payback,
    /// Emitted by extended handlers only; not accepted by the shared validator.
    TaxDividend,
    /// Unrecognized label, kept so the validator can report it.
    #[serde(untagged)]
    Other(String),
}

impl ActivityType {
    /// Types the shared validator accepts.
    pub const VALIDATED: [ActivityType; 5] = [
        ActivityType::Buy,
        ActivityType::Sell,
        ActivityType::Dividend,
        ActivityType::TransferIn,
        ActivityType::TransferOut,
    ];

    /// Parse an activity type label. Unknown labels become `Other`.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "Buy" => ActivityType::Buy,
            "Sell" => ActivityType::Sell,
            "Dividend" => ActivityType::Dividend,
            "TransferIn" => ActivityType::TransferIn,
            "TransferOut" => ActivityType::TransferOut,
            "Payback" => ActivityType::Payback,
            "TaxDividend" => ActivityType::TaxDividend,
            other => ActivityType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ActivityType::Buy => "Buy",
            ActivityType::Sell => "Sell",
            ActivityType::Dividend => "Dividend",
            ActivityType::TransferIn => "TransferIn",
            ActivityType::TransferOut => "TransferOut",
            ActivityType::Payback => "Payback",
            ActivityType::TaxDividend => "TaxDividend",
            ActivityType::Other(label) => label,
        }
    }

    /// Whether the type belongs to the validated closed set.
    pub fn is_validated(&self) -> bool {
        Self::VALIDATED.contains(self)
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Activity field names, as reported by validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityField {
    Broker,
    Type,
    Date,
    Datetime,
    /// The isin/wkn/holding/company disjunction.
    Security,
    Isin,
    Wkn,
    Holding,
    Company,
    Shares,
    Price,
    Amount,
    Fee,
    Tax,
    Currency,
    ForeignCurrency,
    FxRate,
}

impl ActivityField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityField::Broker => "broker",
            ActivityField::Type => "type",
            ActivityField::Date => "date",
            ActivityField::Datetime => "datetime",
            ActivityField::Security => "isin/wkn/holding",
            ActivityField::Isin => "isin",
            ActivityField::Wkn => "wkn",
            ActivityField::Holding => "holding",
            ActivityField::Company => "company",
            ActivityField::Shares => "shares",
            ActivityField::Price => "price",
            ActivityField::Amount => "amount",
            ActivityField::Fee => "fee",
            ActivityField::Tax => "tax",
            ActivityField::Currency => "currency",
            ActivityField::ForeignCurrency => "foreignCurrency",
            ActivityField::FxRate => "fxRate",
        }
    }
}

impl fmt::Display for ActivityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated, immutable activity record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// Identifier of the issuing format/handler.
    pub broker: String,

    #[serde(rename = "type")]
    pub activity_type: ActivityType,

    /// Zone-local calendar date.
    pub date: NaiveDate,

    /// Absolute instant in UTC.
    #[serde(with = "utc_millis")]
    pub datetime: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub isin: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub wkn: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub holding: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,

    pub shares: Decimal,
    pub price: Decimal,

    /// Gross cash value, sign handled by the caller.
    pub amount: Decimal,

    pub fee: Decimal,
    pub tax: Decimal,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreign_currency: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fx_rate: Option<Decimal>,
}

/// A candidate activity as assembled by a handler, before validation.
///
/// Every field is optional so the validator can report exactly which one is
/// missing. Handlers set explicit defaults (`fee: 0`, `tax: 0`) themselves.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityCandidate {
    pub broker: Option<String>,
    #[serde(rename = "type")]
    pub activity_type: Option<ActivityType>,
    pub date: Option<NaiveDate>,
    #[serde(serialize_with = "utc_millis::option::serialize")]
    pub datetime: Option<DateTime<Utc>>,
    pub isin: Option<String>,
    pub wkn: Option<String>,
    pub holding: Option<String>,
    pub company: Option<String>,
    pub shares: Option<Decimal>,
    pub price: Option<Decimal>,
    pub amount: Option<Decimal>,
    pub fee: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub currency: Option<String>,
    pub foreign_currency: Option<String>,
    pub fx_rate: Option<Decimal>,
}

impl ActivityCandidate {
    /// Start a candidate for the given broker and type.
    pub fn new(broker: impl Into<String>, activity_type: ActivityType) -> Self {
        Self {
            broker: Some(broker.into()),
            activity_type: Some(activity_type),
            ..Self::default()
        }
    }

    /// Set both the calendar date and the instant.
    pub fn with_datetime(mut self, date: NaiveDate, datetime: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self.datetime = Some(datetime);
        self
    }

    /// Serialize for error reports.
    pub fn to_report(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("<unserializable: {e}>"))
    }
}

impl From<Activity> for ActivityCandidate {
    fn from(a: Activity) -> Self {
        Self {
            broker: Some(a.broker),
            activity_type: Some(a.activity_type),
            date: Some(a.date),
            datetime: Some(a.datetime),
            isin: a.isin,
            wkn: a.wkn,
            holding: a.holding,
            company: a.company,
            shares: Some(a.shares),
            price: Some(a.price),
            amount: Some(a.amount),
            fee: Some(a.fee),
            tax: Some(a.tax),
            currency: a.currency,
            foreign_currency: a.foreign_currency,
            fx_rate: a.fx_rate,
        }
    }
}

/// Stable status codes returned alongside results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ParserStatus {
    Success = 0,
    UnknownImplementation = 1,
    AmbiguousImplementation = 2,
    FatalError = 3,
    UnsupportedFileType = 4,
    NoActivities = 5,
    InvalidActivity = 6,
    InvalidDocument = 7,
}

impl ParserStatus {
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Short human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            ParserStatus::Success => "success",
            ParserStatus::UnknownImplementation => "unknown implementation",
            ParserStatus::AmbiguousImplementation => "ambiguous implementation",
            ParserStatus::FatalError => "fatal error",
            ParserStatus::UnsupportedFileType => "unsupported file type",
            ParserStatus::NoActivities => "no activities",
            ParserStatus::InvalidActivity => "invalid activity",
            ParserStatus::InvalidDocument => "invalid document",
        }
    }
}

impl Serialize for ParserStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

/// Return contract of a handler's extraction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParserResult {
    pub activities: Vec<Activity>,
    pub status: ParserStatus,
}

impl ParserResult {
    /// Success when activities were found, `NoActivities` otherwise.
    pub fn from_activities(activities: Vec<Activity>) -> Self {
        let status = if activities.is_empty() {
            ParserStatus::NoActivities
        } else {
            ParserStatus::Success
        };
        Self { activities, status }
    }
}

/// Serde helpers writing instants as `2021-11-30T09:27:32.000Z`.
pub(crate) mod utc_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::Serializer;

        pub fn serialize<S: Serializer>(
            dt: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match dt {
                Some(dt) => super::serialize(dt, serializer),
                None => serializer.serialize_none(),
            }
        }
    }
}
