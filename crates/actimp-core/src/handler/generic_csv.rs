//! Generic delimited-text import with named columns.
//!
//! Recognized columns (case-insensitive): `datetime`, `date`, `time`,
//! `price`, `shares`, `tax`, `fee`, `type`, `broker`, `holding`, `isin`,
//! `wkn`, `currency`, `fxrate`, `originalcurrency`. Other columns are ignored.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::Handler;
use crate::error::{DocumentError, ParserError, Result};
use crate::models::activity::{Activity, ActivityCandidate, ActivityType, Page, ParserResult};
use crate::normalize::{
    parse_currency, parse_date, parse_iso_datetime, parse_plain_decimal, parse_text, parse_time,
};
use crate::validate::validate_activity;

const DEFAULT_BROKER: &str = "generic_csv";
const DEFAULT_CURRENCY: &str = "EUR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Datetime,
    Date,
    Time,
    Price,
    Shares,
    Tax,
    Fee,
    Type,
    Broker,
    Holding,
    Isin,
    Wkn,
    Currency,
    FxRate,
    OriginalCurrency,
}

impl Column {
    fn from_header(header: &str) -> Option<Self> {
        let column = match header.trim().to_lowercase().as_str() {
            "datetime" => Column::Datetime,
            "date" => Column::Date,
            "time" => Column::Time,
            "price" => Column::Price,
            "shares" => Column::Shares,
            "tax" => Column::Tax,
            "fee" => Column::Fee,
            "type" => Column::Type,
            "broker" => Column::Broker,
            "holding" => Column::Holding,
            "isin" => Column::Isin,
            "wkn" => Column::Wkn,
            "currency" => Column::Currency,
            "fxrate" => Column::FxRate,
            "originalcurrency" => Column::OriginalCurrency,
            _ => return None,
        };
        Some(column)
    }
}

/// Values of one row after normalization.
#[derive(Debug, Default)]
struct Row {
    datetime: Option<DateTime<Utc>>,
    date: Option<NaiveDate>,
    time: Option<NaiveTime>,
    price: Option<Decimal>,
    shares: Option<Decimal>,
    tax: Option<Decimal>,
    fee: Option<Decimal>,
    activity_type: Option<ActivityType>,
    broker: Option<String>,
    holding: Option<String>,
    isin: Option<String>,
    wkn: Option<String>,
    currency: Option<String>,
    fx_rate: Option<Decimal>,
    original_currency: Option<String>,
}

impl Row {
    fn read(columns: &[Option<Column>], cells: &[String]) -> std::result::Result<Self, ParserError> {
        let mut row = Row::default();

        for (column, cell) in columns.iter().zip(cells) {
            let Some(column) = column else {
                continue;
            };
            match column {
                Column::Datetime => row.datetime = parse_iso_datetime(cell)?,
                Column::Date => row.date = parse_date(cell)?,
                Column::Time => row.time = parse_time(cell)?,
                Column::Price => row.price = parse_plain_decimal(cell)?,
                Column::Shares => row.shares = parse_plain_decimal(cell)?,
                Column::Tax => row.tax = parse_plain_decimal(cell)?,
                Column::Fee => row.fee = parse_plain_decimal(cell)?,
                Column::Type => row.activity_type = parse_text(cell).map(|t| ActivityType::from_label(&t)),
                Column::Broker => row.broker = parse_text(cell),
                Column::Holding => row.holding = parse_text(cell),
                Column::Isin => row.isin = parse_text(cell),
                Column::Wkn => row.wkn = parse_text(cell),
                Column::Currency => row.currency = parse_currency(cell)?,
                Column::FxRate => row.fx_rate = parse_plain_decimal(cell)?,
                Column::OriginalCurrency => row.original_currency = parse_currency(cell)?,
            }
        }

        Ok(row)
    }

    fn into_activity(self) -> Result<Activity> {
        let (date, datetime) = match (self.date, self.datetime) {
            (Some(date), Some(datetime)) => (date, datetime),
            (Some(date), None) => (date, date.and_time(self.time.unwrap_or(NaiveTime::MIN)).and_utc()),
            (None, Some(datetime)) => (datetime.date_naive(), datetime),
            (None, None) => {
                return Err(DocumentError::Unsupported {
                    reason: "one of datetime or date must be supplied".to_string(),
                }
                .into());
            }
        };

        if self.holding.is_none() && self.isin.is_none() && self.wkn.is_none() {
            return Err(DocumentError::Unsupported {
                reason: "one of holding, isin or wkn must be supplied".to_string(),
            }
            .into());
        }

        let amount = self.price.zip(self.shares).and_then(|(p, s)| p.checked_mul(s));

        let candidate = ActivityCandidate {
            broker: Some(self.broker.unwrap_or_else(|| DEFAULT_BROKER.to_string())),
            activity_type: self.activity_type,
            date: Some(date),
            datetime: Some(datetime),
            isin: self.isin,
            wkn: self.wkn,
            holding: self.holding,
            shares: self.shares,
            price: self.price,
            amount,
            fee: Some(self.fee.unwrap_or(Decimal::ZERO)),
            tax: Some(self.tax.unwrap_or(Decimal::ZERO)),
            currency: Some(self.currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string())),
            foreign_currency: self.original_currency,
            fx_rate: self.fx_rate,
            ..ActivityCandidate::default()
        };

        Ok(validate_activity(candidate, false)?)
    }
}

/// Handler for delimited text with a header row naming activity fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericCsvHandler;

impl Handler for GenericCsvHandler {
    fn name(&self) -> &'static str {
        "generic_csv"
    }

    fn can_parse_document(&self, pages: &[Page], extension: &str) -> bool {
        extension == "csv"
            && pages.iter().take(1).flatten().any(|line| {
                let l = line.to_lowercase();
                l.contains("date")
                    && l.contains("price")
                    && l.contains("shares")
                    && l.contains("tax")
                    && l.contains("fee")
                    && l.contains("type")
                    && (l.contains("holding") || l.contains("isin") || l.contains("wkn"))
            })
    }

    fn parse_pages(&self, pages: &[Page]) -> Result<ParserResult> {
        let Some((header, rows)) = pages.split_first() else {
            return Err(ParserError::MissingHeader.into());
        };

        let columns: Vec<Option<Column>> = header.iter().map(|h| Column::from_header(h)).collect();
        if columns.iter().all(Option::is_none) {
            warn!("No known columns in header: {:?}", header);
        }

        let mut activities = Vec::with_capacity(rows.len());
        for (idx, cells) in rows.iter().enumerate() {
            let activity = Row::read(&columns, cells)
                .map_err(Into::into)
                .and_then(Row::into_activity)
                .inspect_err(|e| debug!("Row {} rejected: {}", idx + 1, e))?;
            activities.push(activity);
        }

        Ok(ParserResult::from_activities(activities))
    }
}
