//! Activity validation.
//!
//! Checks run in a fixed order so the first violated invariant is the one
//! reported: presence, date bounds, numeric signs, security identity,
//! identifier shapes, type, currency, foreign-currency pair.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::ActivityValidationError;
use crate::models::activity::{Activity, ActivityCandidate, ActivityField, ActivityType};
use crate::normalize::patterns::{CURRENCY, ISIN, WKN};

/// Validator for candidate activities.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActivityValidator {
    allow_company_identity: bool,
    reference_time: Option<DateTime<Utc>>,
}

/// Fields every activity must carry.
struct Required {
    broker: String,
    activity_type: ActivityType,
    date: NaiveDate,
    datetime: DateTime<Utc>,
    shares: Decimal,
    price: Decimal,
    amount: Decimal,
    fee: Decimal,
    tax: Decimal,
}

impl ActivityValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `company` as the security identity when no isin/wkn/holding is set.
    pub fn with_company_identity(mut self, allow: bool) -> Self {
        self.allow_company_identity = allow;
        self
    }

    /// Fix the clock used for the "not in the future" bound.
    pub fn with_reference_time(mut self, now: DateTime<Utc>) -> Self {
        self.reference_time = Some(now);
        self
    }

    /// Presence, date bounds and numeric constraints.
    pub fn validate_commons(
        &self,
        candidate: ActivityCandidate,
    ) -> Result<ActivityCandidate, ActivityValidationError> {
        self.check_commons(&candidate)?;
        Ok(candidate)
    }

    /// Full validation of a security activity.
    pub fn validate(&self, candidate: ActivityCandidate) -> Result<Activity, ActivityValidationError> {
        let required = self.check_commons(&candidate)?;
        self.check_identity(&candidate)?;
        check_foreign_pair(&candidate)?;
        Ok(build(required, candidate))
    }

    /// Validation of a cash activity, which carries no security identity.
    pub fn validate_cash(&self, candidate: ActivityCandidate) -> Result<Activity, ActivityValidationError> {
        let required = self.check_commons(&candidate)?;
        Ok(build(required, candidate))
    }

    fn check_commons(&self, c: &ActivityCandidate) -> Result<Required, ActivityValidationError> {
        let required = check_presence(c)?;

        let now = self.reference_time.unwrap_or_else(Utc::now);
        let tomorrow = now.date_naive().succ_opt().unwrap_or(NaiveDate::MAX);
        let tomorrow_start = tomorrow.and_time(NaiveTime::MIN).and_utc();
        let oldest = oldest_date();
        let oldest_start = oldest.and_time(NaiveTime::MIN).and_utc();

        if required.date > tomorrow {
            return Err(invalid(ActivityField::Date, "must not be in the future", c));
        }
        if required.date < oldest {
            return Err(invalid(ActivityField::Date, "must be on or after 1990-01-01", c));
        }
        if required.datetime > tomorrow_start {
            return Err(invalid(ActivityField::Datetime, "must not be in the future", c));
        }
        if required.datetime < oldest_start {
            return Err(invalid(ActivityField::Datetime, "must be on or after 1990-01-01", c));
        }

        if required.shares <= Decimal::ZERO {
            return Err(invalid(ActivityField::Shares, "must be greater than 0", c));
        }
        if required.price < Decimal::ZERO {
            return Err(invalid(ActivityField::Price, "must be greater than or equal to 0", c));
        }
        if required.amount < Decimal::ZERO {
            return Err(invalid(ActivityField::Amount, "must be greater than or equal to 0", c));
        }

        Ok(required)
    }

    fn check_identity(&self, c: &ActivityCandidate) -> Result<(), ActivityValidationError> {
        let has_security = c.isin.is_some()
            || c.wkn.is_some()
            || c.holding.is_some()
            || (self.allow_company_identity && c.company.is_some());
        if !has_security {
            let reason = if self.allow_company_identity {
                "activity must contain one of 'isin', 'wkn', 'holding' or 'company'"
            } else {
                "activity must contain one of 'isin', 'wkn' or 'holding'"
            };
            return Err(invalid(ActivityField::Security, reason, c));
        }

        if let Some(isin) = &c.isin {
            if !ISIN.is_match(isin) {
                return Err(invalid(ActivityField::Isin, "invalid scheme", c));
            }
        }
        if let Some(wkn) = &c.wkn {
            if !WKN.is_match(wkn) {
                return Err(invalid(ActivityField::Wkn, "invalid scheme", c));
            }
        }

        if let Some(activity_type) = &c.activity_type {
            if !activity_type.is_validated() {
                let allowed: Vec<&str> = ActivityType::VALIDATED.iter().map(|t| t.as_str()).collect();
                let reason = format!("must be one of [{}]", allowed.join(", "));
                return Err(invalid(ActivityField::Type, &reason, c));
            }
        }

        if let Some(currency) = &c.currency {
            if !CURRENCY.is_match(currency) {
                return Err(invalid(ActivityField::Currency, "invalid scheme", c));
            }
        }

        Ok(())
    }
}

/// Validate a security activity with the default validator.
pub fn validate_activity(
    candidate: ActivityCandidate,
    allow_company_identity: bool,
) -> Result<Activity, ActivityValidationError> {
    ActivityValidator::new()
        .with_company_identity(allow_company_identity)
        .validate(candidate)
}

/// Validate a cash activity with the default validator.
pub fn validate_cash_activity(candidate: ActivityCandidate) -> Result<Activity, ActivityValidationError> {
    ActivityValidator::new().validate_cash(candidate)
}

fn oldest_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1990, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn invalid(field: ActivityField, reason: &str, candidate: &ActivityCandidate) -> ActivityValidationError {
    debug!("Rejected activity: '{}' {}", field, reason);
    ActivityValidationError::InvalidField {
        field,
        reason: reason.to_string(),
        activity: candidate.to_report(),
    }
}

fn check_presence(c: &ActivityCandidate) -> Result<Required, ActivityValidationError> {
    const EMPTY: &str = "must not be empty";

    for (field, value) in [
        (ActivityField::Broker, &c.broker),
        (ActivityField::Isin, &c.isin),
        (ActivityField::Wkn, &c.wkn),
        (ActivityField::Holding, &c.holding),
        (ActivityField::Company, &c.company),
        (ActivityField::Currency, &c.currency),
        (ActivityField::ForeignCurrency, &c.foreign_currency),
    ] {
        if matches!(value, Some(v) if v.trim().is_empty()) {
            return Err(invalid(field, EMPTY, c));
        }
    }

    Ok(Required {
        broker: c.broker.clone().ok_or_else(|| invalid(ActivityField::Broker, EMPTY, c))?,
        activity_type: c
            .activity_type
            .clone()
            .ok_or_else(|| invalid(ActivityField::Type, EMPTY, c))?,
        date: c.date.ok_or_else(|| invalid(ActivityField::Date, EMPTY, c))?,
        datetime: c.datetime.ok_or_else(|| invalid(ActivityField::Datetime, EMPTY, c))?,
        shares: c.shares.ok_or_else(|| invalid(ActivityField::Shares, EMPTY, c))?,
        price: c.price.ok_or_else(|| invalid(ActivityField::Price, EMPTY, c))?,
        amount: c.amount.ok_or_else(|| invalid(ActivityField::Amount, EMPTY, c))?,
        fee: c.fee.ok_or_else(|| invalid(ActivityField::Fee, EMPTY, c))?,
        tax: c.tax.ok_or_else(|| invalid(ActivityField::Tax, EMPTY, c))?,
    })
}

fn check_foreign_pair(c: &ActivityCandidate) -> Result<(), ActivityValidationError> {
    match (&c.foreign_currency, c.fx_rate) {
        (Some(_), None) => Err(invalid(
            ActivityField::FxRate,
            "must be set together with 'foreignCurrency'",
            c,
        )),
        (None, Some(_)) => Err(invalid(
            ActivityField::ForeignCurrency,
            "must be set together with 'fxRate'",
            c,
        )),
        (Some(currency), Some(rate)) => {
            if !CURRENCY.is_match(currency) {
                Err(invalid(ActivityField::ForeignCurrency, "invalid scheme", c))
            } else if rate <= Decimal::ZERO {
                Err(invalid(ActivityField::FxRate, "must be greater than 0", c))
            } else {
                Ok(())
            }
        }
        (None, None) => Ok(()),
    }
}

fn build(required: Required, c: ActivityCandidate) -> Activity {
    Activity {
        broker: required.broker,
        activity_type: required.activity_type,
        date: required.date,
        datetime: required.datetime,
        isin: c.isin,
        wkn: c.wkn,
        holding: c.holding,
        company: c.company,
        shares: required.shares,
        price: required.price,
        amount: required.amount,
        fee: required.fee,
        tax: required.tax,
        currency: c.currency,
        foreign_currency: c.foreign_currency,
        fx_rate: c.fx_rate,
    }
}
