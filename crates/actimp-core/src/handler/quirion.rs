//! quirion (Quirin Privatbank) account statements and income statements.
//!
//! The rendered text of these documents is split into word fragments at
//! arbitrary points, so labels are matched by joining consecutive fragments.

use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::{unit_price, Handler};
use crate::anchor::{
    compose_activity_datetime, find_exact, find_first_index_matching, flatten_pages, spells_from,
    token_after_exact, token_at, DateTimeLayout, FieldRule, Landmark, OffsetTable, ValueKind,
};
use crate::error::{ParserError, Result};
use crate::models::activity::{Activity, ActivityCandidate, ActivityType, Page, ParserResult};
use crate::normalize::{is_isin, parse_german_decimal};
use crate::validate::validate_activity;

const BROKER: &str = "quirion";

const BUY_LANDMARK: &str = "Wertpapier Kauf";

const DIVIDEND: OffsetTable = OffsetTable(&[
    FieldRule::optional("isin", Landmark::Exact("ISIN"), -1, ValueKind::Text),
    FieldRule::optional("wkn", Landmark::Exact("WKN"), -1, ValueKind::Text),
    FieldRule::optional("shares", Landmark::Exact("Nominal/Stüc"), -1, ValueKind::GermanDecimalWord(0)),
    FieldRule::optional("price", Landmark::Contains("pro Anteil"), 0, ValueKind::GermanDecimalWord(1)),
    FieldRule::optional("amount", Landmark::Exact("Zahlungstag"), 1, ValueKind::GermanDecimal),
    FieldRule::optional("capital_gains_tax", Landmark::Exact("Kapitaler"), -2, ValueKind::GermanDecimal),
    FieldRule::optional("solidarity_surcharge", Landmark::Exact("Solidar"), -2, ValueKind::GermanDecimal),
    FieldRule::optional("church_tax", Landmark::Exact("Kirchensteuer"), -2, ValueKind::GermanDecimal),
]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentType {
    /// Account statement listing fund purchases.
    Statement,
    Dividend,
}

/// Handler for quirion PDF documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct QuirionHandler;

impl Handler for QuirionHandler {
    fn name(&self) -> &'static str {
        "quirion"
    }

    fn can_parse_document(&self, pages: &[Page], extension: &str) -> bool {
        let Some(first) = pages.first() else {
            return false;
        };

        extension == "pdf"
            && spells_from(first, "Quir", 4, "Quirin Privatbank AG")
            && document_type(first).is_some()
    }

    fn parse_pages(&self, pages: &[Page]) -> Result<ParserResult> {
        let content = flatten_pages(pages);
        let activities = match pages.first().and_then(|first| document_type(first)) {
            Some(DocumentType::Statement) => parse_statement(&content)?,
            Some(DocumentType::Dividend) => vec![parse_dividend(&content)?],
            None => {
                warn!("quirion document type not recognized");
                Vec::new()
            }
        };

        debug!("Parsed {} quirion activities", activities.len());
        Ok(ParserResult::from_activities(activities))
    }

    fn parsing_is_text_based(&self) -> bool {
        false
    }
}

fn document_type(content: &[String]) -> Option<DocumentType> {
    if find_exact(content, "Kontoauszug").is_some() {
        return Some(DocumentType::Statement);
    }

    spells_from(content, "Erträ", 4, "Erträgnisabrechnung").then_some(DocumentType::Dividend)
}

/// Collect every purchase booked on the statement.
fn parse_statement(content: &[String]) -> Result<Vec<Activity>> {
    let mut activities = Vec::new();
    let mut index = 0;

    while let Some(landmark) = find_first_index_matching(content, index, |l| l == BUY_LANDMARK) {
        let (activity, last) = parse_purchase(content, landmark)?;
        activities.push(activity);
        index = last.max(landmark) + 1;
    }

    Ok(activities)
}

/// A purchase booking reads, relative to the landmark:
/// amount (-4), currency (-3), value date (-2), booking date (-1),
/// two reference fragments (+1, +2), then name fragments up to the
/// `"<ISIN>, ST <shares>"` line.
///
/// Returns the activity and the index of the ISIN line.
fn parse_purchase(content: &[String], landmark: usize) -> Result<(Activity, usize)> {
    let booked = token_at(content, BUY_LANDMARK, landmark, -4)?;
    let amount = parse_german_decimal(booked)?.map(|a| -a);
    let booking_date = token_at(content, BUY_LANDMARK, landmark, -1)?;
    let when = compose_activity_datetime(booking_date, None, &DateTimeLayout::default())?;

    let name_start = landmark + 3;
    let (isin_line, isin, shares) = content
        .iter()
        .enumerate()
        .skip(name_start)
        .find_map(|(idx, line)| split_isin_and_shares(line).map(|(isin, shares)| (idx, isin, shares)))
        .ok_or_else(|| ParserError::MissingLandmark {
            landmark: "<isin>, ST <shares>".to_string(),
        })?;
    let shares = parse_german_decimal(shares)?;

    let company: String = content[name_start.min(isin_line)..isin_line].concat();

    let candidate = ActivityCandidate {
        isin: Some(isin.to_string()),
        company: (!company.is_empty()).then_some(company),
        shares,
        amount,
        price: amount.zip(shares).map(|(a, s)| unit_price(a, s)),
        fee: Some(Decimal::ZERO),
        tax: Some(Decimal::ZERO),
        ..ActivityCandidate::new(BROKER, ActivityType::Buy).with_datetime(when.date, when.datetime)
    };

    Ok((validate_activity(candidate, false)?, isin_line))
}

/// Split `"LU1931974692, ST 37,722"` into ISIN and share count.
fn split_isin_and_shares(line: &str) -> Option<(&str, &str)> {
    let (isin, rest) = line.split_once(',')?;
    if !is_isin(isin) {
        return None;
    }
    let shares = rest.trim_start().strip_prefix("ST")?.trim();
    Some((isin, shares))
}

fn parse_dividend(content: &[String]) -> Result<Activity> {
    let values = DIVIDEND.read(content, 0)?;

    let date = token_after_exact(content, "Zahlungstag", -1)?;
    let when = compose_activity_datetime(date, None, &DateTimeLayout::default())?;

    // Withheld taxes are printed as negative amounts.
    let tax = match (
        values.decimal("capital_gains_tax"),
        values.decimal("solidarity_surcharge"),
        values.decimal("church_tax"),
    ) {
        (Some(capital), Some(solidarity), Some(church)) => capital
            .checked_add(solidarity)
            .and_then(|sum| sum.checked_add(church))
            .map(|sum| Some(-sum))
            .ok_or(ParserError::Overflow { field: "tax" })?,
        _ => None,
    };

    let candidate = ActivityCandidate {
        isin: values.text("isin").filter(|isin| is_isin(isin)).map(str::to_string),
        wkn: values.text("wkn").map(str::to_string),
        company: read_dividend_company(content),
        shares: values.decimal("shares"),
        price: values.decimal("price"),
        amount: values.decimal("amount"),
        fee: Some(Decimal::ZERO),
        tax,
        ..ActivityCandidate::new(BROKER, ActivityType::Dividend).with_datetime(when.date, when.datetime)
    };

    Ok(validate_activity(candidate, false)?)
}

/// The security name follows the salutation line and ends at the column label.
fn read_dividend_company(content: &[String]) -> Option<String> {
    let start = find_exact(content, "teilen wir nachstehende Abrechn")? + 2;
    let end = find_first_index_matching(content, start, |l| l == "Wertpapierbez")?;
    let company = content[start..end].concat();
    (!company.is_empty()).then_some(company)
}
