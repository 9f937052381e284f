//! sBroker securities statements (trade confirmations and dividend credits).

use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::{unit_price, Handler};
use crate::anchor::{
    compose_activity_datetime, find_first_index_matching, find_first_isin_index, find_first_of_any,
    find_last_exact, flatten_pages, join_range, token_at, ActivityDateTime, DateTimeLayout, FieldRule,
    Landmark, OffsetTable, ValueKind,
};
use crate::error::{ParserError, Result};
use crate::models::activity::{Activity, ActivityCandidate, ActivityType, Page, ParserResult};
use crate::normalize::{parse_german_decimal, parse_text, strip_brackets};
use crate::validate::validate_activity;

const BROKER: &str = "sBroker";

/// Fragments of the provider name must appear this early on the first page.
const HEADER_WINDOW: usize = 10;

const TRADE: OffsetTable = OffsetTable(&[
    FieldRule::required("shares", Landmark::Exact("ISIN"), 5, ValueKind::GermanDecimal),
    FieldRule::required("amount", Landmark::Exact("Kurswert"), 1, ValueKind::GermanDecimal),
]);

const DIVIDEND: OffsetTable = OffsetTable(&[
    FieldRule::required("shares", Landmark::Exact("ISIN"), 5, ValueKind::GermanDecimal),
    FieldRule::required("net", Landmark::Exact("Ausmachender"), 2, ValueKind::GermanDecimal),
    FieldRule::optional("fx_pair", Landmark::Exact("Devisenkurs"), 2, ValueKind::Text),
    FieldRule::optional("fx_rate", Landmark::Exact("Devisenkurs"), 3, ValueKind::GermanDecimal),
]);

const FEE: OffsetTable = OffsetTable(&[FieldRule::optional(
    "fee",
    Landmark::Exact("Provision"),
    1,
    ValueKind::GermanDecimal,
)]);

/// Percentage commissions print the rate and its label before the amount.
const FEE_AFTER_RATE: OffsetTable = OffsetTable(&[FieldRule::optional(
    "fee",
    Landmark::Exact("Provision"),
    3,
    ValueKind::GermanDecimal,
)]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentType {
    Buy,
    Sell,
    Dividend,
}

/// Handler for sBroker PDF statements.
#[derive(Debug, Default, Clone, Copy)]
pub struct SBrokerHandler;

impl Handler for SBrokerHandler {
    fn name(&self) -> &'static str {
        "sbroker"
    }

    fn can_parse_document(&self, pages: &[Page], extension: &str) -> bool {
        let Some(first) = pages.first() else {
            return false;
        };

        extension == "pdf"
            && first.iter().take(HEADER_WINDOW).any(|line| line == "S Broker")
            && document_type(first).is_some()
    }

    fn parse_pages(&self, pages: &[Page]) -> Result<ParserResult> {
        let Some(document_type) = pages.first().and_then(|first| document_type(first)) else {
            warn!("sBroker document type not recognized");
            return Ok(ParserResult::from_activities(Vec::new()));
        };

        let content = flatten_pages(pages);
        let activity = match document_type {
            DocumentType::Buy => parse_trade(&content, ActivityType::Buy)?,
            DocumentType::Sell => parse_trade(&content, ActivityType::Sell)?,
            DocumentType::Dividend => parse_dividend(&content)?,
        };

        debug!("Parsed sBroker {} for {:?}", activity.activity_type, activity.isin);
        Ok(ParserResult::from_activities(vec![activity]))
    }
}

fn document_type(content: &[String]) -> Option<DocumentType> {
    if let Some(idx) = find_first_index_matching(content, 1, |l| l == "Wertpapier") {
        if content.get(idx + 1).map(String::as_str) == Some("Abrechnung") {
            match content.get(idx + 2).map(String::as_str) {
                Some("Kauf") | Some("Ausgabe") => return Some(DocumentType::Buy),
                Some("Verkauf") => return Some(DocumentType::Sell),
                _ => {}
            }
        }
    }

    if find_first_index_matching(content, 1, |l| l == "Dividendengutschrift").is_some() {
        return Some(DocumentType::Dividend);
    }

    // Distributions of funds spell the label across three fragments.
    let idx = find_first_index_matching(content, 4, |l| l == "Investmentfonds")?;
    (join_range(content, idx - 3, idx).as_deref() == Some("Ausschüttung")).then_some(DocumentType::Dividend)
}

fn isin_start(content: &[String]) -> std::result::Result<usize, ParserError> {
    find_first_index_matching(content, 0, |l| l == "ISIN").ok_or_else(|| ParserError::MissingLandmark {
        landmark: "ISIN".to_string(),
    })
}

fn parse_trade(content: &[String], activity_type: ActivityType) -> Result<Activity> {
    let from = isin_start(content)?;
    let values = TRADE.read(content, from)?;
    let shares = values.decimal("shares");
    let amount = values.decimal("amount");

    let security = read_security(content, from)?;
    let when = read_datetime(content, from)?;

    let candidate = ActivityCandidate {
        isin: security.isin,
        wkn: security.wkn,
        company: security.company,
        shares,
        amount,
        price: amount.zip(shares).map(|(a, s)| unit_price(a, s)),
        fee: Some(read_fee(content, from)?),
        tax: Some(Decimal::ZERO),
        ..ActivityCandidate::new(BROKER, activity_type).with_datetime(when.date, when.datetime)
    };

    Ok(validate_activity(candidate, false)?)
}

fn parse_dividend(content: &[String]) -> Result<Activity> {
    let from = isin_start(content)?;
    let values = DIVIDEND.read(content, from)?;
    let shares = values.decimal("shares");
    let gross = read_gross_payout(content, from)?;

    let foreign_currency = values
        .text("fx_pair")
        .and_then(|pair| pair.split_whitespace().nth(1))
        .map(str::to_string);
    let (amount, foreign_currency, fx_rate) = match (foreign_currency, values.decimal("fx_rate")) {
        (Some(currency), Some(rate)) => (gross.checked_div(rate).unwrap_or(gross), Some(currency), Some(rate)),
        _ => (gross, None, None),
    };

    let security = read_security(content, from)?;
    let when = read_datetime(content, from)?;

    let candidate = ActivityCandidate {
        isin: security.isin,
        wkn: security.wkn,
        company: security.company,
        shares,
        amount: Some(amount),
        price: shares.map(|s| unit_price(amount, s)),
        fee: Some(read_fee(content, from)?),
        tax: values.decimal("net").map(|net| withheld_tax(amount, net)).transpose()?,
        foreign_currency,
        fx_rate,
        ..ActivityCandidate::new(BROKER, ActivityType::Dividend).with_datetime(when.date, when.datetime)
    };

    Ok(validate_activity(candidate, false)?)
}

/// Difference between the converted gross payout and the credited net amount.
fn withheld_tax(amount: Decimal, net: Decimal) -> std::result::Result<Decimal, ParserError> {
    amount.checked_sub(net).ok_or(ParserError::Overflow { field: "tax" })
}

fn read_fee(content: &[String], from: usize) -> std::result::Result<Decimal, ParserError> {
    let table = if find_first_index_matching(content, from, |l| l == "% vom Kurswert").is_some() {
        FEE_AFTER_RATE
    } else {
        FEE
    };
    Ok(table.read(content, from)?.decimal("fee").unwrap_or(Decimal::ZERO))
}

fn read_gross_payout(content: &[String], from: usize) -> std::result::Result<Decimal, ParserError> {
    let (landmark, base, offset) =
        match find_first_index_matching(content, from, |l| l == "Dividendengutschrift") {
            Some(idx) => ("Dividendengutschrift", idx, 1),
            None => {
                let idx = find_last_exact(&content[from..], "Aussch")
                    .map(|idx| from + idx)
                    .ok_or_else(|| ParserError::MissingLandmark {
                        landmark: "Dividendengutschrift|Aussch".to_string(),
                    })?;
                ("Aussch", idx, 3)
            }
        };

    let token = token_at(content, landmark, base, offset)?;
    parse_german_decimal(token)?.ok_or_else(|| ParserError::InvalidDecimal {
        input: token.to_string(),
    })
}

struct Security {
    isin: Option<String>,
    wkn: Option<String>,
    company: Option<String>,
}

/// The first ISIN after the column header is followed by the bracketed WKN;
/// the security name fills the gap between the share count and the ISIN.
fn read_security(content: &[String], from: usize) -> std::result::Result<Security, ParserError> {
    let position = find_first_isin_index(content, from + 1).ok_or_else(|| ParserError::MissingLandmark {
        landmark: "<isin>".to_string(),
    })?;

    let isin = parse_text(&content[position]);
    let wkn = parse_text(&strip_brackets(token_at(content, "<isin>", position, 1)?));
    let company = join_words(content.get(from + 6..position).unwrap_or_default());

    Ok(Security { isin, wkn, company })
}

fn join_words(fragments: &[String]) -> Option<String> {
    parse_text(&fragments.join(" "))
}

fn read_datetime(content: &[String], from: usize) -> std::result::Result<ActivityDateTime, ParserError> {
    let layout = DateTimeLayout::default().with_datetime_format("%d.%m.%Y %H:%M:%S");
    let after = from + 1;

    if let Some(idx) = find_first_index_matching(content, after, |l| l == "Schlusstag/-Zeit") {
        let date = token_at(content, "Schlusstag/-Zeit", idx, 1)?;
        let time = token_at(content, "Schlusstag/-Zeit", idx, 2)?;
        return compose_activity_datetime(date, Some(time), &layout);
    }

    let landmark = "Schlusstag|Zahlbarkeitstag";
    let idx = find_first_of_any(content, &["Schlusstag", "Zahlbarkeitstag"], after).ok_or_else(|| {
        ParserError::MissingLandmark {
            landmark: landmark.to_string(),
        }
    })?;
    let date = token_at(content, landmark, idx, 1)?;
    compose_activity_datetime(date, None, &layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImportError;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn page(lines: &[&str]) -> Page {
        lines.iter().map(|s| s.to_string()).collect()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn buy_page() -> Page {
        page(&[
            "S Broker", "Carl-Bosch-Straße 10", "65203 Wiesbaden", "Wertpapier", "Abrechnung", "Kauf",
            "Nominale", "Depot-Nr.", "ISIN", "(WKN)", "Wertpapierbezeichnung", "Nominale", "Stück", "33",
            "BRITISH AMERICAN TOBACCO PLC", "REGISTERED SHARES LS -,25", "GB0002875804", "(916018)",
            "Handels-/Ausf", "ührungsplatz", "Tradegate", "Schlusstag/-Zeit", "30.11.2021", "10:27:32",
            "Ausführungskurs", "29,90", "EUR", "Kurswert", "986,70", "EUR", "Provision", "9,97", "EUR",
            "Ausmachender Betrag", "996,67", "EUR",
        ])
    }

    fn sell_page() -> Page {
        page(&[
            "S Broker", "Wertpapier", "Abrechnung", "Verkauf", "ISIN", "(WKN)", "Wertpapierbezeichnung",
            "Nominale", "Stück", "12", "APPLE INC.", "US0378331005", "(865985)", "Handels-/Ausf",
            "ührungsplatz", "Xetra", "Schlusstag", "01.12.2021", "Kurswert", "1.234,56", "EUR",
            "Provision", "0,25", "% vom Kurswert", "3,09", "EUR",
        ])
    }

    fn dividend_page() -> Page {
        page(&[
            "S Broker", "Dividendengutschrift", "ISIN", "(WKN)", "Wertpapierbezeichnung", "Nominale",
            "Stück", "10", "APPLE INC.", "REGISTERED SHARES O.N.", "US0378331005", "(865985)",
            "Zahlbarkeitstag", "17.05.2021", "Dividende pro Stück", "1,48", "USD", "Dividendengutschrift",
            "14,80", "USD", "Devisenkurs", "EUR / USD", "Umrechnung USD", "1,25", "Ausmachender", "Betrag",
            "10,07", "EUR",
        ])
    }

    #[test]
    fn test_detection() {
        let handler = SBrokerHandler;
        assert!(handler.can_parse_document(&[buy_page()], "pdf"));
        assert!(handler.can_parse_document(&[sell_page()], "pdf"));
        assert!(handler.can_parse_document(&[dividend_page()], "pdf"));
        assert!(!handler.can_parse_document(&[buy_page()], "csv"));
        assert!(!handler.can_parse_document(&[page(&["S Broker", "Kontoauszug"])], "pdf"));
        assert!(handler.can_parse_document(
            &[page(&["S Broker", "Aus", "schüt", "tung", "Investmentfonds"])],
            "pdf"
        ));

        let mut late = vec!["Anschrift".to_string(); HEADER_WINDOW];
        late.extend(buy_page());
        assert!(!handler.can_parse_document(&[late], "pdf"));
    }

    #[test]
    fn test_parse_buy() {
        let result = SBrokerHandler.parse_pages(&[buy_page()]).unwrap();
        assert_eq!(result.activities.len(), 1);

        let activity = &result.activities[0];
        assert_eq!(activity.broker, "sBroker");
        assert_eq!(activity.activity_type, ActivityType::Buy);
        assert_eq!(activity.isin.as_deref(), Some("GB0002875804"));
        assert_eq!(activity.wkn.as_deref(), Some("916018"));
        assert_eq!(
            activity.company.as_deref(),
            Some("BRITISH AMERICAN TOBACCO PLC REGISTERED SHARES LS -,25")
        );
        assert_eq!(activity.shares, dec("33"));
        assert_eq!(activity.amount, dec("986.70"));
        assert_eq!(activity.price, dec("29.9"));
        assert_eq!(activity.fee, dec("9.97"));
        assert_eq!(activity.tax, Decimal::ZERO);
        assert_eq!(activity.date, NaiveDate::from_ymd_opt(2021, 11, 30).unwrap());
        assert_eq!(activity.datetime.to_rfc3339(), "2021-11-30T09:27:32+00:00");
    }

    #[test]
    fn test_parse_sell_with_percentage_fee() {
        let result = SBrokerHandler.parse_pages(&[sell_page()]).unwrap();
        let activity = &result.activities[0];
        assert_eq!(activity.activity_type, ActivityType::Sell);
        assert_eq!(activity.company.as_deref(), Some("APPLE INC."));
        assert_eq!(activity.amount, dec("1234.56"));
        assert_eq!(activity.price, dec("102.88"));
        assert_eq!(activity.fee, dec("3.09"));
        assert_eq!(activity.date, NaiveDate::from_ymd_opt(2021, 12, 1).unwrap());
    }

    #[test]
    fn test_parse_foreign_dividend() {
        let result = SBrokerHandler.parse_pages(&[dividend_page()]).unwrap();
        let activity = &result.activities[0];
        assert_eq!(activity.activity_type, ActivityType::Dividend);
        assert_eq!(activity.isin.as_deref(), Some("US0378331005"));
        assert_eq!(activity.company.as_deref(), Some("APPLE INC. REGISTERED SHARES O.N."));
        assert_eq!(activity.shares, dec("10"));
        assert_eq!(activity.foreign_currency.as_deref(), Some("USD"));
        assert_eq!(activity.fx_rate, Some(dec("1.25")));
        assert_eq!(activity.amount, dec("11.84"));
        assert_eq!(activity.price, dec("1.184"));
        assert_eq!(activity.tax, dec("1.77"));
        assert_eq!(activity.fee, Decimal::ZERO);
        assert_eq!(activity.date, NaiveDate::from_ymd_opt(2021, 5, 17).unwrap());
    }

    #[test]
    fn test_missing_amount_is_a_parse_error() {
        let mut lines = buy_page();
        lines.retain(|l| l != "Kurswert");
        let err = SBrokerHandler.parse_pages(&[lines]).unwrap_err();
        assert_eq!(err.status().code(), 3);
    }

    #[test]
    fn test_tax_out_of_range_is_a_parse_error() {
        let huge = "79.228.162.514.264.337.593.543.950.335";
        let lines: Page = dividend_page()
            .into_iter()
            .map(|line| match line.as_str() {
                "14,80" => huge.to_string(),
                "10,07" => format!("-{huge}"),
                _ => line,
            })
            .collect();

        let err = SBrokerHandler.parse_pages(&[lines]).unwrap_err();
        assert!(matches!(err, ImportError::Parser(ParserError::Overflow { field: "tax" })));
        assert_eq!(err.status().code(), 3);
    }

    #[test]
    fn test_security_without_isin_is_a_parse_error() {
        let mut lines = buy_page();
        lines.retain(|l| l != "GB0002875804");
        let err = SBrokerHandler.parse_pages(&[lines]).unwrap_err();
        assert!(matches!(err, ImportError::Parser(ParserError::MissingLandmark { .. })));
    }

    #[test]
    fn test_pages_are_flattened() {
        let lines = buy_page();
        let (head, tail) = lines.split_at(20);
        let result = SBrokerHandler.parse_pages(&[head.to_vec(), tail.to_vec()]).unwrap();
        assert_eq!(result.activities[0].amount, dec("986.70"));
    }
}
