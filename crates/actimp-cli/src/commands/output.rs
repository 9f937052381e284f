//! Rendering import reports as JSON, CSV or plain text.

use actimp_core::{Activity, ImportReport};
use chrono::SecondsFormat;
use clap::ValueEnum;
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output, one row per activity
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    /// Resolve the format named in the configuration file.
    pub fn from_config(name: &str) -> Self {
        <Self as ValueEnum>::from_str(name, true).unwrap_or_else(|_| {
            warn!("Unknown output format '{}' in configuration, using json", name);
            OutputFormat::Json
        })
    }

    /// Name used in the configuration file.
    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "text",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub fn format_report(report: &ImportReport, format: OutputFormat, pretty: bool) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json if pretty => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Json => Ok(serde_json::to_string(report)?),
        OutputFormat::Csv => format_csv(&report.activities),
        OutputFormat::Text => Ok(format_text(report)),
    }
}

const CSV_HEADER: [&str; 16] = [
    "broker",
    "type",
    "date",
    "datetime",
    "isin",
    "wkn",
    "holding",
    "company",
    "shares",
    "price",
    "amount",
    "fee",
    "tax",
    "currency",
    "foreignCurrency",
    "fxRate",
];

fn format_csv(activities: &[Activity]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(CSV_HEADER)?;

    for activity in activities {
        wtr.write_record([
            activity.broker.clone(),
            activity.activity_type.to_string(),
            activity.date.to_string(),
            activity.datetime.to_rfc3339_opts(SecondsFormat::Millis, true),
            activity.isin.clone().unwrap_or_default(),
            activity.wkn.clone().unwrap_or_default(),
            activity.holding.clone().unwrap_or_default(),
            activity.company.clone().unwrap_or_default(),
            activity.shares.to_string(),
            activity.price.to_string(),
            activity.amount.to_string(),
            activity.fee.to_string(),
            activity.tax.to_string(),
            activity.currency.clone().unwrap_or_default(),
            activity.foreign_currency.clone().unwrap_or_default(),
            activity.fx_rate.map(|r| r.to_string()).unwrap_or_default(),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(report: &ImportReport) -> String {
    let mut output = String::new();

    output.push_str(&format!("File: {}\n", report.file));
    output.push_str(&format!(
        "Status: {} ({})\n",
        report.status.code(),
        report.status.label()
    ));
    output.push_str(&format!("Activities: {}\n", report.activities.len()));

    for activity in &report.activities {
        let identity = activity
            .isin
            .as_deref()
            .or(activity.wkn.as_deref())
            .or(activity.holding.as_deref())
            .or(activity.company.as_deref())
            .unwrap_or("-");
        let currency = activity.currency.as_deref().unwrap_or("EUR");

        output.push('\n');
        output.push_str(&format!(
            "{}  {:<12} {}\n",
            activity.date, activity.activity_type, identity
        ));
        output.push_str(&format!(
            "  {} @ {} = {} {} (fee {}, tax {})\n",
            activity.shares, activity.price, activity.amount, currency, activity.fee, activity.tax
        ));
        if let (Some(foreign), Some(rate)) = (&activity.foreign_currency, activity.fx_rate) {
            output.push_str(&format!("  converted from {} at {}\n", foreign, rate));
        }
    }

    output
}
