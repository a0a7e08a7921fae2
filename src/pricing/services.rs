//! Pricing service functions with catalog and history access.
//!
//! These tie the pure calculators to the catalog, the history store and the
//! document sink.

use rust_decimal::Decimal;

use crate::catalog::{Catalog, CatalogEntry};
use crate::document::{DocumentPayload, DocumentSink, DocumentType};
use crate::error::{AppError, Result};
use crate::history::{now_minute, History, HistoryRecord};

use super::calculators::{compute_quote, round_money, ExchangeRate};
use super::models::{OptionCatalog, QuoteRequest, QuoteResult};
use super::references::derive_invoice_reference;
use super::requests::QuoteFormRequest;

/// Pricing calculation error types
#[derive(Debug, Clone, PartialEq)]
pub enum PricingError {
    NotFound {
        what: String,
        key: String,
    },
    Validation {
        field: String,
        message: String,
    },
    UnknownOption {
        key: String,
    },
    InvalidReference {
        reference: String,
        expected_prefix: char,
    },
    InvalidExchangeRate {
        rate: Decimal,
    },
    Overflow {
        step: String,
    },
}

impl PricingError {
    pub fn error_type(&self) -> &'static str {
        match self {
            PricingError::NotFound { .. } => "not_found",
            PricingError::Validation { .. } => "validation",
            PricingError::UnknownOption { .. } => "unknown_option",
            PricingError::InvalidReference { .. } => "invalid_reference",
            PricingError::InvalidExchangeRate { .. } => "configuration",
            PricingError::Overflow { .. } => "overflow",
        }
    }
}

impl std::fmt::Display for PricingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PricingError::NotFound { what, key } => {
                write!(f, "No {} found for {}", what, key)
            }
            PricingError::Validation { field, message } => {
                write!(f, "Invalid {}: {}", field, message)
            }
            PricingError::UnknownOption { key } => {
                write!(f, "Unknown option '{}'", key)
            }
            PricingError::InvalidReference { reference, expected_prefix } => {
                write!(f, "Reference '{}' does not start with '{}'", reference, expected_prefix)
            }
            PricingError::InvalidExchangeRate { rate } => {
                write!(f, "Exchange rate must be positive, got {}", rate)
            }
            PricingError::Overflow { step } => {
                write!(f, "Amount too large to compute the {}", step)
            }
        }
    }
}

impl std::error::Error for PricingError {}

/// A priced quote before anything is persisted
#[derive(Debug, Clone)]
pub struct QuoteBreakdown {
    pub entry: CatalogEntry,
    pub request: QuoteRequest,
    pub result: QuoteResult,
}

/// Look up the package and price the form's selection.
///
/// Pure apart from logging; nothing is written.
pub fn price_quote(
    catalog: &Catalog,
    options: &OptionCatalog,
    rate: ExchangeRate,
    default_margin: i32,
    form: &QuoteFormRequest,
) -> std::result::Result<QuoteBreakdown, PricingError> {
    let entry = catalog
        .find(&form.category, &form.package, &form.transport, &form.route)?
        .clone();
    let request = form.to_quote_request(options, default_margin)?;

    if !(0..=100).contains(&request.margin_percent) {
        tracing::warn!(margin = request.margin_percent, "Margin outside 0-100%, applied as given");
    }

    let result = compute_quote(&entry, &request, rate)?;
    tracing::debug!(
        route = %entry.route,
        headcount = request.headcount,
        total = %result.primary_total,
        "Quote priced"
    );

    Ok(QuoteBreakdown {
        entry,
        request,
        result,
    })
}

/// Issue a reference for a priced quote and append it to the history.
///
/// The total is rounded to 2 dp here, at persistence. Stored text keeps its
/// original characters.
pub async fn issue_quote(
    history: &History,
    breakdown: &QuoteBreakdown,
    client: &str,
    contact: &str,
) -> Result<HistoryRecord> {
    let client = client.trim();
    let contact = contact.trim();

    history
        .issue(client, |reference| HistoryRecord {
            timestamp: now_minute(),
            reference,
            client: client.to_string(),
            contact: contact.to_string(),
            circuit: breakdown.entry.route.clone(),
            headcount: breakdown.request.headcount,
            day_count: breakdown.request.day_count,
            total: round_money(breakdown.result.primary_total, 2),
            options_summary: breakdown.request.options_summary(),
        })
        .await
}

/// Render the quote ticket of a stored record
pub async fn quote_document(
    history: &History,
    sink: &dyn DocumentSink,
    reference: &str,
) -> Result<Vec<u8>> {
    let record = find_record(history, reference).await?;
    sink.render(&DocumentPayload::from_record(&record, DocumentType::Quote, &record.reference))
}

/// Derive the invoice reference of a stored quote and render its invoice.
///
/// Returns the invoice reference with the rendered document.
pub async fn invoice_document(
    history: &History,
    sink: &dyn DocumentSink,
    quote_reference: &str,
    invoice_prefix: char,
) -> Result<(String, Vec<u8>)> {
    let quote_prefix = history.numbering().quote_prefix;
    let invoice_reference = derive_invoice_reference(quote_reference, quote_prefix, invoice_prefix)?;
    let record = find_record(history, quote_reference).await?;

    let document = sink.render(&DocumentPayload::from_record(
        &record,
        DocumentType::Invoice,
        &invoice_reference,
    ))?;

    tracing::info!(quote = %quote_reference, invoice = %invoice_reference, "Invoice issued");
    Ok((invoice_reference, document))
}

async fn find_record(history: &History, reference: &str) -> Result<HistoryRecord> {
    history
        .find(reference)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("quote {}", reference)))
}
