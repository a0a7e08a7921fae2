//! Response DTOs for pricing API endpoints.

use rust_decimal::Decimal;
use serde::Serialize;

use super::calculators::round_money;
use super::services::QuoteBreakdown;
use crate::history::HistoryRecord;

/// Money value for JSON responses
#[derive(Debug, Clone, Serialize)]
pub struct MoneyResponse {
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub currency: String,
}

impl MoneyResponse {
    pub fn new(amount: Decimal, currency: &str) -> Self {
        Self {
            amount,
            currency: currency.to_string(),
        }
    }
}

/// Response for a quote computation
#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub category: String,
    pub package: String,
    pub transport: String,
    pub route: String,
    pub headcount: u32,
    pub day_count: u32,
    pub margin_percent: i32,
    pub base_price: MoneyResponse,
    pub supplement: MoneyResponse,
    pub supplement_converted: MoneyResponse,
    pub subtotal: MoneyResponse,
    pub total: MoneyResponse,
    pub total_converted: MoneyResponse,
    pub options_text: String,
}

impl QuoteResponse {
    /// Rounded view of a breakdown: 2 dp primary, 0 dp secondary.
    pub fn from_breakdown(b: &QuoteBreakdown, primary: &str, secondary: &str) -> Self {
        Self {
            category: b.entry.category.clone(),
            package: b.entry.package.clone(),
            transport: b.entry.transport_mode.clone(),
            route: b.entry.route.clone(),
            headcount: b.request.headcount,
            day_count: b.request.day_count,
            margin_percent: b.request.margin_percent,
            base_price: MoneyResponse::new(round_money(b.entry.base_price, 2), primary),
            supplement: MoneyResponse::new(round_money(b.result.supplement_secondary, 0), secondary),
            supplement_converted: MoneyResponse::new(round_money(b.result.supplement_primary, 2), primary),
            subtotal: MoneyResponse::new(round_money(b.result.subtotal, 2), primary),
            total: MoneyResponse::new(round_money(b.result.primary_total, 2), primary),
            total_converted: MoneyResponse::new(round_money(b.result.secondary_total, 0), secondary),
            options_text: b.request.options_summary(),
        }
    }
}

/// Response for an issued quote
#[derive(Debug, Serialize)]
pub struct IssuedQuoteResponse {
    pub reference: String,
    pub client: String,
    pub quote: QuoteResponse,
    pub ticket_url: String,
    pub receipt_url: String,
}

/// History row for JSON responses
#[derive(Debug, Serialize)]
pub struct HistoryRecordResponse {
    pub date: String,
    pub reference: String,
    pub client: String,
    pub contact: String,
    pub circuit: String,
    pub headcount: u32,
    pub day_count: u32,
    pub total: MoneyResponse,
    pub options: String,
}

impl HistoryRecordResponse {
    pub fn new(record: &HistoryRecord, currency: &str) -> Self {
        Self {
            date: record.timestamp.format(crate::history::DATE_FORMAT).to_string(),
            reference: record.reference.clone(),
            client: record.client.clone(),
            contact: record.contact.clone(),
            circuit: record.circuit.clone(),
            headcount: record.headcount,
            day_count: record.day_count,
            total: MoneyResponse::new(record.total, currency),
            options: record.options_summary.clone(),
        }
    }
}

/// Generic error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}
