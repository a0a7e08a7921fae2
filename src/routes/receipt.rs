//! HTML receipt page

use askama::Template;
use axum::{
    extract::{Path, State},
    response::Html,
};

use crate::document::reference_qr_data_uri;
use crate::error::{AppError, Result};
use crate::history::HistoryRecord;
use crate::pricing::{format_grouped, PricingError};
use crate::AppState;

/// Receipt template
#[derive(Template)]
#[template(path = "receipt.html")]
struct ReceiptTemplate {
    agency_name: String,
    agency_address: String,
    agency_phone: String,
    record: HistoryRecord,
    date: String,
    total: String,
    total_converted: String,
    primary_currency: String,
    secondary_currency: String,
    qr_data_uri: String,
    has_contact: bool,
    has_options: bool,
}

/// Receipt for an issued quote, with the reference as a QR code
pub async fn show(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Html<String>> {
    let record = state
        .history
        .find(&reference)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("quote {}", reference)))?;

    let config = &state.config;
    let converted = config
        .exchange_rate
        .to_secondary(record.total)
        .ok_or_else(|| PricingError::Overflow {
            step: "converted total".to_string(),
        })?;

    let template = ReceiptTemplate {
        agency_name: config.agency.name.clone(),
        agency_address: config.agency.address.clone(),
        agency_phone: config.agency.phone.clone(),
        date: record.timestamp.format("%d/%m/%Y %H:%M").to_string(),
        total: format_grouped(record.total, 2),
        total_converted: format_grouped(converted, 0),
        primary_currency: config.primary_currency.clone(),
        secondary_currency: config.secondary_currency.clone(),
        qr_data_uri: reference_qr_data_uri(&record.reference)?,
        has_contact: !record.contact.is_empty(),
        has_options: !record.options_summary.is_empty(),
        record,
    };

    Ok(Html(template.render()?))
}
