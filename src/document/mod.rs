//! Printable documents for issued quotes.

mod qr;
mod ticket;

pub use qr::{reference_qr_data_uri, reference_qr_png};
pub use ticket::ThermalTicket;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::history::HistoryRecord;

/// Kind of document being printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Quote,
    Invoice,
}

impl DocumentType {
    /// Title printed on the ticket
    pub fn title(self) -> &'static str {
        match self {
            DocumentType::Quote => "Devis",
            DocumentType::Invoice => "Facture",
        }
    }
}

/// Agency details printed in the ticket header
#[derive(Debug, Clone, Serialize)]
pub struct AgencyInfo {
    pub name: String,
    pub address: String,
    pub phone: String,
}

impl Default for AgencyInfo {
    fn default() -> Self {
        Self {
            name: "Laka Am'lay".to_string(),
            address: "Antsiranana \u{2013} Madagascar".to_string(),
            phone: "+261 34 00 000 00".to_string(),
        }
    }
}

/// Everything a document sink needs to print one transaction
#[derive(Debug, Clone)]
pub struct DocumentPayload {
    pub document_type: DocumentType,
    pub issued_at: NaiveDateTime,
    pub circuit: String,
    pub headcount: u32,
    pub day_count: u32,
    pub total: Decimal,
    pub client: String,
    pub reference: String,
    pub contact: String,
    pub options_text: String,
}

impl DocumentPayload {
    /// Payload for a stored record, printed under `reference`.
    pub fn from_record(record: &HistoryRecord, document_type: DocumentType, reference: &str) -> Self {
        Self {
            document_type,
            issued_at: record.timestamp,
            circuit: record.circuit.clone(),
            headcount: record.headcount,
            day_count: record.day_count,
            total: record.total,
            client: record.client.clone(),
            reference: reference.to_string(),
            contact: record.contact.clone(),
            options_text: record.options_summary.clone(),
        }
    }
}

/// Renders a payload into an opaque document
pub trait DocumentSink: Send + Sync {
    fn render(&self, payload: &DocumentPayload) -> Result<Vec<u8>>;

    /// MIME type of the rendered bytes
    fn content_type(&self) -> &'static str;

    /// File extension for downloads, without the dot
    fn file_extension(&self) -> &'static str;
}
