//! CSV file history backend.
//!
//! Columns: `Date, Ref, Client, Contact, Circuit, Pax, Jours, Total, Options`.
//! Files from older versions only carry `Date, Ref, Client, Total`; they are
//! read as-is and rewritten with the full header on the next append.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use csv::{ReaderBuilder, WriterBuilder};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use super::{HistoryRecord, HistoryStore, DATE_FORMAT};
use crate::catalog::parse_price;
use crate::error::{AppError, Result};

const COLUMNS: [&str; 9] = [
    "Date", "Ref", "Client", "Contact", "Circuit", "Pax", "Jours", "Total", "Options",
];

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Ref")]
    reference: String,
    #[serde(rename = "Client")]
    client: String,
    #[serde(rename = "Contact", default)]
    contact: Option<String>,
    #[serde(rename = "Circuit", default)]
    circuit: Option<String>,
    #[serde(rename = "Pax", default)]
    pax: Option<u32>,
    #[serde(rename = "Jours", default)]
    jours: Option<u32>,
    #[serde(rename = "Total")]
    total: String,
    #[serde(rename = "Options", default)]
    options: Option<String>,
}

#[derive(Debug, Serialize)]
struct CsvOutRow<'a> {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Ref")]
    reference: &'a str,
    #[serde(rename = "Client")]
    client: &'a str,
    #[serde(rename = "Contact")]
    contact: &'a str,
    #[serde(rename = "Circuit")]
    circuit: &'a str,
    #[serde(rename = "Pax")]
    pax: u32,
    #[serde(rename = "Jours")]
    jours: u32,
    #[serde(rename = "Total")]
    total: String,
    #[serde(rename = "Options")]
    options: &'a str,
}

impl<'a> From<&'a HistoryRecord> for CsvOutRow<'a> {
    fn from(r: &'a HistoryRecord) -> Self {
        Self {
            date: r.timestamp.format(DATE_FORMAT).to_string(),
            reference: &r.reference,
            client: &r.client,
            contact: &r.contact,
            circuit: &r.circuit,
            pax: r.headcount,
            jours: r.day_count,
            total: r.total.to_string(),
            options: &r.options_summary,
        }
    }
}

impl TryFrom<CsvRow> for HistoryRecord {
    type Error = AppError;

    fn try_from(row: CsvRow) -> Result<Self> {
        let timestamp = NaiveDateTime::parse_from_str(&row.date, DATE_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(&row.date, "%Y-%m-%d %H:%M:%S"))
            .map_err(|e| AppError::History(format!("bad date '{}' for {}: {}", row.date, row.reference, e)))?;

        let total: Decimal = parse_price(&row.total)
            .ok_or_else(|| AppError::History(format!("bad total '{}' for {}", row.total, row.reference)))?;

        Ok(HistoryRecord {
            timestamp,
            reference: row.reference,
            client: row.client,
            contact: row.contact.unwrap_or_default(),
            circuit: row.circuit.unwrap_or_default(),
            headcount: row.pax.unwrap_or(1),
            day_count: row.jours.unwrap_or(1),
            total,
            options_summary: row.options.unwrap_or_default(),
        })
    }
}

/// History kept in a flat CSV file.
///
/// Every call reads or appends to the file; nothing is cached. Two processes
/// sharing the file can still read the same count.
#[derive(Debug, Clone)]
pub struct CsvHistoryStore {
    path: PathBuf,
}

impl CsvHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[cfg(test)]
    fn path(&self) -> &Path {
        &self.path
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Path) -> Result<T> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || f(&path))
            .await
            .map_err(|e| AppError::Internal(format!("history task failed: {}", e)))?
    }
}

fn read_records(path: &Path) -> Result<Vec<HistoryRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let mut records = Vec::new();
    for row in rdr.deserialize::<CsvRow>() {
        records.push(HistoryRecord::try_from(row?)?);
    }
    Ok(records)
}

fn has_current_header(path: &Path) -> Result<bool> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let headers = rdr.headers()?;
    Ok(headers.iter().eq(COLUMNS.iter().copied()))
}

fn write_all(path: &Path, records: &[HistoryRecord]) -> Result<()> {
    let tmp = path.with_extension("csv.tmp");
    {
        let mut wtr = WriterBuilder::new().has_headers(true).from_path(&tmp)?;
        for record in records {
            wtr.serialize(CsvOutRow::from(record))?;
        }
        wtr.flush()?;
    }
    std::fs::rename(&tmp, path)?;
    Ok(())
}

fn append_record(path: &Path, record: &HistoryRecord) -> Result<()> {
    let is_new = std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);

    if !is_new && !has_current_header(path)? {
        tracing::info!("Upgrading history file {} to the full column set", path.display());
        let mut records = read_records(path)?;
        records.push(record.clone());
        return write_all(path, &records);
    }

    let file: File = OpenOptions::new().create(true).append(true).open(path)?;
    let mut wtr = WriterBuilder::new().has_headers(is_new).from_writer(file);
    wtr.serialize(CsvOutRow::from(record))?;
    wtr.flush()?;
    Ok(())
}

#[async_trait]
impl HistoryStore for CsvHistoryStore {
    async fn count(&self) -> Result<usize> {
        self.blocking(|path| read_records(path).map(|r| r.len())).await
    }

    async fn append(&self, record: &HistoryRecord) -> Result<()> {
        let record = record.clone();
        self.blocking(move |path| append_record(path, &record)).await
    }

    async fn list(&self) -> Result<Vec<HistoryRecord>> {
        self.blocking(read_records).await
    }
}
