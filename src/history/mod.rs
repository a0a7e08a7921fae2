//! Append-only quote history.
//!
//! [`History`] is the single entry point; the storage backend behind it is
//! injected at startup (CSV file, PostgreSQL or memory).

mod csv_store;
mod memory_store;
mod pg_store;

pub use csv_store::CsvHistoryStore;
pub use memory_store::MemoryHistoryStore;
pub use pg_store::PgHistoryStore;

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime, Timelike};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::pricing::references::generate_reference;

/// Timestamp format used in history files
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// One issued quote. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRecord {
    pub timestamp: NaiveDateTime,
    pub reference: String,
    pub client: String,
    pub contact: String,
    pub circuit: String,
    pub headcount: u32,
    pub day_count: u32,
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Decimal,
    pub options_summary: String,
}

/// Current local time truncated to the minute, as stored in history.
pub fn now_minute() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now)
}

/// Row store for history records
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Number of records stored so far
    async fn count(&self) -> Result<usize>;

    /// Append one record
    async fn append(&self, record: &HistoryRecord) -> Result<()>;

    /// All records, oldest first
    async fn list(&self) -> Result<Vec<HistoryRecord>>;
}

/// Settings for reference numbering
#[derive(Debug, Clone, Copy)]
pub struct Numbering {
    pub quote_prefix: char,
    pub digits: usize,
}

impl Default for Numbering {
    fn default() -> Self {
        Self {
            quote_prefix: 'D',
            digits: 6,
        }
    }
}

/// History service shared by all requests of the process.
pub struct History {
    store: Arc<dyn HistoryStore>,
    numbering: Numbering,
    /// Held from counting to appending so two requests of this process
    /// never derive the same reference.
    issue_lock: Mutex<()>,
}

impl History {
    pub fn new(store: Arc<dyn HistoryStore>, numbering: Numbering) -> Self {
        Self {
            store,
            numbering,
            issue_lock: Mutex::new(()),
        }
    }

    /// In-memory history, for tests and the `memory` backend
    pub fn in_memory(numbering: Numbering) -> Self {
        Self::new(Arc::new(MemoryHistoryStore::default()), numbering)
    }

    pub fn numbering(&self) -> Numbering {
        self.numbering
    }

    pub async fn append(&self, record: &HistoryRecord) -> Result<()> {
        let _guard = self.issue_lock.lock().await;
        self.store.append(record).await
    }

    pub async fn list(&self) -> Result<Vec<HistoryRecord>> {
        self.store.list().await
    }

    /// Look up a record by its quote reference
    pub async fn find(&self, reference: &str) -> Result<Option<HistoryRecord>> {
        Ok(self
            .store
            .list()
            .await?
            .into_iter()
            .find(|r| r.reference == reference))
    }

    /// Issue the next reference for `client` and append the record built
    /// from it, as one step.
    ///
    /// A blank client is rejected before anything is counted or written.
    pub async fn issue<F>(&self, client: &str, build: F) -> Result<HistoryRecord>
    where
        F: FnOnce(String) -> HistoryRecord,
    {
        let _guard = self.issue_lock.lock().await;

        let count = self.store.count().await?;
        let reference = generate_reference(
            self.numbering.quote_prefix,
            count,
            client,
            self.numbering.digits,
        )?;

        let record = build(reference);
        self.store.append(&record).await?;

        tracing::info!(reference = %record.reference, client = %record.client, "Quote issued");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::pricing::references::reference_number;
    use crate::pricing::PricingError;
    use rust_decimal_macros::dec;

    pub(crate) fn record(reference: &str, client: &str) -> HistoryRecord {
        HistoryRecord {
            timestamp: now_minute(),
            reference: reference.to_string(),
            client: client.to_string(),
            contact: String::new(),
            circuit: "Grand Nord".to_string(),
            headcount: 2,
            day_count: 3,
            total: dec!(240.00),
            options_summary: String::new(),
        }
    }

    #[tokio::test]
    async fn test_issue_sequential_references_increase() {
        let history = History::in_memory(Numbering::default());

        let mut refs = Vec::new();
        for _ in 0..10 {
            let issued = history
                .issue("Dupont", |reference| record(&reference, "Dupont"))
                .await
                .unwrap();
            refs.push(issued.reference);
        }

        assert_eq!(refs[0], "D000001-DUPONT");
        assert_eq!(refs[9], "D000010-DUPONT");
        let numbers: Vec<u64> = refs.iter().map(|r| reference_number(r).unwrap()).collect();
        assert!(numbers.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(history.list().await.unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_issue_concurrent_references_distinct() {
        let history = Arc::new(History::in_memory(Numbering::default()));

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let history = Arc::clone(&history);
                tokio::spawn(async move {
                    let client = format!("Client {}", i);
                    history
                        .issue(&client, |reference| record(&reference, &client))
                        .await
                        .unwrap()
                        .reference
                })
            })
            .collect();

        let mut numbers = Vec::new();
        for handle in handles {
            numbers.push(reference_number(&handle.await.unwrap()).unwrap());
        }
        numbers.sort_unstable();

        assert_eq!(numbers, (1..=32).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn test_issue_blank_client_writes_nothing() {
        let history = History::in_memory(Numbering::default());

        let err = history
            .issue("  ", |reference| record(&reference, "  "))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Pricing(PricingError::Validation { .. })));
        assert!(history.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_issue_counts_existing_records() {
        let history = History::in_memory(Numbering {
            quote_prefix: 'Q',
            digits: 4,
        });
        history.append(&record("D000001-OLD", "Old")).await.unwrap();
        history.append(&record("D000002-OLD", "Old")).await.unwrap();

        let issued = history
            .issue("Rabe", |reference| record(&reference, "Rabe"))
            .await
            .unwrap();
        assert_eq!(issued.reference, "Q0003-RABE");
    }

    #[tokio::test]
    async fn test_find_by_reference() {
        let history = History::in_memory(Numbering::default());
        history.append(&record("D000001-A", "A")).await.unwrap();
        history.append(&record("D000002-B", "B")).await.unwrap();

        let found = history.find("D000002-B").await.unwrap().unwrap();
        assert_eq!(found.client, "B");
        assert!(history.find("D000003-C").await.unwrap().is_none());
    }
}
