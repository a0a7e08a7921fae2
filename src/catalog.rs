//! Package catalog loaded from the `Type, Formule, Transport, Circuit, Prix`
//! CSV file.

use csv::ReaderBuilder;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use crate::error::{AppError, Result};
use crate::pricing::PricingError;

const REQUIRED_COLUMNS: [&str; 5] = ["Type", "Formule", "Transport", "Circuit", "Prix"];

/// One priced route of the catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogEntry {
    pub category: String,
    pub package: String,
    pub transport_mode: String,
    pub route: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub base_price: Decimal,
}

/// Read-only list of catalog rows, in file order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Load the catalog from a CSV file on disk.
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| {
            AppError::Catalog(format!("cannot open {}: {}", path.display(), e))
        })?;
        Self::from_reader(file)
    }

    /// Parse catalog CSV. Unparseable prices become 0.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let mut index = [0usize; 5];
        for (slot, column) in index.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = headers
                .iter()
                .position(|h| h == column)
                .ok_or_else(|| AppError::Catalog(format!("missing column '{}'", column)))?;
        }

        let mut entries = Vec::new();
        for (row_idx, record) in rdr.records().enumerate() {
            let record = record?;
            let field = |i: usize| record.get(index[i]).unwrap_or_default().to_string();

            let raw_price = field(4);
            let base_price = parse_price(&raw_price).unwrap_or_else(|| {
                tracing::warn!(row = row_idx + 2, price = %raw_price, "Unparseable catalog price, using 0");
                Decimal::ZERO
            });

            entries.push(CatalogEntry {
                category: field(0),
                package: field(1),
                transport_mode: field(2),
                route: field(3),
                base_price,
            });
        }

        tracing::debug!("Loaded {} catalog entries", entries.len());
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sorted distinct categories
    pub fn categories(&self) -> Vec<String> {
        distinct(self.entries.iter().map(|e| &e.category))
    }

    /// Sorted distinct packages within a category
    pub fn packages(&self, category: &str) -> Vec<String> {
        distinct(
            self.entries
                .iter()
                .filter(|e| e.category == category)
                .map(|e| &e.package),
        )
    }

    /// Sorted distinct transport modes for a category and package
    pub fn transports(&self, category: &str, package: &str) -> Vec<String> {
        distinct(
            self.entries
                .iter()
                .filter(|e| e.category == category && e.package == package)
                .map(|e| &e.transport_mode),
        )
    }

    /// Sorted distinct routes for a category, package and transport mode
    pub fn routes(&self, category: &str, package: &str, transport_mode: &str) -> Vec<String> {
        distinct(
            self.entries
                .iter()
                .filter(|e| {
                    e.category == category && e.package == package && e.transport_mode == transport_mode
                })
                .map(|e| &e.route),
        )
    }

    /// Exact lookup on the four key columns. First match wins.
    pub fn find(
        &self,
        category: &str,
        package: &str,
        transport_mode: &str,
        route: &str,
    ) -> std::result::Result<&CatalogEntry, PricingError> {
        self.entries
            .iter()
            .find(|e| {
                e.category == category
                    && e.package == package
                    && e.transport_mode == transport_mode
                    && e.route == route
            })
            .ok_or_else(|| PricingError::NotFound {
                what: "catalog entry".to_string(),
                key: format!("{} / {} / {} / {}", category, package, transport_mode, route),
            })
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a String>) -> Vec<String> {
    values.cloned().collect::<BTreeSet<_>>().into_iter().collect()
}

/// Parse a catalog price; `None` when empty or not a number.
pub fn parse_price(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_scientific(raw).ok())
        .or_else(|| raw.parse::<f64>().ok().and_then(|f| Decimal::try_from(f).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const SAMPLE: &str = "\
Type,Formule,Transport,Circuit,Prix
Aventure,Confort,4x4,Grand Nord,450
Aventure,Confort,4x4,Tsingy,380.5
Aventure,Eco,Taxi-brousse,Grand Nord,210
Balneaire,Confort,Bateau,Nosy Be,
Aventure,Confort,4x4,Grand Nord,999
Balneaire,Eco,Bateau,Sakatia,abc
";

    fn sample() -> Catalog {
        Catalog::from_reader(SAMPLE.as_bytes()).unwrap()
    }

    #[test]
    fn test_load_reads_all_rows() {
        let catalog = sample();
        assert_eq!(catalog.entries().len(), 6);
        assert_eq!(catalog.entries()[1].base_price, dec!(380.5));
    }

    #[test]
    fn test_missing_or_non_numeric_price_is_zero() {
        let catalog = sample();
        let nosy_be = catalog.find("Balneaire", "Confort", "Bateau", "Nosy Be").unwrap();
        assert_eq!(nosy_be.base_price, dec!(0));

        let sakatia = catalog.find("Balneaire", "Eco", "Bateau", "Sakatia").unwrap();
        assert_eq!(sakatia.base_price, dec!(0));
    }

    #[test]
    fn test_find_first_match_wins() {
        let catalog = sample();
        let entry = catalog.find("Aventure", "Confort", "4x4", "Grand Nord").unwrap();
        assert_eq!(entry.base_price, dec!(450));
    }

    #[test]
    fn test_find_not_found() {
        let catalog = sample();
        let err = catalog.find("Aventure", "Luxe", "4x4", "Grand Nord").unwrap_err();
        assert!(matches!(err, PricingError::NotFound { .. }));

        let empty = Catalog::default();
        assert!(empty.find("Aventure", "Confort", "4x4", "Grand Nord").is_err());
    }

    #[test]
    fn test_cascade_filters_sorted_and_distinct() {
        let catalog = sample();
        assert_eq!(catalog.categories(), vec!["Aventure", "Balneaire"]);
        assert_eq!(catalog.packages("Aventure"), vec!["Confort", "Eco"]);
        assert_eq!(catalog.transports("Aventure", "Confort"), vec!["4x4"]);
        assert_eq!(catalog.routes("Aventure", "Confort", "4x4"), vec!["Grand Nord", "Tsingy"]);
        assert!(catalog.packages("Croisiere").is_empty());
    }

    #[test]
    fn test_missing_column_rejected() {
        let csv = "Type,Formule,Circuit,Prix\nAventure,Confort,Grand Nord,450\n";
        let err = Catalog::from_reader(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Transport"));
    }

    #[test]
    fn test_columns_in_any_order() {
        let csv = "Prix,Circuit,Transport,Formule,Type\n120,Ankarana,4x4,Eco,Aventure\n";
        let catalog = Catalog::from_reader(csv.as_bytes()).unwrap();
        let entry = catalog.find("Aventure", "Eco", "4x4", "Ankarana").unwrap();
        assert_eq!(entry.base_price, dec!(120));
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price(" 450 "), Some(dec!(450)));
        assert_eq!(parse_price("1e3"), Some(dec!(1000)));
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("n/a"), None);
    }
}
