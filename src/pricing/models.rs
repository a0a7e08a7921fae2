//! Pricing models: billing modes, option catalog and quote inputs/outputs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::services::PricingError;

/// How an option's unit cost scales with the quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingMode {
    /// Flat fee, charged once per transaction (forfait)
    PerTransaction,
    /// Charged once per traveller
    PerPerson,
    /// Charged once per day of the trip
    PerDay,
}

impl BillingMode {
    /// Multiplier applied to the unit cost for this mode.
    pub fn multiplier(self, headcount: u32, day_count: u32) -> Decimal {
        match self {
            BillingMode::PerTransaction => Decimal::ONE,
            BillingMode::PerPerson => Decimal::from(headcount),
            BillingMode::PerDay => Decimal::from(day_count),
        }
    }

    /// Suffix shown after the option label on tickets ("(2 pax)", "(3j)").
    pub fn summary_suffix(self, headcount: u32, day_count: u32) -> Option<String> {
        match self {
            BillingMode::PerTransaction => None,
            BillingMode::PerPerson => Some(format!("({} pax)", headcount)),
            BillingMode::PerDay => Some(format!("({}j)", day_count)),
        }
    }
}

/// Display group of an option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionGroup {
    Sites,
    Staff,
    Logistics,
}

/// A configured add-on. Unit cost is in the secondary currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionDefinition {
    pub key: String,
    pub label: String,
    pub group: OptionGroup,
    #[serde(with = "rust_decimal::serde::str")]
    pub unit_cost: Decimal,
    pub billing_mode: BillingMode,
}

impl OptionDefinition {
    fn new(key: &str, label: &str, group: OptionGroup, unit_cost: i64, billing_mode: BillingMode) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            group,
            unit_cost: Decimal::from(unit_cost),
            billing_mode,
        }
    }

    /// Turn the definition into a selection for a quote
    pub fn select(&self) -> OptionSelection {
        OptionSelection {
            label: self.label.clone(),
            unit_cost: self.unit_cost,
            billing_mode: self.billing_mode,
        }
    }
}

/// The set of add-ons offered on the quoting form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionCatalog {
    pub options: Vec<OptionDefinition>,
}

impl OptionCatalog {
    pub fn new(options: Vec<OptionDefinition>) -> Self {
        Self { options }
    }

    /// Parse an option catalog from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn get(&self, key: &str) -> Option<&OptionDefinition> {
        self.options.iter().find(|o| o.key == key)
    }

    /// Resolve option keys into selections, keeping the caller's order.
    pub fn resolve(&self, keys: &[String]) -> Result<Vec<OptionSelection>, PricingError> {
        keys.iter()
            .map(|key| {
                self.get(key)
                    .map(OptionDefinition::select)
                    .ok_or_else(|| PricingError::UnknownOption { key: key.clone() })
            })
            .collect()
    }
}

impl Default for OptionCatalog {
    fn default() -> Self {
        use BillingMode::*;
        use OptionGroup::*;

        Self::new(vec![
            OptionDefinition::new("montagne_ambre", "Montagne d'Ambre", Sites, 55_000, PerPerson),
            OptionDefinition::new("tsingy_rouge", "Tsingy Rouge", Sites, 35_000, PerPerson),
            OptionDefinition::new("ankarana", "Ankarana", Sites, 65_000, PerPerson),
            OptionDefinition::new("guide", "Guide", Staff, 100_000, PerDay),
            OptionDefinition::new("cuisinier", "Cuisinier", Staff, 30_000, PerDay),
            OptionDefinition::new("location_voiture", "Location voiture", Logistics, 300_000, PerDay),
            OptionDefinition::new("carburant", "Carburant", Logistics, 1_200_000, PerTransaction),
            OptionDefinition::new("transfert_hotel", "Transfert hôtel", Logistics, 200_000, PerTransaction),
        ])
    }
}

/// A chosen add-on as it enters the calculator
#[derive(Debug, Clone, PartialEq)]
pub struct OptionSelection {
    pub label: String,
    pub unit_cost: Decimal,
    pub billing_mode: BillingMode,
}

/// Calculator input.
///
/// `headcount` and `day_count` must be at least 1; the request layer clamps
/// them and the calculator does not re-check.
#[derive(Debug, Clone)]
pub struct QuoteRequest {
    pub headcount: u32,
    pub day_count: u32,
    pub margin_percent: i32,
    pub selections: Vec<OptionSelection>,
}

impl QuoteRequest {
    /// Comma-separated option labels for tickets and history.
    pub fn options_summary(&self) -> String {
        self.selections
            .iter()
            .map(|s| match s.billing_mode.summary_suffix(self.headcount, self.day_count) {
                Some(suffix) => format!("{} {}", s.label, suffix),
                None => s.label.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Calculator output. All amounts are unrounded.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteResult {
    pub supplement_secondary: Decimal,
    pub supplement_primary: Decimal,
    pub subtotal: Decimal,
    pub primary_total: Decimal,
    pub secondary_total: Decimal,
}
