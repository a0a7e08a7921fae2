//! Request DTOs for pricing API endpoints.

use serde::Deserialize;

use super::models::{OptionCatalog, QuoteRequest};
use super::services::PricingError;

/// Package choice plus quote parameters, as posted by the form
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteFormRequest {
    pub category: String,
    pub package: String,
    pub transport: String,
    pub route: String,
    #[serde(default = "default_headcount")]
    pub headcount: i64,
    #[serde(default = "default_day_count")]
    pub day_count: i64,
    #[serde(default)]
    pub margin_percent: Option<i32>,
    #[serde(default)]
    pub options: Vec<String>,
}

fn default_headcount() -> i64 {
    2
}

fn default_day_count() -> i64 {
    3
}

impl QuoteFormRequest {
    /// Calculator input: headcount and days raised to at least 1, option
    /// keys resolved in the order given.
    ///
    /// Counts above [`MAX_COUNT`] are rejected.
    pub fn to_quote_request(
        &self,
        options: &OptionCatalog,
        default_margin: i32,
    ) -> Result<QuoteRequest, PricingError> {
        Ok(QuoteRequest {
            headcount: bounded_count("headcount", self.headcount)?,
            day_count: bounded_count("day_count", self.day_count)?,
            margin_percent: self.margin_percent.unwrap_or(default_margin),
            selections: options.resolve(&self.options)?,
        })
    }
}

/// Largest headcount or day count a quote accepts
pub const MAX_COUNT: u32 = 999;

fn bounded_count(field: &str, value: i64) -> Result<u32, PricingError> {
    if value > i64::from(MAX_COUNT) {
        return Err(PricingError::Validation {
            field: field.to_string(),
            message: format!("must be at most {}", MAX_COUNT),
        });
    }
    Ok(value.max(1) as u32)
}

/// Request to issue a quote
#[derive(Debug, Clone, Deserialize)]
pub struct IssueQuoteRequest {
    #[serde(flatten)]
    pub quote: QuoteFormRequest,
    #[serde(default)]
    pub client: String,
    #[serde(default)]
    pub contact: String,
}

/// Query for the cascading catalog selects
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub package: String,
    #[serde(default)]
    pub transport: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(headcount: i64, day_count: i64) -> QuoteFormRequest {
        QuoteFormRequest {
            category: "Aventure".to_string(),
            package: "Confort".to_string(),
            transport: "4x4".to_string(),
            route: "Grand Nord".to_string(),
            headcount,
            day_count,
            margin_percent: None,
            options: vec!["guide".to_string()],
        }
    }

    #[test]
    fn test_counts_clamped_to_one() {
        let request = form(0, -4).to_quote_request(&OptionCatalog::default(), 20).unwrap();
        assert_eq!(request.headcount, 1);
        assert_eq!(request.day_count, 1);
    }

    #[test]
    fn test_counts_above_limit_rejected() {
        let err = form(1000, 3).to_quote_request(&OptionCatalog::default(), 20).unwrap_err();
        assert!(matches!(err, PricingError::Validation { ref field, .. } if field == "headcount"));

        let err = form(2, i64::MAX).to_quote_request(&OptionCatalog::default(), 20).unwrap_err();
        assert!(matches!(err, PricingError::Validation { ref field, .. } if field == "day_count"));

        let request = form(999, 999).to_quote_request(&OptionCatalog::default(), 20).unwrap();
        assert_eq!(request.headcount, 999);
        assert_eq!(request.day_count, 999);
    }

    #[test]
    fn test_default_margin_used_when_absent() {
        let request = form(2, 3).to_quote_request(&OptionCatalog::default(), 20).unwrap();
        assert_eq!(request.margin_percent, 20);

        let mut with_margin = form(2, 3);
        with_margin.margin_percent = Some(0);
        let request = with_margin.to_quote_request(&OptionCatalog::default(), 20).unwrap();
        assert_eq!(request.margin_percent, 0);
    }

    #[test]
    fn test_issue_request_flattens_form() {
        let json = r#"{
            "category": "Aventure", "package": "Confort", "transport": "4x4",
            "route": "Grand Nord", "headcount": 4, "options": ["guide"],
            "client": "Dupont"
        }"#;
        let request: IssueQuoteRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.client, "Dupont");
        assert_eq!(request.contact, "");
        assert_eq!(request.quote.headcount, 4);
        assert_eq!(request.quote.day_count, 3);
        assert_eq!(request.quote.options, vec!["guide"]);
    }
}
