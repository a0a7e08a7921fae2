//! Core pricing calculation functions.
//!
//! Pure functions for pricing math - no I/O.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::catalog::CatalogEntry;

use super::models::{QuoteRequest, QuoteResult};
use super::services::PricingError;

/// Secondary-currency units per primary-currency unit (Ariary per Euro).
///
/// Only positive rates can be constructed, so conversions never divide by
/// zero or flip signs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExchangeRate(Decimal);

impl ExchangeRate {
    pub fn new(rate: Decimal) -> Result<Self, PricingError> {
        if rate <= Decimal::ZERO {
            return Err(PricingError::InvalidExchangeRate { rate });
        }
        Ok(Self(rate))
    }

    pub fn value(self) -> Decimal {
        self.0
    }

    /// `None` when the result does not fit in a `Decimal`
    pub fn to_primary(self, secondary: Decimal) -> Option<Decimal> {
        secondary.checked_div(self.0)
    }

    /// `None` when the result does not fit in a `Decimal`
    pub fn to_secondary(self, primary: Decimal) -> Option<Decimal> {
        primary.checked_mul(self.0)
    }
}

/// Round to specified decimal places using banker's rounding (ROUND_HALF_EVEN).
///
/// The result always carries exactly `places` decimals, so `240` at 2 places
/// prints as `240.00`.
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use tour_quotes::pricing::round_money;
///
/// assert_eq!(round_money(dec!(2.5), 0), dec!(2));   // rounds to even
/// assert_eq!(round_money(dec!(3.5), 0), dec!(4));   // rounds to even
/// assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
/// ```
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(places);
    rounded
}

/// Format an amount with comma thousands separators, rounded to `places`.
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use tour_quotes::pricing::format_grouped;
///
/// assert_eq!(format_grouped(dec!(1234567.891), 2), "1,234,567.89");
/// assert_eq!(format_grouped(dec!(1200000), 0), "1,200,000");
/// ```
pub fn format_grouped(amount: Decimal, places: u32) -> String {
    let rounded = round_money(amount, places);
    let text = format!("{:.*}", places as usize, rounded.abs());
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(text.len() + int_part.len() / 3 + 1);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

/// Total cost of the selected options, in the secondary currency.
pub fn supplement_secondary(request: &QuoteRequest) -> Result<Decimal, PricingError> {
    request.selections.iter().try_fold(Decimal::ZERO, |total, s| {
        s.unit_cost
            .checked_mul(s.billing_mode.multiplier(request.headcount, request.day_count))
            .and_then(|cost| total.checked_add(cost))
            .ok_or_else(|| overflow("supplement"))
    })
}

/// Compute the final price pair for a catalog entry and a set of options.
///
/// 1. supplement (secondary) = Σ unit_cost × multiplier(billing mode)
/// 2. supplement (primary) = supplement / rate
/// 3. subtotal = (base price + supplement) × headcount
/// 4. total = subtotal × (1 + margin / 100)
/// 5. secondary total = total × rate
///
/// Nothing is rounded here; use [`round_money`] when persisting or displaying.
/// Every step is checked, so amounts too large for a `Decimal` come back as
/// [`PricingError::Overflow`].
pub fn compute_quote(
    entry: &CatalogEntry,
    request: &QuoteRequest,
    rate: ExchangeRate,
) -> Result<QuoteResult, PricingError> {
    let supplement_secondary = supplement_secondary(request)?;
    let supplement_primary = rate
        .to_primary(supplement_secondary)
        .ok_or_else(|| overflow("supplement"))?;

    let subtotal = entry
        .base_price
        .checked_add(supplement_primary)
        .and_then(|unit| unit.checked_mul(Decimal::from(request.headcount)))
        .ok_or_else(|| overflow("subtotal"))?;

    let margin_factor = Decimal::ONE + Decimal::from(request.margin_percent) / Decimal::ONE_HUNDRED;
    let primary_total = subtotal
        .checked_mul(margin_factor)
        .ok_or_else(|| overflow("total"))?;
    let secondary_total = rate
        .to_secondary(primary_total)
        .ok_or_else(|| overflow("converted total"))?;

    Ok(QuoteResult {
        supplement_secondary,
        supplement_primary,
        subtotal,
        primary_total,
        secondary_total,
    })
}

fn overflow(step: &str) -> PricingError {
    PricingError::Overflow {
        step: step.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::models::{BillingMode, OptionSelection};
    use rust_decimal_macros::dec;

    fn entry(base_price: Decimal) -> CatalogEntry {
        CatalogEntry {
            category: "Aventure".to_string(),
            package: "Confort".to_string(),
            transport_mode: "4x4".to_string(),
            route: "Grand Nord".to_string(),
            base_price,
        }
    }

    fn rate() -> ExchangeRate {
        ExchangeRate::new(dec!(5000)).unwrap()
    }

    fn option(unit_cost: Decimal, billing_mode: BillingMode) -> OptionSelection {
        OptionSelection {
            label: "Option".to_string(),
            unit_cost,
            billing_mode,
        }
    }

    fn request(headcount: u32, day_count: u32, margin_percent: i32, selections: Vec<OptionSelection>) -> QuoteRequest {
        QuoteRequest {
            headcount,
            day_count,
            margin_percent,
            selections,
        }
    }

    // ==================== round_money tests ====================

    #[test]
    fn test_round_money_bankers_rounding_to_even() {
        assert_eq!(round_money(dec!(2.5), 0), dec!(2));
        assert_eq!(round_money(dec!(3.5), 0), dec!(4));
        assert_eq!(round_money(dec!(2.45), 1), dec!(2.4));
        assert_eq!(round_money(dec!(2.55), 1), dec!(2.6));
    }

    #[test]
    fn test_round_money_normal_rounding() {
        assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
        assert_eq!(round_money(dec!(1.236), 2), dec!(1.24));
        assert_eq!(round_money(dec!(123456.789), 2), dec!(123456.79));
    }

    #[test]
    fn test_round_money_pads_scale() {
        assert_eq!(round_money(dec!(240), 2).to_string(), "240.00");
        assert_eq!(round_money(dec!(1200000.0000), 0).to_string(), "1200000");
    }

    // ==================== format_grouped tests ====================

    #[test]
    fn test_format_grouped() {
        assert_eq!(format_grouped(dec!(240), 2), "240.00");
        assert_eq!(format_grouped(dec!(1234.5), 2), "1,234.50");
        assert_eq!(format_grouped(dec!(1200000), 0), "1,200,000");
        assert_eq!(format_grouped(dec!(999.995), 2), "1,000.00");
        assert_eq!(format_grouped(dec!(-1234.5), 0), "-1,234");
        assert_eq!(format_grouped(dec!(0), 2), "0.00");
    }

    // ==================== ExchangeRate tests ====================

    #[test]
    fn test_exchange_rate_rejects_zero_and_negative() {
        assert!(matches!(
            ExchangeRate::new(dec!(0)),
            Err(PricingError::InvalidExchangeRate { .. })
        ));
        assert!(matches!(
            ExchangeRate::new(dec!(-5000)),
            Err(PricingError::InvalidExchangeRate { .. })
        ));
        assert_eq!(ExchangeRate::new(dec!(5000)).unwrap().value(), dec!(5000));
    }

    // ==================== compute_quote tests ====================

    #[test]
    fn test_compute_quote_no_options_with_margin() {
        let result = compute_quote(&entry(dec!(100)), &request(2, 3, 20, vec![]), rate()).unwrap();

        assert_eq!(result.supplement_secondary, dec!(0));
        assert_eq!(result.subtotal, dec!(200));
        assert_eq!(round_money(result.primary_total, 2), dec!(240.00));
        assert_eq!(result.secondary_total, dec!(1200000));
    }

    #[test]
    fn test_compute_quote_per_day_option() {
        let selections = vec![option(dec!(30000), BillingMode::PerDay)];
        let result = compute_quote(&entry(dec!(50)), &request(1, 3, 0, selections), rate()).unwrap();

        assert_eq!(result.supplement_secondary, dec!(90000));
        assert_eq!(result.supplement_primary, dec!(18));
        assert_eq!(round_money(result.primary_total, 2), dec!(68.00));
    }

    #[test]
    fn test_compute_quote_per_person_and_flat_options() {
        let selections = vec![
            option(dec!(55000), BillingMode::PerPerson),
            option(dec!(200000), BillingMode::PerTransaction),
        ];
        let result = compute_quote(&entry(dec!(300)), &request(2, 4, 10, selections), rate()).unwrap();

        // 55000*2 + 200000 = 310000 Ar = 62 EUR
        assert_eq!(result.supplement_secondary, dec!(310000));
        assert_eq!(result.supplement_primary, dec!(62));
        // (300 + 62) * 2 = 724, * 1.1 = 796.4
        assert_eq!(result.subtotal, dec!(724));
        assert_eq!(result.primary_total, dec!(796.4));
    }

    #[test]
    fn test_compute_quote_secondary_is_primary_times_rate() {
        let rate = ExchangeRate::new(dec!(4987.35)).unwrap();
        for (base, headcount, days, margin) in [
            (dec!(0), 1, 1, 0),
            (dec!(17.33), 3, 7, 15),
            (dec!(1250.5), 12, 2, 100),
        ] {
            let selections = vec![
                option(dec!(12345), BillingMode::PerDay),
                option(dec!(777), BillingMode::PerPerson),
            ];
            let result = compute_quote(&entry(base), &request(headcount, days, margin, selections), rate).unwrap();
            assert_eq!(result.secondary_total, result.primary_total * rate.value());
        }
    }

    #[test]
    fn test_compute_quote_huge_amounts_are_an_error() {
        let selections = vec![option(dec!(300000), BillingMode::PerDay)];
        let result = compute_quote(
            &entry(dec!(100)),
            &request(u32::MAX, u32::MAX, i32::MAX, selections),
            rate(),
        );
        assert!(matches!(result, Err(PricingError::Overflow { .. })));

        let selections = vec![option(Decimal::MAX, BillingMode::PerPerson)];
        let result = compute_quote(&entry(dec!(100)), &request(2, 1, 0, selections), rate());
        assert!(matches!(result, Err(PricingError::Overflow { .. })));
    }

    #[test]
    fn test_exchange_rate_conversions_checked() {
        assert_eq!(rate().to_secondary(dec!(240)), Some(dec!(1200000)));
        assert_eq!(rate().to_primary(dec!(1200000)), Some(dec!(240)));
        assert_eq!(rate().to_secondary(Decimal::MAX), None);
    }

    #[test]
    fn test_compute_quote_zero_selections_formula() {
        let result = compute_quote(&entry(dec!(75.25)), &request(3, 5, 35, vec![]), rate()).unwrap();
        assert_eq!(result.primary_total, dec!(75.25) * dec!(3) * dec!(1.35));
    }

    #[test]
    fn test_compute_quote_keeps_full_precision() {
        // 10000 / 3 leaves a repeating fraction; only the display rounds it
        let rate = ExchangeRate::new(dec!(3)).unwrap();
        let selections = vec![option(dec!(10000), BillingMode::PerTransaction)];
        let result = compute_quote(&entry(dec!(0)), &request(3, 1, 0, selections), rate).unwrap();

        assert_ne!(result.supplement_primary, round_money(result.supplement_primary, 2));
        assert_eq!(round_money(result.primary_total, 2), dec!(10000.00));
    }

    #[test]
    fn test_compute_quote_margin_outside_range_applied_verbatim() {
        let result = compute_quote(&entry(dec!(100)), &request(1, 1, 150, vec![]), rate()).unwrap();
        assert_eq!(result.primary_total, dec!(250));

        let result = compute_quote(&entry(dec!(100)), &request(1, 1, -10, vec![]), rate()).unwrap();
        assert_eq!(result.primary_total, dec!(90));
    }
}
