//! Pricing engine module for the quoting desk.
//!
//! Turns a catalog row plus selected options into a price pair, and issues
//! the reference the transaction is filed and printed under.

pub mod calculators;
pub mod models;
pub mod references;
pub mod requests;
pub mod responses;
pub mod routes;
pub mod services;

// Re-export commonly used items
pub use calculators::{compute_quote, format_grouped, round_money, ExchangeRate};
pub use models::{BillingMode, OptionCatalog, OptionSelection, QuoteRequest, QuoteResult};
pub use references::{derive_invoice_reference, generate_reference, sanitize_for_legacy_encoding};
pub use routes::router;
pub use services::{PricingError, QuoteBreakdown};
