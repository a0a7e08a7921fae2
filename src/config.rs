//! Runtime configuration from the environment (and `.env` via dotenvy).

use rust_decimal::Decimal;
use std::path::PathBuf;
use std::str::FromStr;

use crate::document::AgencyInfo;
use crate::history::Numbering;
use crate::pricing::ExchangeRate;

/// Startup configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} is not a valid number: {value}")]
    InvalidNumber { name: &'static str, value: String },

    #[error("EXCHANGE_RATE must be positive, got {0}")]
    InvalidExchangeRate(Decimal),

    #[error("{name} must be a single ASCII letter, got '{value}'")]
    InvalidPrefix { name: &'static str, value: String },

    #[error("QUOTE_PREFIX and INVOICE_PREFIX must differ")]
    SamePrefixes,

    #[error("unknown HISTORY_BACKEND '{0}' (expected csv, postgres or memory)")]
    UnknownBackend(String),

    #[error("DATABASE_URL is required for the postgres history backend")]
    MissingDatabaseUrl,
}

/// Where quote history is kept
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryBackend {
    Csv(PathBuf),
    Postgres(String),
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub data_file: PathBuf,
    pub options_file: Option<PathBuf>,
    pub history_backend: HistoryBackend,
    pub exchange_rate: ExchangeRate,
    pub primary_currency: String,
    pub secondary_currency: String,
    pub quote_prefix: char,
    pub invoice_prefix: char,
    pub reference_digits: usize,
    pub default_margin: i32,
    pub agency: AgencyInfo,
}

impl Config {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load through an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let or = |name: &str, default: &str| var(name).unwrap_or_else(|| default.to_string());

        let rate: Decimal = parse(&var, "EXCHANGE_RATE", Decimal::from(5000))?;
        let exchange_rate = ExchangeRate::new(rate).map_err(|_| ConfigError::InvalidExchangeRate(rate))?;

        let quote_prefix = prefix(&var, "QUOTE_PREFIX", 'D')?;
        let invoice_prefix = prefix(&var, "INVOICE_PREFIX", 'F')?;
        if quote_prefix == invoice_prefix {
            return Err(ConfigError::SamePrefixes);
        }

        let history_backend = match or("HISTORY_BACKEND", "csv").to_lowercase().as_str() {
            "csv" => HistoryBackend::Csv(PathBuf::from(or("HIST_FILE", "historique_devis.csv"))),
            "postgres" => HistoryBackend::Postgres(var("DATABASE_URL").ok_or(ConfigError::MissingDatabaseUrl)?),
            "memory" => HistoryBackend::Memory,
            other => return Err(ConfigError::UnknownBackend(other.to_string())),
        };

        let defaults = AgencyInfo::default();

        Ok(Self {
            bind_addr: or("BIND_ADDR", "0.0.0.0:8080"),
            data_file: PathBuf::from(or("DATA_FILE", "data.csv")),
            options_file: var("OPTIONS_FILE").map(PathBuf::from),
            history_backend,
            exchange_rate,
            primary_currency: or("PRIMARY_CURRENCY", "EUR"),
            secondary_currency: or("SECONDARY_CURRENCY", "Ar"),
            quote_prefix,
            invoice_prefix,
            reference_digits: parse(&var, "REFERENCE_DIGITS", 6usize)?,
            default_margin: parse(&var, "DEFAULT_MARGIN", 20i32)?,
            agency: AgencyInfo {
                name: var("AGENCY_NAME").unwrap_or(defaults.name),
                address: var("AGENCY_ADDRESS").unwrap_or(defaults.address),
                phone: var("AGENCY_PHONE").unwrap_or(defaults.phone),
            },
        })
    }

    pub fn numbering(&self) -> Numbering {
        Numbering {
            quote_prefix: self.quote_prefix,
            digits: self.reference_digits,
        }
    }
}

fn parse<T, V>(var: &V, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    V: Fn(&str) -> Option<String>,
{
    match var(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
        None => Ok(default),
    }
}

fn prefix<V>(var: &V, name: &'static str, default: char) -> Result<char, ConfigError>
where
    V: Fn(&str) -> Option<String>,
{
    let Some(value) = var(name) else {
        return Ok(default);
    };
    let mut chars = value.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => Ok(c.to_ascii_uppercase()),
        _ => Err(ConfigError::InvalidPrefix { name, value }),
    }
}
