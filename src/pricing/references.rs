//! Transaction references and legacy-encoding text cleanup.

use super::services::PricingError;

/// Characters the ticket printer's 8-bit encoding cannot take, with their
/// ASCII stand-ins. Every replacement is a single char.
const LEGACY_REPLACEMENTS: &[(char, char)] = &[
    ('é', 'e'), ('è', 'e'), ('ê', 'e'), ('ë', 'e'),
    ('à', 'a'), ('â', 'a'), ('ä', 'a'),
    ('î', 'i'), ('ï', 'i'),
    ('ô', 'o'), ('ö', 'o'),
    ('ù', 'u'), ('û', 'u'), ('ü', 'u'),
    ('ç', 'c'),
    ('É', 'E'), ('È', 'E'), ('Ê', 'E'), ('Ë', 'E'),
    ('À', 'A'), ('Â', 'A'),
    ('Î', 'I'), ('Ï', 'I'),
    ('Ô', 'O'),
    ('Ù', 'U'), ('Û', 'U'),
    ('Ç', 'C'),
    ('\u{2019}', '\''), ('\u{2018}', '\''),
    ('\u{2013}', '-'), ('\u{2014}', '-'),
];

/// Replace accented letters, typographic quotes and dashes with ASCII.
///
/// Only for text going into a rendered document; stored data keeps the
/// original characters.
pub fn sanitize_for_legacy_encoding(text: &str) -> String {
    text.chars()
        .map(|c| {
            LEGACY_REPLACEMENTS
                .iter()
                .find(|(from, _)| *from == c)
                .map(|(_, to)| *to)
                .unwrap_or(c)
        })
        .collect()
}

/// Encode sanitized text as Latin-1; anything outside it becomes `?`.
pub fn encode_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

/// Client name as it appears in a reference: sanitized, trimmed and upper
/// case, with every character outside `[A-Z0-9_-]` turned into `_`.
///
/// References travel as a single URL path segment, so `/`, `?` and `#`
/// must never reach them.
pub fn reference_client_part(client_name: &str) -> String {
    sanitize_for_legacy_encoding(client_name.trim())
        .to_uppercase()
        .chars()
        .map(|c| match c {
            'A'..='Z' | '0'..='9' | '-' | '_' => c,
            _ => '_',
        })
        .collect()
}

/// Build the reference for the next transaction.
///
/// `D` + (existing_count + 1, zero padded to `digits`) + `-` + client part,
/// e.g. `D000012-DUPONT`. Two callers reading the same count get the same
/// reference; [`crate::history::History::issue`] serializes that read.
pub fn generate_reference(
    prefix: char,
    existing_count: usize,
    client_name: &str,
    digits: usize,
) -> Result<String, PricingError> {
    if client_name.trim().is_empty() {
        return Err(PricingError::Validation {
            field: "client".to_string(),
            message: "Client name is required".to_string(),
        });
    }

    Ok(format!(
        "{}{:0width$}-{}",
        prefix,
        existing_count + 1,
        reference_client_part(client_name),
        width = digits
    ))
}

/// Invoice reference for a quote reference: the leading quote prefix is
/// swapped for the invoice prefix and nothing else changes.
pub fn derive_invoice_reference(
    quote_reference: &str,
    quote_prefix: char,
    invoice_prefix: char,
) -> Result<String, PricingError> {
    let rest = quote_reference
        .strip_prefix(quote_prefix)
        .ok_or_else(|| PricingError::InvalidReference {
            reference: quote_reference.to_string(),
            expected_prefix: quote_prefix,
        })?;

    Ok(format!("{}{}", invoice_prefix, rest))
}

/// Counter part of a reference (`D000012-DUPONT` → 12).
pub fn reference_number(reference: &str) -> Option<u64> {
    let mut chars = reference.chars();
    chars.next()?;
    let digits: String = chars.take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}
