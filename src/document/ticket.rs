//! 80 mm thermal ticket, rendered as fixed-width Latin-1 text.

use askama::Template;

use super::{AgencyInfo, DocumentPayload, DocumentSink};
use crate::error::Result;
use crate::pricing::calculators::{format_grouped, ExchangeRate};
use crate::pricing::PricingError;
use crate::pricing::references::{encode_latin1, sanitize_for_legacy_encoding};

/// Printable width in characters
const WIDTH: usize = 45;

#[derive(Template)]
#[template(path = "ticket.txt")]
struct TicketTemplate {
    header: Vec<String>,
    rule: String,
    title: String,
    date: String,
    reference_lines: Vec<String>,
    client_lines: Vec<String>,
    contact_lines: Vec<String>,
    circuit_lines: Vec<String>,
    pax_line: String,
    option_lines: Vec<String>,
    total_lines: Vec<String>,
    secondary_lines: Vec<String>,
    footer: String,
}

/// Thermal ticket printer output
#[derive(Debug, Clone)]
pub struct ThermalTicket {
    agency: AgencyInfo,
    rate: ExchangeRate,
    primary_currency: String,
    secondary_currency: String,
}

impl ThermalTicket {
    pub fn new(
        agency: AgencyInfo,
        rate: ExchangeRate,
        primary_currency: impl Into<String>,
        secondary_currency: impl Into<String>,
    ) -> Self {
        Self {
            agency,
            rate,
            primary_currency: primary_currency.into(),
            secondary_currency: secondary_currency.into(),
        }
    }

    /// Ticket as text, before Latin-1 encoding
    pub fn render_text(&self, payload: &DocumentPayload) -> Result<String> {
        let clean = |s: &str| sanitize_for_legacy_encoding(s);
        let optional = |label: &str, value: &str| {
            if value.is_empty() {
                Vec::new()
            } else {
                wrap(&clean(&format!("{} : {}", label, value)))
            }
        };

        let header = [
            clean(&self.agency.name),
            clean(&format!("Adresse : {}", self.agency.address)),
            clean(&format!("Téléphone : {}", self.agency.phone)),
        ]
        .iter()
        .flat_map(|line| centered(line))
        .collect();

        let converted = self
            .rate
            .to_secondary(payload.total)
            .ok_or_else(|| PricingError::Overflow {
                step: "converted total".to_string(),
            })?;

        let template = TicketTemplate {
            header,
            rule: "-".repeat(WIDTH),
            title: center(&payload.document_type.title().to_uppercase()),
            date: payload.issued_at.format("%d/%m/%Y %H:%M").to_string(),
            reference_lines: wrap(&format!("Ref : {}", clean(&payload.reference))),
            client_lines: wrap(&format!("Client : {}", clean(&payload.client))),
            contact_lines: optional("Contact", &payload.contact),
            circuit_lines: wrap(&clean(&format!("Circuit : {}", payload.circuit))),
            pax_line: format!("Pax : {} | Jours : {}", payload.headcount, payload.day_count),
            option_lines: optional("Options", &payload.options_text),
            total_lines: right_aligned(&format!(
                "TOTAL : {} {}",
                format_grouped(payload.total, 2),
                self.primary_currency
            )),
            secondary_lines: right_aligned(&clean(&format!(
                "Soit : {} {}",
                format_grouped(converted, 0),
                self.secondary_currency
            ))),
            footer: center("Merci de votre confiance !"),
        };

        Ok(template.render()?)
    }
}

impl DocumentSink for ThermalTicket {
    fn render(&self, payload: &DocumentPayload) -> Result<Vec<u8>> {
        let text = self.render_text(payload)?;
        tracing::debug!(reference = %payload.reference, bytes = text.len(), "Rendered ticket");
        Ok(encode_latin1(&text))
    }

    fn content_type(&self) -> &'static str {
        "text/plain; charset=iso-8859-1"
    }

    fn file_extension(&self) -> &'static str {
        "txt"
    }
}

fn center(text: &str) -> String {
    let len = text.chars().count();
    if len >= WIDTH {
        return text.to_string();
    }
    format!("{}{}", " ".repeat((WIDTH - len) / 2), text)
}

fn right(text: &str) -> String {
    format!("{:>width$}", text, width = WIDTH)
}

fn centered(text: &str) -> Vec<String> {
    wrap(text).iter().map(|line| center(line)).collect()
}

fn right_aligned(text: &str) -> Vec<String> {
    wrap(text).iter().map(|line| right(line)).collect()
}

/// Greedy word wrap to the ticket width; words longer than a line are split.
fn wrap(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > WIDTH {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            lines.push(word.drain(..WIDTH).collect());
        }
        let word: String = word.into_iter().collect();

        let word_len = word.chars().count();
        let needed = if current.is_empty() { word_len } else { current.chars().count() + 1 + word_len };
        if needed > WIDTH && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentType;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn ticket() -> ThermalTicket {
        ThermalTicket::new(
            AgencyInfo::default(),
            ExchangeRate::new(dec!(5000)).unwrap(),
            "EUR",
            "Ar",
        )
    }

    fn payload() -> DocumentPayload {
        DocumentPayload {
            document_type: DocumentType::Quote,
            issued_at: NaiveDate::from_ymd_opt(2024, 5, 2)
                .unwrap()
                .and_hms_opt(10, 15, 0)
                .unwrap(),
            circuit: "Ankify \u{2013} Hôtel de la Mer".to_string(),
            headcount: 2,
            day_count: 3,
            total: dec!(1234.5),
            client: "Hélène Dupont".to_string(),
            reference: "D000012-HELENE_DUPONT".to_string(),
            contact: "+261 34 11 222 33".to_string(),
            options_text: "Montagne d\u{2019}Ambre (2 pax), Guide (3j)".to_string(),
        }
    }

    #[test]
    fn test_render_text_layout() {
        let text = ticket().render_text(&payload()).unwrap();

        assert!(text.contains("Laka Am'lay"));
        assert!(text.contains("Adresse : Antsiranana - Madagascar"));
        assert!(text.contains("Telephone : +261 34 00 000 00"));
        assert!(text.contains("DEVIS"));
        assert!(text.contains("Date : 02/05/2024 10:15"));
        assert!(text.contains("Ref : D000012-HELENE_DUPONT"));
        assert!(text.contains("Client : Helene Dupont"));
        assert!(text.contains("Contact : +261 34 11 222 33"));
        assert!(text.contains("Circuit : Ankify - Hotel de la Mer"));
        assert!(text.contains("Pax : 2 | Jours : 3"));
        assert!(text.contains("Options : Montagne d'Ambre (2 pax), Guide\n(3j)"));
        assert!(text.contains("TOTAL : 1,234.50 EUR"));
        assert!(text.contains("Soit : 6,172,500 Ar"));
        assert!(text.contains("Merci de votre confiance !"));
    }

    #[test]
    fn test_render_is_ascii_and_fits_width() {
        let bytes = ticket().render(&payload()).unwrap();
        assert!(bytes.is_ascii());

        let text = String::from_utf8(bytes).unwrap();
        assert!(text.lines().all(|l| l.chars().count() <= WIDTH));
    }

    #[test]
    fn test_long_fields_wrap_within_width() {
        let mut payload = payload();
        payload.client = "Rasoanaivo Andrianarisoa Hélène Marie-Claire Rakotomalala".to_string();
        payload.reference = format!("D000012-{}", "RASOANAIVO_ANDRIANARISOA_HELENE_MARIE");
        payload.contact = "helene.rasoanaivo@example.mg / +261 34 11 222 33 / +261 32 00 000 00".to_string();

        let agency = AgencyInfo {
            name: "Laka Am'lay Tours et Excursions du Grand Nord de Madagascar".to_string(),
            ..AgencyInfo::default()
        };
        let ticket = ThermalTicket::new(agency, ExchangeRate::new(dec!(5000)).unwrap(), "EUR", "Ar");

        let text = ticket.render_text(&payload).unwrap();
        assert!(text.lines().all(|l| l.chars().count() <= WIDTH), "{}", text);
        assert!(text.contains("Client : Rasoanaivo Andrianarisoa Helene"));
        assert!(text.contains("Marie-Claire Rakotomalala"));
        assert!(text.contains("Ref :"));
        assert!(text.contains("RASOANAIVO_ANDRIANARISOA_HELENE_MARIE"));
    }

    #[test]
    fn test_optional_lines_omitted() {
        let mut payload = payload();
        payload.contact = String::new();
        payload.options_text = String::new();
        payload.document_type = DocumentType::Invoice;

        let text = ticket().render_text(&payload).unwrap();
        assert!(!text.contains("Contact :"));
        assert!(!text.contains("Options :"));
        assert!(text.contains("FACTURE"));
    }

    #[test]
    fn test_render_leaves_payload_untouched() {
        let payload = payload();
        ticket().render(&payload).unwrap();
        assert_eq!(payload.client, "Hélène Dupont");
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap("a b c"), vec!["a b c"]);
        assert!(wrap("").is_empty());

        let long = "word ".repeat(20);
        let lines = wrap(&long);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.chars().count() <= WIDTH));
        assert_eq!(lines.join(" "), long.trim());

        let giant = "x".repeat(100);
        let lines = wrap(&giant);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].len(), WIDTH);
    }

    #[test]
    fn test_center_and_right() {
        assert_eq!(center("DEVIS").len(), (WIDTH - 5) / 2 + 5);
        assert_eq!(right("TOTAL").len(), WIDTH);
        assert!(right("TOTAL").ends_with("TOTAL"));
    }
}
