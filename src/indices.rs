//! Construction cost and market price index tables (2005 = 100)

use crate::types::IndexTable;
use std::collections::BTreeMap;

pub const INDICES_PDF_URL: &str =
    "https://www.hel.fi/static/kv/asunto-osasto/hitas-indeksit-2005-100.pdf";

const RAKENNUSKUSTANNUS_HEADING: &str = "Rakennuskustannusindeksi";
const MARKKINAHINTA_HEADING: &str = "Markkinahintaindeksi";

const TABLE_START: &str = "Vuosi/kk";
const TABLE_END_MARKERS: &[&str] = &["Lähde:", "Helsinki"];

const MIN_YEAR: i32 = 2005;
const MAX_YEAR: i32 = 2100;

/// Parse a numeric table cell.
///
/// Provisional values are printed in parentheses, e.g. `(104.2)`, and some
/// tables use a decimal comma.
pub fn parse_number(token: &str) -> Option<f64> {
    let token = token
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .unwrap_or(token);
    let value: f64 = token.replace(',', ".").parse().ok()?;
    value.is_finite().then_some(value)
}

/// Parse one index table from the extracted text of its section.
///
/// The table body starts after a `Vuosi/kk` header line and ends at the source
/// line. Every row is a year followed by up to twelve monthly values.
pub fn parse_index_table(text: &str) -> IndexTable {
    let mut indices = IndexTable::new();
    let mut in_table = false;

    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }

        if line.contains(TABLE_START) {
            in_table = true;
            continue;
        }

        if TABLE_END_MARKERS.iter().any(|m| line.contains(m)) {
            in_table = false;
            continue;
        }

        if !in_table {
            continue;
        }

        let mut parts = line.split_whitespace();
        let Some(year) = parts.next().and_then(|p| p.parse::<i32>().ok()) else {
            continue;
        };
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            continue;
        }

        let months: BTreeMap<u32, f64> = parts
            .filter_map(parse_number)
            .take(12)
            .zip(1..)
            .map(|(value, month)| (month, value))
            .collect();

        if !months.is_empty() {
            indices.insert(year, months);
        }
    }

    indices
}

/// Text between the first occurrence of `heading` and the next occurrence of `until`
fn section<'a>(text: &'a str, heading: &str, until: &str) -> Option<&'a str> {
    let rest = text.split(heading).nth(1)?;
    Some(rest.split(until).next().unwrap_or(rest))
}

/// Extract both index tables from the full text of the index PDF.
///
/// Returns `(rakennuskustannusindeksi, markkinahintaindeksi)`; either may be
/// empty when its heading is missing.
pub fn extract_indices(full_text: &str) -> (IndexTable, IndexTable) {
    let rakennuskustannus = section(full_text, RAKENNUSKUSTANNUS_HEADING, MARKKINAHINTA_HEADING)
        .map(parse_index_table)
        .unwrap_or_default();
    println!("Parsed {}: {} years", RAKENNUSKUSTANNUS_HEADING, rakennuskustannus.len());

    let markkinahinta = section(full_text, MARKKINAHINTA_HEADING, MARKKINAHINTA_HEADING)
        .map(parse_index_table)
        .unwrap_or_default();
    println!("Parsed {}: {} years", MARKKINAHINTA_HEADING, markkinahinta.len());

    (rakennuskustannus, markkinahinta)
}
