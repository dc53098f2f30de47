//! Old market price index (vanhojen osakeasuntojen hintaindeksi), used for
//! apartments completed before 2011.

use anyhow::{bail, Result};
use tracing::warn;

use crate::fetch::PdfClient;
use crate::indices::parse_number;
use crate::types::{latest_value, IndexTable};

pub const OLD_INDEX_PDF_URL: &str =
    "https://www.hel.fi/static/kv/asunto-osasto/hitas-markkinahintaindeksi.pdf";

const MIN_YEAR: i32 = 1978;
const MAX_YEAR: i32 = 2100;

/// The year column sits within the first few cells of a row
const YEAR_SEARCH_COLUMNS: usize = 3;

fn parse_year(token: &str) -> Option<i32> {
    if token.len() != 4 || !token.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let year: i32 = token.parse().ok()?;
    (MIN_YEAR..=MAX_YEAR).contains(&year).then_some(year)
}

/// Parse the `V/KK | 1 | 2 | ... | 12` table from the PDF text.
///
/// A row is any line with a year among its first cells; the numeric cells
/// after it fill months 1..=12. The same year can show up again after a page
/// break: months already holding an equal value are stepped over and months
/// holding a different value keep the earlier one.
pub fn parse_old_market_index(text: &str) -> IndexTable {
    let mut indices = IndexTable::new();

    for line in text.lines() {
        let cells: Vec<&str> = line
            .split(|c: char| c.is_whitespace() || c == '|')
            .filter(|c| !c.is_empty())
            .collect();
        if cells.len() < 2 {
            continue;
        }

        let Some((year_idx, year)) = cells
            .iter()
            .take(YEAR_SEARCH_COLUMNS)
            .enumerate()
            .find_map(|(i, cell)| parse_year(cell).map(|y| (i, y)))
        else {
            continue;
        };

        let months = indices.entry(year).or_default();
        let mut month = 1u32;
        for value in cells[year_idx + 1..].iter().filter_map(|c| parse_number(c)) {
            if month > 12 {
                break;
            }
            match months.get(&month) {
                None => {
                    months.insert(month, value);
                    month += 1;
                }
                Some(existing) if *existing == value => month += 1,
                Some(_) => {}
            }
        }
    }

    indices.retain(|_, months| !months.is_empty());
    indices
}

/// Download and parse the old market price index; empty on any failure
pub fn get_old_market_index(client: &PdfClient) -> IndexTable {
    let Some(pages) = client.download_pages(OLD_INDEX_PDF_URL, "Old market index") else {
        return IndexTable::new();
    };

    println!("Parsing old market index PDF...");
    let indices = parse_old_market_index(&pages.join("\n"));

    println!("Parsed old market index: {} years", indices.len());
    if let (Some(min_year), Some(max_year)) = (indices.keys().next(), indices.keys().next_back()) {
        println!("  Year range: {} - {}", min_year, max_year);
    }
    match latest_value(&indices) {
        Some((year, month, value)) => println!("  Latest: {}/{} = {}", month, year, value),
        None => warn!("No rows found in old market index PDF"),
    }

    indices
}

/// `old-index` subcommand: fetch the table and print the latest years
pub fn run_old_index() -> Result<()> {
    let client = PdfClient::new()?;
    let indices = get_old_market_index(&client);

    if indices.is_empty() {
        bail!("Failed to import old market index");
    }

    println!("\nTotal years: {}", indices.len());
    println!("\nSample values:");
    for (year, months) in indices.iter().rev().take(3) {
        println!("\n{}:", year);
        for (month, value) in months {
            println!("  Month {}: {}", month, value);
        }
    }

    Ok(())
}
