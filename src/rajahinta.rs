//! Rajaneliöhinta: the HITAS price ceiling per square meter

use anyhow::{bail, Result};
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use tracing::warn;

use crate::fetch::PdfClient;
use crate::types::Rajaneliohinta;

pub const RAJAHINTA_PDF_URL: &str = "https://www.hel.fi/static/kv/asunto-osasto/hitas-rajahinta.pdf";

const DESCRIPTION: &str = "Kaikkien Hitas-yhtiöiden keskimääräisten neliöhintojen perusteella \
laskettu rajaneliöhinta. Päivitetään neljännesvuosittain.";

/// Start of the quarter whose validity ends in `valid_until`.
///
/// The price is republished in February, May, August and November and each
/// value stays in force for three months.
pub fn quarter_start(valid_until: NaiveDate) -> Option<NaiveDate> {
    let year = valid_until.year();
    let (from_year, from_month) = match valid_until.month() {
        1..=4 => (year - 1, 11),
        5..=7 => (year, 2),
        8..=10 => (year, 5),
        _ => (year, 8),
    };
    NaiveDate::from_ymd_opt(from_year, from_month, 1)
}

/// Find the price and validity period in the text of the PDF pages.
///
/// The first page carrying both the price sentence and a `voimassa D.M.YYYY
/// asti` clause wins.
pub fn parse_rajaneliohinta(pages: &[String]) -> Result<Option<Rajaneliohinta>> {
    let price_re = Regex::new(r"(?i)rajaneliöhinta\s+on\s+(\d+(?:\s+\d+)*)\s+euroa?/m")?;
    let validity_re = Regex::new(r"(?i)voimassa\s+(\d{1,2})\.(\d{1,2})\.(\d{4})\s+asti")?;

    for page in pages {
        let Some(price_caps) = price_re.captures(page) else {
            continue;
        };

        let digits: String = price_caps[1].chars().filter(|c| !c.is_whitespace()).collect();
        let Ok(price) = digits.parse::<f64>() else {
            continue;
        };

        let Some(validity) = validity_re.captures(page) else {
            continue;
        };

        let day: u32 = validity[1].parse()?;
        let month: u32 = validity[2].parse()?;
        let year: i32 = validity[3].parse()?;

        let Some(valid_until) = NaiveDate::from_ymd_opt(year, month, day) else {
            warn!("Ignoring impossible validity date {}.{}.{}", day, month, year);
            continue;
        };
        let Some(valid_from) = quarter_start(valid_until) else {
            continue;
        };

        let result = Rajaneliohinta {
            price_per_sqm: price,
            valid_from: valid_from.format("%Y-%m-%d").to_string(),
            valid_until: valid_until.format("%Y-%m-%d").to_string(),
            description: DESCRIPTION.to_string(),
            source: RAJAHINTA_PDF_URL.to_string(),
        };

        println!(
            "Parsed rajaneliöhinta: {} €/m² (valid {} - {})",
            result.price_per_sqm, result.valid_from, result.valid_until
        );
        return Ok(Some(result));
    }

    warn!("Could not parse rajaneliöhinta from PDF");
    Ok(None)
}

/// Download and parse the current rajaneliöhinta
pub fn get_rajaneliohinta(client: &PdfClient) -> Result<Option<Rajaneliohinta>> {
    let Some(pages) = client.download_pages(RAJAHINTA_PDF_URL, "Rajaneliöhinta") else {
        return Ok(None);
    };

    println!("Parsing rajaneliöhinta PDF...");
    parse_rajaneliohinta(&pages)
}

/// `rajahinta` subcommand
pub fn run_rajahinta() -> Result<()> {
    let client = PdfClient::new()?;

    let Some(rajahinta) = get_rajaneliohinta(&client)? else {
        bail!("Failed to import rajaneliöhinta");
    };

    println!();
    println!("Rajaneliöhinta: {} €/m²", rajahinta.price_per_sqm);
    println!("Valid from: {}", rajahinta.valid_from);
    println!("Valid until: {}", rajahinta.valid_until);
    println!("Description: {}", rajahinta.description);

    Ok(())
}
