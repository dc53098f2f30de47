//! `update` subcommand: refresh every published index into a new dated JSON

use anyhow::Result;
use chrono::{Local, NaiveDate};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::HitasError;
use crate::fetch::PdfClient;
use crate::indices::{extract_indices, INDICES_PDF_URL};
use crate::old_index::get_old_market_index;
use crate::output::{indices_filename, update_html_reference, write_indices_file};
use crate::rajahinta::get_rajaneliohinta;
use crate::tilasto::get_tilasto;
use crate::types::{IndexTable, IndicesFile, Rajaneliohinta};
use crate::utils::{osc8_file_link, print_banner, table_summary};

/// Everything parsed from the city's PDFs in one run
pub struct Collected {
    pub rakennuskustannus: IndexTable,
    pub markkinahinta: IndexTable,
    pub old_market_index: IndexTable,
    pub rajaneliohinta: Option<Rajaneliohinta>,
}

/// Assemble the output document, folding the current rajaneliöhinta into the
/// historical series found in `data_dir`.
pub fn build_indices_file(collected: Collected, data_dir: &Path, today: NaiveDate) -> IndicesFile {
    let tilasto = get_tilasto(data_dir, collected.rajaneliohinta.as_ref());

    IndicesFile {
        updated: today.format("%Y-%m-%d").to_string(),
        rakennuskustannusindeksi: collected.rakennuskustannus,
        markkinahintaindeksi: collected.markkinahinta,
        vanhat_markkinahintaindeksi: collected.old_market_index,
        rajaneliohinta: collected.rajaneliohinta,
        rajaneliohinta_tilasto: tilasto.into_table(),
    }
}

fn print_summary(indices: &IndicesFile) {
    println!();
    print_banner(Some("SUMMARY"));
    println!("{}", table_summary("Rakennuskustannusindeksi", &indices.rakennuskustannusindeksi));
    println!("{}", table_summary("Markkinahintaindeksi", &indices.markkinahintaindeksi));
    if !indices.vanhat_markkinahintaindeksi.is_empty() {
        println!(
            "{}",
            table_summary("Vanhat markkinahintaindeksi", &indices.vanhat_markkinahintaindeksi)
        );
    }
    if let Some(r) = &indices.rajaneliohinta {
        println!(
            "Rajaneliöhinta: {} €/m² ({} - {})",
            r.price_per_sqm, r.valid_from, r.valid_until
        );
    }
    println!("{}", table_summary("Rajaneliöhinta tilasto", &indices.rajaneliohinta_tilasto));
    print_banner(None);
}

fn collect_sources(client: &PdfClient) -> Result<Collected> {
    let Some(pages) = client.download_pages(INDICES_PDF_URL, "HITAS index") else {
        anyhow::bail!("Failed to download PDF");
    };

    println!("Parsing PDF...");
    let (rakennuskustannus, markkinahinta) = extract_indices(&pages.join("\n"));
    if rakennuskustannus.is_empty() {
        return Err(HitasError::MissingIndex("Rakennuskustannusindeksi").into());
    }
    if markkinahinta.is_empty() {
        return Err(HitasError::MissingIndex("Markkinahintaindeksi").into());
    }

    println!();
    print_banner(Some("Fetching old market index (pre-2011)..."));
    let old_market_index = get_old_market_index(client);
    if old_market_index.is_empty() {
        warn!("Failed to get old market index, continuing without it");
    }

    println!();
    print_banner(Some("Fetching rajaneliöhinta..."));
    let rajaneliohinta = match get_rajaneliohinta(client) {
        Ok(r) => r,
        Err(e) => {
            warn!("Failed to parse rajaneliöhinta: {:#}", e);
            None
        }
    };
    if rajaneliohinta.is_none() {
        warn!("No current rajaneliöhinta, continuing without it");
    }

    Ok(Collected {
        rakennuskustannus,
        markkinahinta,
        old_market_index,
        rajaneliohinta,
    })
}

/// Download all sources, write `indices-<today>.json` and optionally repoint
/// the page at it.
pub fn run_update(data_dir: &Path, html: Option<&PathBuf>) -> Result<()> {
    println!("HITAS Index Updater");
    print_banner(None);

    let client = PdfClient::new()?;
    let collected = collect_sources(&client)?;

    let indices = build_indices_file(collected, data_dir, Local::now().date_naive());
    print_summary(&indices);

    let path = write_indices_file(data_dir, &indices)?;
    let shown = path.display().to_string();
    println!("JSON file created: {}", osc8_file_link(&shown, &shown));

    if let Some(html) = html {
        update_html_reference(html, &indices_filename(&indices.updated))?;
    }

    println!("\nUpdate complete!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn table(year: i32, values: &[f64]) -> IndexTable {
        let mut t = IndexTable::new();
        for (i, v) in values.iter().enumerate() {
            t.entry(year).or_default().insert(i as u32 + 1, *v);
        }
        t
    }

    fn collected(rajaneliohinta: Option<Rajaneliohinta>) -> Collected {
        Collected {
            rakennuskustannus: table(2025, &[126.0, 126.2]),
            markkinahinta: table(2025, &[201.4]),
            old_market_index: IndexTable::new(),
            rajaneliohinta,
        }
    }

    #[test]
    fn test_build_indices_file_accumulates_tilasto() {
        let tmp = TempDir::new().unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 2, 3).unwrap();
        let current = Rajaneliohinta {
            price_per_sqm: 4101.0,
            valid_from: "2026-02-01".to_string(),
            valid_until: "2026-04-30".to_string(),
            description: String::new(),
            source: String::new(),
        };

        let first = build_indices_file(collected(Some(current.clone())), tmp.path(), today);
        assert_eq!(first.updated, "2026-02-03");
        assert_eq!(first.rajaneliohinta_tilasto[&2026][&2], 4101.0);
        write_indices_file(tmp.path(), &first).unwrap();

        // the next run starts from the file just written
        let later = NaiveDate::from_ymd_opt(2026, 2, 10).unwrap();
        let second = build_indices_file(collected(Some(current)), tmp.path(), later);
        assert_eq!(second.rajaneliohinta_tilasto, first.rajaneliohinta_tilasto);
    }

    #[test]
    fn test_build_indices_file_without_rajaneliohinta() {
        let tmp = TempDir::new().unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 2, 3).unwrap();

        let indices = build_indices_file(collected(None), tmp.path(), today);
        let path = write_indices_file(tmp.path(), &indices).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert!(value.get("rajaneliohinta").is_none());
        assert_eq!(value["rakennuskustannusindeksi"]["2025"]["2"], 126.2);
        assert_eq!(value["rajaneliohinta_tilasto"]["2025"]["11"], 4159.0);
    }
}
