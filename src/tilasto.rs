//! Historical rajaneliöhinta series (rajahintatilasto).
//!
//! The city publishes the history only as a chart, so the series is seeded
//! from a hardcoded copy of it and then grown one quarter at a time: each run
//! loads the series from the newest indices JSON and adds the current
//! rajaneliöhinta to it.

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::HitasError;
use crate::types::{value_count, IndexTable, Rajaneliohinta};

/// Values closer than this are the same observation
pub const TOLERANCE: f64 = 0.01;

/// (year, month, €/m²) from https://www.hel.fi/static/kv/asunto-osasto/hitas-rajahintatilasto.pdf
const SEED: &[(i32, u32, f64)] = &[
    (2010, 1, 2737.0),
    (2010, 2, 2860.0),
    (2010, 5, 2942.0),
    (2010, 8, 3023.0),
    (2010, 11, 3013.0),
    (2011, 2, 3051.0),
    (2011, 5, 3109.0),
    (2011, 8, 3151.0),
    (2011, 11, 3137.0),
    (2012, 2, 3107.0),
    (2012, 5, 3176.0),
    (2012, 8, 3140.0),
    (2012, 11, 3205.0),
    (2013, 2, 3229.0),
    (2013, 5, 3276.0),
    (2013, 8, 3281.0),
    (2013, 11, 3354.0),
    (2014, 2, 3322.0),
    (2014, 5, 3306.0),
    (2014, 8, 3411.0),
    (2014, 11, 3342.0),
    (2015, 2, 3336.0),
    (2015, 5, 3353.0),
    (2015, 8, 3367.0),
    (2015, 11, 3384.0),
    (2016, 2, 3417.0),
    (2016, 5, 3462.0),
    (2016, 8, 3492.0),
    (2016, 11, 3534.0),
    (2017, 2, 3555.0),
    (2017, 5, 3559.0),
    (2017, 8, 3665.0),
    (2017, 11, 3678.0),
    (2018, 2, 3704.0),
    (2018, 5, 3728.0),
    (2018, 8, 3839.0),
    (2018, 11, 3867.0),
    (2019, 2, 3927.0),
    (2019, 5, 3946.0),
    (2019, 8, 4094.0),
    (2019, 11, 4095.0),
    (2020, 2, 4134.0),
    (2020, 5, 4267.0),
    (2020, 8, 4383.0),
    (2020, 11, 4450.0),
    (2021, 2, 4547.0),
    (2021, 5, 4653.0),
    (2021, 8, 4802.0),
    (2021, 11, 4805.0),
    (2022, 2, 4863.0),
    (2022, 5, 4869.0),
    (2022, 8, 4872.0),
    (2022, 11, 4733.0),
    (2023, 2, 4621.0),
    (2023, 5, 4545.0),
    (2023, 8, 4461.0),
    (2023, 11, 4385.0),
    (2024, 2, 4295.0),
    (2024, 5, 4223.0),
    (2024, 8, 4256.0),
    (2024, 11, 4210.0),
    (2025, 2, 4237.0),
    (2025, 5, 4174.0),
    (2025, 8, 4242.0),
    (2025, 11, 4159.0),
];

/// Result of [`Tilasto::add_value`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AddOutcome {
    /// The month had no value yet
    Added,
    /// The month held a different value, which was overwritten
    Replaced { previous: f64 },
    /// The month already held this value (within [`TOLERANCE`])
    Unchanged,
    /// The date could not be parsed; nothing was touched
    Rejected,
}

/// Accumulated year -> month -> price series
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tilasto {
    data: IndexTable,
}

/// Parse a `YYYY-MM-DD` validity date into its (year, month)
pub fn parse_period(date: &str) -> Result<(i32, u32), HitasError> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map(|d| (d.year(), d.month()))
        .map_err(|_| HitasError::InvalidDate(date.to_string()))
}

impl Tilasto {
    pub fn new(data: IndexTable) -> Self {
        Self { data }
    }

    /// The hardcoded series the accumulation starts from
    pub fn seed() -> Self {
        let mut data = IndexTable::new();
        for &(year, month, price) in SEED {
            data.entry(year).or_default().insert(month, price);
        }
        Self { data }
    }

    pub fn table(&self) -> &IndexTable {
        &self.data
    }

    pub fn into_table(self) -> IndexTable {
        self.data
    }

    pub fn len(&self) -> usize {
        value_count(&self.data)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, year: i32, month: u32) -> Option<f64> {
        self.data.get(&year)?.get(&month).copied()
    }

    /// Record `price` for the month `valid_from` falls in.
    ///
    /// Re-adding a value already present (within [`TOLERANCE`]) is a no-op. A
    /// malformed date is logged and leaves the series untouched.
    pub fn add_value(&mut self, price: f64, valid_from: &str) -> AddOutcome {
        let (year, month) = match parse_period(valid_from) {
            Ok(period) => period,
            Err(e) => {
                warn!("Could not add new value: {}", e);
                return AddOutcome::Rejected;
            }
        };

        let previous = self.get(year, month);
        if let Some(existing) = previous {
            if (existing - price).abs() < TOLERANCE {
                println!(
                    "Value {} €/m² for {}-{:02} already exists, skipping",
                    price, year, month
                );
                return AddOutcome::Unchanged;
            }
        }

        self.data.entry(year).or_default().insert(month, price);
        println!("Added new value: {}-{:02} = {} €/m²", year, month, price);

        match previous {
            Some(previous) => AddOutcome::Replaced { previous },
            None => AddOutcome::Added,
        }
    }

    /// Every (year, month, price) in chronological order
    pub fn entries(&self) -> impl Iterator<Item = (i32, u32, f64)> + '_ {
        self.data
            .iter()
            .flat_map(|(year, months)| months.iter().map(move |(m, p)| (*year, *m, *p)))
    }
}

#[derive(Deserialize)]
struct TilastoOnly {
    rajaneliohinta_tilasto: Option<IndexTable>,
}

/// `indices-*.json` files in `data_dir`, newest first by file name
fn indices_files(data_dir: &Path) -> Vec<PathBuf> {
    let Ok(dir) = fs::read_dir(data_dir) else {
        return Vec::new();
    };

    let mut files: Vec<PathBuf> = dir
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("indices-") && n.ends_with(".json"))
        })
        .collect();

    files.sort();
    files.reverse();
    files
}

fn read_tilasto(path: &Path) -> Result<Option<IndexTable>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let parsed: TilastoOnly = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(parsed.rajaneliohinta_tilasto)
}

/// Load the series from the newest indices JSON that carries one
pub fn load_existing_tilasto(data_dir: &Path) -> Option<Tilasto> {
    for path in indices_files(data_dir) {
        match read_tilasto(&path) {
            Ok(Some(table)) => {
                info!("Loaded existing tilasto from {}", path.display());
                return Some(Tilasto::new(table));
            }
            Ok(None) => continue,
            Err(e) => {
                warn!("Could not load tilasto: {:#}", e);
                continue;
            }
        }
    }
    None
}

/// Existing series (or the seed) with `current` folded in
pub fn get_tilasto(data_dir: &Path, current: Option<&Rajaneliohinta>) -> Tilasto {
    let mut tilasto = match load_existing_tilasto(data_dir) {
        Some(t) if !t.is_empty() => {
            println!("Loaded {} existing values", t.len());
            t
        }
        _ => {
            println!("No existing tilasto found, using initial hardcoded data");
            Tilasto::seed()
        }
    };

    if let Some(current) = current {
        tilasto.add_value(current.price_per_sqm, &current.valid_from);
    }

    tilasto
}

/// `tilasto` subcommand: show the accumulated series, optionally exporting it
pub fn run_tilasto(data_dir: &Path, export: Option<&Path>) -> Result<()> {
    let tilasto = get_tilasto(data_dir, None);

    let (Some(first), Some(last)) = (tilasto.table().keys().next(), tilasto.table().keys().next_back())
    else {
        anyhow::bail!("Failed to import rajaneliöhinta tilasto");
    };
    println!("{} values, years {} - {}", tilasto.len(), first, last);

    println!("\nSample data (first 5 entries):");
    for (year, month, price) in tilasto.entries().take(5) {
        println!("  {}-{:02}: {} €/m²", year, month, price);
    }

    if let Some(path) = export {
        let content = serde_json::to_string_pretty(&tilasto.into_table())?;
        fs::write(path, content + "\n")
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("\nData saved to {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_seed() {
        let seed = Tilasto::seed();
        assert_eq!(seed.len(), 65);
        assert_eq!(seed.get(2010, 1), Some(2737.0));
        assert_eq!(seed.get(2025, 11), Some(4159.0));
        assert_eq!(seed.get(2025, 12), None);
    }

    #[test]
    fn test_add_value_new_month() {
        let mut t = Tilasto::seed();
        assert_eq!(t.add_value(4100.0, "2026-02-01"), AddOutcome::Added);
        assert_eq!(t.get(2026, 2), Some(4100.0));
        assert_eq!(t.len(), 66);
    }

    #[test]
    fn test_add_value_twice_is_idempotent() {
        let mut t = Tilasto::seed();
        t.add_value(4100.0, "2026-02-01");
        let after_first = t.clone();

        assert_eq!(t.add_value(4100.0, "2026-02-01"), AddOutcome::Unchanged);
        assert_eq!(t, after_first);
    }

    #[test]
    fn test_add_value_within_tolerance() {
        let mut t = Tilasto::seed();
        let before = t.clone();
        assert_eq!(t.add_value(4159.005, "2025-11-01"), AddOutcome::Unchanged);
        assert_eq!(t, before);
    }

    #[test]
    fn test_add_value_replaces_different_value() {
        let mut t = Tilasto::seed();
        assert_eq!(
            t.add_value(4160.0, "2025-11-01"),
            AddOutcome::Replaced { previous: 4159.0 }
        );
        assert_eq!(t.get(2025, 11), Some(4160.0));
    }

    #[test]
    fn test_add_value_malformed_dates() {
        let mut t = Tilasto::seed();
        let before = t.clone();
        for bad in ["", "2025", "2025-11", "01.11.2025", "2025-13-01", "2025-02-30", "abcd-ef-gh"] {
            assert_eq!(t.add_value(1.0, bad), AddOutcome::Rejected, "{}", bad);
        }
        assert_eq!(t, before);
    }

    #[test]
    fn test_parse_period() {
        assert_eq!(parse_period("2025-11-01").unwrap(), (2025, 11));
        assert!(matches!(parse_period("nope"), Err(HitasError::InvalidDate(_))));
    }

    #[test]
    fn test_load_existing_prefers_newest_file_with_tilasto() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path();
        fs::write(
            dir.join("indices-2025-01-01.json"),
            r#"{"rajaneliohinta_tilasto": {"2024": {"11": 4210}}}"#,
        )
        .unwrap();
        fs::write(
            dir.join("indices-2025-06-01.json"),
            r#"{"rajaneliohinta_tilasto": {"2025": {"2": 4237.0, "5": 4174.0}}}"#,
        )
        .unwrap();
        // newest, but without the series
        fs::write(dir.join("indices-2025-09-01.json"), r#"{"updated": "2025-09-01"}"#).unwrap();
        // broken files are skipped
        fs::write(dir.join("indices-2025-12-01.json"), "{not json").unwrap();
        fs::write(dir.join("other.json"), r#"{"rajaneliohinta_tilasto": {"1999": {"1": 1}}}"#)
            .unwrap();

        let t = load_existing_tilasto(dir).unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.get(2025, 5), Some(4174.0));
    }

    #[test]
    fn test_load_existing_missing_dir() {
        let tmp = TempDir::new().unwrap();
        assert!(load_existing_tilasto(&tmp.path().join("nope")).is_none());
    }

    #[test]
    fn test_get_tilasto_falls_back_to_seed_and_adds_current() {
        let tmp = TempDir::new().unwrap();
        let current = Rajaneliohinta {
            price_per_sqm: 4120.0,
            valid_from: "2026-02-01".to_string(),
            valid_until: "2026-04-30".to_string(),
            description: String::new(),
            source: String::new(),
        };

        let t = get_tilasto(tmp.path(), Some(&current));
        assert_eq!(t.len(), 66);
        assert_eq!(t.get(2026, 2), Some(4120.0));
    }

    #[test]
    fn test_run_tilasto_export() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("tilasto.json");
        run_tilasto(tmp.path(), Some(&out)).unwrap();

        let back: IndexTable = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(back, Tilasto::seed().into_table());
    }
}
