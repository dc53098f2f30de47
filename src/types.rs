//! Shared data types for the index files published on the site

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sparse year -> month -> value table. Only observed months are present.
///
/// Serialized with the integer keys as JSON strings: `{"2025": {"1": 101.2}}`.
pub type IndexTable = BTreeMap<i32, BTreeMap<u32, f64>>;

/// Latest (year, month, value) in a table, if any
pub fn latest_value(table: &IndexTable) -> Option<(i32, u32, f64)> {
    let (year, months) = table.iter().rev().find(|(_, months)| !months.is_empty())?;
    let (month, value) = months.iter().next_back()?;
    Some((*year, *month, *value))
}

/// Total number of month entries in a table
pub fn value_count(table: &IndexTable) -> usize {
    table.values().map(|months| months.len()).sum()
}

/// Current rajaneliöhinta (price ceiling per square meter) with its validity window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rajaneliohinta {
    pub price_per_sqm: f64,
    /// First day of validity (YYYY-MM-DD)
    pub valid_from: String,
    /// Last day of validity (YYYY-MM-DD)
    pub valid_until: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub source: String,
}

/// The dated `indices-YYYY-MM-DD.json` document read by the site
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicesFile {
    pub updated: String,
    pub rakennuskustannusindeksi: IndexTable,
    pub markkinahintaindeksi: IndexTable,
    #[serde(default)]
    pub vanhat_markkinahintaindeksi: IndexTable,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rajaneliohinta: Option<Rajaneliohinta>,
    #[serde(default)]
    pub rajaneliohinta_tilasto: IndexTable,
}
