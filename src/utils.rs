//! Terminal output helpers shared by the subcommands

use std::fs;

use crate::types::{latest_value, IndexTable};

const RULE_WIDTH: usize = 50;

/// Create an OSC8 file:// hyperlink for terminal output
pub fn osc8_file_link(path: &str, text: &str) -> String {
    let abs_path = fs::canonicalize(path)
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|_| path.to_string());
    format!("\x1b]8;;file://{}\x1b\\{}\x1b]8;;\x1b\\", abs_path, text)
}

/// Print a banner line, optionally with a heading under it
pub fn print_banner(heading: Option<&str>) {
    println!("{}", "=".repeat(RULE_WIDTH));
    if let Some(heading) = heading {
        println!("{}", heading);
        println!("{}", "=".repeat(RULE_WIDTH));
    }
}

/// One-line summary of an index table: year count plus the latest value
pub fn table_summary(name: &str, table: &IndexTable) -> String {
    match latest_value(table) {
        Some((year, month, value)) => format!(
            "{}: {} years\n  Latest: {}/{} = {}",
            name,
            table.len(),
            month,
            year,
            value
        ),
        None => format!("{}: no data", name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_summary() {
        let mut table = IndexTable::new();
        table.entry(2024).or_default().insert(12, 99.5);
        table.entry(2025).or_default().insert(9, 101.25);

        assert_eq!(
            table_summary("Markkinahintaindeksi", &table),
            "Markkinahintaindeksi: 2 years\n  Latest: 9/2025 = 101.25"
        );
        assert_eq!(table_summary("Tyhjä", &IndexTable::new()), "Tyhjä: no data");
    }

    #[test]
    fn test_osc8_file_link_wraps_text() {
        let link = osc8_file_link("/nonexistent/file.png", "file.png");
        assert!(link.starts_with("\x1b]8;;file:///nonexistent/file.png"));
        assert!(link.contains("file.png\x1b]8;;"));
    }
}
