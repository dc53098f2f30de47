//! Dated indices JSON and the HTML reference to it

use anyhow::{bail, Context, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::IndicesFile;

/// File name for the indices published on `updated` (YYYY-MM-DD)
pub fn indices_filename(updated: &str) -> String {
    format!("indices-{}.json", updated)
}

/// Write `indices-<updated>.json` into `data_dir`, replacing any file of the same day
pub fn write_indices_file(data_dir: &Path, indices: &IndicesFile) -> Result<PathBuf> {
    fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create {}", data_dir.display()))?;

    let path = data_dir.join(indices_filename(&indices.updated));
    println!("Creating {}...", path.display());

    let mut json = serde_json::to_string_pretty(indices)?;
    json.push('\n');
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(path)
}

/// Point `const INDICES_FILE` in the page script at `data/<json_filename>`.
///
/// Pages that predate the constant get it inserted after their first
/// `<script>` tag.
pub fn set_indices_reference(html: &str, json_filename: &str) -> Result<String> {
    let declaration = format!("const INDICES_FILE = 'data/{}';", json_filename);

    if html.contains("const INDICES_FILE") {
        let re = Regex::new(r"const INDICES_FILE = '[^']*';")?;
        return Ok(re.replace_all(html, regex::NoExpand(&declaration)).into_owned());
    }

    let script_re = Regex::new(r"(<script>\s*)")?;
    let insertion = format!("${{1}}\n        {}\n", declaration);
    Ok(script_re.replace(html, insertion.as_str()).into_owned())
}

/// Rewrite the indices reference of the HTML file at `html_path` in place
pub fn update_html_reference(html_path: &Path, json_filename: &str) -> Result<()> {
    println!("Updating {} with JSON reference...", html_path.display());

    if !html_path.exists() {
        bail!("{} not found", html_path.display());
    }

    let html = fs::read_to_string(html_path)
        .with_context(|| format!("Failed to read {}", html_path.display()))?;
    let updated = set_indices_reference(&html, json_filename)?;
    fs::write(html_path, updated)
        .with_context(|| format!("Failed to write {}", html_path.display()))?;

    println!("HTML reference updated successfully!");
    Ok(())
}
