//! Cache busting for the static site: every stylesheet and script reference
//! gets `?v=<revision>` so browsers refetch assets after a deploy.

use anyhow::{bail, Context, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::warn;
use walkdir::WalkDir;

const FALLBACK_REVISION: &str = "dev";
const SHORT_SHA_LEN: usize = 7;

/// First seven characters of a CI-provided commit sha, if it is set
fn revision_from_sha(sha: Option<&str>) -> Option<String> {
    let sha = sha?.trim();
    if sha.is_empty() {
        return None;
    }
    Some(sha.chars().take(SHORT_SHA_LEN).collect())
}

/// Short revision of the commit being deployed.
///
/// CI exposes the triggering commit as `GITHUB_SHA`; locally HEAD is used.
pub fn revision_id() -> String {
    let sha = std::env::var("GITHUB_SHA").ok();
    if let Some(rev) = revision_from_sha(sha.as_deref()) {
        return rev;
    }

    let output = Command::new("git").args(["rev-parse", "--short", "HEAD"]).output();
    match output {
        Ok(out) if out.status.success() => {
            let rev = String::from_utf8_lossy(&out.stdout).trim().to_string();
            if !rev.is_empty() {
                return rev;
            }
        }
        Ok(out) => warn!("git rev-parse failed: {}", String::from_utf8_lossy(&out.stderr).trim()),
        Err(e) => warn!("Could not run git: {}", e),
    }

    warn!("Could not get Git commit hash. Using '{}' as fallback.", FALLBACK_REVISION);
    FALLBACK_REVISION.to_string()
}

/// Asset reference patterns: (attribute, asset directory)
const ASSET_PATTERNS: &[(&str, &str)] = &[("href", "css"), ("src", "js")];

/// Set `?v=<revision>` on every local CSS/JS reference in `html`.
///
/// Matches `href="css/…"`, `href="../css/…"`, `src="js/…"` and `src="../js/…"`
/// with either quote style. An existing `?v=` is replaced, so repeated runs
/// never stack parameters.
pub fn add_cache_busting(html: &str, revision: &str) -> Result<String> {
    let mut content = html.to_string();

    for (attr, dir) in ASSET_PATTERNS {
        let re = Regex::new(&format!(
            r#"({}=["'])((?:\.\./)?{}/[^"']+?)(\?v=[^"']*)?(["'])"#,
            attr, dir
        ))?;
        let replacement = format!("${{1}}${{2}}?v={}${{4}}", revision.replace('$', "$$"));
        content = re.replace_all(&content, replacement.as_str()).into_owned();
    }

    Ok(content)
}

/// Apply cache busting to one file; returns whether it changed
pub fn bust_file(path: &Path, revision: &str) -> Result<bool> {
    let original = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let content = add_cache_busting(&original, revision)?;

    if content == original {
        println!("No changes needed for {}", path.display());
        return Ok(false);
    }

    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Updated {} with cache busting (commit: {})", path.display(), revision);
    Ok(true)
}

/// All `*.html` files under `root`, sorted
pub fn find_html_files(root: &Path) -> Vec<PathBuf> {
    if !root.exists() {
        warn!("Directory {} does not exist.", root.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable path: {}", e);
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "html"))
        .collect();
    files.sort();
    files
}

/// `cache-bust` subcommand
pub fn run_cache_bust(root: &Path) -> Result<()> {
    let html_files = find_html_files(root);
    if html_files.is_empty() {
        bail!("No HTML files found in {}", root.display());
    }

    let revision = revision_id();

    println!("Found {} HTML file(s) to process:", html_files.len());
    for file in &html_files {
        println!("  - {}", file.display());
    }

    let mut updated = 0;
    for file in &html_files {
        if bust_file(file, &revision)? {
            updated += 1;
        }
    }

    if updated > 0 {
        println!(
            "\nCache busting added to {} file(s) using commit hash: {}",
            updated, revision
        );
    } else {
        println!("\nNo files were updated.");
    }

    Ok(())
}
