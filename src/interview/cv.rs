//! Candidate profile extraction from CV documents.

use anyhow::{bail, Context, Result};
use std::path::Path;

/// Extract free-text candidate profile from a CV file.
///
/// Plain-text formats only; PDF and word-processor documents must be
/// converted before use.
pub fn extract_profile(path: &Path) -> Result<String> {
    let suffix = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match suffix.as_str() {
        "pdf" | "doc" | "docx" => bail!(
            "Unsupported CV format '.{}'. Convert {:?} to plain text or markdown first.",
            suffix,
            path
        ),
        _ => {}
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read CV file {:?}", path))?;

    let cleaned: String = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    if cleaned.is_empty() {
        bail!("CV file {:?} contained no text", path);
    }

    Ok(cleaned)
}
