//! One-shot file export for categorized reports
//!
//! Supports a JSON file containing the report mapping verbatim and a
//! plain-text file in the same sectioned layout as the terminal report.

use anyhow::{anyhow, Result};
use chrono::Local;
use std::path::{Path, PathBuf};

use crate::lens::report::IpReport;

/// Default basename for exported files, e.g. `ip_report_20250101_093000`
pub fn default_basename() -> String {
    format!("ip_report_{}", Local::now().format("%Y%m%d_%H%M%S"))
}

/// Save a report as pretty-printed JSON
///
/// Uses a timestamped filename in the working directory when `path` is None.
/// Returns the path written.
pub fn save_json(report: &IpReport, path: Option<&Path>) -> Result<PathBuf> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => PathBuf::from(format!("{}.json", default_basename())),
    };

    let body = serde_json::to_string_pretty(report)?;
    std::fs::write(&path, body)
        .map_err(|e| anyhow!("Unable to write JSON export {}: {}", path.display(), e))?;
    Ok(path)
}

/// Save a report as a sectioned plain-text file
pub fn save_text(report: &IpReport, path: Option<&Path>) -> Result<PathBuf> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => PathBuf::from(format!("{}.txt", default_basename())),
    };

    std::fs::write(&path, report.to_text())
        .map_err(|e| anyhow!("Unable to write text export {}: {}", path.display(), e))?;
    Ok(path)
}
