//! Result export: write completed results to disk under derived names.
//!
//! The derived name keeps the original stem and extension with a
//! `-compressed` marker between them, so exported files sort next to their
//! originals: `report.pdf` → `report-compressed.pdf`, `notes` →
//! `notes-compressed`.
//!
//! Also home to the byte-formatting helpers shells use for summary rows.

use crate::error::BatchError;
use crate::record::RecordId;
use crate::workspace::Workspace;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const NAME_SUFFIX: &str = "-compressed";

/// Derive the export filename from the original.
///
/// The suffix goes before the last `.`; a name without an extension gets
/// the suffix appended.
pub fn derive_output_name(original: &str) -> String {
    match original.rfind('.') {
        Some(index) => format!(
            "{}{NAME_SUFFIX}{}",
            &original[..index],
            &original[index..]
        ),
        None => format!("{original}{NAME_SUFFIX}"),
    }
}

/// Export one completed record into `out_dir`.
///
/// Returns the written path, or `None` (a no-op, nothing touched on disk)
/// when the record is missing or not `Done`.
pub fn export_one(
    workspace: &Workspace,
    id: RecordId,
    out_dir: &Path,
) -> Result<Option<PathBuf>, BatchError> {
    let Some((staged, name)) = workspace.result_of(id) else {
        debug!("export: record {id} has no exportable result");
        return Ok(None);
    };

    let dest = out_dir.join(derive_output_name(&name));
    std::fs::create_dir_all(out_dir).map_err(|e| BatchError::ExportFailed {
        path: dest.clone(),
        source: e,
    })?;
    std::fs::copy(&staged, &dest).map_err(|e| BatchError::ExportFailed {
        path: dest.clone(),
        source: e,
    })?;

    info!("exported '{}' → {}", name, dest.display());
    Ok(Some(dest))
}

/// Export every completed record into `out_dir`, in collection order.
///
/// Records that are not `Done` (failed, idle, running) are excluded.
pub fn export_all(workspace: &Workspace, out_dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
    let mut written = Vec::new();
    for id in workspace.ids() {
        if let Some(path) = export_one(workspace, id, out_dir)? {
            written.push(path);
        }
    }
    Ok(written)
}

/// Human-readable byte count: 1024-based, two decimals, trailing zeros
/// trimmed (`1536` → `"1.5 KB"`).
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let exponent = ((bytes as f64).log2() / 10.0).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exponent as i32);
    let formatted = format!("{value:.2}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[exponent])
}

/// Percentage saved relative to the original, one decimal (`"33.3%"`).
///
/// `"0%"` when there is no result yet.
pub fn savings_percent(original: u64, result: Option<u64>) -> String {
    match result {
        Some(result) if original > 0 => {
            let saved = original as f64 - result as f64;
            format!("{:.1}%", saved / original as f64 * 100.0)
        }
        _ => "0%".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_keeps_stem_and_extension() {
        assert_eq!(derive_output_name("photo.jpeg"), "photo-compressed.jpeg");
        assert_eq!(derive_output_name("report.pdf"), "report-compressed.pdf");
    }

    #[test]
    fn derive_without_extension_appends_suffix() {
        assert_eq!(derive_output_name("notes"), "notes-compressed");
    }

    #[test]
    fn derive_uses_the_last_dot() {
        assert_eq!(
            derive_output_name("archive.tar.gz"),
            "archive.tar-compressed.gz"
        );
    }

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(0), "0 Bytes");
        assert_eq!(format_bytes(512), "512 Bytes");
        assert_eq!(format_bytes(1024), "1 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1_048_576), "1 MB");
        assert_eq!(format_bytes(2_621_440), "2.5 MB");
        assert_eq!(format_bytes(1_073_741_824), "1 GB");
    }

    #[test]
    fn savings_percent_formats_one_decimal() {
        assert_eq!(savings_percent(1000, Some(667)), "33.3%");
        assert_eq!(savings_percent(1000, Some(1000)), "0.0%");
        assert_eq!(savings_percent(1000, None), "0%");
        assert_eq!(savings_percent(0, Some(10)), "0%");
    }
}
