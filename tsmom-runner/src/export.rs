//! Artifact export: curve CSV and a JSON manifest per analysis.
//!
//! `save_artifacts` creates `{output_dir}/{symbol}_{hash8}/` containing:
//! - `curves.csv`: date plus one column per curve
//! - `manifest.json`: report, windows, render styling and hashes
//!
//! The directory name is derived from the dataset and config hashes, so
//! re-running the same analysis on the same data overwrites in place.

use crate::render::RenderConfig;
use crate::report::Report;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tsmom_core::domain::CurveKind;
use tsmom_core::AnalysisResult;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub schema_version: u32,
    pub report: Report,
    pub render: RenderConfig,
    pub dataset_hash: String,
    pub config_hash: String,
    pub bars: usize,
}

/// Curves as CSV, one row per date.
pub fn export_curves_csv(result: &AnalysisResult) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec!["date"];
    header.extend(CurveKind::ALL.iter().map(|k| k.as_str()));
    wtr.write_record(&header)?;

    let curves = result.curves();
    for (i, date) in result.hold.dates.iter().enumerate() {
        let mut row = vec![date.to_string()];
        row.extend(curves.iter().map(|c| format!("{:.8}", c.values[i])));
        wtr.write_record(&row)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Directory-safe symbol: `^GSPC` becomes `_GSPC`.
fn dir_symbol(symbol: &str) -> String {
    symbol
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Write the artifact set and return the run directory.
pub fn save_artifacts(
    report: &Report,
    result: &AnalysisResult,
    render: &RenderConfig,
    dataset_hash: &str,
    config_hash: &str,
    output_dir: &Path,
) -> Result<PathBuf> {
    let run_hash = blake3::hash(format!("{dataset_hash}:{config_hash}").as_bytes()).to_hex();
    let run_dir = output_dir.join(format!("{}_{}", dir_symbol(&report.symbol), &run_hash.as_str()[..8]));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let csv = export_curves_csv(result)?;
    std::fs::write(run_dir.join("curves.csv"), csv)
        .with_context(|| format!("failed to write curves.csv in {}", run_dir.display()))?;

    let manifest = Manifest {
        schema_version: SCHEMA_VERSION,
        report: report.clone(),
        render: render.clone(),
        dataset_hash: dataset_hash.to_string(),
        config_hash: config_hash.to_string(),
        bars: result.hold.len(),
    };
    let json = serde_json::to_string_pretty(&manifest).context("failed to serialize manifest")?;
    std::fs::write(run_dir.join("manifest.json"), json)
        .with_context(|| format!("failed to write manifest.json in {}", run_dir.display()))?;

    Ok(run_dir)
}

/// Read a manifest back, rejecting newer schema versions.
pub fn load_manifest(run_dir: &Path) -> Result<Manifest> {
    let path = run_dir.join("manifest.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let manifest: Manifest =
        serde_json::from_str(&json).context("failed to deserialize manifest")?;
    if manifest.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            manifest.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(manifest)
}
