//! Registry-driven exploratory reports over an EMR extract.
//!
//! A run loads one [`emr_model::Table`], walks the [`ReportSpec`] registry in order and writes
//! each report's chart (`<id>.svg`), table (`<id>.csv`) and optional JSON into an [`OutputDir`],
//! followed by a `manifest.json` describing every outcome.

#![forbid(unsafe_code)]

mod config;
mod error;
mod manifest;
mod output;
mod registry;
pub mod render;
pub mod reports;

use emr_model::Table;

pub use crate::config::{ConfigError, ReportSettings};
pub use crate::error::ReportError;
pub use crate::manifest::{ReportOutcome, ReportStatus, RunManifest};
pub use crate::output::OutputDir;
pub use crate::registry::{
    run_reports, ExportTable, ReportArtifact, ReportContext, ReportFn, ReportSpec,
};
pub use crate::reports::default_registry;

pub const MANIFEST_FILE: &str = "manifest.json";

/// Run every enabled report of `registry` against `table` and write `manifest.json`.
pub fn run_to_dir(
    table: &Table,
    input_label: &str,
    registry: &[ReportSpec],
    settings: &ReportSettings,
    output: &OutputDir,
) -> Result<RunManifest, ReportError> {
    settings.validate(registry)?;
    log::info!(
        "running {} report(s) over {} rows into {}",
        registry.iter().filter(|spec| settings.is_enabled(spec.id)).count(),
        table.row_count(),
        output.path().display()
    );

    let reports = run_reports(table, registry, settings, output)?;
    let manifest = RunManifest {
        input: input_label.to_string(),
        rows: table.row_count(),
        columns: table.column_count(),
        settings: settings.clone(),
        reports,
    };
    output.write(MANIFEST_FILE, &serde_json::to_vec_pretty(&manifest)?)?;
    Ok(manifest)
}
