use std::fmt;
use std::time::Instant;

use emr_model::Table;

use crate::config::ReportSettings;
use crate::error::ReportError;
use crate::manifest::ReportOutcome;
use crate::output::OutputDir;
use crate::render::Chart;

/// Inputs shared by every report of a run. Reports only ever read from it.
#[derive(Clone, Copy, Debug)]
pub struct ReportContext<'a> {
    pub table: &'a Table,
    pub settings: &'a ReportSettings,
}

pub type ReportFn = fn(&ReportContext<'_>) -> Result<ReportArtifact, ReportError>;

/// One entry of the report registry.
#[derive(Clone, Copy)]
pub struct ReportSpec {
    pub id: &'static str,
    pub title: &'static str,
    pub required_columns: &'static [&'static str],
    pub run: ReportFn,
}

impl fmt::Debug for ReportSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportSpec")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("required_columns", &self.required_columns)
            .finish_non_exhaustive()
    }
}

/// Header-first rows exported as `<id>.csv`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExportTable {
    pub rows: Vec<Vec<String>>,
}

/// What a report produced; the runner decides where it is written.
#[derive(Debug, Default)]
pub struct ReportArtifact {
    pub chart: Option<Chart>,
    pub table: Option<ExportTable>,
    pub json: Option<serde_json::Value>,
    pub notes: Vec<String>,
}

impl ReportArtifact {
    pub fn with_chart(mut self, chart: Chart) -> Self {
        self.chart = Some(chart);
        self
    }

    pub fn with_table(mut self, rows: Vec<Vec<String>>) -> Self {
        self.table = Some(ExportTable { rows });
        self
    }

    pub fn with_json(mut self, json: serde_json::Value) -> Self {
        self.json = Some(json);
        self
    }

    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.notes.extend(note);
        self
    }
}

/// Run every enabled report of `registry` in order and write its artifacts.
///
/// A report whose required columns are missing is skipped, unless `strict_columns` is set, in
/// which case the run stops with [`ReportError::MissingColumn`]. A report that fails is recorded
/// as failed and the remaining reports still run.
pub fn run_reports(
    table: &Table,
    registry: &[ReportSpec],
    settings: &ReportSettings,
    output: &OutputDir,
) -> Result<Vec<ReportOutcome>, ReportError> {
    let ctx = ReportContext { table, settings };
    let mut outcomes = Vec::with_capacity(registry.len());

    for spec in registry.iter().filter(|spec| settings.is_enabled(spec.id)) {
        let missing = table.missing_columns(spec.required_columns);
        if let Some(column) = missing.first() {
            if settings.strict_columns {
                return Err(ReportError::MissingColumn {
                    report: spec.id.to_string(),
                    column: column.to_string(),
                });
            }
            log::warn!("skipping report {}: missing column(s) {}", spec.id, missing.join(", "));
            outcomes.push(ReportOutcome::skipped(
                spec,
                format!("missing column(s): {}", missing.join(", ")),
            ));
            continue;
        }

        let start = Instant::now();
        let result = (spec.run)(&ctx).and_then(|artifact| {
            let files = output.write_artifact(spec.id, &artifact)?;
            Ok((files, artifact.notes))
        });
        let outcome = match result {
            Ok((files, notes)) => {
                log::info!("report {} written ({} file(s))", spec.id, files.len());
                ReportOutcome::ok(spec, start, files, notes)
            }
            Err(ReportError::NoData { column }) => {
                log::warn!("skipping report {}: column {column} has no usable values", spec.id);
                ReportOutcome::skipped(spec, format!("column {column} has no usable values"))
            }
            Err(err) => {
                log::error!("report {} failed: {err}", spec.id);
                ReportOutcome::failed(spec, start, &err)
            }
        };
        outcomes.push(outcome);
    }

    Ok(outcomes)
}
