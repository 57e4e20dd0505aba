use std::fmt::Write as _;
use std::time::Instant;

use serde::Serialize;

use crate::config::ReportSettings;
use crate::registry::ReportSpec;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Ok,
    Skipped,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReportOutcome {
    pub id: String,
    pub title: String,
    pub status: ReportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl ReportOutcome {
    pub fn ok(spec: &ReportSpec, start: Instant, files: Vec<String>, notes: Vec<String>) -> Self {
        Self {
            id: spec.id.to_string(),
            title: spec.title.to_string(),
            status: ReportStatus::Ok,
            duration_ms: Some(start.elapsed().as_millis()),
            reason: None,
            files,
            notes,
        }
    }

    pub fn failed(spec: &ReportSpec, start: Instant, err: impl ToString) -> Self {
        Self {
            id: spec.id.to_string(),
            title: spec.title.to_string(),
            status: ReportStatus::Failed,
            duration_ms: Some(start.elapsed().as_millis()),
            reason: Some(err.to_string()),
            files: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn skipped(spec: &ReportSpec, reason: impl ToString) -> Self {
        Self {
            id: spec.id.to_string(),
            title: spec.title.to_string(),
            status: ReportStatus::Skipped,
            duration_ms: None,
            reason: Some(reason.to_string()),
            files: Vec::new(),
            notes: Vec::new(),
        }
    }
}

/// Everything a run produced, written as `manifest.json`.
#[derive(Clone, Debug, Serialize)]
pub struct RunManifest {
    pub input: String,
    pub rows: usize,
    pub columns: usize,
    pub settings: ReportSettings,
    pub reports: Vec<ReportOutcome>,
}

impl RunManifest {
    pub fn count(&self, status: ReportStatus) -> usize {
        self.reports.iter().filter(|r| r.status == status).count()
    }

    pub fn has_failures(&self) -> bool {
        self.count(ReportStatus::Failed) > 0
    }

    pub fn outcome(&self, id: &str) -> Option<&ReportOutcome> {
        self.reports.iter().find(|r| r.id == id)
    }

    /// Plain-text run summary for the terminal.
    pub fn render_text(&self) -> String {
        let width = self.reports.iter().map(|r| r.id.len()).max().unwrap_or(0);
        let mut out = String::new();
        let _ = writeln!(out, "{}: {} rows x {} columns", self.input, self.rows, self.columns);
        for report in &self.reports {
            let status = match report.status {
                ReportStatus::Ok => "ok",
                ReportStatus::Skipped => "skipped",
                ReportStatus::Failed => "FAILED",
            };
            let detail = match (&report.reason, report.files.is_empty()) {
                (Some(reason), _) => reason.clone(),
                (None, false) => report.files.join(", "),
                (None, true) => String::new(),
            };
            let _ = writeln!(out, "  {:<width$}  {:<7}  {}", report.id, status, detail);
        }
        let _ = writeln!(
            out,
            "{} ok, {} skipped, {} failed",
            self.count(ReportStatus::Ok),
            self.count(ReportStatus::Skipped),
            self.count(ReportStatus::Failed)
        );
        out
    }
}
