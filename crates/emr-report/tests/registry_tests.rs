use std::io::Cursor;

use emr_model::{import_csv, CsvOptions, Table};
use emr_report::{
    default_registry, run_reports, OutputDir, ReportArtifact, ReportContext, ReportError,
    ReportOutcome, ReportSettings, ReportSpec, ReportStatus,
};
use pretty_assertions::assert_eq;

fn load(csv: &str) -> Table {
    import_csv(Cursor::new(csv.as_bytes()), CsvOptions::default()).unwrap()
}

fn registry_only(ids: &[&str]) -> Vec<ReportSpec> {
    default_registry()
        .into_iter()
        .filter(|spec| ids.contains(&spec.id))
        .collect()
}

fn statuses(outcomes: &[ReportOutcome]) -> Vec<(&str, ReportStatus)> {
    outcomes.iter().map(|o| (o.id.as_str(), o.status)).collect()
}

#[test]
fn missing_column_skips_report_and_run_continues() {
    let table = load("gender,age\nF,30\nM,40\n");
    let dir = tempfile::tempdir().unwrap();
    let output = OutputDir::create(dir.path()).unwrap();
    let registry = registry_only(&["gender_distribution", "condition_by_gender", "age_distribution"]);

    let outcomes = run_reports(&table, &registry, &ReportSettings::default(), &output).unwrap();
    assert_eq!(
        statuses(&outcomes),
        vec![
            ("gender_distribution", ReportStatus::Ok),
            ("age_distribution", ReportStatus::Ok),
            ("condition_by_gender", ReportStatus::Skipped),
        ]
    );
    assert_eq!(
        outcomes[2].reason.as_deref(),
        Some("missing column(s): medical_condition")
    );
    assert!(dir.path().join("gender_distribution.svg").exists());
    assert!(dir.path().join("gender_distribution.csv").exists());
    assert!(!dir.path().join("condition_by_gender.svg").exists());
}

#[test]
fn strict_columns_abort_the_run() {
    let table = load("gender,age\nF,30\n");
    let dir = tempfile::tempdir().unwrap();
    let output = OutputDir::create(dir.path()).unwrap();
    let settings = ReportSettings {
        strict_columns: true,
        ..ReportSettings::default()
    };

    let err = run_reports(&table, &default_registry(), &settings, &output).unwrap_err();
    match err {
        ReportError::MissingColumn { report, column } => {
            assert_eq!(report, "top_diagnoses");
            assert_eq!(column, "medical_condition");
        }
        other => panic!("expected MissingColumn, got {other:?}"),
    }
}

#[test]
fn report_filter_runs_only_selected_reports() {
    let table = load("gender,age\nF,30\n");
    let dir = tempfile::tempdir().unwrap();
    let output = OutputDir::create(dir.path()).unwrap();
    let settings = ReportSettings {
        reports: vec!["age_distribution".to_string()],
        ..ReportSettings::default()
    };

    let outcomes = run_reports(&table, &default_registry(), &settings, &output).unwrap();
    assert_eq!(statuses(&outcomes), vec![("age_distribution", ReportStatus::Ok)]);
}

#[test]
fn column_without_values_is_skipped() {
    let table = load("gender,medical_condition\n,\n,\n");
    let dir = tempfile::tempdir().unwrap();
    let output = OutputDir::create(dir.path()).unwrap();

    let outcomes = run_reports(
        &table,
        &registry_only(&["gender_distribution"]),
        &ReportSettings::default(),
        &output,
    )
    .unwrap();
    assert_eq!(outcomes[0].status, ReportStatus::Skipped);
    assert_eq!(
        outcomes[0].reason.as_deref(),
        Some("column gender has no usable values")
    );
}

#[test]
fn adult_only_extract_renders_empty_life_stages_as_zero_rows() {
    // No minors and nobody past 59: three life stages are empty.
    let table = load("age,medical_condition\n22,Asthma\n25,Diabetes\n40,Asthma\n58,Diabetes\n");
    let dir = tempfile::tempdir().unwrap();
    let output = OutputDir::create(dir.path()).unwrap();
    let registry = registry_only(&["condition_by_life_stage", "condition_share_by_life_stage"]);

    let outcomes = run_reports(&table, &registry, &ReportSettings::default(), &output).unwrap();
    assert_eq!(
        statuses(&outcomes),
        vec![
            ("condition_by_life_stage", ReportStatus::Ok),
            ("condition_share_by_life_stage", ReportStatus::Ok),
        ]
    );
    let csv = std::fs::read_to_string(dir.path().join("condition_share_by_life_stage.csv")).unwrap();
    assert_eq!(
        csv,
        "age_group,Asthma,Diabetes\n\
         0-17,0.00,0.00\n\
         18-29,50.00,50.00\n\
         30-44,100.00,0.00\n\
         45-59,0.00,100.00\n\
         60-74,0.00,0.00\n\
         75+,0.00,0.00\n"
    );
}

#[test]
fn rerun_removes_files_the_report_no_longer_produces() {
    let table = load("gender\nF\n");
    let dir = tempfile::tempdir().unwrap();
    let output = OutputDir::create(dir.path()).unwrap();
    std::fs::write(dir.path().join("gender_distribution.json"), b"{}").unwrap();

    let outcomes = run_reports(
        &table,
        &registry_only(&["gender_distribution"]),
        &ReportSettings::default(),
        &output,
    )
    .unwrap();
    assert_eq!(
        outcomes[0].files,
        vec!["gender_distribution.svg", "gender_distribution.csv"]
    );
    assert!(!dir.path().join("gender_distribution.json").exists());
}

#[test]
fn failing_report_does_not_stop_later_reports() {
    fn broken(_: &ReportContext<'_>) -> Result<ReportArtifact, ReportError> {
        Err(ReportError::Pivot(emr_pivot::PivotError::NotNumeric {
            column: "age".to_string(),
        }))
    }

    let table = load("gender\nF\n");
    let dir = tempfile::tempdir().unwrap();
    let output = OutputDir::create(dir.path()).unwrap();
    let mut registry = vec![ReportSpec {
        id: "broken",
        title: "Broken",
        required_columns: &[],
        run: broken,
    }];
    registry.extend(registry_only(&["gender_distribution"]));

    let outcomes = run_reports(&table, &registry, &ReportSettings::default(), &output).unwrap();
    assert_eq!(
        statuses(&outcomes),
        vec![("broken", ReportStatus::Failed), ("gender_distribution", ReportStatus::Ok)]
    );
    assert_eq!(
        outcomes[0].reason.as_deref(),
        Some("column age is not numeric")
    );
}
