use std::io::Cursor;

use emr_model::{import_csv, summarize, ColumnSummary, ColumnType, CsvOptions};
use pretty_assertions::assert_eq;

const SAMPLE: &str = "gender,ethnicity,age,medical_condition\n\
Female,Hispanic,10,Asthma\n\
Male,White,20,Diabetes\n\
Female,,30,Asthma\n\
Male,Asian,40,\n";

#[test]
fn overview_reports_shape_missing_and_distinct_counts() {
    let table = import_csv(Cursor::new(SAMPLE.as_bytes().to_vec()), CsvOptions::default()).unwrap();
    let summary = summarize(&table);

    assert_eq!(summary.rows, 4);
    assert_eq!(summary.columns, 4);
    assert_eq!(
        summary.column_summaries,
        vec![
            ColumnSummary {
                name: "gender".to_string(),
                column_type: ColumnType::Text,
                non_null: 4,
                missing: 0,
                distinct: 2,
            },
            ColumnSummary {
                name: "ethnicity".to_string(),
                column_type: ColumnType::Text,
                non_null: 3,
                missing: 1,
                distinct: 3,
            },
            ColumnSummary {
                name: "age".to_string(),
                column_type: ColumnType::Number,
                non_null: 4,
                missing: 0,
                distinct: 4,
            },
            ColumnSummary {
                name: "medical_condition".to_string(),
                column_type: ColumnType::Text,
                non_null: 3,
                missing: 1,
                distinct: 2,
            },
        ]
    );
}

#[test]
fn numeric_describe_matches_sample_statistics() {
    let table = import_csv(Cursor::new(SAMPLE.as_bytes().to_vec()), CsvOptions::default()).unwrap();
    let summary = summarize(&table);

    assert_eq!(summary.numeric.len(), 1);
    let age = &summary.numeric[0];
    assert_eq!(age.column, "age");
    assert_eq!(age.count, 4);
    assert_eq!(age.mean, 25.0);
    assert_eq!(age.min, 10.0);
    assert_eq!(age.q25, 17.5);
    assert_eq!(age.median, 25.0);
    assert_eq!(age.q75, 32.5);
    assert_eq!(age.max, 40.0);
    // Sample std of 10, 20, 30, 40 is sqrt(500 / 3).
    let std = age.std.unwrap();
    assert!((std - (500.0f64 / 3.0).sqrt()).abs() < 1e-12);
}

#[test]
fn summary_serializes_to_json() {
    let table = import_csv(Cursor::new(SAMPLE.as_bytes().to_vec()), CsvOptions::default()).unwrap();
    let json = serde_json::to_value(summarize(&table)).unwrap();
    assert_eq!(json["rows"], 4);
    assert_eq!(json["column_summaries"][2]["column_type"], "number");
}
