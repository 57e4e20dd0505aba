use std::io::Cursor;

use emr_model::{import_csv, ColumnType, CsvImportError, CsvOptions, CsvTextEncoding, Value};
use pretty_assertions::assert_eq;

fn import(text: &str) -> emr_model::Table {
    import_csv(Cursor::new(text.as_bytes().to_vec()), CsvOptions::default()).unwrap()
}

#[test]
fn infers_numeric_and_text_columns() {
    let table = import(
        "patient_id,gender,ethnicity,age,medical_condition\n\
         1,Female,Hispanic,34,Asthma\n\
         2,Male,White,71.5,Diabetes\n",
    );

    let types: Vec<(String, ColumnType)> = table
        .schema()
        .map(|s| (s.name.clone(), s.column_type))
        .collect();
    assert_eq!(
        types,
        vec![
            ("patient_id".to_string(), ColumnType::Number),
            ("gender".to_string(), ColumnType::Text),
            ("ethnicity".to_string(), ColumnType::Text),
            ("age".to_string(), ColumnType::Number),
            ("medical_condition".to_string(), ColumnType::Text),
        ]
    );
    assert_eq!(table.row_count(), 2);
    assert_eq!(
        table.column("age").unwrap().values(),
        &[Value::Number(34.0), Value::Number(71.5)]
    );
}

#[test]
fn empty_fields_become_blank_and_short_rows_are_padded() {
    let table = import("gender,age,medical_condition\nFemale,,Asthma\nMale,40\n");

    assert_eq!(
        table.column("age").unwrap().values(),
        &[Value::Blank, Value::Number(40.0)]
    );
    assert_eq!(
        table.column("medical_condition").unwrap().values(),
        &[Value::from("Asthma"), Value::Blank]
    );
}

#[test]
fn non_numeric_fields_after_the_sample_become_blank() {
    let options = CsvOptions {
        sample_rows: 1,
        ..CsvOptions::default()
    };
    let table = import_csv(Cursor::new(b"age\n30\nunknown\n45\n".to_vec()), options).unwrap();

    let age = table.column("age").unwrap();
    assert_eq!(age.column_type(), ColumnType::Number);
    assert_eq!(
        age.values(),
        &[Value::Number(30.0), Value::Blank, Value::Number(45.0)]
    );
}

#[test]
fn na_tokens_are_missing_in_numeric_and_text_columns() {
    let table = import("gender,age,medical_condition\nF,NA,Asthma\nM,52,N/A\nnull,None,Diabetes\n");

    let age = table.column("age").unwrap();
    assert_eq!(age.column_type(), ColumnType::Number);
    assert_eq!(
        age.values(),
        &[Value::Blank, Value::Number(52.0), Value::Blank]
    );
    assert_eq!(
        table.column("gender").unwrap().values(),
        &[Value::from("F"), Value::from("M"), Value::Blank]
    );
    assert_eq!(
        table.column("medical_condition").unwrap().values(),
        &[Value::from("Asthma"), Value::Blank, Value::from("Diabetes")]
    );
}

#[test]
fn na_tokens_after_the_sample_are_missing_not_coerced() {
    let options = CsvOptions {
        sample_rows: 1,
        ..CsvOptions::default()
    };
    let table = import_csv(Cursor::new(b"age\n30\n#N/A\n".to_vec()), options).unwrap();
    assert_eq!(
        table.column("age").unwrap().values(),
        &[Value::Number(30.0), Value::Blank]
    );
}

#[test]
fn empty_null_values_keep_na_as_text() {
    let options = CsvOptions {
        null_values: Vec::new(),
        ..CsvOptions::default()
    };
    let table = import_csv(Cursor::new(b"age\nNA\n52\n".to_vec()), options).unwrap();

    let age = table.column("age").unwrap();
    assert_eq!(age.column_type(), ColumnType::Text);
    assert_eq!(age.values(), &[Value::from("NA"), Value::from("52")]);
}

#[test]
fn extra_fields_after_the_sample_are_dropped() {
    let options = CsvOptions {
        sample_rows: 1,
        ..CsvOptions::default()
    };
    let table = import_csv(Cursor::new(b"a,b\n1,2\n3,4,5\n".to_vec()), options).unwrap();

    assert_eq!(table.column_count(), 2);
    assert_eq!(table.row_count(), 2);
    assert_eq!(
        table.column("b").unwrap().values(),
        &[Value::Number(2.0), Value::Number(4.0)]
    );
}

#[test]
fn strips_utf8_bom_from_first_header() {
    let mut bytes = vec![0xEF, 0xBB, 0xBF];
    bytes.extend_from_slice(b"gender\nFemale\n");
    let table = import_csv(Cursor::new(bytes), CsvOptions::default()).unwrap();
    assert!(table.has_column("gender"));
}

#[test]
fn auto_encoding_falls_back_to_windows_1252() {
    // "Jos\xE9" is "José" in Windows-1252 and invalid UTF-8.
    let table = import_csv(
        Cursor::new(b"name\nJos\xE9\n".to_vec()),
        CsvOptions::default(),
    )
    .unwrap();
    assert_eq!(
        table.column("name").unwrap().values(),
        &[Value::from("José")]
    );
}

#[test]
fn strict_utf8_rejects_invalid_bytes() {
    let options = CsvOptions {
        encoding: CsvTextEncoding::Utf8,
        ..CsvOptions::default()
    };
    let err = import_csv(Cursor::new(b"name\nJos\xE9\n".to_vec()), options).unwrap_err();
    assert!(
        matches!(err, CsvImportError::Parse { row: 2, column: 1, .. }),
        "unexpected error: {err}"
    );
}

#[test]
fn empty_input_is_an_error() {
    let err = import_csv(Cursor::new(Vec::new()), CsvOptions::default()).unwrap_err();
    assert!(matches!(err, CsvImportError::EmptyInput));
}

#[test]
fn headerless_input_gets_generated_names() {
    let options = CsvOptions {
        has_header: false,
        ..CsvOptions::default()
    };
    let table = import_csv(Cursor::new(b"Female,34\nMale,50\n".to_vec()), options).unwrap();
    let names: Vec<&str> = table.columns().iter().map(|c| c.name()).collect();
    assert_eq!(names, vec!["Column1", "Column2"]);
    assert_eq!(table.row_count(), 2);
}

#[test]
fn semicolon_delimiter() {
    let options = CsvOptions {
        delimiter: b';',
        ..CsvOptions::default()
    };
    let table = import_csv(Cursor::new(b"gender;age\nFemale;34\n".to_vec()), options).unwrap();
    assert_eq!(
        table.column("age").unwrap().values(),
        &[Value::Number(34.0)]
    );
}
