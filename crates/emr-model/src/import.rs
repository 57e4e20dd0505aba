use std::borrow::Cow;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use csv::ByteRecord;
use encoding_rs::WINDOWS_1252;
use thiserror::Error;

use crate::table::{ColumnSchema, Table, TableError};
use crate::value::{ColumnType, Value};

#[derive(Clone, Debug)]
pub struct CsvOptions {
    pub delimiter: u8,
    pub has_header: bool,
    /// Number of leading data rows used to infer column types.
    pub sample_rows: usize,
    /// How to decode raw CSV bytes into text fields.
    pub encoding: CsvTextEncoding,
    /// Decimal separator used when parsing numbers.
    ///
    /// `.` matches inputs like `1,234.56`. `,` matches inputs like `1.234,56`.
    pub decimal_separator: char,
    /// Field values read as missing, compared after trimming. Empty fields are always missing.
    ///
    /// Defaults to [`DEFAULT_NULL_VALUES`]; an empty list keeps tokens like `NA` as text.
    pub null_values: Vec<String>,
}

/// Tokens read as missing by default, the same set dataframe tools recognize.
pub const DEFAULT_NULL_VALUES: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>",
    "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
            sample_rows: 100,
            encoding: CsvTextEncoding::Auto,
            decimal_separator: '.',
            null_values: DEFAULT_NULL_VALUES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CsvTextEncoding {
    /// Attempt to decode as UTF-8; if a field contains invalid UTF-8, fall back to Windows-1252.
    ///
    /// This matches what spreadsheet tools on Windows do when they export CSV.
    Auto,
    /// Decode as UTF-8 and reject invalid byte sequences.
    Utf8,
    /// Decode as Windows-1252 (aka CP-1252).
    Windows1252,
}

#[derive(Debug, Error)]
pub enum CsvImportError {
    #[error("csv input was empty")]
    EmptyInput,
    #[error("csv parse error at row {row}, column {column}: {reason}")]
    Parse { row: u64, column: u64, reason: String },
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Open `path` and import it with [`import_csv`].
pub fn import_csv_path(path: &Path, options: CsvOptions) -> Result<Table, CsvImportError> {
    let file = File::open(path)?;
    import_csv(BufReader::new(file), options)
}

/// Import a CSV stream into a [`Table`].
///
/// Column types are inferred from the first `options.sample_rows` data rows: a column is
/// [`ColumnType::Number`] when every non-missing sampled field parses as a number. Empty fields
/// and `options.null_values` tokens are missing and import as [`Value::Blank`], as do fields of a
/// numeric column that fail to parse later in the stream. Fields beyond the inferred column count
/// are dropped with a warning.
pub fn import_csv<R: BufRead>(reader: R, options: CsvOptions) -> Result<Table, CsvImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        // Headers are handled manually so row/column locations in errors stay consistent.
        .has_headers(false)
        // Accept rows with varying column counts; short rows are padded with blanks.
        .flexible(true)
        .from_reader(reader);

    let mut record = ByteRecord::new();
    let mut record_index: u64 = 0;

    let has_first = csv_reader
        .read_byte_record(&mut record)
        .map_err(|e| map_csv_error(e, record_index + 1))?;
    if !has_first {
        return Err(CsvImportError::EmptyInput);
    }
    record_index += 1;

    let mut header_names: Vec<String> = Vec::new();
    let mut sample_rows: Vec<Vec<String>> = Vec::new();
    let mut column_count: usize;

    if options.has_header {
        header_names = decode_record_to_strings(&record, record_index, options.encoding)?;
        column_count = header_names.len();
    } else {
        let row = decode_record_to_strings(&record, record_index, options.encoding)?;
        column_count = row.len();
        sample_rows.push(row);
    }

    while sample_rows.len() < options.sample_rows {
        record.clear();
        match csv_reader.read_byte_record(&mut record) {
            Ok(false) => break,
            Ok(true) => {
                record_index += 1;
                let row = decode_record_to_strings(&record, record_index, options.encoding)?;
                column_count = column_count.max(row.len());
                sample_rows.push(row);
            }
            Err(e) => return Err(map_csv_error(e, record_index + 1)),
        }
    }

    // An empty header row still implies a single (unnamed) column.
    if column_count == 0 {
        column_count = 1;
    }

    if header_names.len() < column_count {
        header_names.extend((header_names.len()..column_count).map(|i| format!("Column{}", i + 1)));
    }
    let header_names = dedupe_header_names(header_names);

    let column_types = infer_column_types(&sample_rows, column_count, &options);
    let schema: Vec<ColumnSchema> = header_names
        .into_iter()
        .zip(column_types.iter().copied())
        .map(|(name, column_type)| ColumnSchema { name, column_type })
        .collect();
    let mut table = Table::new(schema)?;

    let mut string_pool = StringPool::default();
    let mut coerced: u64 = 0;
    let mut dropped: u64 = 0;

    for row in &sample_rows {
        let values = (0..column_count)
            .map(|i| {
                let field = row.get(i).map(|s| s.as_str()).unwrap_or("");
                parse_typed_value(field, column_types[i], &options, &mut string_pool, &mut coerced)
            })
            .collect();
        table.push_row(values)?;
    }

    // Stream the remainder.
    loop {
        record.clear();
        match csv_reader.read_byte_record(&mut record) {
            Ok(false) => break,
            Ok(true) => {
                record_index += 1;
                dropped += record.len().saturating_sub(column_count) as u64;
                let mut values = Vec::with_capacity(column_count);
                for (i, column_type) in column_types.iter().copied().enumerate() {
                    let raw = record.get(i).unwrap_or(b"");
                    let field = decode_field(raw, record_index, i as u64 + 1, options.encoding)?;
                    values.push(parse_typed_value(
                        field.as_ref(),
                        column_type,
                        &options,
                        &mut string_pool,
                        &mut coerced,
                    ));
                }
                table.push_row(values)?;
            }
            Err(e) => return Err(map_csv_error(e, record_index + 1)),
        }
    }

    if coerced > 0 {
        log::warn!("{coerced} non-numeric field(s) in numeric columns were imported as blanks");
    }
    if dropped > 0 {
        log::warn!("{dropped} field(s) beyond the {column_count} inferred column(s) were dropped");
    }
    log::debug!(
        "imported {} rows x {} columns",
        table.row_count(),
        table.column_count()
    );

    Ok(table)
}

fn dedupe_header_names(names: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(names.len());
    let mut out = Vec::with_capacity(names.len());
    for name in names {
        let name = name.trim().to_string();
        let mut candidate = name.clone();
        let mut suffix = 1;
        while seen.contains(&candidate) {
            candidate = format!("{name}.{suffix}");
            suffix += 1;
        }
        seen.insert(candidate.clone());
        out.push(candidate);
    }
    out
}

fn parse_typed_value(
    field: &str,
    column_type: ColumnType,
    options: &CsvOptions,
    string_pool: &mut StringPool,
    coerced: &mut u64,
) -> Value {
    let v = field.trim();
    if is_missing(v, options) {
        return Value::Blank;
    }

    match column_type {
        ColumnType::Number => match parse_number_f64(v, options) {
            Some(n) => Value::Number(n),
            None => {
                *coerced += 1;
                Value::Blank
            }
        },
        ColumnType::Text => Value::Text(string_pool.intern(v)),
    }
}

fn is_missing(v: &str, options: &CsvOptions) -> bool {
    v.is_empty() || options.null_values.iter().any(|token| token == v)
}

fn infer_column_types(
    sample_rows: &[Vec<String>],
    column_count: usize,
    options: &CsvOptions,
) -> Vec<ColumnType> {
    let mut out = Vec::with_capacity(column_count);
    for col in 0..column_count {
        let mut saw_value = false;
        let mut is_number = true;

        for row in sample_rows {
            let v = row.get(col).map(|s| s.trim()).unwrap_or("");
            if is_missing(v, options) {
                continue;
            }
            saw_value = true;
            if parse_number_f64(v, options).is_none() {
                is_number = false;
                break;
            }
        }

        out.push(if saw_value && is_number {
            ColumnType::Number
        } else {
            ColumnType::Text
        });
    }
    out
}

/// Parse a numeric field, skipping grouping separators (`1,234.5`, or `1.234,5` when the decimal
/// separator is `,`).
fn parse_number_f64(v: &str, options: &CsvOptions) -> Option<f64> {
    let decimal = options.decimal_separator;
    let grouping = if decimal == ',' { '.' } else { ',' };

    let mut cleaned = String::with_capacity(v.len());
    for ch in v.trim().chars() {
        match ch {
            c if c == decimal => cleaned.push('.'),
            c if c == grouping => {}
            ' ' | '\u{00A0}' | '\u{202F}' | '_' | '\'' => {}
            c if c.is_ascii_digit() || matches!(c, '+' | '-' | 'e' | 'E') => cleaned.push(c),
            _ => return None,
        }
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn decode_record_to_strings(
    record: &ByteRecord,
    row: u64,
    encoding: CsvTextEncoding,
) -> Result<Vec<String>, CsvImportError> {
    if record.len() == 0 {
        return Ok(vec![String::new()]);
    }

    let mut out = Vec::with_capacity(record.len());
    for (idx, field) in record.iter().enumerate() {
        let s = decode_field(field, row, idx as u64 + 1, encoding)?;
        out.push(s.into_owned());
    }
    Ok(out)
}

fn decode_field<'a>(
    field: &'a [u8],
    row: u64,
    column: u64,
    encoding: CsvTextEncoding,
) -> Result<Cow<'a, str>, CsvImportError> {
    // UTF-8 BOM at the very start of the input.
    let field = match field.strip_prefix(b"\xEF\xBB\xBF") {
        Some(rest) if row == 1 && column == 1 => rest,
        _ => field,
    };

    match (encoding, std::str::from_utf8(field)) {
        (CsvTextEncoding::Windows1252, _) | (CsvTextEncoding::Auto, Err(_)) => {
            Ok(WINDOWS_1252.decode_without_bom_handling(field).0)
        }
        (_, Ok(s)) => Ok(Cow::Borrowed(s)),
        (CsvTextEncoding::Utf8, Err(e)) => Err(CsvImportError::Parse {
            row,
            column,
            reason: format!("invalid UTF-8: {e}"),
        }),
    }
}

fn map_csv_error(err: csv::Error, fallback_row: u64) -> CsvImportError {
    let reason = err.to_string();
    let pos = err.position().cloned();

    match err.into_kind() {
        csv::ErrorKind::Io(e) => CsvImportError::Io(e),
        _ => {
            let row = pos
                .map(|p| p.record())
                .filter(|r| *r > 0)
                .unwrap_or(fallback_row);
            CsvImportError::Parse {
                row,
                column: 0,
                reason,
            }
        }
    }
}

/// Interns repeated category strings so a column of `"Female"` cells shares one allocation.
#[derive(Default)]
struct StringPool {
    strings: HashSet<Arc<str>>,
}

impl StringPool {
    fn intern(&mut self, s: &str) -> Arc<str> {
        if let Some(existing) = self.strings.get(s) {
            return existing.clone();
        }
        let interned: Arc<str> = Arc::from(s);
        self.strings.insert(interned.clone());
        interned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_grouped_and_signed_numbers() {
        let options = CsvOptions::default();
        assert_eq!(parse_number_f64("1,234.5", &options), Some(1234.5));
        assert_eq!(parse_number_f64("-42", &options), Some(-42.0));
        assert_eq!(parse_number_f64("+7", &options), Some(7.0));
        assert_eq!(parse_number_f64("1e3", &options), Some(1000.0));
        assert_eq!(parse_number_f64("1e", &options), None);
        assert_eq!(parse_number_f64("forty", &options), None);
    }

    #[test]
    fn respects_comma_decimal_separator() {
        let options = CsvOptions {
            decimal_separator: ',',
            ..CsvOptions::default()
        };
        assert_eq!(parse_number_f64("1.234,5", &options), Some(1234.5));
    }

    #[test]
    fn null_tokens_are_missing_unless_cleared() {
        let options = CsvOptions::default();
        assert!(is_missing("NA", &options));
        assert!(is_missing("#N/A", &options));
        assert!(!is_missing("na", &options));
        let options = CsvOptions {
            null_values: Vec::new(),
            ..CsvOptions::default()
        };
        assert!(!is_missing("NA", &options));
        assert!(is_missing("", &options));
    }

    #[test]
    fn duplicate_headers_get_numeric_suffixes() {
        assert_eq!(
            dedupe_header_names(vec!["age".into(), " age ".into(), "age".into()]),
            vec!["age".to_string(), "age.1".to_string(), "age.2".to_string()]
        );
    }
}
