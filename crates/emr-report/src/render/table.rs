/// Serialize header-first rows as CSV. Rows may have different lengths.
pub fn to_csv_bytes(rows: &[Vec<String>]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    for row in rows {
        writer.write_record(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

/// Percent cells are exported with two decimals (`33.33`).
pub fn format_percent(value: f64) -> String {
    format_fixed(value, 2)
}

/// `value` with exactly `decimals` digits after the point.
pub fn format_fixed(value: f64, decimals: usize) -> String {
    format!("{value:.decimals$}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_fields_that_need_it() {
        let rows = vec![
            vec!["medical_condition".to_string(), "count".to_string()],
            vec!["Heart disease, chronic".to_string(), "3".to_string()],
        ];
        let bytes = to_csv_bytes(&rows).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "medical_condition,count\n\"Heart disease, chronic\",3\n"
        );
    }
}
