//! The built-in report definitions.
//!
//! Each report derives its own key columns from the table, so bucketing age for one report never
//! leaks into another.

use emr_model::summarize;
use emr_pivot::{
    aggregate, group_totals, grouped_five_number, histogram, materialize, normalize,
    numeric_column, value_counts, Aggregate, BucketScheme, KeyColumn, PivotGrid,
};

use crate::error::ReportError;
use crate::registry::{ReportArtifact, ReportContext, ReportSpec};
use crate::render::{
    format_fixed, format_percent, BarChart, BoxPlotChart, Chart, GroupedBarChart, HeatPalette,
    HeatmapChart, HistogramChart, Series,
};

pub const GENDER: &str = "gender";
pub const ETHNICITY: &str = "ethnicity";
pub const AGE: &str = "age";
pub const CONDITION: &str = "medical_condition";

/// Every built-in report, in run order.
pub fn default_registry() -> Vec<ReportSpec> {
    vec![
        ReportSpec {
            id: "overview",
            title: "Dataset Overview",
            required_columns: &[],
            run: overview,
        },
        ReportSpec {
            id: "gender_distribution",
            title: "Gender Distribution",
            required_columns: &[GENDER],
            run: gender_distribution,
        },
        ReportSpec {
            id: "top_diagnoses",
            title: "Top Diagnoses",
            required_columns: &[CONDITION],
            run: top_diagnoses,
        },
        ReportSpec {
            id: "ethnicity_distribution",
            title: "Ethnicity",
            required_columns: &[ETHNICITY],
            run: ethnicity_distribution,
        },
        ReportSpec {
            id: "age_distribution",
            title: "Age Distribution",
            required_columns: &[AGE],
            run: age_distribution,
        },
        ReportSpec {
            id: "condition_prevalence",
            title: "Prevalence of Medical Conditions",
            required_columns: &[CONDITION],
            run: condition_prevalence,
        },
        ReportSpec {
            id: "condition_by_gender",
            title: "Prevalence of Medical Conditions by Gender",
            required_columns: &[CONDITION, GENDER],
            run: condition_by_gender,
        },
        ReportSpec {
            id: "age_by_condition",
            title: "Age Range per Medical Condition",
            required_columns: &[CONDITION, AGE],
            run: age_by_condition,
        },
        ReportSpec {
            id: "condition_by_age_band",
            title: "Top Medical Conditions by Age Group",
            required_columns: &[AGE, CONDITION],
            run: condition_by_age_band,
        },
        ReportSpec {
            id: "condition_by_ethnicity",
            title: "Medical Conditions by Ethnicity",
            required_columns: &[ETHNICITY, CONDITION],
            run: condition_by_ethnicity,
        },
        ReportSpec {
            id: "condition_share_by_ethnicity",
            title: "Percent of Medical Conditions by Ethnicity",
            required_columns: &[ETHNICITY, CONDITION],
            run: condition_share_by_ethnicity,
        },
        ReportSpec {
            id: "condition_by_life_stage",
            title: "Medical Condition Risk by Age Group",
            required_columns: &[AGE, CONDITION],
            run: condition_by_life_stage,
        },
        ReportSpec {
            id: "condition_share_by_life_stage",
            title: "Percent of Medical Conditions by Age Group",
            required_columns: &[AGE, CONDITION],
            run: condition_share_by_life_stage,
        },
    ]
}

fn overview(ctx: &ReportContext<'_>) -> Result<ReportArtifact, ReportError> {
    let summary = summarize(ctx.table);

    let mut rows = vec![vec![
        "column".to_string(),
        "type".to_string(),
        "non_null".to_string(),
        "missing".to_string(),
        "distinct".to_string(),
    ]];
    rows.extend(summary.column_summaries.iter().map(|c| {
        vec![
            c.name.clone(),
            c.column_type.to_string(),
            c.non_null.to_string(),
            c.missing.to_string(),
            c.distinct.to_string(),
        ]
    }));

    Ok(ReportArtifact::default()
        .with_table(rows)
        .with_json(serde_json::to_value(&summary)?))
}

fn gender_distribution(ctx: &ReportContext<'_>) -> Result<ReportArtifact, ReportError> {
    counts_report(ctx, GENDER, "Gender Distribution", "Gender", "Count", false)
}

fn top_diagnoses(ctx: &ReportContext<'_>) -> Result<ReportArtifact, ReportError> {
    counts_report(ctx, CONDITION, "Top Diagnoses", "Count", "Medical Condition", true)
}

fn ethnicity_distribution(ctx: &ReportContext<'_>) -> Result<ReportArtifact, ReportError> {
    counts_report(ctx, ETHNICITY, "Ethnicity", "Ethnicity", "Count", false)
}

fn condition_prevalence(ctx: &ReportContext<'_>) -> Result<ReportArtifact, ReportError> {
    counts_report(
        ctx,
        CONDITION,
        "Prevalence of Medical Conditions",
        "Number of Patients",
        "Medical Condition",
        true,
    )
}

/// Bar chart and table of the value counts of one categorical column, most frequent first.
fn counts_report(
    ctx: &ReportContext<'_>,
    column: &str,
    title: &str,
    x_label: &str,
    y_label: &str,
    horizontal: bool,
) -> Result<ReportArtifact, ReportError> {
    let keys = KeyColumn::categorical(ctx.table, column)?;
    let counts = value_counts(&keys);
    if counts.is_empty() {
        return Err(no_data(column));
    }

    let mut rows = vec![vec![column.to_string(), "count".to_string()]];
    rows.extend(
        counts
            .iter()
            .map(|(key, count)| vec![key.to_string(), count.to_string()]),
    );

    let chart = Chart::Bar(BarChart {
        title: title.to_string(),
        x_label: x_label.to_string(),
        y_label: y_label.to_string(),
        categories: counts.iter().map(|(key, _)| key.to_string()).collect(),
        values: counts.iter().map(|(_, count)| *count as f64).collect(),
        horizontal,
    });

    Ok(ReportArtifact::default().with_chart(chart).with_table(rows))
}

fn age_distribution(ctx: &ReportContext<'_>) -> Result<ReportArtifact, ReportError> {
    let ages: Vec<f64> = numeric_column(ctx.table, AGE)?.into_iter().flatten().collect();
    let bins = histogram(&ages, ctx.settings.histogram_bins);
    if bins.is_empty() {
        return Err(no_data(AGE));
    }

    let mut rows = vec![vec!["start".to_string(), "end".to_string(), "count".to_string()]];
    rows.extend(
        bins.iter().map(|b| {
            vec![
                format_fixed(b.start, 2),
                format_fixed(b.end, 2),
                b.count.to_string(),
            ]
        }),
    );

    let chart = Chart::Histogram(HistogramChart {
        title: "Age Distribution".to_string(),
        x_label: "Age".to_string(),
        y_label: "Count".to_string(),
        bins,
    });
    Ok(ReportArtifact::default().with_chart(chart).with_table(rows))
}

fn condition_by_gender(ctx: &ReportContext<'_>) -> Result<ReportArtifact, ReportError> {
    let conditions = KeyColumn::categorical(ctx.table, CONDITION)?;
    let genders = KeyColumn::categorical(ctx.table, GENDER)?;

    // Conditions are listed by overall prevalence rather than alphabetically.
    let by_prevalence = value_counts(&conditions).into_iter().map(|(key, _)| key).collect();
    let conditions = conditions.with_domain(by_prevalence);

    let (_, grid) = count_grid(&conditions, &genders)?;
    let chart = Chart::GroupedBar(GroupedBarChart {
        title: "Prevalence of Medical Conditions by Gender".to_string(),
        x_label: "Count".to_string(),
        y_label: "Medical Condition".to_string(),
        groups: labels(grid.row_labels()),
        series: series_by_column(&grid),
        horizontal: true,
    });

    Ok(ReportArtifact::default()
        .with_chart(chart)
        .with_table(grid.to_string_rows(CONDITION, |v| v.to_string())))
}

fn age_by_condition(ctx: &ReportContext<'_>) -> Result<ReportArtifact, ReportError> {
    let conditions = KeyColumn::categorical(ctx.table, CONDITION)?;
    let ages = numeric_column(ctx.table, AGE)?;
    let boxes = grouped_five_number(&conditions, &ages)?;
    if boxes.is_empty() {
        return Err(no_data(AGE));
    }

    let mut rows = vec![[
        CONDITION,
        "count",
        "whisker_low",
        "q1",
        "median",
        "q3",
        "whisker_high",
        "outliers",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect::<Vec<_>>()];
    rows.extend(boxes.iter().map(|b| {
        vec![
            b.group.clone(),
            b.count.to_string(),
            b.whisker_low.to_string(),
            b.q1.to_string(),
            b.median.to_string(),
            b.q3.to_string(),
            b.whisker_high.to_string(),
            b.outliers.len().to_string(),
        ]
    }));

    let json = serde_json::to_value(&boxes)?;
    let chart = Chart::BoxPlot(BoxPlotChart {
        title: "Age Range per Medical Condition".to_string(),
        x_label: "Medical Condition".to_string(),
        y_label: "Age".to_string(),
        boxes,
    });
    Ok(ReportArtifact::default()
        .with_chart(chart)
        .with_table(rows)
        .with_json(json))
}

fn condition_by_age_band(ctx: &ReportContext<'_>) -> Result<ReportArtifact, ReportError> {
    let scheme = &ctx.settings.age_bands;
    let bands = KeyColumn::bucketed(ctx.table, AGE, scheme)?;
    let conditions = KeyColumn::categorical(ctx.table, CONDITION)?;

    let (_, grid) = count_grid(&bands, &conditions)?;
    let chart = Chart::GroupedBar(GroupedBarChart {
        title: "Top Medical Conditions by Age Group".to_string(),
        x_label: "Age Group".to_string(),
        y_label: "Count".to_string(),
        groups: labels(grid.row_labels()),
        series: series_by_column(&grid),
        horizontal: false,
    });

    Ok(ReportArtifact::default()
        .with_chart(chart)
        .with_table(grid.to_string_rows("age_group", |v| v.to_string()))
        .with_note(unassigned_note(&bands, scheme)))
}

fn condition_by_ethnicity(ctx: &ReportContext<'_>) -> Result<ReportArtifact, ReportError> {
    let ethnicities = KeyColumn::categorical(ctx.table, ETHNICITY)?;
    let conditions = KeyColumn::categorical(ctx.table, CONDITION)?;

    let (_, grid) = count_grid(&ethnicities, &conditions)?;
    let table = grid.to_string_rows(ETHNICITY, |v| v.to_string());
    let chart = Chart::Heatmap(HeatmapChart {
        title: "Medical Conditions by Ethnicity".to_string(),
        x_label: "Medical Condition".to_string(),
        y_label: "Ethnicity".to_string(),
        grid: grid.map(|v| v as f64),
        decimals: 0,
        palette: HeatPalette::Blues,
        scale_label: Some("Patients".to_string()),
    });
    Ok(ReportArtifact::default().with_chart(chart).with_table(table))
}

fn condition_share_by_ethnicity(ctx: &ReportContext<'_>) -> Result<ReportArtifact, ReportError> {
    let ethnicities = KeyColumn::categorical(ctx.table, ETHNICITY)?;
    let conditions = KeyColumn::categorical(ctx.table, CONDITION)?;

    let grid = share_grid(ctx, &ethnicities, &conditions)?;
    let chart = Chart::Heatmap(HeatmapChart {
        title: "Percent of Medical Conditions by Ethnicity".to_string(),
        x_label: "Medical Condition".to_string(),
        y_label: "Ethnicity".to_string(),
        grid: grid.clone(),
        decimals: 1,
        palette: HeatPalette::YellowOrangeRed,
        scale_label: Some("% of People in Ethnicity Group".to_string()),
    });
    Ok(ReportArtifact::default()
        .with_chart(chart)
        .with_table(grid.to_string_rows(ETHNICITY, format_percent)))
}

fn condition_by_life_stage(ctx: &ReportContext<'_>) -> Result<ReportArtifact, ReportError> {
    let scheme = &ctx.settings.life_stages;
    let stages = KeyColumn::bucketed(ctx.table, AGE, scheme)?;
    let conditions = KeyColumn::categorical(ctx.table, CONDITION)?;

    let (_, grid) = count_grid(&stages, &conditions)?;
    let table = grid.to_string_rows("age_group", |v| v.to_string());
    let chart = Chart::Heatmap(HeatmapChart {
        title: "Medical Condition Risk by Age Group".to_string(),
        x_label: "Medical Condition".to_string(),
        y_label: "Age Group".to_string(),
        grid: grid.map(|v| v as f64),
        decimals: 0,
        palette: HeatPalette::Oranges,
        scale_label: Some("Patients".to_string()),
    });
    Ok(ReportArtifact::default()
        .with_chart(chart)
        .with_table(table)
        .with_note(unassigned_note(&stages, scheme)))
}

fn condition_share_by_life_stage(ctx: &ReportContext<'_>) -> Result<ReportArtifact, ReportError> {
    let scheme = &ctx.settings.life_stages;
    let stages = KeyColumn::bucketed(ctx.table, AGE, scheme)?;
    let conditions = KeyColumn::categorical(ctx.table, CONDITION)?;

    let grid = share_grid(ctx, &stages, &conditions)?;
    let chart = Chart::Heatmap(HeatmapChart {
        title: "Percent of Medical Conditions by Age Group".to_string(),
        x_label: "Medical Condition".to_string(),
        y_label: "Age Group".to_string(),
        grid: grid.clone(),
        decimals: 1,
        palette: HeatPalette::Oranges,
        scale_label: Some("% of People in Age Group".to_string()),
    });
    Ok(ReportArtifact::default()
        .with_chart(chart)
        .with_table(grid.to_string_rows("age_group", format_percent))
        .with_note(unassigned_note(&stages, scheme)))
}

/// Count cross-tabulation of `rows` x `cols` over their domains.
fn count_grid(
    rows: &KeyColumn,
    cols: &KeyColumn,
) -> Result<(Vec<Aggregate>, PivotGrid<usize>), ReportError> {
    let aggregates = aggregate(rows, cols)?;
    if aggregates.is_empty() {
        return Err(no_data(rows.name()));
    }
    let grid = materialize(&aggregates, rows.domain(), cols.domain(), 0);
    Ok((aggregates, grid))
}

/// Percent of each row group falling into each column category.
///
/// Row totals count every record with a row key, whether or not it has a column key. Only observed
/// combinations are normalized; rows without any record (an empty age bucket) stay at `0.0`.
fn share_grid(
    ctx: &ReportContext<'_>,
    rows: &KeyColumn,
    cols: &KeyColumn,
) -> Result<PivotGrid<f64>, ReportError> {
    let (aggregates, _) = count_grid(rows, cols)?;
    let totals = group_totals(rows);
    let normalized = normalize(&aggregates, &totals, ctx.settings.degenerate_policy)?;
    Ok(materialize(&normalized, rows.domain(), cols.domain(), 0.0))
}

/// One series per grid column, valued along the grid rows.
fn series_by_column(grid: &PivotGrid<usize>) -> Vec<Series> {
    let (rows, _) = grid.shape();
    grid.col_labels()
        .iter()
        .enumerate()
        .map(|(c, name)| Series {
            name: name.to_string(),
            values: (0..rows)
                .map(|r| grid.get(r, c).unwrap_or(0) as f64)
                .collect(),
        })
        .collect()
}

fn labels(keys: &[emr_pivot::Key]) -> Vec<String> {
    keys.iter().map(|k| k.to_string()).collect()
}

fn unassigned_note(column: &KeyColumn, scheme: &BucketScheme) -> Option<String> {
    if column.unassigned() == 0 {
        return None;
    }
    let (lo, hi) = scheme.range();
    Some(format!(
        "{} record(s) with {} outside [{lo}, {hi}) were left unassigned",
        column.unassigned(),
        column.name()
    ))
}

fn no_data(column: &str) -> ReportError {
    ReportError::NoData {
        column: column.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportSettings;
    use emr_model::{ColumnSchema, ColumnType, Table, Value};
    use emr_pivot::DegeneratePolicy;
    use pretty_assertions::assert_eq;

    fn patients(rows: &[(&str, &str, f64)]) -> Table {
        let mut table = Table::new(vec![
            ColumnSchema::new(ETHNICITY, ColumnType::Text),
            ColumnSchema::new(CONDITION, ColumnType::Text),
            ColumnSchema::new(AGE, ColumnType::Number),
        ])
        .unwrap();
        for (ethnicity, condition, age) in rows {
            table
                .push_row(vec![(*ethnicity).into(), (*condition).into(), Value::from(*age)])
                .unwrap();
        }
        table
    }

    #[test]
    fn registry_ids_are_unique() {
        let registry = default_registry();
        let mut ids: Vec<&str> = registry.iter().map(|s| s.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), registry.len());
        assert_eq!(registry.len(), 13);
    }

    #[test]
    fn share_by_ethnicity_table_uses_group_totals() {
        let table = patients(&[("A", "X", 30.0), ("A", "Y", 40.0), ("B", "X", 50.0)]);
        let settings = ReportSettings::default();
        let ctx = ReportContext {
            table: &table,
            settings: &settings,
        };
        let artifact = condition_share_by_ethnicity(&ctx).unwrap();
        assert_eq!(
            artifact.table.unwrap().rows,
            vec![
                vec!["ethnicity".to_string(), "X".to_string(), "Y".to_string()],
                vec!["A".to_string(), "50.00".to_string(), "50.00".to_string()],
                vec!["B".to_string(), "100.00".to_string(), "0.00".to_string()],
            ]
        );
    }

    #[test]
    fn empty_life_stages_are_zero_rows_under_default_policy() {
        // Nobody is 30 or older.
        let table = patients(&[("A", "X", 10.0), ("A", "Y", 20.0)]);
        let settings = ReportSettings::default();
        assert_eq!(settings.degenerate_policy, DegeneratePolicy::Fail);
        let ctx = ReportContext {
            table: &table,
            settings: &settings,
        };
        let rows = condition_share_by_life_stage(&ctx).unwrap().table.unwrap().rows;
        assert_eq!(rows.len(), 7);
        assert_eq!(rows[1], vec!["0-17", "100.00", "0.00"]);
        assert_eq!(rows[2], vec!["18-29", "0.00", "100.00"]);
        assert_eq!(rows[3], vec!["30-44", "0.00", "0.00"]);
        assert_eq!(rows[6], vec!["75+", "0.00", "0.00"]);
    }

    #[test]
    fn histogram_edges_are_exported_with_fixed_decimals() {
        let table = patients(&[("A", "X", 1.0), ("A", "X", 2.0), ("A", "X", 92.0)]);
        let settings = ReportSettings {
            histogram_bins: 20,
            ..ReportSettings::default()
        };
        let ctx = ReportContext {
            table: &table,
            settings: &settings,
        };
        let rows = age_distribution(&ctx).unwrap().table.unwrap().rows;
        assert_eq!(rows.len(), 21);
        assert_eq!(rows[1], vec!["1.00", "5.55", "2"]);
        assert_eq!(rows[2], vec!["5.55", "10.10", "0"]);
        assert_eq!(rows[20], vec!["87.45", "92.00", "1"]);
    }

    #[test]
    fn out_of_range_ages_are_reported_as_notes() {
        let table = patients(&[("A", "X", 10.0), ("A", "X", 120.0)]);
        let settings = ReportSettings::default();
        let ctx = ReportContext {
            table: &table,
            settings: &settings,
        };
        let artifact = condition_by_age_band(&ctx).unwrap();
        assert_eq!(
            artifact.notes,
            vec!["1 record(s) with age outside [0, 100) were left unassigned".to_string()]
        );
        let rows = artifact.table.unwrap().rows;
        assert_eq!(rows[1], vec!["0-20", "1"]);
    }

    #[test]
    fn condition_by_gender_orders_conditions_by_prevalence() {
        let mut table = Table::with_text_columns(&[CONDITION, GENDER]).unwrap();
        for (condition, gender) in [("Asthma", "F"), ("Diabetes", "M"), ("Diabetes", "F")] {
            table
                .push_row(vec![condition.into(), gender.into()])
                .unwrap();
        }
        let settings = ReportSettings::default();
        let ctx = ReportContext {
            table: &table,
            settings: &settings,
        };
        let rows = condition_by_gender(&ctx).unwrap().table.unwrap().rows;
        assert_eq!(
            rows,
            vec![
                vec!["medical_condition", "F", "M"],
                vec!["Diabetes", "1", "1"],
                vec!["Asthma", "1", "0"],
            ]
        );
    }
}
