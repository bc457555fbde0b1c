use crate::project::Project;
use crate::risk::SimulationResult;
use chrono::NaiveDate;
use polars::prelude::PlSmallStr;
use polars::prelude::*;

fn date_to_i32(date: NaiveDate) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).expect("epoch");
    (date - epoch).num_days() as i32
}

fn date_series(name: &str, dates: Vec<Option<NaiveDate>>) -> PolarsResult<Series> {
    let raw: Vec<Option<i32>> = dates
        .into_iter()
        .map(|date| date.map(date_to_i32))
        .collect();
    Series::new(name.into(), raw).cast(&DataType::Date)
}

/// Tabular projection of the scheduled network, one row per activity, for
/// rendering and export.
pub fn schedule_dataframe(project: &Project) -> PolarsResult<DataFrame> {
    let activities = project.activities();

    let ids: Vec<i32> = activities.iter().map(|a| a.id).collect();
    let names: Vec<&str> = activities.iter().map(|a| a.name.as_str()).collect();
    let kinds: Vec<&str> = activities.iter().map(|a| a.kind.as_str()).collect();
    let durations: Vec<i64> = activities.iter().map(|a| a.duration_days).collect();
    let percent: Vec<f64> = activities.iter().map(|a| a.percent_complete).collect();
    let floats: Vec<Option<i64>> = activities.iter().map(|a| a.total_float_days).collect();
    let critical: Vec<Option<bool>> = activities.iter().map(|a| a.is_critical).collect();

    let columns = vec![
        Series::new(PlSmallStr::from_static("id"), ids).into_column(),
        Series::new(PlSmallStr::from_static("name"), names).into_column(),
        Series::new(PlSmallStr::from_static("kind"), kinds).into_column(),
        Series::new(PlSmallStr::from_static("duration_days"), durations).into_column(),
        date_series(
            "early_start",
            activities.iter().map(|a| a.early_start).collect(),
        )?
        .into_column(),
        date_series(
            "early_finish",
            activities.iter().map(|a| a.early_finish).collect(),
        )?
        .into_column(),
        date_series(
            "late_start",
            activities.iter().map(|a| a.late_start).collect(),
        )?
        .into_column(),
        date_series(
            "late_finish",
            activities.iter().map(|a| a.late_finish).collect(),
        )?
        .into_column(),
        Series::new(PlSmallStr::from_static("total_float_days"), floats).into_column(),
        Series::new(PlSmallStr::from_static("is_critical"), critical).into_column(),
        Series::new(PlSmallStr::from_static("percent_complete"), percent).into_column(),
    ];

    DataFrame::new(columns)
}

/// Tabular projection of a simulation run, one row per activity, for
/// tornado/criticality charts.
pub fn simulation_dataframe(result: &SimulationResult) -> PolarsResult<DataFrame> {
    let ids: Vec<i32> = result.criticality_index.keys().copied().collect();
    let criticality: Vec<f64> = result.criticality_index.values().copied().collect();
    let sensitivity: Vec<f64> = ids
        .iter()
        .map(|id| result.sensitivity_index.get(id).copied().unwrap_or(0.0))
        .collect();

    let columns = vec![
        Series::new(PlSmallStr::from_static("activity_id"), ids).into_column(),
        Series::new(PlSmallStr::from_static("criticality_index"), criticality).into_column(),
        Series::new(PlSmallStr::from_static("sensitivity_index"), sensitivity).into_column(),
    ];

    DataFrame::new(columns)
}

/// Render a DataFrame as a fixed-width text table.
pub fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let cell = |col: &Column, row_idx: usize| -> String {
        match col.get(row_idx) {
            Ok(AnyValue::Null) => String::new(),
            Ok(av) => av.to_string(),
            Err(_) => String::new(),
        }
    };

    let mut widths: Vec<usize> = col_names.iter().map(|n| n.len()).collect();
    for (ci, col) in columns.iter().enumerate() {
        for row_idx in 0..df.height() {
            let s = cell(col, row_idx);
            if s.len() > widths[ci] {
                widths[ci] = s.len();
            }
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');

    out.push('|');
    for (i, name) in col_names.iter().enumerate() {
        out.push(' ');
        out.push_str(name);
        out.push_str(&" ".repeat(widths[i] - name.len()));
        out.push_str(" |");
    }
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');

    for row_idx in 0..df.height() {
        out.push('|');
        for (ci, col) in columns.iter().enumerate() {
            let s = cell(col, row_idx);
            out.push(' ');
            out.push_str(&s);
            out.push_str(&" ".repeat(widths[ci].saturating_sub(s.len())));
            out.push_str(" |");
        }
        out.push('\n');
    }

    out.push_str(&sep);
    out.push('\n');
    out
}
