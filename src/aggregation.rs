//! Aggregation Engine - group rows by a dimension and reduce a metric per group
//!
//! Groups keep first-encounter order; nothing is sorted. Scatter widgets skip
//! grouping and plot raw rows, KPI widgets total every group into one value.

use crate::dataset::{CellValue, Dataset, Row};
use crate::error::Result;
use crate::widget::{Aggregation, ChartType, WidgetConfig};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::io::Write;

/// Label used for rows without a dimension value
pub const UNKNOWN_LABEL: &str = "Unknown";

/// One aggregated group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub label: String,
    pub value: f64,
}

/// Aggregated points bound to the column names they were computed from
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub dimension_key: String,
    pub metric_key: String,
    pub points: Vec<SeriesPoint>,
}

impl Series {
    /// Points as `{ <dimension>: label, <metric>: value }` objects, the shape
    /// charting libraries consume.
    pub fn to_records(&self) -> Vec<Value> {
        self.points
            .iter()
            .map(|p| {
                let mut obj = Map::new();
                obj.insert(self.dimension_key.clone(), Value::String(p.label.clone()));
                obj.insert(self.metric_key.clone(), number_value(p.value));
                Value::Object(obj)
            })
            .collect()
    }

    /// Export the series as two-column CSV with a header row.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record([self.dimension_key.as_str(), self.metric_key.as_str()])?;
        for point in &self.points {
            wtr.write_record([point.label.clone(), point.value.to_string()])?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// One scatter point taken straight from a row
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
}

/// What a widget renders from the current dataset
#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    Series(Series),
    Kpi(f64),
    Scatter(Vec<ScatterPoint>),
    /// Empty dataset or a dangling column reference
    NoData,
}

impl ChartData {
    pub fn is_empty(&self) -> bool {
        match self {
            ChartData::Series(series) => series.points.is_empty(),
            ChartData::Scatter(points) => points.is_empty(),
            ChartData::Kpi(_) => false,
            ChartData::NoData => true,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            ChartData::Series(series) => Value::Array(series.to_records()),
            ChartData::Kpi(total) => number_value(*total),
            ChartData::Scatter(points) => serde_json::to_value(points).unwrap_or(Value::Null),
            ChartData::NoData => Value::Null,
        }
    }
}

#[derive(Default)]
struct Accumulator {
    sum: f64,
    count: u64,
}

/// Group `rows` by `dimension_key` and reduce `metric_key` per group.
pub fn aggregate(
    rows: &[Row],
    dimension_key: &str,
    metric_key: &str,
    aggregation: Aggregation,
) -> Vec<SeriesPoint> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Accumulator> = HashMap::new();

    for row in rows {
        let label = group_label(row.get(dimension_key));
        let metric = row.get(metric_key).map(CellValue::coerce_f64).unwrap_or(0.0);

        let acc = groups.entry(label.clone()).or_insert_with(|| {
            order.push(label);
            Accumulator::default()
        });
        acc.sum += metric;
        acc.count += 1;
    }

    order
        .into_iter()
        .map(|label| {
            let acc = &groups[&label];
            let value = match aggregation {
                Aggregation::Sum => acc.sum,
                Aggregation::Avg if acc.count > 0 => round_half_up(acc.sum / acc.count as f64),
                Aggregation::Avg => 0.0,
                Aggregation::Count => acc.count as f64,
            };
            SeriesPoint { label, value }
        })
        .collect()
}

/// Aggregate, then total every group into one scalar.
pub fn kpi_total(
    rows: &[Row],
    dimension_key: &str,
    metric_key: &str,
    aggregation: Aggregation,
) -> f64 {
    aggregate(rows, dimension_key, metric_key, aggregation)
        .iter()
        .map(|p| p.value)
        .sum()
}

/// Raw rows projected onto numeric `(x, y)` coordinates.
pub fn scatter_points(rows: &[Row], x_key: &str, y_key: &str) -> Vec<ScatterPoint> {
    rows.iter()
        .map(|row| ScatterPoint {
            x: row.get(x_key).map(CellValue::coerce_f64).unwrap_or(0.0),
            y: row.get(y_key).map(CellValue::coerce_f64).unwrap_or(0.0),
        })
        .collect()
}

/// Resolve the data one widget renders.
pub fn chart_data(widget: &WidgetConfig, dataset: &Dataset) -> ChartData {
    if dataset.is_empty() {
        return ChartData::NoData;
    }

    let metric_needed = widget.aggregation != Aggregation::Count || widget.chart_type == ChartType::Scatter;
    let dimension_needed = widget.chart_type != ChartType::Kpi;
    if (dimension_needed && !dataset.has_column(&widget.dimension_key))
        || (metric_needed && !dataset.has_column(&widget.metric_key))
    {
        return ChartData::NoData;
    }

    match widget.chart_type {
        ChartType::Scatter => ChartData::Scatter(scatter_points(
            &dataset.rows,
            &widget.dimension_key,
            &widget.metric_key,
        )),
        ChartType::Kpi => ChartData::Kpi(kpi_total(
            &dataset.rows,
            &widget.dimension_key,
            &widget.metric_key,
            widget.aggregation,
        )),
        ChartType::Bar | ChartType::Line | ChartType::Area | ChartType::Pie => {
            ChartData::Series(Series {
                dimension_key: widget.dimension_key.clone(),
                metric_key: widget.metric_key.clone(),
                points: aggregate(
                    &dataset.rows,
                    &widget.dimension_key,
                    &widget.metric_key,
                    widget.aggregation,
                ),
            })
        }
    }
}

/// A missing cell or empty text groups under [`UNKNOWN_LABEL`]. Numeric
/// values always print, so a `0` dimension is its own "0" group rather than
/// being folded into "Unknown".
fn group_label(cell: Option<&CellValue>) -> String {
    match cell {
        None => UNKNOWN_LABEL.to_string(),
        Some(CellValue::Text(s)) if s.is_empty() => UNKNOWN_LABEL.to_string(),
        Some(value) => value.to_string(),
    }
}

/// Halves round toward positive infinity.
pub(crate) fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}
