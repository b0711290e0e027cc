//! Layout Advisor - asks the language model for an initial widget layout
//!
//! The model's answer is untrusted input. Every entry is checked for enum
//! membership and field types before it becomes a [`WidgetConfig`]; anything
//! that does not fit is dropped. Failures of any kind yield an empty layout so
//! ingestion is never blocked by the advisor.

use crate::dataset::{ColumnMetadata, Row};
use crate::error::{DashboardError, Result};
use crate::llm::{strip_code_fences, CompletionRequest, LanguageModel};
use crate::widget::{generated_widget_id, Aggregation, ChartType, ColumnSpan, WidgetConfig};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Rows included in the layout prompt
pub const LAYOUT_SAMPLE_ROWS: usize = 5;

/// Widgets requested from the model
pub const SUGGESTED_WIDGETS: usize = 6;

pub struct LayoutAdvisor {
    model: Arc<dyn LanguageModel>,
}

impl LayoutAdvisor {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Propose a layout for the dataset. Never fails: errors become `[]`.
    pub async fn suggest_layout(&self, columns: &[ColumnMetadata], rows: &[Row]) -> Vec<WidgetConfig> {
        match self.try_suggest_layout(columns, rows).await {
            Ok(widgets) => {
                info!("Layout advisor proposed {} widgets", widgets.len());
                widgets
            }
            Err(DashboardError::CredentialMissing) => {
                warn!("No API key configured; starting with an empty dashboard");
                Vec::new()
            }
            Err(e) => {
                error!("Layout generation failed: {}", e);
                Vec::new()
            }
        }
    }

    async fn try_suggest_layout(&self, columns: &[ColumnMetadata], rows: &[Row]) -> Result<Vec<WidgetConfig>> {
        let prompt = build_layout_prompt(columns, rows)?;
        let response = self.model.complete(CompletionRequest::json(prompt)).await?;
        parse_layout_response(&response, columns)
    }
}

pub fn build_layout_prompt(columns: &[ColumnMetadata], rows: &[Row]) -> Result<String> {
    let schema_description = columns
        .iter()
        .map(|c| format!("{} ({})", c.name, c.column_type))
        .collect::<Vec<_>>()
        .join(", ");
    let sample = &rows[..rows.len().min(LAYOUT_SAMPLE_ROWS)];
    let sample_json = serde_json::to_string(sample)?;

    Ok(format!(
        r#"I have a dataset for a business dashboard with the following columns: {schema}.
Sample data: {sample}.

Please create a configuration for {count} dashboard widgets to visualize this data effectively.
Include a mix of KPIs, Bar charts, Line charts, and Pie charts.

For 'KPI' types, pick a numeric column for yAxisKey (e.g. Price, Revenue) and aggregation 'sum'.
For 'Line' charts, usually use a Date column for xAxisKey.
For 'Bar' or 'Pie', use categorical columns for xAxisKey.

Return a JSON array of widget configurations. Each object has:
"id" (string), "title" (string), "type" (one of {types}),
"xAxisKey" (column name for X axis or category), "yAxisKey" (column name for Y axis or value),
"aggregation" (one of "sum", "avg", "count"), "colSpan" (1, 2 or 3)."#,
        schema = schema_description,
        sample = sample_json,
        count = SUGGESTED_WIDGETS,
        types = ChartType::ALL
            .iter()
            .map(|t| format!("\"{}\"", t))
            .collect::<Vec<_>>()
            .join(", "),
    ))
}

/// Validate a model response into widgets with fresh unique ids.
///
/// Accepts a bare JSON array or an object holding it under `widgets`.
pub fn parse_layout_response(response: &str, columns: &[ColumnMetadata]) -> Result<Vec<WidgetConfig>> {
    let cleaned = strip_code_fences(response);
    if cleaned.is_empty() {
        return Ok(Vec::new());
    }

    let parsed: Value = serde_json::from_str(cleaned)
        .map_err(|e| DashboardError::InvalidResponse(format!("Layout is not JSON: {}", e)))?;

    let entries = match parsed {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("widgets") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(DashboardError::InvalidResponse(
                    "Layout object has no 'widgets' array".to_string(),
                ))
            }
        },
        other => {
            return Err(DashboardError::InvalidResponse(format!(
                "Layout must be a JSON array, got {}",
                other
            )))
        }
    };

    let widgets: Vec<WidgetConfig> = entries
        .iter()
        .enumerate()
        .filter_map(|(idx, entry)| match validate_entry(entry) {
            Ok(mut widget) => {
                widget.id = generated_widget_id(idx);
                for key in [&widget.dimension_key, &widget.metric_key] {
                    if !columns.iter().any(|c| &c.name == key) {
                        warn!("Suggested widget '{}' references unknown column '{}'", widget.title, key);
                    }
                }
                Some(widget)
            }
            Err(reason) => {
                warn!("Dropping suggested widget {}: {}", idx, reason);
                None
            }
        })
        .collect();

    Ok(widgets)
}

fn validate_entry(entry: &Value) -> std::result::Result<WidgetConfig, String> {
    let obj = entry.as_object().ok_or("entry is not an object")?;

    let chart_type: ChartType = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or("missing 'type'")?
        .parse()?;

    let dimension_key = required_str(obj.get("xAxisKey"), "xAxisKey")?;
    let metric_key = required_str(obj.get("yAxisKey"), "yAxisKey")?;

    let aggregation = match obj.get("aggregation") {
        None | Some(Value::Null) => Aggregation::Sum,
        Some(Value::String(s)) => s.parse()?,
        Some(other) => return Err(format!("'aggregation' is not a string: {}", other)),
    };

    let column_span = obj
        .get("colSpan")
        .and_then(Value::as_f64)
        .map(|n| n.round().clamp(1.0, ColumnSpan::MAX as f64) as u8)
        .and_then(|n| ColumnSpan::try_from(n).ok())
        .unwrap_or_default();

    let title = obj
        .get("title")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{} of {}", aggregation, metric_key));

    Ok(WidgetConfig {
        id: String::new(),
        title,
        chart_type,
        dimension_key,
        metric_key,
        aggregation,
        column_span,
    })
}

fn required_str(value: Option<&Value>, field: &str) -> std::result::Result<String, String> {
    value
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .ok_or_else(|| format!("missing '{}'", field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{CellValue, ColumnType};

    fn columns() -> Vec<ColumnMetadata> {
        vec![
            ColumnMetadata::new("Model", ColumnType::String),
            ColumnMetadata::new("Price", ColumnType::Number),
        ]
    }

    #[test]
    fn test_prompt_contains_schema_and_five_row_sample() {
        let rows: Vec<Row> = (0..8)
            .map(|i| Row::from_pairs([("Model", CellValue::from(format!("m{}", i))), ("Price", CellValue::from(i as f64))]))
            .collect();
        let prompt = build_layout_prompt(&columns(), &rows).unwrap();
        assert!(prompt.contains("Model (string), Price (number)"));
        assert!(prompt.contains(r#""Model":"m4""#));
        assert!(!prompt.contains(r#""Model":"m5""#));
        assert!(prompt.contains("\"KPI\""));
    }

    #[test]
    fn test_parses_valid_layout() {
        let response = r#"```json
[
  {"id": "1", "title": "Total Revenue", "type": "KPI", "xAxisKey": "Model", "yAxisKey": "Price", "aggregation": "sum", "colSpan": 1},
  {"id": "1", "title": "By Model", "type": "Bar", "xAxisKey": "Model", "yAxisKey": "Price", "aggregation": "avg", "colSpan": 2}
]
```"#;
        let widgets = parse_layout_response(response, &columns()).unwrap();
        assert_eq!(widgets.len(), 2);
        assert_eq!(widgets[0].chart_type, ChartType::Kpi);
        assert_eq!(widgets[1].aggregation, Aggregation::Avg);
        assert_eq!(widgets[1].column_span.get(), 2);
        assert_ne!(widgets[0].id, widgets[1].id);
        assert!(widgets[0].id.starts_with("gen_w_0_"));
    }

    #[test]
    fn test_drops_entries_outside_enums() {
        let response = r#"[
            {"title": "Donut", "type": "Donut", "xAxisKey": "Model", "yAxisKey": "Price", "aggregation": "sum"},
            {"title": "Median", "type": "Bar", "xAxisKey": "Model", "yAxisKey": "Price", "aggregation": "median"},
            {"title": "No axis", "type": "Bar", "yAxisKey": "Price"},
            "not an object",
            {"title": "Good", "type": "Pie", "xAxisKey": "Model", "yAxisKey": "Price"}
        ]"#;
        let widgets = parse_layout_response(response, &columns()).unwrap();
        assert_eq!(widgets.len(), 1);
        assert_eq!(widgets[0].title, "Good");
        assert_eq!(widgets[0].aggregation, Aggregation::Sum);
    }

    #[test]
    fn test_column_span_is_coerced() {
        let response = r#"[
            {"title": "a", "type": "Line", "xAxisKey": "Model", "yAxisKey": "Price", "colSpan": 7},
            {"title": "b", "type": "Line", "xAxisKey": "Model", "yAxisKey": "Price", "colSpan": "wide"},
            {"title": "c", "type": "Line", "xAxisKey": "Model", "yAxisKey": "Price", "colSpan": 0}
        ]"#;
        let spans: Vec<u8> = parse_layout_response(response, &columns())
            .unwrap()
            .iter()
            .map(|w| w.column_span.get())
            .collect();
        assert_eq!(spans, vec![3, 1, 1]);
    }

    #[test]
    fn test_accepts_wrapped_object_and_defaults_title() {
        let response = r#"{"widgets": [{"type": "Area", "xAxisKey": "Model", "yAxisKey": "Price", "aggregation": "count"}]}"#;
        let widgets = parse_layout_response(response, &columns()).unwrap();
        assert_eq!(widgets[0].title, "count of Price");
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(parse_layout_response("not json", &columns()).is_err());
        assert!(parse_layout_response(r#"{"layout": []}"#, &columns()).is_err());
        assert!(parse_layout_response("42", &columns()).is_err());
        assert!(parse_layout_response("", &columns()).unwrap().is_empty());
    }
}
