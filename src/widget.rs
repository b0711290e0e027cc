//! Widget configuration - one chart or KPI card bound to a dimension/metric pair

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChartType {
    Bar,
    Line,
    Area,
    Pie,
    Scatter,
    #[serde(rename = "KPI")]
    Kpi,
}

impl ChartType {
    pub const ALL: [ChartType; 6] = [
        ChartType::Bar,
        ChartType::Line,
        ChartType::Area,
        ChartType::Pie,
        ChartType::Scatter,
        ChartType::Kpi,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ChartType::Bar => "Bar",
            ChartType::Line => "Line",
            ChartType::Area => "Area",
            ChartType::Pie => "Pie",
            ChartType::Scatter => "Scatter",
            ChartType::Kpi => "KPI",
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartType {
    type Err = String;

    /// Exact match on the wire names (`Bar`, ..., `KPI`), case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChartType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown chart type '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Sum,
    Avg,
    Count,
}

impl Aggregation {
    pub fn as_str(self) -> &'static str {
        match self {
            Aggregation::Sum => "sum",
            Aggregation::Avg => "avg",
            Aggregation::Count => "count",
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Aggregation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(Aggregation::Sum),
            "avg" => Ok(Aggregation::Avg),
            "count" => Ok(Aggregation::Count),
            other => Err(format!("unknown aggregation '{}'", other)),
        }
    }
}

/// Grid columns a widget spans: 1, 2 or 3
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ColumnSpan(u8);

impl ColumnSpan {
    pub const ONE: ColumnSpan = ColumnSpan(1);
    pub const MAX: u8 = 3;

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for ColumnSpan {
    fn default() -> Self {
        ColumnSpan::ONE
    }
}

impl TryFrom<u8> for ColumnSpan {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (1..=Self::MAX).contains(&value) {
            Ok(ColumnSpan(value))
        } else {
            Err(format!("column span must be 1, 2 or 3, got {}", value))
        }
    }
}

impl From<ColumnSpan> for u8 {
    fn from(span: ColumnSpan) -> Self {
        span.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetConfig {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    /// Dimension (categorical axis)
    #[serde(rename = "xAxisKey")]
    pub dimension_key: String,
    /// Metric (value axis)
    #[serde(rename = "yAxisKey")]
    pub metric_key: String,
    pub aggregation: Aggregation,
    #[serde(rename = "colSpan")]
    pub column_span: ColumnSpan,
}

impl WidgetConfig {
    /// Apply every field present in `patch`. The id never changes.
    pub fn apply(&mut self, patch: WidgetPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(chart_type) = patch.chart_type {
            self.chart_type = chart_type;
        }
        if let Some(dimension_key) = patch.dimension_key {
            self.dimension_key = dimension_key;
        }
        if let Some(metric_key) = patch.metric_key {
            self.metric_key = metric_key;
        }
        if let Some(aggregation) = patch.aggregation {
            self.aggregation = aggregation;
        }
        if let Some(column_span) = patch.column_span {
            self.column_span = column_span;
        }
    }
}

/// Partial update for a widget; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WidgetPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub chart_type: Option<ChartType>,
    #[serde(default, rename = "xAxisKey", skip_serializing_if = "Option::is_none")]
    pub dimension_key: Option<String>,
    #[serde(default, rename = "yAxisKey", skip_serializing_if = "Option::is_none")]
    pub metric_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<Aggregation>,
    #[serde(default, rename = "colSpan", skip_serializing_if = "Option::is_none")]
    pub column_span: Option<ColumnSpan>,
}

impl WidgetPatch {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn chart_type(mut self, chart_type: ChartType) -> Self {
        self.chart_type = Some(chart_type);
        self
    }

    pub fn dimension_key(mut self, key: impl Into<String>) -> Self {
        self.dimension_key = Some(key.into());
        self
    }

    pub fn metric_key(mut self, key: impl Into<String>) -> Self {
        self.metric_key = Some(key.into());
        self
    }

    pub fn aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = Some(aggregation);
        self
    }

    pub fn column_span(mut self, span: ColumnSpan) -> Self {
        self.column_span = Some(span);
        self
    }
}

/// Fresh id for a user-created widget
pub fn new_widget_id() -> String {
    format!("w_{}", uuid::Uuid::new_v4().simple())
}

/// Fresh id for the `index`-th widget of a generated layout
pub fn generated_widget_id(index: usize) -> String {
    format!("gen_w_{}_{}", index, uuid::Uuid::new_v4().simple())
}
