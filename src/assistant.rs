//! Conversational Assistant - answers questions about the loaded dataset
//!
//! The model never sees the whole dataset. It gets per-column statistics
//! computed here plus a short sample of rows. Failures are turned into fixed
//! user-facing strings at this boundary.

use crate::aggregation::round_half_up;
use crate::dataset::{CellValue, Row};
use crate::error::{DashboardError, Result};
use crate::llm::{strip_code_fences, CompletionRequest, LanguageModel};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Rows included in a chat prompt
pub const CHAT_SAMPLE_ROWS: usize = 30;

/// Rows included in an insight report prompt
pub const INSIGHT_SAMPLE_ROWS: usize = 50;

pub const NO_DATA_MESSAGE: &str = "I don't see any data loaded yet. Please upload a CSV file or load the sample data so I can answer your questions.";
pub const SERVICE_UNAVAILABLE_MESSAGE: &str = "AI Service Unavailable";
pub const EMPTY_ANSWER_MESSAGE: &str = "I couldn't generate an answer.";
pub const APOLOGY_MESSAGE: &str =
    "Sorry, I encountered an error processing your request. Please check your API key.";

/// Summary statistics for one numeric column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub sum: f64,
    pub average: f64,
    pub min: f64,
    pub max: f64,
}

/// Column statistics keyed by name, kept in header order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnStatsMap(Vec<(String, ColumnStats)>);

impl ColumnStatsMap {
    pub fn get(&self, name: &str) -> Option<&ColumnStats> {
        self.0.iter().find(|(key, _)| key == name).map(|(_, stats)| stats)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, ColumnStats)> for ColumnStatsMap {
    fn from_iter<I: IntoIterator<Item = (String, ColumnStats)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for ColumnStatsMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, stats) in &self.0 {
            map.serialize_entry(key, stats)?;
        }
        map.end()
    }
}

/// Statistics for every numeric column
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatasetStats {
    pub total_rows: usize,
    pub columns: ColumnStatsMap,
}

impl DatasetStats {
    /// A column counts as numeric when its first-row value is a number. Later
    /// values that are not numbers count as zero.
    pub fn compute(rows: &[Row]) -> Self {
        let Some(first) = rows.first() else {
            return Self::default();
        };

        let columns = first
            .iter()
            .filter_map(|(key, value)| value.as_f64().map(|seed| (key, seed)))
            .map(|(key, seed)| {
                let mut sum = 0.0;
                let mut min = seed;
                let mut max = seed;
                for row in rows {
                    let v = row.get(key).map(CellValue::coerce_f64).unwrap_or(0.0);
                    sum += v;
                    min = min.min(v);
                    max = max.max(v);
                }
                let stats = ColumnStats {
                    sum: round_half_up(sum),
                    average: round_half_up(sum / rows.len() as f64),
                    min,
                    max,
                };
                (key.to_string(), stats)
            })
            .collect();

        Self {
            total_rows: rows.len(),
            columns,
        }
    }
}

/// Executive summary of a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightReport {
    pub summary: String,
    #[serde(default)]
    pub key_trends: Vec<String>,
    #[serde(default)]
    pub recommendation: String,
}

pub struct Assistant {
    model: Arc<dyn LanguageModel>,
}

impl Assistant {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Answer `query` about `rows`. Always returns text for the chat log.
    pub async fn ask(&self, rows: &[Row], query: &str) -> String {
        if rows.is_empty() {
            return NO_DATA_MESSAGE.to_string();
        }

        match self.try_ask(rows, query).await {
            Ok(answer) if answer.trim().is_empty() => EMPTY_ANSWER_MESSAGE.to_string(),
            Ok(answer) => answer,
            Err(DashboardError::CredentialMissing) => {
                warn!("Chat requested without an API key");
                SERVICE_UNAVAILABLE_MESSAGE.to_string()
            }
            Err(e) => {
                error!("Chat request failed: {}", e);
                APOLOGY_MESSAGE.to_string()
            }
        }
    }

    async fn try_ask(&self, rows: &[Row], query: &str) -> Result<String> {
        let prompt = build_chat_prompt(rows, query)?;
        info!("Asking assistant about {} rows", rows.len());
        self.model.complete(CompletionRequest::text(prompt)).await
    }

    /// Summary, key trends and a recommendation, or an answer focused on
    /// `query`. `None` when the model is unavailable or answers badly.
    pub async fn insights(&self, rows: &[Row], query: Option<&str>) -> Option<InsightReport> {
        if rows.is_empty() {
            return None;
        }
        match self.try_insights(rows, query).await {
            Ok(report) => Some(report),
            Err(e) => {
                error!("Insight generation failed: {}", e);
                None
            }
        }
    }

    async fn try_insights(&self, rows: &[Row], query: Option<&str>) -> Result<InsightReport> {
        let sample = &rows[..rows.len().min(INSIGHT_SAMPLE_ROWS)];
        let task = match query {
            Some(q) => format!("Answer this specific question based on the data: \"{}\".", q),
            None => "Provide a high-level executive summary, 3 specific key trends (mentioning specific categories or regions if possible), and 1 actionable strategic recommendation.".to_string(),
        };
        let prompt = format!(
            r#"You are a senior business intelligence analyst. Analyze the provided data.
Data (first {n} rows): {data}
{task}
Return JSON: {{"summary": "...", "keyTrends": ["..."], "recommendation": "..."}}"#,
            n = INSIGHT_SAMPLE_ROWS,
            data = serde_json::to_string(sample)?,
            task = task,
        );

        let response = self.model.complete(CompletionRequest::json(prompt)).await?;
        let report: InsightReport = serde_json::from_str(strip_code_fences(&response))
            .map_err(|e| DashboardError::InvalidResponse(format!("Failed to parse insights: {}", e)))?;
        Ok(report)
    }
}

pub fn build_chat_prompt(rows: &[Row], query: &str) -> Result<String> {
    let stats = DatasetStats::compute(rows);
    let sample = &rows[..rows.len().min(CHAT_SAMPLE_ROWS)];

    Ok(format!(
        r#"You are a helpful data analyst assistant for a business dashboard.

Dataset Overview:
- Total Rows: {total}
- Column Statistics (Sums/Avgs/Min/Max for numeric fields): {stats}
- Data Sample (First {n} rows): {sample}

User Question: {query}

Instructions:
- Use the 'Column Statistics' to answer questions about totals, averages, or ranges.
- Use the 'Data Sample' to understand categorical values and context.
- Be concise, professional, and direct."#,
        total = stats.total_rows,
        stats = serde_json::to_string(&stats.columns)?,
        n = CHAT_SAMPLE_ROWS,
        sample = serde_json::to_string(sample)?,
        query = query,
    ))
}
