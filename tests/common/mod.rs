use async_trait::async_trait;
use dashboard_copilot::error::{DashboardError, Result};
use dashboard_copilot::llm::{CompletionRequest, LanguageModel};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Language model that replays canned responses and records every prompt
#[derive(Default)]
pub struct ScriptedModel {
    responses: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

#[allow(dead_code)]
impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: &str) -> Self {
        self.responses.lock().unwrap().push_back(Ok(text.to_string()));
        self
    }

    pub fn fail(self, err: DashboardError) -> Self {
        self.responses.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(DashboardError::RemoteService("no scripted response left".to_string())))
    }
}

#[allow(dead_code)]
pub const LAYOUT_RESPONSE: &str = r#"[
  {"id": "a", "title": "Total Revenue", "type": "KPI", "xAxisKey": "Car Model", "yAxisKey": "Selling Price", "aggregation": "sum", "colSpan": 1},
  {"id": "a", "title": "Sales by Model", "type": "Bar", "xAxisKey": "Car Model", "yAxisKey": "Selling Price", "aggregation": "sum", "colSpan": 2},
  {"id": "b", "title": "Units over Time", "type": "Line", "xAxisKey": "Date", "yAxisKey": "Units Sold", "aggregation": "sum", "colSpan": 3},
  {"id": "c", "title": "Region Share", "type": "Pie", "xAxisKey": "Dealer Region", "yAxisKey": "Units Sold", "aggregation": "count", "colSpan": 1},
  {"id": "d", "title": "Broken", "type": "Radar", "xAxisKey": "Dealer Region", "yAxisKey": "Units Sold", "aggregation": "sum", "colSpan": 1}
]"#;
