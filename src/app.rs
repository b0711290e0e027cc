//! Dashboard controller - the single owner of application state
//!
//! Views read state through accessors and act through the methods here; the
//! widget store publishes change events for anything that needs to re-render.

use crate::advisor::LayoutAdvisor;
use crate::aggregation::{chart_data, ChartData};
use crate::assistant::{Assistant, InsightReport};
use crate::dataset::{ColumnMetadata, Dataset};
use crate::error::DashboardError;
use crate::ingestion;
use crate::llm::LanguageModel;
use crate::sample::SAMPLE_CSV_DATA;
use crate::store::{StoreEvent, WidgetStore};
use crate::widget::{ChartType, WidgetConfig, WidgetPatch};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Ai,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

pub struct DashboardApp {
    dataset: Dataset,
    store: WidgetStore,
    advisor: LayoutAdvisor,
    assistant: Assistant,
    messages: Vec<ChatMessage>,
    assistant_open: bool,
    processing: bool,
    upload_error: Option<String>,
}

impl DashboardApp {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            dataset: Dataset::default(),
            store: WidgetStore::new(),
            advisor: LayoutAdvisor::new(Arc::clone(&model)),
            assistant: Assistant::new(model),
            messages: Vec::new(),
            assistant_open: false,
            processing: false,
            upload_error: None,
        }
    }

    /// Ingest CSV text and install the advisor's layout.
    ///
    /// On a parse failure the previous dataset and widgets stay in place and
    /// [`upload_error`](Self::upload_error) carries the user-facing message.
    pub async fn load_csv(&mut self, text: &str) -> Result<(), DashboardError> {
        self.processing = true;
        self.upload_error = None;

        let result = match ingestion::parse(text) {
            Ok(dataset) => {
                info!("Loaded dataset with {} rows", dataset.len());
                let widgets = self.advisor.suggest_layout(&dataset.columns, &dataset.rows).await;
                self.dataset = dataset;
                self.store.replace_all(widgets);
                Ok(())
            }
            Err(e) => {
                error!("Failed to load CSV: {}", e);
                self.upload_error = Some(e.user_message().to_string());
                Err(e)
            }
        };

        self.processing = false;
        result
    }

    pub async fn load_sample(&mut self) -> Result<(), DashboardError> {
        self.load_csv(SAMPLE_CSV_DATA).await
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn columns(&self) -> &[ColumnMetadata] {
        &self.dataset.columns
    }

    pub fn has_data(&self) -> bool {
        !self.dataset.is_empty()
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn upload_error(&self) -> Option<&str> {
        self.upload_error.as_deref()
    }

    pub fn widgets(&self) -> &[WidgetConfig] {
        self.store.widgets()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.store.subscribe()
    }

    pub fn add_widget(&mut self, chart_type: ChartType) -> String {
        self.store.add_widget(chart_type, &self.dataset.columns).id.clone()
    }

    pub fn update_widget(&mut self, id: &str, patch: WidgetPatch) -> bool {
        self.store.update_widget(id, patch)
    }

    pub fn replace_widget(&mut self, widget: WidgetConfig) -> bool {
        self.store.replace_widget(widget)
    }

    pub fn delete_widget(&mut self, id: &str) -> bool {
        self.store.delete_widget(id)
    }

    pub fn select_widget(&mut self, id: &str) -> bool {
        self.store.select(id)
    }

    /// Clicking the canvas background
    pub fn clear_selection(&mut self) {
        self.store.clear_selection();
    }

    pub fn selected_widget(&self) -> Option<&WidgetConfig> {
        self.store.selected()
    }

    pub fn chart_data(&self, widget_id: &str) -> Option<ChartData> {
        self.store
            .get(widget_id)
            .map(|widget| chart_data(widget, &self.dataset))
    }

    pub fn toggle_assistant(&mut self) {
        self.assistant_open = !self.assistant_open;
    }

    pub fn close_assistant(&mut self) {
        self.assistant_open = false;
    }

    pub fn is_assistant_open(&self) -> bool {
        self.assistant_open
    }

    /// The properties panel gives way to the assistant panel.
    pub fn is_properties_panel_visible(&self) -> bool {
        !self.assistant_open
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Send a chat message. Blank input is ignored. Returns the reply.
    pub async fn send_chat(&mut self, input: &str) -> Option<String> {
        if input.trim().is_empty() {
            return None;
        }

        self.messages.push(ChatMessage {
            role: ChatRole::User,
            text: input.to_string(),
        });

        let reply = self.assistant.ask(&self.dataset.rows, input).await;
        self.messages.push(ChatMessage {
            role: ChatRole::Ai,
            text: reply.clone(),
        });
        Some(reply)
    }

    pub async fn insights(&self, query: Option<&str>) -> Option<InsightReport> {
        self.assistant.insights(&self.dataset.rows, query).await
    }
}
