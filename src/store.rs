//! Widget Store - in-memory widget list with single selection
//!
//! Every mutation is announced on a broadcast channel so views can re-render
//! without polling. Sending with no subscribers is fine.

use crate::dataset::{ColumnMetadata, ColumnType};
use crate::widget::{
    generated_widget_id, new_widget_id, Aggregation, ChartType, ColumnSpan, WidgetConfig, WidgetPatch,
};
use std::collections::HashSet;
use tokio::sync::broadcast;
use tracing::{debug, info};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Added(String),
    Updated(String),
    Removed(String),
    Replaced { count: usize },
    SelectionChanged(Option<String>),
}

pub struct WidgetStore {
    widgets: Vec<WidgetConfig>,
    selected: Option<String>,
    events: broadcast::Sender<StoreEvent>,
}

impl Default for WidgetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl WidgetStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            widgets: Vec::new(),
            selected: None,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub fn widgets(&self) -> &[WidgetConfig] {
        &self.widgets
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&WidgetConfig> {
        self.widgets.iter().find(|w| w.id == id)
    }

    /// Add a widget with smart defaults and select it.
    ///
    /// The dimension is the first string or date column and the metric the
    /// first number column; each falls back to the first column, then to an
    /// empty key when there are no columns at all.
    pub fn add_widget(&mut self, chart_type: ChartType, columns: &[ColumnMetadata]) -> &WidgetConfig {
        let first = columns.first().map(|c| c.name.clone()).unwrap_or_default();
        let dimension_key = columns
            .iter()
            .find(|c| c.column_type.is_categorical())
            .map(|c| c.name.clone())
            .unwrap_or_else(|| first.clone());
        let metric_key = columns
            .iter()
            .find(|c| c.column_type == ColumnType::Number)
            .map(|c| c.name.clone())
            .unwrap_or(first);

        let mut id = new_widget_id();
        while self.contains(&id) {
            id = new_widget_id();
        }

        let widget = WidgetConfig {
            id: id.clone(),
            title: format!("New {} Chart", chart_type),
            chart_type,
            dimension_key,
            metric_key,
            aggregation: Aggregation::Sum,
            column_span: ColumnSpan::ONE,
        };
        info!("Adding {} widget {}", chart_type, id);

        self.widgets.push(widget);
        self.emit(StoreEvent::Added(id.clone()));
        self.select(&id);

        let last = self.widgets.len() - 1;
        &self.widgets[last]
    }

    /// Merge `patch` into the widget with `id`. Unknown ids are ignored.
    pub fn update_widget(&mut self, id: &str, patch: WidgetPatch) -> bool {
        let Some(widget) = self.widgets.iter_mut().find(|w| w.id == id) else {
            debug!("update_widget: no widget {}", id);
            return false;
        };
        widget.apply(patch);
        self.emit(StoreEvent::Updated(id.to_string()));
        true
    }

    /// Replace the widget carrying the same id. Unknown ids are ignored.
    pub fn replace_widget(&mut self, updated: WidgetConfig) -> bool {
        let Some(widget) = self.widgets.iter_mut().find(|w| w.id == updated.id) else {
            debug!("replace_widget: no widget {}", updated.id);
            return false;
        };
        let id = updated.id.clone();
        *widget = updated;
        self.emit(StoreEvent::Updated(id));
        true
    }

    /// Remove the widget with `id`, clearing the selection if it pointed there.
    pub fn delete_widget(&mut self, id: &str) -> bool {
        let before = self.widgets.len();
        self.widgets.retain(|w| w.id != id);
        if self.widgets.len() == before {
            debug!("delete_widget: no widget {}", id);
            return false;
        }
        info!("Deleted widget {}", id);
        self.emit(StoreEvent::Removed(id.to_string()));
        if self.selected.as_deref() == Some(id) {
            self.clear_selection();
        }
        true
    }

    /// Install a whole layout. Ids that are empty or repeated get fresh ones.
    pub fn replace_all(&mut self, widgets: Vec<WidgetConfig>) {
        let mut seen = HashSet::new();
        self.widgets = widgets
            .into_iter()
            .enumerate()
            .map(|(idx, mut widget)| {
                while widget.id.is_empty() || !seen.insert(widget.id.clone()) {
                    widget.id = generated_widget_id(idx);
                }
                widget
            })
            .collect();
        self.emit(StoreEvent::Replaced {
            count: self.widgets.len(),
        });
        self.clear_selection();
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected(&self) -> Option<&WidgetConfig> {
        self.selected.as_deref().and_then(|id| self.get(id))
    }

    /// Select one widget. Selecting an unknown id leaves the selection as is.
    pub fn select(&mut self, id: &str) -> bool {
        if !self.contains(id) {
            return false;
        }
        if self.selected.as_deref() != Some(id) {
            self.selected = Some(id.to_string());
            self.emit(StoreEvent::SelectionChanged(self.selected.clone()));
        }
        true
    }

    pub fn clear_selection(&mut self) {
        if self.selected.take().is_some() {
            self.emit(StoreEvent::SelectionChanged(None));
        }
    }

    fn contains(&self, id: &str) -> bool {
        self.widgets.iter().any(|w| w.id == id)
    }

    fn emit(&self, event: StoreEvent) {
        // Err only means nobody is listening.
        let _ = self.events.send(event);
    }
}
