pub mod advisor;
pub mod aggregation;
pub mod app;
pub mod assistant;
pub mod config;
pub mod dataset;
pub mod error;
pub mod ingestion;
pub mod llm;
pub mod sample;
pub mod store;
pub mod widget;

pub use app::DashboardApp;
pub use dataset::{CellValue, ColumnMetadata, ColumnType, Dataset, Row};
pub use error::{DashboardError, Result};
pub use widget::{Aggregation, ChartType, ColumnSpan, WidgetConfig, WidgetPatch};
