//! End-to-end dashboard flow
//!
//! Loads the sample data through the controller with a scripted language
//! model, then exercises widget editing, rendering and chat.

mod common;

use common::{ScriptedModel, LAYOUT_RESPONSE};
use dashboard_copilot::aggregation::{ChartData, SeriesPoint};
use dashboard_copilot::app::ChatRole;
use dashboard_copilot::assistant::{APOLOGY_MESSAGE, NO_DATA_MESSAGE, SERVICE_UNAVAILABLE_MESSAGE};
use dashboard_copilot::error::PARSE_FAILURE_MESSAGE;
use dashboard_copilot::store::StoreEvent;
use dashboard_copilot::{Aggregation, ChartType, ColumnType, DashboardApp, DashboardError, WidgetPatch};
use std::collections::HashSet;
use std::sync::Arc;

#[tokio::test]
async fn test_sample_load_installs_validated_layout() {
    let model = Arc::new(ScriptedModel::new().reply(LAYOUT_RESPONSE));
    let mut app = DashboardApp::new(model.clone());

    app.load_sample().await.unwrap();

    assert!(app.has_data());
    assert!(!app.is_processing());
    assert_eq!(app.upload_error(), None);
    assert_eq!(app.dataset().len(), 12);
    assert_eq!(app.columns().len(), 8);
    assert_eq!(app.columns()[0].column_type, ColumnType::Date);
    assert_eq!(app.columns()[1].column_type, ColumnType::String);
    assert_eq!(app.columns()[5].column_type, ColumnType::Number);

    // The "Radar" entry is rejected; ids are regenerated and unique.
    let widgets = app.widgets();
    assert_eq!(widgets.len(), 4);
    let ids: HashSet<&str> = widgets.iter().map(|w| w.id.as_str()).collect();
    assert_eq!(ids.len(), 4);
    assert!(!ids.contains("a"));

    // The advisor saw the schema and a five-row sample.
    let requests = model.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].json_output);
    assert!(requests[0].prompt.contains("Car Model (string)"));
    assert!(requests[0].prompt.contains("Date (date)"));
    assert!(requests[0].prompt.contains("Model 3"));
    assert!(!requests[0].prompt.contains("Camry"));
}

#[tokio::test]
async fn test_rendering_generated_widgets() {
    let model = Arc::new(ScriptedModel::new().reply(LAYOUT_RESPONSE));
    let mut app = DashboardApp::new(model);
    app.load_sample().await.unwrap();

    let kpi = app.widgets()[0].id.clone();
    assert_eq!(app.chart_data(&kpi), Some(ChartData::Kpi(465000.0)));

    let bar = app.widgets()[1].id.clone();
    match app.chart_data(&bar) {
        Some(ChartData::Series(series)) => {
            assert_eq!(series.points.len(), 10);
            assert_eq!(
                series.points[0],
                SeriesPoint {
                    label: "Civic".to_string(),
                    value: 51000.0
                }
            );
            assert_eq!(series.points[1].label, "Accord");
        }
        other => panic!("expected a series, got {:?}", other),
    }

    let pie = app.widgets()[3].id.clone();
    match app.chart_data(&pie) {
        Some(ChartData::Series(series)) => {
            let counts: Vec<(String, f64)> = series.points.into_iter().map(|p| (p.label, p.value)).collect();
            assert_eq!(
                counts,
                vec![
                    ("North".to_string(), 3.0),
                    ("South".to_string(), 3.0),
                    ("East".to_string(), 3.0),
                    ("West".to_string(), 3.0),
                ]
            );
        }
        other => panic!("expected a series, got {:?}", other),
    }

    assert_eq!(app.chart_data("no-such-widget"), None);
}

#[tokio::test]
async fn test_advisor_failure_starts_empty_dashboard() {
    let model = Arc::new(ScriptedModel::new().fail(DashboardError::CredentialMissing));
    let mut app = DashboardApp::new(model);

    app.load_sample().await.unwrap();

    assert!(app.has_data());
    assert!(app.widgets().is_empty());
    assert_eq!(app.upload_error(), None);
}

#[tokio::test]
async fn test_malformed_advisor_json_starts_empty_dashboard() {
    let model = Arc::new(ScriptedModel::new().reply("Here are some widgets you might like!"));
    let mut app = DashboardApp::new(model);
    app.load_sample().await.unwrap();
    assert!(app.widgets().is_empty());
}

#[tokio::test]
async fn test_parse_failure_keeps_previous_state() {
    let model = Arc::new(ScriptedModel::new().reply(LAYOUT_RESPONSE));
    let mut app = DashboardApp::new(model.clone());
    app.load_sample().await.unwrap();
    let widgets_before = app.widgets().to_vec();

    let err = app.load_csv("Only,A,Header\n").await.unwrap_err();
    assert!(matches!(err, DashboardError::NoRowsParsed));
    assert_eq!(app.upload_error(), Some(PARSE_FAILURE_MESSAGE));
    assert_eq!(app.dataset().len(), 12);
    assert_eq!(app.widgets(), widgets_before.as_slice());
    // The advisor is not consulted for a file that failed to parse.
    assert_eq!(model.call_count(), 1);

    app.load_csv("  ").await.unwrap_err();
    assert_eq!(app.upload_error(), Some(PARSE_FAILURE_MESSAGE));
}

#[tokio::test]
async fn test_user_widget_lifecycle() {
    let model = Arc::new(ScriptedModel::new().reply("[]"));
    let mut app = DashboardApp::new(model);
    app.load_sample().await.unwrap();
    let mut events = app.subscribe();

    let id = app.add_widget(ChartType::Bar);
    let widget = app.selected_widget().unwrap().clone();
    assert_eq!(widget.id, id);
    assert_eq!(widget.dimension_key, "Date");
    assert_eq!(widget.metric_key, "Selling Price");

    assert!(app.update_widget(
        &id,
        WidgetPatch::default()
            .dimension_key("Manufacturer")
            .metric_key("Units Sold")
            .aggregation(Aggregation::Avg)
    ));
    match app.chart_data(&id) {
        Some(ChartData::Series(series)) => {
            // Honda: 5, 3, 4 -> 4; Ford: 2, 8, 5, 3 -> 4.5 -> 5
            assert_eq!(series.points[0].label, "Honda");
            assert_eq!(series.points[0].value, 4.0);
            assert_eq!(series.points[1].label, "Ford");
            assert_eq!(series.points[1].value, 5.0);
        }
        other => panic!("expected a series, got {:?}", other),
    }

    // A dangling column reference renders as no data.
    app.update_widget(&id, WidgetPatch::default().metric_key("Commission"));
    assert_eq!(app.chart_data(&id), Some(ChartData::NoData));

    app.clear_selection();
    assert!(app.selected_widget().is_none());
    app.select_widget(&id);

    assert!(!app.delete_widget("missing"));
    assert_eq!(app.widgets().len(), 1);
    assert!(app.delete_widget(&id));
    assert!(app.widgets().is_empty());
    assert!(app.selected_widget().is_none());

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    assert_eq!(seen.first(), Some(&StoreEvent::Added(id.clone())));
    assert!(seen.contains(&StoreEvent::Updated(id.clone())));
    assert_eq!(seen.last(), Some(&StoreEvent::SelectionChanged(None)));
}

#[tokio::test]
async fn test_add_widget_before_any_data() {
    let mut app = DashboardApp::new(Arc::new(ScriptedModel::new()));
    let id = app.add_widget(ChartType::Kpi);
    let widget = app.selected_widget().unwrap();
    assert_eq!(widget.id, id);
    assert_eq!(widget.dimension_key, "");
    assert_eq!(widget.metric_key, "");
    assert_eq!(app.chart_data(&id), Some(ChartData::NoData));
}

#[tokio::test]
async fn test_chat_without_data_skips_remote_call() {
    let model = Arc::new(ScriptedModel::new());
    let mut app = DashboardApp::new(model.clone());

    assert_eq!(app.send_chat("   ").await, None);
    assert!(app.messages().is_empty());

    let reply = app.send_chat("What is the total revenue?").await.unwrap();
    assert_eq!(reply, NO_DATA_MESSAGE);
    assert_eq!(model.call_count(), 0);
    assert_eq!(app.messages().len(), 2);
    assert_eq!(app.messages()[0].role, ChatRole::User);
    assert_eq!(app.messages()[1].role, ChatRole::Ai);
}

#[tokio::test]
async fn test_chat_with_data() {
    let model = Arc::new(
        ScriptedModel::new()
            .reply("[]")
            .reply("Total revenue is 465,000.")
            .fail(DashboardError::RemoteService("timeout".to_string()))
            .fail(DashboardError::CredentialMissing),
    );
    let mut app = DashboardApp::new(model.clone());
    app.load_sample().await.unwrap();

    let reply = app.send_chat("What is the total revenue?").await.unwrap();
    assert_eq!(reply, "Total revenue is 465,000.");

    let prompt = &model.requests()[1].prompt;
    assert!(prompt.contains("Total Rows: 12"));
    assert!(prompt.contains(r#""Selling Price":{"sum":465000.0"#));
    assert!(prompt.contains("User Question: What is the total revenue?"));

    assert_eq!(app.send_chat("again?").await.unwrap(), APOLOGY_MESSAGE);
    assert_eq!(app.send_chat("and again?").await.unwrap(), SERVICE_UNAVAILABLE_MESSAGE);
    assert_eq!(app.messages().len(), 6);
}

#[tokio::test]
async fn test_insights_report() {
    let model = Arc::new(
        ScriptedModel::new()
            .reply("[]")
            .reply(r#"```json
{"summary": "Ford leads revenue.", "keyTrends": ["Tesla units grow", "North is strongest"], "recommendation": "Stock more F-150s."}
```"#)
            .reply("not json"),
    );
    let mut app = DashboardApp::new(model);
    app.load_sample().await.unwrap();

    let report = app.insights(None).await.unwrap();
    assert_eq!(report.summary, "Ford leads revenue.");
    assert_eq!(report.key_trends.len(), 2);
    assert_eq!(report.recommendation, "Stock more F-150s.");

    assert!(app.insights(Some("Which region is best?")).await.is_none());
}

#[test]
fn test_panel_toggles() {
    let mut app = DashboardApp::new(Arc::new(ScriptedModel::new()));
    assert!(!app.is_assistant_open());
    assert!(app.is_properties_panel_visible());

    app.toggle_assistant();
    assert!(app.is_assistant_open());
    assert!(!app.is_properties_panel_visible());

    app.close_assistant();
    assert!(!app.is_assistant_open());
}
