//! Vega-Lite chart specs for the trend panel.

use serde_json::{json, Value};

use crate::dashboard::trend::Trend;
use crate::models::alert::{AlertType, VariantKind};

const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";

pub fn chart_title(alert_type: AlertType) -> &'static str {
    match alert_type.variant_kind() {
        VariantKind::DataGrowth => "ROW COUNT vs. SNAPSHOT DATE",
        VariantKind::KeyOrViewTest => "OBJECT FAILURE RATE vs. SNAPSHOT DATE",
        VariantKind::TaskHistory => "TASK FAILURE RATE vs. SNAPSHOT DATE",
    }
}

/// Bar chart over the trend rows, one bar per snapshot date.
pub fn chart_spec(alert_type: AlertType, trend: &Trend) -> Value {
    let x = json!({
        "field": "SNAPSHOT_DATE",
        "timeUnit": "yearmonthdate",
        "type": "ordinal",
        "title": "SNAPSHOT DATE",
    });

    let encoding = match alert_type.variant_kind() {
        VariantKind::DataGrowth => json!({
            "x": x,
            "y": { "field": "ROW_COUNT", "type": "quantitative", "title": "ROW COUNT" },
            "color": { "field": "ISSUE", "type": "nominal" },
            "tooltip": [
                { "field": "SNAPSHOT_DATE", "type": "temporal" },
                { "field": "ROW_COUNT", "type": "quantitative" },
                { "field": "DIFF_PERCENTAGE", "type": "quantitative" },
            ],
        }),
        kind => {
            let y_title = if kind == VariantKind::TaskHistory {
                "TASK FAILURE RATE"
            } else {
                "OBJECT FAILURE RATE"
            };
            json!({
                "x": x,
                "y": { "aggregate": "count", "field": "OBJECT_NAME", "type": "quantitative", "title": y_title },
                "tooltip": [
                    { "field": "SNAPSHOT_DATE", "type": "temporal" },
                    { "field": "OBJECT_NAME", "type": "nominal" },
                    { "aggregate": "count", "field": "OBJECT_NAME", "type": "quantitative" },
                ],
            })
        }
    };

    json!({
        "$schema": VEGA_LITE_SCHEMA,
        "title": chart_title(alert_type),
        "width": "container",
        "data": { "values": trend.values() },
        "mark": "bar",
        "encoding": encoding,
    })
}
