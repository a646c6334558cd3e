//! Per-type error payloads and how they render.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::alert::{AlertRecord, AlertType, VariantKind};
use crate::models::notification::{escape_html, Fact, NotificationContent};

/// An `error_message` that does not match its alert type's shape.
#[derive(Debug, thiserror::Error)]
#[error("{alert_type} payload for {table} is malformed: {source}")]
pub struct PayloadError {
    pub alert_type: AlertType,
    pub table: String,
    #[source]
    pub source: serde_json::Error,
}

/// Row-count drift between two snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct DataGrowth {
    pub row_count: i64,
    pub prev_row_count: i64,
    pub diff_percentage: f64,
}

/// One failing key group of a uniqueness test: `[count, key]` on the wire.
///
/// Producers emit the count as an integer, a float or a string, so any
/// scalar is kept as sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "(Value, Value)", into = "(Value, String)")]
pub struct KeyFailure {
    pub count: Value,
    pub key: String,
}

impl KeyFailure {
    pub fn new(count: impl Into<Value>, key: impl Into<String>) -> Self {
        Self {
            count: count.into(),
            key: key.into(),
        }
    }

    /// The count as sent, without quotes: `"3"` prints as `3`, `3.0` stays `3.0`.
    pub fn count_label(&self) -> String {
        scalar_label(&self.count)
    }
}

fn scalar_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl TryFrom<(Value, Value)> for KeyFailure {
    type Error = String;

    fn try_from((count, key): (Value, Value)) -> Result<Self, Self::Error> {
        match count {
            Value::Number(_) | Value::String(_) | Value::Bool(_) => Ok(Self {
                count,
                key: scalar_label(&key),
            }),
            other => Err(format!("key failure count must be a scalar, got {other}")),
        }
    }
}

impl From<KeyFailure> for (Value, String) {
    fn from(failure: KeyFailure) -> Self {
        (failure.count, failure.key)
    }
}

/// Detail of a key or view test failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TestErrorDetail {
    Keys(Vec<KeyFailure>),
    Message(String),
}

/// A failed scheduled task run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct TaskFailure {
    pub state: String,
    pub query_text: String,
    pub error_code: String,
    pub error_message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AlertVariant {
    DataGrowth(DataGrowth),
    KeyOrViewTest(TestErrorDetail),
    TaskHistory(TaskFailure),
}

#[derive(Deserialize)]
struct TestEnvelope {
    #[serde(rename = "ERROR_MESSAGE")]
    error_message: Value,
}

fn parse_test_detail(raw: &str) -> Result<TestErrorDetail, serde_json::Error> {
    let envelope: TestEnvelope = serde_json::from_str(raw)?;
    match envelope.error_message {
        // Producers disagree on whether the detail is itself JSON-encoded.
        Value::String(inner) => Ok(serde_json::from_str(&inner)
            .unwrap_or(TestErrorDetail::Message(inner))),
        value => serde_json::from_value(value),
    }
}

impl AlertVariant {
    /// Parse the record's payload with the parser its alert type selects.
    pub fn parse(record: &AlertRecord) -> Result<Self, PayloadError> {
        let raw = record.error_message.as_str();
        let parsed = match record.alert_type.variant_kind() {
            VariantKind::DataGrowth => serde_json::from_str(raw).map(AlertVariant::DataGrowth),
            VariantKind::KeyOrViewTest => parse_test_detail(raw).map(AlertVariant::KeyOrViewTest),
            VariantKind::TaskHistory => serde_json::from_str(raw).map(AlertVariant::TaskHistory),
        };
        parsed.map_err(|source| PayloadError {
            alert_type: record.alert_type,
            table: record.table(),
            source,
        })
    }

    /// Variant-specific part of the chat message.
    pub fn notification_content(&self) -> NotificationContent {
        match self {
            AlertVariant::DataGrowth(growth) => NotificationContent {
                facts: vec![
                    Fact::new("Row Count:", growth.row_count),
                    Fact::new("Previous Row Count:", growth.prev_row_count),
                    Fact::new(
                        "Difference Percentage:",
                        format!("{}%", format_percentage(growth.diff_percentage)),
                    ),
                ],
                text: None,
            },
            AlertVariant::KeyOrViewTest(TestErrorDetail::Message(message)) => NotificationContent {
                facts: Vec::new(),
                text: Some(format!("<strong>Error Message:</strong><br>{}", escape_html(message))),
            },
            AlertVariant::KeyOrViewTest(TestErrorDetail::Keys(failures)) => {
                let lines: Vec<String> = failures
                    .iter()
                    .map(|f| {
                        format!(
                            "<br> There are {} records with {} key",
                            escape_html(&f.count_label()),
                            escape_html(&f.key)
                        )
                    })
                    .collect();
                NotificationContent {
                    facts: Vec::new(),
                    text: Some(format!("<strong>Error Message:</strong> {}", lines.join(" "))),
                }
            }
            AlertVariant::TaskHistory(task) => NotificationContent {
                facts: vec![
                    Fact::new("Query Text:", &task.query_text),
                    Fact::new("Error Code:", &task.error_code),
                    Fact::new("State:", &task.state),
                ],
                text: Some(format!(
                    "<strong>Error Message:</strong><br>{}",
                    escape_html(&task.error_message)
                )),
            },
        }
    }

    /// The error value stored with an annotation.
    pub fn annotation_value(&self) -> Value {
        match self {
            AlertVariant::DataGrowth(growth) => serde_json::json!(growth),
            AlertVariant::KeyOrViewTest(detail) => serde_json::json!(detail),
            AlertVariant::TaskHistory(task) => Value::String(task.error_message.clone()),
        }
    }
}

/// Render a percentage the way analysts are used to reading it: whole values
/// keep one decimal (`100.0`), everything else prints in shortest form.
pub fn format_percentage(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// A record together with its parsed payload.
#[derive(Debug, Clone)]
pub struct Alert {
    pub record: AlertRecord,
    pub variant: AlertVariant,
}

impl Alert {
    pub fn from_record(record: AlertRecord) -> Result<Self, PayloadError> {
        let variant = AlertVariant::parse(&record)?;
        Ok(Self { record, variant })
    }

    pub fn alert_type(&self) -> AlertType {
        self.record.alert_type
    }

    pub fn table(&self) -> String {
        self.record.table()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::alert::sample_record;

    fn parse(alert_type: AlertType, raw: &str) -> Result<AlertVariant, PayloadError> {
        AlertVariant::parse(&sample_record(alert_type, raw))
    }

    #[test]
    fn data_growth_extracts_all_three_fields() {
        let variant = parse(
            AlertType::DataGrowth,
            r#"{"ROW_COUNT":1234567,"PREV_ROW_COUNT":1000000,"DIFF_PERCENTAGE":-23.4567}"#,
        )
        .unwrap();
        assert_eq!(
            variant,
            AlertVariant::DataGrowth(DataGrowth {
                row_count: 1_234_567,
                prev_row_count: 1_000_000,
                diff_percentage: -23.4567,
            })
        );
    }

    #[test]
    fn data_growth_survives_json_round_trip() {
        let growth = DataGrowth {
            row_count: 42,
            prev_row_count: 7,
            diff_percentage: 500.0 / 7.0,
        };
        let raw = serde_json::to_string(&growth).unwrap();
        match parse(AlertType::DataGrowth, &raw).unwrap() {
            AlertVariant::DataGrowth(parsed) => assert_eq!(parsed, growth),
            other => panic!("unexpected variant {other:?}"),
        }
    }

    #[test]
    fn data_growth_missing_field_is_a_fault() {
        let err = parse(AlertType::DataGrowth, r#"{"ROW_COUNT":1,"PREV_ROW_COUNT":2}"#).unwrap_err();
        assert_eq!(err.alert_type, AlertType::DataGrowth);
        assert_eq!(err.table, "SALES.ORDERS");
        assert!(err.to_string().contains("DIFF_PERCENTAGE"));
    }

    #[test]
    fn test_detail_accepts_double_encoding() {
        let inner = json!([[3, "ORDER_ID"], [2, "CUSTOMER_ID"]]).to_string();
        let raw = json!({ "ERROR_MESSAGE": inner }).to_string();
        let expected = TestErrorDetail::Keys(vec![
            KeyFailure::new(3, "ORDER_ID"),
            KeyFailure::new(2, "CUSTOMER_ID"),
        ]);
        assert_eq!(
            parse(AlertType::KeyTest, &raw).unwrap(),
            AlertVariant::KeyOrViewTest(expected)
        );
    }

    #[test]
    fn test_detail_falls_back_to_single_encoding() {
        let raw = json!({ "ERROR_MESSAGE": [[3, "ORDER_ID"]] }).to_string();
        assert_eq!(
            parse(AlertType::KeyTest, &raw).unwrap(),
            AlertVariant::KeyOrViewTest(TestErrorDetail::Keys(vec![KeyFailure::new(3, "ORDER_ID")]))
        );

        let raw = json!({ "ERROR_MESSAGE": "View SALES.V_ORDERS failed to compile" }).to_string();
        assert_eq!(
            parse(AlertType::ViewTest, &raw).unwrap(),
            AlertVariant::KeyOrViewTest(TestErrorDetail::Message(
                "View SALES.V_ORDERS failed to compile".into()
            ))
        );
    }

    #[test]
    fn test_detail_double_encoded_string() {
        let inner = json!("invalid identifier 'ID'").to_string();
        let raw = json!({ "ERROR_MESSAGE": inner }).to_string();
        assert_eq!(
            parse(AlertType::ViewTest, &raw).unwrap(),
            AlertVariant::KeyOrViewTest(TestErrorDetail::Message("invalid identifier 'ID'".into()))
        );
    }

    #[test]
    fn test_detail_without_envelope_is_a_fault() {
        assert!(parse(AlertType::KeyTest, r#"{"DETAIL":"x"}"#).is_err());
        assert!(parse(AlertType::KeyTest, r#"{"ERROR_MESSAGE":{"nested":true}}"#).is_err());
    }

    #[test]
    fn task_history_requires_all_four_fields() {
        let raw = json!({
            "STATE": "FAILED",
            "QUERY_TEXT": "CALL LOAD_ORDERS()",
            "ERROR_CODE": "100183",
            "ERROR_MESSAGE": "Numeric value 'abc' is not recognized",
        })
        .to_string();
        match parse(AlertType::TaskHistory, &raw).unwrap() {
            AlertVariant::TaskHistory(task) => {
                assert_eq!(task.state, "FAILED");
                assert_eq!(task.error_code, "100183");
            }
            other => panic!("unexpected variant {other:?}"),
        }

        let raw = json!({"STATE": "FAILED", "QUERY_TEXT": "x", "ERROR_CODE": "1"}).to_string();
        assert!(parse(AlertType::TaskHistory, &raw).is_err());
        assert!(parse(AlertType::TaskHistory, "{not json").is_err());
    }

    #[test]
    fn data_growth_facts() {
        let variant = parse(
            AlertType::DataGrowth,
            r#"{"ROW_COUNT":100,"PREV_ROW_COUNT":50,"DIFF_PERCENTAGE":100.0}"#,
        )
        .unwrap();
        let content = variant.notification_content();
        let rendered: Vec<String> = content.facts.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "Row Count: 100",
                "Previous Row Count: 50",
                "Difference Percentage: 100.0%",
            ]
        );
        assert_eq!(content.text, None);
    }

    #[test]
    fn key_failures_render_one_line_each() {
        let variant = AlertVariant::KeyOrViewTest(TestErrorDetail::Keys(vec![
            KeyFailure::new(3, "ORDER_ID"),
            KeyFailure::new(2, "LINE_ID"),
        ]));
        assert_eq!(
            variant.notification_content().text.unwrap(),
            "<strong>Error Message:</strong> <br> There are 3 records with ORDER_ID key \
             <br> There are 2 records with LINE_ID key"
        );

        let variant = AlertVariant::KeyOrViewTest(TestErrorDetail::Message("boom".into()));
        assert_eq!(
            variant.notification_content().text.unwrap(),
            "<strong>Error Message:</strong><br>boom"
        );
    }

    #[test]
    fn task_history_facts_and_text() {
        let variant = AlertVariant::TaskHistory(TaskFailure {
            state: "FAILED".into(),
            query_text: "CALL LOAD()".into(),
            error_code: "002003".into(),
            error_message: "missing table".into(),
        });
        let content = variant.notification_content();
        let names: Vec<&str> = content.facts.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Query Text:", "Error Code:", "State:"]);
        assert_eq!(content.text.unwrap(), "<strong>Error Message:</strong><br>missing table");
        assert_eq!(variant.annotation_value(), json!("missing table"));
    }

    #[test]
    fn percentages_render_like_analysts_expect() {
        assert_eq!(format_percentage(100.0), "100.0");
        assert_eq!(format_percentage(-25.0), "-25.0");
        assert_eq!(format_percentage(12.5), "12.5");
        assert_eq!(format_percentage(0.1 + 0.2), "0.30000000000000004");
    }

    #[test]
    fn key_failures_store_as_pairs() {
        let variant = AlertVariant::KeyOrViewTest(TestErrorDetail::Keys(vec![KeyFailure::new(3, "ORDER_ID")]));
        assert_eq!(variant.annotation_value(), json!([[3, "ORDER_ID"]]));
    }

    #[test]
    fn key_failure_counts_accept_any_scalar() {
        let raw = json!({ "ERROR_MESSAGE": [[3.0, "K"]] }).to_string();
        let variant = parse(AlertType::KeyTest, &raw).unwrap();
        assert_eq!(
            variant.notification_content().text.unwrap(),
            "<strong>Error Message:</strong> <br> There are 3.0 records with K key"
        );

        let inner = json!([["3", "K"]]).to_string();
        let raw = json!({ "ERROR_MESSAGE": inner }).to_string();
        let variant = parse(AlertType::KeyTest, &raw).unwrap();
        assert_eq!(
            variant.notification_content().text.unwrap(),
            "<strong>Error Message:</strong> <br> There are 3 records with K key"
        );
        assert_eq!(variant.annotation_value(), json!([["3", "K"]]));

        let raw = json!({ "ERROR_MESSAGE": [[[3], "K"]] }).to_string();
        assert!(parse(AlertType::KeyTest, &raw).is_err());
    }

    #[test]
    fn warehouse_text_is_escaped_in_message_markup() {
        let variant = AlertVariant::TaskHistory(TaskFailure {
            state: "FAILED".into(),
            query_text: "SELECT * FROM T WHERE a<b.c".into(),
            error_code: "100183".into(),
            error_message: "<img src=x onerror=alert(1)>".into(),
        });
        let content = variant.notification_content();
        assert_eq!(
            content.text.unwrap(),
            "<strong>Error Message:</strong><br>&lt;img src=x onerror=alert(1)&gt;"
        );
        // Facts stay plain text; renderers escape them.
        assert_eq!(content.facts[0].value, "SELECT * FROM T WHERE a<b.c");

        let variant = AlertVariant::KeyOrViewTest(TestErrorDetail::Keys(vec![KeyFailure::new(
            2,
            "<b>ID</b>",
        )]));
        assert_eq!(
            variant.notification_content().text.unwrap(),
            "<strong>Error Message:</strong> <br> There are 2 records with &lt;b&gt;ID&lt;/b&gt; key"
        );

        let variant = AlertVariant::KeyOrViewTest(TestErrorDetail::Message("a < b".into()));
        assert_eq!(
            variant.notification_content().text.unwrap(),
            "<strong>Error Message:</strong><br>a &lt; b"
        );
    }
}
