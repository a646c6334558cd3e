//! The analyst's recorded disposition of an alert.

use serde::Serialize;
use serde_json::Value;

use crate::models::variant::Alert;

/// Document appended to the notes table, one per disposition action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationRecord {
    #[serde(rename = "SNAPSHOT_DATE")]
    pub snapshot_date: String,
    #[serde(rename = "SCHEMA_NAME")]
    pub schema_name: String,
    #[serde(rename = "OBJECT_NAME")]
    pub object_name: String,
    #[serde(rename = "OBJECT_TYPE")]
    pub object_type: Option<String>,
    #[serde(rename = "ALERT_TYPE")]
    pub alert_type: String,
    /// Key spelling matches the rows already in the notes table.
    #[serde(rename = "ERRROR_MESSAGE")]
    pub error_message: Value,
    #[serde(rename = "SF_UPDATED_TIMESTAMP")]
    pub sf_updated_timestamp: Option<String>,
    #[serde(rename = "SF_UPDATED_USER")]
    pub sf_updated_user: Option<String>,
    #[serde(rename = "NOTES")]
    pub notes: Option<String>,
}

impl AnnotationRecord {
    /// Blank or whitespace-only notes are stored as null.
    pub fn new(alert: &Alert, notes: Option<&str>) -> Self {
        let record = &alert.record;
        Self {
            snapshot_date: record.snapshot_date.to_string(),
            schema_name: record.schema_name.clone(),
            object_name: record.object_name.clone(),
            object_type: record.object_type.clone(),
            alert_type: record.alert_type.as_str().to_string(),
            error_message: alert.variant.annotation_value(),
            sf_updated_timestamp: record.sf_updated_timestamp.map(|ts| ts.to_rfc3339()),
            sf_updated_user: record.sf_updated_user.clone(),
            notes: notes
                .filter(|n| !n.trim().is_empty())
                .map(str::to_string),
        }
    }

    /// JSON text safe to embed between `$$` delimiters. `$` is written as
    /// its JSON escape, which `PARSE_JSON` reads back unchanged.
    pub fn to_dollar_quoted_json(&self) -> Result<String, serde_json::Error> {
        Ok(serde_json::to_string(self)?.replace('$', "\\u0024"))
    }
}
