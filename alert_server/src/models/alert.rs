//! One row of the alerts fact table.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::services::warehouse::{Row, WarehouseError};

/// Alert types the dashboard can review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertType {
    #[serde(rename = "DATA GROWTH")]
    DataGrowth,
    #[serde(rename = "KEY TEST")]
    KeyTest,
    #[serde(rename = "VIEW TEST")]
    ViewTest,
    #[serde(rename = "TASK HISTORY")]
    TaskHistory,
}

/// Payload shapes. Key and view tests share one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantKind {
    DataGrowth,
    KeyOrViewTest,
    TaskHistory,
}

impl AlertType {
    pub const ALL: [AlertType; 4] = [
        AlertType::DataGrowth,
        AlertType::KeyTest,
        AlertType::ViewTest,
        AlertType::TaskHistory,
    ];

    /// Value stored in the `ALERT_TYPE` column.
    pub fn as_str(self) -> &'static str {
        match self {
            AlertType::DataGrowth => "DATA GROWTH",
            AlertType::KeyTest => "KEY TEST",
            AlertType::ViewTest => "VIEW TEST",
            AlertType::TaskHistory => "TASK HISTORY",
        }
    }

    pub fn variant_kind(self) -> VariantKind {
        match self {
            AlertType::DataGrowth => VariantKind::DataGrowth,
            AlertType::KeyTest | AlertType::ViewTest => VariantKind::KeyOrViewTest,
            AlertType::TaskHistory => VariantKind::TaskHistory,
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        AlertType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown alert type {s:?}"))
    }
}

/// One detected anomaly for one object on one snapshot date.
///
/// `error_message` stays the raw JSON text from the warehouse; its shape
/// depends on `alert_type` and is parsed by [`crate::models::variant`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct AlertRecord {
    pub snapshot_date: NaiveDate,
    pub schema_name: String,
    pub object_name: String,
    #[serde(default)]
    pub database_name: Option<String>,
    #[serde(default)]
    pub object_type: Option<String>,
    pub alert_type: AlertType,
    #[serde(default)]
    pub sf_updated_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sf_updated_user: Option<String>,
    pub error_message: String,
}

impl AlertRecord {
    /// `SCHEMA.OBJECT` identity of the affected table.
    pub fn table(&self) -> String {
        format!("{}.{}", self.schema_name, self.object_name)
    }

    /// Decode a row of `SELECT *` from the alerts table.
    pub fn from_row(row: &Row<'_>) -> Result<Self, WarehouseError> {
        let alert_type_raw = row.text("ALERT_TYPE")?;
        let alert_type = alert_type_raw.parse().map_err(|_| WarehouseError::Decode {
            column: "ALERT_TYPE".to_string(),
            value: alert_type_raw.to_string(),
            expected: "alert type",
        })?;

        Ok(Self {
            snapshot_date: row.date("SNAPSHOT_DATE")?,
            schema_name: row.text("SCHEMA_NAME")?.to_string(),
            object_name: row.text("OBJECT_NAME")?.to_string(),
            database_name: row.opt_text("DATABASE_NAME")?.map(str::to_string),
            object_type: row.opt_text("OBJECT_TYPE")?.map(str::to_string),
            alert_type,
            sf_updated_timestamp: row.opt_timestamp("SF_UPDATED_TIMESTAMP")?,
            sf_updated_user: row.opt_text("SF_UPDATED_USER")?.map(str::to_string),
            error_message: row.opt_text("ERROR_MESSAGE")?.unwrap_or_default().to_string(),
        })
    }
}

#[cfg(test)]
pub(crate) fn sample_record(alert_type: AlertType, error_message: &str) -> AlertRecord {
    AlertRecord {
        snapshot_date: NaiveDate::from_ymd_opt(2024, 3, 14).unwrap(),
        schema_name: "SALES".into(),
        object_name: "ORDERS".into(),
        database_name: Some("ANALYTICS".into()),
        object_type: Some("TABLE".into()),
        alert_type,
        sf_updated_timestamp: DateTime::from_timestamp(1_710_410_400, 0),
        sf_updated_user: Some("ETL_SERVICE".into()),
        error_message: error_message.to_string(),
    }
}
