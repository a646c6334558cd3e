//! Historical trend queries for the object behind a selected alert.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::alert::VariantKind;
use crate::models::variant::Alert;
use crate::services::warehouse::{sql_literal, Table, WarehouseError};

/// Row-count swings beyond this many percent, either direction, are issues.
pub const ISSUE_THRESHOLD_PCT: f64 = 25.0;

pub fn is_issue(diff_percentage: f64) -> bool {
    diff_percentage > ISSUE_THRESHOLD_PCT || diff_percentage < -ISSUE_THRESHOLD_PCT
}

/// How far back the trend chart reaches, as a day offset from today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LookbackWindow {
    days_ago: i32,
}

impl LookbackWindow {
    pub const MIN_DAYS_AGO: i32 = -365;
    pub const MAX_DAYS_AGO: i32 = 1;
    pub const DEFAULT_DAYS_AGO: i32 = -200;

    pub fn new(days_ago: i32) -> Result<Self, String> {
        if (Self::MIN_DAYS_AGO..=Self::MAX_DAYS_AGO).contains(&days_ago) {
            Ok(Self { days_ago })
        } else {
            Err(format!(
                "days_ago must be between {} and {}, got {days_ago}",
                Self::MIN_DAYS_AGO,
                Self::MAX_DAYS_AGO
            ))
        }
    }

    pub fn days_ago(self) -> i32 {
        self.days_ago
    }

    /// Exclusive lower bound on `SNAPSHOT_DATE`, relative to the warehouse
    /// session's current date.
    pub fn lower_bound_sql(self) -> String {
        format!("DATEADD('day', {}, CURRENT_DATE())", self.days_ago)
    }
}

impl Default for LookbackWindow {
    fn default() -> Self {
        Self {
            days_ago: Self::DEFAULT_DAYS_AGO,
        }
    }
}

/// Build the trend query for an alert's table over the lookback window.
pub fn trend_query(alerts_table: &str, alert: &Alert, window: LookbackWindow) -> String {
    let select = match alert.alert_type().variant_kind() {
        VariantKind::DataGrowth => format!(
            "SELECT SNAPSHOT_DATE, \
                ERROR_MESSAGE:ROW_COUNT AS ROW_COUNT, \
                ERROR_MESSAGE:DIFF_PERCENTAGE AS DIFF_PERCENTAGE, \
                CASE WHEN ERROR_MESSAGE:DIFF_PERCENTAGE > {t} OR ERROR_MESSAGE:DIFF_PERCENTAGE < -{t} \
                    THEN 1 ELSE 0 END AS ISSUE",
            t = ISSUE_THRESHOLD_PCT
        ),
        VariantKind::KeyOrViewTest | VariantKind::TaskHistory => {
            "SELECT SNAPSHOT_DATE, OBJECT_NAME".to_string()
        }
    };

    format!(
        "{select} \
         FROM {alerts_table} \
         WHERE SCHEMA_NAME || '.' || OBJECT_NAME = {table} \
           AND SNAPSHOT_DATE > {lower} \
         ORDER BY SNAPSHOT_DATE",
        table = sql_literal(&alert.table()),
        lower = window.lower_bound_sql(),
    )
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct GrowthPoint {
    pub snapshot_date: NaiveDate,
    pub row_count: Option<i64>,
    pub diff_percentage: Option<f64>,
    pub issue: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct FailurePoint {
    pub snapshot_date: NaiveDate,
    pub object_name: String,
}

/// Decoded trend rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Trend {
    Growth(Vec<GrowthPoint>),
    Failures(Vec<FailurePoint>),
}

impl Trend {
    pub fn decode(kind: VariantKind, table: &Table) -> Result<Self, WarehouseError> {
        match kind {
            VariantKind::DataGrowth => table
                .iter()
                .map(|row| -> Result<GrowthPoint, WarehouseError> {
                    let diff_percentage = row.opt_f64("DIFF_PERCENTAGE")?;
                    let issue = match row.opt_bool("ISSUE")? {
                        Some(flag) => flag,
                        None => diff_percentage.is_some_and(is_issue),
                    };
                    Ok(GrowthPoint {
                        snapshot_date: row.date("SNAPSHOT_DATE")?,
                        row_count: row.opt_i64("ROW_COUNT")?,
                        diff_percentage,
                        issue,
                    })
                })
                .collect::<Result<_, _>>()
                .map(Trend::Growth),
            VariantKind::KeyOrViewTest | VariantKind::TaskHistory => table
                .iter()
                .map(|row| -> Result<FailurePoint, WarehouseError> {
                    Ok(FailurePoint {
                        snapshot_date: row.date("SNAPSHOT_DATE")?,
                        object_name: row.text("OBJECT_NAME")?.to_string(),
                    })
                })
                .collect::<Result<_, _>>()
                .map(Trend::Failures),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Trend::Growth(points) => points.len(),
            Trend::Failures(points) => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rows as JSON values, for chart data and the trend table.
    pub fn values(&self) -> Vec<serde_json::Value> {
        match self {
            Trend::Growth(points) => points.iter().filter_map(|p| serde_json::to_value(p).ok()).collect(),
            Trend::Failures(points) => points.iter().filter_map(|p| serde_json::to_value(p).ok()).collect(),
        }
    }
}
