//! Alert reads and annotation writes against the warehouse.

use chrono::NaiveDate;

use crate::config::DashboardConfig;
use crate::dashboard::trend::{trend_query, LookbackWindow, Trend};
use crate::models::alert::{AlertRecord, AlertType};
use crate::models::annotation::AnnotationRecord;
use crate::models::variant::Alert;
use crate::services::warehouse::{sql_literal, Warehouse, WarehouseError};

#[derive(Debug, thiserror::Error)]
pub enum AlertServiceError {
    #[error(transparent)]
    Warehouse(#[from] WarehouseError),
    #[error("cannot encode annotation: {0}")]
    Encode(#[from] serde_json::Error),
}

pub fn list_alerts_query(alerts_table: &str, start: NaiveDate, end: NaiveDate, alert_type: AlertType) -> String {
    format!(
        "SELECT * FROM {alerts_table} \
         WHERE SNAPSHOT_DATE >= {start}::date \
           AND SNAPSHOT_DATE <= {end}::date \
           AND ALERT_TYPE = {alert_type}",
        start = sql_literal(&start.to_string()),
        end = sql_literal(&end.to_string()),
        alert_type = sql_literal(alert_type.as_str()),
    )
}

/// Alerts of one type whose snapshot date falls in `[start, end]`.
pub async fn list_alerts(
    warehouse: &dyn Warehouse,
    config: &DashboardConfig,
    start: NaiveDate,
    end: NaiveDate,
    alert_type: AlertType,
) -> Result<Vec<AlertRecord>, WarehouseError> {
    let sql = list_alerts_query(&config.alerts_table, start, end, alert_type);
    let table = warehouse.query(&sql).await?;
    let records = table
        .iter()
        .map(|row| AlertRecord::from_row(&row))
        .collect::<Result<Vec<_>, _>>()?;

    crate::metrics::alerts_listed(alert_type.as_str(), records.len());
    tracing::info!(
        alert_type = %alert_type,
        %start,
        %end,
        count = records.len(),
        "Alerts fetched"
    );
    Ok(records)
}

/// Trend rows for the alert's table over the lookback window.
pub async fn load_trend(
    warehouse: &dyn Warehouse,
    config: &DashboardConfig,
    alert: &Alert,
    window: LookbackWindow,
) -> Result<Trend, WarehouseError> {
    let sql = trend_query(&config.alerts_table, alert, window);
    let table = warehouse.query(&sql).await?;
    let trend = Trend::decode(alert.alert_type().variant_kind(), &table)?;
    if trend.is_empty() {
        tracing::warn!(table = %alert.table(), days_ago = window.days_ago(), "No trend rows in lookback window");
    } else {
        tracing::debug!(table = %alert.table(), points = trend.len(), "Trend loaded");
    }
    Ok(trend)
}

pub fn annotation_insert(config: &DashboardConfig, annotation: &AnnotationRecord) -> Result<String, serde_json::Error> {
    Ok(format!(
        "INSERT INTO {table} SELECT PARSE_JSON($${doc}$$), SYSDATE(), {source}",
        table = config.notes_table,
        doc = annotation.to_dollar_quoted_json()?,
        source = sql_literal(&config.notes_source),
    ))
}

/// Append one annotation row. Repeated calls append repeated rows.
pub async fn record_annotation(
    warehouse: &dyn Warehouse,
    config: &DashboardConfig,
    annotation: &AnnotationRecord,
) -> Result<(), AlertServiceError> {
    let sql = annotation_insert(config, annotation)?;
    warehouse.execute(&sql).await?;
    tracing::info!(
        alert_type = %annotation.alert_type,
        schema = %annotation.schema_name,
        object = %annotation.object_name,
        user = warehouse.user(),
        "Annotation recorded"
    );
    Ok(())
}
