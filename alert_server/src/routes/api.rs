//! REST API for alert review.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::DashboardConfig;
use crate::dashboard::chart::chart_spec;
use crate::dashboard::trend::{LookbackWindow, Trend};
use crate::events::disposition::{Disposition, DispositionState};
use crate::models::alert::{AlertRecord, AlertType};
use crate::models::notification::NotificationContent;
use crate::models::variant::Alert;
use crate::routes::error::ApiError;
use crate::services::alert_service;
use crate::services::disposition_service::{self, DispositionOutcome};
use crate::services::teams_service::Notifier;
use crate::services::warehouse::Warehouse;

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub session_id: uuid::Uuid,
    pub user: String,
}

#[derive(Debug, Deserialize)]
pub struct ListAlertsQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub alert_type: String,
}

/// Grid rows for the selected date range and alert type.
pub async fn list_alerts(
    warehouse: &dyn Warehouse,
    config: &DashboardConfig,
    query: ListAlertsQuery,
) -> Result<Vec<AlertRecord>, ApiError> {
    let alert_type: AlertType = query.alert_type.parse().map_err(ApiError::BadRequest)?;
    if query.start > query.end {
        return Err(ApiError::BadRequest(format!(
            "start date {} is after end date {}",
            query.start, query.end
        )));
    }
    Ok(alert_service::list_alerts(warehouse, config, query.start, query.end, alert_type).await?)
}

/// Parse a selected row, logging and counting payload faults.
fn parse_alert(record: AlertRecord) -> Result<Alert, ApiError> {
    Alert::from_record(record).map_err(|e| {
        crate::metrics::payload_fault(e.alert_type.as_str());
        tracing::warn!(alert_type = %e.alert_type, table = %e.table, "Malformed alert payload: {}", e.source);
        ApiError::from(e)
    })
}

#[derive(Debug, Deserialize)]
pub struct ViewRequest {
    pub alert: AlertRecord,
    pub days_ago: Option<i32>,
}

/// Everything the trend panel shows for one selected alert.
#[derive(Debug, Serialize)]
pub struct AlertViewResponse {
    pub alert_type: AlertType,
    pub table: String,
    pub state: DispositionState,
    pub days_ago: i32,
    pub trend: Trend,
    pub chart: serde_json::Value,
    pub notification: NotificationContent,
}

pub async fn view_alert(
    warehouse: &dyn Warehouse,
    config: &DashboardConfig,
    req: ViewRequest,
) -> Result<AlertViewResponse, ApiError> {
    let window = match req.days_ago {
        Some(days_ago) => LookbackWindow::new(days_ago).map_err(ApiError::BadRequest)?,
        None => LookbackWindow::default(),
    };
    let alert = parse_alert(req.alert)?;
    let trend = alert_service::load_trend(warehouse, config, &alert, window).await?;

    Ok(AlertViewResponse {
        alert_type: alert.alert_type(),
        table: alert.table(),
        state: DispositionState::Viewing,
        days_ago: window.days_ago(),
        chart: chart_spec(alert.alert_type(), &trend),
        notification: alert.variant.notification_content(),
        trend,
    })
}

#[derive(Debug, Deserialize)]
pub struct DispositionRequest {
    pub alert: AlertRecord,
    pub disposition: Disposition,
    #[serde(default)]
    pub notes: Option<String>,
}

pub async fn record_disposition(
    warehouse: &dyn Warehouse,
    notifier: &dyn Notifier,
    config: &DashboardConfig,
    req: DispositionRequest,
) -> Result<DispositionOutcome, ApiError> {
    let alert = parse_alert(req.alert)?;
    Ok(disposition_service::resolve(
        warehouse,
        notifier,
        config,
        &alert,
        req.disposition,
        req.notes.as_deref(),
    )
    .await?)
}
