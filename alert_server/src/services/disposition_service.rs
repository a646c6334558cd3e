//! Disposition workflow — announce (for issues) and record an analyst's call.

use serde::Serialize;

use crate::config::DashboardConfig;
use crate::events::disposition::{
    Disposition, DispositionAggregate, DispositionEvent, DispositionState, TransitionError,
};
use crate::models::annotation::AnnotationRecord;
use crate::models::variant::Alert;
use crate::services::alert_service::{self, AlertServiceError};
use crate::services::teams_service::{MessageCard, Notifier, NotifyError};
use crate::services::warehouse::Warehouse;

#[derive(Debug, thiserror::Error)]
pub enum DispositionError {
    #[error(transparent)]
    Notify(#[from] NotifyError),
    #[error(transparent)]
    Record(#[from] AlertServiceError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

#[derive(Debug, Clone, Serialize)]
pub struct DispositionOutcome {
    pub state: DispositionState,
    pub disposition: Disposition,
    pub notified: bool,
    pub recorded: bool,
}

/// Run one disposition action for a freshly viewed alert.
///
/// `Issue` sends the chat message before writing; if the send fails nothing
/// is written. Each call appends its own annotation row.
pub async fn resolve(
    warehouse: &dyn Warehouse,
    notifier: &dyn Notifier,
    config: &DashboardConfig,
    alert: &Alert,
    disposition: Disposition,
    notes: Option<&str>,
) -> Result<DispositionOutcome, DispositionError> {
    let mut aggregate = DispositionAggregate::viewing();

    if disposition == Disposition::Issue {
        let card = MessageCard::for_issue(alert, notes.unwrap_or_default(), &config.dashboard_url);
        notifier.send(&card).await.map_err(|e| {
            tracing::error!(table = %alert.table(), "Issue notification failed: {e}");
            crate::metrics::notification_sent("failed");
            e
        })?;
        aggregate.apply(&DispositionEvent::NotificationSent)?;
    }

    let annotation = AnnotationRecord::new(alert, notes);
    alert_service::record_annotation(warehouse, config, &annotation).await?;
    aggregate.apply(&DispositionEvent::AnnotationRecorded { disposition })?;

    crate::metrics::disposition_recorded(disposition.as_str());
    tracing::info!(
        alert_type = %alert.alert_type(),
        table = %alert.table(),
        disposition = disposition.as_str(),
        notified = aggregate.notified,
        "Disposition recorded"
    );

    Ok(DispositionOutcome {
        state: aggregate.state,
        disposition,
        notified: aggregate.notified,
        recorded: aggregate.state == DispositionState::Recorded,
    })
}
