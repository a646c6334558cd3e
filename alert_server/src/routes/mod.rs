//! Dashboard HTTP routes.

pub mod api;
pub mod error;

use std::sync::Arc;

use axum::extract::{FromRequestParts, Query, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{Html, Json};
use axum::routing::{get, post};
use axum::Router;
use uuid::Uuid;

use crate::config::DashboardConfig;
use crate::models::alert::{AlertRecord, AlertType};
use crate::services::disposition_service::DispositionOutcome;
use crate::services::session_service::SessionStore;
use crate::services::teams_service::Notifier;
use crate::services::warehouse::{Credentials, Warehouse, WarehouseConnector, WarehouseError};

use self::error::ApiError;

pub const SESSION_HEADER: &str = "x-session-id";

/// Shared state for dashboard route handlers.
#[derive(Clone)]
pub struct DashboardState {
    pub config: DashboardConfig,
    pub sessions: Arc<SessionStore>,
    pub connector: Arc<dyn WarehouseConnector>,
    pub notifier: Arc<dyn Notifier>,
}

/// Build the dashboard's Axum router.
pub fn dashboard_router(state: DashboardState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        // Session
        .route("/api/session", post(login).delete(logout))
        // Alert API
        .route("/api/alert-types", get(alert_types))
        .route("/api/alerts", get(list_alerts))
        .route("/api/alerts/view", post(view_alert))
        .route("/api/alerts/disposition", post(record_disposition))
        .with_state(state)
}

/// The warehouse session named by the request's session header.
pub struct Session {
    pub id: Uuid,
    pub warehouse: Arc<dyn Warehouse>,
}

impl FromRequestParts<DashboardState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &DashboardState,
    ) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v.trim()).ok())
            .ok_or(ApiError::NoSession)?;
        let warehouse = state.sessions.get(&id).await.ok_or(ApiError::NoSession)?;
        Ok(Session { id, warehouse })
    }
}

impl Session {
    /// Drop the session once the warehouse stops accepting its token, so the
    /// next request asks for a fresh login.
    async fn settle<T>(&self, state: &DashboardState, result: Result<T, ApiError>) -> Result<T, ApiError> {
        if let Err(ApiError::Warehouse(WarehouseError::Unauthorized(reason))) = &result {
            state.sessions.remove(&self.id).await;
            crate::metrics::login("expired");
            tracing::warn!(user = self.warehouse.user(), session_id = %self.id, "Session rejected by warehouse: {reason}");
        }
        result
    }
}

// ── Shell ──

async fn index() -> Html<&'static str> {
    Html(include_str!("../../assets/index.html"))
}

async fn health() -> &'static str {
    "ok"
}

// ── Session ──

async fn login(
    State(state): State<DashboardState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<api::LoginResponse>, ApiError> {
    let username = credentials.username.trim().to_string();
    if username.is_empty() || credentials.token.is_empty() {
        return Err(ApiError::BadRequest("username and token are required".into()));
    }

    let warehouse = match state.connector.connect(credentials).await {
        Ok(w) => w,
        Err(e) => {
            tracing::warn!(user = %username, "Login failed: {e}");
            crate::metrics::login("failed");
            return Err(e.into());
        }
    };
    let session_id = state.sessions.insert(warehouse).await;
    let active_sessions = state.sessions.len().await;
    crate::metrics::login("ok");
    tracing::info!(user = %username, %session_id, active_sessions, "Analyst logged in");

    Ok(Json(api::LoginResponse {
        session_id,
        user: username,
    }))
}

async fn logout(State(state): State<DashboardState>, session: Session) -> StatusCode {
    state.sessions.remove(&session.id).await;
    tracing::info!(user = session.warehouse.user(), "Analyst logged out");
    StatusCode::NO_CONTENT
}

// ── Alert API ──

async fn alert_types() -> Json<Vec<AlertType>> {
    Json(AlertType::ALL.to_vec())
}

async fn list_alerts(
    State(state): State<DashboardState>,
    session: Session,
    Query(query): Query<api::ListAlertsQuery>,
) -> Result<Json<Vec<AlertRecord>>, ApiError> {
    let result = api::list_alerts(session.warehouse.as_ref(), &state.config, query).await;
    session.settle(&state, result).await.map(Json)
}

async fn view_alert(
    State(state): State<DashboardState>,
    session: Session,
    Json(req): Json<api::ViewRequest>,
) -> Result<Json<api::AlertViewResponse>, ApiError> {
    let result = api::view_alert(session.warehouse.as_ref(), &state.config, req).await;
    session.settle(&state, result).await.map(Json)
}

async fn record_disposition(
    State(state): State<DashboardState>,
    session: Session,
    Json(req): Json<api::DispositionRequest>,
) -> Result<Json<DispositionOutcome>, ApiError> {
    let result = api::record_disposition(
        session.warehouse.as_ref(),
        state.notifier.as_ref(),
        &state.config,
        req,
    )
    .await;
    session.settle(&state, result).await.map(Json)
}
