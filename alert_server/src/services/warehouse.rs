//! Snowflake SQL API client — statement execution and tabular results.
//!
//! Every statement is one `POST /api/v2/statements` call. The server holds no
//! cursor between calls, so a session is just the credentials plus the
//! connection context (database, schema, warehouse, role) replayed on each
//! request.

use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::DashboardConfig;

#[derive(Debug, thiserror::Error)]
pub enum WarehouseError {
    #[error("authentication failed: {0}")]
    Unauthorized(String),
    #[error("statement failed ({code}, sqlstate {sql_state}): {message}")]
    Statement {
        code: String,
        sql_state: String,
        message: String,
    },
    #[error("warehouse request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("result column {0} not found")]
    MissingColumn(String),
    #[error("cannot decode column {column} value {value:?} as {expected}")]
    Decode {
        column: String,
        value: String,
        expected: &'static str,
    },
}

/// `X-Snowflake-Authorization-Token-Type` for the login token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenType {
    OAuth,
    KeypairJwt,
}

impl TokenType {
    pub fn header_value(self) -> &'static str {
        match self {
            TokenType::OAuth => "OAUTH",
            TokenType::KeypairJwt => "KEYPAIR_JWT",
        }
    }
}

impl FromStr for TokenType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "OAUTH" => Ok(TokenType::OAuth),
            "KEYPAIR_JWT" => Ok(TokenType::KeypairJwt),
            other => Err(format!("unsupported token type {other:?}")),
        }
    }
}

/// Login credentials presented on the dashboard's login form.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// An open warehouse session.
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Run a read statement and return its full result set.
    async fn query(&self, sql: &str) -> Result<Table, WarehouseError>;

    /// Run a write statement; success is the only signal.
    async fn execute(&self, sql: &str) -> Result<(), WarehouseError>;

    /// The user this session authenticated as.
    fn user(&self) -> &str;
}

/// Opens authenticated sessions.
#[async_trait]
pub trait WarehouseConnector: Send + Sync {
    async fn connect(&self, credentials: Credentials) -> Result<Arc<dyn Warehouse>, WarehouseError>;
}

// ── Tabular results ──

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Column {
    pub name: String,
    /// Snowflake logical type in lower case (`fixed`, `text`, `date`, ...).
    #[serde(rename = "type")]
    pub type_name: String,
}

/// A materialized result set. Cells are the SQL API's string encoding, or
/// `None` for SQL NULL.
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl Table {
    pub fn column_index(&self, name: &str) -> Result<usize, WarehouseError> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| WarehouseError::MissingColumn(name.to_string()))
    }

    pub fn row(&self, index: usize) -> Row<'_> {
        Row { table: self, index }
    }

    pub fn iter(&self) -> impl Iterator<Item = Row<'_>> {
        (0..self.rows.len()).map(move |index| self.row(index))
    }
}

/// Borrowed view of one result row with typed accessors.
#[derive(Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> Row<'a> {
    fn cell(&self, column: &str) -> Result<(&'a str, Option<&'a str>), WarehouseError> {
        let idx = self.table.column_index(column)?;
        let name = self.table.columns[idx].name.as_str();
        let value = self.table.rows[self.index]
            .get(idx)
            .and_then(|v| v.as_deref());
        Ok((name, value))
    }

    fn decode_err(column: &str, value: &str, expected: &'static str) -> WarehouseError {
        WarehouseError::Decode {
            column: column.to_string(),
            value: value.to_string(),
            expected,
        }
    }

    pub fn opt_text(&self, column: &str) -> Result<Option<&'a str>, WarehouseError> {
        Ok(self.cell(column)?.1)
    }

    pub fn text(&self, column: &str) -> Result<&'a str, WarehouseError> {
        let (name, value) = self.cell(column)?;
        value.ok_or_else(|| Self::decode_err(name, "NULL", "non-null text"))
    }

    pub fn opt_i64(&self, column: &str) -> Result<Option<i64>, WarehouseError> {
        let (name, value) = self.cell(column)?;
        value
            .map(|v| parse_i64(v).ok_or_else(|| Self::decode_err(name, v, "integer")))
            .transpose()
    }

    pub fn opt_f64(&self, column: &str) -> Result<Option<f64>, WarehouseError> {
        let (name, value) = self.cell(column)?;
        value
            .map(|v| {
                v.trim()
                    .parse::<f64>()
                    .map_err(|_| Self::decode_err(name, v, "number"))
            })
            .transpose()
    }

    pub fn opt_bool(&self, column: &str) -> Result<Option<bool>, WarehouseError> {
        let (name, value) = self.cell(column)?;
        value
            .map(|v| parse_bool(v).ok_or_else(|| Self::decode_err(name, v, "boolean")))
            .transpose()
    }

    pub fn date(&self, column: &str) -> Result<NaiveDate, WarehouseError> {
        let (name, value) = self.cell(column)?;
        let v = value.ok_or_else(|| Self::decode_err(name, "NULL", "date"))?;
        parse_date(v).ok_or_else(|| Self::decode_err(name, v, "date"))
    }

    pub fn opt_timestamp(&self, column: &str) -> Result<Option<DateTime<Utc>>, WarehouseError> {
        let (name, value) = self.cell(column)?;
        value
            .map(|v| parse_timestamp(v).ok_or_else(|| Self::decode_err(name, v, "timestamp")))
            .transpose()
    }
}

fn parse_i64(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    raw.parse::<i64>().ok().or_else(|| {
        // Scaled NUMBER columns come back as "12.000".
        let value = raw.parse::<f64>().ok()?;
        (value.fract() == 0.0 && value.abs() < i64::MAX as f64).then_some(value as i64)
    })
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Dates arrive as days since the epoch; ISO dates are accepted too.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    let days: i64 = raw.parse().ok()?;
    DateTime::from_timestamp(days.checked_mul(86_400)?, 0).map(|ts| ts.date_naive())
}

/// Timestamps arrive as `seconds[.fraction][ offset]`; RFC 3339 is accepted too.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    let epoch = raw.split_whitespace().next()?;
    let (secs, frac) = match epoch.split_once('.') {
        Some((secs, frac)) => (secs, frac),
        None => (epoch, ""),
    };
    let negative = secs.starts_with('-');
    let secs: i64 = secs.parse().ok()?;
    let nanos: u32 = if frac.is_empty() {
        0
    } else {
        let digits: String = frac.chars().take(9).collect();
        let scale = 10u32.pow(9 - digits.len() as u32);
        digits.parse::<u32>().ok()? * scale
    };
    // The fraction shares the sign of the seconds: -1.5 is -2 s + 0.5 s.
    if negative && nanos > 0 {
        return DateTime::from_timestamp(secs.checked_sub(1)?, 1_000_000_000 - nanos);
    }
    DateTime::from_timestamp(secs, nanos)
}

// ── SQL API wire format ──

#[derive(Serialize)]
struct StatementRequest<'a> {
    statement: &'a str,
    timeout: u64,
    database: &'a str,
    schema: &'a str,
    warehouse: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatementResponse {
    statement_handle: Option<String>,
    result_set_meta_data: Option<ResultSetMetaData>,
    #[serde(default)]
    data: Vec<Vec<Option<String>>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultSetMetaData {
    #[serde(default)]
    row_type: Vec<Column>,
    #[serde(default)]
    partition_info: Vec<serde_json::Value>,
}

/// Outcome of one SQL API round trip.
enum Reply {
    Done(StatementResponse),
    /// HTTP 202: still executing under this handle.
    Pending(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    sql_state: String,
}

/// Server-side statement timeout, seconds. The SQL API default is two days.
const STATEMENT_TIMEOUT_SECS: u64 = 600;
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Opens [`SnowflakeSession`]s against the configured account.
pub struct SnowflakeConnector {
    client: reqwest::Client,
    config: DashboardConfig,
}

impl SnowflakeConnector {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl WarehouseConnector for SnowflakeConnector {
    async fn connect(&self, credentials: Credentials) -> Result<Arc<dyn Warehouse>, WarehouseError> {
        let session = SnowflakeSession {
            client: self.client.clone(),
            config: self.config.clone(),
            credentials,
        };

        // Prove the token works before handing out a session.
        let table = session.query("SELECT CURRENT_USER() AS CURRENT_USER").await?;
        let row = table
            .iter()
            .next()
            .ok_or_else(|| WarehouseError::Unauthorized("no current user for token".to_string()))?;
        let current = row.text("CURRENT_USER")?;
        if !current.eq_ignore_ascii_case(&session.credentials.username) {
            return Err(WarehouseError::Unauthorized(format!(
                "token belongs to {current}, not {}",
                session.credentials.username
            )));
        }

        tracing::info!(
            user = %session.credentials.username,
            account = %session.config.account,
            "Warehouse session opened"
        );
        Ok(Arc::new(session))
    }
}

pub struct SnowflakeSession {
    client: reqwest::Client,
    config: DashboardConfig,
    credentials: Credentials,
}

impl SnowflakeSession {
    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .bearer_auth(&self.credentials.token)
            .header(
                "X-Snowflake-Authorization-Token-Type",
                self.config.token_type.header_value(),
            )
            .header("Accept", "application/json")
            .header("User-Agent", "alert-dashboard")
    }

    fn statements_url(&self) -> String {
        format!("{}/api/v2/statements", self.config.api_url)
    }

    async fn read_response(resp: reqwest::Response) -> Result<Reply, WarehouseError> {
        let status = resp.status();
        if status == reqwest::StatusCode::ACCEPTED {
            let pending: StatementResponse = resp.json().await?;
            return pending
                .statement_handle
                .map(Reply::Pending)
                .ok_or_else(|| WarehouseError::Statement {
                    code: String::new(),
                    sql_state: String::new(),
                    message: "statement accepted without a handle".to_string(),
                });
        }
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            let body: ErrorResponse = resp.json().await.unwrap_or_default();
            return Err(WarehouseError::Unauthorized(if body.message.is_empty() {
                status.to_string()
            } else {
                body.message
            }));
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let body: ErrorResponse = serde_json::from_str(&text).unwrap_or_else(|_| ErrorResponse {
                message: format!("{status}: {text}"),
                ..Default::default()
            });
            return Err(WarehouseError::Statement {
                code: body.code,
                sql_state: body.sql_state,
                message: body.message,
            });
        }
        Ok(Reply::Done(resp.json().await?))
    }

    /// Submit a statement and wait for its first result partition.
    async fn run(&self, sql: &str) -> Result<StatementResponse, WarehouseError> {
        let body = StatementRequest {
            statement: sql,
            timeout: STATEMENT_TIMEOUT_SECS,
            database: &self.config.database,
            schema: &self.config.schema,
            warehouse: &self.config.warehouse,
            role: self.config.role.as_deref(),
        };
        let resp = self
            .request(self.client.post(self.statements_url()))
            .json(&body)
            .send()
            .await?;

        match Self::read_response(resp).await? {
            Reply::Done(response) => Ok(response),
            Reply::Pending(handle) => {
                tokio::time::sleep(POLL_INTERVAL).await;
                self.follow(format!("{}/{handle}", self.statements_url())).await
            }
        }
    }

    /// GET a statement or partition URL until it stops answering 202.
    async fn follow(&self, url: String) -> Result<StatementResponse, WarehouseError> {
        loop {
            let resp = self.request(self.client.get(&url)).send().await?;
            match Self::read_response(resp).await? {
                Reply::Done(response) => return Ok(response),
                Reply::Pending(_) => tokio::time::sleep(POLL_INTERVAL).await,
            }
        }
    }
}

#[async_trait]
impl Warehouse for SnowflakeSession {
    async fn query(&self, sql: &str) -> Result<Table, WarehouseError> {
        let started = Instant::now();
        let first = self.run(sql).await?;

        let meta = first.result_set_meta_data.unwrap_or(ResultSetMetaData {
            row_type: Vec::new(),
            partition_info: Vec::new(),
        });
        let mut rows = first.data;

        if let Some(handle) = first.statement_handle.as_deref() {
            for partition in 1..meta.partition_info.len() {
                let url = format!("{}/{handle}?partition={partition}", self.statements_url());
                rows.extend(self.follow(url).await?.data);
            }
        }

        crate::metrics::warehouse_query("read", started.elapsed().as_millis() as u64);
        Ok(Table {
            columns: meta
                .row_type
                .into_iter()
                .map(|c| Column {
                    type_name: c.type_name.to_ascii_lowercase(),
                    name: c.name,
                })
                .collect(),
            rows,
        })
    }

    async fn execute(&self, sql: &str) -> Result<(), WarehouseError> {
        let started = Instant::now();
        self.run(sql).await?;
        crate::metrics::warehouse_query("write", started.elapsed().as_millis() as u64);
        Ok(())
    }

    fn user(&self) -> &str {
        &self.credentials.username
    }
}

/// Quote a value as a SQL string literal.
pub fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}


#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use axum::extract::{Path, RawQuery, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;

    use super::fake::table;
    use super::*;

    #[test]
    fn dates_decode_from_epoch_days_and_iso() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(parse_date("19723"), Some(expected));
        assert_eq!(parse_date("2024-01-01"), Some(expected));
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn timestamps_decode_with_fraction_and_offset() {
        let ts = parse_timestamp("1704067200.250000000 1440").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-01-01T00:00:00.250+00:00");
        let ts = parse_timestamp("1704067200").unwrap();
        assert_eq!(ts.timestamp(), 1_704_067_200);
        let ts = parse_timestamp("2024-01-01T06:00:00+06:00").unwrap();
        assert_eq!(ts.timestamp(), 1_704_067_200);
    }

    #[test]
    fn negative_fractional_timestamps_keep_their_sign() {
        let ts = parse_timestamp("-1.5").unwrap();
        assert_eq!(ts.timestamp(), -2);
        assert_eq!(ts.timestamp_subsec_nanos(), 500_000_000);
        assert_eq!(ts.timestamp_millis(), -1_500);
        assert_eq!(parse_timestamp("-0.5 1440").unwrap().timestamp_millis(), -500);
        assert_eq!(parse_timestamp("-3").unwrap().timestamp(), -3);
    }

    #[test]
    fn row_accessors_decode_by_column_name() {
        let t = table(
            &[("SNAPSHOT_DATE", "date"), ("ROW_COUNT", "fixed"), ("ISSUE", "fixed"), ("NOTE", "text")],
            vec![vec![Some("19723"), Some("12.000"), Some("1"), None]],
        );
        let row = t.row(0);
        assert_eq!(row.date("snapshot_date").unwrap().to_string(), "2024-01-01");
        assert_eq!(row.opt_i64("ROW_COUNT").unwrap(), Some(12));
        assert_eq!(row.opt_bool("ISSUE").unwrap(), Some(true));
        assert_eq!(row.opt_text("NOTE").unwrap(), None);
        assert!(matches!(row.text("NOTE"), Err(WarehouseError::Decode { .. })));
        assert!(matches!(row.text("MISSING"), Err(WarehouseError::MissingColumn(_))));
    }

    #[test]
    fn literals_double_single_quotes() {
        assert_eq!(sql_literal("O'Brien.T"), "'O''Brien.T'");
    }

    // ── SQL API against a throwaway server ──

    #[derive(Default)]
    struct ApiState {
        statements: Mutex<Vec<serde_json::Value>>,
        auth: Mutex<Vec<String>>,
        partition_polls: AtomicUsize,
    }

    async fn submit(
        State(state): State<Arc<ApiState>>,
        headers: HeaderMap,
        Json(body): Json<serde_json::Value>,
    ) -> (StatusCode, Json<serde_json::Value>) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        state.auth.lock().unwrap().push(auth.clone());
        let statement = body["statement"].as_str().unwrap_or_default().to_string();
        state.statements.lock().unwrap().push(body);

        if auth != "Bearer good-token" && auth != "Bearer empty-token" {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"code": "390303", "message": "Invalid OAuth access token."})),
            );
        }
        if statement.contains("CURRENT_USER") && auth == "Bearer empty-token" {
            return (
                StatusCode::OK,
                Json(json!({
                    "statementHandle": "h-user",
                    "resultSetMetaData": {"rowType": [{"name": "CURRENT_USER", "type": "TEXT"}],
                                          "partitionInfo": []},
                    "data": []
                })),
            );
        }
        if statement.contains("CURRENT_USER") {
            return (
                StatusCode::OK,
                Json(json!({
                    "statementHandle": "h-user",
                    "resultSetMetaData": {"rowType": [{"name": "CURRENT_USER", "type": "TEXT"}],
                                          "partitionInfo": [{"rowCount": 1}]},
                    "data": [["ANALYST"]]
                })),
            );
        }
        if statement.starts_with("INSERT") {
            return (StatusCode::OK, Json(json!({"statementHandle": "h-ins", "data": [["1"]],
                "resultSetMetaData": {"rowType": [{"name": "number of rows inserted", "type": "fixed"}]}})));
        }
        if statement.contains("BROKEN") {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({"code": "002003", "sqlState": "42S02", "message": "Object 'BROKEN' does not exist."})),
            );
        }
        (StatusCode::ACCEPTED, Json(json!({"statementHandle": "h-slow"})))
    }

    async fn poll(
        State(state): State<Arc<ApiState>>,
        Path(handle): Path<String>,
        RawQuery(query): RawQuery,
    ) -> (StatusCode, Json<serde_json::Value>) {
        assert_eq!(handle, "h-slow");
        match query.as_deref() {
            // The first partition fetch is still being prepared.
            Some("partition=1") if state.partition_polls.fetch_add(1, Ordering::SeqCst) == 0 => {
                (StatusCode::ACCEPTED, Json(json!({"statementHandle": "h-slow"})))
            }
            Some("partition=1") => (StatusCode::OK, Json(json!({"data": [["3"]]}))),
            _ => (
                StatusCode::OK,
                Json(json!({
                    "statementHandle": "h-slow",
                    "resultSetMetaData": {"rowType": [{"name": "N", "type": "FIXED"}],
                                          "partitionInfo": [{"rowCount": 2}, {"rowCount": 1}]},
                    "data": [["1"], ["2"]]
                })),
            ),
        }
    }

    async fn spawn_api() -> (String, Arc<ApiState>) {
        let state = Arc::new(ApiState::default());
        let app = Router::new()
            .route("/api/v2/statements", post(submit))
            .route("/api/v2/statements/{handle}", get(poll))
            .with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), state)
    }

    fn connector(api_url: String) -> SnowflakeConnector {
        let mut config = crate::config::test_config();
        config.api_url = api_url;
        config.role = Some("MONITORING".into());
        SnowflakeConnector::new(config)
    }

    fn creds(token: &str) -> Credentials {
        Credentials {
            username: "analyst".into(),
            token: token.into(),
        }
    }

    #[tokio::test]
    async fn connect_verifies_token_and_sends_context() {
        let (url, state) = spawn_api().await;
        let session = connector(url).connect(creds("good-token")).await.unwrap();
        assert_eq!(session.user(), "analyst");

        let statements = state.statements.lock().unwrap();
        assert_eq!(statements[0]["database"], "ANALYTICS");
        assert_eq!(statements[0]["warehouse"], "REPORTING_WH");
        assert_eq!(statements[0]["schema"], "MART_MONITORING");
        assert_eq!(statements[0]["role"], "MONITORING");
    }

    #[tokio::test]
    async fn bad_token_is_an_authentication_fault() {
        let (url, _state) = spawn_api().await;
        let err = connector(url).connect(creds("stale")).await.err().unwrap();
        match err {
            WarehouseError::Unauthorized(message) => assert!(message.contains("OAuth")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn token_without_a_current_user_is_rejected() {
        let (url, _state) = spawn_api().await;
        match connector(url).connect(creds("empty-token")).await {
            Err(WarehouseError::Unauthorized(message)) => assert!(message.contains("no current user")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("session opened without a verified user"),
        }
    }

    #[tokio::test]
    async fn async_statements_are_polled_and_partitions_merged() {
        let (url, state) = spawn_api().await;
        let session = connector(url).connect(creds("good-token")).await.unwrap();
        let table = session.query("SELECT N FROM SLOW").await.unwrap();
        assert_eq!(table.columns[0].type_name, "fixed");
        let values: Vec<_> = table.iter().map(|r| r.opt_i64("N").unwrap().unwrap()).collect();
        // Partition 1 answered 202 once before its rows were ready.
        assert_eq!(values, vec![1, 2, 3]);
        assert_eq!(state.partition_polls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn statement_errors_carry_warehouse_detail() {
        let (url, _state) = spawn_api().await;
        let session = connector(url).connect(creds("good-token")).await.unwrap();
        session.execute("INSERT INTO T SELECT 1").await.unwrap();
        match session.query("SELECT * FROM BROKEN").await {
            Err(WarehouseError::Statement { code, sql_state, message }) => {
                assert_eq!(code, "002003");
                assert_eq!(sql_state, "42S02");
                assert!(message.contains("BROKEN"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
