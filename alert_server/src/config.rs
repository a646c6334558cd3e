//! Dashboard configuration, loaded from environment variables.

use crate::services::warehouse::TokenType;

/// Configuration faults. All of them are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),
    #[error("environment variable {var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Clone, Debug)]
pub struct DashboardConfig {
    /// Snowflake account identifier (e.g. `xy12345.us-east-1`).
    pub account: String,
    pub database: String,
    /// Default compute warehouse for every statement.
    pub warehouse: String,
    pub schema: String,
    pub role: Option<String>,
    /// How the login token is presented to the SQL API.
    pub token_type: TokenType,
    /// Base URL of the SQL API. Derived from the account unless overridden.
    pub api_url: String,
    /// Fully qualified alerts fact table.
    pub alerts_table: String,
    /// Append-only annotations table.
    pub notes_table: String,
    /// Source tag written next to every annotation.
    pub notes_source: String,
    /// Teams incoming-webhook URL. Issue dispositions need it.
    pub teams_webhook_url: Option<String>,
    /// Link-button target in chat messages.
    pub dashboard_url: String,
}

impl DashboardConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let account = required("SNOWFLAKE_ACCOUNT")?;
        let database = required("SNOWFLAKE_DATABASE")?;
        let warehouse = required("SNOWFLAKE_WAREHOUSE")?;
        let schema = required("SNOWFLAKE_SCHEMA")?;

        let token_type = match get("SNOWFLAKE_TOKEN_TYPE") {
            Some(raw) => raw.parse().map_err(|reason| ConfigError::Invalid {
                var: "SNOWFLAKE_TOKEN_TYPE",
                reason,
            })?,
            None => TokenType::OAuth,
        };

        let api_url = get("SNOWFLAKE_API_URL")
            .unwrap_or_else(|| format!("https://{account}.snowflakecomputing.com"))
            .trim_end_matches('/')
            .to_string();

        let teams_webhook_url = get("TEAMS_WEBHOOK_URL");
        if teams_webhook_url.is_none() {
            tracing::warn!("TEAMS_WEBHOOK_URL not set -- issue dispositions will be rejected");
        }

        Ok(Self {
            role: get("SNOWFLAKE_ROLE"),
            token_type,
            api_url,
            alerts_table: get("ALERTS_TABLE")
                .unwrap_or_else(|| "MART_MONITORING.RPT_ALERTS".to_string()),
            notes_table: get("ALERT_NOTES_TABLE")
                .unwrap_or_else(|| "MONITORING.RPT_ALERT_NOTES".to_string()),
            notes_source: get("ALERT_NOTES_SOURCE")
                .unwrap_or_else(|| "MONITORING_DASHBOARD".to_string()),
            teams_webhook_url,
            dashboard_url: get("DASHBOARD_URL")
                .unwrap_or_else(|| "http://localhost:9090/".to_string()),
            account,
            database,
            warehouse,
            schema,
        })
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> DashboardConfig {
    DashboardConfig::from_lookup(|key| match key {
        "SNOWFLAKE_ACCOUNT" => Some("acme".into()),
        "SNOWFLAKE_DATABASE" => Some("ANALYTICS".into()),
        "SNOWFLAKE_WAREHOUSE" => Some("REPORTING_WH".into()),
        "SNOWFLAKE_SCHEMA" => Some("MART_MONITORING".into()),
        "TEAMS_WEBHOOK_URL" => Some("http://127.0.0.1:9/webhook".into()),
        _ => None,
    })
    .unwrap()
}
