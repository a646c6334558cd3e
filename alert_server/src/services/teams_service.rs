//! Microsoft Teams MessageCard rendering and webhook delivery.

use async_trait::async_trait;
use serde::Serialize;

use crate::models::notification::{escape_html, Fact, NotificationContent};
use crate::models::variant::Alert;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("chat webhook URL is not configured")]
    NotConfigured,
    #[error("chat webhook request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("chat webhook rejected the message: {status} {body}")]
    Rejected { status: u16, body: String },
}

/// Connector card payload for an incoming webhook.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageCard {
    #[serde(rename = "@type")]
    pub card_type: &'static str,
    #[serde(rename = "@context")]
    pub context: &'static str,
    pub summary: String,
    #[serde(rename = "themeColor")]
    pub theme_color: String,
    pub sections: Vec<CardSection>,
    #[serde(rename = "potentialAction")]
    pub potential_action: Vec<OpenUriAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardSection {
    pub title: String,
    #[serde(rename = "activitySubtitle")]
    pub activity_subtitle: String,
    pub facts: Vec<Fact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenUriAction {
    #[serde(rename = "@type")]
    pub action_type: &'static str,
    pub name: String,
    pub targets: Vec<UriTarget>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UriTarget {
    pub os: &'static str,
    pub uri: String,
}

const THEME_COLOR: &str = "FF5600";

impl MessageCard {
    /// Card for an alert flagged as an issue. Common envelope first, then the
    /// variant's own facts and text. Teams renders fact values as markup, so
    /// they are escaped here.
    pub fn for_issue(alert: &Alert, notes: &str, dashboard_url: &str) -> Self {
        let alert_type = alert.alert_type();
        let NotificationContent { facts, text } = alert.variant.notification_content();

        let mut section_facts = vec![
            Fact::new("Comment:", notes),
            Fact::new("Snapshot Date:", alert.record.snapshot_date),
        ];
        section_facts.extend(facts);
        for fact in &mut section_facts {
            fact.value = escape_html(&fact.value);
        }

        Self {
            card_type: "MessageCard",
            context: "https://schema.org/extensions",
            summary: format!("{alert_type} alert flagged on {}", alert.table()),
            theme_color: THEME_COLOR.to_string(),
            sections: vec![CardSection {
                title: format!("New Monitoring Comment: For {alert_type} Issue Detection"),
                activity_subtitle: alert.table(),
                facts: section_facts,
                text,
            }],
            potential_action: vec![OpenUriAction {
                action_type: "OpenUri",
                name: "Alert Dashboard".to_string(),
                targets: vec![UriTarget {
                    os: "default",
                    uri: dashboard_url.to_string(),
                }],
            }],
        }
    }
}

/// Delivers chat messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, card: &MessageCard) -> Result<(), NotifyError>;
}

/// Posts cards to a Teams incoming webhook.
pub struct TeamsNotifier {
    client: reqwest::Client,
    webhook_url: Option<String>,
}

impl TeamsNotifier {
    pub fn new(webhook_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url,
        }
    }
}

#[async_trait]
impl Notifier for TeamsNotifier {
    async fn send(&self, card: &MessageCard) -> Result<(), NotifyError> {
        let url = self.webhook_url.as_deref().ok_or(NotifyError::NotConfigured)?;

        let resp = self.client.post(url).json(card).send().await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!("Teams webhook rejected message: {} {}", status, body);
            return Err(NotifyError::Rejected { status, body });
        }

        crate::metrics::notification_sent("sent");
        tracing::info!(summary = %card.summary, "Teams message sent");
        Ok(())
    }
}
