//! Webhook delivery of rendered clarification messages.

use std::time::Duration;

use async_trait::async_trait;
use monitor_core::error::{MonitorError, Result};
use monitor_core::formatting;
use monitor_core::models::Change;
use reqwest::StatusCode;
use tracing::{debug, warn};

/// Destination for rendered notification text.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `body`. Any failure is a [`MonitorError::Delivery`].
    async fn post(&self, body: &str) -> Result<()>;
}

/// What happened to a change handed to [`notify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The webhook accepted the message.
    Delivered,
    /// The template produced no text, so nothing was sent.
    SkippedEmpty,
}

/// Render `change` and deliver it through `notifier`.
pub async fn notify<N>(notifier: &N, change: &Change) -> Result<DeliveryOutcome>
where
    N: Notifier + ?Sized,
{
    deliver_rendered(notifier, change, formatting::render(change)).await
}

/// Deliver an already-rendered body for `change`.
///
/// An empty body is not sent and is reported as
/// [`DeliveryOutcome::SkippedEmpty`]; the record stays undelivered.
pub async fn deliver_rendered<N>(notifier: &N, change: &Change, body: String) -> Result<DeliveryOutcome>
where
    N: Notifier + ?Sized,
{
    if body.is_empty() {
        warn!(
            id = %change.record.id,
            kind = %change.kind,
            "notification template rendered nothing; not sending"
        );
        return Ok(DeliveryOutcome::SkippedEmpty);
    }

    debug!(id = %change.record.id, bytes = body.len(), "posting notification");
    notifier.post(&body).await?;
    Ok(DeliveryOutcome::Delivered)
}

// ── WebhookNotifier ───────────────────────────────────────────────────────────

/// Incoming-webhook target that takes a form field `payload` holding
/// `{"text": …}`.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        reqwest::Url::parse(url)
            .map_err(|e| MonitorError::Config(format!("invalid webhook_url: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MonitorError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn post(&self, body: &str) -> Result<()> {
        let payload = serde_json::json!({ "text": body }).to_string();

        let resp = self
            .client
            .post(&self.url)
            .form(&[("payload", payload.as_str())])
            .send()
            .await
            .map_err(|e| MonitorError::Delivery(format!("webhook unreachable: {e}")))?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(MonitorError::Delivery(format!(
                "webhook returned {}",
                status.as_u16()
            )));
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
