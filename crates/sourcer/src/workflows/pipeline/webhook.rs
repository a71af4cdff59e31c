use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::workflows::estimation::{DealEstimate, OfferBand, PropertyInsight, SubjectProperty};

pub const DEFAULT_WEBHOOK_TIMEOUT: Duration = Duration::from_secs(5);

/// Body POSTed to a CRM or automation webhook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub property: SubjectProperty,
    pub insight: PropertyInsight,
    pub offers: Vec<OfferBand>,
    /// RFC 3339, UTC.
    pub timestamp: String,
}

impl WebhookPayload {
    pub fn from_estimate(estimate: &DealEstimate, sent_at: DateTime<Utc>) -> Self {
        Self {
            property: estimate.property.clone(),
            insight: estimate.insight.clone(),
            offers: estimate.offers.clone(),
            timestamp: sent_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("failed to build webhook client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("webhook delivery to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Outbound delivery seam so callers can swap in fakes.
#[async_trait]
pub trait WebhookGateway: Send + Sync {
    /// Returns the HTTP status code the receiver answered with, 2xx or not.
    async fn deliver(&self, url: &str, payload: &WebhookPayload) -> Result<u16, WebhookError>;
}

pub struct HttpWebhookClient {
    http: Client,
}

impl HttpWebhookClient {
    pub fn new(timeout: Duration) -> Result<Self, WebhookError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("sourcer/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(WebhookError::Client)?;
        Ok(Self { http })
    }
}

#[async_trait]
impl WebhookGateway for HttpWebhookClient {
    async fn deliver(&self, url: &str, payload: &WebhookPayload) -> Result<u16, WebhookError> {
        let response = self
            .http
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|source| WebhookError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            debug!(url, status = status.as_u16(), "webhook delivered");
        } else {
            warn!(url, status = status.as_u16(), "webhook receiver rejected payload");
        }
        Ok(status.as_u16())
    }
}
