//! Saved-deal journal and outbound deal notifications.

pub mod store;
pub mod webhook;

pub use store::{PipelineError, PipelineRecord, PipelineStore, EXPORT_HEADER};
pub use webhook::{HttpWebhookClient, WebhookError, WebhookGateway, WebhookPayload};
