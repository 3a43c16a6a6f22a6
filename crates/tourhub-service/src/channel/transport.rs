//! Wire transports used by the SMS, email and push senders.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use tourhub_core::config::channels::GatewayConfig;
use tourhub_core::error::{AppError, ErrorKind};
use tourhub_core::result::AppResult;
use tourhub_entity::notification::NotificationChannel;

/// One message handed to a gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportRequest {
    pub channel: NotificationChannel,
    /// Phone number, email address, or device token.
    pub to: String,
    pub from: Option<String>,
    pub subject: Option<String>,
    pub body: String,
    /// `text/plain` or `text/html`.
    pub content_type: String,
    pub notification_id: Uuid,
    pub metadata: serde_json::Value,
}

/// Gateway acknowledgement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportReceipt {
    pub external_id: Option<String>,
}

/// A provider that actually moves bytes to the recipient.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    async fn deliver(&self, request: TransportRequest) -> AppResult<TransportReceipt>;
}

#[derive(Debug, Deserialize)]
struct GatewayResponse {
    id: Option<serde_json::Value>,
}

/// JSON-over-HTTP gateway client.
///
/// POSTs the [`TransportRequest`] to the configured endpoint with a bearer
/// token; a 2xx answer is an acceptance and its `id` field, if present,
/// becomes the external id.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl HttpTransport {
    pub fn new(config: &GatewayConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorKind::Configuration, "Failed to build HTTP client", e)
            })?;
        Ok(Self {
            client,
            endpoint: config.endpoint.trim().to_string(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn deliver(&self, request: TransportRequest) -> AppResult<TransportReceipt> {
        let mut builder = self.client.post(&self.endpoint).json(&request);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        let response = builder.send().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::ExternalService,
                format!("{} gateway request failed: {e}", request.channel),
                e,
            )
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                channel = %request.channel,
                status = status.as_u16(),
                "Gateway rejected message"
            );
            return Err(AppError::external_service(format!(
                "{} gateway returned {status}: {}",
                request.channel,
                body.chars().take(200).collect::<String>()
            )));
        }

        let external_id = match response.json::<GatewayResponse>().await {
            Ok(GatewayResponse { id: Some(serde_json::Value::String(id)) }) => Some(id),
            Ok(GatewayResponse { id: Some(other) }) if !other.is_null() => Some(other.to_string()),
            Ok(_) => None,
            Err(e) => {
                debug!(channel = %request.channel, error = %e, "Gateway response had no JSON body");
                None
            }
        };

        Ok(TransportReceipt { external_id })
    }
}

/// Accepts every message and only logs it. Used for channels without a
/// configured gateway.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTransport;

#[async_trait]
impl Transport for LogTransport {
    async fn deliver(&self, request: TransportRequest) -> AppResult<TransportReceipt> {
        info!(
            channel = %request.channel,
            notification_id = %request.notification_id,
            to = %request.to,
            "Message accepted by log transport"
        );
        Ok(TransportReceipt {
            external_id: Some(format!("log-{}", request.notification_id)),
        })
    }
}

/// Pick the HTTP gateway when configured, the log transport otherwise.
pub fn from_gateway(
    channel: NotificationChannel,
    config: &GatewayConfig,
) -> AppResult<Arc<dyn Transport>> {
    if config.is_configured() {
        info!(channel = %channel, endpoint = %config.endpoint, "Using HTTP gateway transport");
        Ok(Arc::new(HttpTransport::new(config)?))
    } else {
        info!(channel = %channel, "No gateway configured; using log transport");
        Ok(Arc::new(LogTransport))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_transport_accepts() {
        let id = Uuid::new_v4();
        let receipt = LogTransport
            .deliver(TransportRequest {
                channel: NotificationChannel::Sms,
                to: "13800138000".into(),
                from: None,
                subject: None,
                body: "hi".into(),
                content_type: "text/plain".into(),
                notification_id: id,
                metadata: serde_json::Value::Null,
            })
            .await
            .unwrap();
        assert_eq!(receipt.external_id, Some(format!("log-{id}")));
    }

    #[test]
    fn test_from_gateway_selects_by_endpoint() {
        let unconfigured = GatewayConfig::default();
        let t = from_gateway(NotificationChannel::Email, &unconfigured).unwrap();
        assert!(format!("{t:?}").contains("LogTransport"));

        let configured = GatewayConfig {
            endpoint: "http://127.0.0.1:9/send".into(),
            api_key: "k".into(),
            timeout_seconds: 1,
        };
        let t = from_gateway(NotificationChannel::Email, &configured).unwrap();
        assert!(format!("{t:?}").contains("HttpTransport"));
    }
}
