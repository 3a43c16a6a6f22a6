//! Channel transport configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Transport settings for every delivery channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelsConfig {
    /// SMS gateway.
    #[serde(default)]
    pub sms: GatewayConfig,
    /// Email gateway.
    #[serde(default)]
    pub email: GatewayConfig,
    /// Push gateway.
    #[serde(default)]
    pub push: GatewayConfig,
    /// Signature prepended to every SMS body.
    #[serde(default = "default_sms_signature")]
    pub sms_signature: String,
    /// Sender address used by the email gateway.
    #[serde(default = "default_email_from")]
    pub email_from: String,
    /// Public site URL used for action links in built-in messages.
    #[serde(default = "default_site_url")]
    pub site_base_url: String,
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            sms: GatewayConfig::default(),
            email: GatewayConfig::default(),
            push: GatewayConfig::default(),
            sms_signature: default_sms_signature(),
            email_from: default_email_from(),
            site_base_url: default_site_url(),
        }
    }
}

/// HTTP gateway endpoint for one channel.
///
/// An empty `endpoint` means the channel runs against the logging
/// transport, which accepts every message without network I/O.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Full URL messages are POSTed to.
    #[serde(default)]
    pub endpoint: String,
    /// Bearer token sent with every request.
    #[serde(default)]
    pub api_key: String,
    /// Request timeout in seconds (`0` = 10 s).
    #[serde(default)]
    pub timeout_seconds: u64,
}

impl GatewayConfig {
    /// Whether a gateway endpoint is configured.
    pub fn is_configured(&self) -> bool {
        !self.endpoint.trim().is_empty()
    }

    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        match self.timeout_seconds {
            0 => Duration::from_secs(10),
            secs => Duration::from_secs(secs),
        }
    }
}

fn default_sms_signature() -> String {
    "【TourHub】".to_string()
}

fn default_email_from() -> String {
    "noreply@tourhub.com".to_string()
}

fn default_site_url() -> String {
    "https://www.tourhub.com".to_string()
}
