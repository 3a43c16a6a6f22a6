//! Content validation and rate limit configuration.

use serde::{Deserialize, Serialize};

/// Content checks applied before a notification is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Maximum title length in characters.
    #[serde(default = "default_max_title")]
    pub max_title_length: usize,
    /// Maximum content length in characters.
    #[serde(default = "default_max_content")]
    pub max_content_length: usize,
    /// Words that raise a warning when found in title or content.
    #[serde(default = "default_sensitive_words")]
    pub sensitive_words: Vec<String>,
    /// Domains links may point to without a warning. Subdomains match too.
    #[serde(default = "default_allowed_domains")]
    pub allowed_domains: Vec<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_title_length: default_max_title(),
            max_content_length: default_max_content(),
            sensitive_words: default_sensitive_words(),
            allowed_domains: default_allowed_domains(),
        }
    }
}

/// Hourly and daily send quota for one channel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChannelQuota {
    /// Sends allowed per clock hour.
    pub hourly: i64,
    /// Sends allowed per UTC day.
    pub daily: i64,
}

/// Per-channel quotas, keyed by channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Whether quotas are enforced at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_sms_quota")]
    pub sms: ChannelQuota,
    #[serde(default = "default_email_quota")]
    pub email: ChannelQuota,
    #[serde(default = "default_push_quota")]
    pub push: ChannelQuota,
    #[serde(default = "default_in_app_quota")]
    pub in_app: ChannelQuota,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sms: default_sms_quota(),
            email: default_email_quota(),
            push: default_push_quota(),
            in_app: default_in_app_quota(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_title() -> usize {
    100
}

fn default_max_content() -> usize {
    1000
}

fn default_sensitive_words() -> Vec<String> {
    ["gambling", "casino", "lottery", "pyramid scheme", "guaranteed profit"]
        .iter()
        .map(|w| w.to_string())
        .collect()
}

fn default_allowed_domains() -> Vec<String> {
    vec!["tourhub.com".to_string(), "tourhub.cn".to_string()]
}

impl ChannelQuota {
    const fn new(hourly: i64, daily: i64) -> Self {
        Self { hourly, daily }
    }
}

fn default_sms_quota() -> ChannelQuota {
    ChannelQuota::new(10, 50)
}

fn default_email_quota() -> ChannelQuota {
    ChannelQuota::new(20, 100)
}

fn default_push_quota() -> ChannelQuota {
    ChannelQuota::new(30, 200)
}

fn default_in_app_quota() -> ChannelQuota {
    ChannelQuota::new(100, 1000)
}
