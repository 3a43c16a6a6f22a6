//! HTML email sender.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;
use validator::ValidateEmail;

use tourhub_entity::notification::NotificationChannel;

use super::transport::{Transport, TransportRequest};
use super::{ChannelSender, DeliveryResult, OutboundMessage};
use crate::security::content::is_safe_link;

const DEFAULT_ACTION_LABEL: &str = "View details";

#[derive(Debug, Clone)]
pub struct EmailSender {
    transport: Arc<dyn Transport>,
    from: String,
}

impl EmailSender {
    pub fn new(transport: Arc<dyn Transport>, from: impl Into<String>) -> Self {
        Self {
            transport,
            from: from.into(),
        }
    }
}

#[async_trait]
impl ChannelSender for EmailSender {
    fn channel(&self) -> NotificationChannel {
        NotificationChannel::Email
    }

    async fn send(&self, message: &OutboundMessage) -> DeliveryResult {
        let to = message.destination.trim();
        if !to.validate_email() {
            return DeliveryResult::failed(format!("Invalid email address: {to}"));
        }

        let request = TransportRequest {
            channel: NotificationChannel::Email,
            to: to.to_string(),
            from: Some(self.from.clone()),
            subject: Some(message.title.clone()),
            body: render_html(message),
            content_type: "text/html".to_string(),
            notification_id: message.notification_id,
            metadata: message.metadata.clone(),
        };

        match self.transport.deliver(request).await {
            Ok(receipt) => DeliveryResult::delivered(receipt.external_id),
            Err(e) => {
                warn!(notification_id = %message.notification_id, error = %e, "Email send failed");
                DeliveryResult::failed(e.message)
            }
        }
    }
}

/// Wrap the message body in the site's email layout.
///
/// The body is inserted as-is (it passed content validation); the title and
/// the action link are escaped. Only `http`/`https` action links get a button.
pub fn render_html(message: &OutboundMessage) -> String {
    let title = escape_html(&message.title);
    let body = message.content.replace('\n', "<br>\n");
    let action = message
        .metadata_str("actionUrl")
        .filter(|url| is_safe_link(url))
        .map(|url| {
            let label = message
                .metadata_str("actionLabel")
                .unwrap_or(DEFAULT_ACTION_LABEL);
            format!(
                r#"<p style="margin:24px 0"><a href="{}" style="background:#1677ff;color:#fff;padding:10px 20px;border-radius:4px;text-decoration:none">{}</a></p>"#,
                escape_html(url),
                escape_html(label)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>{title}</title></head>
<body style="font-family:Arial,sans-serif;color:#333">
<div style="max-width:600px;margin:0 auto;padding:20px">
<h2>{title}</h2>
<div>{body}</div>
{action}
<hr>
<p style="font-size:12px;color:#999">This message was sent by TourHub. Please do not reply.</p>
</div>
</body>
</html>"#
    )
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::mock::RecordingTransport;
    use uuid::Uuid;

    fn message(to: &str, metadata: serde_json::Value) -> OutboundMessage {
        OutboundMessage {
            notification_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            destination: to.to_string(),
            title: "Payment received".into(),
            content: "We received ¥1,280.00\nThank you".into(),
            metadata,
        }
    }

    #[tokio::test]
    async fn test_invalid_address_is_rejected_locally() {
        let transport = Arc::new(RecordingTransport::default());
        let sender = EmailSender::new(transport.clone(), "noreply@tourhub.com");
        let result = sender.send(&message("not-an-email", serde_json::json!({}))).await;
        assert!(!result.success);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_html_envelope_with_action_button() {
        let transport = Arc::new(RecordingTransport::default());
        let sender = EmailSender::new(transport.clone(), "noreply@tourhub.com");
        let result = sender
            .send(&message(
                "guest@example.com",
                serde_json::json!({ "actionUrl": "https://www.tourhub.com/orders/9?a=1&b=2" }),
            ))
            .await;
        assert!(result.success);

        let sent = transport.last().unwrap();
        assert_eq!(sent.subject.as_deref(), Some("Payment received"));
        assert_eq!(sent.content_type, "text/html");
        assert!(sent.body.contains("<br>"));
        assert!(sent.body.contains(r#"href="https://www.tourhub.com/orders/9?a=1&amp;b=2""#));
        assert!(sent.body.contains(">View details</a>"));
    }

    #[test]
    fn test_script_action_url_gets_no_button() {
        for url in ["javascript:alert(document.cookie)", "data:text/html,<b>x</b>", "/orders/9"] {
            let html = render_html(&message("a@b.co", serde_json::json!({ "actionUrl": url })));
            assert!(!html.contains("href="), "{url} should not be linked");
        }
    }

    #[test]
    fn test_no_action_without_url() {
        let html = render_html(&message("a@b.co", serde_json::json!({ "actionLabel": "Go" })));
        assert!(!html.contains("<a href"));
    }
}
