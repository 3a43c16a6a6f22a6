//! Business-event entry points used by order and payment webhooks.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use tourhub_core::error::AppError;
use tourhub_core::result::AppResult;
use tourhub_database::repositories::RecipientRepository;
use tourhub_entity::notification::{NotificationChannel, NotificationPriority, NotificationType};
use tourhub_entity::recipient::OrderSummary;

use super::request::CreateNotificationRequest;
use super::service::NotificationService;

/// What one trigger produced across its channels.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TriggerReport {
    /// Ids of the notifications that were created.
    pub created: Vec<Uuid>,
    /// Channels the user opted out of.
    pub skipped: Vec<NotificationChannel>,
    /// Per-channel failures.
    pub errors: Vec<String>,
}

/// Translates one business event into notifications on a default channel set.
#[derive(Clone)]
pub struct NotificationTrigger {
    service: Arc<NotificationService>,
    recipients: Arc<dyn RecipientRepository>,
    site_base_url: String,
}

impl std::fmt::Debug for NotificationTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationTrigger")
            .field("site_base_url", &self.site_base_url)
            .finish_non_exhaustive()
    }
}

impl NotificationTrigger {
    pub fn new(
        service: Arc<NotificationService>,
        recipients: Arc<dyn RecipientRepository>,
        site_base_url: impl Into<String>,
    ) -> Self {
        Self {
            service,
            recipients,
            site_base_url: site_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn order_confirmed(&self, order_id: Uuid) -> AppResult<TriggerReport> {
        let order = self.order(order_id).await?;
        let title = "Order confirmed".to_string();
        let content = format!(
            "Your order {} has been confirmed. Total paid: ¥{:.2}.",
            order.order_number, order.total_amount
        );
        self.fan_out(
            &order,
            NotificationType::OrderConfirmed,
            NotificationPriority::High,
            &[
                NotificationChannel::InApp,
                NotificationChannel::Email,
                NotificationChannel::Sms,
            ],
            title,
            content,
            None,
            json!({}),
        )
        .await
    }

    pub async fn payment_succeeded(&self, order_id: Uuid, amount: f64) -> AppResult<TriggerReport> {
        let order = self.order(order_id).await?;
        let content = format!(
            "We received your payment of ¥{amount:.2} for order {}.",
            order.order_number
        );
        self.fan_out(
            &order,
            NotificationType::PaymentSuccess,
            NotificationPriority::High,
            &[
                NotificationChannel::InApp,
                NotificationChannel::Email,
                NotificationChannel::Push,
            ],
            "Payment successful".to_string(),
            content,
            None,
            json!({ "paidAmount": amount }),
        )
        .await
    }

    pub async fn payment_failed(&self, order_id: Uuid, reason: &str) -> AppResult<TriggerReport> {
        let order = self.order(order_id).await?;
        let content = format!(
            "Payment for order {} did not go through: {reason}. Please try again.",
            order.order_number
        );
        self.fan_out(
            &order,
            NotificationType::PaymentFailed,
            NotificationPriority::High,
            &[
                NotificationChannel::InApp,
                NotificationChannel::Sms,
                NotificationChannel::Email,
            ],
            "Payment failed".to_string(),
            content,
            None,
            json!({ "reason": reason, "actionLabel": "Retry payment" }),
        )
        .await
    }

    /// Remind the traveller of an upcoming booking, optionally at a later time.
    pub async fn booking_reminder(
        &self,
        order_id: Uuid,
        remind_at: Option<DateTime<Utc>>,
    ) -> AppResult<TriggerReport> {
        let order = self.order(order_id).await?;
        let when = order
            .booking_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "soon".to_string());
        let content = format!(
            "Reminder: your trip for order {} is on {when}. Have a great journey!",
            order.order_number
        );
        self.fan_out(
            &order,
            NotificationType::BookingReminder,
            NotificationPriority::Normal,
            &[
                NotificationChannel::InApp,
                NotificationChannel::Sms,
                NotificationChannel::Push,
            ],
            "Upcoming trip".to_string(),
            content,
            remind_at,
            json!({}),
        )
        .await
    }

    pub async fn order_cancelled(
        &self,
        order_id: Uuid,
        reason: Option<&str>,
    ) -> AppResult<TriggerReport> {
        let order = self.order(order_id).await?;
        let content = match reason {
            Some(reason) => format!("Order {} was cancelled: {reason}.", order.order_number),
            None => format!("Order {} was cancelled.", order.order_number),
        };
        self.fan_out(
            &order,
            NotificationType::OrderCancelled,
            NotificationPriority::Normal,
            &[NotificationChannel::InApp, NotificationChannel::Email],
            "Order cancelled".to_string(),
            content,
            None,
            json!({ "reason": reason }),
        )
        .await
    }

    pub async fn refund_processed(&self, order_id: Uuid, amount: f64) -> AppResult<TriggerReport> {
        let order = self.order(order_id).await?;
        let content = format!(
            "A refund of ¥{amount:.2} for order {} has been issued. It may take 3-7 business days to arrive.",
            order.order_number
        );
        self.fan_out(
            &order,
            NotificationType::RefundProcessed,
            NotificationPriority::Normal,
            &[
                NotificationChannel::InApp,
                NotificationChannel::Email,
                NotificationChannel::Sms,
            ],
            "Refund processed".to_string(),
            content,
            None,
            json!({ "refundAmount": amount }),
        )
        .await
    }

    async fn order(&self, order_id: Uuid) -> AppResult<OrderSummary> {
        self.recipients
            .find_order(order_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Order {order_id} not found")))
    }

    #[allow(clippy::too_many_arguments)]
    async fn fan_out(
        &self,
        order: &OrderSummary,
        notification_type: NotificationType,
        priority: NotificationPriority,
        channels: &[NotificationChannel],
        title: String,
        content: String,
        scheduled_at: Option<DateTime<Utc>>,
        extra: serde_json::Value,
    ) -> AppResult<TriggerReport> {
        let mut metadata = json!({
            "actionUrl": format!("{}/orders/{}", self.site_base_url, order.order_id),
            "orderNumber": order.order_number,
            "amount": order.total_amount,
        });
        if let (Some(target), serde_json::Value::Object(extra)) = (metadata.as_object_mut(), extra) {
            target.extend(extra);
        }

        let mut base = CreateNotificationRequest::new(
            order.user_id,
            notification_type,
            NotificationChannel::InApp,
            title,
            content,
        )
        .with_order(order.order_id)
        .with_priority(priority)
        .with_metadata(metadata);
        base.scheduled_at = scheduled_at;

        let mut report = TriggerReport::default();
        for channel in channels {
            match self.service.create_and_send(base.on_channel(*channel)).await {
                Ok(Some(id)) => report.created.push(id),
                Ok(None) => report.skipped.push(*channel),
                Err(e) => {
                    warn!(
                        order_id = %order.order_id,
                        channel = %channel,
                        notification_type = %notification_type,
                        error = %e,
                        "Trigger could not notify on channel"
                    );
                    report.errors.push(format!("{channel}: {}", e.message));
                }
            }
        }

        info!(
            order_id = %order.order_id,
            notification_type = %notification_type,
            created = report.created.len(),
            skipped = report.skipped.len(),
            failed = report.errors.len(),
            "Business event processed"
        );
        Ok(report)
    }
}
