//! Notification creation and the in-app notification center.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use tourhub_core::error::AppError;
use tourhub_core::result::AppResult;
use tourhub_core::types::pagination::{PageRequest, PageResponse};
use tourhub_database::repositories::{
    NotificationRepository, RecipientRepository, Repositories, TemplateRepository,
    UserConfigRepository,
};
use tourhub_entity::notification::{
    NewNotification, Notification, NotificationChannel, NotificationPriority,
    NotificationUserConfig,
};

use super::request::CreateNotificationRequest;
use crate::delivery::DeliveryProcessor;
use crate::security::SecurityValidator;
use crate::template::{TemplateEngine, TemplateVars};

/// Orchestrates preference checks, validation, rendering, persistence and
/// the first delivery attempt.
#[derive(Clone)]
pub struct NotificationService {
    notifications: Arc<dyn NotificationRepository>,
    user_configs: Arc<dyn UserConfigRepository>,
    templates: Arc<dyn TemplateRepository>,
    recipients: Arc<dyn RecipientRepository>,
    security: Arc<SecurityValidator>,
    processor: Arc<DeliveryProcessor>,
    engine: TemplateEngine,
    default_max_retries: i32,
}

impl std::fmt::Debug for NotificationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationService")
            .field("default_max_retries", &self.default_max_retries)
            .finish_non_exhaustive()
    }
}

impl NotificationService {
    /// Creates a new notification service.
    pub fn new(
        repositories: &Repositories,
        security: Arc<SecurityValidator>,
        processor: Arc<DeliveryProcessor>,
    ) -> Self {
        let default_max_retries = processor.policy().max_retries;
        Self {
            notifications: repositories.notifications.clone(),
            user_configs: repositories.user_configs.clone(),
            templates: repositories.templates.clone(),
            recipients: repositories.recipients.clone(),
            security,
            processor,
            engine: TemplateEngine::new(),
            default_max_retries,
        }
    }

    /// Creates a notification and, when it is already due, attempts delivery.
    ///
    /// Returns `Ok(None)` when the user opted out of the channel or muted the
    /// type. The first delivery attempt never surfaces as an error; its
    /// outcome is visible through the record's status.
    pub async fn create_and_send(
        &self,
        request: CreateNotificationRequest,
    ) -> AppResult<Option<Uuid>> {
        let user_id = request.user_id;
        let channel = request.channel;

        let preferences = self.user_config(user_id, channel).await?;
        if !preferences.accepts(request.notification_type) {
            debug!(
                user_id = %user_id,
                channel = %channel,
                notification_type = %request.notification_type,
                "User opted out; notification dropped"
            );
            return Ok(None);
        }

        if !self
            .security
            .validate_permission(user_id, request.notification_type, channel)
        {
            return Err(AppError::validation(format!(
                "{} notifications cannot be sent via {}",
                request.notification_type, channel
            )));
        }

        let (title, content) = self.resolve_text(&request).await?;

        let validation = self.security.validate_content(Some(&title), &content);
        for warning in &validation.warnings {
            warn!(user_id = %user_id, channel = %channel, warning = %warning, "Content warning");
        }
        if !validation.is_valid {
            return Err(AppError::validation(validation.errors.join("; ")));
        }
        self.security
            .validate_metadata(request.metadata.as_ref())
            .map_err(AppError::validation)?;

        let quota = self.security.validate_rate_limit(user_id, channel).await?;
        if !quota.allowed {
            return Err(AppError::rate_limit(format!(
                "Rate limit exceeded for {channel}; resets at {}",
                quota.reset_time.to_rfc3339()
            )));
        }

        let now = Utc::now();
        let priority = request.priority();
        let mut scheduled_at = request.scheduled_at.unwrap_or(now);
        if priority != NotificationPriority::Urgent {
            if let Some(window_end) = preferences.quiet_window_end(scheduled_at.max(now)) {
                debug!(user_id = %user_id, channel = %channel, until = %window_end, "Deferred by quiet hours");
                scheduled_at = window_end;
            }
        }

        let template_id = request.template_id;
        let created = self
            .notifications
            .create(NewNotification {
                user_id,
                order_id: request.order_id,
                notification_type: request.notification_type,
                channel,
                priority,
                title,
                content,
                template_id,
                metadata: request
                    .metadata
                    .filter(|m| m.is_object())
                    .unwrap_or_else(|| serde_json::json!({})),
                scheduled_at,
                max_retries: request.max_retries.unwrap_or(self.default_max_retries).max(0),
            })
            .await;
        let record = match created {
            Ok(record) => record,
            Err(e) => {
                self.security.release_rate_limit(user_id, channel, &quota).await;
                return Err(e);
            }
        };

        info!(
            notification_id = %record.id,
            user_id = %user_id,
            channel = %channel,
            notification_type = %record.notification_type,
            priority = %priority,
            "Notification created"
        );

        if record.scheduled_at <= Utc::now() {
            match self.processor.process(record.id).await {
                Ok(outcome) => debug!(notification_id = %record.id, ?outcome, "Immediate delivery attempt"),
                Err(e) => warn!(
                    notification_id = %record.id,
                    error = %e,
                    "Immediate delivery attempt failed; the queue will pick it up"
                ),
            }
        }

        Ok(Some(record.id))
    }

    /// Runs each request independently; one failure does not stop the rest.
    pub async fn create_batch(
        &self,
        requests: Vec<CreateNotificationRequest>,
    ) -> Vec<AppResult<Option<Uuid>>> {
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            results.push(self.create_and_send(request).await);
        }
        results
    }

    /// Gets a notification by id.
    pub async fn get_status(&self, id: Uuid) -> AppResult<Notification> {
        self.notifications
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Notification {id} not found")))
    }

    /// Lists the user's in-app notifications, newest first.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        page: PageRequest,
        unread_only: bool,
    ) -> AppResult<PageResponse<Notification>> {
        self.notifications
            .list_in_app(user_id, unread_only, page)
            .await
    }

    /// Gets the unread in-app count.
    pub async fn unread_count(&self, user_id: Uuid) -> AppResult<i64> {
        self.notifications.count_unread(user_id).await
    }

    /// Marks one in-app notification as read. Repeating the call is harmless.
    pub async fn mark_read(&self, user_id: Uuid, id: Uuid) -> AppResult<()> {
        if self.notifications.mark_read(user_id, id, Utc::now()).await? {
            Ok(())
        } else {
            Err(AppError::not_found(format!(
                "In-app notification {id} not found for user {user_id}"
            )))
        }
    }

    /// Marks every in-app notification of the user as read.
    pub async fn mark_all_read(&self, user_id: Uuid) -> AppResult<u64> {
        let updated = self.notifications.mark_all_read(user_id, Utc::now()).await?;
        debug!(user_id = %user_id, updated, "Marked all notifications read");
        Ok(updated)
    }

    /// Deletes one in-app notification at the user's request.
    pub async fn delete_in_app(&self, user_id: Uuid, id: Uuid) -> AppResult<()> {
        if self.notifications.delete_in_app(user_id, id).await? {
            info!(user_id = %user_id, notification_id = %id, "In-app notification deleted");
            Ok(())
        } else {
            Err(AppError::not_found(format!(
                "In-app notification {id} not found for user {user_id}"
            )))
        }
    }

    /// Gets preferences for every channel, filling in defaults for channels
    /// without a stored row.
    pub async fn get_user_configs(&self, user_id: Uuid) -> AppResult<Vec<NotificationUserConfig>> {
        let stored = self.user_configs.list_for_user(user_id).await?;
        Ok(NotificationChannel::ALL
            .iter()
            .map(|channel| {
                stored
                    .iter()
                    .find(|c| c.channel == *channel)
                    .cloned()
                    .unwrap_or_else(|| NotificationUserConfig::default_for(user_id, *channel))
            })
            .collect())
    }

    /// Stores preferences for one (user, channel) pair.
    pub async fn update_user_config(
        &self,
        config: NotificationUserConfig,
    ) -> AppResult<NotificationUserConfig> {
        for hour in [config.quiet_hours_start, config.quiet_hours_end].into_iter().flatten() {
            if !(0..=23).contains(&hour) {
                return Err(AppError::validation(format!(
                    "Quiet hour {hour} is outside 0-23"
                )));
            }
        }
        if config.quiet_hours_start.is_some() != config.quiet_hours_end.is_some() {
            return Err(AppError::validation(
                "Quiet hours need both a start and an end",
            ));
        }
        let saved = self.user_configs.upsert(&config).await?;
        info!(
            user_id = %saved.user_id,
            channel = %saved.channel,
            enabled = saved.enabled,
            "Notification preferences updated"
        );
        Ok(saved)
    }

    async fn user_config(
        &self,
        user_id: Uuid,
        channel: NotificationChannel,
    ) -> AppResult<NotificationUserConfig> {
        Ok(self
            .user_configs
            .find(user_id, channel)
            .await?
            .unwrap_or_else(|| NotificationUserConfig::default_for(user_id, channel)))
    }

    /// Final title and content: the rendered template, or the literal text.
    async fn resolve_text(&self, request: &CreateNotificationRequest) -> AppResult<(String, String)> {
        let literal = match (&request.title, &request.content) {
            (Some(title), Some(content)) => Some((title.clone(), content.clone())),
            _ => None,
        };

        let Some(template_id) = request.template_id else {
            return literal.ok_or_else(|| {
                AppError::validation("Either title and content or a template id is required")
            });
        };

        let template = self
            .templates
            .find_by_id(template_id)
            .await?
            .filter(|t| t.usable_on(request.channel));

        match template {
            Some(template) => {
                let vars = self.template_vars(request).await?;
                Ok((
                    self.engine.render(&template.title_template, &vars),
                    self.engine.render(&template.content_template, &vars),
                ))
            }
            None => match literal {
                Some(text) => {
                    warn!(template_id = %template_id, "Template unavailable; using literal text");
                    Ok(text)
                }
                None => Err(AppError::template_not_found(template_id)),
            },
        }
    }

    /// Variables from the recipient and order, then caller variables, then
    /// scalar metadata entries; later sources win.
    async fn template_vars(&self, request: &CreateNotificationRequest) -> AppResult<TemplateVars> {
        let mut vars = TemplateVars::new();

        if let Some(contact) = self.recipients.find_contact(request.user_id).await? {
            vars.insert("userName".into(), contact.display_name);
        }

        if let Some(order_id) = request.order_id {
            if let Some(order) = self.recipients.find_order(order_id).await? {
                vars.insert("orderNumber".into(), order.order_number);
                vars.insert("amount".into(), format!("{:.2}", order.total_amount));
                if let Some(date) = order.booking_date {
                    vars.insert("bookingDate".into(), date.format("%Y-%m-%d").to_string());
                }
                if let Some(name) = order.contact_name {
                    vars.insert("contactName".into(), name);
                }
                if let Some(phone) = order.contact_phone {
                    vars.insert("contactPhone".into(), phone);
                }
                if let Some(email) = order.contact_email {
                    vars.insert("contactEmail".into(), email);
                }
            }
        }

        vars.extend(request.variables.clone());

        if let Some(serde_json::Value::Object(metadata)) = &request.metadata {
            for (key, value) in metadata {
                let text = match value {
                    serde_json::Value::String(s) => s.clone(),
                    serde_json::Value::Number(n) => n.to_string(),
                    serde_json::Value::Bool(b) => b.to_string(),
                    _ => continue,
                };
                vars.insert(key.clone(), text);
            }
        }

        Ok(vars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use chrono::{Duration, NaiveDate};
    use tourhub_cache::memory::MemoryCacheProvider;
    use tourhub_core::config::cache::MemoryCacheConfig;
    use tourhub_core::config::channels::ChannelsConfig;
    use tourhub_core::config::queue::QueueConfig;
    use tourhub_core::config::security::{ChannelQuota, RateLimitConfig, SecurityConfig};
    use tourhub_core::error::ErrorKind;
    use tourhub_database::memory::{
        InMemoryNotificationRepository, InMemoryRecipientRepository, InMemoryTemplateRepository,
    };
    use tourhub_entity::notification::{NotificationStatus, NotificationTemplate, NotificationType};
    use tourhub_entity::recipient::{OrderSummary, RecipientContact};

    use crate::channel::ChannelRegistry;
    use crate::channel::mock::RecordingTransport;
    use crate::delivery::RetryPolicy;
    use crate::realtime::RealtimeHub;

    struct Harness {
        service: NotificationService,
        notifications: Arc<InMemoryNotificationRepository>,
        templates: Arc<InMemoryTemplateRepository>,
        recipients: Arc<InMemoryRecipientRepository>,
        email: Arc<RecordingTransport>,
        user: Uuid,
    }

    fn harness_with(rate_limit: RateLimitConfig) -> Harness {
        let notifications = Arc::new(InMemoryNotificationRepository::new());
        let templates = Arc::new(InMemoryTemplateRepository::new());
        let recipients = Arc::new(InMemoryRecipientRepository::new());
        let repositories = Repositories {
            notifications: notifications.clone(),
            user_configs: Arc::new(tourhub_database::memory::InMemoryUserConfigRepository::new()),
            templates: templates.clone(),
            recipients: recipients.clone(),
        };
        let user = Uuid::new_v4();
        recipients.upsert_contact(RecipientContact {
            user_id: user,
            display_name: "Li Na".into(),
            phone: Some("13800138000".into()),
            email: Some("li.na@example.com".into()),
        });

        let email = Arc::new(RecordingTransport::default());
        let registry = ChannelRegistry::with_transports(
            &ChannelsConfig::default(),
            recipients.clone(),
            Arc::new(RealtimeHub::default()),
            Arc::new(RecordingTransport::default()),
            email.clone(),
            Arc::new(RecordingTransport::default()),
        );
        let processor = DeliveryProcessor::new(
            notifications.clone(),
            Arc::new(registry),
            RetryPolicy::default(),
            &QueueConfig::default(),
        );
        let security = SecurityValidator::new(
            &SecurityConfig::default(),
            &rate_limit,
            Arc::new(MemoryCacheProvider::new(&MemoryCacheConfig::default())),
        );
        let service = NotificationService::new(&repositories, Arc::new(security), Arc::new(processor));

        Harness {
            service,
            notifications,
            templates,
            recipients,
            email,
            user,
        }
    }

    fn harness() -> Harness {
        harness_with(RateLimitConfig::default())
    }

    fn email_request(user: Uuid) -> CreateNotificationRequest {
        CreateNotificationRequest::new(
            user,
            NotificationType::OrderConfirmed,
            NotificationChannel::Email,
            "Order confirmed",
            "Your order is confirmed",
        )
    }

    #[tokio::test]
    async fn test_immediate_send_is_delivered_inline() {
        let h = harness();
        let id = h.service.create_and_send(email_request(h.user)).await.unwrap().unwrap();
        let record = h.service.get_status(id).await.unwrap();
        assert_eq!(record.status, NotificationStatus::Delivered);
        assert_eq!(h.email.last().unwrap().to, "li.na@example.com");
    }

    #[tokio::test]
    async fn test_disabled_channel_is_a_silent_noop() {
        let h = harness();
        let mut config = NotificationUserConfig::default_for(h.user, NotificationChannel::Email);
        config.enabled = false;
        h.service.update_user_config(config).await.unwrap();

        assert_eq!(h.service.create_and_send(email_request(h.user)).await.unwrap(), None);
        assert!(h.notifications.all().is_empty());
        assert_eq!(h.email.calls(), 0);
    }

    #[tokio::test]
    async fn test_permission_matrix_rejects_promotion_sms() {
        let h = harness();
        let request = CreateNotificationRequest::new(
            h.user,
            NotificationType::Promotion,
            NotificationChannel::Sms,
            "Sale",
            "20% off",
        );
        let err = h.service.create_and_send(request).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(h.notifications.all().is_empty());
    }

    #[tokio::test]
    async fn test_blocking_content_is_rejected_before_persisting() {
        let h = harness();
        let mut request = email_request(h.user);
        request.content = Some("<script>alert(1)</script>".into());
        let err = h.service.create_and_send(request).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(h.notifications.all().is_empty());
    }

    #[tokio::test]
    async fn test_rate_limit_error() {
        let h = harness_with(RateLimitConfig {
            email: ChannelQuota { hourly: 1, daily: 5 },
            ..RateLimitConfig::default()
        });
        h.service.create_and_send(email_request(h.user)).await.unwrap();
        let err = h.service.create_and_send(email_request(h.user)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::RateLimit);
        assert!(err.message.contains("resets at"));
        assert_eq!(h.notifications.all().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_insert_gives_back_the_quota_unit() {
        let h = harness_with(RateLimitConfig {
            in_app: ChannelQuota { hourly: 1, daily: 5 },
            ..RateLimitConfig::default()
        });
        let request = || {
            CreateNotificationRequest::new(
                h.user,
                NotificationType::SystemAnnouncement,
                NotificationChannel::InApp,
                "Museum wing reopens",
                "The east wing reopens on Monday.",
            )
        };

        h.notifications.set_unavailable(true);
        let err = h.service.create_and_send(request()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Database);

        h.notifications.set_unavailable(false);
        assert!(h.service.create_and_send(request()).await.unwrap().is_some());
        assert_eq!(h.notifications.all().len(), 1);

        let err = h.service.create_and_send(request()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::RateLimit);
    }

    #[tokio::test]
    async fn test_script_action_url_is_rejected_before_persisting() {
        let h = harness();
        let mut request = email_request(h.user);
        request.metadata = Some(serde_json::json!({
            "actionUrl": "javascript:alert(document.cookie)",
        }));
        let err = h.service.create_and_send(request).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(h.notifications.all().is_empty());
        assert_eq!(h.email.calls(), 0);

        let mut request = email_request(h.user);
        request.metadata = Some(serde_json::json!({ "actionUrl": "https://www.tourhub.com/orders/1" }));
        assert!(h.service.create_and_send(request).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_future_schedule_is_left_for_the_queue() {
        let h = harness();
        let at = Utc::now() + Duration::minutes(10);
        let id = h
            .service
            .create_and_send(email_request(h.user).schedule_at(at))
            .await
            .unwrap()
            .unwrap();
        let record = h.service.get_status(id).await.unwrap();
        assert_eq!(record.status, NotificationStatus::Pending);
        assert_eq!(record.scheduled_at, at);
        assert_eq!(h.email.calls(), 0);
    }

    #[tokio::test]
    async fn test_template_rendering_with_order_variables() {
        let h = harness();
        let order_id = Uuid::new_v4();
        h.recipients.upsert_order(OrderSummary {
            order_id,
            user_id: h.user,
            order_number: "TH-20260801-001".into(),
            total_amount: 1280.5,
            booking_date: NaiveDate::from_ymd_opt(2026, 9, 1),
            contact_name: Some("Li Na".into()),
            contact_phone: None,
            contact_email: None,
        });
        let template_id = Uuid::new_v4();
        h.templates
            .save(&NotificationTemplate {
                id: template_id,
                name: "order_confirmed_email".into(),
                notification_type: NotificationType::OrderConfirmed,
                channel: None,
                title_template: "Order {{orderNumber}} confirmed".into(),
                content_template: "Hi {{userName}}, ¥{{amount}} for {{bookingDate}}. {{note}}".into(),
                enabled: true,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .await
            .unwrap();

        let request = CreateNotificationRequest::from_template(
            h.user,
            NotificationType::OrderConfirmed,
            NotificationChannel::InApp,
            template_id,
            HashMap::from([("note".to_string(), "Enjoy!".to_string())]),
        )
        .with_order(order_id);
        let id = h.service.create_and_send(request).await.unwrap().unwrap();

        let record = h.service.get_status(id).await.unwrap();
        assert_eq!(record.title, "Order TH-20260801-001 confirmed");
        assert_eq!(record.content, "Hi Li Na, ¥1280.50 for 2026-09-01. Enjoy!");
        assert_eq!(record.template_id, Some(template_id));
    }

    #[tokio::test]
    async fn test_missing_template_without_fallback_is_not_found() {
        let h = harness();
        let request = CreateNotificationRequest::from_template(
            h.user,
            NotificationType::OrderConfirmed,
            NotificationChannel::InApp,
            Uuid::new_v4(),
            HashMap::new(),
        );
        let err = h.service.create_and_send(request).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        let mut with_fallback = email_request(h.user);
        with_fallback.template_id = Some(Uuid::new_v4());
        assert!(h.service.create_and_send(with_fallback).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_notification_center_flow() {
        let h = harness();
        let mut ids = Vec::new();
        for i in 0..3 {
            let request = CreateNotificationRequest::new(
                h.user,
                NotificationType::BookingReminder,
                NotificationChannel::InApp,
                format!("Reminder {i}"),
                "Your tour is coming up",
            );
            ids.push(h.service.create_and_send(request).await.unwrap().unwrap());
        }
        assert_eq!(h.service.unread_count(h.user).await.unwrap(), 3);

        h.service.mark_read(h.user, ids[0]).await.unwrap();
        h.service.mark_read(h.user, ids[0]).await.unwrap();
        assert_eq!(h.service.unread_count(h.user).await.unwrap(), 2);

        let other = Uuid::new_v4();
        let err = h.service.mark_read(other, ids[1]).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        let unread = h
            .service
            .list_for_user(h.user, PageRequest::default(), true)
            .await
            .unwrap();
        assert_eq!(unread.total_items, 2);

        assert_eq!(h.service.mark_all_read(h.user).await.unwrap(), 2);
        h.service.delete_in_app(h.user, ids[2]).await.unwrap();
        assert!(h.service.delete_in_app(h.user, ids[2]).await.is_err());
        let all = h
            .service
            .list_for_user(h.user, PageRequest::default(), false)
            .await
            .unwrap();
        assert_eq!(all.total_items, 2);
    }

    #[tokio::test]
    async fn test_quiet_hours_defer_non_urgent() {
        let h = harness();
        let now = Utc::now();
        let hour = chrono::Timelike::hour(&now) as i16;
        let mut config = NotificationUserConfig::default_for(h.user, NotificationChannel::Email);
        config.quiet_hours_start = Some(hour);
        config.quiet_hours_end = Some((hour + 1) % 24);
        h.service.update_user_config(config).await.unwrap();

        let id = h.service.create_and_send(email_request(h.user)).await.unwrap().unwrap();
        let record = h.service.get_status(id).await.unwrap();
        assert_eq!(record.status, NotificationStatus::Pending);
        assert!(record.scheduled_at > now);

        let urgent = email_request(h.user).with_priority(NotificationPriority::Urgent);
        let id = h.service.create_and_send(urgent).await.unwrap().unwrap();
        assert_eq!(
            h.service.get_status(id).await.unwrap().status,
            NotificationStatus::Delivered
        );
    }

    #[tokio::test]
    async fn test_batch_continues_past_failures() {
        let h = harness();
        let mut bad = email_request(h.user);
        bad.content = Some(String::new());
        let results = h
            .service
            .create_batch(vec![email_request(h.user), bad, email_request(h.user)])
            .await;
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
    }

    #[tokio::test]
    async fn test_configs_cover_every_channel_and_validate_hours() {
        let h = harness();
        assert_eq!(h.service.get_user_configs(h.user).await.unwrap().len(), 4);

        let mut config = NotificationUserConfig::default_for(h.user, NotificationChannel::Sms);
        config.quiet_hours_start = Some(25);
        config.quiet_hours_end = Some(7);
        assert!(h.service.update_user_config(config).await.is_err());
    }
}
