use chrono::Utc;

use tourhub_entity::notification::{
    NotificationChannel, NotificationPriority, NotificationStatus, NotificationType,
    NotificationUserConfig,
};
use tourhub_service::CreateNotificationRequest;

use crate::support::Engine;

fn sms(user_id: uuid::Uuid) -> CreateNotificationRequest {
    CreateNotificationRequest::new(
        user_id,
        NotificationType::OrderConfirmed,
        NotificationChannel::Sms,
        "Order confirmed",
        "Your ticket for the Summer Palace is confirmed.",
    )
}

#[tokio::test]
async fn failing_gateway_exhausts_retries_then_fails() {
    let engine = Engine::new();
    let user = engine.traveller("13800138000");
    engine.sms.fail(true);

    let id = engine
        .service
        .create_and_send(sms(user).with_max_retries(2))
        .await
        .unwrap()
        .unwrap();

    for _ in 0..5 {
        engine.tick().await;
    }

    let record = engine.record(id);
    assert_eq!(record.status, NotificationStatus::Failed);
    assert_eq!(record.retry_count, 2);
    assert_eq!(engine.sms.calls(), 3);
    assert!(record.error_message.unwrap().contains("502"));
}

#[tokio::test]
async fn recovered_gateway_delivers_on_retry() {
    let engine = Engine::new();
    let user = engine.traveller("13800138000");
    engine.sms.fail(true);

    let id = engine
        .service
        .create_and_send(sms(user))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(engine.record(id).status, NotificationStatus::Pending);

    engine.sms.fail(false);
    let summary = engine.tick().await;
    assert_eq!(summary.delivered, 1);

    let record = engine.record(id);
    assert_eq!(record.status, NotificationStatus::Delivered);
    assert_eq!(record.retry_count, 1);
    assert!(record.delivered_at.unwrap() >= record.sent_at.unwrap());
    assert!(record.external_id.unwrap().starts_with("gw-"));
}

#[tokio::test]
async fn malformed_number_never_reaches_the_gateway() {
    let engine = Engine::new();
    let user = engine.traveller("12345");

    let id = engine
        .service
        .create_and_send(sms(user).with_max_retries(1))
        .await
        .unwrap()
        .unwrap();
    engine.tick().await;
    engine.tick().await;

    let record = engine.record(id);
    assert_eq!(record.status, NotificationStatus::Failed);
    assert_eq!(engine.sms.calls(), 0);
    assert!(record.error_message.unwrap().contains("Invalid mobile number"));
}

#[tokio::test]
async fn delivered_records_are_not_dispatched_again() {
    let engine = Engine::new();
    let user = engine.traveller("13800138000");

    let id = engine
        .service
        .create_and_send(sms(user))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(engine.record(id).status, NotificationStatus::Delivered);

    let summary = engine.tick().await;
    assert_eq!(summary.due, 0);
    assert_eq!(engine.sms.calls(), 1);
}

#[tokio::test]
async fn future_schedule_waits_for_its_time() {
    let engine = Engine::new();
    let user = engine.traveller("13800138000");

    let at = Utc::now() + chrono::Duration::minutes(10);
    let id = engine
        .service
        .create_and_send(sms(user).schedule_at(at))
        .await
        .unwrap()
        .unwrap();

    let summary = engine.tick().await;
    assert_eq!(summary.due, 0);
    assert_eq!(engine.sms.calls(), 0);
    let record = engine.record(id);
    assert_eq!(record.status, NotificationStatus::Pending);
    assert_eq!(record.scheduled_at, at);
}

#[tokio::test]
async fn disabled_channel_persists_nothing() {
    let engine = Engine::new();
    let user = engine.traveller("13800138000");

    let mut config = NotificationUserConfig::default_for(user, NotificationChannel::Email);
    config.enabled = false;
    engine.service.update_user_config(config).await.unwrap();

    let created = engine
        .service
        .create_and_send(CreateNotificationRequest::new(
            user,
            NotificationType::OrderConfirmed,
            NotificationChannel::Email,
            "Order confirmed",
            "Your ticket is confirmed.",
        ))
        .await
        .unwrap();

    assert!(created.is_none());
    assert!(engine.notifications.all().is_empty());
    assert_eq!(engine.email.calls(), 0);
}

#[tokio::test]
async fn urgent_goes_out_before_low_in_one_batch() {
    let engine = Engine::new();
    let user = engine.traveller("13800138000");
    let at = Utc::now() + chrono::Duration::milliseconds(200);

    let low = engine
        .service
        .create_and_send(
            sms(user)
                .with_priority(NotificationPriority::Low)
                .schedule_at(at),
        )
        .await
        .unwrap()
        .unwrap();
    let urgent = engine
        .service
        .create_and_send(
            sms(user)
                .with_priority(NotificationPriority::Urgent)
                .schedule_at(at + chrono::Duration::milliseconds(1)),
        )
        .await
        .unwrap()
        .unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
    let summary = engine.tick().await;
    assert_eq!(summary.delivered, 2);

    let order: Vec<_> = engine
        .sms
        .requests()
        .into_iter()
        .map(|r| r.notification_id)
        .collect();
    assert_eq!(order, vec![urgent, low]);
}

#[tokio::test]
async fn email_carries_the_action_button() {
    let engine = Engine::new();
    let user = engine.traveller("13800138000");

    engine
        .service
        .create_and_send(
            CreateNotificationRequest::new(
                user,
                NotificationType::PaymentSuccess,
                NotificationChannel::Email,
                "Payment successful",
                "We received your payment.",
            )
            .with_metadata(serde_json::json!({
                "actionUrl": "https://www.tourhub.com/orders/1",
                "actionLabel": "View order",
            })),
        )
        .await
        .unwrap()
        .unwrap();

    let requests = engine.email.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].to, "lin.wei@example.com");
    assert_eq!(requests[0].content_type, "text/html");
    assert!(requests[0].body.contains("https://www.tourhub.com/orders/1"));
    assert!(requests[0].body.contains("View order"));
}
