use chrono::Utc;

use tourhub_core::error::ErrorKind;
use tourhub_entity::notification::{
    NotificationChannel, NotificationStatus, NotificationType, NotificationUserConfig,
};

use crate::support::Engine;

#[tokio::test]
async fn order_confirmed_fans_out_to_three_channels() {
    let engine = Engine::new();
    let user = engine.traveller("138-0013-8000");
    let order = engine.order_for(user);
    let mut live = engine.hub.subscribe(user).await;

    let report = engine.trigger.order_confirmed(order).await.unwrap();
    assert_eq!(report.created.len(), 3);
    assert!(report.skipped.is_empty());
    assert!(report.errors.is_empty());

    let records = engine.notifications.all();
    assert!(records.iter().all(|r| r.status == NotificationStatus::Delivered));
    assert!(records.iter().all(|r| r.order_id == Some(order)));

    let sms = engine.sms.requests();
    assert_eq!(sms.len(), 1);
    assert_eq!(sms[0].to, "13800138000");
    assert!(sms[0].body.starts_with("【TourHub】"));
    assert!(sms[0].body.contains("TH20260315001"));
    assert_eq!(engine.email.calls(), 1);
    assert_eq!(engine.push.calls(), 0);

    let event = live.try_recv().unwrap();
    assert_eq!(event.title, "Order confirmed");
    assert_eq!(
        event.metadata["actionUrl"],
        format!("https://www.tourhub.com/orders/{order}")
    );
}

#[tokio::test]
async fn muted_type_is_reported_as_skipped() {
    let engine = Engine::new();
    let user = engine.traveller("13800138000");
    let order = engine.order_for(user);

    let mut sms = NotificationUserConfig::default_for(user, NotificationChannel::Sms);
    sms.set_muted_types(vec![NotificationType::PaymentFailed]);
    engine.service.update_user_config(sms).await.unwrap();

    let report = engine
        .trigger
        .payment_failed(order, "card declined")
        .await
        .unwrap();

    assert_eq!(report.created.len(), 2);
    assert_eq!(report.skipped, vec![NotificationChannel::Sms]);
    assert_eq!(engine.sms.calls(), 0);
}

#[tokio::test]
async fn reminder_waits_until_requested_time() {
    let engine = Engine::new();
    let user = engine.traveller("13800138000");
    let order = engine.order_for(user);

    let remind_at = Utc::now() + chrono::Duration::hours(20);
    let report = engine
        .trigger
        .booking_reminder(order, Some(remind_at))
        .await
        .unwrap();
    assert_eq!(report.created.len(), 3);

    engine.tick().await;
    assert_eq!(engine.sms.calls(), 0);
    assert_eq!(engine.push.calls(), 0);
    assert!(
        engine
            .notifications
            .all()
            .iter()
            .all(|r| r.status == NotificationStatus::Pending && r.scheduled_at == remind_at)
    );
}

#[tokio::test]
async fn push_goes_to_registered_devices() {
    let engine = Engine::new();
    let user = engine.traveller("13800138000");
    let order = engine.order_for(user);

    let report = engine.trigger.payment_succeeded(order, 580.0).await.unwrap();
    assert_eq!(report.created.len(), 3);

    let push = engine.push.requests();
    assert_eq!(push.len(), 1);
    assert_eq!(push[0].to, format!("device-{}", user.simple()));
    assert_eq!(push[0].metadata["paidAmount"], 580.0);
}

#[tokio::test]
async fn unknown_order_is_not_found() {
    let engine = Engine::new();
    let err = engine
        .trigger
        .refund_processed(uuid::Uuid::new_v4(), 100.0)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert!(engine.notifications.all().is_empty());
}
