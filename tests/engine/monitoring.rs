use tourhub_core::config::security::{ChannelQuota, RateLimitConfig};
use tourhub_entity::metrics::HealthStatus;
use tourhub_entity::notification::{NotificationChannel, NotificationType};
use tourhub_service::CreateNotificationRequest;

use crate::support::Engine;

#[tokio::test]
async fn success_rate_alert_fires_once_within_cooldown() {
    let engine = Engine::with_rate_limit(RateLimitConfig {
        in_app: ChannelQuota {
            hourly: 500,
            daily: 500,
        },
        sms: ChannelQuota {
            hourly: 50,
            daily: 50,
        },
        ..RateLimitConfig::default()
    });
    let reachable = engine.traveller("13800138000");
    let unreachable = engine.traveller("12345");

    for i in 0..90 {
        engine
            .service
            .create_and_send(CreateNotificationRequest::new(
                reachable,
                NotificationType::SystemAnnouncement,
                NotificationChannel::InApp,
                "Opening hours",
                format!("The east gate opens at 8:00 (notice {i})."),
            ))
            .await
            .unwrap()
            .unwrap();
    }
    for _ in 0..10 {
        engine
            .service
            .create_and_send(
                CreateNotificationRequest::new(
                    unreachable,
                    NotificationType::OrderConfirmed,
                    NotificationChannel::Sms,
                    "Order confirmed",
                    "Your ticket is confirmed.",
                )
                .with_max_retries(0),
            )
            .await
            .unwrap()
            .unwrap();
    }

    let snapshot = engine.monitor.collect_metrics().await.unwrap();
    assert_eq!(snapshot.delivered, 90);
    assert_eq!(snapshot.failed, 10);
    assert!((snapshot.success_rate - 90.0).abs() < f64::EPSILON);

    let fired = engine.monitor.run_tick().await.unwrap();
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].rule_name, "low_success_rate");

    let again = engine.monitor.run_tick().await.unwrap();
    assert!(again.is_empty());
    assert_eq!(engine.sink.fired().len(), 1);

    let report = engine.monitor.generate_health_report().await.unwrap();
    assert_eq!(report.status, HealthStatus::Warning);
    assert_eq!(report.active_alerts.len(), 1);
    assert!(!report.recommendations.is_empty());
}

#[tokio::test]
async fn quiet_engine_is_healthy() {
    let engine = Engine::new();
    let report = engine.monitor.generate_health_report().await.unwrap();

    assert_eq!(report.status, HealthStatus::Healthy);
    assert!((report.metrics.success_rate - 100.0).abs() < f64::EPSILON);
    assert!(engine.monitor.run_tick().await.unwrap().is_empty());
}
