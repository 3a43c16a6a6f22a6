//! Delivery monitor: rolling metrics, alert rules, and health reports.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use tourhub_core::config::monitor::MonitorConfig;
use tourhub_core::error::AppError;
use tourhub_core::result::AppResult;
use tourhub_database::repositories::NotificationRepository;
use tourhub_entity::alert::{
    AlertCondition, AlertEvent, AlertMetric, AlertRule, AlertSeverity, ComparisonOperator,
};
use tourhub_entity::metrics::{HealthStatus, MetricsSnapshot};
use tourhub_entity::notification::{NotificationChannel, NotificationPriority, NotificationType};
use tourhub_service::{CreateNotificationRequest, NotificationService};

/// Number of distinct error messages kept in a snapshot.
const TOP_ERRORS: i64 = 5;

/// Where fired alerts go.
#[async_trait]
pub trait AlertSink: Send + Sync + std::fmt::Debug {
    async fn dispatch(&self, rule: &AlertRule, event: &AlertEvent) -> AppResult<()>;
}

/// Logs alerts only. Used when no operators are configured.
#[derive(Debug, Default)]
pub struct LogAlertSink;

#[async_trait]
impl AlertSink for LogAlertSink {
    async fn dispatch(&self, rule: &AlertRule, event: &AlertEvent) -> AppResult<()> {
        warn!(
            rule = %rule.name,
            severity = event.severity.as_str(),
            value = event.metric_value,
            threshold = event.threshold,
            "{}",
            event.message
        );
        Ok(())
    }
}

/// Sends each alert as an urgent `system_alert` notification to every
/// operator on each of the rule's channels.
#[derive(Debug)]
pub struct NotificationAlertSink {
    service: Arc<NotificationService>,
    operators: Vec<Uuid>,
}

impl NotificationAlertSink {
    pub fn new(service: Arc<NotificationService>, operators: Vec<Uuid>) -> Self {
        Self { service, operators }
    }
}

#[async_trait]
impl AlertSink for NotificationAlertSink {
    async fn dispatch(&self, rule: &AlertRule, event: &AlertEvent) -> AppResult<()> {
        let title = format!(
            "[{}] Notification delivery alert: {}",
            event.severity.as_str().to_uppercase(),
            rule.name
        );
        let metadata = json!({
            "rule": rule.name,
            "severity": event.severity,
            "metricValue": event.metric_value,
            "threshold": event.threshold,
            "alertId": event.id,
        });

        let mut failures = Vec::new();
        for operator in &self.operators {
            for channel in &rule.channels {
                let request = CreateNotificationRequest::new(
                    *operator,
                    NotificationType::SystemAlert,
                    *channel,
                    title.clone(),
                    event.message.clone(),
                )
                .with_priority(NotificationPriority::Urgent)
                .with_metadata(metadata.clone());
                if let Err(e) = self.service.create_and_send(request).await {
                    failures.push(format!("{operator}/{channel}: {}", e.message));
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(AppError::external_service(format!(
                "Alert {} not delivered to {} targets: {}",
                event.id,
                failures.len(),
                failures.join("; ")
            )))
        }
    }
}

/// Parse configured channel names, skipping unknown ones.
fn alert_channels(names: &[String]) -> Vec<NotificationChannel> {
    names
        .iter()
        .filter_map(|name| match name.parse::<NotificationChannel>() {
            Ok(channel) => Some(channel),
            Err(_) => {
                warn!(channel = %name, "Ignoring unknown alert channel");
                None
            }
        })
        .collect()
}

/// The built-in alert rules.
pub fn default_rules(config: &MonitorConfig) -> Vec<AlertRule> {
    let channels = alert_channels(&config.alert_channels);
    let cooldown = config.alert_cooldown_seconds;
    vec![
        AlertRule::new(
            "low_success_rate",
            "Delivery success rate dropped below threshold",
            AlertCondition::new(
                AlertMetric::SuccessRate,
                ComparisonOperator::LessThan,
                config.success_rate_threshold,
            ),
            channels.clone(),
            cooldown,
        ),
        AlertRule::new(
            "high_failure_count",
            "Too many notifications failed permanently",
            AlertCondition::new(
                AlertMetric::FailedCount,
                ComparisonOperator::GreaterThan,
                config.failed_count_threshold,
            ),
            channels.clone(),
            cooldown,
        ),
        AlertRule::new(
            "slow_delivery",
            "Average delivery latency is too high",
            AlertCondition::new(
                AlertMetric::AverageDeliveryMs,
                ComparisonOperator::GreaterThan,
                config.slow_delivery_ms,
            ),
            channels.clone(),
            cooldown,
        ),
        AlertRule::new(
            "pending_backlog",
            "Pending backlog is growing",
            AlertCondition::new(
                AlertMetric::Backlog,
                ComparisonOperator::GreaterThan,
                config.backlog_warning as f64,
            ),
            channels,
            cooldown,
        ),
    ]
}

/// Health summary served by `GET /api/monitor/health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub metrics: MetricsSnapshot,
    pub active_alerts: Vec<AlertEvent>,
    pub recommendations: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct MonitorState {
    latest: Option<MetricsSnapshot>,
    active: Vec<AlertEvent>,
    history: VecDeque<AlertEvent>,
    last_fired: HashMap<String, DateTime<Utc>>,
}

impl MonitorState {
    fn remember(&mut self, event: AlertEvent, limit: usize) {
        self.history.push_back(event);
        while self.history.len() > limit.max(1) {
            self.history.pop_front();
        }
    }

    fn resolve(&mut self, id: Uuid, at: DateTime<Utc>) -> Option<AlertEvent> {
        let index = self.active.iter().position(|a| a.id == id)?;
        let mut event = self.active.remove(index);
        event.resolve(at);
        if let Some(past) = self.history.iter_mut().find(|a| a.id == id) {
            past.resolve(at);
        }
        Some(event)
    }
}

/// Collects delivery metrics and evaluates alert rules against them.
pub struct Monitor {
    notifications: Arc<dyn NotificationRepository>,
    rules: Vec<AlertRule>,
    sink: Arc<dyn AlertSink>,
    config: MonitorConfig,
    state: RwLock<MonitorState>,
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("rules", &self.rules.len())
            .field("sink", &self.sink)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Monitor {
    /// Creates a monitor with the built-in rules.
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        sink: Arc<dyn AlertSink>,
        config: MonitorConfig,
    ) -> Self {
        let rules = default_rules(&config);
        Self::with_rules(notifications, sink, config, rules)
    }

    pub fn with_rules(
        notifications: Arc<dyn NotificationRepository>,
        sink: Arc<dyn AlertSink>,
        config: MonitorConfig,
        rules: Vec<AlertRule>,
    ) -> Self {
        Self {
            notifications,
            rules,
            sink,
            config,
            state: RwLock::new(MonitorState::default()),
        }
    }

    pub fn rules(&self) -> &[AlertRule] {
        &self.rules
    }

    /// Aggregate the last `window_minutes` of records into a snapshot.
    pub async fn collect_metrics(&self) -> AppResult<MetricsSnapshot> {
        let now = Utc::now();
        let since = now - chrono::Duration::minutes(self.config.window_minutes.max(1));

        let rows = self.notifications.status_breakdown(since).await?;
        let average = self.notifications.average_delivery_ms(since).await?;
        let top_errors = self.notifications.top_errors(since, TOP_ERRORS).await?;
        let counts = self.notifications.count_by_status().await?;

        let mut snapshot = MetricsSnapshot::from_breakdown(
            now,
            self.config.window_minutes,
            &rows,
            average,
            top_errors,
        );
        snapshot.backlog = counts.pending;

        self.state.write().await.latest = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// The most recent snapshot, collecting one if none exists yet.
    pub async fn get_current_metrics(&self) -> AppResult<MetricsSnapshot> {
        if let Some(snapshot) = self.state.read().await.latest.clone() {
            return Ok(snapshot);
        }
        self.collect_metrics().await
    }

    /// Evaluate every enabled rule. Returns the alerts fired by this check.
    pub async fn check_alert_rules(&self, snapshot: &MetricsSnapshot) -> Vec<AlertEvent> {
        self.check_alert_rules_at(snapshot, Utc::now()).await
    }

    /// [`Self::check_alert_rules`] with an explicit clock.
    pub async fn check_alert_rules_at(
        &self,
        snapshot: &MetricsSnapshot,
        now: DateTime<Utc>,
    ) -> Vec<AlertEvent> {
        let mut fired = Vec::new();
        {
            let mut state = self.state.write().await;
            for rule in self.rules.iter().filter(|r| r.enabled) {
                let Some(value) = rule.condition.evaluate(snapshot) else {
                    let stale: Vec<Uuid> = state
                        .active
                        .iter()
                        .filter(|a| a.rule_name == rule.name)
                        .map(|a| a.id)
                        .collect();
                    for id in stale {
                        state.resolve(id, now);
                        info!(rule = %rule.name, alert_id = %id, "Alert condition cleared");
                    }
                    continue;
                };

                let cooling = state.last_fired.get(&rule.name).is_some_and(|last| {
                    now < *last + chrono::Duration::seconds(rule.cooldown_seconds)
                });
                if cooling {
                    debug!(rule = %rule.name, value, "Alert suppressed by cooldown");
                    continue;
                }

                let event = AlertEvent {
                    id: Uuid::now_v7(),
                    rule_name: rule.name.clone(),
                    severity: AlertSeverity::from_success_rate(snapshot.success_rate),
                    message: format!(
                        "{}: {:?} is {:.2} ({} {})",
                        rule.description,
                        rule.condition.metric,
                        value,
                        rule.condition.operator.symbol(),
                        rule.condition.threshold
                    ),
                    metric_value: value,
                    threshold: rule.condition.threshold,
                    fired_at: now,
                    resolved: false,
                    resolved_at: None,
                };

                state.active.retain(|a| a.rule_name != rule.name);
                state.active.push(event.clone());
                state.remember(event.clone(), self.config.alert_history_limit);
                state.last_fired.insert(rule.name.clone(), now);
                fired.push((rule, event));
            }
        }

        for (rule, event) in &fired {
            warn!(
                rule = %rule.name,
                alert_id = %event.id,
                severity = event.severity.as_str(),
                value = event.metric_value,
                "Alert fired"
            );
            if let Err(e) = self.sink.dispatch(rule, event).await {
                error!(rule = %rule.name, alert_id = %event.id, error = %e, "Alert dispatch failed");
            }
        }

        fired.into_iter().map(|(_, event)| event).collect()
    }

    /// Collect metrics and check rules. Run on the monitor cron schedule.
    pub async fn run_tick(&self) -> AppResult<Vec<AlertEvent>> {
        let snapshot = self.collect_metrics().await?;
        Ok(self.check_alert_rules(&snapshot).await)
    }

    pub async fn active_alerts(&self) -> Vec<AlertEvent> {
        self.state.read().await.active.clone()
    }

    /// Most recent fired alerts, newest first.
    pub async fn alert_history(&self, limit: usize) -> Vec<AlertEvent> {
        self.state
            .read()
            .await
            .history
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }

    /// Manually resolve an active alert.
    pub async fn resolve_alert(&self, id: Uuid) -> AppResult<AlertEvent> {
        let resolved = self.state.write().await.resolve(id, Utc::now());
        match resolved {
            Some(event) => {
                info!(alert_id = %id, rule = %event.rule_name, "Alert resolved manually");
                Ok(event)
            }
            None => Err(AppError::not_found(format!("Active alert {id} not found"))),
        }
    }

    /// Collect fresh metrics and grade overall health.
    pub async fn generate_health_report(&self) -> AppResult<HealthReport> {
        let metrics = self.collect_metrics().await?;
        let active_alerts = self.active_alerts().await;
        Ok(self.assess(metrics, active_alerts))
    }

    fn assess(&self, metrics: MetricsSnapshot, active_alerts: Vec<AlertEvent>) -> HealthReport {
        let critical = active_alerts
            .iter()
            .any(|a| a.severity == AlertSeverity::Critical);
        let status = if critical || metrics.success_rate < 70.0 {
            HealthStatus::Critical
        } else if !active_alerts.is_empty()
            || metrics.success_rate < 90.0
            || metrics.backlog > self.config.backlog_warning
        {
            HealthStatus::Warning
        } else {
            HealthStatus::Healthy
        };

        let mut recommendations = Vec::new();
        if metrics.success_rate < self.config.success_rate_threshold {
            recommendations.push(format!(
                "Success rate is {:.1}%; check channel gateway credentials and recent errors",
                metrics.success_rate
            ));
        }
        if metrics.backlog > self.config.backlog_warning {
            recommendations.push(format!(
                "{} notifications are pending; consider raising queue concurrency or batch size",
                metrics.backlog
            ));
        }
        if metrics.average_delivery_ms > self.config.slow_delivery_ms {
            recommendations.push(format!(
                "Average delivery takes {:.0} ms; check gateway latency and send timeouts",
                metrics.average_delivery_ms
            ));
        }
        if metrics.retrying > 0 {
            recommendations.push(format!(
                "{} notifications are waiting on a retry",
                metrics.retrying
            ));
        }
        if let Some(top) = metrics.top_errors.first() {
            recommendations.push(format!(
                "Most frequent error ({} times): {}",
                top.count, top.message
            ));
        }

        HealthReport {
            status,
            metrics,
            active_alerts,
            recommendations,
            generated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use tourhub_database::memory::InMemoryNotificationRepository;
    use tourhub_entity::notification::{NewNotification, NotificationStatus};

    #[derive(Debug, Default)]
    struct CapturingSink {
        events: Mutex<Vec<(String, Uuid)>>,
    }

    #[async_trait]
    impl AlertSink for CapturingSink {
        async fn dispatch(&self, rule: &AlertRule, event: &AlertEvent) -> AppResult<()> {
            self.events.lock().unwrap().push((rule.name.clone(), event.id));
            Ok(())
        }
    }

    fn seed(repo: &InMemoryNotificationRepository, status: NotificationStatus, count: usize) {
        let now = Utc::now();
        for _ in 0..count {
            let mut record = NewNotification {
                user_id: Uuid::new_v4(),
                order_id: None,
                notification_type: NotificationType::PaymentSuccess,
                channel: NotificationChannel::Email,
                priority: NotificationPriority::High,
                title: "Payment received".into(),
                content: "Thank you for your payment".into(),
                template_id: None,
                metadata: json!({}),
                scheduled_at: now,
                max_retries: 3,
            }
            .into_record(Uuid::now_v7(), now);
            record.status = status;
            match status {
                NotificationStatus::Delivered => {
                    record.sent_at = Some(now);
                    record.delivered_at = Some(now);
                }
                NotificationStatus::Failed => {
                    record.retry_count = 3;
                    record.error_message = Some("gateway rejected: quota exhausted".into());
                }
                _ => {}
            }
            repo.insert(record);
        }
    }

    fn monitor(repo: Arc<InMemoryNotificationRepository>) -> (Monitor, Arc<CapturingSink>) {
        let sink = Arc::new(CapturingSink::default());
        let monitor = Monitor::new(repo, sink.clone(), MonitorConfig::default());
        (monitor, sink)
    }

    #[tokio::test]
    async fn test_ninety_percent_fires_low_success_rate_once() {
        let repo = Arc::new(InMemoryNotificationRepository::new());
        seed(&repo, NotificationStatus::Delivered, 90);
        seed(&repo, NotificationStatus::Failed, 10);
        let (monitor, sink) = monitor(repo);

        let snapshot = monitor.collect_metrics().await.unwrap();
        assert!((snapshot.success_rate - 90.0).abs() < 1e-9);

        let now = Utc::now();
        let fired = monitor.check_alert_rules_at(&snapshot, now).await;
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].rule_name, "low_success_rate");
        assert_eq!(fired[0].severity, AlertSeverity::Low);

        let again = monitor
            .check_alert_rules_at(&snapshot, now + chrono::Duration::seconds(60))
            .await;
        assert!(again.is_empty());
        assert_eq!(sink.events.lock().unwrap().len(), 1);
        assert_eq!(monitor.active_alerts().await.len(), 1);
    }

    #[tokio::test]
    async fn test_rule_fires_again_after_cooldown() {
        let repo = Arc::new(InMemoryNotificationRepository::new());
        seed(&repo, NotificationStatus::Delivered, 40);
        seed(&repo, NotificationStatus::Failed, 60);
        let (monitor, sink) = monitor(repo);

        let snapshot = monitor.collect_metrics().await.unwrap();
        let now = Utc::now();
        let first = monitor.check_alert_rules_at(&snapshot, now).await;
        let names: Vec<&str> = first.iter().map(|a| a.rule_name.as_str()).collect();
        assert!(names.contains(&"low_success_rate"));
        assert!(names.contains(&"high_failure_count"));
        assert!(first.iter().all(|a| a.severity == AlertSeverity::Critical));

        let later = now + chrono::Duration::seconds(MonitorConfig::default().alert_cooldown_seconds + 1);
        let second = monitor.check_alert_rules_at(&snapshot, later).await;
        assert_eq!(second.len(), first.len());
        assert_eq!(sink.events.lock().unwrap().len(), first.len() * 2);
        assert_eq!(monitor.active_alerts().await.len(), first.len());
        assert_eq!(monitor.alert_history(100).await.len(), first.len() * 2);
    }

    #[tokio::test]
    async fn test_cleared_condition_resolves_alert() {
        let repo = Arc::new(InMemoryNotificationRepository::new());
        seed(&repo, NotificationStatus::Delivered, 90);
        seed(&repo, NotificationStatus::Failed, 10);
        let (monitor, _) = monitor(repo);

        let degraded = monitor.collect_metrics().await.unwrap();
        monitor.check_alert_rules(&degraded).await;
        assert_eq!(monitor.active_alerts().await.len(), 1);

        let healthy = MetricsSnapshot::empty(Utc::now(), 60);
        monitor.check_alert_rules(&healthy).await;
        assert!(monitor.active_alerts().await.is_empty());
        let history = monitor.alert_history(10).await;
        assert!(history[0].resolved);
        assert!(history[0].resolved_at.is_some());
    }

    #[tokio::test]
    async fn test_resolve_alert_manually() {
        let repo = Arc::new(InMemoryNotificationRepository::new());
        seed(&repo, NotificationStatus::Delivered, 90);
        seed(&repo, NotificationStatus::Failed, 10);
        let (monitor, _) = monitor(repo);

        let fired = monitor.run_tick().await.unwrap();
        let resolved = monitor.resolve_alert(fired[0].id).await.unwrap();
        assert!(resolved.resolved);
        assert!(monitor.active_alerts().await.is_empty());

        let err = monitor.resolve_alert(fired[0].id).await.unwrap_err();
        assert_eq!(err.kind, tourhub_core::error::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_health_report_grades() {
        let repo = Arc::new(InMemoryNotificationRepository::new());
        let (monitor, _) = monitor(repo.clone());
        let report = monitor.generate_health_report().await.unwrap();
        assert_eq!(report.status, HealthStatus::Healthy);
        assert!(report.recommendations.is_empty());

        seed(&repo, NotificationStatus::Delivered, 60);
        seed(&repo, NotificationStatus::Failed, 40);
        monitor.run_tick().await.unwrap();
        let report = monitor.generate_health_report().await.unwrap();
        assert_eq!(report.status, HealthStatus::Critical);
        assert!(!report.active_alerts.is_empty());
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.contains("quota exhausted")));
    }

    #[tokio::test]
    async fn test_backlog_degrades_to_warning() {
        let repo = Arc::new(InMemoryNotificationRepository::new());
        seed(&repo, NotificationStatus::Pending, 3);
        let sink = Arc::new(CapturingSink::default());
        let config = MonitorConfig {
            backlog_warning: 2,
            ..MonitorConfig::default()
        };
        let monitor = Monitor::new(repo, sink, config);

        let report = monitor.generate_health_report().await.unwrap();
        assert_eq!(report.metrics.backlog, 3);
        assert_eq!(report.status, HealthStatus::Warning);
    }

    #[test]
    fn test_default_rules_skip_unknown_channels() {
        let config = MonitorConfig {
            alert_channels: vec!["email".into(), "pager".into()],
            ..MonitorConfig::default()
        };
        let rules = default_rules(&config);
        assert_eq!(rules.len(), 4);
        assert!(rules
            .iter()
            .all(|r| r.channels == vec![NotificationChannel::Email]));
    }
}
