//! Alert rules and fired alert events.

pub mod event;
pub mod rule;

pub use event::{AlertEvent, AlertSeverity};
pub use rule::{AlertCondition, AlertMetric, AlertRule, ComparisonOperator};
