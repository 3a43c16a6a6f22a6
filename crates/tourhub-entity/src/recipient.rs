//! Read-only projections of the site's user and order tables.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Contact details for a notification recipient.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RecipientContact {
    pub user_id: Uuid,
    pub display_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// A registered push device.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DeviceToken {
    pub user_id: Uuid,
    /// Opaque token issued by the push provider.
    pub token: String,
    /// `ios`, `android`, or `web`.
    pub platform: String,
}

/// Order fields exposed to message templates.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderSummary {
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub order_number: String,
    pub total_amount: f64,
    pub booking_date: Option<NaiveDate>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
}
