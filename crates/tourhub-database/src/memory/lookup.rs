use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use tourhub_core::result::AppResult;
use tourhub_entity::notification::{
    NotificationChannel, NotificationTemplate, NotificationUserConfig,
};
use tourhub_entity::recipient::{DeviceToken, OrderSummary, RecipientContact};

use crate::repositories::{RecipientRepository, TemplateRepository, UserConfigRepository};

/// [`UserConfigRepository`] keyed by `(user, channel)`.
#[derive(Debug, Default)]
pub struct InMemoryUserConfigRepository {
    configs: DashMap<(Uuid, NotificationChannel), NotificationUserConfig>,
}

impl InMemoryUserConfigRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserConfigRepository for InMemoryUserConfigRepository {
    async fn find(
        &self,
        user_id: Uuid,
        channel: NotificationChannel,
    ) -> AppResult<Option<NotificationUserConfig>> {
        Ok(self
            .configs
            .get(&(user_id, channel))
            .map(|c| c.value().clone()))
    }

    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<NotificationUserConfig>> {
        let mut configs: Vec<NotificationUserConfig> = self
            .configs
            .iter()
            .filter(|c| c.user_id == user_id)
            .map(|c| c.value().clone())
            .collect();
        configs.sort_by_key(|c| c.channel.as_str());
        Ok(configs)
    }

    async fn upsert(&self, config: &NotificationUserConfig) -> AppResult<NotificationUserConfig> {
        let mut stored = config.clone();
        stored.updated_at = chrono::Utc::now();
        self.configs
            .insert((stored.user_id, stored.channel), stored.clone());
        Ok(stored)
    }
}

/// [`TemplateRepository`] keyed by template id.
#[derive(Debug, Default)]
pub struct InMemoryTemplateRepository {
    templates: DashMap<Uuid, NotificationTemplate>,
}

impl InMemoryTemplateRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TemplateRepository for InMemoryTemplateRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<NotificationTemplate>> {
        Ok(self.templates.get(&id).map(|t| t.value().clone()))
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<NotificationTemplate>> {
        Ok(self
            .templates
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.value().clone()))
    }

    async fn save(&self, template: &NotificationTemplate) -> AppResult<()> {
        self.templates.insert(template.id, template.clone());
        Ok(())
    }
}

/// [`RecipientRepository`] seeded through its `upsert_*` / `add_device` methods.
#[derive(Debug, Default)]
pub struct InMemoryRecipientRepository {
    contacts: DashMap<Uuid, RecipientContact>,
    devices: DashMap<Uuid, Vec<DeviceToken>>,
    orders: DashMap<Uuid, OrderSummary>,
}

impl InMemoryRecipientRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_contact(&self, contact: RecipientContact) {
        self.contacts.insert(contact.user_id, contact);
    }

    pub fn add_device(&self, device: DeviceToken) {
        self.devices.entry(device.user_id).or_default().push(device);
    }

    pub fn upsert_order(&self, order: OrderSummary) {
        self.orders.insert(order.order_id, order);
    }
}

#[async_trait]
impl RecipientRepository for InMemoryRecipientRepository {
    async fn find_contact(&self, user_id: Uuid) -> AppResult<Option<RecipientContact>> {
        Ok(self.contacts.get(&user_id).map(|c| c.value().clone()))
    }

    async fn device_tokens(&self, user_id: Uuid) -> AppResult<Vec<DeviceToken>> {
        Ok(self
            .devices
            .get(&user_id)
            .map(|d| d.value().clone())
            .unwrap_or_default())
    }

    async fn find_order(&self, order_id: Uuid) -> AppResult<Option<OrderSummary>> {
        Ok(self.orders.get(&order_id).map(|o| o.value().clone()))
    }
}
