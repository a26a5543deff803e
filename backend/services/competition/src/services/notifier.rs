use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use log::info;
use sqlx::PgPool;

use crate::error::Result;
use crate::types::Notification;

/// Hands notifications to the delivery subsystem.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: Notification) -> Result<()>;
}

/// Records notifications in the `notifications` table, which the delivery
/// worker drains.
#[derive(Clone)]
pub struct PgNotifier {
    pool: PgPool,
}

impl PgNotifier {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Notifier for PgNotifier {
    async fn notify(&self, notification: Notification) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (sender_id, receiver_id, verb, object_id, object_type)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(notification.sender_id)
        .bind(notification.receiver_id)
        .bind(notification.verb.as_str())
        .bind(notification.object.object_id())
        .bind(notification.object.object_type())
        .execute(&self.pool)
        .await?;

        info!(
            "Notification queued: verb={}, receiver_id={}, object_type={}, object_id={}",
            notification.verb.as_str(),
            notification.receiver_id,
            notification.object.object_type(),
            notification.object.object_id()
        );
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MemoryNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn notify(&self, notification: Notification) -> Result<()> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(notification);
        Ok(())
    }
}
