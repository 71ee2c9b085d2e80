use crate::models::{UserProfile, Venue};
use crate::CoreResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rendez_shared::events::{ActivityCategory, SchedulingEvent};
use uuid::Uuid;

/// External profile service. The engine only reads coordinates and the
/// penalty timestamp, and writes the penalty timestamp on bad-faith
/// cancellation.
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    async fn get_user(&self, id: Uuid) -> CoreResult<UserProfile>;

    async fn set_penalized_until(&self, id: Uuid, until: DateTime<Utc>) -> CoreResult<()>;
}

/// External venue catalog consulted by the venue selector.
#[async_trait]
pub trait VenueCatalog: Send + Sync {
    async fn list_venues(&self) -> CoreResult<Vec<Venue>>;
}

/// Best-effort push notification transport. Failures must never roll back
/// or block the state transition that triggered the event.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, user_id: Uuid, event: SchedulingEvent) -> CoreResult<()>;
}

/// Best-effort audit/feed entries; never consulted for correctness.
#[async_trait]
pub trait ActivityLog: Send + Sync {
    async fn record(
        &self,
        user_id: Uuid,
        message: &str,
        category: ActivityCategory,
    ) -> CoreResult<()>;
}
