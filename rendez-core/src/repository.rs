use crate::models::{AvailabilityWindow, DateBooking, Match};
use crate::CoreResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Repository trait for availability window access
#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    async fn save(&self, window: AvailabilityWindow) -> CoreResult<()>;

    /// All stored windows for a user, unordered at rest.
    async fn list_for(&self, user_id: Uuid) -> CoreResult<Vec<AvailabilityWindow>>;

    async fn find_overlapping(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> CoreResult<Vec<AvailabilityWindow>>;

    /// Removes one window; NotFound if the id is unknown.
    async fn remove(&self, id: Uuid) -> CoreResult<()>;

    /// Bulk delete after a completed or failed matching attempt.
    async fn clear_for(&self, user_id: Uuid) -> CoreResult<()>;
}

/// Repository trait for date booking access
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create(&self, booking: DateBooking) -> CoreResult<()>;

    async fn get(&self, id: Uuid) -> CoreResult<Option<DateBooking>>;

    async fn save(&self, booking: DateBooking) -> CoreResult<()>;

    async fn list_for_user(&self, user_id: Uuid) -> CoreResult<Vec<DateBooking>>;

    /// Bookings of a user in a live status (PENDING/PROPOSED/CONFIRMED)
    /// overlapping the given window.
    async fn find_live_overlapping(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> CoreResult<Vec<DateBooking>>;

    /// All bookings between an unordered user pair, any status.
    async fn find_between(&self, u1: Uuid, u2: Uuid) -> CoreResult<Vec<DateBooking>>;
}

/// Repository trait for match access
#[async_trait]
pub trait MatchRepository: Send + Sync {
    async fn create(&self, m: Match) -> CoreResult<()>;

    async fn get(&self, id: Uuid) -> CoreResult<Option<Match>>;

    /// The single match row for an unordered pair, if any.
    async fn find_between(&self, u1: Uuid, u2: Uuid) -> CoreResult<Option<Match>>;

    async fn save(&self, m: Match) -> CoreResult<()>;
}
