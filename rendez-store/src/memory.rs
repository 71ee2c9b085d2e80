//! In-memory backends for the repository and port traits. These back the
//! tests and the demo binary; a deployment swaps them for adapters to the
//! real data store and collaborator services.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rendez_core::models::{AvailabilityWindow, DateBooking, Match, UserProfile, Venue};
use rendez_core::ports::{ActivityLog, NotificationSink, ProfileDirectory, VenueCatalog};
use rendez_core::repository::{AvailabilityRepository, BookingRepository, MatchRepository};
use rendez_core::{CoreError, CoreResult};
use rendez_shared::events::{ActivityCategory, SchedulingEvent};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryAvailabilityRepository {
    windows: RwLock<HashMap<Uuid, AvailabilityWindow>>,
}

impl InMemoryAvailabilityRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AvailabilityRepository for InMemoryAvailabilityRepository {
    async fn save(&self, window: AvailabilityWindow) -> CoreResult<()> {
        self.windows.write().await.insert(window.id, window);
        Ok(())
    }

    async fn list_for(&self, user_id: Uuid) -> CoreResult<Vec<AvailabilityWindow>> {
        Ok(self
            .windows
            .read()
            .await
            .values()
            .filter(|w| w.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_overlapping(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> CoreResult<Vec<AvailabilityWindow>> {
        Ok(self
            .windows
            .read()
            .await
            .values()
            .filter(|w| w.user_id == user_id && w.overlaps(start, end))
            .cloned()
            .collect())
    }

    async fn remove(&self, id: Uuid) -> CoreResult<()> {
        self.windows
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| CoreError::NotFound(format!("Availability window {} not found", id)))
    }

    async fn clear_for(&self, user_id: Uuid) -> CoreResult<()> {
        self.windows.write().await.retain(|_, w| w.user_id != user_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryBookingRepository {
    bookings: RwLock<HashMap<Uuid, DateBooking>>,
}

impl InMemoryBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn create(&self, booking: DateBooking) -> CoreResult<()> {
        self.bookings.write().await.insert(booking.id, booking);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> CoreResult<Option<DateBooking>> {
        Ok(self.bookings.read().await.get(&id).cloned())
    }

    async fn save(&self, booking: DateBooking) -> CoreResult<()> {
        self.bookings.write().await.insert(booking.id, booking);
        Ok(())
    }

    async fn list_for_user(&self, user_id: Uuid) -> CoreResult<Vec<DateBooking>> {
        Ok(self
            .bookings
            .read()
            .await
            .values()
            .filter(|b| b.requester == user_id || b.recipient == user_id)
            .cloned()
            .collect())
    }

    async fn find_live_overlapping(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> CoreResult<Vec<DateBooking>> {
        Ok(self
            .bookings
            .read()
            .await
            .values()
            .filter(|b| {
                (b.requester == user_id || b.recipient == user_id)
                    && b.status.is_live()
                    && b.overlaps(start, end)
            })
            .cloned()
            .collect())
    }

    async fn find_between(&self, u1: Uuid, u2: Uuid) -> CoreResult<Vec<DateBooking>> {
        Ok(self
            .bookings
            .read()
            .await
            .values()
            .filter(|b| b.involves_pair(u1, u2))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryMatchRepository {
    matches: RwLock<HashMap<Uuid, Match>>,
}

impl InMemoryMatchRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MatchRepository for InMemoryMatchRepository {
    async fn create(&self, m: Match) -> CoreResult<()> {
        let mut matches = self.matches.write().await;
        if matches
            .values()
            .any(|existing| existing.user_a == m.user_a && existing.user_b == m.user_b)
        {
            return Err(CoreError::Conflict(format!(
                "Match between {} and {} already exists",
                m.user_a, m.user_b
            )));
        }
        matches.insert(m.id, m);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> CoreResult<Option<Match>> {
        Ok(self.matches.read().await.get(&id).cloned())
    }

    async fn find_between(&self, u1: Uuid, u2: Uuid) -> CoreResult<Option<Match>> {
        let (a, b) = rendez_core::models::normalize_pair(u1, u2);
        Ok(self
            .matches
            .read()
            .await
            .values()
            .find(|m| m.user_a == a && m.user_b == b)
            .cloned())
    }

    async fn save(&self, m: Match) -> CoreResult<()> {
        self.matches.write().await.insert(m.id, m);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryProfileDirectory {
    profiles: RwLock<HashMap<Uuid, UserProfile>>,
}

impl InMemoryProfileDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn upsert(&self, profile: UserProfile) {
        self.profiles.write().await.insert(profile.id, profile);
    }
}

#[async_trait]
impl ProfileDirectory for InMemoryProfileDirectory {
    async fn get_user(&self, id: Uuid) -> CoreResult<UserProfile> {
        self.profiles
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("User {} not found", id)))
    }

    async fn set_penalized_until(&self, id: Uuid, until: DateTime<Utc>) -> CoreResult<()> {
        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .get_mut(&id)
            .ok_or_else(|| CoreError::NotFound(format!("User {} not found", id)))?;
        profile.penalized_until = Some(until);
        Ok(())
    }
}

pub struct StaticVenueCatalog {
    venues: Vec<Venue>,
}

impl StaticVenueCatalog {
    pub fn new(venues: Vec<Venue>) -> Self {
        Self { venues }
    }
}

#[async_trait]
impl VenueCatalog for StaticVenueCatalog {
    async fn list_venues(&self) -> CoreResult<Vec<Venue>> {
        Ok(self.venues.clone())
    }
}

/// Records every dispatched event; tests assert on the log, the demo binary
/// just traces it.
#[derive(Default)]
pub struct RecordingNotificationSink {
    sent: RwLock<Vec<(Uuid, SchedulingEvent)>>,
}

impl RecordingNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent_to(&self, user_id: Uuid) -> Vec<SchedulingEvent> {
        self.sent
            .read()
            .await
            .iter()
            .filter(|(uid, _)| *uid == user_id)
            .map(|(_, e)| e.clone())
            .collect()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotificationSink {
    async fn notify(&self, user_id: Uuid, event: SchedulingEvent) -> CoreResult<()> {
        debug!(%user_id, ?event, "dispatching scheduling event");
        self.sent.write().await.push((user_id, event));
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ActivityEntry {
    pub user_id: Uuid,
    pub message: String,
    pub category: ActivityCategory,
    pub at: DateTime<Utc>,
}

#[derive(Default)]
pub struct InMemoryActivityLog {
    entries: RwLock<Vec<ActivityEntry>>,
}

impl InMemoryActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries_for(&self, user_id: Uuid) -> Vec<ActivityEntry> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ActivityLog for InMemoryActivityLog {
    async fn record(
        &self,
        user_id: Uuid,
        message: &str,
        category: ActivityCategory,
    ) -> CoreResult<()> {
        self.entries.write().await.push(ActivityEntry {
            user_id,
            message: message.to_string(),
            category,
            at: Utc::now(),
        });
        Ok(())
    }
}
