//! Facade over the scheduling and match crates. Wires the services
//! together against pluggable backends and serializes every mutating
//! operation through the per-pair lock map.

use chrono::{DateTime, Utc};
use rendez_core::models::{AvailabilityWindow, BookingView, Match};
use rendez_core::ports::{ActivityLog, NotificationSink, ProfileDirectory, VenueCatalog};
use rendez_core::repository::{AvailabilityRepository, BookingRepository, MatchRepository};
use rendez_core::{CoreError, CoreResult};
use rendez_match::booking::BookingCoordinator;
use rendez_match::coordinator::{MatchCoordinator, SubmitOutcome};
use rendez_match::lock::PairLocks;
use rendez_scheduling::availability::AvailabilityService;
use rendez_scheduling::slots::SlotIntersectionEngine;
use rendez_scheduling::venue::VenueSelector;
use rendez_store::app_config::BusinessRules;
use std::sync::Arc;
use uuid::Uuid;


/// Storage and side-effect backends the engine runs against.
pub struct Backends {
    pub availability: Arc<dyn AvailabilityRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub matches: Arc<dyn MatchRepository>,
    pub profiles: Arc<dyn ProfileDirectory>,
    pub venues: Arc<dyn VenueCatalog>,
    pub notifications: Arc<dyn NotificationSink>,
    pub activity: Arc<dyn ActivityLog>,
}

pub struct Engine {
    availability: Arc<AvailabilityService>,
    matching: MatchCoordinator,
    bookings: Arc<BookingCoordinator>,
    matches: Arc<dyn MatchRepository>,
    locks: PairLocks,
}

impl Engine {
    pub fn new(backends: Backends, rules: BusinessRules) -> Self {
        let availability = Arc::new(AvailabilityService::new(
            backends.availability.clone(),
            backends.bookings.clone(),
        ));
        let bookings = Arc::new(BookingCoordinator::new(
            backends.bookings.clone(),
            backends.matches.clone(),
            backends.profiles.clone(),
            backends.notifications.clone(),
            backends.activity.clone(),
            rules.clone(),
        ));
        let matching = MatchCoordinator::new(
            backends.matches.clone(),
            availability.clone(),
            SlotIntersectionEngine::new(
                backends.availability.clone(),
                backends.bookings.clone(),
                rules.clone(),
            ),
            VenueSelector::new(backends.venues.clone()),
            bookings.clone(),
            backends.profiles.clone(),
            backends.notifications.clone(),
            backends.activity.clone(),
            rules,
        );

        Self {
            availability,
            matching,
            bookings,
            matches: backends.matches,
            locks: PairLocks::new(),
        }
    }

    /// Entry point for the upstream matchmaking collaborator, not part of
    /// the scheduling surface proper: it seeds the single coordination row
    /// for a mutually-interested pair, starting in the waiting state. The
    /// pair is stored normalized; a second registration in either order is
    /// a conflict.
    pub async fn register_match(&self, u1: Uuid, u2: Uuid) -> CoreResult<Match> {
        let _guard = self.locks.acquire(u1, u2).await;
        let m = Match::new(u1, u2)?;
        self.matches.create(m.clone()).await?;
        Ok(m)
    }

    pub async fn add_availability(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> CoreResult<AvailabilityWindow> {
        let _guard = self.locks.acquire_user(user_id).await;
        self.availability.add(user_id, start, end).await
    }

    /// Deletes one of the caller's windows. Another user's window id is
    /// reported as unknown rather than forbidden.
    pub async fn remove_availability(&self, user_id: Uuid, window_id: Uuid) -> CoreResult<()> {
        let _guard = self.locks.acquire_user(user_id).await;
        let owned = self
            .availability
            .list_for(user_id)
            .await?
            .iter()
            .any(|w| w.id == window_id);
        if !owned {
            return Err(CoreError::NotFound(format!(
                "Availability window {} not found",
                window_id
            )));
        }
        self.availability.remove(window_id).await
    }

    pub async fn list_user_availability(
        &self,
        user_id: Uuid,
    ) -> CoreResult<Vec<AvailabilityWindow>> {
        self.availability.list_for(user_id).await
    }

    pub async fn submit_availability(
        &self,
        user_id: Uuid,
        target_user_id: Uuid,
    ) -> CoreResult<SubmitOutcome> {
        let _guard = self.locks.acquire(user_id, target_user_id).await;
        self.matching.submit_availability(user_id, target_user_id).await
    }

    pub async fn create_manual_booking(
        &self,
        requester_id: Uuid,
        recipient_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> CoreResult<BookingView> {
        let _guard = self.locks.acquire(requester_id, recipient_id).await;
        self.bookings
            .create_manual(requester_id, recipient_id, start, end)
            .await
    }

    pub async fn confirm_booking(&self, booking_id: Uuid, user_id: Uuid) -> CoreResult<BookingView> {
        let _guard = self.lock_booking_pair(booking_id).await?;
        self.bookings.confirm(booking_id, user_id).await
    }

    pub async fn submit_feedback(
        &self,
        booking_id: Uuid,
        user_id: Uuid,
        attended: bool,
        wants_contact: bool,
    ) -> CoreResult<BookingView> {
        let _guard = self.lock_booking_pair(booking_id).await?;
        self.bookings
            .submit_feedback(booking_id, user_id, attended, wants_contact)
            .await
    }

    pub async fn cancel_booking(&self, booking_id: Uuid, user_id: Uuid) -> CoreResult<()> {
        let _guard = self.lock_booking_pair(booking_id).await?;
        self.bookings.cancel(booking_id, user_id).await
    }

    pub async fn get_booking(&self, booking_id: Uuid) -> CoreResult<BookingView> {
        self.bookings.get_booking(booking_id).await
    }

    pub async fn get_active_booking(
        &self,
        u1: Uuid,
        u2: Uuid,
    ) -> CoreResult<Option<BookingView>> {
        self.bookings.get_active(u1, u2).await
    }

    pub async fn list_user_bookings(&self, user_id: Uuid) -> CoreResult<Vec<BookingView>> {
        self.bookings.list_for_user(user_id).await
    }

    pub async fn can_chat(&self, u1: Uuid, u2: Uuid) -> CoreResult<bool> {
        self.bookings.can_chat(u1, u2).await
    }

    // A booking's pair never changes after creation, so reading it before
    // taking the lock is safe.
    async fn lock_booking_pair(
        &self,
        booking_id: Uuid,
    ) -> CoreResult<tokio::sync::OwnedMutexGuard<()>> {
        let view = self.bookings.get_booking(booking_id).await?;
        Ok(self.locks.acquire(view.requester_id, view.recipient_id).await)
    }
}
