use crate::booking::BookingCoordinator;
use crate::{dispatch, record_activity};
use rendez_core::models::{BookingView, Match};
use rendez_core::ports::{ActivityLog, NotificationSink, ProfileDirectory};
use rendez_core::repository::MatchRepository;
use rendez_core::{CoreError, CoreResult};
use rendez_scheduling::availability::AvailabilityService;
use rendez_scheduling::slots::SlotIntersectionEngine;
use rendez_scheduling::venue::VenueSelector;
use rendez_shared::events::{ActivityCategory, SchedulingEvent};
use rendez_shared::status::MatchStatus;
use rendez_store::app_config::BusinessRules;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Outcome of an availability submission.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Waiting for the counterpart (or an idempotent re-submission).
    Pending,
    /// Both sides submitted and the engine found a slot.
    Proposed(BookingView),
    /// Both sides submitted but no common slot exists; both availability
    /// sets were cleared for resubmission.
    Failed,
}

/// Owns the Match state machine: decides when both sides have submitted,
/// triggers the slot intersection engine and hands a found slot over to
/// the booking coordinator.
pub struct MatchCoordinator {
    matches: Arc<dyn MatchRepository>,
    availability: Arc<AvailabilityService>,
    engine: SlotIntersectionEngine,
    venues: VenueSelector,
    bookings: Arc<BookingCoordinator>,
    profiles: Arc<dyn ProfileDirectory>,
    notifications: Arc<dyn NotificationSink>,
    activity: Arc<dyn ActivityLog>,
    rules: BusinessRules,
}

impl MatchCoordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        matches: Arc<dyn MatchRepository>,
        availability: Arc<AvailabilityService>,
        engine: SlotIntersectionEngine,
        venues: VenueSelector,
        bookings: Arc<BookingCoordinator>,
        profiles: Arc<dyn ProfileDirectory>,
        notifications: Arc<dyn NotificationSink>,
        activity: Arc<dyn ActivityLog>,
        rules: BusinessRules,
    ) -> Self {
        Self {
            matches,
            availability,
            engine,
            venues,
            bookings,
            profiles,
            notifications,
            activity,
            rules,
        }
    }

    /// One side declares their availability set complete. The first
    /// submission parks the match in that side's pending state; the
    /// counterpart's submission triggers the slot search. Re-submitting
    /// from the same side is a no-op.
    pub async fn submit_availability(
        &self,
        user_id: Uuid,
        target_user_id: Uuid,
    ) -> CoreResult<SubmitOutcome> {
        let mut m = self
            .matches
            .find_between(user_id, target_user_id)
            .await?
            .ok_or_else(|| {
                CoreError::NotFound(format!(
                    "Match not found between users {} and {}",
                    user_id, target_user_id
                ))
            })?;

        let windows = self.availability.list_for(user_id).await?;
        if windows.len() < self.rules.min_availability_slots {
            return Err(CoreError::BusinessRule(format!(
                "You need to add at least {} availability slots",
                self.rules.min_availability_slots
            )));
        }

        let counterpart = m
            .counterpart_of(user_id)
            .ok_or_else(|| CoreError::Forbidden(format!("User {} is not part of this match", user_id)))?;

        if m.status == MatchStatus::Waiting {
            let pending = m.pending_state_for(user_id);
            m.transition_to(pending)?;
            self.matches.save(m.clone()).await?;

            dispatch(
                self.notifications.as_ref(),
                counterpart,
                SchedulingEvent::MatchStatusUpdate {
                    match_id: m.id,
                    status: m.status,
                    message: "The other person has submitted their availability!".to_string(),
                },
            )
            .await;
            return Ok(SubmitOutcome::Pending);
        }

        if m.status == m.pending_state_for(counterpart) {
            // Counterpart already submitted; run the engine.
            return self.run_matching(m).await;
        }

        // Own pending state repeated, or already PROPOSED/later.
        Ok(SubmitOutcome::Pending)
    }

    async fn run_matching(&self, mut m: Match) -> CoreResult<SubmitOutcome> {
        let user_a = m.user_a;
        let user_b = m.user_b;

        match self.engine.find_first_common_slot(user_a, user_b).await? {
            Some(slot) => {
                let profile_a = self.profiles.get_user(user_a).await?;
                let profile_b = self.profiles.get_user(user_b).await?;

                let venue = match self
                    .venues
                    .select(profile_a.location, profile_b.location)
                    .await
                {
                    Ok(v) => v.descriptor(),
                    Err(e) => {
                        warn!(error = %e, "venue selection failed, leaving venue open");
                        "TBD".to_string()
                    }
                };

                m.transition_to(MatchStatus::Proposed)?;
                self.matches.save(m.clone()).await?;

                let booking = self
                    .bookings
                    .propose(user_a, user_b, slot.start, slot.end, venue)
                    .await?;
                info!(match_id = %m.id, booking_id = %booking.id, start = %slot.start, "slot found, booking proposed");

                // The consumed windows have served their purpose.
                self.availability.clear_for(user_a).await?;
                self.availability.clear_for(user_b).await?;

                for user in [user_a, user_b] {
                    dispatch(
                        self.notifications.as_ref(),
                        user,
                        SchedulingEvent::BookingProposed {
                            booking_id: booking.id,
                            start: booking.start,
                            end: booking.end,
                            venue: booking.venue.clone(),
                            message: "A matching time slot has been found!".to_string(),
                        },
                    )
                    .await;
                }
                record_activity(
                    self.activity.as_ref(),
                    user_a,
                    format!("Found a matching date time with {}!", profile_b.display_name),
                    ActivityCategory::SchedulingProposed,
                )
                .await;
                record_activity(
                    self.activity.as_ref(),
                    user_b,
                    format!("Found a matching date time with {}!", profile_a.display_name),
                    ActivityCategory::SchedulingProposed,
                )
                .await;

                Ok(SubmitOutcome::Proposed(BookingView::project(
                    &booking, &profile_a, &profile_b,
                )))
            }
            None => {
                // Failure path: both sides start over.
                self.availability.clear_for(user_a).await?;
                self.availability.clear_for(user_b).await?;

                m.transition_to(MatchStatus::Waiting)?;
                self.matches.save(m.clone()).await?;
                info!(match_id = %m.id, "no common slot found, match reset");

                for user in [user_a, user_b] {
                    dispatch(
                        self.notifications.as_ref(),
                        user,
                        SchedulingEvent::MatchingFailed {
                            message: "No common time slot found. Please pick your availability again!"
                                .to_string(),
                        },
                    )
                    .await;
                }
                Ok(SubmitOutcome::Failed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use rendez_core::models::{DateBooking, UserProfile, Venue};
    use rendez_core::repository::BookingRepository;
    use rendez_shared::geo::GeoPoint;
    use rendez_shared::status::BookingStatus;
    use rendez_store::memory::{
        InMemoryActivityLog, InMemoryAvailabilityRepository, InMemoryBookingRepository,
        InMemoryMatchRepository, InMemoryProfileDirectory, RecordingNotificationSink,
        StaticVenueCatalog,
    };

    struct Fixture {
        coordinator: MatchCoordinator,
        availability: Arc<AvailabilityService>,
        matches: Arc<InMemoryMatchRepository>,
        bookings: Arc<InMemoryBookingRepository>,
        notifications: Arc<RecordingNotificationSink>,
        alice: Uuid,
        bob: Uuid,
    }

    async fn fixture_with_venues(venues: Vec<Venue>) -> Fixture {
        let windows = Arc::new(InMemoryAvailabilityRepository::new());
        let bookings = Arc::new(InMemoryBookingRepository::new());
        let matches = Arc::new(InMemoryMatchRepository::new());
        let profiles = Arc::new(InMemoryProfileDirectory::new());
        let notifications = Arc::new(RecordingNotificationSink::new());
        let activity = Arc::new(InMemoryActivityLog::new());
        let rules = BusinessRules::default();

        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        for (id, name, lat) in [(alice, "alice", 10.0), (bob, "bob", 12.0)] {
            profiles
                .upsert(UserProfile {
                    id,
                    display_name: name.to_string(),
                    email: format!("{}@example.com", name),
                    location: Some(GeoPoint::new(lat, 100.0)),
                    penalized_until: None,
                })
                .await;
        }
        matches.create(Match::new(alice, bob).unwrap()).await.unwrap();

        let availability = Arc::new(AvailabilityService::new(windows.clone(), bookings.clone()));
        let booking_coordinator = Arc::new(BookingCoordinator::new(
            bookings.clone(),
            matches.clone(),
            profiles.clone(),
            notifications.clone(),
            activity.clone(),
            rules.clone(),
        ));
        let coordinator = MatchCoordinator::new(
            matches.clone(),
            availability.clone(),
            SlotIntersectionEngine::new(windows.clone(), bookings.clone(), rules.clone()),
            VenueSelector::new(Arc::new(StaticVenueCatalog::new(venues))),
            booking_coordinator,
            profiles,
            notifications.clone(),
            activity,
            rules,
        );

        Fixture {
            coordinator,
            availability,
            matches,
            bookings,
            notifications,
            alice,
            bob,
        }
    }

    async fn fixture() -> Fixture {
        fixture_with_venues(vec![Venue {
            name: "Cafe Central".to_string(),
            address: "12 Main St".to_string(),
            location: GeoPoint::new(11.0, 100.0),
        }])
        .await
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, day, hour, 0, 0).unwrap()
    }

    async fn add_three_windows(f: &Fixture, user: Uuid) {
        for day in 1..=3 {
            f.availability
                .add(user, at(day, 18), at(day, 21))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_requires_three_windows() {
        let f = fixture().await;
        f.availability
            .add(f.alice, at(1, 18), at(1, 21))
            .await
            .unwrap();

        let err = f
            .coordinator
            .submit_availability(f.alice, f.bob)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::BusinessRule(_)));
    }

    #[tokio::test]
    async fn test_unknown_pair_is_not_found() {
        let f = fixture().await;
        let stranger = Uuid::new_v4();
        let err = f
            .coordinator
            .submit_availability(f.alice, stranger)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_first_submission_parks_pending_and_is_idempotent() {
        let f = fixture().await;
        add_three_windows(&f, f.alice).await;

        let outcome = f
            .coordinator
            .submit_availability(f.alice, f.bob)
            .await
            .unwrap();
        assert!(matches!(outcome, SubmitOutcome::Pending));

        let m = f.matches.find_between(f.alice, f.bob).await.unwrap().unwrap();
        let first_status = m.status;
        assert!(first_status == MatchStatus::PendingA || first_status == MatchStatus::PendingB);

        // Same side again: no state change, no engine run.
        let outcome = f
            .coordinator
            .submit_availability(f.alice, f.bob)
            .await
            .unwrap();
        assert!(matches!(outcome, SubmitOutcome::Pending));
        let m = f.matches.find_between(f.alice, f.bob).await.unwrap().unwrap();
        assert_eq!(m.status, first_status);

        // Counterpart was told exactly once.
        let events = f.notifications.sent_to(f.bob).await;
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, SchedulingEvent::MatchStatusUpdate { .. }))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_both_sides_submitting_creates_proposed_booking() {
        let f = fixture().await;
        add_three_windows(&f, f.alice).await;
        add_three_windows(&f, f.bob).await;

        f.coordinator
            .submit_availability(f.alice, f.bob)
            .await
            .unwrap();
        let outcome = f
            .coordinator
            .submit_availability(f.bob, f.alice)
            .await
            .unwrap();

        let view = match outcome {
            SubmitOutcome::Proposed(view) => view,
            other => panic!("expected Proposed, got {:?}", other),
        };
        assert_eq!(view.status, BookingStatus::Proposed);
        assert_eq!(view.start, at(1, 18));
        assert_eq!(view.end, at(1, 21));
        assert_eq!(view.venue, "Cafe Central - 12 Main St");

        let m = f.matches.find_between(f.alice, f.bob).await.unwrap().unwrap();
        assert_eq!(m.status, MatchStatus::Proposed);

        // Consumed windows are cleared on success.
        assert!(f.availability.list_for(f.alice).await.unwrap().is_empty());
        assert!(f.availability.list_for(f.bob).await.unwrap().is_empty());

        let proposed = f
            .notifications
            .sent_to(f.alice)
            .await
            .into_iter()
            .any(|e| matches!(e, SchedulingEvent::BookingProposed { .. }));
        assert!(proposed);
    }

    #[tokio::test]
    async fn test_disjoint_availability_resets_both_sides() {
        let f = fixture().await;
        // Alice's evenings and Bob's mornings never overlap.
        for day in 1..=3 {
            f.availability
                .add(f.alice, at(day, 18), at(day, 21))
                .await
                .unwrap();
            f.availability
                .add(f.bob, at(day, 8), at(day, 11))
                .await
                .unwrap();
        }

        f.coordinator
            .submit_availability(f.alice, f.bob)
            .await
            .unwrap();
        let outcome = f
            .coordinator
            .submit_availability(f.bob, f.alice)
            .await
            .unwrap();
        assert!(matches!(outcome, SubmitOutcome::Failed));

        let m = f.matches.find_between(f.alice, f.bob).await.unwrap().unwrap();
        assert_eq!(m.status, MatchStatus::Waiting);
        assert!(f.availability.list_for(f.alice).await.unwrap().is_empty());
        assert!(f.availability.list_for(f.bob).await.unwrap().is_empty());

        let failed = f
            .notifications
            .sent_to(f.bob)
            .await
            .into_iter()
            .any(|e| matches!(e, SchedulingEvent::MatchingFailed { .. }));
        assert!(failed);
    }

    #[tokio::test]
    async fn test_submission_after_proposal_is_noop() {
        let f = fixture().await;
        add_three_windows(&f, f.alice).await;
        add_three_windows(&f, f.bob).await;

        f.coordinator
            .submit_availability(f.alice, f.bob)
            .await
            .unwrap();
        f.coordinator
            .submit_availability(f.bob, f.alice)
            .await
            .unwrap();

        // Availability was cleared, so a late duplicate needs new windows
        // (on days clear of the proposed booking).
        for day in 10..=12 {
            f.availability
                .add(f.alice, at(day, 18), at(day, 21))
                .await
                .unwrap();
        }
        let outcome = f
            .coordinator
            .submit_availability(f.alice, f.bob)
            .await
            .unwrap();
        assert!(matches!(outcome, SubmitOutcome::Pending));

        let m = f.matches.find_between(f.alice, f.bob).await.unwrap().unwrap();
        assert_eq!(m.status, MatchStatus::Proposed);
    }

    #[tokio::test]
    async fn test_empty_catalog_falls_back_to_open_venue() {
        let f = fixture_with_venues(vec![]).await;
        add_three_windows(&f, f.alice).await;
        add_three_windows(&f, f.bob).await;

        f.coordinator
            .submit_availability(f.alice, f.bob)
            .await
            .unwrap();
        let outcome = f
            .coordinator
            .submit_availability(f.bob, f.alice)
            .await
            .unwrap();

        match outcome {
            SubmitOutcome::Proposed(view) => assert_eq!(view.venue, "TBD"),
            other => panic!("expected Proposed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_proposed_slot_never_overlaps_existing_booking() {
        let f = fixture().await;
        add_three_windows(&f, f.alice).await;
        add_three_windows(&f, f.bob).await;

        // Bob has a confirmed date with someone else over the first
        // candidate evening.
        f.bookings
            .create(DateBooking::new(
                f.bob,
                Uuid::new_v4(),
                at(1, 17),
                at(1, 22),
                "TBD".to_string(),
                BookingStatus::Confirmed,
            ))
            .await
            .unwrap();

        f.coordinator
            .submit_availability(f.alice, f.bob)
            .await
            .unwrap();
        let outcome = f
            .coordinator
            .submit_availability(f.bob, f.alice)
            .await
            .unwrap();

        match outcome {
            SubmitOutcome::Proposed(view) => {
                assert_eq!(view.start, at(2, 18));
            }
            other => panic!("expected Proposed, got {:?}", other),
        }
    }
}
