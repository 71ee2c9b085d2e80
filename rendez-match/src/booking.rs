use crate::{dispatch, record_activity};
use chrono::{DateTime, Duration, Utc};
use rendez_core::models::{BookingView, DateBooking, PartySide};
use rendez_core::ports::{ActivityLog, NotificationSink, ProfileDirectory};
use rendez_core::repository::{BookingRepository, MatchRepository};
use rendez_core::{CoreError, CoreResult};
use rendez_shared::events::{ActivityCategory, SchedulingEvent};
use rendez_shared::status::{BookingStatus, MatchStatus};
use rendez_store::app_config::BusinessRules;
use std::sync::Arc;
use uuid::Uuid;

/// Owns the DateBooking lifecycle: creation (manual invitation or
/// engine proposal), dual venue confirmation, post-date attendance and
/// contact-exchange gating, and cancellation with penalty enforcement.
pub struct BookingCoordinator {
    bookings: Arc<dyn BookingRepository>,
    matches: Arc<dyn MatchRepository>,
    profiles: Arc<dyn ProfileDirectory>,
    notifications: Arc<dyn NotificationSink>,
    activity: Arc<dyn ActivityLog>,
    rules: BusinessRules,
}

impl BookingCoordinator {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        matches: Arc<dyn MatchRepository>,
        profiles: Arc<dyn ProfileDirectory>,
        notifications: Arc<dyn NotificationSink>,
        activity: Arc<dyn ActivityLog>,
        rules: BusinessRules,
    ) -> Self {
        Self {
            bookings,
            matches,
            profiles,
            notifications,
            activity,
            rules,
        }
    }

    /// Manual date invitation, outside the automated matching flow.
    pub async fn create_manual(
        &self,
        requester_id: Uuid,
        recipient_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> CoreResult<BookingView> {
        if start >= end {
            return Err(CoreError::BusinessRule(
                "Booking must end after it starts".to_string(),
            ));
        }
        if requester_id == recipient_id {
            return Err(CoreError::BusinessRule(
                "Cannot book a date with yourself".to_string(),
            ));
        }

        let requester = self.profiles.get_user(requester_id).await?;
        let recipient = self.profiles.get_user(recipient_id).await?;

        if !self
            .bookings
            .find_live_overlapping(requester_id, start, end)
            .await?
            .is_empty()
        {
            return Err(CoreError::Conflict(
                "You already have another booking during this time slot".to_string(),
            ));
        }
        if !self
            .bookings
            .find_live_overlapping(recipient_id, start, end)
            .await?
            .is_empty()
        {
            return Err(CoreError::Conflict(
                "The other person already has another booking during this time slot".to_string(),
            ));
        }

        let booking = DateBooking::new(
            requester_id,
            recipient_id,
            start,
            end,
            "TBD".to_string(),
            BookingStatus::Pending,
        );
        self.bookings.create(booking.clone()).await?;

        record_activity(
            self.activity.as_ref(),
            recipient_id,
            format!("{} just sent you a date invitation!", requester.display_name),
            ActivityCategory::BookingRequest,
        )
        .await;
        dispatch(
            self.notifications.as_ref(),
            recipient_id,
            SchedulingEvent::BookingUpdate {
                booking_id: booking.id,
                status: booking.status,
                message: format!("{} sent you a date invitation", requester.display_name),
            },
        )
        .await;

        Ok(BookingView::project(&booking, &requester, &recipient))
    }

    /// Engine-generated proposal; the matching flow has already validated
    /// the slot against both calendars under the pair lock.
    pub async fn propose(
        &self,
        requester_id: Uuid,
        recipient_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        venue: String,
    ) -> CoreResult<DateBooking> {
        let booking = DateBooking::new(
            requester_id,
            recipient_id,
            start,
            end,
            venue,
            BookingStatus::Proposed,
        );
        self.bookings.create(booking.clone()).await?;
        Ok(booking)
    }

    /// Records one party's venue confirmation. When both sides have
    /// confirmed, the booking locks in and the owning match moves to
    /// SCHEDULED. A repeat confirm on an already-confirmed booking is a
    /// no-op returning the current state.
    pub async fn confirm(&self, booking_id: Uuid, user_id: Uuid) -> CoreResult<BookingView> {
        let mut booking = self.get_entity(booking_id).await?;
        let side = booking
            .party(user_id)
            .ok_or_else(|| self.not_a_party(user_id, booking_id))?;

        if booking.status == BookingStatus::Confirmed {
            return self.view_of(&booking).await;
        }
        if booking.status == BookingStatus::Cancelled {
            return Err(CoreError::InvalidTransition {
                from: booking.status.to_string(),
                to: BookingStatus::Confirmed.to_string(),
            });
        }

        match side {
            PartySide::Requester => booking.requester_confirmed = true,
            PartySide::Recipient => booking.recipient_confirmed = true,
        }

        let completed = booking.both_confirmed();
        if completed {
            booking.transition_to(BookingStatus::Confirmed)?;
        }
        // Persist the booking before touching the match so a failed save
        // cannot leave the two records disagreeing.
        self.bookings.save(booking.clone()).await?;
        if completed {
            self.update_match_status(booking.requester, booking.recipient, MatchStatus::Scheduled)
                .await?;
        }

        let requester = self.profiles.get_user(booking.requester).await?;
        let recipient = self.profiles.get_user(booking.recipient).await?;

        let message = if completed {
            "Date confirmed!"
        } else {
            "The other person has confirmed the venue!"
        };
        for party in [booking.requester, booking.recipient] {
            dispatch(
                self.notifications.as_ref(),
                party,
                SchedulingEvent::BookingUpdate {
                    booking_id: booking.id,
                    status: booking.status,
                    message: message.to_string(),
                },
            )
            .await;
        }

        if completed {
            record_activity(
                self.activity.as_ref(),
                booking.requester,
                format!(
                    "The date with {} has been confirmed!",
                    recipient.display_name
                ),
                ActivityCategory::SchedulingConfirmed,
            )
            .await;
            record_activity(
                self.activity.as_ref(),
                booking.recipient,
                format!(
                    "The date with {} has been confirmed!",
                    requester.display_name
                ),
                ActivityCategory::SchedulingConfirmed,
            )
            .await;
        } else {
            // Only the counterpart learns something new here.
            let other = if user_id == booking.requester {
                booking.recipient
            } else {
                booking.requester
            };
            record_activity(
                self.activity.as_ref(),
                other,
                "The other person has confirmed the dating venue!".to_string(),
                ActivityCategory::SchedulingUpdate,
            )
            .await;
        }

        Ok(BookingView::project(&booking, &requester, &recipient))
    }

    /// Post-date feedback. Contact interest only counts for someone who
    /// actually attended; contact details unlock only after both parties
    /// attended and both want contact.
    pub async fn submit_feedback(
        &self,
        booking_id: Uuid,
        user_id: Uuid,
        attended: bool,
        wants_contact: bool,
    ) -> CoreResult<BookingView> {
        let mut booking = self.get_entity(booking_id).await?;
        let side = booking
            .party(user_id)
            .ok_or_else(|| self.not_a_party(user_id, booking_id))?;

        match side {
            PartySide::Requester => {
                booking.requester_attended = Some(attended);
                booking.requester_wants_contact = Some(attended && wants_contact);
            }
            PartySide::Recipient => {
                booking.recipient_attended = Some(attended);
                booking.recipient_wants_contact = Some(attended && wants_contact);
            }
        }

        let newly_exchanged =
            !booking.contact_exchanged && booking.both_attended() && booking.both_want_contact();
        if newly_exchanged {
            booking.contact_exchanged = true;
        }
        self.bookings.save(booking.clone()).await?;

        let requester = self.profiles.get_user(booking.requester).await?;
        let recipient = self.profiles.get_user(booking.recipient).await?;

        if newly_exchanged {
            for (party, other_name) in [
                (booking.requester, &recipient.display_name),
                (booking.recipient, &requester.display_name),
            ] {
                dispatch(
                    self.notifications.as_ref(),
                    party,
                    SchedulingEvent::ContactExchanged {
                        booking_id: booking.id,
                    },
                )
                .await;
                record_activity(
                    self.activity.as_ref(),
                    party,
                    format!(
                        "Mutual interest! You and {} have exchanged contact info.",
                        other_name
                    ),
                    ActivityCategory::ContactExchanged,
                )
                .await;
            }
        }

        Ok(BookingView::project(&booking, &requester, &recipient))
    }

    /// Cancellation with anti-flaker protection: cancelling a CONFIRMED
    /// date sets a visibility penalty on the canceller. The owning match
    /// drops back to WAITING so the pair can reschedule.
    pub async fn cancel(&self, booking_id: Uuid, cancelling_user_id: Uuid) -> CoreResult<()> {
        let mut booking = self.get_entity(booking_id).await?;
        booking
            .party(cancelling_user_id)
            .ok_or_else(|| self.not_a_party(cancelling_user_id, booking_id))?;

        let was_confirmed = booking.status == BookingStatus::Confirmed;
        booking.transition_to(BookingStatus::Cancelled)?;

        if was_confirmed {
            let until = Utc::now() + Duration::hours(self.rules.penalty_hours);
            self.profiles
                .set_penalized_until(cancelling_user_id, until)
                .await?;
            record_activity(
                self.activity.as_ref(),
                cancelling_user_id,
                format!(
                    "You cancelled a confirmed date. As a penalty, you won't see new profiles for {}h.",
                    self.rules.penalty_hours
                ),
                ActivityCategory::PenaltyNotice,
            )
            .await;
            dispatch(
                self.notifications.as_ref(),
                cancelling_user_id,
                SchedulingEvent::PenaltyNotice { until },
            )
            .await;
        }

        // Booking first, match second; see confirm.
        self.bookings.save(booking.clone()).await?;
        self.update_match_status(booking.requester, booking.recipient, MatchStatus::Waiting)
            .await?;

        let requester = self.profiles.get_user(booking.requester).await?;
        let recipient = self.profiles.get_user(booking.recipient).await?;

        for (party, other_name) in [
            (booking.requester, &recipient.display_name),
            (booking.recipient, &requester.display_name),
        ] {
            dispatch(
                self.notifications.as_ref(),
                party,
                SchedulingEvent::BookingUpdate {
                    booking_id: booking.id,
                    status: BookingStatus::Cancelled,
                    message: "This booking has been cancelled. Please pick another time slot!"
                        .to_string(),
                },
            )
            .await;
            record_activity(
                self.activity.as_ref(),
                party,
                format!("The booking with {} has been cancelled.", other_name),
                ActivityCategory::SchedulingCancelled,
            )
            .await;
        }

        Ok(())
    }

    /// The active date agreement between two users: the latest CONFIRMED
    /// booking, else a PROPOSED one, else none.
    pub async fn get_active(&self, u1: Uuid, u2: Uuid) -> CoreResult<Option<BookingView>> {
        match self.get_active_entity(u1, u2).await? {
            Some(booking) => Ok(Some(self.view_of(&booking).await?)),
            None => Ok(None),
        }
    }

    /// Chat unlock: only around a confirmed date (a few hours before the
    /// start until shortly after it).
    pub async fn can_chat(&self, u1: Uuid, u2: Uuid) -> CoreResult<bool> {
        let booking = match self.get_active_entity(u1, u2).await? {
            Some(b) if b.status == BookingStatus::Confirmed => b,
            _ => return Ok(false),
        };

        let now = Utc::now();
        let opens = booking.start - Duration::hours(self.rules.chat_opens_before_hours);
        let closes = booking.start + Duration::hours(self.rules.chat_closes_after_hours);
        Ok(now >= opens && now < closes)
    }

    /// All of a user's bookings with cancelled ones filtered out; history
    /// rows are retained in the store but hidden from the listing.
    pub async fn list_for_user(&self, user_id: Uuid) -> CoreResult<Vec<BookingView>> {
        let mut bookings: Vec<DateBooking> = self
            .bookings
            .list_for_user(user_id)
            .await?
            .into_iter()
            .filter(|b| b.status != BookingStatus::Cancelled)
            .collect();
        bookings.sort_by_key(|b| b.start);

        let mut views = Vec::with_capacity(bookings.len());
        for booking in &bookings {
            views.push(self.view_of(booking).await?);
        }
        Ok(views)
    }

    pub async fn get_booking(&self, booking_id: Uuid) -> CoreResult<BookingView> {
        let booking = self.get_entity(booking_id).await?;
        self.view_of(&booking).await
    }

    async fn get_entity(&self, booking_id: Uuid) -> CoreResult<DateBooking> {
        self.bookings
            .get(booking_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Booking {} not found", booking_id)))
    }

    async fn get_active_entity(&self, u1: Uuid, u2: Uuid) -> CoreResult<Option<DateBooking>> {
        let mut between = self.bookings.find_between(u1, u2).await?;
        between.sort_by(|a, b| b.start.cmp(&a.start));

        let confirmed = between
            .iter()
            .find(|b| b.status == BookingStatus::Confirmed);
        if let Some(b) = confirmed {
            return Ok(Some(b.clone()));
        }
        Ok(between
            .into_iter()
            .find(|b| b.status == BookingStatus::Proposed))
    }

    async fn view_of(&self, booking: &DateBooking) -> CoreResult<BookingView> {
        let requester = self.profiles.get_user(booking.requester).await?;
        let recipient = self.profiles.get_user(booking.recipient).await?;
        Ok(BookingView::project(booking, &requester, &recipient))
    }

    async fn update_match_status(
        &self,
        u1: Uuid,
        u2: Uuid,
        status: MatchStatus,
    ) -> CoreResult<()> {
        if let Some(mut m) = self.matches.find_between(u1, u2).await? {
            m.transition_to(status)?;
            self.matches.save(m).await?;
        }
        Ok(())
    }

    fn not_a_party(&self, user_id: Uuid, booking_id: Uuid) -> CoreError {
        CoreError::Forbidden(format!(
            "User {} is not part of booking {}",
            user_id, booking_id
        ))
    }
}
