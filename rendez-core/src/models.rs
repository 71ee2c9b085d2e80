use crate::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use rendez_shared::geo::GeoPoint;
use rendez_shared::status::{BookingStatus, MatchStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Profile fields the engine reads. Owned by the external profile service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub display_name: String,
    pub email: String,
    pub location: Option<GeoPoint>,
    pub penalized_until: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Venue {
    pub name: String,
    pub address: String,
    pub location: GeoPoint,
}

impl Venue {
    /// Human-readable descriptor stored on bookings.
    pub fn descriptor(&self) -> String {
        format!("{} - {}", self.name, self.address)
    }
}

/// A user-declared interval during which they are free to meet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl AvailabilityWindow {
    pub fn new(user_id: Uuid, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            start,
            end,
        }
    }

    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && self.end > start
    }
}

/// A persisted record of mutual interest between two users, carrying the
/// scheduling-coordination status. `user_a` always holds the smaller id so
/// an unordered pair maps to exactly one row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: Uuid,
    pub user_a: Uuid,
    pub user_b: Uuid,
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
}

impl Match {
    pub fn new(u1: Uuid, u2: Uuid) -> CoreResult<Self> {
        if u1 == u2 {
            return Err(CoreError::BusinessRule(
                "Cannot match a user with themselves".to_string(),
            ));
        }
        let (user_a, user_b) = normalize_pair(u1, u2);
        Ok(Self {
            id: Uuid::new_v4(),
            user_a,
            user_b,
            status: MatchStatus::Waiting,
            created_at: Utc::now(),
        })
    }

    pub fn is_member(&self, user_id: Uuid) -> bool {
        self.user_a == user_id || self.user_b == user_id
    }

    pub fn counterpart_of(&self, user_id: Uuid) -> Option<Uuid> {
        if user_id == self.user_a {
            Some(self.user_b)
        } else if user_id == self.user_b {
            Some(self.user_a)
        } else {
            None
        }
    }

    /// Pending state meaning "this member has submitted availability".
    pub fn pending_state_for(&self, user_id: Uuid) -> MatchStatus {
        if user_id == self.user_a {
            MatchStatus::PendingA
        } else {
            MatchStatus::PendingB
        }
    }

    /// Status mutation validated against the transition table.
    pub fn transition_to(&mut self, to: MatchStatus) -> CoreResult<()> {
        if !self.status.allows_transition(to) {
            return Err(CoreError::InvalidTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        self.status = to;
        Ok(())
    }
}

/// Normalize an unordered user pair into canonical (smaller, larger) order.
pub fn normalize_pair(u1: Uuid, u2: Uuid) -> (Uuid, Uuid) {
    if u1 < u2 {
        (u1, u2)
    } else {
        (u2, u1)
    }
}

/// Which side of a booking a user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartySide {
    Requester,
    Recipient,
}

/// The concrete proposed/confirmed meeting record between two users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateBooking {
    pub id: Uuid,
    pub requester: Uuid,
    pub recipient: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub venue: String,
    pub status: BookingStatus,
    pub requester_confirmed: bool,
    pub recipient_confirmed: bool,
    pub requester_attended: Option<bool>,
    pub recipient_attended: Option<bool>,
    pub requester_wants_contact: Option<bool>,
    pub recipient_wants_contact: Option<bool>,
    pub contact_exchanged: bool,
    pub created_at: DateTime<Utc>,
}

impl DateBooking {
    pub fn new(
        requester: Uuid,
        recipient: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        venue: String,
        status: BookingStatus,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            requester,
            recipient,
            start,
            end,
            venue,
            status,
            requester_confirmed: false,
            recipient_confirmed: false,
            requester_attended: None,
            recipient_attended: None,
            requester_wants_contact: None,
            recipient_wants_contact: None,
            contact_exchanged: false,
            created_at: Utc::now(),
        }
    }

    pub fn party(&self, user_id: Uuid) -> Option<PartySide> {
        if user_id == self.requester {
            Some(PartySide::Requester)
        } else if user_id == self.recipient {
            Some(PartySide::Recipient)
        } else {
            None
        }
    }

    pub fn involves_pair(&self, u1: Uuid, u2: Uuid) -> bool {
        (self.requester == u1 && self.recipient == u2)
            || (self.requester == u2 && self.recipient == u1)
    }

    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && self.end > start
    }

    pub fn both_confirmed(&self) -> bool {
        self.requester_confirmed && self.recipient_confirmed
    }

    pub fn both_attended(&self) -> bool {
        self.requester_attended == Some(true) && self.recipient_attended == Some(true)
    }

    pub fn both_want_contact(&self) -> bool {
        self.requester_wants_contact == Some(true) && self.recipient_wants_contact == Some(true)
    }

    /// Status mutation validated against the transition table.
    pub fn transition_to(&mut self, to: BookingStatus) -> CoreResult<()> {
        if !self.status.allows_transition(to) {
            return Err(CoreError::InvalidTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        self.status = to;
        Ok(())
    }
}

/// User-facing projection of a booking. Contact details are only populated
/// after mutual post-date consent (`contact_exchanged`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingView {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub requester_name: String,
    pub recipient_id: Uuid,
    pub recipient_name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub venue: String,
    pub status: BookingStatus,
    pub requester_confirmed: bool,
    pub recipient_confirmed: bool,
    pub requester_attended: Option<bool>,
    pub recipient_attended: Option<bool>,
    pub requester_wants_contact: Option<bool>,
    pub recipient_wants_contact: Option<bool>,
    pub contact_exchanged: bool,
    pub requester_email: Option<String>,
    pub recipient_email: Option<String>,
}

impl BookingView {
    pub fn project(
        booking: &DateBooking,
        requester: &UserProfile,
        recipient: &UserProfile,
    ) -> Self {
        let (requester_email, recipient_email) = if booking.contact_exchanged {
            (
                Some(requester.email.clone()),
                Some(recipient.email.clone()),
            )
        } else {
            (None, None)
        };

        Self {
            id: booking.id,
            requester_id: booking.requester,
            requester_name: requester.display_name.clone(),
            recipient_id: booking.recipient,
            recipient_name: recipient.display_name.clone(),
            start: booking.start,
            end: booking.end,
            venue: booking.venue.clone(),
            status: booking.status,
            requester_confirmed: booking.requester_confirmed,
            recipient_confirmed: booking.recipient_confirmed,
            requester_attended: booking.requester_attended,
            recipient_attended: booking.recipient_attended,
            requester_wants_contact: booking.requester_wants_contact,
            recipient_wants_contact: booking.recipient_wants_contact,
            contact_exchanged: booking.contact_exchanged,
            requester_email,
            recipient_email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn profile(name: &str) -> UserProfile {
        UserProfile {
            id: Uuid::new_v4(),
            display_name: name.to_string(),
            email: format!("{}@example.com", name),
            location: None,
            penalized_until: None,
        }
    }

    #[test]
    fn test_match_pair_is_normalized() {
        let u1 = Uuid::new_v4();
        let u2 = Uuid::new_v4();

        let m1 = Match::new(u1, u2).unwrap();
        let m2 = Match::new(u2, u1).unwrap();

        assert_eq!(m1.user_a, m2.user_a);
        assert_eq!(m1.user_b, m2.user_b);
        assert!(m1.user_a < m1.user_b);
    }

    #[test]
    fn test_match_with_self_rejected() {
        let u = Uuid::new_v4();
        assert!(matches!(
            Match::new(u, u),
            Err(crate::CoreError::BusinessRule(_))
        ));
    }

    #[test]
    fn test_match_invalid_transition() {
        let mut m = Match::new(Uuid::new_v4(), Uuid::new_v4()).unwrap();
        let err = m.transition_to(MatchStatus::Proposed).unwrap_err();
        assert!(matches!(err, crate::CoreError::InvalidTransition { .. }));
        assert_eq!(m.status, MatchStatus::Waiting);
    }

    #[test]
    fn test_booking_overlap_half_open() {
        let start = Utc::now();
        let end = start + Duration::hours(2);
        let b = DateBooking::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            start,
            end,
            "TBD".to_string(),
            BookingStatus::Pending,
        );

        // Touching intervals do not overlap.
        assert!(!b.overlaps(end, end + Duration::hours(1)));
        assert!(!b.overlaps(start - Duration::hours(1), start));
        assert!(b.overlaps(start + Duration::minutes(30), end + Duration::hours(1)));
    }

    #[test]
    fn test_view_withholds_emails_until_exchange() {
        let requester = profile("alice");
        let recipient = profile("bob");
        let mut booking = DateBooking::new(
            requester.id,
            recipient.id,
            Utc::now(),
            Utc::now() + Duration::hours(2),
            "Cafe Central - 12 Main St".to_string(),
            BookingStatus::Confirmed,
        );

        let view = BookingView::project(&booking, &requester, &recipient);
        assert!(view.requester_email.is_none());
        assert!(view.recipient_email.is_none());

        booking.contact_exchanged = true;
        let view = BookingView::project(&booking, &requester, &recipient);
        assert_eq!(view.requester_email.as_deref(), Some("alice@example.com"));
        assert_eq!(view.recipient_email.as_deref(), Some("bob@example.com"));
    }
}
