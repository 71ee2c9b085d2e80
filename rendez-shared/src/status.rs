use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordination lifecycle of a match:
/// - Waiting: no one submitted slots yet.
/// - PendingA / PendingB: that side has submitted, waiting for the other.
/// - Proposed: engine found a slot, waiting for venue confirmation.
/// - Scheduled: date confirmed by both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Waiting,
    PendingA,
    PendingB,
    Proposed,
    Scheduled,
    Completed,
    Cancelled,
}

impl MatchStatus {
    /// Closed transition table. Self-transitions are allowed as no-ops so
    /// that "reset to Waiting" is valid regardless of where the match is.
    pub fn allows_transition(self, to: MatchStatus) -> bool {
        use MatchStatus::*;
        if self == to {
            return true;
        }
        matches!(
            (self, to),
            (Waiting, PendingA)
                | (Waiting, PendingB)
                | (PendingA, Proposed)
                | (PendingA, Waiting)
                | (PendingB, Proposed)
                | (PendingB, Waiting)
                | (Proposed, Scheduled)
                | (Proposed, Waiting)
                | (Scheduled, Waiting)
                | (Scheduled, Completed)
                // Manual invitations confirm without the availability dance.
                | (Waiting, Scheduled)
                | (PendingA, Scheduled)
                | (PendingB, Scheduled)
        )
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MatchStatus::Waiting => "WAITING",
            MatchStatus::PendingA => "PENDING_A",
            MatchStatus::PendingB => "PENDING_B",
            MatchStatus::Proposed => "PROPOSED",
            MatchStatus::Scheduled => "SCHEDULED",
            MatchStatus::Completed => "COMPLETED",
            MatchStatus::Cancelled => "CANCELLED",
        };
        write!(f, "{}", s)
    }
}

/// Booking lifecycle:
/// - Pending: manual invitation, awaiting both confirmations.
/// - Proposed: engine-generated, awaiting both confirmations.
/// - Confirmed: locked in.
/// - Cancelled: terminal, retained for history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Proposed,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn allows_transition(self, to: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, to),
            (Pending, Confirmed)
                | (Proposed, Confirmed)
                | (Pending, Cancelled)
                | (Proposed, Cancelled)
                | (Confirmed, Cancelled)
        )
    }

    /// A booking in one of these states blocks the time window for both
    /// parties (double-booking guard).
    pub fn is_live(self) -> bool {
        matches!(
            self,
            BookingStatus::Pending | BookingStatus::Proposed | BookingStatus::Confirmed
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Proposed => "PROPOSED",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_transition_table() {
        assert!(MatchStatus::Waiting.allows_transition(MatchStatus::PendingA));
        assert!(MatchStatus::PendingB.allows_transition(MatchStatus::Proposed));
        assert!(MatchStatus::Proposed.allows_transition(MatchStatus::Waiting));
        assert!(MatchStatus::Scheduled.allows_transition(MatchStatus::Waiting));

        assert!(!MatchStatus::Waiting.allows_transition(MatchStatus::Proposed));
        assert!(!MatchStatus::Cancelled.allows_transition(MatchStatus::Waiting));
        assert!(!MatchStatus::Completed.allows_transition(MatchStatus::Scheduled));
    }

    #[test]
    fn test_booking_transition_table() {
        assert!(BookingStatus::Proposed.allows_transition(BookingStatus::Confirmed));
        assert!(BookingStatus::Confirmed.allows_transition(BookingStatus::Cancelled));
        assert!(!BookingStatus::Cancelled.allows_transition(BookingStatus::Confirmed));
        assert!(!BookingStatus::Confirmed.allows_transition(BookingStatus::Proposed));
    }

    #[test]
    fn test_live_statuses() {
        assert!(BookingStatus::Pending.is_live());
        assert!(BookingStatus::Proposed.is_live());
        assert!(BookingStatus::Confirmed.is_live());
        assert!(!BookingStatus::Cancelled.is_live());
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&MatchStatus::PendingA).unwrap();
        assert_eq!(json, "\"PENDING_A\"");
        let json = serde_json::to_string(&BookingStatus::Confirmed).unwrap();
        assert_eq!(json, "\"CONFIRMED\"");
    }
}
