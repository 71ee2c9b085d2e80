use crate::status::{BookingStatus, MatchStatus};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Real-time notification payloads pushed to users as the coordination
/// state changes. Delivery is best-effort; the transport lives outside
/// this engine.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchedulingEvent {
    MatchStatusUpdate {
        match_id: Uuid,
        status: MatchStatus,
        message: String,
    },
    BookingProposed {
        booking_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        venue: String,
        message: String,
    },
    BookingUpdate {
        booking_id: Uuid,
        status: BookingStatus,
        message: String,
    },
    MatchingFailed {
        message: String,
    },
    ContactExchanged {
        booking_id: Uuid,
    },
    PenaltyNotice {
        until: DateTime<Utc>,
    },
}

/// Category tag for activity-feed entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityCategory {
    BookingRequest,
    SchedulingProposed,
    SchedulingUpdate,
    SchedulingConfirmed,
    SchedulingCancelled,
    ContactExchanged,
    PenaltyNotice,
}
