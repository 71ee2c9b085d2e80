use chrono::{DateTime, Utc};
use rendez_core::repository::{AvailabilityRepository, BookingRepository};
use rendez_core::CoreResult;
use rendez_store::app_config::BusinessRules;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// A concrete shared interval proposed as the meeting time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommonSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Finds the first valid shared window between two users' availabilities.
///
/// The scan is a deterministic double iteration: both lists sorted
/// ascending by start, outer loop over user A, inner loop over user B.
/// The first surviving candidate in that order wins, which means the
/// tie-break is "earliest window of A combined with A's earliest
/// compatible window of B" rather than the globally earliest start across
/// all pairs. This is intentional, observable behavior; do not "fix" it
/// to global-earliest.
pub struct SlotIntersectionEngine {
    windows: Arc<dyn AvailabilityRepository>,
    bookings: Arc<dyn BookingRepository>,
    rules: BusinessRules,
}

impl SlotIntersectionEngine {
    pub fn new(
        windows: Arc<dyn AvailabilityRepository>,
        bookings: Arc<dyn BookingRepository>,
        rules: BusinessRules,
    ) -> Self {
        Self {
            windows,
            bookings,
            rules,
        }
    }

    pub async fn find_first_common_slot(
        &self,
        user_a: Uuid,
        user_b: Uuid,
    ) -> CoreResult<Option<CommonSlot>> {
        let mut list_a = self.windows.list_for(user_a).await?;
        let mut list_b = self.windows.list_for(user_b).await?;

        list_a.sort_by_key(|w| w.start);
        list_b.sort_by_key(|w| w.start);

        for a in &list_a {
            for b in &list_b {
                // Same-day constraint: the meeting must fit one calendar day.
                if a.start.date_naive() != b.start.date_naive() {
                    continue;
                }

                let start = a.start.max(b.start);
                let end = a.end.min(b.end);
                if start >= end {
                    continue;
                }

                let minutes = (end - start).num_minutes();
                if minutes < self.rules.min_slot_minutes {
                    continue;
                }

                // Re-validate against live bookings; availability may be
                // stale by the time both sides have submitted.
                let busy_a = self
                    .bookings
                    .find_live_overlapping(user_a, start, end)
                    .await?;
                let busy_b = self
                    .bookings
                    .find_live_overlapping(user_b, start, end)
                    .await?;
                if !busy_a.is_empty() || !busy_b.is_empty() {
                    debug!(%user_a, %user_b, %start, "candidate slot discarded: existing booking");
                    continue;
                }

                return Ok(Some(CommonSlot { start, end }));
            }
        }

        Ok(None)
    }
}
