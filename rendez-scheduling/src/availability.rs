use chrono::{DateTime, Utc};
use rendez_core::models::AvailabilityWindow;
use rendez_core::repository::{AvailabilityRepository, BookingRepository};
use rendez_core::{CoreError, CoreResult};
use std::sync::Arc;
use uuid::Uuid;

/// Holds each user's proposed free-time windows, with conflict validation
/// on insert: a new window may overlap neither an existing window nor a
/// live booking of the same user.
pub struct AvailabilityService {
    windows: Arc<dyn AvailabilityRepository>,
    bookings: Arc<dyn BookingRepository>,
}

impl AvailabilityService {
    pub fn new(
        windows: Arc<dyn AvailabilityRepository>,
        bookings: Arc<dyn BookingRepository>,
    ) -> Self {
        Self { windows, bookings }
    }

    pub async fn add(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> CoreResult<AvailabilityWindow> {
        if start >= end {
            return Err(CoreError::BusinessRule(
                "Availability must end after it starts".to_string(),
            ));
        }

        if !self
            .bookings
            .find_live_overlapping(user_id, start, end)
            .await?
            .is_empty()
        {
            return Err(CoreError::Conflict(
                "You already have a booking during this time slot".to_string(),
            ));
        }

        if !self
            .windows
            .find_overlapping(user_id, start, end)
            .await?
            .is_empty()
        {
            return Err(CoreError::Conflict(
                "This slot overlaps with your other availability slots".to_string(),
            ));
        }

        let window = AvailabilityWindow::new(user_id, start, end);
        self.windows.save(window.clone()).await?;
        Ok(window)
    }

    pub async fn list_for(&self, user_id: Uuid) -> CoreResult<Vec<AvailabilityWindow>> {
        self.windows.list_for(user_id).await
    }

    pub async fn remove(&self, window_id: Uuid) -> CoreResult<()> {
        self.windows.remove(window_id).await
    }

    pub async fn clear_for(&self, user_id: Uuid) -> CoreResult<()> {
        self.windows.clear_for(user_id).await
    }
}
