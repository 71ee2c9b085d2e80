pub mod booking;
pub mod coordinator;
pub mod lock;

use rendez_core::ports::{ActivityLog, NotificationSink};
use rendez_shared::events::{ActivityCategory, SchedulingEvent};
use tracing::warn;
use uuid::Uuid;

/// Fire-and-forget notification dispatch. Failures never fail the state
/// transition that triggered the event.
pub(crate) async fn dispatch(sink: &dyn NotificationSink, user_id: Uuid, event: SchedulingEvent) {
    if let Err(e) = sink.notify(user_id, event).await {
        warn!(%user_id, error = %e, "failed to dispatch scheduling event");
    }
}

/// Best-effort activity feed entry, same swallowing rule as notifications.
pub(crate) async fn record_activity(
    log: &dyn ActivityLog,
    user_id: Uuid,
    message: String,
    category: ActivityCategory,
) {
    if let Err(e) = log.record(user_id, &message, category).await {
        warn!(%user_id, error = %e, "failed to record activity entry");
    }
}
