use rand::Rng;
use rendez_core::models::Venue;
use rendez_core::ports::VenueCatalog;
use rendez_core::{CoreError, CoreResult};
use rendez_shared::geo::{haversine_km, GeoPoint};
use std::sync::Arc;
use tracing::debug;

/// Picks the meeting venue closest to the geographic midpoint of the two
/// users, falling back to a uniform random draw when either user has no
/// coordinates.
pub struct VenueSelector {
    catalog: Arc<dyn VenueCatalog>,
}

impl VenueSelector {
    pub fn new(catalog: Arc<dyn VenueCatalog>) -> Self {
        Self { catalog }
    }

    pub async fn select(
        &self,
        loc_a: Option<GeoPoint>,
        loc_b: Option<GeoPoint>,
    ) -> CoreResult<Venue> {
        let venues = self.catalog.list_venues().await?;
        if venues.is_empty() {
            return Err(CoreError::NotFound("No venues available".to_string()));
        }

        let (a, b) = match (loc_a, loc_b) {
            (Some(a), Some(b)) => (a, b),
            _ => {
                let mut venues = venues;
                let idx = rand::thread_rng().gen_range(0..venues.len());
                debug!(venue = %venues[idx].name, "missing coordinates, random venue fallback");
                return Ok(venues.swap_remove(idx));
            }
        };

        let mid = GeoPoint::midpoint(a, b);

        // First minimum wins on ties (candidate iteration order).
        let best = venues
            .into_iter()
            .map(|v| {
                let d = haversine_km(mid, v.location);
                (v, d)
            })
            .min_by(|(_, d1), (_, d2)| d1.total_cmp(d2))
            .map(|(v, _)| v);

        // Non-empty list always yields a minimum.
        best.ok_or_else(|| CoreError::NotFound("No venues available".to_string()))
    }
}
