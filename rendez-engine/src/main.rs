use chrono::{Duration, Utc};
use rendez_core::models::{UserProfile, Venue};
use rendez_engine::{Backends, Engine};
use rendez_match::coordinator::SubmitOutcome;
use rendez_shared::geo::GeoPoint;
use rendez_store::app_config::Config;
use rendez_store::memory::{
    InMemoryActivityLog, InMemoryAvailabilityRepository, InMemoryBookingRepository,
    InMemoryMatchRepository, InMemoryProfileDirectory, RecordingNotificationSink,
    StaticVenueCatalog,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Runs one seeded coordination flow against the in-memory backends:
/// register a pair, collect availability from both sides, match, confirm
/// and print the resulting booking.
#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rendez=debug,rendez_match=debug,rendez_scheduling=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().expect("Failed to load config");
    tracing::info!(?config.business_rules, "Starting Rendez engine demo");

    let profiles = Arc::new(InMemoryProfileDirectory::new());
    let engine = Engine::new(
        Backends {
            availability: Arc::new(InMemoryAvailabilityRepository::new()),
            bookings: Arc::new(InMemoryBookingRepository::new()),
            matches: Arc::new(InMemoryMatchRepository::new()),
            profiles: profiles.clone(),
            venues: Arc::new(StaticVenueCatalog::new(vec![
                Venue {
                    name: "Cafe Central".to_string(),
                    address: "12 Main St".to_string(),
                    location: GeoPoint::new(52.520, 13.405),
                },
                Venue {
                    name: "Harbor Bar".to_string(),
                    address: "3 Dock Rd".to_string(),
                    location: GeoPoint::new(52.530, 13.410),
                },
            ])),
            notifications: Arc::new(RecordingNotificationSink::new()),
            activity: Arc::new(InMemoryActivityLog::new()),
        },
        config.business_rules,
    );

    let alice = uuid::Uuid::new_v4();
    let bob = uuid::Uuid::new_v4();
    for (id, name, lat) in [(alice, "Alice", 52.52), (bob, "Bob", 52.53)] {
        profiles
            .upsert(UserProfile {
                id,
                display_name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                location: Some(GeoPoint::new(lat, 13.40)),
                penalized_until: None,
            })
            .await;
    }

    engine.register_match(alice, bob).await.expect("register match");

    let base = Utc::now() + Duration::days(1);
    for day in 0..3 {
        let evening = base + Duration::days(day);
        engine
            .add_availability(alice, evening, evening + Duration::hours(3))
            .await
            .expect("alice availability");
        engine
            .add_availability(bob, evening + Duration::hours(1), evening + Duration::hours(4))
            .await
            .expect("bob availability");
    }

    engine.submit_availability(alice, bob).await.expect("alice submit");
    let outcome = engine.submit_availability(bob, alice).await.expect("bob submit");

    let booking = match outcome {
        SubmitOutcome::Proposed(view) => view,
        other => {
            tracing::error!(?other, "expected a proposed booking");
            return;
        }
    };
    tracing::info!(booking_id = %booking.id, venue = %booking.venue, "booking proposed");

    engine.confirm_booking(booking.id, alice).await.expect("alice confirm");
    let confirmed = engine.confirm_booking(booking.id, bob).await.expect("bob confirm");

    println!(
        "{}",
        serde_json::to_string_pretty(&confirmed).expect("serialize booking")
    );
    tracing::info!(
        can_chat = engine.can_chat(alice, bob).await.expect("chat check"),
        "date confirmed"
    );
}
