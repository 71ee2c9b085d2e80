pub mod events;
pub mod geo;
pub mod status;
