pub mod availability;
pub mod slots;
pub mod venue;
