pub mod fuel_entry;
pub mod position;
pub mod session;
pub mod trip_record;

/// Fixed kilometers-per-liter figure used for all fuel estimates.
/// Persisted trip records carry the value that was actually in effect,
/// so changing this does not rewrite history.
pub const DEFAULT_MILEAGE_KMPL: f64 = 40.0;
