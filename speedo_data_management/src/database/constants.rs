pub const FUEL_ENTRIES_TABLE_NAME: &str = "FuelEntries";
pub const ENTRY_ID: &str = "entry_id";
pub const AMOUNT: &str = "amount";
pub const LITERS: &str = "liters";
pub const PRICE_PER_LITER: &str = "price_per_liter";

pub const TRIP_RECORDS_TABLE_NAME: &str = "TripRecords";
pub const TRIP_ID: &str = "trip_id";
pub const DISTANCE_KM: &str = "distance_km";
pub const FUEL_CONSUMED_L: &str = "fuel_consumed_l";
pub const MILEAGE_KMPL: &str = "mileage_kmpl";

pub const TIMESTAMP: &str = "timestamp";
