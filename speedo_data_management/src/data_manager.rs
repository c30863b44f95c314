use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use speedo_lib::{fuel_entry::FuelEntry, trip_record::TripRecord};

use crate::{database::db::LedgerDatabase, DataManagerError, DATA_DIR};

/// Aggregate fuel balance across the whole ledger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuelSummary {
    pub total_filled_l: f64,
    pub total_consumed_l: f64,
}

impl FuelSummary {
    /// Raw balance. Goes negative when consumption outpaces logged
    /// refueling; callers floor at zero for presentation only.
    pub fn fuel_remaining_l(&self) -> f64 {
        self.total_filled_l - self.total_consumed_l
    }

    pub fn estimated_range_km(&self, mileage_kmpl: f64) -> f64 {
        self.fuel_remaining_l() * mileage_kmpl
    }
}

#[derive(Clone)]
pub struct DataManager {
    pub(crate) database: LedgerDatabase,
}

/// The public interface for the fuel/trip ledger.
impl DataManager {
    pub async fn start() -> Result<Self, DataManagerError> {
        // Create data dir if it doesn't exist
        let root: PathBuf = project_root::get_project_root()
            .map_err(|_| DataManagerError::StorageUnavailable("Failed to locate project root".to_string()))?;
        let data_dir = root.join(DATA_DIR);
        if !data_dir.exists() {
            std::fs::create_dir_all(&data_dir)
                .map_err(|_| DataManagerError::StorageUnavailable(format!("Failed to create data directory: {:?}", data_dir)))?;
        }

        let database = LedgerDatabase::connect().await?;

        Ok(DataManager { database })
    }

    /// Like [`start`](Self::start) but against a specific database file.
    pub async fn start_at(path: impl AsRef<Path>) -> Result<Self, DataManagerError> {
        let database = LedgerDatabase::connect_to(path).await?;

        Ok(DataManager { database })
    }

    pub async fn add_fuel_entry(&self, amount: f64, price_per_liter: f64, timestamp: DateTime<Utc>) -> Result<FuelEntry, DataManagerError> {
        self.database.insert_fuel_entry(timestamp, amount, price_per_liter).await
    }

    pub async fn add_trip_record(&self, distance_km: f64, mileage_kmpl: f64, timestamp: DateTime<Utc>) -> Result<TripRecord, DataManagerError> {
        self.database.insert_trip_record(timestamp, distance_km, mileage_kmpl).await
    }

    /// All fuel entries, newest first.
    pub async fn get_fuel_entries(&self) -> Result<Vec<FuelEntry>, DataManagerError> {
        self.database.get_fuel_entries().await
    }

    /// All finished trips, newest first.
    pub async fn get_trip_records(&self) -> Result<Vec<TripRecord>, DataManagerError> {
        self.database.get_trip_records().await
    }

    pub async fn fuel_summary(&self) -> Result<FuelSummary, DataManagerError> {
        let total_filled_l: f64 = self.get_fuel_entries().await?
            .iter()
            .map(|entry| entry.liters)
            .sum();
        let total_consumed_l: f64 = self.get_trip_records().await?
            .iter()
            .map(|record| record.fuel_consumed_l)
            .sum();

        Ok(FuelSummary { total_filled_l, total_consumed_l })
    }
}
