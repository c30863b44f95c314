use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use const_format::concatcp;
use sqlx::{query_as, sqlite::SqliteConnectOptions, Executor, Pool, Sqlite, SqlitePool};
use speedo_lib::{fuel_entry::FuelEntry, trip_record::TripRecord};

use crate::{DataManagerError, DATABASE_PATH};

use super::constants::*;

/// Append-only sqlite store for the two ledger record kinds. No update
/// or delete paths exist; rows are immutable once written.
#[derive(Clone)]
pub struct LedgerDatabase {
    pool: Pool<Sqlite>,
}

impl LedgerDatabase {
    pub async fn connect() -> Result<Self, DataManagerError> {
        let root: PathBuf = project_root::get_project_root()
            .map_err(|_| DataManagerError::StorageUnavailable("Failed to locate project root".to_string()))?;

        Self::connect_to(root.join(DATABASE_PATH)).await
    }

    /// Opens (creating if missing) the ledger database at the given path.
    pub async fn connect_to(path: impl AsRef<Path>) -> Result<Self, DataManagerError> {
        let path = path.as_ref();
        let options = SqliteConnectOptions::new()
            .filename(path)
            .foreign_keys(true)
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options).await
            .map_err(|_| DataManagerError::StorageUnavailable(format!("Failed to open ledger database at {:?}", path)))?;

        let db = Self { pool };
        db.init().await?;

        tracing::debug!("Ledger database ready at {:?}", path);

        Ok(db)
    }

    async fn init(&self) -> Result<(), DataManagerError> {
        self.pool.execute(concatcp!("
            CREATE TABLE IF NOT EXISTS ", FUEL_ENTRIES_TABLE_NAME, "(",
                ENTRY_ID,        " INTEGER PRIMARY KEY AUTOINCREMENT,",
                TIMESTAMP,       " TIMESTAMP NOT NULL,",
                AMOUNT,          " REAL NOT NULL,",
                LITERS,          " REAL NOT NULL,",
                PRICE_PER_LITER, " REAL NOT NULL);

            CREATE TABLE IF NOT EXISTS ", TRIP_RECORDS_TABLE_NAME, "(",
                TRIP_ID,         " INTEGER PRIMARY KEY AUTOINCREMENT,",
                TIMESTAMP,       " TIMESTAMP NOT NULL,",
                DISTANCE_KM,     " REAL NOT NULL,",
                FUEL_CONSUMED_L, " REAL NOT NULL,",
                MILEAGE_KMPL,    " REAL NOT NULL)"
            )).await
            .map_err(|_| DataManagerError::StorageUnavailable("Failed to initialize ledger tables".to_string()))?;

        Ok(())
    }

    pub async fn insert_fuel_entry(&self, timestamp: DateTime<Utc>, amount: f64, price_per_liter: f64) -> Result<FuelEntry, DataManagerError> {
        let liters = amount / price_per_liter;
        let id = query_as::<_, (i64,)>(concatcp!("
            INSERT INTO ", FUEL_ENTRIES_TABLE_NAME, "(",
            ENTRY_ID, ", ", TIMESTAMP, ", ", AMOUNT, ", ", LITERS, ", ", PRICE_PER_LITER, ")
            VALUES (NULL, ?1, ?2, ?3, ?4) RETURNING ", ENTRY_ID))
                .bind(timestamp)
                .bind(amount)
                .bind(liters)
                .bind(price_per_liter)
                .fetch_one(&self.pool).await
                .map_err(|_| DataManagerError::Storage("Failed to insert fuel entry".to_string()))
                .map(|row| row.0)?;

        Ok(FuelEntry::new(id, timestamp, amount, price_per_liter))
    }

    pub async fn insert_trip_record(&self, timestamp: DateTime<Utc>, distance_km: f64, mileage_kmpl: f64) -> Result<TripRecord, DataManagerError> {
        let record = TripRecord::new(0, timestamp, distance_km, mileage_kmpl);
        let id = query_as::<_, (i64,)>(concatcp!("
            INSERT INTO ", TRIP_RECORDS_TABLE_NAME, "(",
            TRIP_ID, ", ", TIMESTAMP, ", ", DISTANCE_KM, ", ", FUEL_CONSUMED_L, ", ", MILEAGE_KMPL, ")
            VALUES (NULL, ?1, ?2, ?3, ?4) RETURNING ", TRIP_ID))
                .bind(timestamp)
                .bind(distance_km)
                .bind(record.fuel_consumed_l)
                .bind(mileage_kmpl)
                .fetch_one(&self.pool).await
                .map_err(|_| DataManagerError::Storage("Failed to insert trip record".to_string()))
                .map(|row| row.0)?;

        Ok(TripRecord { trip_id: id, ..record })
    }

    pub async fn get_fuel_entries(&self) -> Result<Vec<FuelEntry>, DataManagerError> {
        query_as::<_, FuelEntry>(concatcp!("SELECT * FROM ", FUEL_ENTRIES_TABLE_NAME, " ORDER BY ", TIMESTAMP, " DESC"))
            .fetch_all(&self.pool).await
            .map_err(|_| DataManagerError::Storage("Failed to read fuel entries".to_string()))
    }

    pub async fn get_trip_records(&self) -> Result<Vec<TripRecord>, DataManagerError> {
        query_as::<_, TripRecord>(concatcp!("SELECT * FROM ", TRIP_RECORDS_TABLE_NAME, " ORDER BY ", TIMESTAMP, " DESC"))
            .fetch_all(&self.pool).await
            .map_err(|_| DataManagerError::Storage("Failed to read trip records".to_string()))
    }
}
