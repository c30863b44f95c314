use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "sqlx")]
use sqlx::{prelude::*, sqlite::SqliteRow};

/// One recorded fuel purchase. Immutable once stored.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FuelEntry {
    pub entry_id: i64,
    pub timestamp: DateTime<Utc>,
    /// Amount paid, in currency units.
    pub amount: f64,
    pub liters: f64,
    pub price_per_liter: f64,
}

#[cfg(feature = "sqlx")]
impl FromRow<'_, SqliteRow> for FuelEntry {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        Ok(Self {
            entry_id: row.get(0),
            timestamp: row.get(1),
            amount: row.get(2),
            liters: row.get(3),
            price_per_liter: row.get(4),
        })
    }
}

impl FuelEntry {
    /// Liters are fixed at purchase time as amount / price and never
    /// re-derived later.
    pub fn new(entry_id: i64, timestamp: DateTime<Utc>, amount: f64, price_per_liter: f64) -> Self {
        Self {
            entry_id,
            timestamp,
            amount,
            liters: amount / price_per_liter,
            price_per_liter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn liters_derived_from_amount_and_price() {
        let entry = FuelEntry::new(1, Utc::now(), 500.0, 100.0);
        assert_eq!(entry.liters, 5.0);
    }
}
