use const_format::concatcp;
use thiserror::Error;

pub mod database;
mod data_manager;

pub use data_manager::*;

pub const DATA_DIR: &str = "data/";
pub const DATABASE_PATH: &str = concatcp!(DATA_DIR, "speedo.db");

#[derive(Debug, Error)]
pub enum DataManagerError {
    /// The backing store could not be opened at all.
    #[error("persistent storage unavailable: {0}")]
    StorageUnavailable(String),
    /// A read or write against an open store failed.
    #[error("storage error: {0}")]
    Storage(String),
}
