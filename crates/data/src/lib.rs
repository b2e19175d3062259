pub mod csv_store;
pub mod models;

pub use csv_store::{CsvRecord, CsvStore, Dataset, PartitionKey, StorageError};
pub use models::{MiningRecord, TickerRecord};
