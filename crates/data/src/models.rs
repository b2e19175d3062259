//! Snapshot record models.
//!
//! One `TickerRecord` per tracked coin per ticker poll, one `MiningRecord`
//! per mineable coin per mining poll. Records are constructed fresh each
//! cycle and are append-only once persisted.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::csv_store::CsvRecord;

/// One row of ticker data for a single coin.
///
/// All rows of one poll batch share the same `last_downloaded` timestamp.
/// The numeric fields are nullable because the ticker API reports `null`
/// for coins without a known supply cap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerRecord {
    pub id: String,
    pub symbol: String,
    /// Capture timestamp, set once per batch.
    pub last_downloaded: DateTime<Utc>,
    pub rank: Option<f32>,
    pub price_usd: Option<f32>,
    pub price_btc: Option<f32>,
    pub volume_24h_usd: Option<f32>,
    pub market_cap_usd: Option<f32>,
    pub available_supply: Option<f32>,
    pub total_supply: Option<f32>,
    pub max_supply: Option<f32>,
    /// Source-reported update time, parsed from a Unix epoch string.
    pub last_updated: DateTime<Local>,
}

impl CsvRecord for TickerRecord {
    const HEADER: &'static [&'static str] = &[
        "id",
        "symbol",
        "last_downloaded",
        "rank",
        "price_usd",
        "price_btc",
        "24h_volume_usd",
        "market_cap_usd",
        "available_supply",
        "total_supply",
        "max_supply",
        "last_updated",
    ];

    fn fields(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.symbol.clone(),
            self.last_downloaded.to_rfc3339(),
            opt_to_cell(self.rank),
            opt_to_cell(self.price_usd),
            opt_to_cell(self.price_btc),
            opt_to_cell(self.volume_24h_usd),
            opt_to_cell(self.market_cap_usd),
            opt_to_cell(self.available_supply),
            opt_to_cell(self.total_supply),
            opt_to_cell(self.max_supply),
            self.last_updated.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]
    }
}

/// One row of mining economics for a single coin.
///
/// `usd_revenue` is filled by the mining cycle from the concurrently fetched
/// BTC price; it is only meaningful when both fetches of a cycle succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiningRecord {
    /// Capture timestamp, set once per batch (leading CSV column).
    pub last_downloaded: DateTime<Utc>,
    /// Coin name, taken from the source's outer mapping key.
    pub coin: String,
    pub algorithm: String,
    pub nethash: f64,
    pub difficulty: f64,
    pub block_time: f64,
    pub block_reward: f64,
    /// Renamed from the source field `exchange_rate`.
    pub btc_price: f64,
    pub btc_revenue: f64,
    pub usd_revenue: Option<f64>,
}

impl CsvRecord for MiningRecord {
    const HEADER: &'static [&'static str] = &[
        "last_downloaded",
        "coin",
        "algorithm",
        "nethash",
        "difficulty",
        "block_time",
        "block_reward",
        "btc_price",
        "btc_revenue",
        "usd_revenue",
    ];

    fn fields(&self) -> Vec<String> {
        vec![
            self.last_downloaded.to_rfc3339(),
            self.coin.clone(),
            self.algorithm.clone(),
            self.nethash.to_string(),
            self.difficulty.to_string(),
            self.block_time.to_string(),
            self.block_reward.to_string(),
            self.btc_price.to_string(),
            self.btc_revenue.to_string(),
            opt_to_cell(self.usd_revenue),
        ]
    }
}

fn opt_to_cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_ticker() -> TickerRecord {
        TickerRecord {
            id: "bitcoin".to_string(),
            symbol: "BTC".to_string(),
            last_downloaded: Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap(),
            rank: Some(1.0),
            price_usd: Some(50_000.0),
            price_btc: Some(1.0),
            volume_24h_usd: Some(1.0e9),
            market_cap_usd: Some(9.0e11),
            available_supply: Some(1.9e7),
            total_supply: Some(1.9e7),
            max_supply: None,
            last_updated: Local.timestamp_opt(1_710_500_000, 0).unwrap(),
        }
    }

    #[test]
    fn ticker_header_matches_field_count() {
        let record = sample_ticker();
        assert_eq!(record.fields().len(), TickerRecord::HEADER.len());
    }

    #[test]
    fn ticker_nullable_field_serializes_empty() {
        let record = sample_ticker();
        let fields = record.fields();
        // max_supply is the second-to-last column.
        assert_eq!(fields[fields.len() - 2], "");
    }

    #[test]
    fn mining_header_matches_field_count() {
        let record = MiningRecord {
            last_downloaded: Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap(),
            coin: "Ethereum".to_string(),
            algorithm: "Ethash".to_string(),
            nethash: 1.0,
            difficulty: 2.0,
            block_time: 13.5,
            block_reward: 2.0,
            btc_price: 0.05,
            btc_revenue: 0.001,
            usd_revenue: Some(50.0),
        };
        assert_eq!(record.fields().len(), MiningRecord::HEADER.len());
        assert_eq!(record.fields().last().unwrap(), "50");
    }
}
