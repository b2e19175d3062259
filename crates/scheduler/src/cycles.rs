//! Snapshot cycles.
//!
//! Each cycle is fetch, then normalize, then append, then a fire-and-forget
//! liveness ping. Any error aborts the cycle before the append, so a
//! partition either receives a complete batch or nothing.

use anyhow::{Context, Result};
use chrono::Utc;
use cointick_collector::{normalize_mining, normalize_ticker, Fetcher, RetryPolicy};
use cointick_core::AppConfig;
use cointick_data::{CsvStore, Dataset, MiningRecord, PartitionKey, TickerRecord};
use std::time::Duration;
use tracing::{debug, info};

/// Runs the ticker and mining snapshot cycles against one output store.
pub struct SnapshotRunner {
    fetcher: Fetcher,
    store: CsvStore,
    ticker_uri: String,
    mining_uri: String,
    snitch_ticker: Option<String>,
    snitch_mining: Option<String>,
    ping_client: reqwest::Client,
}

impl SnapshotRunner {
    /// Builds a runner from application configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let retry = RetryPolicy {
            attempts: config.retry.attempts,
            backoff: Duration::from_secs(config.retry.backoff_secs),
        };
        let timeout = Duration::from_secs(config.retry.request_timeout_secs);
        let fetcher = Fetcher::new(retry, timeout).context("Failed to build HTTP fetcher")?;

        Ok(Self {
            fetcher,
            store: CsvStore::new(config.poller.output_dir.clone()),
            ticker_uri: config.poller.ticker_uri.clone(),
            mining_uri: config.poller.mining_uri.clone(),
            snitch_ticker: config.snitch.ticker_url.clone(),
            snitch_mining: config.snitch.mining_url.clone(),
            ping_client: reqwest::Client::new(),
        })
    }

    /// One ticker cycle: fetch, normalize, append to the five-minute
    /// partition, ping the ticker liveness endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error on fetch exhaustion, schema mismatch, or storage
    /// failure. Nothing is written in the error case.
    pub async fn ticker_cycle(&self) -> Result<usize> {
        let payload = self.fetcher.fetch_json(&self.ticker_uri).await?;
        let captured_at = Utc::now();
        let records = normalize_ticker(&payload, captured_at)?;

        let key = PartitionKey::for_timestamp(Dataset::Ticker, captured_at);
        self.store.append(&key, &records)?;
        info!(
            records = records.len(),
            partition = %key.file_name(),
            "Downloaded ticker snapshot"
        );

        self.ping(self.snitch_ticker.as_deref()).await;
        Ok(records.len())
    }

    /// One mining cycle: fetch the ticker for the current BTC price, fetch
    /// and normalize mining economics, derive USD revenue, sort, append to
    /// the whattomine partition, ping the mining liveness endpoint.
    ///
    /// A failure in the BTC price sub-fetch aborts the whole cycle; no
    /// mining rows are written without a valid price join.
    ///
    /// # Errors
    ///
    /// Returns an error if either fetch, normalization, the price join, or
    /// the append fails.
    pub async fn mining_cycle(&self) -> Result<usize> {
        let ticker_payload = self.fetcher.fetch_json(&self.ticker_uri).await?;
        let captured_at = Utc::now();
        let ticker_records = normalize_ticker(&ticker_payload, captured_at)?;
        let btc_price = btc_price_usd(&ticker_records)?;

        let mining_payload = self.fetcher.fetch_json(&self.mining_uri).await?;
        let mut records = normalize_mining(&mining_payload, captured_at)?;
        price_in_usd(&mut records, btc_price);

        let key = PartitionKey::for_timestamp(Dataset::Mining, captured_at);
        self.store.append(&key, &records)?;
        info!(
            records = records.len(),
            partition = %key.file_name(),
            btc_price,
            "Downloaded mining snapshot"
        );

        self.ping(self.snitch_mining.as_deref()).await;
        Ok(records.len())
    }

    /// Fire-and-forget liveness ping. The response is ignored; the absence
    /// of a ping is the signal an operator watches for.
    async fn ping(&self, url: Option<&str>) {
        let Some(url) = url else { return };
        if let Err(e) = self.ping_client.get(url).send().await {
            debug!(url, error = %e, "Liveness ping failed");
        }
    }
}

/// Extracts the USD price of BTC from a ticker batch.
///
/// # Errors
///
/// Returns an error if the batch has no BTC row or its price is null.
pub fn btc_price_usd(records: &[TickerRecord]) -> Result<f64> {
    let btc = records
        .iter()
        .find(|r| r.symbol == "BTC")
        .context("Ticker batch has no BTC row")?;
    let price = btc
        .price_usd
        .context("Ticker batch reports a null BTC price")?;
    Ok(f64::from(price))
}

/// Fills `usd_revenue` for every row and sorts the batch descending by it.
pub fn price_in_usd(records: &mut [MiningRecord], btc_price_usd: f64) {
    for record in records.iter_mut() {
        record.usd_revenue = Some(btc_price_usd * record.btc_revenue);
    }
    records.sort_by(|a, b| {
        let a = a.usd_revenue.unwrap_or(f64::NEG_INFINITY);
        let b = b.usd_revenue.unwrap_or(f64::NEG_INFINITY);
        b.total_cmp(&a)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono::{Local, Utc};

    fn ticker_row(symbol: &str, price_usd: Option<f32>) -> TickerRecord {
        TickerRecord {
            id: symbol.to_lowercase(),
            symbol: symbol.to_string(),
            last_downloaded: Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap(),
            rank: Some(1.0),
            price_usd,
            price_btc: Some(1.0),
            volume_24h_usd: None,
            market_cap_usd: None,
            available_supply: None,
            total_supply: None,
            max_supply: None,
            last_updated: Local.timestamp_opt(1_710_500_000, 0).unwrap(),
        }
    }

    fn mining_row(coin: &str, btc_revenue: f64) -> MiningRecord {
        MiningRecord {
            last_downloaded: Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap(),
            coin: coin.to_string(),
            algorithm: "Ethash".to_string(),
            nethash: 1.0,
            difficulty: 1.0,
            block_time: 13.5,
            block_reward: 2.0,
            btc_price: 0.05,
            btc_revenue,
            usd_revenue: None,
        }
    }

    #[test]
    fn btc_price_found_by_symbol() {
        let records = vec![ticker_row("ETH", Some(3000.0)), ticker_row("BTC", Some(50_000.0))];
        assert_eq!(btc_price_usd(&records).unwrap(), 50_000.0);
    }

    #[test]
    fn missing_btc_row_is_an_error() {
        let records = vec![ticker_row("ETH", Some(3000.0))];
        assert!(btc_price_usd(&records).is_err());
    }

    #[test]
    fn null_btc_price_is_an_error() {
        let records = vec![ticker_row("BTC", None)];
        assert!(btc_price_usd(&records).is_err());
    }

    #[test]
    fn usd_revenue_is_price_times_btc_revenue() {
        let mut records = vec![mining_row("Ethereum", 0.001)];
        price_in_usd(&mut records, 50_000.0);
        assert_eq!(records[0].usd_revenue, Some(50.0));
    }

    #[test]
    fn rows_sort_descending_by_usd_revenue() {
        let mut records = vec![
            mining_row("Low", 0.0001),
            mining_row("High", 0.01),
            mining_row("Mid", 0.001),
        ];
        price_in_usd(&mut records, 50_000.0);

        let order: Vec<&str> = records.iter().map(|r| r.coin.as_str()).collect();
        assert_eq!(order, vec!["High", "Mid", "Low"]);
    }
}
