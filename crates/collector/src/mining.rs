//! Mining-economics payload normalization.
//!
//! The mining API returns `{"coins": {<name>: {...}}}`. Each entry flattens
//! into one row with `coin` taken from the mapping key and `exchange_rate`
//! renamed to `btc_price`. The numeric fields are strict: a missing or
//! non-numeric value fails the batch.

use crate::error::{CollectError, Result};
use chrono::{DateTime, Utc};
use cointick_data::MiningRecord;
use serde_json::Value;

/// Converts a raw mining payload into a record batch.
///
/// `usd_revenue` is left unset; the mining cycle fills it in from the
/// concurrently fetched BTC price.
///
/// # Errors
///
/// Returns [`CollectError::Schema`] if the payload lacks the `coins`
/// mapping or any field fails coercion.
pub fn normalize_mining(payload: &Value, captured_at: DateTime<Utc>) -> Result<Vec<MiningRecord>> {
    let coins = payload
        .get("coins")
        .and_then(Value::as_object)
        .ok_or_else(|| CollectError::schema("coins", "expected a coin-to-record mapping"))?;

    coins
        .iter()
        .map(|(coin, entry)| normalize_entry(coin, entry, captured_at))
        .collect()
}

fn normalize_entry(coin: &str, entry: &Value, captured_at: DateTime<Utc>) -> Result<MiningRecord> {
    Ok(MiningRecord {
        last_downloaded: captured_at,
        coin: coin.to_string(),
        algorithm: require_string(entry, "algorithm")?,
        nethash: require_f64(entry, "nethash")?,
        difficulty: require_f64(entry, "difficulty")?,
        block_time: require_f64(entry, "block_time")?,
        block_reward: require_f64(entry, "block_reward")?,
        btc_price: require_f64(entry, "exchange_rate")?,
        btc_revenue: require_f64(entry, "btc_revenue")?,
        usd_revenue: None,
    })
}

fn require_string(entry: &Value, field: &str) -> Result<String> {
    match entry.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(CollectError::schema(
            field,
            format!("expected string, got {other}"),
        )),
        None => Err(CollectError::schema(field, "missing field")),
    }
}

/// Coerces a required numeric field to `f64`. The source mixes JSON numbers
/// with numeric strings (e.g. `block_time` is usually a quoted string).
fn require_f64(entry: &Value, field: &str) -> Result<f64> {
    match entry.get(field) {
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| CollectError::schema(field, format!("unrepresentable number {n}"))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| CollectError::schema(field, format!("non-numeric value {s:?}"))),
        Some(other) => Err(CollectError::schema(
            field,
            format!("expected number or string, got {other}"),
        )),
        None => Err(CollectError::schema(field, "missing field")),
    }
}
