//! Ticker payload normalization.
//!
//! The ticker API returns a JSON array with one object per tracked coin.
//! Numeric fields arrive as strings or numbers and coerce to `f32`; nulls
//! and missing keys become `None`. Anything else fails the whole batch.

use crate::error::{CollectError, Result};
use chrono::{DateTime, Local, TimeZone, Utc};
use cointick_data::TickerRecord;
use serde_json::Value;

/// Converts a raw ticker payload into a record batch.
///
/// Every record carries `captured_at` as its capture timestamp, so all rows
/// of one batch share a single download time.
///
/// # Errors
///
/// Returns [`CollectError::Schema`] if the payload is not an array or any
/// field fails coercion. No partial batch is returned.
pub fn normalize_ticker(payload: &Value, captured_at: DateTime<Utc>) -> Result<Vec<TickerRecord>> {
    let entries = payload
        .as_array()
        .ok_or_else(|| CollectError::schema("payload", "expected a JSON array of coins"))?;

    entries
        .iter()
        .map(|entry| normalize_entry(entry, captured_at))
        .collect()
}

fn normalize_entry(entry: &Value, captured_at: DateTime<Utc>) -> Result<TickerRecord> {
    Ok(TickerRecord {
        id: coerce_string(entry, "id")?,
        symbol: coerce_string(entry, "symbol")?,
        last_downloaded: captured_at,
        rank: coerce_f32(entry, "rank")?,
        price_usd: coerce_f32(entry, "price_usd")?,
        price_btc: coerce_f32(entry, "price_btc")?,
        volume_24h_usd: coerce_f32(entry, "24h_volume_usd")?,
        market_cap_usd: coerce_f32(entry, "market_cap_usd")?,
        available_supply: coerce_f32(entry, "available_supply")?,
        total_supply: coerce_f32(entry, "total_supply")?,
        max_supply: coerce_f32(entry, "max_supply")?,
        last_updated: parse_epoch(entry, "last_updated")?,
    })
}

/// Coerces a nullable numeric field to `f32`.
///
/// Null or missing means the source has no value for this coin (common for
/// `max_supply`); a non-numeric string is a schema error.
fn coerce_f32(entry: &Value, field: &str) -> Result<Option<f32>> {
    match entry.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => {
            let value = n
                .as_f64()
                .ok_or_else(|| CollectError::schema(field, format!("unrepresentable number {n}")))?;
            Ok(Some(value as f32))
        }
        Some(Value::String(s)) => s
            .trim()
            .parse::<f32>()
            .map(Some)
            .map_err(|_| CollectError::schema(field, format!("non-numeric value {s:?}"))),
        Some(other) => Err(CollectError::schema(
            field,
            format!("expected number or string, got {other}"),
        )),
    }
}

fn coerce_string(entry: &Value, field: &str) -> Result<String> {
    match entry.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(CollectError::schema(
            field,
            format!("expected string, got {other}"),
        )),
        None => Err(CollectError::schema(field, "missing field")),
    }
}

/// Parses a Unix-epoch integer string into a local calendar datetime.
fn parse_epoch(entry: &Value, field: &str) -> Result<DateTime<Local>> {
    let secs = match entry.get(field) {
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| CollectError::schema(field, format!("non-epoch value {s:?}")))?,
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| CollectError::schema(field, format!("non-epoch number {n}")))?,
        Some(other) => {
            return Err(CollectError::schema(
                field,
                format!("expected epoch string, got {other}"),
            ))
        }
        None => return Err(CollectError::schema(field, "missing field")),
    };

    Local
        .timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| CollectError::schema(field, format!("out-of-range epoch {secs}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_payload() -> Value {
        serde_json::json!([
            {
                "id": "bitcoin",
                "symbol": "BTC",
                "rank": "1",
                "price_usd": "50000.0",
                "price_btc": "1.0",
                "24h_volume_usd": "9000000000.0",
                "market_cap_usd": "980000000000.0",
                "available_supply": "19000000.0",
                "total_supply": "19000000.0",
                "max_supply": "21000000.0",
                "last_updated": "1521191354"
            },
            {
                "id": "ethereum",
                "symbol": "ETH",
                "rank": 2,
                "price_usd": "3000.0",
                "price_btc": "0.06",
                "24h_volume_usd": "4000000000.0",
                "market_cap_usd": "360000000000.0",
                "available_supply": "120000000.0",
                "total_supply": "120000000.0",
                "max_supply": null,
                "last_updated": "1521191355"
            }
        ])
    }

    #[test]
    fn one_record_per_element_sharing_capture_timestamp() {
        let captured_at = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        let records = normalize_ticker(&sample_payload(), captured_at).unwrap();

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.last_downloaded == captured_at));
        assert_eq!(records[0].id, "bitcoin");
        assert_eq!(records[0].symbol, "BTC");
        assert_eq!(records[0].price_usd, Some(50_000.0));
        // Numbers are accepted alongside numeric strings.
        assert_eq!(records[1].rank, Some(2.0));
    }

    #[test]
    fn null_numeric_field_becomes_none() {
        let records = normalize_ticker(&sample_payload(), Utc::now()).unwrap();
        assert_eq!(records[0].max_supply, Some(21_000_000.0));
        assert_eq!(records[1].max_supply, None);
    }

    #[test]
    fn last_updated_parses_epoch_string() {
        let records = normalize_ticker(&sample_payload(), Utc::now()).unwrap();
        assert_eq!(records[0].last_updated.timestamp(), 1_521_191_354);
    }

    #[test]
    fn non_numeric_value_fails_the_whole_batch() {
        let mut payload = sample_payload();
        payload[1]["price_usd"] = Value::String("not-a-price".to_string());

        let err = normalize_ticker(&payload, Utc::now()).unwrap_err();
        assert!(matches!(err, CollectError::Schema { .. }));
        assert!(err.to_string().contains("price_usd"));
    }

    #[test]
    fn non_array_payload_is_a_schema_error() {
        let payload = serde_json::json!({"error": "rate limited"});
        let err = normalize_ticker(&payload, Utc::now()).unwrap_err();
        assert!(matches!(err, CollectError::Schema { .. }));
    }
}
