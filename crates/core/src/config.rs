use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub poller: PollerConfig,
    pub retry: RetryConfig,
    pub snitch: SnitchConfig,
}

/// Endpoints, cadences, and output location for the snapshot poller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Directory that receives the monthly CSV partitions.
    pub output_dir: String,
    /// Ticker API endpoint (returns a JSON array, one object per coin).
    pub ticker_uri: String,
    /// Mining economics endpoint (returns `{"coins": {...}}`).
    pub mining_uri: String,
    /// Seconds between ticker snapshots.
    pub ticker_interval_secs: u64,
    /// Seconds between mining snapshots.
    pub mining_interval_secs: u64,
}

/// Bounded-retry policy for API downloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempts before a fetch fails outright.
    pub attempts: u32,
    /// Sleep between attempts, in seconds.
    pub backoff_secs: u64,
    /// Per-request HTTP timeout, in seconds.
    pub request_timeout_secs: u64,
}

/// Dead man's switch endpoints, pinged after each successful cycle.
///
/// Absence of a ping is the operator-facing failure signal; ping failures
/// themselves are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnitchConfig {
    pub ticker_url: Option<String>,
    pub mining_url: Option<String>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            output_dir: "five_minute_data".to_string(),
            // Top 120 coins by rank.
            ticker_uri: "https://api.coinmarketcap.com/v1/ticker/?limit=120".to_string(),
            // Profitability for two 1080 Ti cards.
            mining_uri: "https://whattomine.com/coins.json?adapt_q_1080Ti=2&adapt_1080Ti=true"
                .to_string(),
            ticker_interval_secs: 300,
            mining_interval_secs: 600,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 5,
            backoff_secs: 2,
            request_timeout_secs: 30,
        }
    }
}
