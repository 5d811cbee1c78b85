use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedResult {
    pub timestamp: DateTime<Utc>,
    pub data: Value,
}

impl CachedResult {
    pub fn new(data: Value, timestamp: DateTime<Utc>) -> Self {
        Self { timestamp, data }
    }

    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        match now.signed_duration_since(self.timestamp).to_std() {
            Ok(age) => age <= ttl,
            Err(_) => true,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().expect("valid timestamp")
    }

    #[test]
    fn entry_is_fresh_up_to_and_including_ttl() {
        let entry = CachedResult::new(Value::Null, at(1_700_000_000));
        assert!(entry.is_fresh(DEFAULT_CACHE_TTL, at(1_700_000_000 + 300)));
        assert!(!entry.is_fresh(DEFAULT_CACHE_TTL, at(1_700_000_000 + 301)));
    }

    #[test]
    fn entry_from_the_future_is_fresh() {
        let entry = CachedResult::new(Value::Null, at(1_700_000_100));
        assert!(entry.is_fresh(DEFAULT_CACHE_TTL, at(1_700_000_000)));
    }

    #[test]
    fn decode_rejects_payload_without_timestamp() {
        assert!(CachedResult::decode(br#"{"data":{}}"#).is_err());
        assert!(CachedResult::decode(b"not json").is_err());
    }
}
