//! Timestamp encoding for document bodies.
//!
//! Timestamps are written as `{"seconds": i64, "nanoseconds": u32}`. Reading
//! is more forgiving, since older documents were written by other clients:
//!
//! ```text
//! {"seconds": 1710520000, "nanoseconds": 0}     written by this crate
//! {"_seconds": 1710520000, "_nanoseconds": 0}   REST export shape
//! "2024-03-15T16:26:40Z"                        RFC 3339 string
//! 1710520000000                                 epoch milliseconds
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A timestamp as stored in a document body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreTimestamp {
    pub seconds: i64,
    pub nanoseconds: u32,
}

impl StoreTimestamp {
    /// Converts back to a `DateTime`, or `None` when out of range.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.seconds, self.nanoseconds)
    }
}

impl From<DateTime<Utc>> for StoreTimestamp {
    fn from(at: DateTime<Utc>) -> Self {
        StoreTimestamp {
            seconds: at.timestamp(),
            nanoseconds: at.timestamp_subsec_nanos(),
        }
    }
}

/// Encodes a timestamp for a document body.
pub fn encode_timestamp(at: DateTime<Utc>) -> Value {
    let ts = StoreTimestamp::from(at);
    serde_json::json!({
        "seconds": ts.seconds,
        "nanoseconds": ts.nanoseconds,
    })
}

/// Decodes any of the accepted timestamp shapes.
///
/// Returns `None` for anything unreadable; callers pick the fallback.
pub fn decode_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Object(obj) => {
            let seconds = obj
                .get("seconds")
                .or_else(|| obj.get("_seconds"))
                .and_then(Value::as_i64)?;
            let nanoseconds = obj
                .get("nanoseconds")
                .or_else(|| obj.get("_nanoseconds"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            let nanoseconds = u32::try_from(nanoseconds).ok()?;

            StoreTimestamp {
                seconds,
                nanoseconds,
            }
            .to_datetime()
        }
        Value::String(text) => DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|at| at.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}
