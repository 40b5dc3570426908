//! Message and frame types shared across the broker core.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A published message: a UUID and an opaque, caller-defined payload.
///
/// The core never inspects `payload` beyond passing it through; schema
/// validation of payload contents is explicitly out of scope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: Uuid,
    pub payload: serde_json::Value,
}

/// One entry in a topic's bounded history ring.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub message: Message,
    pub ts: DateTime<Utc>,
}

/// A single delivery destined for one subscriber's queue.
///
/// `ts` is copied from the originating `HistoryEntry` at fan-out time, not
/// recomputed at dequeue time, so replay and live delivery carry the same
/// publish timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeliveryFrame {
    pub topic: String,
    pub message: Message,
    pub ts: DateTime<Utc>,
}

impl DeliveryFrame {
    pub fn from_history(topic: &str, entry: &HistoryEntry) -> Self {
        Self {
            topic: topic.to_string(),
            message: entry.message.clone(),
            ts: entry.ts,
        }
    }
}

/// Format a timestamp the way every outbound frame's `ts` field is rendered:
/// UTC ISO-8601 with millisecond precision and a trailing `Z`.
pub fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
