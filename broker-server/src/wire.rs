//! Wire-level frame types exchanged over the WebSocket transport.
//!
//! `ClientFrame` is a closed, tagged enum: `serde_json` rejects malformed
//! `type` values and missing required fields before any of this ever
//! reaches `broker-core`, which is most of "bad_request" handling.

use broker_core::{BrokerError, DeliveryFrame, Message, format_ts};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Inbound message shape: `id` stays a raw string here (rather than a typed
/// `Uuid` field) so a malformed id produces a structured `bad_request`
/// carrying the client's `request_id`, instead of failing the whole frame's
/// deserialization before a `request_id` is even available.
#[derive(Debug, Clone, Deserialize)]
pub struct WireMessage {
    pub id: String,
    pub payload: serde_json::Value,
}

impl WireMessage {
    pub fn into_message(self) -> Result<Message, BrokerError> {
        let id = Uuid::parse_str(&self.id).map_err(|_| BrokerError::InvalidMessageId(self.id))?;
        Ok(Message {
            id,
            payload: self.payload,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    Subscribe {
        topic: String,
        client_id: String,
        #[serde(default)]
        last_n: i64,
        #[serde(default)]
        request_id: Option<String>,
    },
    Unsubscribe {
        topic: String,
        client_id: String,
        #[serde(default)]
        request_id: Option<String>,
    },
    Publish {
        topic: String,
        message: WireMessage,
        #[serde(default)]
        request_id: Option<String>,
    },
    Ping {
        #[serde(default)]
        request_id: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    Ack {
        #[serde(skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        topic: Option<String>,
        status: &'static str,
        ts: String,
    },
    Event {
        topic: String,
        message: Message,
        ts: String,
    },
    Error {
        #[serde(skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
        error: ErrorBody,
        ts: String,
    },
    Pong {
        #[serde(skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
        ts: String,
    },
    Info {
        #[serde(skip_serializing_if = "Option::is_none")]
        topic: Option<String>,
        msg: String,
        ts: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ServerFrame {
    pub fn ack(request_id: Option<String>, topic: Option<String>) -> Self {
        Self::Ack {
            request_id,
            topic,
            status: "ok",
            ts: format_ts(Utc::now()),
        }
    }

    pub fn event(frame: DeliveryFrame) -> Self {
        Self::Event {
            topic: frame.topic,
            message: frame.message,
            ts: format_ts(frame.ts),
        }
    }

    pub fn error(request_id: Option<String>, code: &str, message: &str) -> Self {
        Self::Error {
            request_id,
            error: ErrorBody {
                code: code.to_string(),
                message: message.to_string(),
            },
            ts: format_ts(Utc::now()),
        }
    }

    pub fn pong(request_id: Option<String>) -> Self {
        Self::Pong {
            request_id,
            ts: format_ts(Utc::now()),
        }
    }

    pub fn info(topic: Option<String>, msg: impl Into<String>) -> Self {
        Self::Info {
            topic,
            msg: msg.into(),
            ts: format_ts(Utc::now()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_frame_defaults_last_n_to_zero() {
        let json = r#"{"type":"subscribe","topic":"t","client_id":"c1"}"#;
        let frame: ClientFrame = serde_json::from_str(json).unwrap();
        match frame {
            ClientFrame::Subscribe {
                topic,
                client_id,
                last_n,
                request_id,
            } => {
                assert_eq!(topic, "t");
                assert_eq!(client_id, "c1");
                assert_eq!(last_n, 0);
                assert_eq!(request_id, None);
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn unknown_type_fails_to_parse() {
        let json = r#"{"type":"wat"}"#;
        assert!(serde_json::from_str::<ClientFrame>(json).is_err());
    }

    #[test]
    fn ack_frame_omits_absent_optional_fields() {
        let frame = ServerFrame::ack(None, None);
        let value = serde_json::to_value(&frame).unwrap();
        assert!(value.get("request_id").is_none());
        assert!(value.get("topic").is_none());
        assert_eq!(value["status"], "ok");
    }

    #[test]
    fn error_frame_serializes_code_and_message() {
        let frame = ServerFrame::error(Some("r1".into()), "bad_request", "nope");
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["error"]["code"], "bad_request");
        assert_eq!(value["request_id"], "r1");
    }
}
