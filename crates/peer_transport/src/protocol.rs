//! Line protocol frames exchanged with peers

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use contracts::{ContractError, ErrorNotice, NoticeKind};

/// First line a peer sends after connecting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handshake {
    pub peer_id: String,
    pub account_id: String,
    pub protocol: String,
    /// Where the peer expects notices; defaults to the connection itself
    #[serde(default)]
    pub control_topic: Option<String>,
}

/// Greeting written to a peer once its account is accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "hello")]
pub struct HelloFrame {
    pub seller_id: String,
    pub protocol: String,
    pub version: String,
}

/// Error notice as written on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "error")]
pub struct ErrorFrame {
    pub kind: NoticeKind,
    pub message: String,
    /// Control topic the peer asked notices to be addressed to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

impl ErrorFrame {
    pub fn with_topic(mut self, topic: Option<String>) -> Self {
        self.topic = topic;
        self
    }
}

impl From<&ErrorNotice> for ErrorFrame {
    fn from(notice: &ErrorNotice) -> Self {
        Self {
            kind: notice.kind,
            message: notice.message.clone(),
            topic: None,
        }
    }
}

/// Inbound line received after the handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlMessage {
    /// JSON object carrying a string `type`
    Typed(String),
    Unclassified,
}

impl ControlMessage {
    pub fn classify(line: &str) -> Self {
        serde_json::from_str::<serde_json::Value>(line)
            .ok()
            .and_then(|value| {
                value
                    .get("type")
                    .and_then(|t| t.as_str())
                    .map(|t| t.to_string())
            })
            .filter(|t| !t.is_empty())
            .map(Self::Typed)
            .unwrap_or(Self::Unclassified)
    }
}

/// Serialize one frame followed by `\n`
pub fn encode_frame<T: Serialize>(frame: &T) -> Result<Bytes, ContractError> {
    let mut buf = serde_json::to_vec(frame)?;
    buf.push(b'\n');
    Ok(Bytes::from(buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hello_frame_shape() {
        let hello = HelloFrame {
            seller_id: "pi-1".to_string(),
            protocol: "/localsense/brightness/v1".to_string(),
            version: "0.1.0".to_string(),
        };
        let line = encode_frame(&hello).unwrap();
        assert_eq!(
            &line[..],
            b"{\"type\":\"hello\",\"seller_id\":\"pi-1\",\"protocol\":\"/localsense/brightness/v1\",\"version\":\"0.1.0\"}\n"
        );
    }

    #[test]
    fn test_error_frame_shape() {
        let notice = ErrorNotice::write_error("localsense node pi-1 unavailable: broken pipe");
        let line = encode_frame(&ErrorFrame::from(&notice)).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&line).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["kind"], "write_error");
        assert_eq!(value["message"], "localsense node pi-1 unavailable: broken pipe");
        assert!(value.get("topic").is_none());
    }

    #[test]
    fn test_error_frame_carries_topic() {
        let notice = ErrorNotice::write_error("gone");
        let frame = ErrorFrame::from(&notice).with_topic(Some("peer-a/control".to_string()));
        let line = encode_frame(&frame).unwrap();
        assert_eq!(
            &line[..],
            b"{\"type\":\"error\",\"kind\":\"write_error\",\"message\":\"gone\",\"topic\":\"peer-a/control\"}\n"
        );
    }

    #[test]
    fn test_handshake_without_topic() {
        let hs: Handshake = serde_json::from_str(
            r#"{"peer_id":"peer-a","account_id":"0.0.7","protocol":"/localsense/brightness/v1"}"#,
        )
        .unwrap();
        assert_eq!(hs.peer_id, "peer-a");
        assert!(hs.control_topic.is_none());
    }

    #[test]
    fn test_classify_control_lines() {
        assert_eq!(
            ControlMessage::classify(r#"{"type":"ack","seq":3}"#),
            ControlMessage::Typed("ack".to_string())
        );
        assert_eq!(ControlMessage::classify("hello there"), ControlMessage::Unclassified);
        assert_eq!(ControlMessage::classify(r#"{"type":7}"#), ControlMessage::Unclassified);
    }
}
