//! The generic `{type, shopId, data}` wire envelope.

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Envelope for every text frame on the realtime channel.
///
/// `kind` is an open string so that frames with unrecognized types still
/// decode; the event layer decides whether to act on them. `data` defaults
/// to JSON `null` when the peer omits it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "shopId", default, skip_serializing_if = "Option::is_none")]
    pub shop_id: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub data: serde_json::Value,
}

impl Envelope {
    /// Creates an envelope with the given kind, shop and payload.
    pub fn new(
        kind: impl Into<String>,
        shop_id: Option<&str>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            kind: kind.into(),
            shop_id: shop_id.map(str::to_owned),
            data,
        }
    }

    /// Encodes the envelope as a single text frame.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes a text frame. Fails on invalid JSON or a missing `type`
    /// field; an unknown `type` value is not an error.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_preserves_all_fields() {
        let env = Envelope::new(
            "order.create",
            Some("shop-1"),
            serde_json::json!({"items": [], "total": 42.5}),
        );
        let text = env.encode().unwrap();
        let back = Envelope::decode(&text).unwrap();
        assert_eq!(back, env);
    }

    #[test]
    fn roundtrip_without_shop_or_data() {
        let env = Envelope::new("auth.ok", None, serde_json::Value::Null);
        let text = env.encode().unwrap();
        assert!(!text.contains("shopId"));
        assert!(!text.contains("data"));
        let back = Envelope::decode(&text).unwrap();
        assert_eq!(back, env);
    }

    #[test]
    fn decode_rejects_invalid_json() {
        assert!(Envelope::decode("not json {{{").is_err());
    }

    #[test]
    fn decode_rejects_missing_type() {
        assert!(Envelope::decode(r#"{"shopId": "shop-1", "data": {}}"#).is_err());
    }

    #[test]
    fn decode_accepts_unknown_type() {
        let env = Envelope::decode(r#"{"type": "totally.new", "data": {"x": 1}}"#).unwrap();
        assert_eq!(env.kind, "totally.new");
        assert_eq!(env.data["x"], 1);
    }

    #[test]
    fn numbers_decode_as_f64() {
        let env = Envelope::decode(r#"{"type": "t", "data": {"total": 12}}"#).unwrap();
        assert_eq!(env.data["total"].as_f64(), Some(12.0));
    }
}
