//! Error types for wire protocol handling.

/// Errors produced while encoding or decoding protocol frames.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid `{kind}` payload: {source}")]
    Payload {
        kind: &'static str,
        source: serde_json::Error,
    },
}
