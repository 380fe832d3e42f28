//! Error types for the debugger runtime.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving a debugger session.
#[derive(Debug, Error)]
pub enum Error {
    /// Attaching the debugger to the target failed.
    #[error("Failed to attach to target: {0}")]
    AttachFailed(String),

    /// Transport-level failure dispatching a command or detach.
    #[error("Transport error: {0}")]
    TransportError(String),

    /// The remote side rejected a command.
    #[error("{message}")]
    Remote {
        /// Raw message from the remote side, possibly a JSON envelope
        message: String,
    },

    /// Protocol-level error (malformed response shape).
    #[error("Protocol error: {0}")]
    ProtocolError(String),

    /// Operation requested in an invalid session state.
    #[error("Invalid state: {0}")]
    InvalidState(&'static str),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Channel closed unexpectedly.
    #[error("Channel closed unexpectedly")]
    ChannelClosed,
}

impl Error {
    /// Returns the message to show a user.
    ///
    /// Remote and transport payloads are sometimes JSON envelopes with a
    /// `message` field; extract it when present, otherwise fall back to the
    /// raw string verbatim. No other protocol-specific shape is parsed.
    pub fn user_message(&self) -> String {
        match self {
            Error::Remote { message } | Error::TransportError(message) => {
                extract_message(message).unwrap_or_else(|| message.clone())
            }
            Error::AttachFailed(message) => {
                extract_message(message).unwrap_or_else(|| message.clone())
            }
            other => other.to_string(),
        }
    }

    /// Returns true for errors caused by the remote side or the transport,
    /// as opposed to local misuse.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::AttachFailed(_) | Error::TransportError(_) | Error::Remote { .. }
        )
    }
}

fn extract_message(raw: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    value
        .get("message")
        .and_then(|m| m.as_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_extracts_json_envelope() {
        let err = Error::Remote {
            message: r#"{"code":-32000,"message":"Domain not enabled"}"#.to_string(),
        };
        assert_eq!(err.user_message(), "Domain not enabled");
    }

    #[test]
    fn user_message_falls_back_to_raw_string() {
        let err = Error::TransportError("cannot attach".to_string());
        assert_eq!(err.user_message(), "cannot attach");
    }

    #[test]
    fn user_message_ignores_json_without_message_field() {
        let err = Error::Remote {
            message: r#"{"code":-32000}"#.to_string(),
        };
        assert_eq!(err.user_message(), r#"{"code":-32000}"#);
    }
}
