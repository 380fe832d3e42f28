//! Transport abstraction for the debugging session.
//!
//! The concrete wire (extension bridge, CDP websocket, in-process fake) is an
//! embedder concern. This module only fixes the contract: request/response
//! command dispatch per target, plus an out-of-band notification stream for
//! detaches initiated by the remote side.

use crate::error::Result;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use tokio::sync::broadcast;

/// Notification that the remote side dropped the session for a target,
/// e.g. because the page navigated away or dev tools were closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetachEvent {
    /// Target whose session was dropped
    pub target_id: String,
}

/// Type alias for the boxed futures returned by [`DebuggerTransport`].
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Request/response boundary to one debugging endpoint.
///
/// All operations are asynchronous request/response pairs over a single
/// logical connection per target; only one attach may be outstanding per
/// target. Implementations must make `detach` a no-op success when the
/// target is already detached - the remote side may detach unilaterally.
pub trait DebuggerTransport: Send + Sync {
    /// Attach the debugger to a target at the given protocol version.
    fn attach(&self, target_id: &str, protocol_version: &str) -> TransportFuture<'_, ()>;

    /// Detach from a target. Idempotent: detaching an already-detached
    /// target succeeds.
    fn detach(&self, target_id: &str) -> TransportFuture<'_, ()>;

    /// Send a command to an attached target and await the response value.
    fn send_command(&self, target_id: &str, method: &str, params: Value)
    -> TransportFuture<'_, Value>;

    /// Subscribe to unsolicited detach notifications.
    ///
    /// Every subscriber sees every event; a lagging subscriber may miss
    /// events, which is acceptable since a missed detach is re-discovered on
    /// the next failing command.
    fn subscribe_detach(&self) -> broadcast::Receiver<DetachEvent>;
}
