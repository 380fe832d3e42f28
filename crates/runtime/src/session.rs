//! Debugger session for one target.
//!
//! A [`DebuggerSession`] owns the attach state and WebAuthn domain state for
//! a single target and provides typed command dispatch on top of the
//! transport's raw JSON boundary.

use crate::error::{Error, Result};
use crate::transport::{DebuggerTransport, DetachEvent};
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;
use vauth_protocol::commands;

/// The attached debugging connection to one target plus the enabled state of
/// the WebAuthn simulation domain.
///
/// Cheap to clone; clones share the same attach/domain flags.
#[derive(Clone)]
pub struct DebuggerSession {
    target_id: Arc<str>,
    transport: Arc<dyn DebuggerTransport>,
    attached: Arc<AtomicBool>,
    domain_enabled: Arc<AtomicBool>,
    /// Guards against overlapping attach attempts for the same target.
    attach_in_flight: Arc<Mutex<bool>>,
}

impl DebuggerSession {
    /// Creates a detached session for the given target.
    pub fn new(target_id: impl Into<Arc<str>>, transport: Arc<dyn DebuggerTransport>) -> Self {
        Self {
            target_id: target_id.into(),
            transport,
            attached: Arc::new(AtomicBool::new(false)),
            domain_enabled: Arc::new(AtomicBool::new(false)),
            attach_in_flight: Arc::new(Mutex::new(false)),
        }
    }

    /// Returns the target this session debugs.
    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// Returns true once `attach` has succeeded and `detach` has not run.
    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    /// Returns true while the WebAuthn domain is enabled.
    pub fn is_domain_enabled(&self) -> bool {
        self.domain_enabled.load(Ordering::SeqCst)
    }

    /// Attaches the debugger to the target.
    pub async fn attach(&self) -> Result<()> {
        {
            let mut in_flight = self.attach_in_flight.lock();
            if *in_flight || self.is_attached() {
                return Err(Error::InvalidState("attach already in progress or done"));
            }
            *in_flight = true;
        }

        tracing::debug!(target = %self.target_id, "attaching debugger");
        let result = self
            .transport
            .attach(&self.target_id, commands::PROTOCOL_VERSION)
            .await;
        *self.attach_in_flight.lock() = false;

        match result {
            Ok(()) => {
                self.attached.store(true, Ordering::SeqCst);
                Ok(())
            }
            Err(err) => {
                tracing::debug!(target = %self.target_id, error = %err, "attach failed");
                Err(err)
            }
        }
    }

    /// Enables the WebAuthn domain on the attached session.
    pub async fn enable_domain(&self) -> Result<()> {
        if !self.is_attached() {
            return Err(Error::InvalidState("enable_domain requires an attached session"));
        }
        self.send_raw(commands::ENABLE, Value::Object(Default::default()))
            .await?;
        self.domain_enabled.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Disables the WebAuthn domain. The domain flag clears even when the
    /// remote call fails, since the session is about to be torn down anyway.
    pub async fn disable_domain(&self) -> Result<()> {
        if !self.is_attached() {
            self.domain_enabled.store(false, Ordering::SeqCst);
            return Ok(());
        }
        let result = self
            .send_raw(commands::DISABLE, Value::Object(Default::default()))
            .await;
        self.domain_enabled.store(false, Ordering::SeqCst);
        result.map(|_| ())
    }

    /// Detaches from the target. A no-op success when already detached.
    pub async fn detach(&self) -> Result<()> {
        if !self.attached.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        self.domain_enabled.store(false, Ordering::SeqCst);
        tracing::debug!(target = %self.target_id, "detaching debugger");
        self.transport.detach(&self.target_id).await
    }

    /// Marks the session detached without a remote call.
    ///
    /// Used when the remote side reports it already dropped the session; a
    /// redundant `detach` command would just fail.
    pub fn mark_detached(&self) {
        self.attached.store(false, Ordering::SeqCst);
        self.domain_enabled.store(false, Ordering::SeqCst);
    }

    /// Sends a typed command to the target and deserializes the response.
    pub async fn send_command<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<R> {
        let params_value = serde_json::to_value(params)?;
        let response = self.send_raw(method, params_value).await?;
        serde_json::from_value(response).map_err(Into::into)
    }

    /// Sends a command that returns no meaningful result.
    pub async fn send_no_result<P: Serialize>(&self, method: &str, params: P) -> Result<()> {
        let _: Value = self.send_command(method, params).await?;
        Ok(())
    }

    /// Subscribes to unsolicited detach events for any target on this
    /// transport. Callers filter by [`Self::target_id`].
    pub fn subscribe_detach(&self) -> broadcast::Receiver<DetachEvent> {
        self.transport.subscribe_detach()
    }

    async fn send_raw(&self, method: &str, params: Value) -> Result<Value> {
        if !self.is_attached() {
            return Err(Error::InvalidState("command sent on a detached session"));
        }
        tracing::debug!(target = %self.target_id, method, "sending command");
        self.transport
            .send_command(&self.target_id, method, params)
            .await
    }
}

impl std::fmt::Debug for DebuggerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebuggerSession")
            .field("target_id", &self.target_id)
            .field("attached", &self.is_attached())
            .field("domain_enabled", &self.is_domain_enabled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeTransport;

    fn session(transport: &Arc<FakeTransport>) -> DebuggerSession {
        DebuggerSession::new("tab-1", Arc::clone(transport) as Arc<dyn DebuggerTransport>)
    }

    #[tokio::test]
    async fn attach_then_enable_sets_flags() {
        let transport = FakeTransport::new();
        let session = session(&transport);

        session.attach().await.unwrap();
        assert!(session.is_attached());
        assert!(!session.is_domain_enabled());

        session.enable_domain().await.unwrap();
        assert!(session.is_domain_enabled());
        assert_eq!(transport.call_count(commands::ENABLE), 1);
    }

    #[tokio::test]
    async fn attach_failure_surfaces_raw_message() {
        let transport = FakeTransport::new();
        transport.fail_attach("cannot attach");
        let session = session(&transport);

        let err = session.attach().await.unwrap_err();
        assert_eq!(err.user_message(), "cannot attach");
        assert!(!session.is_attached());
    }

    #[tokio::test]
    async fn second_attach_is_rejected() {
        let transport = FakeTransport::new();
        let session = session(&transport);

        session.attach().await.unwrap();
        let err = session.attach().await.unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[tokio::test]
    async fn detach_is_idempotent() {
        let transport = FakeTransport::new();
        let session = session(&transport);

        session.attach().await.unwrap();
        session.detach().await.unwrap();
        assert!(!session.is_attached());

        // Detaching again is a no-op success, not an error.
        session.detach().await.unwrap();
        session.detach().await.unwrap();
    }

    #[tokio::test]
    async fn command_on_detached_session_is_a_state_error() {
        let transport = FakeTransport::new();
        let session = session(&transport);

        let err = session
            .send_no_result(commands::ENABLE, serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
        assert_eq!(transport.calls().len(), 0);
    }

    #[tokio::test]
    async fn mark_detached_skips_remote_call() {
        let transport = FakeTransport::new();
        let session = session(&transport);

        session.attach().await.unwrap();
        session.enable_domain().await.unwrap();
        session.mark_detached();

        assert!(!session.is_attached());
        assert!(!session.is_domain_enabled());
        // The only dispatched command was the enable; no detach went out.
        assert_eq!(transport.calls().len(), 1);
    }
}
