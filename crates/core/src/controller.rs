//! Session lifecycle state machine.
//!
//! Replaces the callback chain of attach -> enable -> provision with an
//! explicit state machine whose failure paths are named, testable branches.
//! The controller owns the poller's start/stop and guarantees the registry is
//! emptied on teardown.

use crate::errors::{DEFAULT_ERROR_EXPIRY, ErrorSurface};
use crate::poller::{CredentialPoller, DEFAULT_POLL_INTERVAL};
use crate::registry::AuthenticatorRegistry;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use vauth_protocol::AuthenticatorOptions;
use vauth_runtime::{DebuggerSession, Error, Result};

/// Lifecycle states of the panel's debugging session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    /// No session; the toggle reads off.
    Disabled,
    /// `enable()` is attaching the debugger.
    Attaching,
    /// Attach succeeded; the WebAuthn domain enable is in flight.
    Enabling,
    /// Fully attached and enabled; the poller is running.
    Enabled,
    /// `disable()` is tearing the session down.
    Detaching,
}

/// Tunables for one panel instance.
#[derive(Debug, Clone)]
pub struct PanelConfig {
    /// Credential refresh cadence
    pub poll_interval: Duration,
    /// How long surfaced errors stay visible
    pub error_expiry: Duration,
    /// Create one default authenticator right after enabling
    pub auto_provision: bool,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            error_expiry: DEFAULT_ERROR_EXPIRY,
            auto_provision: false,
        }
    }
}

/// Orchestrates enable/disable for one session.
///
/// Construct via [`PanelController::new`], which also spawns the watcher for
/// unsolicited detaches reported by the transport.
pub struct PanelController {
    session: DebuggerSession,
    registry: AuthenticatorRegistry,
    errors: ErrorSurface,
    config: PanelConfig,
    state: Mutex<PanelState>,
    poller: Mutex<Option<CredentialPoller>>,
    detach_watcher: Mutex<Option<JoinHandle<()>>>,
}

impl PanelController {
    /// Spawns the detach watcher, so this must be called from within a tokio
    /// runtime.
    pub fn new(
        session: DebuggerSession,
        registry: AuthenticatorRegistry,
        errors: ErrorSurface,
        config: PanelConfig,
    ) -> Arc<Self> {
        let controller = Arc::new(Self {
            session,
            registry,
            errors,
            config,
            state: Mutex::new(PanelState::Disabled),
            poller: Mutex::new(None),
            detach_watcher: Mutex::new(None),
        });
        controller.spawn_detach_watcher();
        controller
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PanelState {
        *self.state.lock()
    }

    /// True only in the fully-enabled state.
    pub fn is_enabled(&self) -> bool {
        self.state() == PanelState::Enabled
    }

    /// Attaches the debugger and enables the WebAuthn domain.
    ///
    /// On success the poller starts and, when configured, one default
    /// authenticator is provisioned. Any failure along the way reverts to
    /// `Disabled`, surfaces the error, and rolls back the attach, so the
    /// toggle reads off again.
    pub async fn enable(&self) -> Result<()> {
        self.transition(PanelState::Disabled, PanelState::Attaching)?;

        if let Err(err) = self.session.attach().await {
            self.errors.push(err.user_message());
            *self.state.lock() = PanelState::Disabled;
            return Err(err);
        }

        *self.state.lock() = PanelState::Enabling;
        if let Err(err) = self.session.enable_domain().await {
            self.errors.push(err.user_message());
            // Roll back the attach so no half-initialized session lingers.
            if let Err(detach_err) = self.session.detach().await {
                tracing::debug!(error = %detach_err, "rollback detach failed");
            }
            *self.state.lock() = PanelState::Disabled;
            return Err(err);
        }

        *self.state.lock() = PanelState::Enabled;
        tracing::debug!(target = %self.session.target_id(), "session enabled");
        *self.poller.lock() = Some(CredentialPoller::start(
            self.session.clone(),
            self.registry.clone(),
            self.errors.clone(),
            self.config.poll_interval,
        ));

        if self.config.auto_provision {
            if let Err(err) = self.registry.add(AuthenticatorOptions::default()).await {
                // Provisioning is a convenience; the session stays enabled.
                self.errors.push(err.user_message());
            }
        }
        Ok(())
    }

    /// Tears the session down: stops the poller, clears the registry, then
    /// best-effort disables the domain and detaches. Lands in `Disabled`
    /// regardless of the remote outcome; extra calls are no-ops.
    pub async fn disable(&self) {
        self.teardown(true).await;
    }

    /// Best-effort teardown for process/page unload: local state is torn
    /// down synchronously and the detach is fired without awaiting.
    pub fn shutdown(&self) {
        if let Some(handle) = self.detach_watcher.lock().take() {
            handle.abort();
        }
        if let Some(poller) = self.poller.lock().take() {
            poller.stop();
        }
        self.registry.clear();
        *self.state.lock() = PanelState::Disabled;

        if self.session.is_attached() {
            let session = self.session.clone();
            tokio::spawn(async move {
                let _ = session.detach().await;
            });
        }
    }

    async fn teardown(&self, send_detach: bool) {
        {
            let mut state = self.state.lock();
            match *state {
                PanelState::Enabled => *state = PanelState::Detaching,
                // Already down or on its way down.
                PanelState::Disabled | PanelState::Detaching => return,
                // Overlapping with an in-flight enable; the UI disables the
                // toggle during transitions, so treat this as a no-op too.
                PanelState::Attaching | PanelState::Enabling => return,
            }
        }

        if let Some(poller) = self.poller.lock().take() {
            poller.stop();
        }
        self.registry.clear();

        if send_detach {
            if let Err(err) = self.session.disable_domain().await {
                tracing::debug!(error = %err, "disable domain failed during teardown");
            }
            if let Err(err) = self.session.detach().await {
                tracing::debug!(error = %err, "detach failed during teardown");
            }
        } else {
            self.session.mark_detached();
        }

        *self.state.lock() = PanelState::Disabled;
        tracing::debug!(target = %self.session.target_id(), "session disabled");
    }

    fn transition(&self, from: PanelState, to: PanelState) -> Result<()> {
        let mut state = self.state.lock();
        if *state != from {
            return Err(Error::InvalidState("operation not valid in current state"));
        }
        *state = to;
        Ok(())
    }

    /// Watches for the remote side dropping the session (page navigated,
    /// dev tools closed). Drives the same teardown as `disable()` but never
    /// issues a redundant detach command.
    fn spawn_detach_watcher(self: &Arc<Self>) {
        let mut rx = self.session.subscribe_detach();
        let target_id = self.session.target_id().to_string();
        let weak = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) if event.target_id == target_id => {
                        let Some(controller) = weak.upgrade() else { break };
                        tracing::debug!(target = %target_id, "remote side detached");
                        controller.session.mark_detached();
                        controller.teardown(false).await;
                    }
                    Ok(_) => {}
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "detach notifications lagged");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        *self.detach_watcher.lock() = Some(handle);
    }
}

impl Drop for PanelController {
    fn drop(&mut self) {
        if let Some(handle) = self.detach_watcher.lock().take() {
            handle.abort();
        }
        if let Some(poller) = self.poller.lock().take() {
            poller.stop();
        }
    }
}
