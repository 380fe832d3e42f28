//! In-process transport double for tests.
//!
//! [`FakeTransport`] implements [`DebuggerTransport`] against scripted
//! responses, records every dispatched command, and can emit unsolicited
//! detach events. Kept in the library (not behind `cfg(test)`) so dependent
//! crates can drive their own tests with it.

use crate::error::Error;
use crate::transport::{DebuggerTransport, DetachEvent, TransportFuture};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use vauth_protocol::commands;

/// One scripted outcome for a command method.
enum Scripted {
    Ok(Value),
    Err(String),
}

#[derive(Default)]
struct FakeState {
    attached: HashSet<String>,
    attach_error: Option<String>,
    responses: HashMap<String, VecDeque<Scripted>>,
    delays: HashMap<String, Duration>,
    calls: Vec<(String, Value)>,
    detaches: Vec<String>,
    next_authenticator: u64,
}

/// Scripted [`DebuggerTransport`] implementation.
///
/// Unscripted commands get sensible defaults: `addVirtualAuthenticator`
/// returns a fresh `AUTH-n` id, `getCredentials` returns an empty list, and
/// everything else returns an empty object.
pub struct FakeTransport {
    state: Mutex<FakeState>,
    detach_tx: broadcast::Sender<DetachEvent>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        let (detach_tx, _) = broadcast::channel(16);
        Arc::new(Self {
            state: Mutex::new(FakeState::default()),
            detach_tx,
        })
    }

    /// Makes the next and all following `attach` calls fail with `message`.
    pub fn fail_attach(&self, message: &str) {
        self.state.lock().attach_error = Some(message.to_string());
    }

    /// Queues a successful response for the next call of `method`.
    pub fn queue_response(&self, method: &str, response: Value) {
        self.state
            .lock()
            .responses
            .entry(method.to_string())
            .or_default()
            .push_back(Scripted::Ok(response));
    }

    /// Queues a failure for the next call of `method`.
    pub fn queue_error(&self, method: &str, message: &str) {
        self.state
            .lock()
            .responses
            .entry(method.to_string())
            .or_default()
            .push_back(Scripted::Err(message.to_string()));
    }

    /// Delays every dispatch of `method` by `duration` before it resolves,
    /// so a test can race another operation against the in-flight call.
    pub fn delay_command(&self, method: &str, duration: Duration) {
        self.state
            .lock()
            .delays
            .insert(method.to_string(), duration);
    }

    /// Emits an unsolicited detach notification and forgets the attachment.
    pub fn emit_detach(&self, target_id: &str) {
        self.state.lock().attached.remove(target_id);
        let _ = self.detach_tx.send(DetachEvent {
            target_id: target_id.to_string(),
        });
    }

    /// Returns every `(method, params)` pair dispatched so far.
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.state.lock().calls.clone()
    }

    /// Returns how many times `method` was dispatched.
    pub fn call_count(&self, method: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|(m, _)| m == method)
            .count()
    }

    /// Returns true while `target_id` is attached.
    pub fn is_attached(&self, target_id: &str) -> bool {
        self.state.lock().attached.contains(target_id)
    }

    /// Returns how many detach requests were issued by the client.
    pub fn detach_count(&self) -> usize {
        self.state.lock().detaches.len()
    }

    fn default_response(method: &str, state: &mut FakeState) -> Value {
        match method {
            commands::ADD_VIRTUAL_AUTHENTICATOR => {
                state.next_authenticator += 1;
                json!({ "authenticatorId": format!("AUTH-{}", state.next_authenticator) })
            }
            commands::GET_CREDENTIALS => json!({ "credentials": [] }),
            _ => json!({}),
        }
    }
}

impl DebuggerTransport for FakeTransport {
    fn attach(&self, target_id: &str, _protocol_version: &str) -> TransportFuture<'_, ()> {
        let target_id = target_id.to_string();
        Box::pin(async move {
            let mut state = self.state.lock();
            if let Some(message) = &state.attach_error {
                return Err(Error::AttachFailed(message.clone()));
            }
            if !state.attached.insert(target_id.clone()) {
                return Err(Error::AttachFailed(format!(
                    "Another debugger is already attached to the target with id: {target_id}"
                )));
            }
            Ok(())
        })
    }

    fn detach(&self, target_id: &str) -> TransportFuture<'_, ()> {
        let target_id = target_id.to_string();
        Box::pin(async move {
            let mut state = self.state.lock();
            state.detaches.push(target_id.clone());
            state.attached.remove(&target_id);
            Ok(())
        })
    }

    fn send_command(
        &self,
        target_id: &str,
        method: &str,
        params: Value,
    ) -> TransportFuture<'_, Value> {
        let target_id = target_id.to_string();
        let method = method.to_string();
        Box::pin(async move {
            let delay = self.state.lock().delays.get(&method).copied();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            let mut state = self.state.lock();
            if !state.attached.contains(&target_id) {
                return Err(Error::TransportError(format!(
                    "Debugger is not attached to the target with id: {target_id}"
                )));
            }
            state.calls.push((method.clone(), params));

            let scripted = state
                .responses
                .get_mut(&method)
                .and_then(VecDeque::pop_front);
            match scripted {
                Some(Scripted::Ok(value)) => Ok(value),
                Some(Scripted::Err(message)) => Err(Error::Remote { message }),
                None => Ok(Self::default_response(&method, &mut state)),
            }
        })
    }

    fn subscribe_detach(&self) -> broadcast::Receiver<DetachEvent> {
        self.detach_tx.subscribe()
    }
}
