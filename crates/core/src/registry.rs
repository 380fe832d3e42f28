//! In-memory ownership of authenticator records and credential mirrors.
//!
//! The registry is the single source of truth for the presentation layer.
//! Mutations that touch the remote side (`add`, `remove`, `remove_credential`)
//! only update local state after the remote call confirms; a failed call
//! leaves the registry byte-for-byte unchanged.

use parking_lot::Mutex;
use std::sync::Arc;
use vauth_protocol::commands::{
    self, AddAuthenticatorParams, AddAuthenticatorResponse, AuthenticatorIdParams,
    RemoveCredentialParams,
};
use vauth_protocol::{AuthenticatorOptions, Credential};
use vauth_runtime::{DebuggerSession, Result};

/// A simulated hardware authenticator with its mirrored credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticator {
    /// Server-assigned opaque id
    pub id: String,
    /// Options the authenticator was created with
    pub options: AuthenticatorOptions,
    /// Credential mirror, replaced wholesale by each successful poll
    pub credentials: Vec<Credential>,
    generation: u64,
}

impl Authenticator {
    /// Registry generation at insertion time. A re-added authenticator gets
    /// a fresh generation even if the remote side reuses the id.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Default)]
struct RegistryState {
    entries: Vec<Authenticator>,
    next_generation: u64,
}

/// Owns every [`Authenticator`] record for one panel instance.
///
/// Cheap to clone; clones share state. Insertion order is preserved for
/// `list()`.
#[derive(Clone)]
pub struct AuthenticatorRegistry {
    session: DebuggerSession,
    state: Arc<Mutex<RegistryState>>,
}

impl AuthenticatorRegistry {
    pub fn new(session: DebuggerSession) -> Self {
        Self {
            session,
            state: Arc::new(Mutex::new(RegistryState::default())),
        }
    }

    /// Creates a virtual authenticator on the remote side and, only once the
    /// server assigns an id, stores the record locally.
    pub async fn add(&self, options: AuthenticatorOptions) -> Result<Authenticator> {
        let response: AddAuthenticatorResponse = self
            .session
            .send_command(
                commands::ADD_VIRTUAL_AUTHENTICATOR,
                AddAuthenticatorParams { options },
            )
            .await?;

        let mut state = self.state.lock();
        state.next_generation += 1;
        let authenticator = Authenticator {
            id: response.authenticator_id,
            options,
            credentials: Vec::new(),
            generation: state.next_generation,
        };
        tracing::debug!(id = %authenticator.id, "registered authenticator");
        state.entries.push(authenticator.clone());
        Ok(authenticator)
    }

    /// Removes an authenticator remotely and, only on success, drops the
    /// local record together with its credential mirror.
    pub async fn remove(&self, id: &str) -> Result<()> {
        self.session
            .send_no_result(
                commands::REMOVE_VIRTUAL_AUTHENTICATOR,
                AuthenticatorIdParams {
                    authenticator_id: id.to_string(),
                },
            )
            .await?;

        self.state.lock().entries.retain(|entry| entry.id != id);
        tracing::debug!(id, "removed authenticator");
        Ok(())
    }

    /// Removes a single credential remotely and drops it from the mirror on
    /// success. The next poll would converge anyway; dropping eagerly keeps
    /// the UI responsive.
    pub async fn remove_credential(&self, authenticator_id: &str, credential_id: &str) -> Result<()> {
        self.session
            .send_no_result(
                commands::REMOVE_CREDENTIAL,
                RemoveCredentialParams {
                    authenticator_id: authenticator_id.to_string(),
                    credential_id: credential_id.to_string(),
                },
            )
            .await?;

        let mut state = self.state.lock();
        if let Some(entry) = state
            .entries
            .iter_mut()
            .find(|entry| entry.id == authenticator_id)
        {
            entry
                .credentials
                .retain(|credential| credential.credential_id != credential_id);
        }
        Ok(())
    }

    /// Returns all authenticators in insertion order.
    pub fn list(&self) -> Vec<Authenticator> {
        self.state.lock().entries.clone()
    }

    /// Looks up one authenticator by id.
    pub fn get(&self, id: &str) -> Option<Authenticator> {
        self.state
            .lock()
            .entries
            .iter()
            .find(|entry| entry.id == id)
            .cloned()
    }

    /// Drops every record without remote calls. Teardown only: once the
    /// session is gone the remote side has already invalidated everything,
    /// but it does not notify, so the mirror is emptied explicitly.
    pub fn clear(&self) {
        self.state.lock().entries.clear();
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    /// Returns true while the authenticator is registered at the given
    /// generation. Lets the poller tell a live fetch outcome from one that
    /// raced a removal.
    pub fn contains(&self, id: &str, generation: u64) -> bool {
        self.state
            .lock()
            .entries
            .iter()
            .any(|entry| entry.id == id && entry.generation == generation)
    }

    /// Snapshot of `(id, generation)` pairs for the poller to iterate.
    pub fn poll_targets(&self) -> Vec<(String, u64)> {
        self.state
            .lock()
            .entries
            .iter()
            .map(|entry| (entry.id.clone(), entry.generation))
            .collect()
    }

    /// Applies a fetched credential list, replacing the mirror wholesale.
    ///
    /// The result is discarded (returning false) unless the authenticator is
    /// still registered with the same generation it had when the fetch was
    /// issued. This is what keeps an in-flight fetch for a removed - or
    /// removed-then-re-added - authenticator from resurrecting stale data.
    pub fn apply_poll(&self, id: &str, generation: u64, credentials: Vec<Credential>) -> bool {
        let mut state = self.state.lock();
        match state
            .entries
            .iter_mut()
            .find(|entry| entry.id == id && entry.generation == generation)
        {
            Some(entry) => {
                entry.credentials = credentials;
                true
            }
            None => false,
        }
    }
}
