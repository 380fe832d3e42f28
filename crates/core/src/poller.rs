//! Background credential refresh loop.

use crate::errors::ErrorSurface;
use crate::registry::AuthenticatorRegistry;
use futures_util::future::join_all;
use parking_lot::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use vauth_protocol::commands::{self, AuthenticatorIdParams, GetCredentialsResponse};
use vauth_runtime::DebuggerSession;

/// Default cadence for credential refreshes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Repeating timer that refreshes every authenticator's credential mirror
/// from the remote session.
///
/// Each tick snapshots the registered `(id, generation)` pairs and issues one
/// fetch per authenticator, each independently resolved: a failure leaves that
/// authenticator's mirror untouched and surfaces the error without affecting
/// the others. Results arriving for an authenticator that was removed (or
/// removed and re-added) mid-flight are discarded by the registry's
/// generation check.
pub struct CredentialPoller {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl CredentialPoller {
    /// Spawns the poll loop. Exactly one poller should run per enabled
    /// session; the lifecycle controller enforces that.
    pub fn start(
        session: DebuggerSession,
        registry: AuthenticatorRegistry,
        errors: ErrorSurface,
        interval: Duration,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                Self::refresh_all(&session, &registry, &errors).await;
            }
        });
        Self {
            handle: Mutex::new(Some(handle)),
        }
    }

    async fn refresh_all(
        session: &DebuggerSession,
        registry: &AuthenticatorRegistry,
        errors: &ErrorSurface,
    ) {
        let fetches = registry
            .poll_targets()
            .into_iter()
            .map(|(id, generation)| async move {
                let result: vauth_runtime::Result<GetCredentialsResponse> = session
                    .send_command(
                        commands::GET_CREDENTIALS,
                        AuthenticatorIdParams {
                            authenticator_id: id.clone(),
                        },
                    )
                    .await;
                match result {
                    Ok(response) => {
                        if !registry.apply_poll(&id, generation, response.credentials) {
                            tracing::debug!(authenticator = %id, "discarding stale credential fetch");
                        }
                    }
                    Err(err) => {
                        // A fetch that raced a successful removal fails with
                        // an error the user should never see; only surface
                        // failures for authenticators still registered.
                        if registry.contains(&id, generation) {
                            tracing::debug!(authenticator = %id, error = %err, "credential fetch failed");
                            errors.push(err.user_message());
                        } else {
                            tracing::debug!(authenticator = %id, "discarding stale credential fetch failure");
                        }
                    }
                }
            });
        join_all(fetches).await;
    }

    /// Cancels future ticks. In-flight fetches are not interrupted; their
    /// results are discarded by the registry once it has been cleared. Safe
    /// to call repeatedly and after the task has already ended.
    pub fn stop(&self) {
        if let Some(handle) = self.handle.lock().take() {
            handle.abort();
        }
    }

    /// Returns true until `stop` has been called.
    pub fn is_running(&self) -> bool {
        self.handle.lock().is_some()
    }
}

impl Drop for CredentialPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use vauth_protocol::AuthenticatorOptions;
    use vauth_runtime::DebuggerTransport;
    use vauth_runtime::testing::FakeTransport;

    async fn setup(
        transport: &Arc<FakeTransport>,
    ) -> (DebuggerSession, AuthenticatorRegistry, ErrorSurface) {
        let session =
            DebuggerSession::new("tab-1", Arc::clone(transport) as Arc<dyn DebuggerTransport>);
        session.attach().await.unwrap();
        session.enable_domain().await.unwrap();
        let registry = AuthenticatorRegistry::new(session.clone());
        (session, registry, ErrorSurface::new())
    }

    /// Polls until `condition` holds, letting the paused clock auto-advance.
    async fn wait_for(mut condition: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(30), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        })
        .await
        .expect("condition not reached");
    }

    #[tokio::test(start_paused = true)]
    async fn poller_refreshes_credential_mirror() {
        let transport = FakeTransport::new();
        let (session, registry, errors) = setup(&transport).await;
        let authenticator = registry.add(AuthenticatorOptions::default()).await.unwrap();

        transport.queue_response(
            commands::GET_CREDENTIALS,
            serde_json::json!({ "credentials": [{
                "credentialId": "c1",
                "isResidentCredential": true,
                "rpId": "example.com",
                "signCount": 1,
                "privateKey": "a2V5"
            }]}),
        );

        let poller = CredentialPoller::start(session, registry.clone(), errors, DEFAULT_POLL_INTERVAL);
        let id = authenticator.id.clone();
        wait_for(|| {
            registry
                .get(&id)
                .is_some_and(|entry| !entry.credentials.is_empty())
        })
        .await;

        let entry = registry.get(&authenticator.id).unwrap();
        assert_eq!(entry.credentials[0].credential_id, "c1");
        poller.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_failure_keeps_mirror_and_surfaces_error() {
        let transport = FakeTransport::new();
        let (session, registry, errors) = setup(&transport).await;
        let authenticator = registry.add(AuthenticatorOptions::default()).await.unwrap();
        registry.apply_poll(
            &authenticator.id,
            authenticator.generation(),
            vec![vauth_protocol::Credential {
                credential_id: "kept".to_string(),
                is_resident_credential: false,
                rp_id: None,
                user_handle: None,
                sign_count: 0,
                private_key: "a2V5".to_string(),
            }],
        );

        transport.queue_error(commands::GET_CREDENTIALS, "authenticator gone");

        let poller = CredentialPoller::start(
            session,
            registry.clone(),
            errors.clone(),
            DEFAULT_POLL_INTERVAL,
        );
        let errors_probe = errors.clone();
        wait_for(move || !errors_probe.is_empty()).await;

        assert_eq!(errors.messages(), vec!["authenticator gone"]);
        let entry = registry.get(&authenticator.id).unwrap();
        assert_eq!(entry.credentials[0].credential_id, "kept");
        poller.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_failure_for_removed_authenticator_is_discarded() {
        let transport = FakeTransport::new();
        let (session, registry, errors) = setup(&transport).await;
        let authenticator = registry.add(AuthenticatorOptions::default()).await.unwrap();

        // Hold the fetch in flight long enough to remove the authenticator
        // underneath it, then let it resolve with an error.
        transport.delay_command(commands::GET_CREDENTIALS, Duration::from_secs(2));
        transport.queue_error(commands::GET_CREDENTIALS, "authenticator not found");

        let poller = CredentialPoller::start(
            session,
            registry.clone(),
            errors.clone(),
            DEFAULT_POLL_INTERVAL,
        );
        // First tick has fired and its fetch is parked in the delay.
        tokio::time::sleep(Duration::from_millis(10)).await;
        registry.remove(&authenticator.id).await.unwrap();

        // Let the delayed fetch resolve.
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(transport.call_count(commands::GET_CREDENTIALS), 1);
        assert!(errors.is_empty());
        assert!(registry.is_empty());
        poller.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent() {
        let transport = FakeTransport::new();
        let (session, registry, errors) = setup(&transport).await;

        let poller = CredentialPoller::start(session, registry, errors, DEFAULT_POLL_INTERVAL);
        assert!(poller.is_running());
        poller.stop();
        assert!(!poller.is_running());
        poller.stop();
        poller.stop();
    }
}
