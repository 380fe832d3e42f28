//! vauth: virtual authenticator panel core
//!
//! This crate owns the session/state synchronization core for a virtual
//! authenticator panel: the attach/enable/disable lifecycle of a debugging
//! session, an authoritative local mirror of authenticators and their
//! credentials, periodic reconciliation against the remote session, and a
//! consistent snapshot for any presentation layer.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use vauth::{PanelConfig, PanelContext};
//! use vauth_protocol::AuthenticatorOptions;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // `transport` is any DebuggerTransport implementation for the host
//!     // environment (extension bridge, CDP websocket, ...).
//!     let panel = PanelContext::new("tab-42", transport, PanelConfig::default());
//!
//!     panel.toggle(true).await?;
//!     let authenticator = panel
//!         .add_authenticator(AuthenticatorOptions::default())
//!         .await?;
//!
//!     // The poller keeps credential mirrors fresh in the background; the
//!     // presentation layer re-renders from snapshots.
//!     let view = panel.snapshot();
//!     assert_eq!(view.authenticators[0].id, authenticator.id);
//!
//!     panel.toggle(false).await?;
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod controller;
pub mod errors;
pub mod poller;
pub mod prefs;
pub mod registry;

pub use context::{PanelContext, PanelSnapshot, export_credential_key};
pub use controller::{PanelConfig, PanelController, PanelState};
pub use errors::ErrorSurface;
pub use poller::CredentialPoller;
pub use prefs::PrefStore;
pub use registry::{Authenticator, AuthenticatorRegistry};

// Re-export the layers below for embedders that only depend on this crate.
pub use vauth_protocol as protocol;
pub use vauth_runtime as runtime;
pub use vauth_runtime::{DebuggerSession, DebuggerTransport, Error, Result};
