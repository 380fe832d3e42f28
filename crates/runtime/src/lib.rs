//! Debugger runtime - session lifecycle and command dispatch
//!
//! This crate provides the low-level infrastructure for talking to a browser
//! tab over a debugging session:
//!
//! - **Transport**: the [`DebuggerTransport`] trait, an opaque request/response
//!   boundary with an out-of-band detach notification stream
//! - **Session**: attach/detach and WebAuthn domain enable/disable for one
//!   target, plus typed command dispatch
//! - **Errors**: transport and protocol failures with user-facing message
//!   extraction
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │    vauth    │  Panel core (registry, poller, lifecycle)
//! └──────┬──────┘
//!        │ holds a DebuggerSession
//! ┌──────▼──────┐
//! │vauth-runtime│  This crate
//! │  ┌────────┐ │
//! │  │Session │ │  attach/enable/disable/detach + send_command
//! │  └────────┘ │
//! │  ┌────────┐ │
//! │  │ Trans  │ │  DebuggerTransport trait (implemented by the host)
//! │  └────────┘ │
//! └─────────────┘
//! ```
//!
//! The concrete transport (an extension bridge, a CDP websocket, a test
//! double) is supplied by the embedder; this crate never assumes a wire
//! encoding beyond JSON request/response values.

pub mod error;
pub mod session;
pub mod testing;
pub mod transport;

pub use error::{Error, Result};
pub use session::DebuggerSession;
pub use transport::{DebuggerTransport, DetachEvent};
