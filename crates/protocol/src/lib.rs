//! Wire types for the WebAuthn debugger domain.
//!
//! This crate contains the serde-serializable types exchanged with the
//! debugging session. These types represent the "protocol layer" - the shapes
//! of data as they appear on the wire.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! - **Pure data**: No behavior beyond serialization/deserialization
//! - **1:1 with protocol**: Field names match the WebAuthn domain exactly
//! - **Stable**: Changes only when the wire contract changes
//!
//! Higher-level ergonomic APIs are built on top of these types in `vauth`.

pub mod commands;
pub mod options;
pub mod types;

pub use commands::*;
pub use options::*;
pub use types::*;
