//! Command names and parameter/response shapes for the WebAuthn domain.
//!
//! The method strings are part of the wire contract and must match the remote
//! domain exactly.

use crate::options::AuthenticatorOptions;
use crate::types::Credential;
use serde::{Deserialize, Serialize};

/// Enables the WebAuthn domain on the attached session. No parameters.
pub const ENABLE: &str = "WebAuthn.enable";
/// Disables the WebAuthn domain. No parameters.
pub const DISABLE: &str = "WebAuthn.disable";
/// Creates a virtual authenticator.
pub const ADD_VIRTUAL_AUTHENTICATOR: &str = "WebAuthn.addVirtualAuthenticator";
/// Removes a virtual authenticator and everything it stores.
pub const REMOVE_VIRTUAL_AUTHENTICATOR: &str = "WebAuthn.removeVirtualAuthenticator";
/// Lists the credentials stored on an authenticator.
pub const GET_CREDENTIALS: &str = "WebAuthn.getCredentials";
/// Removes a single credential from an authenticator.
pub const REMOVE_CREDENTIAL: &str = "WebAuthn.removeCredential";

/// Debugging protocol version passed to attach.
pub const PROTOCOL_VERSION: &str = "1.3";

/// Parameters for [`ADD_VIRTUAL_AUTHENTICATOR`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddAuthenticatorParams {
    pub options: AuthenticatorOptions,
}

/// Response to [`ADD_VIRTUAL_AUTHENTICATOR`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddAuthenticatorResponse {
    /// Server-assigned opaque authenticator id
    pub authenticator_id: String,
}

/// Parameters for [`REMOVE_VIRTUAL_AUTHENTICATOR`] and [`GET_CREDENTIALS`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorIdParams {
    pub authenticator_id: String,
}

/// Response to [`GET_CREDENTIALS`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetCredentialsResponse {
    pub credentials: Vec<Credential>,
}

/// Parameters for [`REMOVE_CREDENTIAL`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveCredentialParams {
    pub authenticator_id: String,
    pub credential_id: String,
}
