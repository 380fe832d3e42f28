//! Option structs for WebAuthn domain commands.

use crate::types::{AuthenticatorProtocol, AuthenticatorTransport};
use serde::{Deserialize, Serialize};

/// Options for creating a virtual authenticator.
///
/// Defaults mirror the most common test setup: CTAP2 over USB with resident
/// key support and no user verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorOptions {
    /// Protocol the authenticator speaks
    pub protocol: AuthenticatorProtocol,
    /// Transport the authenticator reports
    pub transport: AuthenticatorTransport,
    /// Whether the authenticator can store resident credentials
    pub has_resident_key: bool,
    /// Whether the authenticator supports user verification
    pub has_user_verification: bool,
    /// Whether user verification succeeds when requested
    pub is_user_verified: bool,
}

impl Default for AuthenticatorOptions {
    fn default() -> Self {
        Self {
            protocol: AuthenticatorProtocol::Ctap2,
            transport: AuthenticatorTransport::Usb,
            has_resident_key: true,
            has_user_verification: false,
            is_user_verified: false,
        }
    }
}

impl AuthenticatorOptions {
    /// Creates options with the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the protocol.
    pub fn protocol(mut self, protocol: AuthenticatorProtocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// Sets the transport.
    pub fn transport(mut self, transport: AuthenticatorTransport) -> Self {
        self.transport = transport;
        self
    }

    /// Sets resident key support.
    pub fn has_resident_key(mut self, value: bool) -> Self {
        self.has_resident_key = value;
        self
    }

    /// Sets user verification support. Also marks verification as succeeding,
    /// matching how the reference panel wires the two flags together.
    pub fn has_user_verification(mut self, value: bool) -> Self {
        self.has_user_verification = value;
        self.is_user_verified = value;
        self
    }

    /// Sets whether user verification succeeds when requested.
    pub fn is_user_verified(mut self, value: bool) -> Self {
        self.is_user_verified = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_camel_case() {
        let value = serde_json::to_value(AuthenticatorOptions::default()).unwrap();
        assert_eq!(value["protocol"], "ctap2");
        assert_eq!(value["transport"], "usb");
        assert_eq!(value["hasResidentKey"], true);
        assert_eq!(value["hasUserVerification"], false);
        assert_eq!(value["isUserVerified"], false);
    }

    #[test]
    fn user_verification_builder_couples_flags() {
        let options = AuthenticatorOptions::new().has_user_verification(true);
        assert!(options.has_user_verification);
        assert!(options.is_user_verified);
    }
}
